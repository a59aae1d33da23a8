use clap::{Parser, Subcommand};
use cu29_clock::RobotClock;
use cu_landmark_sources::{Recording, RecordingError, ReplaySource, SyntheticSession};
use cu_posture_console::{DimmingSurface, SkeletonPreview, StatusIndicator};
use cu_posture_runtime::{
    read_configuration, AnalysisConfig, AnalysisHandle, AnalysisLoop, PostureError,
};
use log::{info, warn};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use thiserror::Error;

const POLL_PERIOD: Duration = Duration::from_millis(100);
const PREVIEW_SIZE: (u32, u32) = (48, 20);

#[derive(Error, Debug)]
enum MonitorError {
    #[error(transparent)]
    Posture(#[from] PostureError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("Could not set up the logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Could not install the Ctrl-C handler: {0}")]
    CtrlC(#[from] ctrlc::Error),
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = LevelFilter::Info, value_parser = parse_level, global = true)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor a session. Type `c` + Enter to calibrate, `q` + Enter to quit.
    Run {
        /// RON configuration file, defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Recorded session (.ron or bincode). The synthetic demo session is used when omitted.
        #[arg(short, long)]
        session: Option<PathBuf>,
        /// Number of dimmed displays.
        #[arg(long, default_value_t = 1)]
        surfaces: usize,
        /// Replay at the recorded pace.
        #[arg(long)]
        realtime: bool,
        /// Restart the session when it ends.
        #[arg(long)]
        loop_session: bool,
        /// Draw the detected skeleton in the log.
        #[arg(long)]
        preview: bool,
        /// Frames between two drawn skeletons.
        #[arg(long, default_value_t = 30)]
        preview_every: u64,
    },
    /// Write the synthetic demo session to a file.
    Record {
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value_t = 30.0)]
        fps: f64,
    },
    /// Print the default configuration.
    Config,
}

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("unknown log level {level:?}, expected off, error, warn, info, debug or trace"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<(), MonitorError> {
    TermLogger::init(
        cli.log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    match cli.command {
        Command::Run {
            config,
            session,
            surfaces,
            realtime,
            loop_session,
            preview,
            preview_every,
        } => {
            let config = match config {
                Some(path) => read_configuration(path)?,
                None => AnalysisConfig::default(),
            };
            let recording = match session {
                Some(path) => {
                    info!("Loading session {}", path.display());
                    Recording::load(path)?
                }
                None => SyntheticSession::default().recording(),
            };
            let source = ReplaySource::new(recording)
                .realtime(realtime)
                .looping(loop_session);
            let preview = preview.then(|| {
                SkeletonPreview::new(PREVIEW_SIZE.0, PREVIEW_SIZE.1).with_report_every(preview_every)
            });
            monitor(source, config, surfaces, preview)
        }
        Command::Record { out, fps } => {
            let session = SyntheticSession::demo(fps);
            let recording = session.recording();
            recording.save(&out)?;
            info!(
                "Wrote {} frames at {} fps to {}",
                recording.len(),
                session.fps(),
                out.display()
            );
            Ok(())
        }
        Command::Config => {
            println!("{}", AnalysisConfig::default().serialize_ron()?);
            Ok(())
        }
    }
}

fn monitor(
    source: ReplaySource,
    config: AnalysisConfig,
    surfaces: usize,
    preview: Option<SkeletonPreview>,
) -> Result<(), MonitorError> {
    let mut analysis = AnalysisLoop::new(source, config, RobotClock::new())?;
    for i in 0..surfaces {
        analysis.attach(DimmingSurface::new(format!("display-{i}")))?;
    }
    analysis.attach(StatusIndicator::new().with_ansi_color(std::io::stdout().is_terminal()))?;
    if let Some(preview) = preview {
        analysis.attach_preview(preview)?;
    }

    let handle = analysis.handle();
    let ctrlc_handle = handle.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl-C pressed. Stopping.");
        ctrlc_handle.request_stop();
    })?;
    spawn_command_reader(handle)?;

    analysis.start()?;
    info!("Sit straight and type `c` + Enter to calibrate, `q` + Enter to quit.");
    while !analysis.wait_stopped(POLL_PERIOD) {}

    let stopped = analysis.stop();
    match analysis.failure() {
        Some(reason) if reason == PostureError::SourceExhausted.to_string() => info!("Session over."),
        Some(reason) => warn!("Analysis ended early: {reason}"),
        None => {}
    }
    let stats = analysis.stats();
    match ron::to_string(&stats) {
        Ok(text) => info!("Loop statistics: {text}"),
        Err(e) => warn!("Could not serialize the loop statistics {stats}: {e}"),
    }
    stopped?;
    Ok(())
}

/// Reads commands from stdin until it is closed.
fn spawn_command_reader(handle: AnalysisHandle) -> Result<(), MonitorError> {
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match line.trim() {
                    "c" | "calibrate" => handle.calibrate(),
                    "q" | "quit" => {
                        handle.request_stop();
                        break;
                    }
                    "" => {}
                    other => warn!("Unknown command {other:?}, use `c` to calibrate or `q` to quit."),
                }
            }
        })
        .map_err(PostureError::Spawn)?;
    Ok(())
}
