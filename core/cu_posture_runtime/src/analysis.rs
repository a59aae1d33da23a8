//! The analysis loop: one worker thread pulling landmark snapshots, classifying them and publishing the
//! result to every subscriber.
//!
//! ```text
//!  Idle --start--> Running --stop / source failure--> Stopped
//!    \________________stop____________________________/
//! ```
//! A stopped loop cannot be restarted, build a new one.

use crate::config::AnalysisConfig;
use crate::consumer::{
    spawn_consumer, spawn_preview_consumer, ConsumerHandle, PostureConsumer, PreviewConsumer,
};
use crate::error::{PostureError, PostureResult};
use crate::fanout::{SignalFanout, SignalReceiver};
use crate::monitoring::{LoopStats, LoopStatsSnapshot};
use crate::source::LandmarkSource;
use cu29_clock::{CuDuration, CuTime, RobotClock};
use cu_posture::PostureTask;
use cu_posture_payloads::{
    ClassificationResult, FrameResult, PoseLandmarks, PostureSignal, PreviewFrame,
};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

impl Display for LoopState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopState::Idle => "Idle",
            LoopState::Running => "Running",
            LoopState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

enum Command {
    Calibrate,
}

struct LoopShared {
    stop: AtomicBool,
    state: Mutex<LoopState>,
    failure: Mutex<Option<String>>,
    stats: LoopStats,
}

impl LoopShared {
    fn set_state(&self, state: LoopState) {
        *self.state.lock() = state;
    }
}

/// Cloneable remote control for the loop, usable from any thread.
#[derive(Clone)]
pub struct AnalysisHandle {
    shared: Arc<LoopShared>,
    commands: Sender<Command>,
}

impl AnalysisHandle {
    /// Asks the worker to take the latest measured features as the baseline.
    /// Ignored by the worker if no pose was measured yet.
    pub fn calibrate(&self) {
        if self.commands.send(Command::Calibrate).is_err() {
            debug!("Calibrate request dropped, the analysis worker is gone.");
        }
    }

    /// Raises the stop flag without waiting. The worker notices it at the top of its next cycle.
    pub fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
    }

    pub fn state(&self) -> LoopState {
        *self.shared.state.lock()
    }
}

struct WorkerHandle {
    thread: JoinHandle<()>,
    exited: Receiver<()>,
}

pub struct AnalysisLoop<S: LandmarkSource> {
    source: Option<S>,
    config: AnalysisConfig,
    clock: RobotClock,
    shared: Arc<LoopShared>,
    signals: Arc<SignalFanout<PostureSignal>>,
    previews: Arc<SignalFanout<PreviewFrame>>,
    commands: Sender<Command>,
    command_rx: Option<Receiver<Command>>,
    worker: Option<WorkerHandle>,
    consumers: Vec<ConsumerHandle>,
}

impl<S: LandmarkSource> AnalysisLoop<S> {
    pub fn new(source: S, config: AnalysisConfig, clock: RobotClock) -> PostureResult<Self> {
        config.validate()?;
        let (commands, command_rx) = mpsc::channel();
        Ok(Self {
            source: Some(source),
            config,
            clock,
            shared: Arc::new(LoopShared {
                stop: AtomicBool::new(false),
                state: Mutex::new(LoopState::Idle),
                failure: Mutex::new(None),
                stats: LoopStats::default(),
            }),
            signals: Arc::new(SignalFanout::new()),
            previews: Arc::new(SignalFanout::new()),
            commands,
            command_rx: Some(command_rx),
            worker: None,
            consumers: Vec::new(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn subscribe(&self) -> SignalReceiver<PostureSignal> {
        self.signals.subscribe()
    }

    pub fn subscribe_preview(&self) -> SignalReceiver<PreviewFrame> {
        self.previews.subscribe()
    }

    /// Runs `consumer` on its own thread. It is joined when the loop is stopped.
    pub fn attach<C: PostureConsumer>(&mut self, consumer: C) -> PostureResult<()> {
        let name = format!("posture-consumer-{}", self.consumers.len());
        let handle = spawn_consumer(&name, self.signals.subscribe(), consumer)?;
        self.consumers.push(handle);
        Ok(())
    }

    /// Runs a landmark preview renderer on its own thread, joined like the other consumers.
    pub fn attach_preview<C: PreviewConsumer>(&mut self, consumer: C) -> PostureResult<()> {
        let name = format!("posture-preview-{}", self.consumers.len());
        let handle = spawn_preview_consumer(&name, self.previews.subscribe(), consumer)?;
        self.consumers.push(handle);
        Ok(())
    }

    pub fn handle(&self) -> AnalysisHandle {
        AnalysisHandle {
            shared: Arc::clone(&self.shared),
            commands: self.commands.clone(),
        }
    }

    pub fn state(&self) -> LoopState {
        *self.shared.state.lock()
    }

    /// Why the worker ended on its own, if it did.
    pub fn failure(&self) -> Option<String> {
        self.shared.failure.lock().clone()
    }

    pub fn stats(&self) -> LoopStatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn start(&mut self) -> PostureResult<()> {
        let state = self.state();
        let (source, commands) = match (state, self.source.take(), self.command_rx.take()) {
            (LoopState::Idle, Some(source), Some(commands)) => (source, commands),
            (_, source, commands) => {
                self.source = source;
                self.command_rx = commands;
                return Err(PostureError::InvalidTransition {
                    from: state,
                    command: "start",
                });
            }
        };

        let worker = Worker {
            source,
            task: PostureTask::new(self.config.thresholds),
            clock: self.clock.clone(),
            shared: Arc::clone(&self.shared),
            signals: Arc::clone(&self.signals),
            previews: Arc::clone(&self.previews),
            commands,
            period: self.config.cycle_period(),
            last_timestamp: None,
        };
        let (exit_tx, exited) = mpsc::channel();
        self.shared.set_state(LoopState::Running);
        let spawned = thread::Builder::new()
            .name("posture-analysis".to_string())
            .spawn(move || {
                worker.run();
                let _ = exit_tx.send(());
            });
        match spawned {
            Ok(thread) => {
                info!("Analysis loop started.");
                self.worker = Some(WorkerHandle { thread, exited });
                Ok(())
            }
            Err(e) => {
                *self.shared.failure.lock() = Some(format!("Could not spawn the analysis worker: {e}"));
                self.shared.set_state(LoopState::Stopped);
                self.signals.close();
                self.previews.close();
                Err(PostureError::Spawn(e))
            }
        }
    }

    /// Forwards a calibrate command to the worker.
    pub fn calibrate(&self) {
        self.handle().calibrate();
    }

    /// Stops the loop and waits for the worker and the consumers, at most `shutdown_timeout` in total.
    /// Consumers still busy past that are detached.
    pub fn stop(&mut self) -> PostureResult<()> {
        let timeout = self.config.shutdown_timeout();
        let deadline = Instant::now() + timeout;
        if let Some(mut source) = self.source.take() {
            // never started
            if let Err(e) = source.stop(&self.clock) {
                warn!("Landmark source did not release cleanly: {e}");
            }
            self.shared.set_state(LoopState::Stopped);
            self.signals.close();
            self.previews.close();
            return self.join_consumers(deadline, timeout);
        }

        self.shared.stop.store(true, Ordering::Release);
        if !self.wait_stopped(timeout) {
            error!("Analysis worker did not exit within {timeout:?}.");
            return Err(PostureError::ShutdownTimeout(timeout));
        }
        self.join_consumers(deadline, timeout)
    }

    /// Waits for the worker to exit on its own, true if it has.
    pub fn wait_stopped(&mut self, timeout: Duration) -> bool {
        let Some(worker) = self.worker.as_ref() else {
            return self.state() == LoopState::Stopped;
        };
        if let Err(mpsc::RecvTimeoutError::Timeout) = worker.exited.recv_timeout(timeout) {
            return false;
        }
        if let Some(worker) = self.worker.take() {
            if worker.thread.join().is_err() {
                error!("Analysis worker panicked.");
                self.shared.set_state(LoopState::Stopped);
                self.signals.close();
                self.previews.close();
            }
        }
        true
    }

    fn join_consumers(&mut self, deadline: Instant, timeout: Duration) -> PostureResult<()> {
        let mut stalled = 0;
        for consumer in self.consumers.drain(..) {
            let left = deadline.saturating_duration_since(Instant::now());
            if let Err(consumer) = consumer.join_timeout(left) {
                error!("Consumer {} did not exit within {timeout:?}, detaching it.", consumer.name());
                stalled += 1;
            }
        }
        if stalled > 0 {
            return Err(PostureError::ShutdownTimeout(timeout));
        }
        Ok(())
    }
}

impl<S: LandmarkSource> Drop for AnalysisLoop<S> {
    fn drop(&mut self) {
        // a worker still running is detached, it exits at its next cycle and closes the fan-outs itself
        self.shared.stop.store(true, Ordering::Release);
        if self.worker.is_none() {
            self.signals.close();
            self.previews.close();
        }
    }
}

struct Worker<S> {
    source: S,
    task: PostureTask,
    clock: RobotClock,
    shared: Arc<LoopShared>,
    signals: Arc<SignalFanout<PostureSignal>>,
    previews: Arc<SignalFanout<PreviewFrame>>,
    commands: Receiver<Command>,
    period: Option<Duration>,
    last_timestamp: Option<CuTime>,
}

impl<S: LandmarkSource> Worker<S> {
    fn run(mut self) {
        info!("Classifying with {:?}", self.task.thresholds());
        match self.source.start(&self.clock) {
            Ok(()) => self.cycle_until_stopped(),
            Err(e) => {
                error!("Landmark source failed to start: {e}");
                self.fail(e);
            }
        }

        if let Err(e) = self.source.stop(&self.clock) {
            warn!("Landmark source did not release cleanly: {e}");
        }
        self.shared.set_state(LoopState::Stopped);
        info!("Analysis loop stopped. {}", self.shared.stats.snapshot());
        self.signals.close();
        self.previews.close();
    }

    fn cycle_until_stopped(&mut self) {
        while !self.shared.stop.load(Ordering::Acquire) {
            self.drain_commands();
            let cycle_start = self.clock.now();
            let frame = match self.source.next(&self.clock) {
                Ok(frame) => frame,
                Err(PostureError::SourceExhausted) => {
                    info!("Landmark source exhausted.");
                    self.fail(PostureError::SourceExhausted);
                    return;
                }
                Err(e) => {
                    error!("Landmark source failure: {e}");
                    self.fail(e);
                    return;
                }
            };
            // a calibrate sent during the pull still sees the features of the last cycle
            self.drain_commands();
            self.shared.stats.cycle();
            self.handle_frame(frame);
            self.pace(cycle_start);
        }
        debug!("Stop requested.");
    }

    fn fail(&self, e: PostureError) {
        *self.shared.failure.lock() = Some(e.to_string());
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Calibrate => {
                    if self.task.calibrate() {
                        self.shared.stats.calibrated();
                        info!("Calibrated.");
                    } else {
                        warn!("Calibration ignored: no pose measured yet.");
                    }
                }
            }
        }
    }

    fn handle_frame(&mut self, frame: FrameResult) {
        let (timestamp, landmarks) = match frame {
            FrameResult::NoFrame => {
                self.shared.stats.no_frame();
                return;
            }
            FrameResult::FrameNoPose { timestamp } => (timestamp, None),
            FrameResult::FramePose {
                timestamp,
                landmarks,
            } => (timestamp, Some(landmarks)),
        };

        if let Some(last) = self.last_timestamp {
            if timestamp <= last {
                debug!("Dropping stale frame at {timestamp}, last was {last}.");
                self.shared.stats.stale();
                return;
            }
        }
        self.last_timestamp = Some(timestamp);

        let result = match landmarks.as_ref() {
            None => {
                self.shared.stats.no_pose();
                ClassificationResult::no_pose()
            }
            Some(landmarks) => self.classify(landmarks),
        };
        self.signals.publish(PostureSignal::new(timestamp, result));
        self.shared.stats.published();
        self.previews.publish(PreviewFrame {
            timestamp,
            landmarks,
        });
    }

    fn classify(&mut self, landmarks: &PoseLandmarks) -> ClassificationResult {
        match self.task.process(landmarks) {
            Ok(result) => result,
            Err(e) => {
                warn!("Unusable pose: {e}");
                self.shared.stats.no_pose();
                ClassificationResult::no_pose()
            }
        }
    }

    fn pace(&self, cycle_start: CuTime) {
        let Some(period) = self.period else {
            return;
        };
        let elapsed = Duration::from(CuDuration(self.clock.now().0.saturating_sub(cycle_start.0)));
        if let Some(remaining) = period.checked_sub(elapsed) {
            thread::sleep(remaining);
        }
    }
}
