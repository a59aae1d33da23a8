use crate::error::{PostureError, PostureResult};
use crate::fanout::SignalReceiver;
use cu_posture_payloads::{DisplayColor, PostureSignal, PreviewFrame, StatusLabel};
use log::{debug, warn};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A display surface reacting to the published posture.
///
/// Both callbacks are called for every signal the consumer observes, severity first.
/// A consumer may miss intermediate signals: it always gets the latest one.
pub trait PostureConsumer: Send + 'static {
    /// Dimming channel, `severity` in [0, 1].
    fn on_result(&mut self, severity: f64);

    /// Status channel.
    fn on_status(&mut self, label: StatusLabel, color: DisplayColor);

    /// Called once when the analysis loop stopped publishing.
    fn on_close(&mut self) {}
}

/// A renderer of the landmark snapshots, independent of the classification.
pub trait PreviewConsumer: Send + 'static {
    fn on_preview(&mut self, frame: &PreviewFrame);

    fn on_close(&mut self) {}
}

/// The thread driving one consumer.
pub struct ConsumerHandle {
    name: String,
    handle: JoinHandle<()>,
    exited: Receiver<()>,
}

impl ConsumerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for the consumer thread, which ends once the fan-out is closed.
    pub fn join(self) {
        if self.handle.join().is_err() {
            warn!("Consumer {} panicked", self.name);
        }
    }

    /// Like [`ConsumerHandle::join`] but gives the handle back if the thread is still busy after `timeout`.
    pub fn join_timeout(self, timeout: Duration) -> Result<(), ConsumerHandle> {
        match self.exited.recv_timeout(timeout) {
            Err(mpsc::RecvTimeoutError::Timeout) => Err(self),
            // a panicking consumer drops its sender
            _ => {
                self.join();
                Ok(())
            }
        }
    }
}

fn spawn_named(name: &str, body: impl FnOnce() + Send + 'static) -> PostureResult<ConsumerHandle> {
    let (exit_tx, exited) = mpsc::channel();
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            body();
            let _ = exit_tx.send(());
        })
        .map_err(PostureError::Spawn)?;
    Ok(ConsumerHandle {
        name: name.to_string(),
        handle,
        exited,
    })
}

/// Runs `consumer` on its own thread, fed by `receiver`.
pub fn spawn_consumer<C: PostureConsumer>(
    name: &str,
    mut receiver: SignalReceiver<PostureSignal>,
    mut consumer: C,
) -> PostureResult<ConsumerHandle> {
    let thread_name = name.to_string();
    spawn_named(name, move || {
        while let Some(signal) = receiver.recv() {
            consumer.on_result(signal.severity());
            consumer.on_status(signal.label(), signal.color_hint());
        }
        debug!("Consumer {} done.", thread_name);
        consumer.on_close();
    })
}

/// Runs a preview renderer on its own thread, fed by `receiver`.
pub fn spawn_preview_consumer<C: PreviewConsumer>(
    name: &str,
    mut receiver: SignalReceiver<PreviewFrame>,
    mut consumer: C,
) -> PostureResult<ConsumerHandle> {
    let thread_name = name.to_string();
    spawn_named(name, move || {
        while let Some(frame) = receiver.recv() {
            consumer.on_preview(&frame);
        }
        debug!("Preview {} done.", thread_name);
        consumer.on_close();
    })
}
