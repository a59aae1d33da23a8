use cu29_clock::CuDuration;
use cu_posture_console::{DimmingSurface, StatusIndicator};
use cu_posture_payloads::{ClassificationResult, PostureSignal, StatusLabel};
use cu_posture_runtime::{spawn_consumer, PostureConsumer, SignalFanout};
use std::sync::mpsc;

/// Forwards what a wrapped surface ends up with once the stream is closed.
struct Reporting<C: PostureConsumer> {
    inner: C,
    report: fn(&C) -> String,
    done: mpsc::Sender<String>,
}

impl<C: PostureConsumer> PostureConsumer for Reporting<C> {
    fn on_result(&mut self, severity: f64) {
        self.inner.on_result(severity);
    }

    fn on_status(&mut self, label: StatusLabel, color: cu_posture_payloads::DisplayColor) {
        self.inner.on_status(label, color);
    }

    fn on_close(&mut self) {
        self.inner.on_close();
        self.done.send((self.report)(&self.inner)).unwrap();
    }
}

#[test]
fn surfaces_keep_the_last_value_after_close() {
    let fanout = SignalFanout::new();
    let (tx, rx) = mpsc::channel();
    let dimming = spawn_consumer(
        "dimming",
        fanout.subscribe(),
        Reporting {
            inner: DimmingSurface::new("main"),
            report: |s: &DimmingSurface| format!("{:.2}", s.level()),
            done: tx.clone(),
        },
    )
    .unwrap();
    let status = spawn_consumer(
        "status",
        fanout.subscribe(),
        Reporting {
            inner: StatusIndicator::new(),
            report: |s: &StatusIndicator| format!("{:?}", s.current().map(|(label, _)| label)),
            done: tx,
        },
    )
    .unwrap();

    fanout.publish(PostureSignal::new(CuDuration(1), ClassificationResult::uncalibrated()));
    fanout.publish(PostureSignal::new(
        CuDuration(2),
        ClassificationResult::new(0.85, StatusLabel::RoundedShoulders),
    ));
    fanout.close();
    dimming.join();
    status.join();

    let mut reports: Vec<String> = rx.try_iter().collect();
    reports.sort();
    assert_eq!(reports, vec!["0.85".to_string(), "Some(RoundedShoulders)".to_string()]);
}
