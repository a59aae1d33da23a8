//! Console stand-ins for the display surfaces of the posture monitor.
//!
//! A [`DimmingSurface`] follows the severity channel the way a screen overlay would darken, a
//! [`StatusIndicator`] follows the status channel. Both report through the `log` facade.
//! [`SkeletonPreview`] draws the preview landmarks as text.

mod preview;

pub use preview::SkeletonPreview;

use cu_posture_payloads::{DisplayColor, StatusLabel};
use cu_posture_runtime::PostureConsumer;
use log::{debug, info, warn};

const BAR_WIDTH: usize = 20;

/// Renders `level` in [0, 1] as a fixed width text gauge.
pub fn level_bar(level: f64, width: usize) -> String {
    let level = level.clamp(0.0, 1.0);
    let filled = (level * width as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        ".".repeat(width - filled),
        level * 100.0
    )
}

/// Two blank cells painted with `color` using 24-bit ANSI escapes.
pub fn color_swatch(color: DisplayColor) -> String {
    let (r, g, b) = color.rgb();
    format!("\x1b[48;2;{r};{g};{b}m  \x1b[0m")
}

/// One dimmed display, driven by the severity channel only.
pub struct DimmingSurface {
    name: String,
    level: f64,
    /// Level changes below this are not reported.
    min_step: f64,
    changes: usize,
}

impl DimmingSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: 0.0,
            min_step: 0.01,
            changes: 0,
        }
    }

    pub fn with_min_step(mut self, min_step: f64) -> Self {
        self.min_step = min_step;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// How many times the level visibly changed.
    pub fn changes(&self) -> usize {
        self.changes
    }
}

impl PostureConsumer for DimmingSurface {
    fn on_result(&mut self, severity: f64) {
        let severity = severity.clamp(0.0, 1.0);
        if (severity - self.level).abs() < self.min_step {
            return;
        }
        self.level = severity;
        self.changes += 1;
        info!("{} dimming {}", self.name, level_bar(severity, BAR_WIDTH));
    }

    fn on_status(&mut self, _label: StatusLabel, _color: DisplayColor) {}

    fn on_close(&mut self) {
        debug!("{} released at level {:.2}", self.name, self.level);
    }
}

/// Textual posture status, driven by the status channel only.
#[derive(Default)]
pub struct StatusIndicator {
    current: Option<(StatusLabel, DisplayColor)>,
    changes: usize,
    ansi_color: bool,
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes every report with a swatch of the status color.
    pub fn with_ansi_color(mut self, ansi_color: bool) -> Self {
        self.ansi_color = ansi_color;
        self
    }

    fn report(&self, label: StatusLabel, color: DisplayColor) -> String {
        let swatch = if self.ansi_color {
            format!("{} ", color_swatch(color))
        } else {
            String::new()
        };
        format!("{swatch}Posture: {} ({color})", label.message())
    }

    pub fn current(&self) -> Option<(StatusLabel, DisplayColor)> {
        self.current
    }

    pub fn changes(&self) -> usize {
        self.changes
    }
}

impl PostureConsumer for StatusIndicator {
    fn on_result(&mut self, _severity: f64) {}

    fn on_status(&mut self, label: StatusLabel, color: DisplayColor) {
        if self.current == Some((label, color)) {
            return;
        }
        self.current = Some((label, color));
        self.changes += 1;
        let report = self.report(label, color);
        if label.is_bad() {
            warn!("{report}");
        } else {
            info!("{report}");
        }
    }

    fn on_close(&mut self) {
        if let Some((label, _)) = self.current {
            debug!("Status indicator closed on {label}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_level_bar() {
        assert_eq!(level_bar(0.0, 4), "[....]   0%");
        assert_eq!(level_bar(0.85, 20), "[#################...]  85%");
        assert_eq!(level_bar(3.0, 4), "[####] 100%");
    }

    #[test]
    fn test_dimming_follows_severity() {
        let mut surface = DimmingSurface::new("left");
        surface.on_result(0.85);
        assert_relative_eq!(surface.level(), 0.85);
        surface.on_result(0.855);
        assert_relative_eq!(surface.level(), 0.85);
        surface.on_status(StatusLabel::Good, DisplayColor::SUCCESS);
        assert_relative_eq!(surface.level(), 0.85);
        surface.on_result(0.0);
        assert_eq!(surface.level(), 0.0);
        assert_eq!(surface.changes(), 2);
        assert_eq!(surface.name(), "left");
    }

    #[test]
    fn test_indicator_reports_changes_only() {
        let mut indicator = StatusIndicator::new();
        assert_eq!(indicator.current(), None);
        indicator.on_status(StatusLabel::Uncalibrated, DisplayColor::ACCENT);
        indicator.on_status(StatusLabel::Uncalibrated, DisplayColor::ACCENT);
        indicator.on_result(0.85);
        indicator.on_status(StatusLabel::FullSlouch, DisplayColor::DANGER);
        assert_eq!(
            indicator.current(),
            Some((StatusLabel::FullSlouch, DisplayColor::DANGER))
        );
        assert_eq!(indicator.changes(), 2);
    }

    #[test]
    fn test_color_swatch() {
        assert_eq!(color_swatch(DisplayColor::DANGER), "\x1b[48;2;231;76;60m  \x1b[0m");
        let plain = StatusIndicator::new();
        assert_eq!(
            plain.report(StatusLabel::Good, DisplayColor::SUCCESS),
            format!("Posture: {} (#2ecc71)", StatusLabel::Good.message())
        );
        let colored = StatusIndicator::new().with_ansi_color(true);
        assert!(colored
            .report(StatusLabel::Good, DisplayColor::SUCCESS)
            .starts_with("\x1b[48;2;46;204;113m  \x1b[0m Posture: "));
    }
}
