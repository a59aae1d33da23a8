//! Text rendering of the preview landmarks: the skeleton drawn on a character grid.

use cu_posture_payloads::{PoseLandmarks, PreviewFrame, POSE_CONNECTIONS, PREVIEW_LANDMARKS};
use cu_posture_runtime::PreviewConsumer;
use log::{debug, info};

const BONE: char = '*';
const JOINT: char = 'o';

/// Draws the upper body skeleton of every preview frame and logs one frame out of `report_every`.
pub struct SkeletonPreview {
    width: u32,
    height: u32,
    report_every: u64,
    frames: u64,
    last: Option<Vec<String>>,
}

impl SkeletonPreview {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            report_every: 30,
            frames: 0,
            last: None,
        }
    }

    pub fn with_report_every(mut self, report_every: u64) -> Self {
        self.report_every = report_every.max(1);
        self
    }

    /// The grid rows for `landmarks`, None without normalized landmarks.
    /// Connections and joints pointing past the available landmarks are skipped.
    pub fn render(&self, landmarks: &PoseLandmarks) -> Option<Vec<String>> {
        let points = &landmarks.normalized;
        if points.is_empty() {
            return None;
        }
        let cell = |index: usize| {
            let (x, y) = points[index].to_pixel(self.width, self.height);
            (x.min(self.width - 1), y.min(self.height - 1))
        };

        let mut grid = vec![vec![' '; self.width as usize]; self.height as usize];
        for (a, b) in POSE_CONNECTIONS {
            if a >= points.len() || b >= points.len() {
                continue;
            }
            draw_line(&mut grid, cell(a), cell(b));
        }
        for index in PREVIEW_LANDMARKS {
            if index >= points.len() {
                continue;
            }
            let (x, y) = cell(index);
            grid[y as usize][x as usize] = JOINT;
        }
        Some(grid.into_iter().map(|row| row.into_iter().collect()).collect())
    }

    /// The last rendered grid, None if the last frame had no pose.
    pub fn last(&self) -> Option<&[String]> {
        self.last.as_deref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

// Bresenham, both ends inside the grid.
fn draw_line(grid: &mut [Vec<char>], from: (u32, u32), to: (u32, u32)) {
    let (mut x, mut y) = (from.0 as i64, from.1 as i64);
    let (x1, y1) = (to.0 as i64, to.1 as i64);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        grid[y as usize][x as usize] = BONE;
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

impl PreviewConsumer for SkeletonPreview {
    fn on_preview(&mut self, frame: &PreviewFrame) {
        let rows = frame.landmarks.as_ref().and_then(|l| self.render(l));
        if self.frames % self.report_every == 0 {
            match &rows {
                Some(rows) => info!("Preview at {}:\n{}", frame.timestamp, rows.join("\n")),
                None => info!("Preview at {}: nobody in view", frame.timestamp),
            }
        }
        self.frames += 1;
        self.last = rows;
    }

    fn on_close(&mut self) {
        debug!("Preview closed after {} frames", self.frames);
    }
}
