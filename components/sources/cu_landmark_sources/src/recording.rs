use bincode::{Decode, Encode};
use cu29_clock::{CuDuration, CuTime};
use cu_posture_payloads::FrameResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Recording I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid RON recording: {0}")]
    RonSyntax(#[from] ron::error::SpannedError),

    #[error("Could not write RON recording: {0}")]
    RonWrite(#[from] ron::Error),

    #[error("Could not encode recording: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Could not decode recording: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Frame {index} at {timestamp} does not come after the previous frame")]
    NonMonotonic { index: usize, timestamp: CuTime },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ron,
    Bincode,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Format::Ron,
            _ => Format::Bincode,
        }
    }
}

/// A captured session: the sequence of source results, `NoFrame` gaps included.
#[derive(Debug, Clone, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct Recording {
    pub frames: Vec<FrameResult>,
}

impl Recording {
    pub fn new(frames: Vec<FrameResult>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn push(&mut self, frame: FrameResult) {
        self.frames.push(frame);
    }

    pub fn first_timestamp(&self) -> Option<CuTime> {
        self.frames.iter().find_map(FrameResult::timestamp)
    }

    pub fn last_timestamp(&self) -> Option<CuTime> {
        self.frames.iter().rev().find_map(FrameResult::timestamp)
    }

    /// Time between the first and the last timestamped frame.
    pub fn span(&self) -> CuDuration {
        match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => CuDuration(last.0.saturating_sub(first.0)),
            _ => CuDuration(0),
        }
    }

    /// Checks that timestamps strictly increase, as a live source would deliver them.
    pub fn validate(&self) -> Result<(), RecordingError> {
        let mut last: Option<CuTime> = None;
        for (index, frame) in self.frames.iter().enumerate() {
            let Some(timestamp) = frame.timestamp() else {
                continue;
            };
            if last.is_some_and(|last| timestamp <= last) {
                return Err(RecordingError::NonMonotonic { index, timestamp });
            }
            last = Some(timestamp);
        }
        Ok(())
    }

    /// Loads a recording, RON for a `.ron` file and bincode otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordingError> {
        let path = path.as_ref();
        let recording: Recording = match Format::from_path(path) {
            Format::Ron => ron::from_str(&std::fs::read_to_string(path)?)?,
            Format::Bincode => {
                let mut reader = BufReader::new(File::open(path)?);
                bincode::decode_from_std_read(&mut reader, bincode::config::standard())?
            }
        };
        recording.validate()?;
        Ok(recording)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RecordingError> {
        let path = path.as_ref();
        match Format::from_path(path) {
            Format::Ron => {
                let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
                std::fs::write(path, text)?;
            }
            Format::Bincode => {
                let mut writer = BufWriter::new(File::create(path)?);
                bincode::encode_into_std_write(self, &mut writer, bincode::config::standard())?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

impl From<Vec<FrameResult>> for Recording {
    fn from(frames: Vec<FrameResult>) -> Self {
        Self::new(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_pose(ts: u64) -> FrameResult {
        FrameResult::FrameNoPose {
            timestamp: CuDuration(ts),
        }
    }

    #[test]
    fn test_span_skips_gaps() {
        let recording = Recording::new(vec![
            FrameResult::NoFrame,
            no_pose(10),
            FrameResult::NoFrame,
            no_pose(40),
            FrameResult::NoFrame,
        ]);
        assert_eq!(recording.first_timestamp(), Some(CuDuration(10)));
        assert_eq!(recording.last_timestamp(), Some(CuDuration(40)));
        assert_eq!(recording.span(), CuDuration(30));
        assert_eq!(Recording::default().span(), CuDuration(0));
    }

    #[test]
    fn test_validate() {
        assert!(Recording::new(vec![no_pose(1), FrameResult::NoFrame, no_pose(2)])
            .validate()
            .is_ok());
        let err = Recording::new(vec![no_pose(2), no_pose(2)]).validate().unwrap_err();
        assert!(matches!(err, RecordingError::NonMonotonic { index: 1, .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("session.ron")), Format::Ron);
        assert_eq!(Format::from_path(Path::new("session.RON")), Format::Ron);
        assert_eq!(Format::from_path(Path::new("session.bin")), Format::Bincode);
        assert_eq!(Format::from_path(Path::new("session")), Format::Bincode);
    }

    #[test]
    fn test_rejects_corrupted_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(&path, "(frames: [Nope])").unwrap();
        assert!(matches!(
            Recording::load(&path),
            Err(RecordingError::RonSyntax(_))
        ));
        let path = dir.path().join("broken.bin");
        std::fs::write(&path, [0xffu8; 3]).unwrap();
        assert!(matches!(Recording::load(&path), Err(RecordingError::Decode(_))));
        assert!(matches!(
            Recording::load(dir.path().join("missing.bin")),
            Err(RecordingError::Io(_))
        ));
    }
}
