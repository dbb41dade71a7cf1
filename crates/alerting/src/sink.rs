//! Audible alert output

use std::path::Path;
use tracing::warn;

use crate::AlertError;

/// Destination for audible alerts
pub trait AlertSink: Send {
    fn play_alert_sound(&mut self, path: &Path) -> Result<(), AlertError>;
}

/// Sink that records alerts in the log instead of playing audio
#[derive(Debug, Default)]
pub struct LoggingAlertSink {
    played: usize,
    check_files: bool,
}

impl LoggingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that fails like a real player when the sound file is unusable
    pub fn checked() -> Self {
        Self {
            played: 0,
            check_files: true,
        }
    }

    /// Number of alerts handed to this sink
    pub fn played(&self) -> usize {
        self.played
    }
}

impl AlertSink for LoggingAlertSink {
    fn play_alert_sound(&mut self, path: &Path) -> Result<(), AlertError> {
        if self.check_files {
            if !path.exists() {
                return Err(AlertError::SoundNotFound(path.to_path_buf()));
            }
            if !path.is_file() {
                return Err(AlertError::Playback(format!("{} is not a file", path.display())));
            }
        }
        self.played += 1;
        warn!("ALERT: playing {}", path.display());
        Ok(())
    }
}

impl<S: AlertSink + ?Sized> AlertSink for Box<S> {
    fn play_alert_sound(&mut self, path: &Path) -> Result<(), AlertError> {
        (**self).play_alert_sound(path)
    }
}
