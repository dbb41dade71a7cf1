//! Distraction Monitor Implementation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Absence before the "look at the road" warning (seconds)
    pub warning_delay_secs: f64,
    /// Absence before the audible alert (seconds)
    pub alert_delay_secs: f64,
    /// Sound asset handed to the alert sink
    pub alert_sound_path: PathBuf,
    /// Fire the audible alert once per absence episode instead of every frame
    pub debounce_alert: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            warning_delay_secs: 3.0,
            alert_delay_secs: 5.0,
            alert_sound_path: PathBuf::from("assets/alert.wav"),
            debounce_alert: true,
        }
    }
}

impl AlertConfig {
    pub fn warning_delay(&self) -> Duration {
        Duration::from_secs_f64(self.warning_delay_secs.max(0.0))
    }

    pub fn alert_delay(&self) -> Duration {
        Duration::from_secs_f64(self.alert_delay_secs.max(0.0))
    }
}

/// Mutable absence-tracking state
#[derive(Debug, Clone, Default)]
pub struct DistractionState {
    /// Last frame that produced a gaze sample
    pub last_seen: Option<Instant>,
    /// Start of the current absence episode
    pub absent_since: Option<Instant>,
    /// Warning raised during the current episode
    pub warned: bool,
    /// Audible alert fired during the current episode
    pub alerted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPresence {
    Present,
    Absent(Duration),
}

/// Outcome of one observed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistractionStatus {
    pub presence: DriverPresence,
    /// Visual warning should be shown on this frame
    pub warning: bool,
    /// Audible alert should be played on this frame
    pub alert: bool,
}

impl DistractionStatus {
    fn present() -> Self {
        Self {
            presence: DriverPresence::Present,
            warning: false,
            alert: false,
        }
    }
}

/// Timer-driven monitor for missing face/eye detections
pub struct DistractionMonitor {
    config: AlertConfig,
    state: DistractionState,
    alerts_fired: usize,
}

impl DistractionMonitor {
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating distraction monitor with config: {:?}", config);
        Self {
            config,
            state: DistractionState::default(),
            alerts_fired: 0,
        }
    }

    /// Feed one frame: `has_sample` is whether any face yielded a gaze sample
    pub fn observe(&mut self, has_sample: bool, now: Instant) -> DistractionStatus {
        if has_sample {
            if let Some(since) = self.state.absent_since {
                info!(
                    "Driver eyes detected again after {:.1}s",
                    now.saturating_duration_since(since).as_secs_f64()
                );
            }
            self.state = DistractionState {
                last_seen: Some(now),
                ..Default::default()
            };
            return DistractionStatus::present();
        }

        let since = *self.state.absent_since.get_or_insert(now);
        let elapsed = now.saturating_duration_since(since);

        let warning = elapsed >= self.config.warning_delay();
        if warning && !self.state.warned {
            warn!("Look at the road: no eyes detected for {:.1}s", elapsed.as_secs_f64());
            self.state.warned = true;
        }

        let mut alert = false;
        if elapsed >= self.config.alert_delay() {
            if self.config.debounce_alert && self.state.alerted {
                debug!("Alert suppressed: already fired this episode");
            } else {
                alert = true;
                self.state.alerted = true;
                self.alerts_fired += 1;
                warn!("Distraction alert (count: {})", self.alerts_fired);
            }
        }

        DistractionStatus {
            presence: DriverPresence::Absent(elapsed),
            warning,
            alert,
        }
    }

    pub fn state(&self) -> &DistractionState {
        &self.state
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Total audible alerts fired
    pub fn alerts_fired(&self) -> usize {
        self.alerts_fired
    }

    pub fn reset(&mut self) {
        self.state = DistractionState::default();
    }
}

impl Default for DistractionMonitor {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
