//! Session pipeline
//!
//! One camera read, one full pipeline pass and one scoring update per loop
//! iteration. All mutable state is owned by the session and touched from a
//! single task.

use std::sync::Arc;
use std::time::Instant;

use alerting::{AlertSink, DistractionMonitor, DistractionStatus};
use camera_capture::{CameraHandle, CameraOpener, FrameSource, VideoFrame};
use chrono::{DateTime, Utc};
use dms::{
    CalibrationLabel, CalibrationModel, CalibrationProcedure, CalibrationStep, FrameAnalysis,
    GazeTracker, LandmarkSource, OperatorInput, Position, PositionGate, ScreenMapper,
    ZoneClassification, ZoneStrategy,
};
use engagement::{DwellTracker, EngagementCategory, EngagementScorer};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use storage::{GazeRecord, Repository};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::{MonitorConfig, SessionError};

/// Result of processing one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub analysis: FrameAnalysis,
    /// Mapped gaze position, when calibrated
    pub screen: Option<Position>,
    pub zone: Option<ZoneClassification>,
    /// Scored category and its episode duration (seconds)
    pub category: Option<(EngagementCategory, f64)>,
    pub distraction: DistractionStatus,
}

/// Totals reported when a session ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub frames: u64,
    pub samples: u64,
    pub score: i64,
    pub percentage: f64,
    pub alerts: usize,
}

/// Calibrated mapping stage
struct Calibrated {
    model: CalibrationModel,
    mapper: ScreenMapper,
    zones: Box<dyn ZoneStrategy>,
}

/// Caller-owned pipeline context for one driving session
pub struct Session<S: FrameSource, L: LandmarkSource, A: AlertSink> {
    config: MonitorConfig,
    camera: CameraHandle<S>,
    tracker: GazeTracker<L>,
    calibrated: Option<Calibrated>,
    dwell: DwellTracker,
    scorer: EngagementScorer,
    monitor: DistractionMonitor,
    sink: A,
    repository: Arc<Repository>,
    /// Wall-clock time of frame timestamp zero
    started_at: DateTime<Utc>,
    frames: u64,
    samples: u64,
}

impl<S: FrameSource, L: LandmarkSource, A: AlertSink> Session<S, L, A> {
    pub fn new(config: MonitorConfig, source: S, landmarks: L, sink: A) -> Self {
        Self::with_camera(config, CameraHandle::new(source), landmarks, sink)
    }

    /// Open the configured camera device through `opener`
    pub fn open<O>(config: MonitorConfig, opener: &mut O, landmarks: L, sink: A) -> Result<Self, SessionError>
    where
        O: CameraOpener<Source = S>,
    {
        let camera = CameraHandle::open(opener, &config.camera)?;
        Ok(Self::with_camera(config, camera, landmarks, sink))
    }

    fn with_camera(config: MonitorConfig, camera: CameraHandle<S>, landmarks: L, sink: A) -> Self {
        info!(
            "Creating session (camera {}, {} fps, zone strategy {:?})",
            config.camera.device_index, config.camera.fps, config.dms.zone_strategy
        );
        Self {
            camera,
            tracker: GazeTracker::new(&config.dms, landmarks),
            calibrated: None,
            dwell: DwellTracker::new(config.dms.ear_closed_threshold, &config.engagement),
            scorer: EngagementScorer::new(config.engagement.clone()),
            monitor: DistractionMonitor::new(config.alerting.clone()),
            sink,
            repository: Arc::new(Repository::new()),
            started_at: Utc::now(),
            frames: 0,
            samples: 0,
            config,
        }
    }

    /// Share a repository with other consumers
    pub fn with_repository(mut self, repository: Arc<Repository>) -> Self {
        self.repository = repository;
        self
    }

    /// Anchor frame timestamps to a wall-clock start time
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Install a completed calibration; mapping and zone classification start with the next frame
    pub fn set_calibration(&mut self, model: CalibrationModel) -> Result<(), SessionError> {
        let mapper = ScreenMapper::new(Some(&model))?;
        let zones = dms::zone_strategy(&self.config.dms, Some(&model))?;
        info!("Calibration installed, zone strategy: {}", zones.name());
        self.calibrated = Some(Calibrated { model, mapper, zones });
        Ok(())
    }

    pub fn calibration(&self) -> Option<&CalibrationModel> {
        self.calibrated.as_ref().map(|c| &c.model)
    }

    /// Run the operator-paced calibration before tracking.
    ///
    /// `input` is shown every step and returns the operator's response,
    /// which is applied together with the next frame.
    pub fn calibrate<F>(
        &mut self,
        targets: Option<Vec<CalibrationLabel>>,
        position_gate: bool,
        mut input: F,
    ) -> Result<CalibrationModel, SessionError>
    where
        F: FnMut(&CalibrationStep) -> Option<OperatorInput>,
    {
        let mut procedure = CalibrationProcedure::new(&self.config.dms);
        if let Some(targets) = targets {
            procedure = procedure.with_targets(targets)?;
        }
        if position_gate {
            procedure = procedure.with_position_gate(PositionGate::new(&self.config.dms));
        }
        info!("Calibration started with {} targets", procedure.targets().len());

        let mut pending = None;
        loop {
            let frame = self.camera.read()?.ok_or(SessionError::CameraEnded)?;
            let analysis = self.tracker.analyze(&frame)?;

            match procedure.step(&analysis, Instant::now(), pending.take())? {
                CalibrationStep::Complete(model) => {
                    self.set_calibration(model.clone())?;
                    return Ok(model);
                }
                CalibrationStep::Cancelled => return Err(SessionError::CalibrationCancelled),
                step => pending = input(&step),
            }
        }
    }

    /// Run one frame through the pipeline
    pub fn process_frame(&mut self, frame: &VideoFrame, now: Instant) -> Result<FrameReport, SessionError> {
        let analysis = self.tracker.analyze(frame)?;
        self.frames += 1;
        counter!("gaze_frames_total").increment(1);

        let distraction = self.monitor.observe(analysis.has_sample(), now);
        if distraction.alert {
            counter!("gaze_alerts_total").increment(1);
            if let Err(e) = self.sink.play_alert_sound(&self.config.alerting.alert_sound_path) {
                error!("Failed to play alert: {}", e);
            }
        }

        let mut report = FrameReport {
            analysis,
            screen: None,
            zone: None,
            category: None,
            distraction,
        };

        let Some(sample) = report.analysis.primary_sample() else {
            self.dwell.interrupt();
            counter!("gaze_frames_without_sample_total").increment(1);
            return Ok(report);
        };
        self.samples += 1;
        counter!("gaze_samples_total").increment(1);

        if let Some(calibrated) = &self.calibrated {
            let screen = calibrated.mapper.map(&sample.observation).trunc();
            let zone = calibrated.zones.classify(screen, &sample.features());
            if let Some(record) = gaze_record(screen, &zone, self.frame_time(frame)) {
                self.repository.insert(record)?;
            }
            report.screen = Some(screen);
            report.zone = Some(zone);
        }

        let (category, duration) = self.dwell.observe(sample, report.zone.as_ref(), now);
        self.scorer.record(category, duration);
        gauge!("gaze_engagement_percent").set(self.scorer.percentage());
        report.category = Some((category, duration));

        Ok(report)
    }

    /// Track continuously at the configured frame rate.
    ///
    /// Ends when `stop` is set (or its sender dropped) or when the camera
    /// stops delivering frames. The camera is released on every exit path.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> Result<SessionSummary, SessionError> {
        let mut ticker = tokio::time::interval(self.config.camera.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Session started");

        let result = if *stop.borrow() {
            Ok(())
        } else {
            self.track(&mut ticker, &mut stop).await
        };

        self.camera.close();
        let summary = self.summary();
        info!(
            "Session ended: {} frames, {} samples, engagement {:.1}%, {} alerts",
            summary.frames, summary.samples, summary.percentage, summary.alerts
        );
        result.map(|_| summary)
    }

    async fn track(
        &mut self,
        ticker: &mut tokio::time::Interval,
        stop: &mut watch::Receiver<bool>,
    ) -> Result<(), SessionError> {
        loop {
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        info!("Stop requested");
                        return Ok(());
                    }
                }
                tick = ticker.tick() => {
                    let frame = match self.camera.read()? {
                        Some(frame) => frame,
                        None => {
                            warn!("Frame read failed, ending session");
                            return Ok(());
                        }
                    };
                    let report = self.process_frame(&frame, tick.into_std())?;
                    debug!("Frame {}: {:?}", frame.sequence, report.category);
                }
            }
        }
    }

    /// Wall-clock time a frame was captured at
    fn frame_time(&self, frame: &VideoFrame) -> DateTime<Utc> {
        i64::try_from(frame.timestamp_ns)
            .ok()
            .and_then(|ns| self.started_at.checked_add_signed(chrono::Duration::nanoseconds(ns)))
            .unwrap_or(self.started_at)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            frames: self.frames,
            samples: self.samples,
            score: self.scorer.score(),
            percentage: self.scorer.percentage(),
            alerts: self.monitor.alerts_fired(),
        }
    }

    pub fn scorer(&self) -> &EngagementScorer {
        &self.scorer
    }

    pub fn monitor(&self) -> &DistractionMonitor {
        &self.monitor
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.repository
    }

    pub fn sink(&self) -> &A {
        &self.sink
    }

    pub fn camera(&self) -> &CameraHandle<S> {
        &self.camera
    }
}

/// Persistence record for a classified gaze, if it hit the road or a zone.
/// Screen coordinates are truncated toward zero.
fn gaze_record(screen: Position, zone: &ZoneClassification, timestamp: DateTime<Utc>) -> Option<GazeRecord> {
    match zone {
        ZoneClassification::InsideRoad => Some(GazeRecord::ScreenPosition {
            timestamp,
            screen_x: screen.x.trunc() as i32,
            screen_y: screen.y.trunc() as i32,
        }),
        ZoneClassification::FixedZone(zone) => Some(GazeRecord::FixedPoint {
            timestamp,
            label: zone.as_str().to_string(),
        }),
        ZoneClassification::Unclassified => None,
    }
}
