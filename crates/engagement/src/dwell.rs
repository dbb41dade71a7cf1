//! Observation to category mapping with episode durations

use std::time::Instant;

use dms::{GazeSample, HorizontalGaze, VerticalGaze, ZoneClassification};
use tracing::debug;

use crate::{EngagementCategory, EngagementConfig};

/// Tracks how long the driver has stayed in the current category
pub struct DwellTracker {
    ear_closed_threshold: f64,
    check_threshold_secs: f64,
    episode: Option<(EngagementCategory, Instant)>,
}

impl DwellTracker {
    pub fn new(ear_closed_threshold: f64, config: &EngagementConfig) -> Self {
        Self {
            ear_closed_threshold,
            check_threshold_secs: config.positive_threshold_secs,
            episode: None,
        }
    }

    /// Base category of a sample, before prolonged checks are split out
    pub fn categorize(&self, sample: &GazeSample, zone: Option<&ZoneClassification>) -> EngagementCategory {
        if dms::blink::eyes_closed(sample.ear_left, sample.ear_right, self.ear_closed_threshold) {
            return EngagementCategory::ClosedEyes;
        }

        match zone {
            Some(ZoneClassification::InsideRoad) => EngagementCategory::RoadFocus,
            Some(ZoneClassification::FixedZone(zone)) if zone.is_mirror() => EngagementCategory::MirrorCheck,
            Some(ZoneClassification::FixedZone(_)) => EngagementCategory::DashboardCheck,
            Some(ZoneClassification::Unclassified) => EngagementCategory::OffRoadGaze,
            None => match (sample.horizontal, sample.vertical) {
                (HorizontalGaze::Straight, VerticalGaze::Straight) => EngagementCategory::RoadFocus,
                (HorizontalGaze::Straight, _) => EngagementCategory::DashboardCheck,
                _ => EngagementCategory::OffRoadGaze,
            },
        }
    }

    /// Categorize a sample and report how long its episode has lasted (seconds)
    pub fn observe(
        &mut self,
        sample: &GazeSample,
        zone: Option<&ZoneClassification>,
        now: Instant,
    ) -> (EngagementCategory, f64) {
        let base = self.categorize(sample, zone);

        let started = match self.episode {
            Some((current, started)) if current == base => started,
            _ => {
                debug!("Engagement episode started: {}", base);
                self.episode = Some((base, now));
                now
            }
        };
        let duration = now.saturating_duration_since(started).as_secs_f64();

        let category = match base {
            EngagementCategory::MirrorCheck | EngagementCategory::DashboardCheck
                if duration > self.check_threshold_secs =>
            {
                EngagementCategory::ProlongedCheck
            }
            other => other,
        };
        (category, duration)
    }

    /// End the current episode, e.g. on a frame without a sample
    pub fn interrupt(&mut self) {
        self.episode = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::testing::eye_region_at;
    use dms::{FixedZone, Point};
    use std::time::Duration;

    fn sample(dx: i32, dy: i32) -> GazeSample {
        let left = eye_region_at(Point::new(50, 50));
        let right = eye_region_at(Point::new(150, 50));
        GazeSample::from_eyes(
            left,
            right,
            Some(Point::new(50 + dx, 50 + dy)),
            Some(Point::new(150 + dx, 50 + dy)),
            0,
        )
        .unwrap()
    }

    fn tracker() -> DwellTracker {
        DwellTracker::new(0.2, &EngagementConfig::default())
    }

    #[test]
    fn test_zone_mapping() {
        let t = tracker();
        let s = sample(0, 0);
        assert_eq!(t.categorize(&s, Some(&ZoneClassification::InsideRoad)), EngagementCategory::RoadFocus);
        assert_eq!(
            t.categorize(&s, Some(&ZoneClassification::FixedZone(FixedZone::LeftMirror))),
            EngagementCategory::MirrorCheck
        );
        assert_eq!(
            t.categorize(&s, Some(&ZoneClassification::FixedZone(FixedZone::RightMirror))),
            EngagementCategory::MirrorCheck
        );
        assert_eq!(
            t.categorize(&s, Some(&ZoneClassification::FixedZone(FixedZone::Dashboard))),
            EngagementCategory::DashboardCheck
        );
        assert_eq!(t.categorize(&s, Some(&ZoneClassification::Unclassified)), EngagementCategory::OffRoadGaze);
    }

    #[test]
    fn test_direction_mapping_without_calibration() {
        let t = tracker();
        assert_eq!(t.categorize(&sample(0, 0), None), EngagementCategory::RoadFocus);
        assert_eq!(t.categorize(&sample(0, 3), None), EngagementCategory::DashboardCheck);
        assert_eq!(t.categorize(&sample(4, 0), None), EngagementCategory::OffRoadGaze);
        assert_eq!(t.categorize(&sample(-4, 3), None), EngagementCategory::OffRoadGaze);
    }

    #[test]
    fn test_closed_eyes_take_precedence() {
        let t = tracker();
        let mut s = sample(0, 0);
        s.ear_left = 0.1;
        s.ear_right = 0.15;
        assert_eq!(t.categorize(&s, Some(&ZoneClassification::InsideRoad)), EngagementCategory::ClosedEyes);

        // One open eye is not a closure
        s.ear_right = 0.3;
        assert_eq!(t.categorize(&s, Some(&ZoneClassification::InsideRoad)), EngagementCategory::RoadFocus);
    }

    #[test]
    fn test_episode_duration() {
        let mut t = tracker();
        let s = sample(0, 0);
        let start = Instant::now();
        let road = Some(&ZoneClassification::InsideRoad);

        assert_eq!(t.observe(&s, road, start), (EngagementCategory::RoadFocus, 0.0));
        let (_, d) = t.observe(&s, road, start + Duration::from_millis(1500));
        assert_eq!(d, 1.5);

        // Category change starts a new episode
        let off = Some(&ZoneClassification::Unclassified);
        assert_eq!(t.observe(&s, off, start + Duration::from_secs(2)), (EngagementCategory::OffRoadGaze, 0.0));
    }

    #[test]
    fn test_long_mirror_check_becomes_prolonged() {
        let mut t = tracker();
        let s = sample(0, 0);
        let start = Instant::now();
        let mirror = ZoneClassification::FixedZone(FixedZone::RearMirror);

        assert_eq!(t.observe(&s, Some(&mirror), start).0, EngagementCategory::MirrorCheck);
        assert_eq!(
            t.observe(&s, Some(&mirror), start + Duration::from_secs(2)).0,
            EngagementCategory::MirrorCheck
        );
        let (category, duration) = t.observe(&s, Some(&mirror), start + Duration::from_secs(3));
        assert_eq!(category, EngagementCategory::ProlongedCheck);
        assert_eq!(duration, 3.0);
    }

    #[test]
    fn test_interrupt_restarts_episode() {
        let mut t = tracker();
        let s = sample(0, 0);
        let start = Instant::now();
        t.observe(&s, None, start);
        t.interrupt();
        assert_eq!(t.observe(&s, None, start + Duration::from_secs(4)).1, 0.0);
    }
}
