//! Engagement categories and scoring rules

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::EngagementConfig;

/// Category assigned to a single gaze observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementCategory {
    RoadFocus,
    MirrorCheck,
    DashboardCheck,
    OffRoadGaze,
    ProlongedCheck,
    ClosedEyes,
}

impl EngagementCategory {
    pub const ALL: [EngagementCategory; 6] = [
        EngagementCategory::RoadFocus,
        EngagementCategory::MirrorCheck,
        EngagementCategory::DashboardCheck,
        EngagementCategory::OffRoadGaze,
        EngagementCategory::ProlongedCheck,
        EngagementCategory::ClosedEyes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EngagementCategory::RoadFocus => "road_focus",
            EngagementCategory::MirrorCheck => "mirror_check",
            EngagementCategory::DashboardCheck => "dashboard_check",
            EngagementCategory::OffRoadGaze => "off_road_gaze",
            EngagementCategory::ProlongedCheck => "prolonged_check",
            EngagementCategory::ClosedEyes => "closed_eyes",
        }
    }

    /// Polarity and duration threshold of this category
    pub fn criterion(self, config: &EngagementConfig) -> Criterion {
        match self {
            EngagementCategory::RoadFocus => Criterion::positive(None),
            EngagementCategory::MirrorCheck | EngagementCategory::DashboardCheck => {
                Criterion::positive(Some(config.positive_threshold_secs))
            }
            EngagementCategory::OffRoadGaze | EngagementCategory::ProlongedCheck => {
                Criterion::negative(config.negative_threshold_secs)
            }
            EngagementCategory::ClosedEyes => Criterion::negative(0.0),
        }
    }

    /// Score one sample of this category held for `duration_secs`
    pub fn score(self, duration_secs: f64, config: &EngagementConfig) -> i32 {
        if self == EngagementCategory::ClosedEyes {
            return classify_closed_eyes(duration_secs);
        }
        let criterion = self.criterion(config);
        match criterion.polarity {
            Polarity::Positive => classify_positive(duration_secs, criterion.threshold_secs),
            Polarity::Negative => classify_negative(duration_secs, criterion.threshold_secs.unwrap_or(0.0)),
        }
    }
}

impl fmt::Display for EngagementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub polarity: Polarity,
    pub threshold_secs: Option<f64>,
}

impl Criterion {
    pub fn positive(threshold_secs: Option<f64>) -> Self {
        Self { polarity: Polarity::Positive, threshold_secs }
    }

    pub fn negative(threshold_secs: f64) -> Self {
        Self { polarity: Polarity::Negative, threshold_secs: Some(threshold_secs) }
    }
}

/// Score a positive behaviour: rewarded while short, penalized once it runs long
pub fn classify_positive(duration_secs: f64, threshold_secs: Option<f64>) -> i32 {
    match threshold_secs {
        None => 1,
        Some(t) if duration_secs < t => 1,
        Some(t) if duration_secs == t => 0,
        Some(_) => -1,
    }
}

/// Score a negative behaviour: tolerated while short
pub fn classify_negative(duration_secs: f64, threshold_secs: f64) -> i32 {
    if duration_secs > threshold_secs {
        -1
    } else if duration_secs == threshold_secs {
        if threshold_secs > 0.0 { -1 } else { 0 }
    } else {
        1
    }
}

/// Any measurable eye closure counts against the driver
pub fn classify_closed_eyes(duration_secs: f64) -> i32 {
    if duration_secs > 0.0 { -1 } else { 0 }
}

/// Normalize a signed score over `max_possible` samples into 0-100 (50 is neutral).
///
/// Returns 0 when nothing has been scored yet.
pub fn engagement_percentage(score: i64, max_possible: usize) -> f64 {
    if max_possible == 0 {
        return 0.0;
    }
    let max = max_possible as f64;
    let pct = (score as f64 + max) / (2.0 * max) * 100.0;
    pct.clamp(0.0, 100.0)
}
