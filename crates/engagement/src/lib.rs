//! Engagement Scoring
//!
//! Maps classified gaze observations to engagement categories, scores each
//! sample against the category's duration threshold and aggregates the
//! result into a 0-100 engagement percentage.

mod category;
mod dwell;
mod scorer;

pub use category::{
    classify_closed_eyes, classify_negative, classify_positive, engagement_percentage, Criterion,
    EngagementCategory, Polarity,
};
pub use dwell::DwellTracker;
pub use scorer::{EngagementConfig, EngagementScorer, EngagementWindow};
