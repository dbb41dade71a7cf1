//! Engagement window accumulation

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::category::{engagement_percentage, EngagementCategory};

/// Engagement scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Threshold for mirror and dashboard checks (seconds)
    pub positive_threshold_secs: f64,
    /// Threshold for off-road and prolonged checks (seconds)
    pub negative_threshold_secs: f64,
    /// Only the most recent N samples count; `None` keeps the whole session
    pub window_size: Option<usize>,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            positive_threshold_secs: 2.0,
            negative_threshold_secs: 2.0,
            window_size: None,
        }
    }
}

/// Running per-category scores plus the number of scored samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementWindow {
    scores: HashMap<EngagementCategory, i64>,
    samples: usize,
}

impl EngagementWindow {
    fn add(&mut self, category: EngagementCategory, score: i32) {
        *self.scores.entry(category).or_insert(0) += i64::from(score);
        self.samples += 1;
    }

    fn remove(&mut self, category: EngagementCategory, score: i32) {
        if let Some(total) = self.scores.get_mut(&category) {
            *total -= i64::from(score);
        }
        self.samples = self.samples.saturating_sub(1);
    }

    pub fn category_score(&self, category: EngagementCategory) -> i64 {
        self.scores.get(&category).copied().unwrap_or(0)
    }

    pub fn score(&self) -> i64 {
        self.scores.values().sum()
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// Aggregates scored samples into an engagement percentage
pub struct EngagementScorer {
    config: EngagementConfig,
    window: EngagementWindow,
    /// Scored samples still inside the rolling window
    recent: VecDeque<(EngagementCategory, i32)>,
}

impl EngagementScorer {
    pub fn new(config: EngagementConfig) -> Self {
        Self {
            config,
            window: EngagementWindow::default(),
            recent: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    /// Score and record one sample, returning its individual score
    pub fn record(&mut self, category: EngagementCategory, duration_secs: f64) -> i32 {
        let score = category.score(duration_secs, &self.config);
        self.window.add(category, score);

        if let Some(size) = self.config.window_size {
            self.recent.push_back((category, score));
            while self.recent.len() > size.max(1) {
                if let Some((old_category, old_score)) = self.recent.pop_front() {
                    self.window.remove(old_category, old_score);
                }
            }
        }

        debug!("Scored {} ({:.2}s) = {:+}", category, duration_secs, score);
        score
    }

    pub fn score(&self) -> i64 {
        self.window.score()
    }

    pub fn samples(&self) -> usize {
        self.window.samples()
    }

    pub fn category_score(&self, category: EngagementCategory) -> i64 {
        self.window.category_score(category)
    }

    pub fn percentage(&self) -> f64 {
        engagement_percentage(self.window.score(), self.window.samples())
    }

    pub fn window(&self) -> &EngagementWindow {
        &self.window
    }

    pub fn reset(&mut self) {
        self.window = EngagementWindow::default();
        self.recent.clear();
    }
}

impl Default for EngagementScorer {
    fn default() -> Self {
        Self::new(EngagementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scripted_session() {
        let mut scorer = EngagementScorer::default();
        for _ in 0..6 {
            scorer.record(EngagementCategory::RoadFocus, 0.0);
        }
        scorer.record(EngagementCategory::MirrorCheck, 1.0);
        scorer.record(EngagementCategory::MirrorCheck, 1.0);
        scorer.record(EngagementCategory::OffRoadGaze, 3.0);
        scorer.record(EngagementCategory::ClosedEyes, 0.5);

        assert_eq!(scorer.samples(), 10);
        assert_eq!(scorer.score(), 6);
        assert_eq!(scorer.percentage(), 80.0);
        assert_eq!(scorer.category_score(EngagementCategory::RoadFocus), 6);
        assert_eq!(scorer.category_score(EngagementCategory::MirrorCheck), 2);
        assert_eq!(scorer.category_score(EngagementCategory::OffRoadGaze), -1);
        assert_eq!(scorer.category_score(EngagementCategory::ClosedEyes), -1);
        assert_eq!(scorer.category_score(EngagementCategory::DashboardCheck), 0);
    }

    #[test]
    fn test_empty_scorer() {
        let scorer = EngagementScorer::default();
        assert_eq!(scorer.score(), 0);
        assert_eq!(scorer.percentage(), 0.0);
    }

    #[test]
    fn test_rolling_window_forgets_old_samples() {
        let config = EngagementConfig {
            window_size: Some(3),
            ..Default::default()
        };
        let mut scorer = EngagementScorer::new(config);
        for _ in 0..3 {
            scorer.record(EngagementCategory::OffRoadGaze, 5.0);
        }
        assert_eq!(scorer.percentage(), 0.0);

        for _ in 0..3 {
            scorer.record(EngagementCategory::RoadFocus, 0.0);
        }
        assert_eq!(scorer.samples(), 3);
        assert_eq!(scorer.score(), 3);
        assert_eq!(scorer.category_score(EngagementCategory::OffRoadGaze), 0);
        assert_eq!(scorer.percentage(), 100.0);
    }

    #[test]
    fn test_reset() {
        let mut scorer = EngagementScorer::default();
        scorer.record(EngagementCategory::RoadFocus, 0.0);
        scorer.reset();
        assert_eq!(scorer.samples(), 0);
        assert_eq!(scorer.score(), 0);
    }

    fn any_category() -> impl Strategy<Value = EngagementCategory> {
        (0usize..6).prop_map(|i| EngagementCategory::ALL[i])
    }

    proptest! {
        #[test]
        fn percentage_is_bounded(
            samples in proptest::collection::vec((any_category(), 0.0f64..10.0), 1..200),
            window in proptest::option::of(1usize..50),
        ) {
            let mut scorer = EngagementScorer::new(EngagementConfig { window_size: window, ..Default::default() });
            for (category, duration) in samples {
                scorer.record(category, duration);
                let pct = scorer.percentage();
                prop_assert!((0.0..=100.0).contains(&pct));
            }
        }
    }
}
