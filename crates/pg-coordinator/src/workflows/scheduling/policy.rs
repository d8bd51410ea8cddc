use chrono::{Datelike, Duration, NaiveDateTime, Weekday};

use crate::workflows::directory::same_label;

pub const DEFAULT_ENABLED_UNIT: &str = "Belém";
pub const DEFAULT_CONFLICT_WINDOW_MINUTES: i64 = 30;
/// Upper bound for the conflict window: one week.
pub const MAX_CONFLICT_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Unit eligibility and conflict buffer used by the scheduling engine.
#[derive(Debug, Clone)]
pub struct SchedulingPolicy {
    enabled_unit: String,
    conflict_window: Duration,
}

impl SchedulingPolicy {
    pub fn new(enabled_unit: impl Into<String>, conflict_window_minutes: i64) -> Self {
        let enabled_unit = enabled_unit.into();
        let enabled_unit = if enabled_unit.trim().is_empty() {
            DEFAULT_ENABLED_UNIT.to_string()
        } else {
            enabled_unit.trim().to_string()
        };
        let minutes = if conflict_window_minutes > 0 {
            conflict_window_minutes.min(MAX_CONFLICT_WINDOW_MINUTES)
        } else {
            DEFAULT_CONFLICT_WINDOW_MINUTES
        };
        let conflict_window = Duration::try_minutes(minutes)
            .unwrap_or_else(|| Duration::minutes(DEFAULT_CONFLICT_WINDOW_MINUTES));

        Self {
            enabled_unit,
            conflict_window,
        }
    }

    pub fn enabled_unit(&self) -> &str {
        &self.enabled_unit
    }

    pub fn conflict_window(&self) -> Duration {
        self.conflict_window
    }

    pub fn is_enabled_for(&self, unit: &str) -> bool {
        same_label(unit, &self.enabled_unit)
    }
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ENABLED_UNIT, DEFAULT_CONFLICT_WINDOW_MINUTES)
    }
}

/// The chaplaincy has no weekend coverage.
pub fn is_weekend(at: NaiveDateTime) -> bool {
    matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}
