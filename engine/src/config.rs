//! Configuration management for the registration engine.
//!
//! Loads configuration from environment variables with sensible defaults. Invalid
//! values fall back to the default rather than failing startup.

use crate::eligibility::FormSettings;
use crate::schedule::{ConflictPolicy, ScheduleRules};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::env;

/// Largest accepted offset magnitude, just under one day
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Conflict rule for time-bound items (default: containment)
    pub conflict_policy: ConflictPolicy,
    /// Event-local UTC offset in minutes, used for calendar dates (default: 0)
    pub utc_offset_minutes: i32,
    /// Whether registrants may pick several items (default: false)
    pub allow_multi_select: bool,
    /// Log filter used when `RUST_LOG` is not set (default: info)
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            utc_offset_minutes: 0,
            allow_multi_select: false,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// - `REGISTRATION_CONFLICT_POLICY`: `containment` or `overlap`
    /// - `REGISTRATION_UTC_OFFSET_MINUTES`: signed minutes east of UTC
    /// - `REGISTRATION_ALLOW_MULTI_SELECT`: `true` or `false`
    /// - `RUST_LOG`: log filter
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            conflict_policy: lookup("REGISTRATION_CONFLICT_POLICY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.conflict_policy),
            utc_offset_minutes: lookup("REGISTRATION_UTC_OFFSET_MINUTES")
                .and_then(|s| s.trim().parse().ok())
                .filter(|minutes: &i32| minutes.abs() <= MAX_OFFSET_MINUTES)
                .unwrap_or(defaults.utc_offset_minutes),
            allow_multi_select: lookup("REGISTRATION_ALLOW_MULTI_SELECT")
                .and_then(|s| s.trim().to_ascii_lowercase().parse().ok())
                .unwrap_or(defaults.allow_multi_select),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// UTC offset as a `chrono` offset
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Scheduling context for the schedule and selection modules
    #[must_use]
    pub fn schedule_rules(&self) -> ScheduleRules {
        ScheduleRules::new(self.conflict_policy, self.offset())
    }

    /// Form-level settings for the eligibility resolver
    #[must_use]
    pub const fn form_settings(&self) -> FormSettings {
        FormSettings {
            allow_multi_select: self.allow_multi_select,
        }
    }
}
