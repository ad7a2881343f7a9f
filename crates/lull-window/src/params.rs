// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Windowing parameters.

use chrono::TimeDelta;
use lull_config::model::WindowConfig;

/// Thresholds shared by the reactive engine and the idle sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    /// Messages needed before any classification is attempted.
    pub min_cluster: usize,
    /// Consecutive messages closer than this count as clustered.
    pub start_gap: TimeDelta,
    /// A window spanning more than this ends an active conversation.
    pub end_gap: TimeDelta,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            min_cluster: 5,
            start_gap: TimeDelta::minutes(15),
            end_gap: TimeDelta::minutes(60),
        }
    }
}

impl From<&WindowConfig> for WindowParams {
    fn from(config: &WindowConfig) -> Self {
        Self {
            min_cluster: config.min_cluster,
            start_gap: secs(config.start_gap_secs),
            end_gap: secs(config.end_gap_secs),
        }
    }
}

pub(crate) fn secs(value: u64) -> TimeDelta {
    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}
