// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel admission gate.

use std::collections::BTreeSet;

use lull_core::ChannelKey;

/// Outcome of a tracking change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackChange {
    /// The tracked set was modified.
    Changed,
    /// The channel was already in the requested state.
    Unchanged,
    /// Open mode admits everything; there is no set to modify.
    OpenMode,
}

impl TrackChange {
    pub fn is_changed(self) -> bool {
        self == Self::Changed
    }
}

/// Decides which channels are in scope.
///
/// In whitelist mode only channel ids in the tracked set are admitted; in open
/// mode every channel is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelTracker {
    tracked: Option<BTreeSet<String>>,
}

impl ChannelTracker {
    /// Admits every channel.
    pub fn open() -> Self {
        Self { tracked: None }
    }

    /// Admits only the given channel ids.
    pub fn whitelist(tracked: BTreeSet<String>) -> Self {
        Self {
            tracked: Some(tracked),
        }
    }

    /// Builds the tracker from a persisted set, honouring the configured mode.
    ///
    /// With whitelist mode off the persisted set is ignored. With it on and
    /// nothing persisted, the set starts empty.
    pub fn from_persisted(persisted: Option<BTreeSet<String>>, whitelist_mode: bool) -> Self {
        if whitelist_mode {
            Self::whitelist(persisted.unwrap_or_default())
        } else {
            Self::open()
        }
    }

    pub fn is_whitelist(&self) -> bool {
        self.tracked.is_some()
    }

    pub fn tracked(&self) -> Option<&BTreeSet<String>> {
        self.tracked.as_ref()
    }

    pub fn admits(&self, key: &ChannelKey) -> bool {
        match &self.tracked {
            Some(set) => set.contains(&key.checkpoint_id()),
            None => true,
        }
    }

    pub fn enable(&mut self, key: &ChannelKey) -> TrackChange {
        match &mut self.tracked {
            Some(set) => {
                if set.insert(key.checkpoint_id()) {
                    TrackChange::Changed
                } else {
                    TrackChange::Unchanged
                }
            }
            None => TrackChange::OpenMode,
        }
    }

    pub fn disable(&mut self, key: &ChannelKey) -> TrackChange {
        match &mut self.tracked {
            Some(set) => {
                if set.remove(&key.checkpoint_id()) {
                    TrackChange::Changed
                } else {
                    TrackChange::Unchanged
                }
            }
            None => TrackChange::OpenMode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(channel_id: u64) -> ChannelKey {
        ChannelKey::new(Some(1), channel_id)
    }

    #[test]
    fn open_mode_admits_everything_and_ignores_changes() {
        let mut tracker = ChannelTracker::open();
        assert!(tracker.admits(&key(5)));
        assert_eq!(tracker.enable(&key(5)), TrackChange::OpenMode);
        assert_eq!(tracker.disable(&key(5)), TrackChange::OpenMode);
        assert!(tracker.admits(&key(5)));
    }

    #[test]
    fn whitelist_admits_only_tracked_ids() {
        let mut tracker = ChannelTracker::whitelist(BTreeSet::new());
        assert!(!tracker.admits(&key(5)));

        assert_eq!(tracker.enable(&key(5)), TrackChange::Changed);
        assert!(tracker.admits(&key(5)));
        assert!(!tracker.admits(&key(6)));
    }

    #[test]
    fn repeated_requests_are_unchanged() {
        let mut tracker = ChannelTracker::whitelist(BTreeSet::new());
        assert!(tracker.enable(&key(5)).is_changed());
        assert_eq!(tracker.enable(&key(5)), TrackChange::Unchanged);
        assert!(tracker.disable(&key(5)).is_changed());
        assert!(!tracker.admits(&key(5)));
        assert_eq!(tracker.disable(&key(5)), TrackChange::Unchanged);
    }

    #[test]
    fn persisted_set_follows_configured_mode() {
        let persisted = Some(BTreeSet::from(["5".to_string()]));

        let open = ChannelTracker::from_persisted(persisted.clone(), false);
        assert!(!open.is_whitelist());

        let whitelist = ChannelTracker::from_persisted(persisted, true);
        assert!(whitelist.admits(&key(5)));

        let empty = ChannelTracker::from_persisted(None, true);
        assert_eq!(empty.tracked(), Some(&BTreeSet::new()));
    }
}
