//! Stable entity identifiers.
//!
//! Ids are handed out by [`IdAllocator`] in increasing order and are never
//! recycled, so a stale id always resolves to `NotFound` instead of a
//! different entity.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                $name(raw)
            }
        }
    };
}

entity_id!(
    /// Identifies a track within a project.
    TrackId
);
entity_id!(
    /// Identifies a pattern; unique across all tracks of a project.
    PatternId
);
entity_id!(
    /// Identifies an automation clip; unique across the project.
    AutomationId
);
entity_id!(
    /// Identifies a sample clip on a sample track.
    ClipId
);

/// Monotonic id counters, persisted with the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next_track: u32,
    next_pattern: u32,
    next_automation: u32,
    next_clip: u32,
}

impl IdAllocator {
    pub(crate) fn track(&mut self) -> TrackId {
        let id = TrackId(self.next_track);
        self.next_track += 1;
        id
    }

    pub(crate) fn pattern(&mut self) -> PatternId {
        let id = PatternId(self.next_pattern);
        self.next_pattern += 1;
        id
    }

    /// Id the next pattern will get.
    pub(crate) fn peek_pattern(&self) -> PatternId {
        PatternId(self.next_pattern)
    }

    pub(crate) fn automation(&mut self) -> AutomationId {
        let id = AutomationId(self.next_automation);
        self.next_automation += 1;
        id
    }

    pub(crate) fn clip(&mut self) -> ClipId {
        let id = ClipId(self.next_clip);
        self.next_clip += 1;
        id
    }

    /// True if every id in use is below the matching counter.
    pub(crate) fn covers(
        &self,
        max_track: Option<TrackId>,
        max_pattern: Option<PatternId>,
        max_automation: Option<AutomationId>,
        max_clip: Option<ClipId>,
    ) -> bool {
        max_track.map_or(true, |id| id.0 < self.next_track)
            && max_pattern.map_or(true, |id| id.0 < self.next_pattern)
            && max_automation.map_or(true, |id| id.0 < self.next_automation)
            && max_clip.map_or(true, |id| id.0 < self.next_clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.track(), TrackId(0));
        assert_eq!(ids.track(), TrackId(1));
        assert_eq!(ids.pattern(), PatternId(0));
        assert_eq!(ids.track(), TrackId(2));
    }

    #[test]
    fn test_covers() {
        let mut ids = IdAllocator::default();
        ids.track();
        assert!(ids.covers(Some(TrackId(0)), None, None, None));
        assert!(!ids.covers(Some(TrackId(1)), None, None, None));
        assert!(!ids.covers(None, Some(PatternId(0)), None, None));
    }
}
