use crate::error::ApiError;
use crate::types::ActivityEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedUpdate {
    Applied,
    /// A newer request already landed; the result was dropped.
    Stale,
    Failed,
}

/// The most recent activity window, ordered newest first.
///
/// Results are ordered by the sequence number of the request that produced
/// them, not by arrival: a slow response never replaces one from a request
/// that started later.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFeed {
    events: Vec<ActivityEvent>,
    applied_seq: u64,
    last_error: Option<ApiError>,
}

impl ActivityFeed {
    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    pub fn is_loaded(&self) -> bool {
        self.applied_seq > 0
    }

    /// Set while the newest outcome is a failure; cleared by the next success.
    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn apply(&mut self, seq: u64, result: Result<Vec<ActivityEvent>, ApiError>) -> FeedUpdate {
        if seq <= self.applied_seq {
            return FeedUpdate::Stale;
        }
        match result {
            Ok(mut events) => {
                events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                self.events = events;
                self.applied_seq = seq;
                self.last_error = None;
                FeedUpdate::Applied
            }
            Err(err) => {
                self.last_error = Some(err);
                FeedUpdate::Failed
            }
        }
    }
}
