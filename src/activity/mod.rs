//! Project activity polling.
//!
//! The poller fires on a fixed cadence whether or not the previous request
//! has finished. Requests are numbered when they start and [`ActivityFeed`]
//! keeps whichever result came from the latest-started request.

pub mod feed;
pub mod format;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::BoardApi;
use crate::error::ApiError;
use crate::types::{ActivityEvent, ProjectId};

pub use feed::{ActivityFeed, FeedUpdate};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub limit: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            limit: DEFAULT_ACTIVITY_LIMIT,
        }
    }
}

/// Handle to a running poll loop. Dropping it stops polling and aborts any
/// request still in flight.
pub struct ActivityPoller {
    feed: watch::Receiver<ActivityFeed>,
    task: JoinHandle<()>,
}

impl ActivityPoller {
    /// Must be called from within a tokio runtime.
    pub fn spawn<A: BoardApi>(api: Arc<A>, project_id: ProjectId, config: PollerConfig) -> Self {
        let (tx, feed) = watch::channel(ActivityFeed::default());
        let task = tokio::spawn(poll_loop(api, project_id, config, tx));
        Self { feed, task }
    }

    pub fn feed(&self) -> ActivityFeed {
        self.feed.borrow().clone()
    }

    /// True when the feed changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        let changed = self.feed.has_changed().unwrap_or(false);
        if changed {
            self.feed.mark_unchanged();
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<ActivityFeed> {
        self.feed.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for ActivityPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop<A: BoardApi>(
    api: Arc<A>,
    project_id: ProjectId,
    config: PollerConfig,
    tx: watch::Sender<ActivityFeed>,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: JoinSet<(u64, Result<Vec<ActivityEvent>, ApiError>)> = JoinSet::new();
    let mut seq = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                seq += 1;
                let request_seq = seq;
                let api = Arc::clone(&api);
                let limit = config.limit;
                debug!(seq = request_seq, in_flight = in_flight.len(), "activity poll started");
                in_flight.spawn(async move {
                    (request_seq, api.fetch_activity(project_id, limit).await)
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                let (request_seq, result) = match joined {
                    Ok(done) => done,
                    Err(err) => {
                        warn!(error = %err, "activity poll task failed");
                        continue;
                    }
                };
                if let Err(err) = &result {
                    warn!(seq = request_seq, error = %err, "activity poll failed, retrying next tick");
                }
                tx.send_if_modified(|feed| match feed.apply(request_seq, result) {
                    FeedUpdate::Stale => {
                        debug!(seq = request_seq, applied = feed.applied_seq(), "stale activity response dropped");
                        false
                    }
                    FeedUpdate::Applied | FeedUpdate::Failed => true,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::Utc;

    use super::*;
    use crate::api::testing::FakeApi;
    use crate::types::{ActivityAction, ActivityId};

    fn event(id: i64, description: &str) -> ActivityEvent {
        ActivityEvent {
            id: ActivityId(id),
            action: ActivityAction::TaskMoved,
            description: description.to_string(),
            user_name: "Ana".to_string(),
            created_at: Utc::now(),
            task: None,
        }
    }

    fn descriptions(feed: &ActivityFeed) -> Vec<String> {
        feed.events()
            .iter()
            .map(|event| event.description.clone())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn later_started_request_wins_despite_finishing_first() {
        let api = Arc::new(FakeApi::new(Vec::new()));
        api.script_activity(Duration::from_secs(5), Ok(vec![event(1, "from A")]));
        api.script_activity(Duration::from_secs(1), Ok(vec![event(2, "from B")]));

        let poller = ActivityPoller::spawn(
            Arc::clone(&api),
            ProjectId(1),
            PollerConfig {
                interval: Duration::from_secs(3),
                limit: 10,
            },
        );

        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(descriptions(&poller.feed()), vec!["from B"]);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let feed = poller.feed();
        assert_eq!(descriptions(&feed), vec!["from B"]);
        assert_eq!(feed.applied_seq(), 2);
        assert_eq!(api.activity_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_previous_events() {
        let api = Arc::new(FakeApi::new(Vec::new()));
        api.script_activity(Duration::ZERO, Ok(vec![event(1, "first")]));
        api.script_activity(
            Duration::ZERO,
            Err(ApiError::Network("offline".to_string())),
        );

        let poller = ActivityPoller::spawn(Arc::clone(&api), ProjectId(1), PollerConfig::default());

        tokio::time::sleep(Duration::from_millis(4000)).await;
        let feed = poller.feed();
        assert_eq!(descriptions(&feed), vec!["first"]);
        assert!(feed.last_error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_requests() {
        let api = Arc::new(FakeApi::new(Vec::new()));
        let poller = ActivityPoller::spawn(Arc::clone(&api), ProjectId(1), PollerConfig::default());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(api.activity_calls.load(Ordering::SeqCst), 1);
        assert!(poller.is_running());

        poller.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.activity_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remount_starts_from_empty_feed() {
        let api = Arc::new(FakeApi::new(Vec::new()));
        api.script_activity(Duration::ZERO, Ok(vec![event(1, "first")]));

        let poller = ActivityPoller::spawn(Arc::clone(&api), ProjectId(1), PollerConfig::default());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(poller.feed().is_loaded());
        drop(poller);

        api.script_activity(Duration::from_secs(1), Ok(vec![event(2, "second")]));
        let remounted = ActivityPoller::spawn(Arc::clone(&api), ProjectId(1), PollerConfig::default());
        assert!(!remounted.feed().is_loaded());
        assert!(remounted.feed().events().is_empty());
    }
}
