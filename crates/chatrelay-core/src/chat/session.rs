//! Session activity tracking.
//!
//! `SessionTracker` records the last time each session label was seen. It is
//! informational: the count feeds `/health`, nothing else reads it. Entries
//! live for the life of the process unless an idle limit is configured, in
//! which case [`spawn_idle_sweeper`] prunes them periodically.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Concurrent map of session label to last-seen instant.
///
/// Cloning produces a shared view of the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    inner: Arc<DashMap<String, DateTime<Utc>>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity for `session_id` at `now`. Absent labels are ignored.
    pub fn touch(&self, session_id: Option<&str>, now: DateTime<Utc>) {
        if let Some(id) = session_id {
            self.inner.insert(id.to_string(), now);
        }
    }

    /// Number of distinct sessions seen (and not pruned).
    pub fn active_sessions(&self) -> usize {
        self.inner.len()
    }

    /// Last activity for a session, if tracked.
    pub fn last_seen(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.inner.get(session_id).map(|r| *r.value())
    }

    /// Drop sessions whose last activity is older than `max_idle` at `now`.
    ///
    /// Returns the number of sessions removed.
    pub fn prune_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = now - max_idle;
        let before = self.inner.len();
        self.inner.retain(|_, last_seen| *last_seen >= cutoff);
        before.saturating_sub(self.inner.len())
    }
}

/// Periodically prune sessions idle longer than `max_idle`.
///
/// Runs every `max_idle / 2` (at least one second) until `cancel` fires.
pub fn spawn_idle_sweeper(
    tracker: SessionTracker,
    max_idle: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = (max_idle / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Session sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = tracker.prune_idle(Utc::now(), max_idle);
                    if removed > 0 {
                        tracing::info!(
                            removed,
                            remaining = tracker.active_sessions(),
                            "Pruned idle sessions"
                        );
                    }
                }
            }
        }
    })
}
