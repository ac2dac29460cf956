// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live snapshots of the report collection.
//!
//! A single background task re-reads the collection on a fixed interval and
//! whenever it is nudged, and publishes a new [`ReportSnapshot`] only when
//! the contents changed. Consumers hold a [`ReportSubscription`]; dropping
//! it unsubscribes.
//!
//! Submissions through this process nudge the task and show up at once.
//! Reports written by another instance are only seen on the next interval
//! tick, so they can lag by up to `REPORT_FEED_REFRESH_SECS` (30 s default).

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::PigeonReport;
use futures_util::stream::{self, Stream};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Where the feed reads reports from.
pub trait ReportSource: Send + Sync + 'static {
    /// Every report, most recent first.
    fn list_reports(&self) -> impl Future<Output = Result<Vec<PigeonReport>, AppError>> + Send;
}

impl ReportSource for FirestoreDb {
    async fn list_reports(&self) -> Result<Vec<PigeonReport>, AppError> {
        FirestoreDb::list_reports(self).await
    }
}

/// Full copy of the collection at one point in time.
#[derive(Debug, Clone, Default)]
pub struct ReportSnapshot {
    pub reports: Arc<Vec<PigeonReport>>,
    /// Incremented on every published change
    pub version: u64,
    /// False until the first successful read
    pub loaded: bool,
}

pub struct ReportFeed {
    sender: Arc<watch::Sender<ReportSnapshot>>,
    notifier: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ReportFeed {
    /// Start the refresh task. Must be called inside a Tokio runtime.
    pub fn spawn<S: ReportSource>(source: S, refresh_interval: Duration) -> Self {
        let (sender, _) = watch::channel(ReportSnapshot::default());
        let sender = Arc::new(sender);
        let notifier = Arc::new(Notify::new());

        let task = tokio::spawn(refresh_loop(
            source,
            Arc::clone(&sender),
            Arc::clone(&notifier),
            refresh_interval,
        ));

        Self {
            sender,
            notifier,
            task,
        }
    }

    pub fn subscribe(&self) -> ReportSubscription {
        ReportSubscription {
            receiver: self.sender.subscribe(),
            primed: false,
        }
    }

    /// Latest published snapshot.
    pub fn current(&self) -> ReportSnapshot {
        self.sender.borrow().clone()
    }

    /// Handle that triggers an immediate refresh.
    pub fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.notifier)
    }

    /// Request an immediate refresh.
    pub fn refresh(&self) {
        self.notifier.notify_one();
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Drop for ReportFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn refresh_loop<S: ReportSource>(
    source: S,
    sender: Arc<watch::Sender<ReportSnapshot>>,
    notifier: Arc<Notify>,
    refresh_interval: Duration,
) {
    let mut ticker = tokio::time::interval(refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = notifier.notified() => {}
        }

        match source.list_reports().await {
            Ok(reports) => {
                let published = sender.send_if_modified(|snapshot| {
                    if snapshot.loaded && *snapshot.reports == reports {
                        return false;
                    }
                    snapshot.reports = Arc::new(reports);
                    snapshot.version += 1;
                    snapshot.loaded = true;
                    true
                });

                if published {
                    let snapshot = sender.borrow();
                    tracing::debug!(
                        version = snapshot.version,
                        reports = snapshot.reports.len(),
                        "Published report snapshot"
                    );
                }
            }
            Err(e) => {
                // Keep serving the previous snapshot
                tracing::warn!(error = %e, "Failed to refresh reports");
            }
        }
    }
}

/// One consumer's view of the feed.
pub struct ReportSubscription {
    receiver: watch::Receiver<ReportSnapshot>,
    primed: bool,
}

impl ReportSubscription {
    /// Wait for the next loaded snapshot.
    ///
    /// The first call returns the current snapshot immediately if one has
    /// been loaded. Returns `None` once the feed has shut down.
    pub async fn next(&mut self) -> Option<ReportSnapshot> {
        if !self.primed {
            self.primed = true;
            let snapshot = self.receiver.borrow_and_update().clone();
            if snapshot.loaded {
                return Some(snapshot);
            }
        }

        loop {
            self.receiver.changed().await.ok()?;
            let snapshot = self.receiver.borrow_and_update().clone();
            if snapshot.loaded {
                return Some(snapshot);
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = ReportSnapshot> + Send {
        stream::unfold(self, |mut subscription| async move {
            let snapshot = subscription.next().await?;
            Some((snapshot, subscription))
        })
    }
}
