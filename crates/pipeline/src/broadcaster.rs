//! Progress streams over the record store.
//!
//! Both drivers feed the same [`ProgressTracker`] and hand events to the
//! transport through a bounded `mpsc` channel:
//!
//! - [`ProgressBroadcaster::push`] re-reads the record whenever the bus
//!   reports a change to it (or after a lag, when changes may have been
//!   missed).
//! - [`ProgressBroadcaster::poll`] samples the record on a fixed interval.
//!
//! A driver stops once `end` is sent, the record disappears, or the
//! receiver is dropped. Dropping the receiver never cancels generation.

use std::sync::Arc;
use std::time::Duration;

use boardwright_core::error::CoreError;
use boardwright_core::frame::StoryboardRecord;
use boardwright_core::types::StoryboardId;
use boardwright_events::{EventBus, ProgressEvent, ProgressTracker};
use tokio::sync::{broadcast, mpsc};

use crate::store::StoryboardStore;

/// Buffer between a driver and its transport.
const STREAM_BUFFER: usize = 64;

/// Creates per-connection progress streams.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    store: Arc<dyn StoryboardStore>,
    bus: Arc<EventBus>,
    poll_interval: Duration,
}

impl ProgressBroadcaster {
    pub fn new(
        store: Arc<dyn StoryboardStore>,
        bus: Arc<EventBus>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            bus,
            poll_interval,
        }
    }

    /// Open a push stream for `id`.
    ///
    /// The bus subscription is taken before the `init` snapshot is read, so
    /// no change after the snapshot can be missed.
    pub async fn push(&self, id: &str) -> Result<mpsc::Receiver<ProgressEvent>, CoreError> {
        let mut changes = self.bus.subscribe();
        let snapshot = self.snapshot(id).await?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let mut tracker = ProgressTracker::new();
        let store = self.store.clone();
        let id = id.to_string();

        tokio::spawn(async move {
            if !emit(&tx, &mut tracker, &snapshot).await {
                return;
            }
            loop {
                let changed = tokio::select! {
                    _ = tx.closed() => {
                        tracing::debug!(storyboard_id = %id, "Push stream client disconnected");
                        return;
                    }
                    received = changes.recv() => match received {
                        Ok(event) => event.storyboard_id == id,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(storyboard_id = %id, skipped, "Push stream lagged, resyncing");
                            true
                        }
                        Err(broadcast::error::RecvError::Closed) => return,
                    },
                };
                if !changed {
                    continue;
                }
                let Some(record) = store.get(&id).await else {
                    tracing::debug!(storyboard_id = %id, "Record evicted, closing push stream");
                    return;
                };
                if !emit(&tx, &mut tracker, &record).await {
                    return;
                }
            }
        });

        Ok(rx)
    }

    /// Open a poll stream that starts from `initial` and then samples the
    /// store every `poll_interval`.
    ///
    /// `initial` is what the `init` event reports. Starting from the pending
    /// skeleton of a fresh build makes every later completion a `frame`
    /// event, however fast the workers finish.
    pub fn poll(&self, initial: StoryboardRecord) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let mut tracker = ProgressTracker::new();
        let store = self.store.clone();
        let id: StoryboardId = initial.id.clone();
        let mut ticker = tokio::time::interval(self.poll_interval);

        tokio::spawn(async move {
            if !emit(&tx, &mut tracker, &initial).await {
                return;
            }
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        tracing::debug!(storyboard_id = %id, "Poll stream client disconnected");
                        return;
                    }
                    _ = ticker.tick() => {}
                }
                let Some(record) = store.get(&id).await else {
                    tracing::debug!(storyboard_id = %id, "Record evicted, closing poll stream");
                    return;
                };
                if !emit(&tx, &mut tracker, &record).await {
                    return;
                }
            }
        });

        rx
    }

    async fn snapshot(&self, id: &str) -> Result<StoryboardRecord, CoreError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| CoreError::storyboard_not_found(id))
    }
}

/// Send whatever `tracker` still owes for `record`. Returns `false` when the
/// stream is over (finished or receiver gone).
async fn emit(
    tx: &mpsc::Sender<ProgressEvent>,
    tracker: &mut ProgressTracker,
    record: &StoryboardRecord,
) -> bool {
    for event in tracker.observe(record) {
        if tx.send(event).await.is_err() {
            return false;
        }
    }
    !tracker.is_finished()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
