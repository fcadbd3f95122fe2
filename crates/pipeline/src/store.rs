//! Storyboard record storage.
//!
//! [`StoryboardStore`] is the narrow seam the orchestrator, workers and
//! broadcaster share. [`InMemoryStore`] keeps records in a process-local
//! map behind a coarse `RwLock` and publishes a [`StoryboardEvent`] on the
//! [`EventBus`] after every change, which is what makes the store
//! observable for push streams and the persistence hook.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use boardwright_core::error::CoreError;
use boardwright_core::frame::{Frame, FrameTransition, StoryboardRecord, StoryboardStatus};
use boardwright_core::trim::{TrimmedFrame, TrimmedRecord};
use boardwright_core::types::{StoryboardId, Timestamp};
use boardwright_events::{EventBus, StoryboardEvent, StoryboardEventKind};
use tokio::sync::RwLock;

/// Record storage shared by every pipeline component.
#[async_trait]
pub trait StoryboardStore: Send + Sync {
    /// Snapshot of a record, or `None` if unknown or evicted.
    async fn get(&self, id: &str) -> Option<StoryboardRecord>;

    /// Insert or replace a whole record.
    async fn upsert(&self, record: StoryboardRecord);

    /// Apply a worker transition to one frame and return the updated frame.
    async fn mutate_frame(
        &self,
        id: &str,
        frame_id: &str,
        transition: FrameTransition,
    ) -> Result<Frame, CoreError>;

    /// Fix the record's aggregate status once every frame is terminal.
    ///
    /// Returns `Ok(None)` if frames are still in flight or the record was
    /// already finalised.
    async fn finalize(&self, id: &str) -> Result<Option<StoryboardStatus>, CoreError>;

    /// Remove terminal records that finished more than `ttl` before `now`.
    async fn evict_expired(&self, ttl: Duration, now: Timestamp) -> Vec<StoryboardId>;

    /// Number of records currently held.
    async fn len(&self) -> usize;
}

/// Process-memory store that publishes every change on an [`EventBus`].
pub struct InMemoryStore {
    records: RwLock<HashMap<StoryboardId, StoryboardRecord>>,
    bus: Arc<EventBus>,
}

impl InMemoryStore {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            bus,
        }
    }
}

#[async_trait]
impl StoryboardStore for InMemoryStore {
    async fn get(&self, id: &str) -> Option<StoryboardRecord> {
        self.records.read().await.get(id).cloned()
    }

    async fn upsert(&self, record: StoryboardRecord) {
        let event = StoryboardEvent::new(
            record.id.clone(),
            StoryboardEventKind::Created {
                frames: record.frames.len(),
            },
        );
        self.records.write().await.insert(record.id.clone(), record);
        self.bus.publish(event);
    }

    async fn mutate_frame(
        &self,
        id: &str,
        frame_id: &str,
        transition: FrameTransition,
    ) -> Result<Frame, CoreError> {
        let frame = {
            let mut records = self.records.write().await;
            let record = records
                .get_mut(id)
                .ok_or_else(|| CoreError::storyboard_not_found(id))?;
            let frame = record
                .frame_mut(frame_id)
                .ok_or_else(|| CoreError::frame_not_found(frame_id))?;
            frame.apply(transition)?;
            frame.clone()
        };

        self.bus.publish(StoryboardEvent::new(
            id,
            StoryboardEventKind::FrameUpdated {
                frame: TrimmedFrame::from(&frame),
            },
        ));
        Ok(frame)
    }

    async fn finalize(&self, id: &str) -> Result<Option<StoryboardStatus>, CoreError> {
        let completed = {
            let mut records = self.records.write().await;
            let record = records
                .get_mut(id)
                .ok_or_else(|| CoreError::storyboard_not_found(id))?;
            record
                .finalize(chrono::Utc::now())
                .map(|status| (status, TrimmedRecord::from(&*record)))
        };

        let Some((status, record)) = completed else {
            return Ok(None);
        };
        self.bus.publish(StoryboardEvent::new(
            id,
            StoryboardEventKind::Completed { record },
        ));
        Ok(Some(status))
    }

    async fn evict_expired(&self, ttl: Duration, now: Timestamp) -> Vec<StoryboardId> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let evicted: Vec<StoryboardId> = {
            let mut records = self.records.write().await;
            let expired: Vec<StoryboardId> = records
                .values()
                .filter(|r| r.status.is_terminal())
                .filter(|r| {
                    let finished = r.completed_at.unwrap_or(r.created_at);
                    now.signed_duration_since(finished) >= ttl
                })
                .map(|r| r.id.clone())
                .collect();
            for id in &expired {
                records.remove(id);
            }
            expired
        };

        for id in &evicted {
            self.bus
                .publish(StoryboardEvent::new(id.clone(), StoryboardEventKind::Evicted));
        }
        evicted
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use boardwright_core::frame::FrameStatus;
    use boardwright_core::script::parse_script;

    use super::*;

    fn record(id: &str) -> StoryboardRecord {
        StoryboardRecord {
            id: id.into(),
            title: None,
            project_id: None,
            aspect_ratio: "16:9".into(),
            style: "Photorealistic".into(),
            frames: parse_script("Scene 1:\nDescription: a")
                .iter()
                .map(|s| Frame::from_scene(id, s))
                .collect(),
            status: StoryboardStatus::Building,
            created_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    fn store() -> (InMemoryStore, Arc<EventBus>) {
        let bus = Arc::new(EventBus::default());
        (InMemoryStore::new(bus.clone()), bus)
    }

    async fn complete_frame(store: &InMemoryStore, id: &str) {
        let frame_id = format!("f_{id}_0");
        store
            .mutate_frame(id, &frame_id, FrameTransition::Start)
            .await
            .unwrap();
        store
            .mutate_frame(
                id,
                &frame_id,
                FrameTransition::Succeed { image_url: "https://img".into() },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn mutations_publish_frame_events() {
        let (store, bus) = store();
        let mut rx = bus.subscribe();
        store.upsert(record("sb_1")).await;
        assert_matches!(rx.recv().await.unwrap().kind, StoryboardEventKind::Created { frames: 1 });

        store
            .mutate_frame("sb_1", "f_sb_1_0", FrameTransition::Start)
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.storyboard_id, "sb_1");
        assert_eq!(event.frame_status(), Some(FrameStatus::Generating));
    }

    #[tokio::test]
    async fn invalid_transition_leaves_frame_untouched() {
        let (store, _bus) = store();
        store.upsert(record("sb_1")).await;

        let err = store
            .mutate_frame(
                "sb_1",
                "f_sb_1_0",
                FrameTransition::Succeed { image_url: "u".into() },
            )
            .await;
        assert_matches!(err, Err(CoreError::InvalidTransition { .. }));
        let snapshot = store.get("sb_1").await.unwrap();
        assert_eq!(snapshot.frames[0].status, FrameStatus::Pending);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (store, _bus) = store();
        assert_matches!(
            store.mutate_frame("nope", "f", FrameTransition::Start).await,
            Err(CoreError::NotFound { entity: "storyboard", .. })
        );
        store.upsert(record("sb_1")).await;
        assert_matches!(
            store.mutate_frame("sb_1", "f_missing", FrameTransition::Start).await,
            Err(CoreError::NotFound { entity: "frame", .. })
        );
        assert_matches!(store.finalize("nope").await, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn finalize_publishes_completion_once() {
        let (store, bus) = store();
        store.upsert(record("sb_1")).await;
        assert_eq!(store.finalize("sb_1").await.unwrap(), None);

        complete_frame(&store, "sb_1").await;
        let mut rx = bus.subscribe();
        assert_eq!(
            store.finalize("sb_1").await.unwrap(),
            Some(StoryboardStatus::Ready)
        );
        assert_eq!(
            rx.recv().await.unwrap().completed_status(),
            Some(StoryboardStatus::Ready)
        );
        assert_eq!(store.finalize("sb_1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn eviction_only_removes_old_terminal_records() {
        let (store, _bus) = store();
        store.upsert(record("sb_done")).await;
        store.upsert(record("sb_busy")).await;
        complete_frame(&store, "sb_done").await;
        store.finalize("sb_done").await.unwrap();

        let ttl = Duration::from_secs(60);
        let now = chrono::Utc::now();
        assert!(store.evict_expired(ttl, now).await.is_empty());

        let later = now + chrono::Duration::seconds(120);
        assert_eq!(store.evict_expired(ttl, later).await, vec!["sb_done".to_string()]);
        assert!(store.get("sb_done").await.is_none());
        assert!(store.get("sb_busy").await.is_some());
        assert_eq!(store.len().await, 1);
    }
}
