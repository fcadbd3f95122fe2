//! Periodic eviction of finished storyboards.
//!
//! Records stay in memory after their build completes so clients can fetch
//! them; once older than the configured TTL they are dropped. Records that
//! are still building are never evicted.

use std::sync::Arc;
use std::time::Duration;

use boardwright_pipeline::StoryboardStore;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// How often the sweeper runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the eviction loop until `cancel` is triggered.
pub async fn run(
    store: Arc<dyn StoryboardStore>,
    ttl: Duration,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        ttl_secs = ttl.as_secs(),
        interval_secs = every.as_secs(),
        "Storyboard eviction job started"
    );

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Storyboard eviction job stopping");
                break;
            }
            _ = interval.tick() => {
                let evicted = store.evict_expired(ttl, Utc::now()).await;
                if evicted.is_empty() {
                    tracing::debug!("Storyboard eviction: nothing to evict");
                } else {
                    tracing::info!(count = evicted.len(), "Storyboard eviction: dropped expired records");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use boardwright_core::frame::{Frame, StoryboardRecord, StoryboardStatus};
    use boardwright_core::script::parse_script;
    use boardwright_events::EventBus;
    use boardwright_pipeline::InMemoryStore;

    fn record(id: &str, status: StoryboardStatus, age: chrono::Duration) -> StoryboardRecord {
        let scenes = parse_script("**Scene 1:**\nShot Description: A door.");
        let now = Utc::now();
        StoryboardRecord {
            id: id.into(),
            title: None,
            project_id: None,
            aspect_ratio: "16:9".into(),
            style: "Photorealistic".into(),
            frames: scenes.iter().map(|s| Frame::from_scene(id, s)).collect(),
            status,
            created_at: now - age,
            completed_at: status.is_terminal().then_some(now - age),
        }
    }

    #[tokio::test]
    async fn sweeper_drops_expired_records_and_stops_on_cancel() {
        let store: Arc<dyn StoryboardStore> =
            Arc::new(InMemoryStore::new(Arc::new(EventBus::default())));
        store
            .upsert(record("sb_old", StoryboardStatus::Ready, chrono::Duration::hours(2)))
            .await;
        store
            .upsert(record("sb_new", StoryboardStatus::Ready, chrono::Duration::zero()))
            .await;
        store
            .upsert(record("sb_busy", StoryboardStatus::Building, chrono::Duration::hours(2)))
            .await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            store.clone(),
            Duration::from_secs(3600),
            Duration::from_millis(10),
            cancel.clone(),
        ));

        // The first tick fires immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(store.get("sb_old").await.is_none());
        assert!(store.get("sb_new").await.is_some());
        assert!(store.get("sb_busy").await.is_some());
    }
}
