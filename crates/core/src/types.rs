/// Storyboard record ids are opaque strings (`sb_<uuid>`).
pub type StoryboardId = String;

/// Frame ids are derived from the owning record id and the frame index.
pub type FrameId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh, globally unique storyboard id.
///
/// UUIDv7 keeps ids roughly time-ordered, which makes log scanning easier.
pub fn new_storyboard_id() -> StoryboardId {
    format!("sb_{}", uuid::Uuid::now_v7().simple())
}

/// Build the stable id of the frame at `index` within `storyboard_id`.
pub fn frame_id(storyboard_id: &str, index: usize) -> FrameId {
    format!("f_{storyboard_id}_{index}")
}
