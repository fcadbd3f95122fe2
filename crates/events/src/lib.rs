//! Boardwright event bus and progress tracking.
//!
//! - [`EventBus`] is the in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. The record store publishes a
//!   [`StoryboardEvent`] for every frame mutation and record completion.
//! - [`ProgressTracker`] turns successive record snapshots into the
//!   client-facing [`ProgressEvent`] sequence (`init`, `frame`, `complete`,
//!   `end`). Both the push and the poll stream drivers share it.
//! - [`EventPersistence`] forwards terminal frames and completed records to
//!   a pluggable [`FrameSink`].

pub mod bus;
pub mod persistence;
pub mod progress;

pub use bus::{EventBus, StoryboardEvent, StoryboardEventKind};
pub use persistence::{EventPersistence, FrameSink, TracingSink};
pub use progress::{ProgressEvent, ProgressTracker};
