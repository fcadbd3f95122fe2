//! Boardwright domain core.
//!
//! Pure types and functions shared by the pipeline and the HTTP layer:
//! the storyboard data model and its state machines, the script parser,
//! prompt construction, the generation failure taxonomy and the backoff
//! policy used for retries. Nothing in this crate performs I/O.

pub mod backoff;
pub mod build;
pub mod error;
pub mod frame;
pub mod generation;
pub mod prompt;
pub mod script;
pub mod trim;
pub mod types;
