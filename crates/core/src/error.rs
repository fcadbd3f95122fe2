use crate::frame::FrameStatus;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid frame transition: {from} -> {to}")]
    InvalidTransition { from: FrameStatus, to: FrameStatus },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing storyboard record.
    pub fn storyboard_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "storyboard",
            id: id.into(),
        }
    }

    /// Shorthand for a missing frame within a record.
    pub fn frame_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "frame",
            id: id.into(),
        }
    }
}
