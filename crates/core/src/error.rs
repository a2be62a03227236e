#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Track '{track_id}' is placed relative to unknown track '{reference}'")]
    TimelineReference { track_id: String, reference: String },

    #[error("Track '{track_id}' is part of a placement cycle")]
    TimelineCycle { track_id: String },

    #[error("Track '{track_id}' has no known duration")]
    MissingDuration { track_id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
