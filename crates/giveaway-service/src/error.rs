use thiserror::Error;

/// Failure taxonomy for contest operations. Validation and not-found
/// variants are recovered locally and surfaced as user-facing messages;
/// persistence variants propagate as hard errors while the store keeps the
/// prior state readable.
#[derive(Debug, Error)]
pub enum GiveawayError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("end time must be in the future")]
    EndTimeNotFuture,
    #[error("winner count must be at least 1")]
    InvalidWinnerCount,
    #[error("contest not found")]
    NotFound,
    #[error("contest is not active")]
    NotActive,
    #[error("contest is not completed")]
    NotCompleted,
    #[error("contest has no participants")]
    NoParticipants,
    #[error("a draw for this contest was just triggered, try again shortly")]
    DrawLocked,
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}
