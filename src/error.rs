use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Serialize)]
pub enum ParishError {
    /// Member with given ID not found
    #[error("Member {0} not found")]
    MemberNotFound(Uuid),

    /// Small group with given ID not found
    #[error("Small group {0} not found")]
    GroupNotFound(Uuid),

    /// Ministry area with given ID not found
    #[error("Ministry area {0} not found")]
    AreaNotFound(Uuid),

    /// Meeting series with given ID not found
    #[error("Meeting series {0} not found")]
    SeriesNotFound(Uuid),

    /// Meeting with given ID not found
    #[error("Meeting {0} not found")]
    MeetingNotFound(Uuid),

    /// Operation would break a membership invariant; the caller must go
    /// through the explicit assign/vacate operations instead
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Meeting already carries attendance records; destructive edits rejected
    #[error("Meeting {0} has recorded attendance and cannot be removed")]
    ImmutableHistory(Uuid),

    /// Record store operation failed
    #[error("Storage error: {0}")]
    Storage(String),
}
