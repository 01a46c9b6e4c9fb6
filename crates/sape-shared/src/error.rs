use thiserror::Error;

/// Input rejected before it reaches any store or backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must have at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD or an RFC 3339 timestamp")]
    InvalidDate(String),

    #[error("Start time {start} must be before end time {end}")]
    InvertedRange { start: String, end: String },

    #[error("Time {candidate} is outside the allowed window {start}-{end}")]
    OutsideWindow {
        candidate: String,
        start: String,
        end: String,
    },

    #[error("Duration must be greater than zero")]
    ZeroDuration,

    #[error("Capacity must be between 1 and {max}, got {value}")]
    Capacity { value: u32, max: u32 },

    #[error("Unknown {kind} reference: {id}")]
    UnresolvedReference { kind: &'static str, id: String },
}
