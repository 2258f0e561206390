//! Error type shared by tracker operations and route handlers.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("no participants in the tracker")]
    EmptyRoster,
    #[error("every participant is dead, no turn to advance to")]
    AllDefeated,
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),
    #[error("duplicate participant: {0}")]
    DuplicateParticipant(String),
    #[error("unknown stat block: {0}")]
    UnknownStatBlock(String),
    #[error("{0} has no health track")]
    NoHealthTrack(String),
    #[error("missing expected element: {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("malformed file: {0}")]
    MalformedFile(String),
    #[error("invalid dice expression: {0}")]
    InvalidDice(String),
}

impl TrackerError {
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
