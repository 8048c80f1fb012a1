//! Error types for command parsing and command validation.

use thiserror::Error;

/// A line that could not be turned into a [`Command`](crate::command::Command).
///
/// Malformed lines are skipped and never reach the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}`")]
    UnknownVerb(String),
    #[error("{verb}: missing argument {position}")]
    MissingArgument { verb: &'static str, position: usize },
    #[error("{verb}: `{value}` is not a number")]
    InvalidNumber { verb: &'static str, value: String },
}

/// Why the engine refused a well-formed command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("`{0}` does not start with `user`")]
    InvalidUserId(String),
    #[error("unknown user `{0}`")]
    UnknownUser(String),
    #[error("unknown post `{0}`")]
    UnknownPost(String),
    #[error("user `{0}` already exists")]
    DuplicateUser(String),
    #[error("post `{0}` already exists")]
    DuplicatePost(String),
    #[error("`{0}` cannot target itself")]
    SelfReference(String),
    #[error("`{follower}` already follows `{followee}`")]
    AlreadyFollowing { follower: String, followee: String },
    #[error("`{follower}` does not follow `{followee}`")]
    NotFollowing { follower: String, followee: String },
}

/// A rejected command. Its `Display` form is the transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Some error occurred in {verb}.")]
pub struct CommandError {
    pub verb: &'static str,
    #[source]
    pub reason: Rejection,
}
