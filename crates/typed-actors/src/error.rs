//! # Runtime Errors
//!
//! This module defines the error types surfaced by the actor runtime. Keeping them in one
//! place lets callers tell the failure modes apart: a send to a stopped actor, a failed
//! actor task, or an `ask` that never completed.

use std::time::Duration;

/// Errors raised by references, actor systems and configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
    /// The target mailbox was closed: the actor has stopped.
    #[error("Mailbox of actor `{0}` is closed")]
    MailboxClosed(String),
    /// The actor task ended abnormally (a handler panicked).
    #[error("Actor `{actor}` failed: {reason}")]
    Failed { actor: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reasons an `ask` did not complete.
///
/// The request/response protocol carries no structured error from the target back to the
/// asker. A failing target is observed only as "no reply arrived", either because the
/// reply reference was dropped ([`AskError::NoReply`]) or because the deadline passed
/// ([`AskError::Timeout`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AskError {
    #[error("Ask timed out after {0:?}")]
    Timeout(Duration),
    /// The request could not be delivered; reported immediately, without waiting.
    #[error("Ask target `{0}` is stopped")]
    TargetStopped(String),
    #[error("Ask target dropped the reply reference without answering")]
    NoReply,
}

impl AskError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AskError::Timeout(_))
    }
}
