//! # Request/Response
//!
//! `ask` builds request/response on top of one-way messages: a throwaway mailbox is
//! created, a reference to it travels inside the request, and the asker waits for exactly
//! one reply or the deadline, whichever comes first.
//!
//! The throwaway mailbox is closed on every exit path, so a late or duplicate reply from
//! the target fails on the target's side instead of piling up in a forgotten queue.

use crate::actor_ref::ActorRef;
use crate::error::AskError;
use crate::mailbox::{mailbox, Mailbox};
use std::time::Duration;
use tracing::{debug, warn};

/// Sends `factory(reply_to)` to `target` and waits up to `timeout` for the reply.
///
/// # Errors
/// - [`AskError::TargetStopped`] immediately, if `target` no longer accepts messages.
/// - [`AskError::NoReply`] if every copy of the reply reference is dropped unanswered.
/// - [`AskError::Timeout`] if no reply arrives in time.
///
/// A failed ask affects only this call; nothing else is cancelled.
pub async fn ask<Req, Res, F>(
    target: &ActorRef<Req>,
    timeout: Duration,
    factory: F,
) -> Result<Res, AskError>
where
    Req: Send + 'static,
    Res: Send + 'static,
    F: FnOnce(ActorRef<Res>) -> Req,
{
    let mut replies = send_request(target, factory)?;
    await_reply(&mut replies, target.name(), timeout).await
}

/// Delivers the request carrying a fresh reply reference, returning the reply mailbox.
pub(crate) fn send_request<Req, Res, F>(
    target: &ActorRef<Req>,
    factory: F,
) -> Result<Mailbox<Res>, AskError>
where
    Req: Send + 'static,
    Res: Send + 'static,
    F: FnOnce(ActorRef<Res>) -> Req,
{
    let (mut replies, reply_to) = mailbox::<Res>(format!("{}$ask", target.name()));
    if target.tell(factory(reply_to)).is_err() {
        replies.close();
        warn!(ask_target = %target.name(), "Ask target is stopped");
        return Err(AskError::TargetStopped(target.name().to_string()));
    }
    Ok(replies)
}

/// Takes the first reply, then closes the mailbox whatever the outcome.
pub(crate) async fn await_reply<Res>(
    replies: &mut Mailbox<Res>,
    target: &str,
    timeout: Duration,
) -> Result<Res, AskError> {
    let outcome = match tokio::time::timeout(timeout, replies.recv()).await {
        Ok(Some(reply)) => Ok(reply),
        Ok(None) => Err(AskError::NoReply),
        Err(_) => Err(AskError::Timeout(timeout)),
    };
    replies.close();
    match &outcome {
        Ok(_) => debug!(ask_target = %target, "Ask answered"),
        Err(e) => warn!(ask_target = %target, ?timeout, error = %e, "Ask failed"),
    }
    outcome
}
