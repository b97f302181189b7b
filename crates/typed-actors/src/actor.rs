//! # Behavior Interpreter
//!
//! This module runs actors. Each actor is one Tokio task executing [`run`], which resolves
//! the current behavior against the next message (or lifecycle event) and moves on to the
//! behavior the handler returns, one message at a time.

use crate::actor_ref::ActorRef;
use crate::behavior::{Active, Behavior};
use crate::context::ActorContext;
use crate::error::ActorError;
use crate::mailbox::{mailbox, Mailbox};
use crate::scope::{Hierarchy, NodeId, ScopeGuard};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info_span, trace, Instrument};

/// Why an actor's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Stopped,
    StoppedWithEffect,
    Cancelled,
    Failed,
}

/// Creates the mailbox, context and scope node of a new actor and starts its task on
/// `tracker`.
pub(crate) fn spawn<T: Send + 'static>(
    tracker: &TaskTracker,
    hierarchy: &Arc<Hierarchy>,
    parent: Option<NodeId>,
    name: Arc<str>,
    behavior: Behavior<T>,
) -> (ActorRef<T>, NodeId, JoinHandle<()>) {
    let (mailbox, actor_ref) = mailbox::<T>(name.clone());
    let (node, token) = hierarchy.insert(parent, name.clone());
    let span = info_span!("actor", name = %name);
    let ctx = ActorContext::new(
        name,
        actor_ref.clone(),
        span.clone(),
        node,
        token,
        hierarchy.clone(),
    );
    let task = tracker.spawn(run(mailbox, ctx, behavior).instrument(span));
    (actor_ref, node, task)
}

/// Drives one actor from its initial behavior to termination.
///
/// # Architecture Note
/// The actor ends either by resolving to a terminal behavior or by having its scope
/// cancelled from outside (its parent stopping, or the system terminating). Cancellation
/// interrupts a handler at its next await point. Either way the teardown is the same:
///
/// 1. Close the mailbox, so later sends fail instead of being lost silently.
/// 2. Cancel the whole subtree of children.
/// 3. Wait until every child (and every pending ask) has finished.
///
/// A panicking handler (or a `same()` where there is nothing to keep) fails the actor. The
/// failure is recorded in the [`Hierarchy`], which cancels the tree from its root, so the
/// parent and every ancestor up to the guardian stop as well and the system reports
/// [`ActorError::Failed`]. The failed actor itself still tears down as above.
async fn run<T: Send + 'static>(mut mailbox: Mailbox<T>, ctx: ActorContext<T>, behavior: Behavior<T>) {
    let mut guard = ScopeGuard::new(ctx.hierarchy().clone(), ctx.node(), Arc::from(ctx.name()));
    debug!(path = %ctx.path(), "Actor started");

    let exit = tokio::select! {
        biased;
        _ = ctx.token().cancelled() => Exit::Cancelled,
        outcome = AssertUnwindSafe(interpret(&mut mailbox, &ctx, behavior)).catch_unwind() => {
            match outcome {
                Ok(exit) => exit,
                Err(payload) => {
                    let failure = ActorError::Failed {
                        actor: ctx.name().to_string(),
                        reason: panic_reason(&*payload),
                    };
                    ctx.hierarchy().fail(ctx.node(), failure);
                    Exit::Failed
                }
            }
        }
    };

    mailbox.close();
    let cancelled = ctx.hierarchy().cancel_subtree(ctx.node());
    ctx.children().close();
    ctx.children().wait().await;
    guard.disarm();

    debug!(reason = ?exit, cancelled, "Actor stopped");
}

async fn interpret<T: Send + 'static>(
    mailbox: &mut Mailbox<T>,
    ctx: &ActorContext<T>,
    initial: Behavior<T>,
) -> Exit {
    let Some(mut behavior) = initial.into_active() else {
        panic!("actor `{}` was started with `same()`; it has no behavior to keep", ctx.name());
    };

    loop {
        trace!(behavior = behavior.kind(), "Next behavior");
        behavior = match behavior {
            Active::Setup(init) => {
                let first = init(ctx.clone()).await;
                debug!(first = first.kind(), "Actor set up");
                match first.into_active() {
                    Some(first) => first,
                    None => panic!(
                        "setup of actor `{}` returned `same()`; it has no behavior to keep",
                        ctx.name()
                    ),
                }
            }
            Active::Receive(handler) => {
                // Unreachable while `ctx` holds our own reference, but a drained mailbox
                // can only mean the actor is done.
                let Some(msg) = mailbox.recv().await else {
                    return Exit::Stopped;
                };
                let next = handler(ctx.clone(), msg).await;
                next.resolve(Active::Receive(handler))
            }
            Active::Stopped => return Exit::Stopped,
            Active::StoppedWithEffect(post_stop) => {
                let after = post_stop(ctx.clone()).await;
                if !after.is_terminal() {
                    debug!(discarded = after.kind(), "Finalizer result ignored, actor already stopped");
                }
                return Exit::StoppedWithEffect;
            }
        };
    }
}

/// Message of a panic payload, for `panic!("literal")` and `panic!("{formatted}")` alike.
pub(crate) fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}
