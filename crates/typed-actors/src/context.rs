//! # Actor Context
//!
//! The [`ActorContext<T>`] is the capability surface handed to behavior code: the actor's
//! own reference and name, its logging span, and the ability to spawn children, message
//! itself and ask other actors.

use crate::actor;
use crate::actor_ref::ActorRef;
use crate::ask::{await_reply, send_request};
use crate::behavior::Behavior;
use crate::error::{ActorError, AskError};
use crate::scope::{Hierarchy, NodeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, Instrument, Span};

static NEXT_ANONYMOUS: AtomicU64 = AtomicU64::new(1);

pub(crate) fn anonymous_name() -> String {
    format!("$actor-{}", NEXT_ANONYMOUS.fetch_add(1, Ordering::Relaxed))
}

/// Per-actor capabilities, created alongside the actor's mailbox.
///
/// # Architecture Note
/// The context is cheap to clone, so handlers receive it by value and can move it into
/// the futures they return. It never exposes the mailbox itself: the only way to put
/// something into the actor's queue is through a reference, and the only reader is the
/// actor's own interpreter loop.
///
/// # Structured Lifetime
/// Children spawned through [`ActorContext::spawn`] live inside this actor's scope. When the
/// actor stops (or is stopped by its own parent) every child is cancelled, and the actor is
/// not considered stopped until all of them have finished.
pub struct ActorContext<T> {
    inner: Arc<ContextInner<T>>,
}

struct ContextInner<T> {
    name: Arc<str>,
    self_ref: ActorRef<T>,
    span: Span,
    node: NodeId,
    token: CancellationToken,
    hierarchy: Arc<Hierarchy>,
    children: TaskTracker,
}

impl<T> Clone for ActorContext<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> ActorContext<T> {
    pub(crate) fn new(
        name: Arc<str>,
        self_ref: ActorRef<T>,
        span: Span,
        node: NodeId,
        token: CancellationToken,
        hierarchy: Arc<Hierarchy>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name,
                self_ref,
                span,
                node,
                token,
                hierarchy,
                children: TaskTracker::new(),
            }),
        }
    }

    pub fn self_ref(&self) -> &ActorRef<T> {
        &self.inner.self_ref
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Names from the guardian down to this actor, separated by `/`.
    pub fn path(&self) -> String {
        self.inner.hierarchy.path(self.inner.node)
    }

    /// The tracing span every event of this actor is recorded in.
    ///
    /// Handlers already run inside it; use it to instrument work the actor hands off to
    /// other tasks.
    pub fn log(&self) -> &Span {
        &self.inner.span
    }

    /// Sends a message to this actor's own mailbox.
    ///
    /// Used to bring results of out-of-band work back into the actor, so that state only
    /// ever changes inside its handlers.
    pub fn pipe_to_self(&self, msg: T) -> Result<(), ActorError> {
        self.inner.self_ref.tell(msg)
    }

    /// Spawns a named child actor.
    ///
    /// Returns at once: the child's `setup` may not have run yet. Names are not required
    /// to be unique.
    pub fn spawn<S: Send + 'static>(
        &self,
        behavior: Behavior<S>,
        name: impl Into<String>,
    ) -> ActorRef<S> {
        let name: Arc<str> = Arc::from(name.into());
        debug!(child = %name, "Spawning child");
        let (child, _node, _task) = actor::spawn(
            &self.inner.children,
            &self.inner.hierarchy,
            Some(self.inner.node),
            name,
            behavior,
        );
        child
    }

    /// Spawns a child with a generated, process-unique name.
    pub fn spawn_anonymous<S: Send + 'static>(&self, behavior: Behavior<S>) -> ActorRef<S> {
        self.spawn(behavior, anonymous_name())
    }

    /// Asks `target` and delivers the outcome to this actor.
    ///
    /// The request is built by `factory` from a fresh reply reference. The reply, or the
    /// reason there is none, is turned into a message by `adapt` and arrives through
    /// [`ActorContext::pipe_to_self`]; this call itself returns immediately. A target that
    /// is already stopped is reported at once, without waiting for `timeout`.
    ///
    /// A failed or timed-out ask never stops the asking actor. If the actor stops first,
    /// the pending ask is dropped.
    pub fn ask<Req, Res, F, A>(
        &self,
        target: &ActorRef<Req>,
        timeout: Duration,
        factory: F,
        adapt: A,
    ) where
        Req: Send + 'static,
        Res: Send + 'static,
        F: FnOnce(ActorRef<Res>) -> Req,
        A: FnOnce(Result<Res, AskError>) -> T + Send + 'static,
    {
        let mut replies = match send_request(target, factory) {
            Ok(replies) => replies,
            Err(e) => {
                self.deliver_ask_outcome(adapt(Err(e)));
                return;
            }
        };

        let ctx = self.clone();
        let target_name = target.name().to_string();
        let cancelled = self.inner.token.clone();
        self.inner.children.spawn(
            async move {
                let outcome = tokio::select! {
                    _ = cancelled.cancelled() => {
                        debug!(ask_target = %target_name, "Actor stopped, dropping pending ask");
                        return;
                    }
                    outcome = await_reply(&mut replies, &target_name, timeout) => outcome,
                };
                ctx.deliver_ask_outcome(adapt(outcome));
            }
            .instrument(self.inner.span.clone()),
        );
    }

    fn deliver_ask_outcome(&self, msg: T) {
        if let Err(e) = self.pipe_to_self(msg) {
            debug!(error = %e, "Ask outcome not delivered");
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    pub(crate) fn node(&self) -> NodeId {
        self.inner.node
    }

    pub(crate) fn hierarchy(&self) -> &Arc<Hierarchy> {
        &self.inner.hierarchy
    }

    pub(crate) fn children(&self) -> &TaskTracker {
        &self.inner.children
    }
}
