//! # Behaviors
//!
//! A [`Behavior<T>`] is an actor's entire program: a value describing what the actor does
//! with its next message or lifecycle event. Handlers return the *next* behavior, so an
//! actor changes state by returning a different behavior rather than by mutating fields.
//!
//! ## The Variants
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`Behavior::Setup`] | Run once at creation (e.g. spawn children), yielding the first real behavior |
//! | [`Behavior::Receive`] | Handle one message, yielding the next behavior |
//! | [`Behavior::Same`] | Keep the behavior that handled the message |
//! | [`Behavior::Stopped`] | Terminate |
//! | [`Behavior::StoppedWithEffect`] | Run a finalizer, then terminate |
//!
//! Build them with [`setup`], [`receive`], [`receive_message`], [`same`], [`stopped`] and
//! [`stopped_with`]. Handlers are async and must produce `Send + 'static` futures; handlers
//! that never await can return [`std::future::ready`].

use crate::context::ActorContext;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;

pub type SetupFn<T> = Box<dyn FnOnce(ActorContext<T>) -> BoxFuture<'static, Behavior<T>> + Send>;
pub type ReceiveFn<T> =
    Box<dyn Fn(ActorContext<T>, T) -> BoxFuture<'static, Behavior<T>> + Send>;
pub type PostStopFn<T> =
    Box<dyn FnOnce(ActorContext<T>) -> BoxFuture<'static, Behavior<T>> + Send>;

/// What an actor does next.
pub enum Behavior<T> {
    /// One-shot initializer, run before any message is consumed.
    Setup(SetupFn<T>),
    /// Per-message handler.
    Receive(ReceiveFn<T>),
    /// "No change": only meaningful as a handler's return value.
    Same,
    Stopped,
    /// Terminal behavior with a finalizer.
    ///
    /// Whatever behavior the finalizer returns is discarded: once stopped, an actor never
    /// runs again.
    StoppedWithEffect(PostStopFn<T>),
}

impl<T> Behavior<T> {
    /// Variant name, as used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Behavior::Setup(_) => "Setup",
            Behavior::Receive(_) => "Receive",
            Behavior::Same => "Same",
            Behavior::Stopped => "Stopped",
            Behavior::StoppedWithEffect(_) => "StoppedWithEffect",
        }
    }

    /// Whether an actor returning this behavior stops.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Behavior::Stopped | Behavior::StoppedWithEffect(_))
    }

    /// Converts to an interpreter state. `None` for [`Behavior::Same`], which never stands
    /// on its own.
    pub(crate) fn into_active(self) -> Option<Active<T>> {
        match self {
            Behavior::Setup(init) => Some(Active::Setup(init)),
            Behavior::Receive(handler) => Some(Active::Receive(handler)),
            Behavior::Same => None,
            Behavior::Stopped => Some(Active::Stopped),
            Behavior::StoppedWithEffect(post_stop) => Some(Active::StoppedWithEffect(post_stop)),
        }
    }

    /// Resolves a handler's result against the behavior that ran the handler: `Same` keeps
    /// `previous`, anything else replaces it.
    pub(crate) fn resolve(self, previous: Active<T>) -> Active<T> {
        self.into_active().unwrap_or(previous)
    }
}

impl<T> fmt::Debug for Behavior<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// The behavior an actor remembers between messages. There is no `Same` here: the
/// interpreter can never hold it as its current state.
pub(crate) enum Active<T> {
    Setup(SetupFn<T>),
    Receive(ReceiveFn<T>),
    Stopped,
    StoppedWithEffect(PostStopFn<T>),
}

impl<T> Active<T> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Active::Setup(_) => "Setup",
            Active::Receive(_) => "Receive",
            Active::Stopped => "Stopped",
            Active::StoppedWithEffect(_) => "StoppedWithEffect",
        }
    }
}

/// Runs `init` once when the actor starts; its result is the actor's first real behavior.
///
/// `init` must not return [`same()`]: there is no earlier behavior to keep, and the actor
/// fails if it does.
pub fn setup<T, F, Fut>(init: F) -> Behavior<T>
where
    T: Send + 'static,
    F: FnOnce(ActorContext<T>) -> Fut + Send + 'static,
    Fut: Future<Output = Behavior<T>> + Send + 'static,
{
    Behavior::Setup(Box::new(move |ctx: ActorContext<T>| init(ctx).boxed()))
}

/// Handles each message with access to the actor's context.
pub fn receive<T, F, Fut>(handler: F) -> Behavior<T>
where
    T: Send + 'static,
    F: Fn(ActorContext<T>, T) -> Fut + Send + 'static,
    Fut: Future<Output = Behavior<T>> + Send + 'static,
{
    Behavior::Receive(Box::new(move |ctx: ActorContext<T>, msg: T| {
        handler(ctx, msg).boxed()
    }))
}

/// Handles each message without the context.
pub fn receive_message<T, F, Fut>(handler: F) -> Behavior<T>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + 'static,
    Fut: Future<Output = Behavior<T>> + Send + 'static,
{
    Behavior::Receive(Box::new(move |_ctx: ActorContext<T>, msg: T| {
        handler(msg).boxed()
    }))
}

pub fn same<T>() -> Behavior<T> {
    Behavior::Same
}

pub fn stopped<T>() -> Behavior<T> {
    Behavior::Stopped
}

/// Stops the actor after running `post_stop`.
pub fn stopped_with<T, F, Fut>(post_stop: F) -> Behavior<T>
where
    T: Send + 'static,
    F: FnOnce(ActorContext<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Behavior::StoppedWithEffect(Box::new(move |ctx: ActorContext<T>| {
        async move {
            post_stop(ctx).await;
            Behavior::Stopped
        }
        .boxed()
    }))
}
