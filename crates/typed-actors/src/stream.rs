//! # Stream Bridge
//!
//! [`actor_stream`] runs a fresh actor system and exposes every message sent to one reply
//! reference as a [`futures::Stream`]. The guardian receives that reference in its first
//! message and may hand copies of it to any actor it spawns.
//!
//! The stream ends once every copy of the reply reference has been dropped, typically
//! because the actors holding them have stopped.

use crate::actor_ref::ActorRef;
use crate::behavior::Behavior;
use crate::config::SystemConfig;
use crate::error::ActorError;
use crate::mailbox::{mailbox, Mailbox};
use crate::system::ActorSystem;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tracing::debug;

/// Messages an actor system produces, consumed as a stream.
///
/// Dropping the stream closes the reply mailbox, so later sends to the reply reference
/// fail. The system itself keeps running; stop it through [`ActorStream::system`].
pub struct ActorStream<T, R> {
    system: ActorSystem<T>,
    replies: Mailbox<R>,
}

impl<T: Send + 'static, R> ActorStream<T, R> {
    /// The system feeding this stream.
    pub fn system(&self) -> &ActorSystem<T> {
        &self.system
    }
}

impl<T, R> Stream for ActorStream<T, R> {
    type Item = R;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<R>> {
        self.get_mut().replies.poll_recv(cx)
    }
}

impl<T, R> Drop for ActorStream<T, R> {
    fn drop(&mut self) {
        self.replies.close();
        debug!(stream = %self.replies.owner(), "Actor stream dropped");
    }
}

/// Starts a system running `guardian` and streams whatever reaches the reply reference
/// handed to it through `factory`.
///
/// # Errors
/// [`ActorError::MailboxClosed`] if the guardian stopped before the first message could be
/// delivered.
///
/// # Example
///
/// ```rust
/// use futures::StreamExt;
/// use std::future::ready;
/// use typed_actors::{actor_stream, receive_message, stopped, ActorRef};
///
/// #[tokio::main]
/// async fn main() {
///     let counter = receive_message(|sink: ActorRef<u32>| {
///         for n in 1..=3 {
///             sink.tell(n).ok();
///         }
///         ready(stopped())
///     });
///
///     let numbers: Vec<u32> = actor_stream(counter, |sink| sink)
///         .unwrap()
///         .collect()
///         .await;
///     assert_eq!(numbers, vec![1, 2, 3]);
/// }
/// ```
pub fn actor_stream<T, R, F>(guardian: Behavior<T>, factory: F) -> Result<ActorStream<T, R>, ActorError>
where
    T: Send + 'static,
    R: Send + 'static,
    F: FnOnce(ActorRef<R>) -> T,
{
    actor_stream_with_config(guardian, SystemConfig::default(), factory)
}

pub fn actor_stream_with_config<T, R, F>(
    guardian: Behavior<T>,
    config: SystemConfig,
    factory: F,
) -> Result<ActorStream<T, R>, ActorError>
where
    T: Send + 'static,
    R: Send + 'static,
    F: FnOnce(ActorRef<R>) -> T,
{
    let (system, guardian_ref) = ActorSystem::with_config(guardian, config);
    let (replies, reply_to) = mailbox::<R>(format!("{}$stream", system.name()));
    guardian_ref.tell(factory(reply_to))?;
    Ok(ActorStream { system, replies })
}
