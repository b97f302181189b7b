//! # Actor References
//!
//! An [`ActorRef<T>`] is the only way to address an actor: a cheap, cloneable, write-only
//! handle to the actor's mailbox. Holders can `tell` messages but can never read them back,
//! which keeps the mailbox exclusively owned by the actor that consumes it.

use crate::error::ActorError;
use crate::mailbox::MailboxId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Write side of a mailbox, erased so that narrowed references can share it.
pub(crate) trait Deliver<T>: Send + Sync {
    /// Enqueues `msg`, returning `false` when the mailbox is closed.
    fn deliver(&self, msg: T) -> bool;

    fn is_closed(&self) -> bool;

    fn mailbox_id(&self) -> MailboxId;
}

pub(crate) struct MailboxSender<T> {
    pub(crate) id: MailboxId,
    pub(crate) sender: mpsc::UnboundedSender<T>,
}

impl<T: Send> Deliver<T> for MailboxSender<T> {
    fn deliver(&self, msg: T) -> bool {
        self.sender.send(msg).is_ok()
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn mailbox_id(&self) -> MailboxId {
        self.id
    }
}

/// Converts sub-protocol messages into the protocol the mailbox actually holds.
struct Narrowed<U, T> {
    inner: Arc<dyn Deliver<T>>,
    _protocol: PhantomData<fn(U)>,
}

impl<U, T> Deliver<U> for Narrowed<U, T>
where
    U: Into<T>,
    T: 'static,
{
    fn deliver(&self, msg: U) -> bool {
        self.inner.deliver(msg.into())
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn mailbox_id(&self) -> MailboxId {
        self.inner.mailbox_id()
    }
}

/// A typed handle used to send messages to an actor.
///
/// # Identity
/// Two references are equal when they write into the same mailbox, regardless of how they
/// were obtained (cloned, narrowed, captured in a message).
///
/// # Unbounded delivery
/// Mailboxes have no capacity limit, so [`ActorRef::tell`] never waits for room. The only
/// way a send fails is when the target has stopped, and that failure is always reported.
pub struct ActorRef<T> {
    name: Arc<str>,
    sink: Arc<dyn Deliver<T>>,
}

impl<T: Send + 'static> ActorRef<T> {
    pub(crate) fn new(name: Arc<str>, sink: Arc<dyn Deliver<T>>) -> Self {
        Self { name, sink }
    }

    /// Fire-and-forget send.
    ///
    /// # Errors
    /// Returns [`ActorError::MailboxClosed`] when the target actor has stopped.
    pub fn tell(&self, msg: T) -> Result<(), ActorError> {
        if self.sink.deliver(msg) {
            Ok(())
        } else {
            Err(ActorError::MailboxClosed(self.name.to_string()))
        }
    }

    /// Name of the actor (or ephemeral mailbox) behind this reference.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }

    pub fn mailbox_id(&self) -> MailboxId {
        self.sink.mailbox_id()
    }

    /// Views this reference as a reference to a sub-protocol.
    ///
    /// An actor speaking `Protocol` can hand out an `ActorRef<Reply>` to a peer that only
    /// knows how to send `Reply`, as long as `Reply: Into<Protocol>`:
    ///
    /// ```rust
    /// use typed_actors::{mailbox, ActorRef};
    ///
    /// struct Reply(u32);
    /// enum Protocol {
    ///     Reply(Reply),
    ///     Shutdown,
    /// }
    /// impl From<Reply> for Protocol {
    ///     fn from(reply: Reply) -> Self {
    ///         Protocol::Reply(reply)
    ///     }
    /// }
    ///
    /// let (mut inbox, protocol_ref) = mailbox::<Protocol>("owner");
    /// let reply_ref: ActorRef<Reply> = protocol_ref.narrow();
    /// reply_ref.tell(Reply(7)).unwrap();
    /// assert!(matches!(inbox.try_recv(), Some(Protocol::Reply(Reply(7)))));
    /// ```
    pub fn narrow<U>(&self) -> ActorRef<U>
    where
        U: Into<T> + Send + 'static,
    {
        ActorRef {
            name: self.name.clone(),
            sink: Arc::new(Narrowed {
                inner: self.sink.clone(),
                _protocol: PhantomData,
            }),
        }
    }
}

impl<T> Clone for ActorRef<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<T> PartialEq for ActorRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.sink.mailbox_id() == other.sink.mailbox_id()
    }
}

impl<T> Eq for ActorRef<T> {}

impl<T> Hash for ActorRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sink.mailbox_id().hash(state);
    }
}

impl<T> fmt::Debug for ActorRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("name", &self.name)
            .field("mailbox", &self.sink.mailbox_id())
            .finish()
    }
}
