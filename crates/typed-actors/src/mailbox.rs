//! # Mailboxes
//!
//! A [`Mailbox<T>`] is the read side of an actor's message queue: unbounded, FIFO per
//! sender, one consumer and any number of producers (the [`ActorRef`]s created with it).
//!
//! Unbounded queues mean no backpressure: a fast producer can grow a slow actor's mailbox
//! without limit. Bounded mailboxes with an overflow policy (drop, block the sender, fail the
//! sender) are not provided.

use crate::actor_ref::{ActorRef, MailboxSender};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

static NEXT_MAILBOX: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MailboxId(u64);

impl MailboxId {
    fn next() -> Self {
        Self(NEXT_MAILBOX.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Creates a mailbox and the first reference to it.
///
/// `owner` names the actor (or ephemeral consumer) reading the mailbox; it is reported
/// in [`ActorError::MailboxClosed`](crate::ActorError::MailboxClosed) when a send fails.
pub fn mailbox<T: Send + 'static>(owner: impl Into<Arc<str>>) -> (Mailbox<T>, ActorRef<T>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let id = MailboxId::next();
    let owner = owner.into();
    let actor_ref = ActorRef::new(owner.clone(), Arc::new(MailboxSender { id, sender }));
    let mailbox = Mailbox {
        id,
        owner,
        receiver,
    };
    (mailbox, actor_ref)
}

/// The single-consumer end of a message queue.
pub struct Mailbox<T> {
    id: MailboxId,
    owner: Arc<str>,
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> Mailbox<T> {
    /// Waits for the next message.
    ///
    /// Returns `None` once the mailbox is closed and drained, or when every reference to
    /// it has been dropped.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.receiver.poll_recv(cx)
    }

    /// Takes a message if one is already queued.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Rejects every later send. Messages already queued can still be received.
    pub fn close(&mut self) {
        self.receiver.close();
    }

    pub fn id(&self) -> MailboxId {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl<T> fmt::Debug for Mailbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("owner", &self.owner)
            .field("id", &self.id)
            .finish()
    }
}
