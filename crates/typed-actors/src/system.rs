//! # Actor System
//!
//! The [`ActorSystem`] bootstraps the root of an actor hierarchy: it creates the scope
//! tree, spawns the guardian actor exactly as a context would spawn a child, and keeps
//! hold of the root scope so that terminating the system tears down every actor in it.

use crate::actor::{self, panic_reason};
use crate::actor_ref::ActorRef;
use crate::ask::ask;
use crate::behavior::Behavior;
use crate::config::SystemConfig;
use crate::error::{ActorError, AskError};
use crate::scope::{Hierarchy, NodeId};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// Handle to a running actor hierarchy rooted at one guardian actor.
///
/// The handle is cheap to clone. Dropping it does not stop the system; call
/// [`ActorSystem::terminate`] for that, or [`ActorSystem::when_terminated`] to wait for the
/// guardian to stop by itself.
///
/// # Example
///
/// ```rust
/// use std::future::ready;
/// use typed_actors::{receive_message, same, ActorRef, ActorSystem};
///
/// struct Echo(String, ActorRef<String>);
///
/// #[tokio::main]
/// async fn main() {
///     let guardian = receive_message(|Echo(text, reply_to): Echo| {
///         reply_to.tell(text).ok();
///         ready(same())
///     });
///     let (system, _guardian_ref) = ActorSystem::new(guardian, "echo");
///
///     let echoed = system.ask(|reply_to| Echo("hi".into(), reply_to)).await;
///     assert_eq!(echoed, Ok("hi".to_string()));
///
///     system.terminate().await.unwrap();
///     assert_eq!(system.live_actors(), 0);
/// }
/// ```
pub struct ActorSystem<T> {
    inner: Arc<SystemInner<T>>,
}

struct SystemInner<T> {
    config: SystemConfig,
    guardian: ActorRef<T>,
    guardian_node: NodeId,
    hierarchy: Arc<Hierarchy>,
    /// Completes once the guardian's task has ended. Shared, so every waiter (including one
    /// that gave up early) observes the same outcome.
    termination: Shared<BoxFuture<'static, Result<(), ActorError>>>,
}

impl<T> Clone for ActorSystem<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> ActorSystem<T> {
    /// Starts a system named `name` running `guardian`.
    ///
    /// Returns the system handle and a reference to the guardian.
    ///
    /// # Panics
    /// When called outside a Tokio runtime.
    pub fn new(guardian: Behavior<T>, name: impl Into<String>) -> (Self, ActorRef<T>) {
        Self::with_config(guardian, SystemConfig::new(name))
    }

    pub fn with_config(guardian: Behavior<T>, config: SystemConfig) -> (Self, ActorRef<T>) {
        let hierarchy = Arc::new(Hierarchy::default());
        let root = TaskTracker::new();
        let (guardian_ref, guardian_node, task) = actor::spawn(
            &root,
            &hierarchy,
            None,
            Arc::from(config.name.as_str()),
            guardian,
        );
        root.close();
        let termination = termination(config.name.clone(), task, hierarchy.clone());
        info!(system = %config.name, "Actor system started");

        let system = Self {
            inner: Arc::new(SystemInner {
                config,
                guardian: guardian_ref.clone(),
                guardian_node,
                hierarchy,
                termination,
            }),
        };
        (system, guardian_ref)
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &SystemConfig {
        &self.inner.config
    }

    pub fn guardian(&self) -> &ActorRef<T> {
        &self.inner.guardian
    }

    /// Number of actors currently alive in this system, the guardian included.
    pub fn live_actors(&self) -> usize {
        self.inner.hierarchy.len()
    }

    /// Asks the guardian from outside the actor system, with the configured timeout.
    pub async fn ask<Res, F>(&self, factory: F) -> Result<Res, AskError>
    where
        Res: Send + 'static,
        F: FnOnce(ActorRef<Res>) -> T,
    {
        ask(&self.inner.guardian, self.inner.config.ask_timeout, factory).await
    }

    /// Waits until the guardian, and with it the whole hierarchy, has stopped.
    ///
    /// Dropping the returned future before it completes does not affect later calls.
    ///
    /// # Errors
    /// [`ActorError::Failed`] with the first actor that failed anywhere in the hierarchy.
    pub async fn when_terminated(&self) -> Result<(), ActorError> {
        self.inner.termination.clone().await
    }

    /// Stops every actor in the system and waits until they have all finished.
    pub async fn terminate(&self) -> Result<(), ActorError> {
        let cancelled = self.inner.hierarchy.cancel_subtree(self.inner.guardian_node);
        info!(system = %self.name(), cancelled, "Terminating actor system");
        self.when_terminated().await
    }
}

fn termination(
    system: String,
    guardian: JoinHandle<()>,
    hierarchy: Arc<Hierarchy>,
) -> Shared<BoxFuture<'static, Result<(), ActorError>>> {
    async move {
        let outcome = match guardian.await {
            Ok(()) => hierarchy.failure().map_or(Ok(()), Err),
            Err(e) => Err(ActorError::Failed {
                actor: system.clone(),
                reason: join_failure(e),
            }),
        };
        match &outcome {
            Ok(()) => info!(system = %system, "Actor system terminated"),
            Err(e) => error!(system = %system, error = %e, "Actor system failed"),
        }
        outcome
    }
    .boxed()
    .shared()
}

fn join_failure(e: JoinError) -> String {
    if e.is_panic() {
        panic_reason(&*e.into_panic())
    } else {
        e.to_string()
    }
}
