//! # Typed Actors
//!
//! This crate is a small actor runtime in the Erlang/Akka style, built on Tokio. Actors are
//! described as **behaviors**: values that say what to do with the next message and which
//! behavior comes after it. Every actor owns a typed mailbox, handles one message at a
//! time, and lives inside the scope of the actor that spawned it.
//!
//! ## Why Behaviors?
//!
//! - **No shared mutable state**: an actor's state lives in the closures of its current
//!   behavior and changes only by returning a new behavior
//! - **Typed protocols**: an [`ActorRef<T>`] accepts only `T`, checked at compile time
//! - **Structured lifetimes**: stopping an actor stops its whole subtree, so no actor
//!   outlives the actor (or system) that created it
//!
//! **Further Reading**:
//! - [Actor Model (Wikipedia)](https://en.wikipedia.org/wiki/Actor_model) - Foundational concurrency pattern by Carl Hewitt
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//!
//! ## Architecture Overview
//!
//! 1. **Behavior Layer** ([`Behavior`], [`setup`], [`receive`], ...) - Your actor logic
//! 2. **Runtime Layer** ([`ActorSystem`], [`ActorContext`]) - Interpretation, spawning and scopes
//! 3. **Interface Layer** ([`ActorRef`], [`ask()`], [`actor_stream`]) - Typed communication
//!
//! ## Quick Start
//!
//! ```rust
//! use std::future::ready;
//! use typed_actors::{receive, same, setup, stopped, ActorContext, ActorRef, ActorSystem};
//!
//! enum Greeter {
//!     Greet { name: String, reply_to: ActorRef<String> },
//!     Stop,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let greeter = setup(|ctx: ActorContext<Greeter>| {
//!         let greeting = format!("Hello from {}", ctx.name());
//!         ready(receive(move |_ctx, msg: Greeter| {
//!             let next = match msg {
//!                 Greeter::Greet { name, reply_to } => {
//!                     reply_to.tell(format!("{greeting}, {name}!")).ok();
//!                     same()
//!                 }
//!                 Greeter::Stop => stopped(),
//!             };
//!             ready(next)
//!         }))
//!     });
//!
//!     let (system, greeter_ref) = ActorSystem::new(greeter, "greeter");
//!     let reply = system
//!         .ask(|reply_to| Greeter::Greet { name: "Ada".into(), reply_to })
//!         .await;
//!     assert_eq!(reply.as_deref(), Ok("Hello from greeter, Ada!"));
//!
//!     greeter_ref.tell(Greeter::Stop).unwrap();
//!     system.when_terminated().await.unwrap();
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Each actor runs in its own Tokio task
//! - Messages are processed **sequentially** within an actor (no locks needed!)
//! - Messages from one sender to one receiver arrive in the order they were sent
//! - Handlers are async: while one awaits, other actors keep running
//!
//! ## Observability
//!
//! Every actor runs inside an `actor{name=...}` tracing span. See [`logging`] for the
//! subscriber setup.

mod actor;
pub mod actor_ref;
pub mod ask;
pub mod behavior;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod mailbox;
mod scope;
pub mod stream;
pub mod system;

// Re-export core types for convenience
pub use actor_ref::ActorRef;
pub use ask::ask;
pub use behavior::{receive, receive_message, same, setup, stopped, stopped_with, Behavior};
pub use config::SystemConfig;
pub use context::ActorContext;
pub use error::{ActorError, AskError};
pub use logging::{setup_tracing, try_setup_tracing};
pub use mailbox::{mailbox, Mailbox, MailboxId};
pub use stream::{actor_stream, actor_stream_with_config, ActorStream};
pub use system::ActorSystem;
