//! # Observability & Tracing
//!
//! The runtime logs through the `tracing` crate. Every actor runs inside its own
//! `actor{name=...}` span, and spans nest along the spawn tree, so a child's events show
//! the chain of actors that created it:
//!
//! ```text
//! DEBUG actor{name=guardian}:actor{name=worker}: Actor started path=guardian/worker
//! DEBUG actor{name=guardian}:actor{name=worker}: Actor stopped reason=Stopped cancelled=1
//! ```
//!
//! Levels are chosen with `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=debug cargo run          # lifecycle of every actor
//! RUST_LOG=typed_actors=trace ...   # every behavior transition
//! ```

/// Installs the compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// # Panics
/// If a global subscriber is already installed.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

/// Like [`setup_tracing`], but reports an already-installed subscriber as an error.
pub fn try_setup_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init()
}
