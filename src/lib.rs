//! # Media Sorter
//!
//! Sorts an unsorted tree of photos and videos into a dated folder layout.
//!
//! ## Core Philosophy
//! - **Never touch the source** - every file is copied, originals stay put
//! - **Never overwrite** - colliding names get a `_1`, `_2`, ... suffix
//! - **Never lose a file** - anything that can't be sorted lands in a
//!   quarantine folder and is listed in the run report
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - Classification, conversion, dedup and transfer pipeline
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//!
//! The `media-sort` binary wraps the library in a command-line interface.

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{OrganizerError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// `default_directive` is used when `RUST_LOG` is not set.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // A second initialisation (e.g. from tests) keeps the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
