//! # shellbuddy Core
//!
//! Domain types, traits, and error definitions for the shellbuddy ambient
//! coaching daemon. This crate has **zero I/O dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The backend seam is a trait here; implementations live in their own crate.
//! This enables:
//! - Swapping transports via configuration
//! - Easy testing with mock/stub backends
//! - Clean dependency graph (all crates depend inward on core)

pub mod backend;
pub mod error;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use backend::Backend;
pub use error::{BackendError, ContextError, CorpusError, Error, Result};
pub use event::{CommandEvent, ContextEntry, ContextPayload, Severity};
