//! # shellbuddy Context
//!
//! The shared, append-only session log. Every tier reads it for situational
//! context and writes to it as a side effect; writes are serialized by a
//! mutex and persisted via atomic temp-write-then-rename, so a concurrent
//! reader never observes a partially written log.

pub mod atomic;
pub mod log;
pub mod render;

pub use atomic::write_atomic;
pub use log::ContextLog;
pub use render::render_for_prompt;
