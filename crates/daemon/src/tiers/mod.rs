//! The feedback tiers.
//!
//! Reflex runs synchronously on the control path; ambient, advisor,
//! expert, and post-mortem are spawned into single-flight task slots and
//! report back through the Context Log and their output files.

pub mod advisor;
pub mod ambient;
pub mod expert;
pub mod post_mortem;
pub mod reflex;
