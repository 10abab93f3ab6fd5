//! # shellbuddy KB
//!
//! The rule dispatcher for the shellbuddy knowledge base. Loads `kb.json`
//! once, compiles all patterns, and routes each command to only its relevant
//! rule bucket, so a scan stays sub-millisecond even with thousands of rules.
//!
//! Corpus patterns are partially-trusted input: compilation goes through a
//! bounded, linear-time regex engine and invalid rules are skipped, never
//! fatal.

pub mod builtin;
pub mod dispatcher;
pub mod rule;

pub use builtin::builtin_rules;
pub use dispatcher::{LoadStats, RankedHint, RuleDispatcher};
pub use rule::{Rule, RuleDef};
