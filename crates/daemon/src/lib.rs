//! # shellbuddy Daemon
//!
//! The orchestrator and its feedback tiers. One control loop polls the
//! external command log; the reflex tier answers synchronously from the
//! rule corpus, while the ambient, advisor, expert, and post-mortem tiers
//! run as single-flight background tasks so the control path never waits
//! on a model call.

pub mod cmd_log;
pub mod orchestrator;
pub mod output;
pub mod prompts;
pub mod session;
pub mod single_flight;
pub mod tiers;

pub use orchestrator::Orchestrator;
pub use session::SessionState;
pub use single_flight::TaskSlot;
