//! Agent module for voxcrm
//!
//! Contains the orchestration loop and the client-action collector.

pub mod actions;
pub mod core;

pub use actions::{ActionCollector, ClientAction, CollectedActions};
pub use core::{Orchestrator, TurnOutcome, TurnRequest};
