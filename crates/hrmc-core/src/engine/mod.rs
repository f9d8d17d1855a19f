//! # Engine Module
//!
//! The stateful logic of a refinement run: how candidates are produced, judged
//! and recorded, independent of where structures and collaborators come from.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run parameters and their validating builder
//! - **Acceptance** ([`acceptance`]) - The dual-criterion error/energy acceptance rule
//! - **State Tracking** ([`state`]) - Acceptance state, quenching schedule and move counters
//! - **Batch Production** ([`batch`]) - Parallel candidate attempts and conflict resolution
//! - **Run Log** ([`runlog`]) - Append-only diagnostics and structure snapshots
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-level error taxonomy

pub mod acceptance;
pub mod batch;
pub mod config;
pub mod error;
pub mod progress;
pub mod runlog;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
