//! # HRMC Core Library
//!
//! Hybrid Reverse Monte Carlo refinement of periodic atomic structures: a
//! configuration is perturbed one atom at a time until its pair-distribution
//! function and its potential energy jointly match an experimental G(r) curve.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Configuration`, `Lattice`),
//!   neighbor lists, file formats, and the contracts of the external collaborators:
//!   structure scorers, energy oracles, move generators and validators.
//!
//! - **[`engine`]: The Logic Core.** The dual-criterion acceptance rule with its
//!   annealing schedule, the parallel batch candidate producer with conflict
//!   resolution, run configuration, and the append-only run log.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into a
//!   complete refinement run with progress reporting.

pub mod core;
pub mod engine;
pub mod workflows;
