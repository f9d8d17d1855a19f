//! # Core Module
//!
//! Stateless building blocks of a refinement run: the periodic structure model,
//! neighbor lists, file formats, and the pluggable collaborators the engine
//! consults for every candidate.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Lattices, sites, configurations and move records
//! - **Neighbor Lists** ([`neighbors`]) - Periodic range queries with full-rebuild and patch strategies
//! - **File I/O** ([`io`]) - POSCAR structures, XDATCAR trajectories and experimental G(r) curves
//! - **Structural Scoring** ([`scoring`]) - PDF mismatch error against the experimental reference
//! - **Energy Oracles** ([`oracle`]) - In-process pair potentials and out-of-process evaluators
//! - **Policies** ([`policies`]) - Move generators, geometric validators and their registry

pub mod io;
pub mod models;
pub mod neighbors;
pub mod oracle;
pub mod policies;
pub mod scoring;
