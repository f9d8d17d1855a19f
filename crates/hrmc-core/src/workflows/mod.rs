//! # Workflows Module
//!
//! High-level entry points that wire loaded inputs into the engine.
//!
//! ## Overview
//!
//! A workflow turns a validated [`RefinementConfig`](crate::engine::config::RefinementConfig)
//! into a finished run: it loads the initial structure, experimental reference and
//! energy oracle, builds the move generators and validators from a
//! [`PolicyRegistry`](crate::core::policies::registry::PolicyRegistry), and drives
//! the HRMC loop for the configured number of steps.
//!
//! ## Available Workflows
//!
//! - **Refinement** ([`refine`]) - Hybrid Reverse Monte Carlo refinement against a
//!   measured pair distribution function

pub mod refine;
