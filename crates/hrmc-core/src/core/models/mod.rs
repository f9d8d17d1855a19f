//! # Core Models Module
//!
//! Data structures describing a periodic atomic configuration.
//!
//! - [`lattice`] - The periodic cell and fractional/cartesian conversions
//! - [`site`] - A single atomic site with species, coordinates and oxidation state
//! - [`configuration`] - The ordered site collection refined by the engine, and the
//!   [`MoveRecord`](configuration::MoveRecord) used to merge candidate moves into it
//!
//! ```ignore
//! use hrmc::core::models::{configuration::Configuration, lattice::Lattice, site::Site};
//! use nalgebra::Vector3;
//!
//! let lattice = Lattice::cubic(8.0)?;
//! let sites = vec![Site::new("Al", Vector3::zeros(), &lattice)];
//! let configuration = Configuration::new(lattice, sites);
//! ```

pub mod configuration;
pub mod lattice;
pub mod site;
