//! Pluggable move generators and geometric validators.
//!
//! Policies are constructed by name from a [`PolicyRegistry`](registry::PolicyRegistry)
//! so that run configurations can list them with free-form parameter tables.
//! Both traits are `Send + Sync`: a single instance is shared read-only by every
//! batch worker.

pub mod moves;
pub mod registry;
pub mod validators;

use crate::core::models::configuration::{Configuration, MoveRecord};
use crate::core::neighbors::SpatialIndex;
use rand::RngCore;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;
use validators::MinDistanceTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    MoveGenerator,
    Validator,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::MoveGenerator => write!(f, "move generator"),
            PolicyKind::Validator => write!(f, "validator"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Unknown {kind} '{name}'")]
    UnknownPolicy { kind: PolicyKind, name: String },
    #[error("Invalid parameters for '{name}': {source}")]
    InvalidParameters {
        name: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid '{name}' policy: {reason}")]
    Invalid { name: String, reason: String },
}

/// A named policy with its raw parameter table, as written in a run configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySpec {
    pub name: String,
    #[serde(default)]
    pub params: toml::Table,
}

impl PolicySpec {
    pub fn new(name: &str, params: toml::Table) -> Self {
        Self {
            name: name.to_string(),
            params,
        }
    }
}

pub trait MoveGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Proposes exactly one perturbed site of `configuration`.
    ///
    /// Returns `None` when no move is possible (e.g. an empty configuration).
    fn propose(&self, configuration: &Configuration, rng: &mut dyn RngCore) -> Option<MoveRecord>;
}

/// A perturbed configuration awaiting validation.
pub struct Candidate<'a> {
    pub configuration: &'a Configuration,
    /// Index of the site that was moved.
    pub moved: usize,
    pub index: &'a dyn SpatialIndex,
}

pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, candidate: &Candidate<'_>) -> bool;

    /// The species-pair minimum distances this validator enforces, if any.
    ///
    /// Batch conflict resolution prunes merged moves against this table.
    fn min_distance_table(&self) -> Option<&MinDistanceTable> {
        None
    }
}

/// A candidate is valid only if every validator accepts it.
pub fn all_valid(validators: &[Box<dyn Validator>], candidate: &Candidate<'_>) -> bool {
    validators.iter().all(|v| v.check(candidate))
}

pub(crate) fn parse_params<T: DeserializeOwned>(
    name: &str,
    params: &toml::Table,
) -> Result<T, PolicyError> {
    toml::Value::Table(params.clone())
        .try_into()
        .map_err(|source| PolicyError::InvalidParameters {
            name: name.to_string(),
            source,
        })
}
