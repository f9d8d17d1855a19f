use super::moves::AtomHop;
use super::validators::{MaxCoordination, MinDistance};
use super::{MoveGenerator, PolicyError, PolicyKind, PolicySpec, Validator};
use std::collections::BTreeMap;

pub type MoveFactory = fn(&toml::Table) -> Result<Box<dyn MoveGenerator>, PolicyError>;
pub type ValidatorFactory = fn(&toml::Table) -> Result<Box<dyn Validator>, PolicyError>;

/// Maps policy names to their constructors.
///
/// Construction parses the parameter table against the policy's own schema and
/// fails fast on unknown names or parameters.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    moves: BTreeMap<String, MoveFactory>,
    validators: BTreeMap<String, ValidatorFactory>,
}

impl PolicyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with every built-in policy.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_move(AtomHop::NAME, |params| {
            Ok(Box::new(AtomHop::from_params(params)?))
        });
        registry.register_validator(MinDistance::NAME, |params| {
            Ok(Box::new(MinDistance::from_params(params)?))
        });
        registry.register_validator(MaxCoordination::NAME, |params| {
            Ok(Box::new(MaxCoordination::from_params(params)?))
        });
        registry
    }

    pub fn register_move(&mut self, name: &str, factory: MoveFactory) {
        self.moves.insert(name.to_string(), factory);
    }

    pub fn register_validator(&mut self, name: &str, factory: ValidatorFactory) {
        self.validators.insert(name.to_string(), factory);
    }

    pub fn build_move(&self, spec: &PolicySpec) -> Result<Box<dyn MoveGenerator>, PolicyError> {
        let factory = self
            .moves
            .get(&spec.name)
            .ok_or_else(|| PolicyError::UnknownPolicy {
                kind: PolicyKind::MoveGenerator,
                name: spec.name.clone(),
            })?;
        factory(&spec.params)
    }

    pub fn build_validator(&self, spec: &PolicySpec) -> Result<Box<dyn Validator>, PolicyError> {
        let factory = self
            .validators
            .get(&spec.name)
            .ok_or_else(|| PolicyError::UnknownPolicy {
                kind: PolicyKind::Validator,
                name: spec.name.clone(),
            })?;
        factory(&spec.params)
    }

    pub fn build_moves(
        &self,
        specs: &[PolicySpec],
    ) -> Result<Vec<Box<dyn MoveGenerator>>, PolicyError> {
        specs.iter().map(|spec| self.build_move(spec)).collect()
    }

    pub fn build_validators(
        &self,
        specs: &[PolicySpec],
    ) -> Result<Vec<Box<dyn Validator>>, PolicyError> {
        specs.iter().map(|spec| self.build_validator(spec)).collect()
    }

    /// Registered move generator names, sorted.
    pub fn move_names(&self) -> impl Iterator<Item = &str> {
        self.moves.keys().map(String::as_str)
    }

    /// Registered validator names, sorted.
    pub fn validator_names(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_listed_in_order() {
        let registry = PolicyRegistry::with_builtins();
        assert_eq!(registry.move_names().collect::<Vec<_>>(), vec!["atom-hop"]);
        assert_eq!(
            registry.validator_names().collect::<Vec<_>>(),
            vec!["max-coordination", "min-distance"]
        );
    }

    #[test]
    fn builds_registered_policies_from_specs() {
        let registry = PolicyRegistry::with_builtins();
        let hop = PolicySpec::new("atom-hop", toml::from_str("max-step = 0.1").unwrap());
        let min = PolicySpec::new(
            "min-distance",
            toml::from_str("distances = { \"O-O\" = 2.0 }").unwrap(),
        );
        assert_eq!(registry.build_move(&hop).unwrap().name(), "atom-hop");
        let validator = registry.build_validator(&min).unwrap();
        assert_eq!(validator.name(), "min-distance");
        assert!(validator.min_distance_table().is_some());
    }

    #[test]
    fn unknown_names_fail_with_unknown_policy() {
        let registry = PolicyRegistry::with_builtins();
        let spec = PolicySpec::new("swap-atoms", toml::Table::new());
        let err = registry.build_move(&spec).err().unwrap();
        assert!(matches!(
            err,
            PolicyError::UnknownPolicy {
                kind: PolicyKind::MoveGenerator,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Unknown move generator 'swap-atoms'");

        // Names are looked up per kind.
        let hop_as_validator = PolicySpec::new("atom-hop", toml::Table::new());
        assert!(matches!(
            registry.build_validator(&hop_as_validator),
            Err(PolicyError::UnknownPolicy {
                kind: PolicyKind::Validator,
                ..
            })
        ));
    }

    #[test]
    fn custom_factories_can_be_registered() {
        let mut registry = PolicyRegistry::new();
        assert_eq!(registry.move_names().count(), 0);
        registry.register_move("hop", |params| Ok(Box::new(AtomHop::from_params(params)?)));
        let spec = PolicySpec::new("hop", toml::from_str("max-step = 0.5").unwrap());
        assert!(registry.build_moves(&[spec]).is_ok());
    }
}
