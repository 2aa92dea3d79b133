//! Contracts and the contract registry.
//!
//! A [`Contract`] is a named interface specification enforced against facets
//! at build time: required methods must appear in the facet's
//! [`methods`](crate::facet::Facet::methods) listing, required properties must
//! resolve through [`property`](crate::facet::Facet::property), and an
//! optional custom validator gets the final say. Enforcement happens during
//! the pure verify phase, before any facet is initialized, so a contract
//! failure leaves the container untouched.
//!
//! # Example
//!
//! ```
//! use mosaic_facet::contract::{Contract, ContractRegistry};
//!
//! let mut registry = ContractRegistry::new();
//! registry.register(
//!     Contract::new("key-value")
//!         .require_methods(["get", "put"])
//!         .require_properties(["capacity"]),
//! );
//! assert!(registry.has("key-value"));
//! ```

use std::sync::Arc;

use indexmap::IndexMap;

use crate::ctx::Ctx;
use crate::error::{BuildError, FacetError};
use crate::facet::Facet;

/// Custom validation routine run after the shape checks pass.
pub type ContractValidator =
    Arc<dyn Fn(&Ctx, &dyn Facet) -> Result<(), FacetError> + Send + Sync>;

/// A named interface specification.
pub struct Contract {
    name: String,
    required_methods: Vec<String>,
    required_properties: Vec<String>,
    validator: Option<ContractValidator>,
}

impl Contract {
    /// Creates an empty contract with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_methods: Vec::new(),
            required_properties: Vec::new(),
            validator: None,
        }
    }

    /// Adds methods every conforming facet must list.
    #[must_use]
    pub fn require_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_methods
            .extend(methods.into_iter().map(Into::into));
        self
    }

    /// Adds properties every conforming facet must resolve.
    #[must_use]
    pub fn require_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_properties
            .extend(properties.into_iter().map(Into::into));
        self
    }

    /// Installs a custom validator run after the shape checks.
    #[must_use]
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Ctx, &dyn Facet) -> Result<(), FacetError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// The contract's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods a conforming facet must list.
    #[must_use]
    pub fn required_methods(&self) -> &[String] {
        &self.required_methods
    }

    /// Properties a conforming facet must resolve.
    #[must_use]
    pub fn required_properties(&self) -> &[String] {
        &self.required_properties
    }

    /// Enforces this contract against a facet.
    ///
    /// Checks methods, then properties, then the custom validator. Validator
    /// failures are wrapped with contract-name context.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ContractViolation`] describing the first failure.
    pub fn enforce(&self, ctx: &Ctx, facet: &dyn Facet) -> Result<(), BuildError> {
        let methods = facet.methods();
        for method in &self.required_methods {
            if !methods.iter().any(|provided| provided == method) {
                return Err(self.violation(facet, format!("missing required method '{method}'")));
            }
        }

        for property in &self.required_properties {
            if facet.property(property).is_none() {
                return Err(
                    self.violation(facet, format!("missing required property '{property}'"))
                );
            }
        }

        if let Some(validator) = &self.validator {
            validator(ctx, facet)
                .map_err(|error| self.violation(facet, format!("validator failed: {error}")))?;
        }

        Ok(())
    }

    fn violation(&self, facet: &dyn Facet, reason: String) -> BuildError {
        BuildError::ContractViolation {
            contract: self.name.clone(),
            kind: facet.kind().to_string(),
            reason,
        }
    }
}

impl core::fmt::Debug for Contract {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Contract")
            .field("name", &self.name)
            .field("required_methods", &self.required_methods)
            .field("required_properties", &self.required_properties)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Registry of contracts, keyed by name.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: IndexMap<String, Contract>,
}

impl ContractRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a contract. An existing contract with the same name is
    /// replaced and returned.
    pub fn register(&mut self, contract: Contract) -> Option<Contract> {
        self.contracts.insert(contract.name.clone(), contract)
    }

    /// Returns true if a contract with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Returns the contract with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Contract> {
        self.contracts.get(name)
    }

    /// Removes and returns the contract with the given name.
    pub fn remove(&mut self, name: &str) -> Option<Contract> {
        self.contracts.shift_remove(name)
    }

    /// The registered contract names, in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.contracts.keys().map(String::as_str).collect()
    }

    /// Enforces a named contract against a facet.
    ///
    /// `source` is the provenance reported if the contract is unregistered.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnknownContract`] if the name is not registered, or the
    /// enforcement error from [`Contract::enforce`].
    pub fn enforce(
        &self,
        name: &str,
        ctx: &Ctx,
        facet: &dyn Facet,
        source: &str,
    ) -> Result<(), BuildError> {
        let Some(contract) = self.contracts.get(name) else {
            return Err(BuildError::UnknownContract {
                contract: name.to_string(),
                kind: facet.kind().to_string(),
                source: source.to_string(),
            });
        };
        contract.enforce(ctx, facet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    struct Store {
        with_capacity: bool,
    }

    impl Facet for Store {
        fn kind(&self) -> &str {
            "store"
        }

        fn methods(&self) -> &[&'static str] {
            &["get", "put"]
        }

        fn property(&self, name: &str) -> Option<Value> {
            (name == "capacity" && self.with_capacity).then(|| json!(128))
        }
    }

    #[test]
    fn enforce_passes_on_conforming_facet() {
        let contract = Contract::new("key-value")
            .require_methods(["get", "put"])
            .require_properties(["capacity"]);
        let facet = Store {
            with_capacity: true,
        };
        contract.enforce(&Ctx::new(), &facet).unwrap();
    }

    #[test]
    fn enforce_reports_missing_method() {
        let contract = Contract::new("key-value").require_methods(["get", "delete"]);
        let facet = Store {
            with_capacity: true,
        };
        let err = contract.enforce(&Ctx::new(), &facet).unwrap_err();
        match err {
            BuildError::ContractViolation {
                contract, reason, ..
            } => {
                assert_eq!(contract, "key-value");
                assert!(reason.contains("delete"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn enforce_reports_missing_property() {
        let contract = Contract::new("key-value").require_properties(["capacity"]);
        let facet = Store {
            with_capacity: false,
        };
        let err = contract.enforce(&Ctx::new(), &facet).unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn validator_failures_carry_contract_context() {
        let contract = Contract::new("strict")
            .with_validator(|_, _| Err(FacetError::msg("refused by policy")));
        let facet = Store {
            with_capacity: true,
        };
        let err = contract.enforce(&Ctx::new(), &facet).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("strict"));
        assert!(text.contains("refused by policy"));
    }

    #[test]
    fn registry_round_trip() {
        let mut registry = ContractRegistry::new();
        registry.register(Contract::new("a"));
        registry.register(Contract::new("b"));

        assert!(registry.has("a"));
        assert_eq!(registry.list(), vec!["a", "b"]);
        assert!(registry.remove("a").is_some());
        assert!(!registry.has("a"));
        assert!(registry.get("b").is_some());
    }

    #[test]
    fn registry_enforce_rejects_unknown_contract() {
        let registry = ContractRegistry::new();
        let facet = Store {
            with_capacity: true,
        };
        let err = registry
            .enforce("ghost", &Ctx::new(), &facet, "tests::registry")
            .unwrap_err();
        match err {
            BuildError::UnknownContract { contract, source, .. } => {
                assert_eq!(contract, "ghost");
                assert_eq!(source, "tests::registry");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
