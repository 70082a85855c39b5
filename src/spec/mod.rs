//! Interface specs
//!
//! An [`InterfaceSpec`] is a named bundle of required capabilities, each
//! with an optional arity or full signature. Specs compose: a spec may
//! extend others, folding their resolved requirements in, and may exclude
//! inherited names. Specs are built once through [`SpecBuilder`] and are
//! immutable afterwards; resolution is pure and idempotent.
//!
//! # Example
//!
//! ```
//! use conformal::spec::{InterfaceSpec, TypeDescriptor};
//! use conformal::TypeTag;
//!
//! let int = || TypeDescriptor::concrete(TypeTag::Int);
//! let adder = InterfaceSpec::builder("Adder")
//!     .proto("sum", [TypeDescriptor::sequence_of(int())], Some(int()))
//!     .build()
//!     .unwrap();
//!
//! let calculator = InterfaceSpec::builder("Calculator")
//!     .extends(&adder)
//!     .proto("fact", [int()], Some(int()))
//!     .build()
//!     .unwrap();
//!
//! let resolved = calculator.resolve();
//! assert!(resolved.public.contains_key("sum"));
//! assert!(resolved.public.contains_key("fact"));
//! ```

pub mod types;
pub mod validation;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub use types::{Signature, TypeDescriptor};

use crate::error::ContractError;

/// How one required capability is checked.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    /// The capability must exist; nothing else is enforced.
    Presence,
    /// The capability must declare exactly this arity.
    Arity(usize),
    /// Full signature: arity plus per-call argument/return validation when
    /// runtime checks are installed.
    Typed(Signature),
}

impl Requirement {
    /// The arity this requirement enforces, if any.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Requirement::Presence => None,
            Requirement::Arity(n) => Some(*n),
            Requirement::Typed(sig) => Some(sig.arity()),
        }
    }

    /// The signature carried by a `Typed` requirement.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Requirement::Typed(sig) => Some(sig),
            _ => None,
        }
    }
}

/// A named, composable bundle of required capabilities.
#[derive(Debug, Clone)]
pub struct InterfaceSpec {
    name: String,
    public_required: BTreeMap<String, Requirement>,
    private_required: BTreeMap<String, Requirement>,
    parents: Vec<Arc<InterfaceSpec>>,
    excluded: BTreeSet<String>,
}

/// The resolved (inherited + own, minus excluded) requirement sets of a spec.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSpec {
    pub public: BTreeMap<String, Requirement>,
    pub private: BTreeMap<String, Requirement>,
}

impl InterfaceSpec {
    pub fn builder(name: impl Into<String>) -> SpecBuilder {
        SpecBuilder {
            name: name.into(),
            public_required: BTreeMap::new(),
            private_required: BTreeMap::new(),
            parents: Vec::new(),
            excluded: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compute the full requirement sets: parents first (each fully
    /// resolved, so a parent's own exclusions apply to its contribution),
    /// then own definitions overriding inherited ones on name collision,
    /// then this spec's exclusions. Never mutates parents.
    pub fn resolve(&self) -> ResolvedSpec {
        let mut resolved = ResolvedSpec::default();
        for parent in &self.parents {
            let inherited = parent.resolve();
            resolved.public.extend(inherited.public);
            resolved.private.extend(inherited.private);
        }
        for (name, req) in &self.public_required {
            resolved.public.insert(name.clone(), req.clone());
        }
        for (name, req) in &self.private_required {
            resolved.private.insert(name.clone(), req.clone());
        }
        for name in &self.excluded {
            resolved.public.remove(name);
            resolved.private.remove(name);
        }
        resolved
    }
}

/// Declarative builder for [`InterfaceSpec`].
pub struct SpecBuilder {
    name: String,
    public_required: BTreeMap<String, Requirement>,
    private_required: BTreeMap<String, Requirement>,
    parents: Vec<Arc<InterfaceSpec>>,
    excluded: BTreeSet<String>,
}

impl SpecBuilder {
    /// Require public capabilities by name, presence only.
    pub fn public_visible<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.public_required.insert(name.into(), Requirement::Presence);
        }
        self
    }

    /// Require a public capability with an exact arity.
    pub fn public_with_arity(mut self, name: impl Into<String>, arity: usize) -> Self {
        self.public_required
            .insert(name.into(), Requirement::Arity(arity));
        self
    }

    /// Require a public capability with a full signature. Arity is implied
    /// by the number of input descriptors.
    pub fn proto(
        mut self,
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = TypeDescriptor>,
        output: Option<TypeDescriptor>,
    ) -> Self {
        self.public_required.insert(
            name.into(),
            Requirement::Typed(Signature::new(inputs, output)),
        );
        self
    }

    /// Require capabilities that must exist at any visibility.
    pub fn private_visible<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.private_required
                .insert(name.into(), Requirement::Presence);
        }
        self
    }

    /// Record an arity on a private requirement. Conformance checks private
    /// requirements for presence only; the arity is descriptive.
    pub fn private_with_arity(mut self, name: impl Into<String>, arity: usize) -> Self {
        self.private_required
            .insert(name.into(), Requirement::Arity(arity));
        self
    }

    /// Extend a parent spec, folding its resolved requirements in.
    pub fn extends(mut self, parent: &Arc<InterfaceSpec>) -> Self {
        self.parents.push(Arc::clone(parent));
        self
    }

    /// Remove names from the resolved requirement set. Typically used in a
    /// sub-interface that wants a partial implementation of a parent.
    pub fn unrequired<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.excluded.insert(name.into());
        }
        self
    }

    pub fn build(self) -> Result<Arc<InterfaceSpec>, ContractError> {
        if self.name.is_empty() {
            return Err(ContractError::SpecInvalid {
                message: "interface spec name must not be empty".to_string(),
            });
        }
        for name in self.public_required.keys() {
            if self.private_required.contains_key(name) {
                return Err(ContractError::SpecInvalid {
                    message: format!(
                        "'{name}' is required both publicly and privately in {}",
                        self.name
                    ),
                });
            }
        }
        for req in self.public_required.values().chain(self.private_required.values()) {
            if let Requirement::Typed(sig) = req {
                sig.check_well_formed()?;
            }
        }
        Ok(Arc::new(InterfaceSpec {
            name: self.name,
            public_required: self.public_required,
            private_required: self.private_required,
            parents: self.parents,
            excluded: self.excluded,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeTag;

    fn int() -> TypeDescriptor {
        TypeDescriptor::concrete(TypeTag::Int)
    }

    #[test]
    fn resolve_merges_parents() {
        let alpha = InterfaceSpec::builder("Alpha")
            .public_visible(["alpha", "beta"])
            .build()
            .unwrap();
        let gamma = InterfaceSpec::builder("Gamma")
            .extends(&alpha)
            .public_visible(["gamma"])
            .build()
            .unwrap();

        let resolved = gamma.resolve();
        assert!(resolved.public.contains_key("alpha"));
        assert!(resolved.public.contains_key("beta"));
        assert!(resolved.public.contains_key("gamma"));
    }

    #[test]
    fn exclusion_removes_inherited_names() {
        let alpha = InterfaceSpec::builder("Alpha")
            .public_visible(["alpha", "beta"])
            .build()
            .unwrap();
        let partial = InterfaceSpec::builder("Partial")
            .extends(&alpha)
            .public_visible(["gamma"])
            .unrequired(["alpha"])
            .build()
            .unwrap();

        let resolved = partial.resolve();
        assert!(!resolved.public.contains_key("alpha"));
        assert!(resolved.public.contains_key("beta"));
        // Parent spec untouched.
        assert!(alpha.resolve().public.contains_key("alpha"));
    }

    #[test]
    fn own_definition_overrides_inherited() {
        let parent = InterfaceSpec::builder("Parent")
            .public_with_arity("run", 2)
            .build()
            .unwrap();
        let child = InterfaceSpec::builder("Child")
            .extends(&parent)
            .proto("run", [int()], Some(int()))
            .build()
            .unwrap();

        let resolved = child.resolve();
        assert_eq!(resolved.public["run"].arity(), Some(1));
    }

    #[test]
    fn resolve_is_idempotent() {
        let parent = InterfaceSpec::builder("Parent")
            .public_visible(["a"])
            .build()
            .unwrap();
        let child = InterfaceSpec::builder("Child")
            .extends(&parent)
            .public_visible(["b"])
            .unrequired(["a"])
            .build()
            .unwrap();

        let first: Vec<_> = child.resolve().public.keys().cloned().collect();
        let second: Vec<_> = child.resolve().public.keys().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["b".to_string()]);
    }

    #[test]
    fn public_private_overlap_is_rejected() {
        let result = InterfaceSpec::builder("Clash")
            .public_visible(["x"])
            .private_visible(["x"])
            .build();
        assert!(matches!(result, Err(ContractError::SpecInvalid { .. })));
    }

    #[test]
    fn malformed_descriptor_fails_build() {
        let result = InterfaceSpec::builder("Bad")
            .proto("f", [TypeDescriptor::one_of([])], None)
            .build();
        assert!(matches!(result, Err(ContractError::SpecInvalid { .. })));
    }
}
