//! Trait composition
//!
//! A [`TraitBundle`] is an independently authored set of capability
//! implementations that can be merged into a surface opened for
//! composition. Merging detects name collisions: the target's own original
//! definitions win silently, everything else is an error unless the
//! [`CompositionPlan`] renamed or suppressed the colliding name first. A
//! bundle may also require an interface of its target, enforced at merge
//! time.
//!
//! # Example
//!
//! ```
//! use conformal::compose::{compose, CompositionPlan, TraitBundle};
//! use conformal::runtime::Surface;
//! use conformal::Value;
//!
//! let greeter = TraitBundle::builder("Greeter")
//!     .func("greet", 0, |_, _| Ok(Value::from("hello")))
//!     .build();
//!
//! let target = Surface::builder("Host").build().open_for_composition();
//! let composed = compose(&target, &greeter, CompositionPlan::new()).unwrap();
//! assert_eq!(composed.invoke("greet", &[]).unwrap(), Value::from("hello"));
//! ```

pub mod instantiate;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::ContractError;
use crate::runtime::verify::verify;
use crate::runtime::{Capability, CapabilityFn, Origin, Surface, Visibility};
use crate::spec::InterfaceSpec;
use crate::value::Value;

/// Descriptor for a bundle's instantiator: a factory that wraps a value
/// satisfying `param_interface` behind an adapter exposing the bundle's
/// capabilities.
#[derive(Debug, Clone)]
pub struct FactorySpec {
    pub name: String,
    pub bound_param: String,
    pub param_interface: Arc<InterfaceSpec>,
}

/// A named, reusable set of capability implementations.
#[derive(Clone)]
pub struct TraitBundle {
    name: String,
    capabilities: BTreeMap<String, CapabilityFn>,
    arities: BTreeMap<String, usize>,
    required_interface: Option<Arc<InterfaceSpec>>,
    factory: Option<FactorySpec>,
}

impl TraitBundle {
    pub fn builder(name: impl Into<String>) -> TraitBuilder {
        TraitBuilder {
            bundle: TraitBundle {
                name: name.into(),
                capabilities: BTreeMap::new(),
                arities: BTreeMap::new(),
                required_interface: None,
                factory: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability_names(&self) -> Vec<String> {
        self.capabilities.keys().cloned().collect()
    }

    pub fn required_interface(&self) -> Option<&Arc<InterfaceSpec>> {
        self.required_interface.as_ref()
    }

    pub fn factory(&self) -> Option<&FactorySpec> {
        self.factory.as_ref()
    }
}

/// Builder for [`TraitBundle`].
pub struct TraitBuilder {
    bundle: TraitBundle,
}

impl TraitBuilder {
    /// Add a capability implementation.
    pub fn func<F>(mut self, name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&Surface, &[Value]) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.bundle.capabilities.insert(name.clone(), Arc::new(func));
        self.bundle.arities.insert(name, arity);
        self
    }

    /// Require an interface of any target this trait is composed into,
    /// verified at merge time.
    pub fn requires_interface(mut self, spec: &Arc<InterfaceSpec>) -> Self {
        self.bundle.required_interface = Some(Arc::clone(spec));
        self
    }

    /// Declare an instantiator for this bundle (see
    /// [`instantiate`](TraitBundle::instantiate)). The wrapped value will be
    /// reachable from trait capabilities as a private capability named
    /// `bound_param`.
    pub fn factory(
        mut self,
        name: impl Into<String>,
        bound_param: impl Into<String>,
        param_interface: &Arc<InterfaceSpec>,
    ) -> Self {
        self.bundle.factory = Some(FactorySpec {
            name: name.into(),
            bound_param: bound_param.into(),
            param_interface: Arc::clone(param_interface),
        });
        self
    }

    pub fn build(self) -> TraitBundle {
        self.bundle
    }
}

/// Rename/suppress resolutions applied to a bundle's capability names
/// before merging. Consumed by [`compose`]; one plan per merge.
#[derive(Debug, Clone, Default)]
pub struct CompositionPlan {
    aliases: BTreeMap<String, String>,
    suppressions: BTreeSet<String>,
}

impl CompositionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose the bundle's `old` capability under `new` instead.
    pub fn alias(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.aliases.insert(old.into(), new.into());
        self
    }

    /// Drop a bundle capability from the merge entirely.
    pub fn suppress(mut self, name: impl Into<String>) -> Self {
        self.suppressions.insert(name.into());
        self
    }
}

/// Merge `bundle` into `target`, returning the derived surface.
///
/// The target must have been opened for composition. Suppressions and
/// aliases are applied to a private copy of the bundle first; conflicts
/// with capabilities the target originally owns resolve silently in the
/// target's favor, all other conflicts are collected into a single
/// [`ContractError::CapabilityConflict`]. If the bundle requires an
/// interface the target has not already adopted, it is verified here
/// without wrapper installation.
pub fn compose(
    target: &Surface,
    bundle: &TraitBundle,
    plan: CompositionPlan,
) -> Result<Surface, ContractError> {
    if !target.is_open_for_composition() {
        return Err(ContractError::CompositionNotAllowed {
            target: target.name().to_string(),
        });
    }

    let mut capabilities = bundle.capabilities.clone();
    let mut arities = bundle.arities.clone();

    for name in &plan.suppressions {
        capabilities.remove(name);
        arities.remove(name);
    }
    for (old, new) in &plan.aliases {
        let func = capabilities
            .remove(old)
            .ok_or_else(|| ContractError::AliasTargetMissing {
                bundle: bundle.name.clone(),
                name: old.clone(),
            })?;
        let arity = arities.remove(old).unwrap_or(0);
        capabilities.insert(new.clone(), func);
        arities.insert(new.clone(), arity);
    }

    // The target's own original definitions always win; only collisions
    // with previously composed traits are unresolved conflicts.
    let mut unresolved = Vec::new();
    for name in capabilities.keys() {
        if let Some(existing) = target.capability(name) {
            match existing.origin() {
                Origin::Own => {}
                Origin::FromTrait(_) => unresolved.push(name.clone()),
            }
        }
    }
    if !unresolved.is_empty() {
        return Err(ContractError::CapabilityConflict { names: unresolved });
    }

    if let Some(spec) = &bundle.required_interface {
        if !target.has_adopted(spec.name()) {
            verify(target, spec)?;
        }
    }

    let mut derived = target.clone();
    for (name, func) in capabilities {
        if derived.capability(&name).is_some() {
            // Target-owned definition wins; skip silently.
            continue;
        }
        let arity = arities.get(&name).copied().unwrap_or(0);
        derived.insert_capability(
            name,
            Capability::new(
                func,
                arity,
                Visibility::Public,
                Origin::FromTrait(bundle.name.clone()),
            ),
        );
    }
    debug!(
        surface = target.name(),
        bundle = bundle.name.as_str(),
        "composed trait into target"
    );
    Ok(derived)
}
