//! Trait instantiation
//!
//! Builds adapter objects: fresh surfaces that own one wrapped value under
//! a private binding and expose a trait bundle's capabilities over it. The
//! wrapped value's conformance is verified before any adapter state exists,
//! so a half-valid adapter is never observable.

use tracing::debug;

use crate::runtime::verify::verify_value;
use crate::error::ContractError;
use crate::runtime::{Capability, Origin, Surface, Visibility};
use crate::value::Value;

use super::TraitBundle;

/// Names starting with this prefix are reserved for internal adapter state.
const RESERVED_PREFIX: &str = "__";

impl TraitBundle {
    /// Construct an adapter wrapping `value`.
    ///
    /// Requires a factory declaration on the bundle (see
    /// [`TraitBuilder::factory`](super::TraitBuilder::factory)). The value
    /// is verified against the factory's parameter interface first (no
    /// wrappers are installed) and the binding name must not use the
    /// reserved internal prefix. Trait capabilities reach the wrapped value
    /// by self-sending to the private binding:
    ///
    /// ```ignore
    /// .func("turn_left", 0, |adapter, _| {
    ///     let car = adapter.invoke_local("car", &[])?;
    ///     car.as_object().unwrap().invoke("turn_left", &[])
    /// })
    /// ```
    ///
    /// Independent adapters over the same value share nothing but the value.
    pub fn instantiate(&self, value: Value) -> Result<Surface, ContractError> {
        let factory = self.factory().ok_or_else(|| ContractError::SpecInvalid {
            message: format!("trait '{}' declares no factory", self.name()),
        })?;

        verify_value(&factory.param_interface, &value)?;

        if factory.bound_param.starts_with(RESERVED_PREFIX) {
            return Err(ContractError::InvalidBindingName {
                name: factory.bound_param.clone(),
            });
        }

        let mut adapter = Surface::builder(format!("{}Adapter", self.name())).build();
        let bound = value.clone();
        adapter.insert_capability(
            factory.bound_param.clone(),
            Capability::new(
                std::sync::Arc::new(move |_: &Surface, _: &[Value]| Ok(bound.clone())),
                0,
                Visibility::Private,
                Origin::Own,
            ),
        );
        for name in self.capability_names() {
            // The adapter's private binding outranks a like-named bundle
            // capability; delegating capabilities rely on it staying intact.
            if name == factory.bound_param {
                continue;
            }
            if let Some(cap) = self.capability_entry(&name) {
                adapter.insert_capability(name, cap);
            }
        }
        debug!(
            bundle = self.name(),
            binding = factory.bound_param.as_str(),
            "instantiated adapter"
        );
        Ok(adapter)
    }

    /// A bundle capability packaged for insertion into an adapter surface.
    fn capability_entry(&self, name: &str) -> Option<Capability> {
        let func = self.capabilities.get(name)?;
        let arity = self.arities.get(name).copied().unwrap_or(0);
        Some(Capability::new(
            std::sync::Arc::clone(func),
            arity,
            Visibility::Public,
            Origin::FromTrait(self.name().to_string()),
        ))
    }
}
