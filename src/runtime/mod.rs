//! Target capability surfaces
//!
//! A [`Surface`] is the opaque capability registry the verifier and
//! composer operate on: a named set of public and private callables, each
//! with a declared arity and an origin tag. The host object system behind a
//! surface is out of scope; anything that can register closures here can be
//! verified, composed into, and wrapped.

pub mod verify;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::ContractError;
use crate::value::Value;

/// A capability implementation. Receives the surface it is invoked on (for
/// self-sends) and the positional arguments.
pub type CapabilityFn =
    Arc<dyn Fn(&Surface, &[Value]) -> Result<Value, ContractError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Who contributed a capability: the target's own definition, or a trait
/// composed in later. Ownership drives conflict resolution: an `Own`
/// capability always wins against a composed bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Own,
    FromTrait(String),
}

/// One entry in a surface's capability registry.
#[derive(Clone)]
pub struct Capability {
    func: CapabilityFn,
    arity: usize,
    visibility: Visibility,
    origin: Origin,
}

impl Capability {
    pub fn new(func: CapabilityFn, arity: usize, visibility: Visibility, origin: Origin) -> Self {
        Self {
            func,
            arity,
            visibility,
            origin,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub(crate) fn func(&self) -> CapabilityFn {
        Arc::clone(&self.func)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("arity", &self.arity)
            .field("visibility", &self.visibility)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// A named, queryable capability surface.
#[derive(Debug, Clone)]
pub struct Surface {
    name: String,
    capabilities: BTreeMap<String, Capability>,
    adopted: BTreeSet<String>,
    runtime_checks_enabled: bool,
    arity_checks_skipped: bool,
    open_for_composition: bool,
}

impl Surface {
    pub fn builder(name: impl Into<String>) -> SurfaceBuilder {
        SurfaceBuilder {
            surface: Surface {
                name: name.into(),
                capabilities: BTreeMap::new(),
                adopted: BTreeSet::new(),
                runtime_checks_enabled: false,
                arity_checks_skipped: false,
                open_for_composition: false,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of externally callable capabilities, sorted.
    pub fn public_capabilities(&self) -> Vec<String> {
        self.capabilities
            .iter()
            .filter(|(_, cap)| cap.visibility == Visibility::Public)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Names of all capabilities, public and private, sorted.
    pub fn all_capabilities(&self) -> Vec<String> {
        self.capabilities.keys().cloned().collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    pub fn has_public(&self, name: &str) -> bool {
        self.capabilities
            .get(name)
            .is_some_and(|cap| cap.visibility == Visibility::Public)
    }

    pub fn arity_of(&self, name: &str) -> Option<usize> {
        self.capabilities.get(name).map(|cap| cap.arity)
    }

    pub(crate) fn capability(&self, name: &str) -> Option<&Capability> {
        self.capabilities.get(name)
    }

    /// Whether this surface has passed `adopt`/`cast_as` for `spec`.
    pub fn has_adopted(&self, spec: &str) -> bool {
        self.adopted.contains(spec)
    }

    pub fn runtime_checks_enabled(&self) -> bool {
        self.runtime_checks_enabled
    }

    pub fn arity_checks_skipped(&self) -> bool {
        self.arity_checks_skipped
    }

    pub fn is_open_for_composition(&self) -> bool {
        self.open_for_composition
    }

    /// Call a public capability. The surface itself is passed to the
    /// implementation so capabilities can self-send via
    /// [`invoke_local`](Surface::invoke_local).
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ContractError> {
        match self.capabilities.get(name) {
            Some(cap) if cap.visibility == Visibility::Public => self.call(name, cap, args),
            // Private capabilities are not externally callable; the surface
            // is opaque, so the caller sees the same error as for a missing
            // name.
            _ => Err(ContractError::UnknownCapability {
                target: self.name.clone(),
                name: name.to_string(),
            }),
        }
    }

    /// Call a capability at any visibility. For self-sends from inside
    /// capability implementations (e.g. an adapter reaching its private
    /// binding); not part of the external surface.
    pub fn invoke_local(&self, name: &str, args: &[Value]) -> Result<Value, ContractError> {
        match self.capabilities.get(name) {
            Some(cap) => self.call(name, cap, args),
            None => Err(ContractError::UnknownCapability {
                target: self.name.clone(),
                name: name.to_string(),
            }),
        }
    }

    fn call(&self, name: &str, cap: &Capability, args: &[Value]) -> Result<Value, ContractError> {
        if !self.arity_checks_skipped && args.len() != cap.arity {
            return Err(ContractError::ArityMismatch {
                name: name.to_string(),
                actual: args.len(),
                expected: cap.arity,
            });
        }
        (cap.func)(self, args)
    }

    /// Swap a capability's implementation in place, preserving its arity,
    /// visibility, and origin. Used by the verifier to install
    /// runtime-checked wrappers.
    pub fn replace(&mut self, name: &str, func: CapabilityFn) -> Result<(), ContractError> {
        match self.capabilities.get_mut(name) {
            Some(cap) => {
                cap.func = func;
                Ok(())
            }
            None => Err(ContractError::UnknownCapability {
                target: self.name.clone(),
                name: name.to_string(),
            }),
        }
    }

    /// Derive a copy that composition is allowed to merge traits into.
    /// Ordinary surfaces reject composition; the explicit step prevents
    /// accidental behavior injection.
    pub fn open_for_composition(&self) -> Surface {
        let mut derived = self.clone();
        derived.open_for_composition = true;
        derived
    }

    /// Freeze this surface for sharing as a [`Value::Object`]. Verification
    /// and composition mutate surfaces, so build to completion first.
    pub fn freeze(self) -> Arc<Surface> {
        Arc::new(self)
    }

    pub(crate) fn set_runtime_checks_enabled(&mut self, enabled: bool) {
        self.runtime_checks_enabled = enabled;
    }

    pub(crate) fn record_adoption(&mut self, spec: &str) {
        self.adopted.insert(spec.to_string());
    }

    pub(crate) fn insert_capability(&mut self, name: String, cap: Capability) {
        self.capabilities.insert(name, cap);
    }
}

/// Builder for [`Surface`]. Capabilities registered here carry
/// `Origin::Own` and win conflicts against later-composed traits.
pub struct SurfaceBuilder {
    surface: Surface,
}

impl SurfaceBuilder {
    /// Register an externally callable capability.
    pub fn public_fn<F>(mut self, name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&Surface, &[Value]) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        self.surface.capabilities.insert(
            name.into(),
            Capability::new(Arc::new(func), arity, Visibility::Public, Origin::Own),
        );
        self
    }

    /// Register a capability that exists but is not externally callable.
    pub fn private_fn<F>(mut self, name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&Surface, &[Value]) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        self.surface.capabilities.insert(
            name.into(),
            Capability::new(Arc::new(func), arity, Visibility::Private, Origin::Own),
        );
        self
    }

    /// Opt out of arity enforcement at call and verification time. Shells
    /// and mocks use this.
    pub fn skip_arity_checks(mut self, skip: bool) -> Self {
        self.surface.arity_checks_skipped = skip;
        self
    }

    /// Open the built surface for trait composition.
    pub fn composable(mut self) -> Self {
        self.surface.open_for_composition = true;
        self
    }

    pub fn build(self) -> Surface {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Surface {
        Surface::builder("Sample")
            .public_fn("greet", 1, |_, args| {
                Ok(Value::from(format!("hello {}", args[0])))
            })
            .private_fn("secret", 0, |_, _| Ok(Value::Int(42)))
            .public_fn("reveal", 0, |surface, _| surface.invoke_local("secret", &[]))
            .build()
    }

    #[test]
    fn public_and_all_capability_listings() {
        let surface = sample();
        assert_eq!(surface.public_capabilities(), vec!["greet", "reveal"]);
        assert_eq!(surface.all_capabilities(), vec!["greet", "reveal", "secret"]);
    }

    #[test]
    fn invoke_rejects_private_and_missing_names() {
        let surface = sample();
        assert!(matches!(
            surface.invoke("secret", &[]),
            Err(ContractError::UnknownCapability { .. })
        ));
        assert!(matches!(
            surface.invoke("nope", &[]),
            Err(ContractError::UnknownCapability { .. })
        ));
    }

    #[test]
    fn self_send_reaches_private_capability() {
        let surface = sample();
        assert_eq!(surface.invoke("reveal", &[]).unwrap(), Value::Int(42));
    }

    #[test]
    fn invoke_enforces_declared_arity() {
        let surface = sample();
        let err = surface.invoke("greet", &[]).unwrap_err();
        assert!(matches!(
            err,
            ContractError::ArityMismatch {
                actual: 0,
                expected: 1,
                ..
            }
        ));
    }

    #[test]
    fn skipped_arity_checks_accept_any_count() {
        let surface = Surface::builder("Loose")
            .public_fn("noop", 2, |_, _| Ok(Value::Nil))
            .skip_arity_checks(true)
            .build();
        assert_eq!(surface.invoke("noop", &[]).unwrap(), Value::Nil);
    }

    #[test]
    fn replace_preserves_metadata() {
        let mut surface = sample();
        surface
            .replace("greet", Arc::new(|_, _| Ok(Value::from("wrapped"))))
            .unwrap();
        assert_eq!(surface.arity_of("greet"), Some(1));
        assert_eq!(
            surface.invoke("greet", &[Value::Nil]).unwrap(),
            Value::from("wrapped")
        );
    }
}
