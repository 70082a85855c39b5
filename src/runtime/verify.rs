//! Conformance verification
//!
//! Checks a surface's capability registry against a resolved interface
//! spec: public presence, declared arity, private presence, in that order,
//! failing fast on the first violation. Adoption additionally records the
//! per-target runtime-check flag and, behind a double gate (process-wide
//! switch AND per-adoption opt-in), rewrites publicly required capabilities
//! that carry full signatures into wrappers validating every call.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::typecheck_enabled;
use crate::error::{CallContext, ContractError, ValueSite};
use crate::runtime::{CapabilityFn, Surface};
use crate::spec::validation::check_value;
use crate::spec::{InterfaceSpec, Requirement, Signature};
use crate::value::Value;

/// Options recorded at adoption time.
#[derive(Debug, Clone, Copy)]
pub struct AdoptOptions {
    /// The target opts into per-call argument/return validation. Wrapping
    /// still requires the process-wide switch to be on.
    pub runtime_checks: bool,
}

impl Default for AdoptOptions {
    /// Runtime checks are on unless the adopter turns them off; the
    /// process-wide switch still gates whether wrappers are installed.
    fn default() -> Self {
        Self {
            runtime_checks: true,
        }
    }
}

/// Read-only conformance check: every resolved public requirement must be
/// publicly visible with the declared arity, every resolved private
/// requirement must exist at some visibility. No wrappers are installed.
pub fn verify(surface: &Surface, spec: &InterfaceSpec) -> Result<(), ContractError> {
    let resolved = spec.resolve();

    for (name, requirement) in &resolved.public {
        check_public(surface, spec, name, requirement)?;
    }
    for name in resolved.private.keys() {
        if !surface.has(name) {
            return Err(ContractError::PrivateCapabilityMissing {
                spec: spec.name().to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

fn check_public(
    surface: &Surface,
    spec: &InterfaceSpec,
    name: &str,
    requirement: &Requirement,
) -> Result<(), ContractError> {
    if !surface.has_public(name) {
        return Err(ContractError::PublicCapabilityMissing {
            spec: spec.name().to_string(),
            name: name.to_string(),
        });
    }
    // Arity gate runs before any type concern.
    if let (Some(expected), Some(actual)) = (requirement.arity(), surface.arity_of(name)) {
        if !surface.arity_checks_skipped() && actual != expected {
            return Err(ContractError::ArityMismatch {
                name: name.to_string(),
                actual,
                expected,
            });
        }
    }
    Ok(())
}

/// Verify `surface` against `spec` and record the adoption on it.
///
/// When the process-wide switch is on (read now, not cached) and the target
/// opted in, every publicly required capability carrying a full signature
/// is replaced with a runtime-checked wrapper. Private requirements are
/// never wrapped.
pub fn adopt(
    surface: &mut Surface,
    spec: &InterfaceSpec,
    opts: AdoptOptions,
) -> Result<(), ContractError> {
    verify(surface, spec)?;
    surface.set_runtime_checks_enabled(opts.runtime_checks);
    surface.record_adoption(spec.name());
    debug!(surface = surface.name(), spec = spec.name(), "adopted interface");

    if typecheck_enabled() && surface.runtime_checks_enabled() {
        install_wrappers(surface, spec)?;
    }
    Ok(())
}

/// Non-mutating variant of [`adopt`]: returns a derived surface carrying
/// the adoption, leaving the original untouched. For adopting an interface
/// onto a target that did not explicitly request it.
pub fn cast_as(
    surface: &Surface,
    spec: &InterfaceSpec,
    opts: AdoptOptions,
) -> Result<Surface, ContractError> {
    let mut derived = surface.clone();
    adopt(&mut derived, spec, opts)?;
    Ok(derived)
}

fn install_wrappers(surface: &mut Surface, spec: &InterfaceSpec) -> Result<(), ContractError> {
    let resolved = spec.resolve();
    for (name, requirement) in &resolved.public {
        let Some(signature) = requirement.signature() else {
            continue;
        };
        let Some(original) = surface.capability(name).map(|cap| cap.func()) else {
            continue;
        };
        let wrapper = checked_wrapper(
            original,
            signature.clone(),
            CallContext {
                spec: spec.name().to_string(),
                method: name.clone(),
            },
        );
        surface.replace(name, wrapper)?;
        trace!(
            surface = surface.name(),
            capability = name.as_str(),
            "installed runtime-checked wrapper"
        );
    }
    Ok(())
}

/// Wrap the original implementation as a captured closure that validates
/// every argument positionally, invokes the original, then validates the
/// result. Mismatches carry the spec/method identity and the value site.
fn checked_wrapper(
    original: CapabilityFn,
    signature: Signature,
    context: CallContext,
) -> CapabilityFn {
    Arc::new(move |surface: &Surface, args: &[Value]| {
        if args.len() != signature.inputs.len() {
            return Err(ContractError::ArityMismatch {
                name: context.method.clone(),
                actual: args.len(),
                expected: signature.inputs.len(),
            });
        }
        for (i, (descriptor, arg)) in signature.inputs.iter().zip(args).enumerate() {
            check_value(descriptor, arg, ValueSite::Argument(i))
                .map_err(|err| attach_context(err, &context))?;
        }
        let result = original(surface, args)?;
        if let Some(descriptor) = &signature.output {
            check_value(descriptor, &result, ValueSite::Return)
                .map_err(|err| attach_context(err, &context))?;
        }
        Ok(result)
    })
}

fn attach_context(err: ContractError, context: &CallContext) -> ContractError {
    match err {
        ContractError::TypeMismatch {
            expected,
            actual,
            site,
            ..
        } => ContractError::TypeMismatch {
            expected,
            actual,
            site,
            context: Some(context.clone()),
        },
        other => other,
    }
}

/// Structural verification of a runtime value against a spec, independent
/// of the process-wide switch. A non-object value exposes no capabilities
/// and fails the spec's first resolved requirement. The instantiator gate
/// and `check_interface` use this.
pub fn verify_value(spec: &InterfaceSpec, value: &Value) -> Result<(), ContractError> {
    match value.as_object() {
        Some(surface) => verify(surface, spec),
        None => {
            let resolved = spec.resolve();
            if let Some(name) = resolved.public.keys().next() {
                return Err(ContractError::PublicCapabilityMissing {
                    spec: spec.name().to_string(),
                    name: name.clone(),
                });
            }
            if let Some(name) = resolved.private.keys().next() {
                return Err(ContractError::PrivateCapabilityMissing {
                    spec: spec.name().to_string(),
                    name: name.clone(),
                });
            }
            Ok(())
        }
    }
}

/// Build a no-op stub satisfying `spec`: every resolved public requirement
/// (minus excluded names) becomes a capability returning `Value::Nil`, with
/// arity checks skipped and runtime checks disabled. For mocking.
pub fn shell(spec: &InterfaceSpec) -> Surface {
    let resolved = spec.resolve();
    let mut builder = Surface::builder(format!("{}Shell", spec.name())).skip_arity_checks(true);
    for (name, requirement) in &resolved.public {
        let arity = requirement.arity().unwrap_or(0);
        builder = builder.public_fn(name.clone(), arity, |_, _| Ok(Value::Nil));
    }
    for (name, requirement) in &resolved.private {
        let arity = requirement.arity().unwrap_or(0);
        builder = builder.private_fn(name.clone(), arity, |_, _| Ok(Value::Nil));
    }
    builder.build()
}
