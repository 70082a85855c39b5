//! Process-wide validation switch
//!
//! Runtime type checking is gated twice: once per adoption (the target
//! opted in) and once process-wide (this switch). The switch is seeded from
//! the `CONFORMAL_TYPECHECK` environment variable on first read and can be
//! toggled at runtime; the verifier reads it fresh at every adoption, never
//! caching it per spec, so toggling between test runs takes effect. When it
//! is off, the ad-hoc helpers below are no-ops, adoption installs no
//! wrappers, and validation errors of that class can never be raised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::{ContractError, ValueSite};
use crate::runtime::verify::verify_value;
use crate::spec::validation::check_value;
use crate::spec::{InterfaceSpec, TypeDescriptor};
use crate::value::Value;

pub const TYPECHECK_ENV: &str = "CONFORMAL_TYPECHECK";

fn switch() -> &'static AtomicBool {
    static SWITCH: OnceLock<AtomicBool> = OnceLock::new();
    SWITCH.get_or_init(|| {
        let seeded = std::env::var(TYPECHECK_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        AtomicBool::new(seeded)
    })
}

/// Whether runtime type checking is enabled process-wide. Defaults to off.
pub fn typecheck_enabled() -> bool {
    switch().load(Ordering::Relaxed)
}

/// Toggle runtime type checking for the whole process. Intended to be set
/// once at startup; changing it mid-run affects subsequent adoptions and
/// ad-hoc checks, not wrappers already installed.
pub fn set_typecheck_enabled(enabled: bool) {
    switch().store(enabled, Ordering::Relaxed);
}

/// Ad-hoc assertion that `value` matches `descriptor`. No-op when the
/// process-wide switch is off.
pub fn check_type(descriptor: &TypeDescriptor, value: &Value) -> Result<(), ContractError> {
    if !typecheck_enabled() {
        return Ok(());
    }
    check_value(descriptor, value, ValueSite::Standalone)
}

/// Ad-hoc assertion that each value structurally satisfies its spec. A
/// non-object value exposes no capabilities and fails the spec's first
/// resolved requirement. No-op when the process-wide switch is off.
pub fn check_interface(pairs: &[(&Arc<InterfaceSpec>, &Value)]) -> Result<(), ContractError> {
    if !typecheck_enabled() {
        return Ok(());
    }
    for (spec, value) in pairs {
        verify_value(spec, value)?;
    }
    Ok(())
}
