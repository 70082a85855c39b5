//! Error types for contract verification and composition.

use std::fmt;

use thiserror::Error;

use crate::spec::types::TypeDescriptor;
use crate::value::Value;

/// Where a mismatched value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSite {
    /// A positional argument of a wrapped call.
    Argument(usize),
    /// The return value of a wrapped call.
    Return,
    /// A standalone `check_type` / validator invocation.
    Standalone,
}

impl fmt::Display for ValueSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSite::Argument(i) => write!(f, "argument {i}"),
            ValueSite::Return => f.write_str("return value"),
            ValueSite::Standalone => f.write_str("value"),
        }
    }
}

/// Identity of the wrapped call a type mismatch occurred in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub spec: String,
    pub method: String,
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.spec, self.method)
    }
}

/// Errors raised by verification, composition, and instantiation.
///
/// All variants are contract violations: terminal and non-retryable.
#[derive(Debug, Error)]
pub enum ContractError {
    /// Target lacks a required public capability.
    #[error("{spec}: required public capability '{name}' is missing")]
    PublicCapabilityMissing { spec: String, name: String },

    /// Target lacks a required private capability.
    #[error("{spec}: required private capability '{name}' is missing")]
    PrivateCapabilityMissing { spec: String, name: String },

    /// Capability exists but declares the wrong parameter count.
    #[error("capability '{name}' has arity {actual}, should be {expected}")]
    ArityMismatch {
        name: String,
        actual: usize,
        expected: usize,
    },

    /// A runtime-checked value failed its descriptor.
    #[error("{}{site}: {actual} does not match {expected}", fmt_context(.context))]
    TypeMismatch {
        expected: TypeDescriptor,
        actual: Value,
        site: ValueSite,
        context: Option<CallContext>,
    },

    /// Attempted to merge a trait into a target not opened for composition.
    #[error("target '{target}' is not open for composition")]
    CompositionNotAllowed { target: String },

    /// Unresolved name collisions during composition.
    #[error("unresolved capability conflicts: {}", names.join(", "))]
    CapabilityConflict { names: Vec<String> },

    /// An alias in a composition plan names a capability the bundle lacks.
    #[error("trait '{bundle}' has no capability '{name}' to alias")]
    AliasTargetMissing { bundle: String, name: String },

    /// The instantiator binding name uses the reserved internal prefix.
    #[error("binding name must not start with '__': {name}")]
    InvalidBindingName { name: String },

    /// Malformed descriptor or spec construction.
    #[error("invalid interface spec: {message}")]
    SpecInvalid { message: String },

    /// Invoked a capability the target does not expose publicly.
    #[error("target '{target}' has no public capability '{name}'")]
    UnknownCapability { target: String, name: String },
}

fn fmt_context(context: &Option<CallContext>) -> String {
    match context {
        Some(ctx) => format!("{ctx}: "),
        None => String::new(),
    }
}
