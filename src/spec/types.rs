//! Type descriptors
//!
//! A [`TypeDescriptor`] describes one allowed value shape: a concrete tag,
//! a union of alternatives, or a homogeneous sequence. Descriptors are plain
//! data, built once when an interface spec is declared.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::value::TypeTag;

/// One allowed value shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// The value's tag must match.
    Concrete(TypeTag),

    /// The value must match at least one member descriptor.
    OneOf(Vec<TypeDescriptor>),

    /// The value must be a sequence; only its first and last elements are
    /// checked against the element descriptor. Interior elements pass
    /// unchecked; specified behavior, do not widen to full-element
    /// validation.
    SequenceOf(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    pub fn concrete(tag: TypeTag) -> Self {
        TypeDescriptor::Concrete(tag)
    }

    pub fn one_of(members: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        TypeDescriptor::OneOf(members.into_iter().collect())
    }

    pub fn sequence_of(elem: TypeDescriptor) -> Self {
        TypeDescriptor::SequenceOf(Box::new(elem))
    }

    /// Structural well-formedness: a `OneOf` must have at least one member.
    /// Checked when a spec is built, not on every validation.
    pub fn check_well_formed(&self) -> Result<(), ContractError> {
        match self {
            TypeDescriptor::Concrete(_) => Ok(()),
            TypeDescriptor::OneOf(members) => {
                if members.is_empty() {
                    return Err(ContractError::SpecInvalid {
                        message: "OneOf descriptor has no members".to_string(),
                    });
                }
                for member in members {
                    member.check_well_formed()?;
                }
                Ok(())
            }
            TypeDescriptor::SequenceOf(elem) => elem.check_well_formed(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Concrete(tag) => write!(f, "{tag}"),
            TypeDescriptor::OneOf(members) => {
                f.write_str("one-of(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
            TypeDescriptor::SequenceOf(elem) => write!(f, "seq-of({elem})"),
        }
    }
}

/// A capability signature: positional input descriptors plus an optional
/// output descriptor. Absence of a signature on a requirement means
/// presence-only checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub inputs: Vec<TypeDescriptor>,
    pub output: Option<TypeDescriptor>,
}

impl Signature {
    pub fn new(
        inputs: impl IntoIterator<Item = TypeDescriptor>,
        output: Option<TypeDescriptor>,
    ) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            output,
        }
    }

    /// The arity this signature implies.
    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    pub fn check_well_formed(&self) -> Result<(), ContractError> {
        for input in &self.inputs {
            input.check_well_formed()?;
        }
        if let Some(output) = &self.output {
            output.check_well_formed()?;
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{input}")?;
        }
        f.write_str(")")?;
        if let Some(output) = &self.output {
            write!(f, " -> {output}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_one_of_is_rejected() {
        let desc = TypeDescriptor::one_of([]);
        assert!(desc.check_well_formed().is_err());
    }

    #[test]
    fn nested_one_of_is_checked_recursively() {
        let desc = TypeDescriptor::sequence_of(TypeDescriptor::one_of([]));
        assert!(desc.check_well_formed().is_err());

        let ok = TypeDescriptor::sequence_of(TypeDescriptor::one_of([
            TypeDescriptor::concrete(TypeTag::Int),
            TypeDescriptor::concrete(TypeTag::Nil),
        ]));
        assert!(ok.check_well_formed().is_ok());
    }

    #[test]
    fn display_is_readable() {
        let sig = Signature::new(
            [TypeDescriptor::sequence_of(TypeDescriptor::concrete(
                TypeTag::Int,
            ))],
            Some(TypeDescriptor::concrete(TypeTag::Int)),
        );
        assert_eq!(sig.to_string(), "(seq-of(int)) -> int");
    }
}
