//! Recursive value validation against type descriptors.

use crate::error::{ContractError, ValueSite};
use crate::spec::types::TypeDescriptor;
use crate::value::Value;

/// Validate `value` against `descriptor`, reporting `site` on mismatch.
///
/// `OneOf` tries each member in order and swallows member mismatches while
/// alternatives remain; only exhaustion raises, naming the whole union.
/// `SequenceOf` checks the first and last elements only.
pub fn check_value(
    descriptor: &TypeDescriptor,
    value: &Value,
    site: ValueSite,
) -> Result<(), ContractError> {
    match descriptor {
        TypeDescriptor::Concrete(tag) => {
            if tag.matches(value.tag()) {
                Ok(())
            } else {
                Err(mismatch(descriptor, value, site))
            }
        }
        TypeDescriptor::OneOf(members) => {
            if members.iter().any(|member| matches_quietly(member, value)) {
                Ok(())
            } else {
                Err(mismatch(descriptor, value, site))
            }
        }
        TypeDescriptor::SequenceOf(elem) => {
            let items = value
                .as_seq()
                .ok_or_else(|| mismatch(descriptor, value, site))?;
            // First and last elements only; empty sequences pass vacuously,
            // singletons check the one element twice.
            if let Some(first) = items.first() {
                check_value(elem, first, site)?;
            }
            if let Some(last) = items.last() {
                check_value(elem, last, site)?;
            }
            Ok(())
        }
    }
}

/// Membership probe for `OneOf`: a mismatch is not an error here, just a
/// failed alternative.
fn matches_quietly(descriptor: &TypeDescriptor, value: &Value) -> bool {
    check_value(descriptor, value, ValueSite::Standalone).is_ok()
}

fn mismatch(descriptor: &TypeDescriptor, value: &Value, site: ValueSite) -> ContractError {
    ContractError::TypeMismatch {
        expected: descriptor.clone(),
        actual: value.clone(),
        site,
        context: None,
    }
}
