//! Mass-assignment guard.

use crate::descriptor::{ModelDescriptor, WritePolicy};
use crate::error::DomainError;

/// Checks that every attribute in `keys` may be written under the descriptor's
/// write policy.
///
/// A descriptor without a policy is fully open. On failure the error names
/// every offending attribute, in the order given.
pub fn authorize<'k, I>(descriptor: &ModelDescriptor, keys: I) -> Result<(), DomainError>
where
    I: IntoIterator<Item = &'k str>,
{
    let offending: Vec<&str> = match descriptor.policy() {
        WritePolicy::Open => return Ok(()),
        WritePolicy::Fillable(allowed) => keys
            .into_iter()
            .filter(|key| !allowed.iter().any(|a| a == key))
            .collect(),
        WritePolicy::Guarded(denied) => keys
            .into_iter()
            .filter(|key| denied.iter().any(|d| d == key))
            .collect(),
    };

    if offending.is_empty() {
        return Ok(());
    }
    Err(DomainError::forbidden(format!(
        "Cannot write [{}] on {}.",
        offending.join(", "),
        descriptor.name()
    )))
}
