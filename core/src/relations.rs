//! Relation selection (`?embed=events,role`) and validation.
//!
//! Selection only splits the parameter; it knows nothing about models so it
//! can run before the target model is known. Validation happens against a
//! descriptor right before the engine touches the store.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::descriptor::ModelDescriptor;
use crate::error::DomainError;

/// Names of relations requested for eager loading.
///
/// Deduplicated, first occurrence wins the position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationRequest(SmallVec<[CompactString; 4]>);

impl RelationRequest {
    #[inline]
    pub const fn none() -> Self {
        Self(SmallVec::new_const())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Adds a relation unless it is already requested.
    pub fn insert(&mut self, name: impl Into<CompactString>) {
        let name = name.into();
        if !self.contains(&name) {
            self.0.push(name);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(CompactString::as_str)
    }
}

impl<S: Into<CompactString>> FromIterator<S> for RelationRequest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut request = Self::none();
        for name in iter {
            request.insert(name);
        }
        request
    }
}

/// Splits a comma-separated relation list.
///
/// Absent or empty input requests nothing. Segments are trimmed and empty
/// segments (`a,,b`) are skipped.
pub fn select(raw: Option<&str>) -> RelationRequest {
    let Some(raw) = raw else {
        return RelationRequest::none();
    };

    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Rejects the request if any name is not a relation of `descriptor`.
pub fn validate(descriptor: &ModelDescriptor, requested: &RelationRequest) -> Result<(), DomainError> {
    match requested.iter().find(|name| descriptor.relation(name).is_none()) {
        Some(unknown) => Err(DomainError::malformed(format!(
            "Names of relations to load are invalid: `{unknown}` is not a relation of {}.",
            descriptor.name()
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Relation, SchemaBuilder};

    #[test]
    fn absent_and_empty_select_nothing() {
        assert!(select(None).is_empty());
        assert!(select(Some("")).is_empty());
    }

    #[test]
    fn splits_trims_and_deduplicates() {
        let request = select(Some("a, b,a"));
        assert_eq!(request.iter().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn skips_empty_segments() {
        let request = select(Some("events,, ,role"));
        assert_eq!(request.iter().collect::<Vec<_>>(), ["events", "role"]);
    }

    #[test]
    fn validation() {
        let mut builder = SchemaBuilder::new();
        let user = builder
            .declare(ModelDescriptor::new("User", "users"))
            .unwrap();
        let event = builder
            .declare(ModelDescriptor::new("Event", "events"))
            .unwrap();
        builder
            .relate(
                user,
                "events",
                Relation::many_to_many(event, "attendance_records", "user_id", "event_id"),
            )
            .unwrap();
        let schema = builder.finish();
        let users = schema.model(user);

        assert!(validate(users, &RelationRequest::none()).is_ok());
        assert!(validate(schema.model(event), &RelationRequest::none()).is_ok());
        assert!(validate(users, &select(Some("events"))).is_ok());

        let err = validate(users, &select(Some("events,unknown"))).unwrap_err();
        assert!(matches!(err, DomainError::Malformed(ref m) if m.contains("unknown")));
    }
}
