//! Static per-model metadata and the schema that wires models together.
//!
//! Descriptors are declared first and related second:
//!
//! ```ignore
//! let mut builder = SchemaBuilder::new();
//! let user = builder.declare(ModelDescriptor::new("User", "users").guarded(["id", "is_admin"]))?;
//! let event = builder.declare(ModelDescriptor::new("Event", "events"))?;
//! builder.relate(user, "events", Relation::many_to_many(event, "attendance_records", "user_id", "event_id"))?;
//! let schema = builder.finish();
//! ```
//!
//! Relations point at their target through a [`ModelId`] handed out by the
//! builder, so models may reference each other in cycles without any
//! name-based lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;

use crate::error::{DomainError, SchemaError};
use crate::value::Attributes;

/// Handle to a descriptor inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(usize);

impl ModelId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Which save path a [`Transform`] is running for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Create,
    Update,
}

/// Pre-save hook, run in declaration order after the mass-assignment guard.
pub type Transform = Arc<dyn Fn(&mut Attributes, SaveKind) -> Result<(), DomainError> + Send + Sync>;

/// Write policy view of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy<'a> {
    /// Only these attributes may be written
    Fillable(&'a [CompactString]),
    /// These attributes may never be written
    Guarded(&'a [CompactString]),
    /// No policy declared; every attribute is writable
    Open,
}

/// How a relation is joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Join {
    /// `owner.foreign_key = target.id`
    BelongsTo { foreign_key: CompactString },
    /// `target.foreign_key = owner.id`
    HasMany { foreign_key: CompactString },
    /// `pivot.local_key = owner.id AND pivot.foreign_key = target.id`
    ManyToMany {
        pivot: CompactString,
        local_key: CompactString,
        foreign_key: CompactString,
    },
}

/// A named relation of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub target: ModelId,
    pub join: Join,
}

impl Relation {
    pub fn belongs_to(target: ModelId, foreign_key: impl Into<CompactString>) -> Self {
        Self {
            target,
            join: Join::BelongsTo {
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn has_many(target: ModelId, foreign_key: impl Into<CompactString>) -> Self {
        Self {
            target,
            join: Join::HasMany {
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn many_to_many(
        target: ModelId,
        pivot: impl Into<CompactString>,
        local_key: impl Into<CompactString>,
        foreign_key: impl Into<CompactString>,
    ) -> Self {
        Self {
            target,
            join: Join::ManyToMany {
                pivot: pivot.into(),
                local_key: local_key.into(),
                foreign_key: foreign_key.into(),
            },
        }
    }
}

/// Static metadata of one entity type.
#[derive(Clone)]
pub struct ModelDescriptor {
    name: CompactString,
    table: CompactString,
    id_column: CompactString,
    hidden: Vec<CompactString>,
    fillable: Option<Vec<CompactString>>,
    guarded: Option<Vec<CompactString>>,
    queryable: Vec<CompactString>,
    relations: BTreeMap<CompactString, Relation>,
    transforms: Vec<Transform>,
}

fn names<I, S>(items: I) -> Vec<CompactString>
where
    I: IntoIterator<Item = S>,
    S: Into<CompactString>,
{
    items.into_iter().map(Into::into).collect()
}

impl ModelDescriptor {
    /// `name` is the human-readable model name used in messages, `table` the
    /// backing table. The identifier column defaults to `id`.
    pub fn new(name: impl Into<CompactString>, table: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            id_column: CompactString::const_new("id"),
            hidden: Vec::new(),
            fillable: None,
            guarded: None,
            queryable: Vec::new(),
            relations: BTreeMap::new(),
            transforms: Vec::new(),
        }
    }

    pub fn id_column(mut self, column: impl Into<CompactString>) -> Self {
        self.id_column = column.into();
        self
    }

    /// Attributes omitted when the entity is presented.
    pub fn hidden<I: IntoIterator<Item = S>, S: Into<CompactString>>(mut self, attrs: I) -> Self {
        self.hidden = names(attrs);
        self
    }

    /// Allow-list of writable attributes.
    pub fn fillable<I: IntoIterator<Item = S>, S: Into<CompactString>>(mut self, attrs: I) -> Self {
        self.fillable = Some(names(attrs));
        self
    }

    /// Deny-list of writable attributes.
    pub fn guarded<I: IntoIterator<Item = S>, S: Into<CompactString>>(mut self, attrs: I) -> Self {
        self.guarded = Some(names(attrs));
        self
    }

    /// Attributes usable as filters, besides the identifier.
    pub fn queryable<I: IntoIterator<Item = S>, S: Into<CompactString>>(mut self, attrs: I) -> Self {
        self.queryable = names(attrs);
        self
    }

    /// Appends a pre-save transform.
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Attributes, SaveKind) -> Result<(), DomainError> + Send + Sync + 'static,
    {
        self.transforms.push(Arc::new(f));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id_column
    }

    pub fn is_hidden(&self, attr: &str) -> bool {
        self.hidden.iter().any(|h| h == attr)
    }

    pub fn policy(&self) -> WritePolicy<'_> {
        match (&self.fillable, &self.guarded) {
            (Some(fillable), _) => WritePolicy::Fillable(fillable),
            (None, Some(guarded)) => WritePolicy::Guarded(guarded),
            (None, None) => WritePolicy::Open,
        }
    }

    /// Whether `key` may be used in a filter clause.
    pub fn is_queryable(&self, key: &str) -> bool {
        self.id_column == key || self.queryable.iter().any(|q| q == key)
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &Relation)> {
        self.relations.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn transforms(&self) -> &[Transform] {
        &self.transforms
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("id_column", &self.id_column)
            .field("hidden", &self.hidden)
            .field("fillable", &self.fillable)
            .field("guarded", &self.guarded)
            .field("queryable", &self.queryable)
            .field("relations", &self.relations)
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

/// Immutable set of descriptors, shared read-only by every request.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: Vec<ModelDescriptor>,
}

impl Schema {
    /// Returns the descriptor for `id`.
    ///
    /// # Panics
    ///
    /// If `id` was handed out by a different schema's builder.
    pub fn model(&self, id: ModelId) -> &ModelDescriptor {
        &self.models[id.0]
    }

    pub fn get(&self, id: ModelId) -> Option<&ModelDescriptor> {
        self.models.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Two-phase schema construction: declare every model, then relate them.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    models: Vec<ModelDescriptor>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor. A descriptor may declare `fillable` or
    /// `guarded`, never both.
    pub fn declare(&mut self, descriptor: ModelDescriptor) -> Result<ModelId, SchemaError> {
        if descriptor.fillable.is_some() && descriptor.guarded.is_some() {
            return Err(SchemaError::ConflictingPolicy(descriptor.name));
        }
        self.models.push(descriptor);
        Ok(ModelId(self.models.len() - 1))
    }

    /// Adds relation `name` to `owner`.
    pub fn relate(
        &mut self,
        owner: ModelId,
        name: impl Into<CompactString>,
        relation: Relation,
    ) -> Result<(), SchemaError> {
        if relation.target.0 >= self.models.len() {
            return Err(SchemaError::UnknownModel(relation.target.0));
        }
        let model = self
            .models
            .get_mut(owner.0)
            .ok_or(SchemaError::UnknownModel(owner.0))?;

        let name = name.into();
        if model.relations.contains_key(&name) {
            return Err(SchemaError::DuplicateRelation {
                model: model.name.clone(),
                relation: name,
            });
        }
        model.relations.insert(name, relation);
        Ok(())
    }

    pub fn finish(self) -> Schema {
        Schema {
            models: self.models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_fillable_and_guarded_together() {
        let mut builder = SchemaBuilder::new();
        let err = builder
            .declare(
                ModelDescriptor::new("User", "users")
                    .fillable(["first_name"])
                    .guarded(["id"]),
            )
            .unwrap_err();
        assert_eq!(err, SchemaError::ConflictingPolicy("User".into()));
    }

    #[test]
    fn relations_may_form_cycles() {
        let mut builder = SchemaBuilder::new();
        let user = builder.declare(ModelDescriptor::new("User", "users")).unwrap();
        let event = builder.declare(ModelDescriptor::new("Event", "events")).unwrap();
        builder
            .relate(user, "events", Relation::many_to_many(event, "attendance_records", "user_id", "event_id"))
            .unwrap();
        builder
            .relate(event, "users", Relation::many_to_many(user, "attendance_records", "event_id", "user_id"))
            .unwrap();
        let schema = builder.finish();

        assert_eq!(schema.model(user).relation("events").unwrap().target, event);
        assert_eq!(schema.model(event).relation("users").unwrap().target, user);
    }

    #[test]
    fn rejects_duplicate_relation() {
        let mut builder = SchemaBuilder::new();
        let role = builder.declare(ModelDescriptor::new("Role", "roles")).unwrap();
        let user = builder.declare(ModelDescriptor::new("User", "users")).unwrap();
        builder.relate(user, "role", Relation::belongs_to(role, "role_id")).unwrap();
        let err = builder
            .relate(user, "role", Relation::belongs_to(role, "role_id"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateRelation { .. }));
    }

    #[test]
    fn identifier_is_always_queryable() {
        let descriptor = ModelDescriptor::new("Event", "events").queryable(["points"]);
        assert!(descriptor.is_queryable("id"));
        assert!(descriptor.is_queryable("points"));
        assert!(!descriptor.is_queryable("password"));
    }

    #[test]
    fn policy_view() {
        assert_eq!(ModelDescriptor::new("A", "a").policy(), WritePolicy::Open);
        let fillable = ModelDescriptor::new("A", "a").fillable(["x"]);
        assert!(matches!(fillable.policy(), WritePolicy::Fillable(f) if f == ["x"]));
    }
}
