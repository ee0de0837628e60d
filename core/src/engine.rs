//! Resource query engine.
//!
//! A [`Resource`] binds a store, a schema and one model, and exposes the
//! fetch/list/create/update/delete operations every controller is built on.
//! Validation (relation names, mass assignment) always happens before the
//! first store round-trip; store outcomes are normalized into
//! [`DomainError`]s afterwards.

use std::collections::{BTreeMap, BTreeSet};

use crate::descriptor::{Join, ModelDescriptor, ModelId, SaveKind, Schema};
use crate::entity::{Entity, Related};
use crate::error::{DomainError, Result, StoreError};
use crate::filters::Clause;
use crate::guard;
use crate::relations::{self, RelationRequest};
use crate::sql::{self, SQL};
use crate::store::{Row, Store};
use crate::value::{Attributes, EntityId, Value};

/// Column alias carrying the owner id of a many-to-many row.
const OWNER_ALIAS: &str = "__owner";

/// Operations on one model.
pub struct Resource<'a, S: Store + ?Sized> {
    store: &'a S,
    schema: &'a Schema,
    model: ModelId,
}

impl<'a, S: Store + ?Sized> Resource<'a, S> {
    pub fn new(store: &'a S, schema: &'a Schema, model: ModelId) -> Self {
        Self {
            store,
            schema,
            model,
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &'a ModelDescriptor {
        self.schema.model(self.model)
    }

    /// Fetches the first entity matching every filter.
    ///
    /// Zero matches is `NotFound`.
    pub fn find_one(&self, filters: &[Clause], relations: &RelationRequest) -> Result<Entity> {
        let descriptor = self.descriptor();
        crate::roster_trace_resource!("find_one", descriptor.table());
        relations::validate(descriptor, relations)?;

        let mut found = self.fetch(self.model, filters, Some(1))?;
        if found.is_empty() {
            return Err(DomainError::not_found(format!(
                "{} not found.",
                descriptor.name()
            )));
        }
        self.load(&mut found, relations)?;
        Ok(found.swap_remove(0))
    }

    /// [`find_one`](Self::find_one) on the identifier column.
    pub fn find_by_id(&self, id: EntityId, relations: &RelationRequest) -> Result<Entity> {
        let by_id = [Clause::eq(self.descriptor().id(), id)];
        self.find_one(&by_id, relations)
    }

    /// Lists every entity matching the filters, ordered by identifier.
    ///
    /// Zero matches is an empty list, never an error.
    pub fn find_all(&self, filters: &[Clause], relations: &RelationRequest) -> Result<Vec<Entity>> {
        let descriptor = self.descriptor();
        crate::roster_trace_resource!("find_all", descriptor.table());
        relations::validate(descriptor, relations)?;

        let mut found = self.fetch(self.model, filters, None)?;
        self.load(&mut found, relations)?;
        Ok(found)
    }

    /// Inserts a new entity from caller-supplied attributes.
    pub fn create(&self, attrs: Attributes) -> Result<Entity> {
        self.create_scoped(Attributes::new(), attrs)
    }

    /// Like [`create`](Self::create), with server-controlled attributes.
    ///
    /// Only `attrs` goes through the mass-assignment guard; `scope` (route
    /// parameters, the authenticated user) is merged in afterwards and wins on
    /// conflicting keys.
    pub fn create_scoped(&self, scope: Attributes, mut attrs: Attributes) -> Result<Entity> {
        let descriptor = self.descriptor();
        crate::roster_trace_resource!("create", descriptor.table());
        guard::authorize(descriptor, attrs.keys().map(String::as_str))?;

        attrs.extend(scope);
        apply_transforms(descriptor, &mut attrs, SaveKind::Create)?;

        let id = self
            .store
            .insert(&sql::insert(descriptor.table(), &attrs))?
            .ok_or_else(|| not_modified(descriptor))?;
        self.find_by_id(id, &RelationRequest::none())
    }

    /// Applies a partial update and returns the stored entity.
    ///
    /// Empty `attrs` writes nothing and returns the current entity. An unknown
    /// id is `NotModified`.
    pub fn update(&self, id: EntityId, mut attrs: Attributes) -> Result<Entity> {
        let descriptor = self.descriptor();
        crate::roster_trace_resource!("update", descriptor.table());
        guard::authorize(descriptor, attrs.keys().map(String::as_str))?;

        if attrs.is_empty() {
            return self
                .find_by_id(id, &RelationRequest::none())
                .map_err(|err| match err {
                    DomainError::NotFound(_) => not_modified(descriptor),
                    other => other,
                });
        }

        apply_transforms(descriptor, &mut attrs, SaveKind::Update)?;
        let statement = sql::update(descriptor.table(), &attrs, descriptor.id(), id.into());
        if self.store.execute(&statement)? == 0 {
            return Err(not_modified(descriptor));
        }
        self.find_by_id(id, &RelationRequest::none())
    }

    /// Removes one entity. Nothing removed is `NotFound`.
    pub fn delete(&self, id: EntityId) -> Result<()> {
        let descriptor = self.descriptor();
        crate::roster_trace_resource!("delete", descriptor.table());

        let statement = sql::delete(descriptor.table(), descriptor.id(), id.into());
        match self.store.execute(&statement)? {
            0 => Err(DomainError::not_found(format!(
                "{} not found.",
                descriptor.name()
            ))),
            _ => Ok(()),
        }
    }

    /// Eager-loads `relations` onto already fetched entities of this model.
    ///
    /// Issues one store query per relation regardless of how many entities
    /// are passed.
    pub fn load(&self, entities: &mut [Entity], relations: &RelationRequest) -> Result<()> {
        let descriptor = self.descriptor();
        relations::validate(descriptor, relations)?;
        if entities.is_empty() {
            return Ok(());
        }

        for name in relations.iter() {
            let Some(relation) = descriptor.relation(name) else {
                continue;
            };
            match &relation.join {
                Join::BelongsTo { foreign_key } => {
                    self.load_belongs_to(entities, name, relation.target, foreign_key)?
                }
                Join::HasMany { foreign_key } => {
                    self.load_has_many(entities, name, relation.target, foreign_key)?
                }
                Join::ManyToMany {
                    pivot,
                    local_key,
                    foreign_key,
                } => self.load_many_to_many(
                    entities,
                    name,
                    relation.target,
                    pivot,
                    local_key,
                    foreign_key,
                )?,
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Fetching
    // -------------------------------------------------------------------------

    fn fetch(&self, model: ModelId, filters: &[Clause], limit: Option<usize>) -> Result<Vec<Entity>> {
        let descriptor = self.schema.model(model);
        let table = descriptor.table();
        let kept = queryable(descriptor, filters);

        let mut statement = sql::select_all(table)
            .append(sql::where_clauses(table, kept))
            .append(sql::order_by(table, descriptor.id()));
        if let Some(n) = limit {
            statement.append_mut(sql::limit(n));
        }

        self.store
            .query(&statement)?
            .into_iter()
            .map(|row| into_entity(descriptor, model, row))
            .collect()
    }

    fn fetch_in(&self, model: ModelId, column: &str, keys: &BTreeSet<i64>) -> Result<Vec<Entity>> {
        let descriptor = self.schema.model(model);
        let table = descriptor.table();
        let statement = sql::select_all(table)
            .push("WHERE")
            .append(sql::in_list(table, column, keys.iter().copied().map(Value::from)))
            .append(sql::order_by(table, descriptor.id()));

        self.store
            .query(&statement)?
            .into_iter()
            .map(|row| into_entity(descriptor, model, row))
            .collect()
    }

    fn load_belongs_to(
        &self,
        entities: &mut [Entity],
        name: &str,
        target: ModelId,
        foreign_key: &str,
    ) -> Result<()> {
        let keys: BTreeSet<i64> = entities
            .iter()
            .filter_map(|e| e.get(foreign_key).and_then(Value::as_i64))
            .collect();

        let mut by_id = BTreeMap::new();
        if !keys.is_empty() {
            let target_id = self.schema.model(target).id();
            for related in self.fetch_in(target, target_id, &keys)? {
                by_id.insert(related.id().get(), related);
            }
        }

        for entity in entities.iter_mut() {
            let related = entity
                .get(foreign_key)
                .and_then(Value::as_i64)
                .and_then(|key| by_id.get(&key))
                .cloned()
                .map(Box::new);
            entity.set_related(name, Related::One(related));
        }
        Ok(())
    }

    fn load_has_many(
        &self,
        entities: &mut [Entity],
        name: &str,
        target: ModelId,
        foreign_key: &str,
    ) -> Result<()> {
        let owners = owner_ids(entities);
        let mut grouped: BTreeMap<i64, Vec<Entity>> = BTreeMap::new();
        for related in self.fetch_in(target, foreign_key, &owners)? {
            if let Some(owner) = related.get(foreign_key).and_then(Value::as_i64) {
                grouped.entry(owner).or_default().push(related);
            }
        }

        for entity in entities.iter_mut() {
            let related = grouped.get(&entity.id().get()).cloned().unwrap_or_default();
            entity.set_related(name, Related::Many(related));
        }
        Ok(())
    }

    fn load_many_to_many(
        &self,
        entities: &mut [Entity],
        name: &str,
        target: ModelId,
        pivot: &str,
        local_key: &str,
        foreign_key: &str,
    ) -> Result<()> {
        let descriptor = self.schema.model(target);
        let table = descriptor.table();
        let owners = owner_ids(entities);

        let statement = SQL::raw("SELECT")
            .append(SQL::ident(table))
            .push(".*")
            .push(",")
            .append(SQL::qualified(pivot, local_key))
            .push("AS")
            .append(SQL::ident(OWNER_ALIAS))
            .push("FROM")
            .append(SQL::ident(table))
            .push("INNER JOIN")
            .append(SQL::ident(pivot))
            .push("ON")
            .append(SQL::qualified(pivot, foreign_key))
            .push("=")
            .append(SQL::qualified(table, descriptor.id()))
            .push("WHERE")
            .append(sql::in_list(pivot, local_key, owners.iter().copied().map(Value::from)))
            .append(sql::order_by(table, descriptor.id()));

        let mut grouped: BTreeMap<i64, Vec<Entity>> = BTreeMap::new();
        for mut row in self.store.query(&statement)? {
            let owner = row
                .remove(OWNER_ALIAS)
                .and_then(|v| v.as_i64())
                .ok_or_else(|| {
                    DomainError::from(StoreError::Mapping(format!(
                        "missing `{OWNER_ALIAS}` column joining {pivot}"
                    )))
                })?;
            grouped
                .entry(owner)
                .or_default()
                .push(into_entity(descriptor, target, row)?);
        }

        for entity in entities.iter_mut() {
            let related = grouped.get(&entity.id().get()).cloned().unwrap_or_default();
            entity.set_related(name, Related::Many(related));
        }
        Ok(())
    }
}

/// Drops clauses on attributes the model does not allow filtering on.
fn queryable<'c>(descriptor: &ModelDescriptor, filters: &'c [Clause]) -> Vec<&'c Clause> {
    filters
        .iter()
        .filter(|clause| {
            let keep = descriptor.is_queryable(&clause.key);
            #[cfg(feature = "tracing")]
            {
                if !keep {
                    tracing::debug!(key = %clause.key, table = descriptor.table(), "roster.filter.dropped");
                }
            }
            keep
        })
        .collect()
}

fn owner_ids(entities: &[Entity]) -> BTreeSet<i64> {
    entities.iter().map(|e| e.id().get()).collect()
}

fn into_entity(descriptor: &ModelDescriptor, model: ModelId, row: Row) -> Result<Entity> {
    let id = row
        .get(descriptor.id())
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            DomainError::from(StoreError::Mapping(format!(
                "row of {} has no integer `{}` column",
                descriptor.table(),
                descriptor.id()
            )))
        })?;
    Ok(Entity::new(EntityId::new(id), model, row))
}

fn apply_transforms(descriptor: &ModelDescriptor, attrs: &mut Attributes, kind: SaveKind) -> Result<()> {
    descriptor
        .transforms()
        .iter()
        .try_for_each(|transform| transform(attrs, kind))
}

fn not_modified(descriptor: &ModelDescriptor) -> DomainError {
    DomainError::not_modified(format!("{} was not modified.", descriptor.name()))
}
