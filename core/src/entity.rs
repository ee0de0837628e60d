//! Fetched entities and their client-facing presentation.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::descriptor::{ModelId, Schema};
use crate::value::{Attributes, EntityId, Value};

/// Related entities loaded for one relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// belongs-to; `None` when the foreign key is null or dangling
    One(Option<Box<Entity>>),
    /// has-many and many-to-many
    Many(Vec<Entity>),
}

impl Related {
    pub fn as_one(&self) -> Option<&Entity> {
        match self {
            Related::One(entity) => entity.as_deref(),
            Related::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> &[Entity] {
        match self {
            Related::Many(entities) => entities,
            Related::One(_) => &[],
        }
    }
}

/// One row of a model, plus any eagerly loaded relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    model: ModelId,
    attributes: Attributes,
    relations: BTreeMap<CompactString, Related>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, model: ModelId, attributes: Attributes) -> Self {
        Self {
            id,
            model,
            attributes,
            relations: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attribute value, `None` if the column is absent.
    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.attributes.get(attr)
    }

    pub fn related(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    pub(crate) fn set_related(&mut self, name: &str, related: Related) {
        self.relations.insert(name.into(), related);
    }

    /// Serializable view: attributes minus the descriptor's hidden set, then
    /// every loaded relation under its name.
    pub fn present<'a>(&'a self, schema: &'a Schema) -> Presented<'a> {
        Presented {
            entity: self,
            schema,
        }
    }
}

/// See [`Entity::present`].
#[derive(Debug, Clone, Copy)]
pub struct Presented<'a> {
    entity: &'a Entity,
    schema: &'a Schema,
}

impl Presented<'_> {
    /// Renders into a JSON value.
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for Presented<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let descriptor = self.schema.model(self.entity.model);
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in &self.entity.attributes {
            if !descriptor.is_hidden(name) {
                map.serialize_entry(name, value)?;
            }
        }
        for (name, related) in &self.entity.relations {
            match related {
                Related::One(Some(entity)) => {
                    map.serialize_entry(name.as_str(), &entity.present(self.schema))?
                }
                Related::One(None) => map.serialize_entry(name.as_str(), &())?,
                Related::Many(entities) => {
                    let presented: Vec<_> =
                        entities.iter().map(|e| e.present(self.schema)).collect();
                    map.serialize_entry(name.as_str(), &presented)?
                }
            }
        }
        map.end()
    }
}
