//! Descriptor-driven resource access.
//!
//! Translates request query strings into validated, parameterized store
//! queries and protects models from unsafe attribute writes.
//!
//! ```ignore
//! let query = RequestQuery::parse("embed=events&pointsMin=1");
//! let users = Resource::new(&store, &schema, models.user);
//! let found = users.find_all(&query.filters, &query.relations)?;
//! ```

pub mod auth;
pub mod descriptor;
pub mod engine;
pub mod entity;
pub mod error;
pub mod filters;
pub mod guard;
pub mod query;
pub mod relations;
pub mod response;
pub mod sql;
pub mod store;
mod tracing;
pub mod value;

pub use auth::{Claims, CredentialHasher, TokenIssuer};
pub use descriptor::{
    Join, ModelDescriptor, ModelId, Relation, SaveKind, Schema, SchemaBuilder, Transform,
    WritePolicy,
};
pub use engine::Resource;
pub use entity::{Entity, Presented, Related};
pub use error::{DomainError, ErrorKind, Result, SchemaError, StoreError};
pub use filters::{Clause, Comparator};
pub use query::RequestQuery;
pub use relations::RelationRequest;
pub use response::{ErrorBody, classify};
pub use sql::{SQL, SQLChunk};
pub use store::{Row, Store};
pub use value::{Attributes, EntityId, Value, attributes_from_json};
