//! Controller layer: thin adapters from request values to engine operations.
//!
//! Every action takes a [`Request`] plus its route parameters and returns a
//! [`Response`]. Failures of any kind go through [`classify`] exactly once,
//! in [`respond`].
//!
//! ```ignore
//! let api = Api::new(store, hasher, issuer, config.token_ttl())?;
//! let response = api.events().index(&Request::query("embed=type&pointsMin=1"));
//! ```

pub mod acl;
mod announcements;
mod auth;
mod event_types;
mod events;
mod records;
mod users;
pub mod validate;

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use roster_core::{
    CredentialHasher, DomainError, Entity, ModelId, RequestQuery, Resource, Schema, SchemaError,
    Store, TokenIssuer, classify,
};
use serde_json::{Map, Value as JsonValue, json};

use crate::models::{self, Models};

pub use announcements::Announcements;
pub use auth::Auth;
pub use event_types::EventTypes;
pub use events::Events;
pub use records::Records;
pub use users::Users;

// ============================================================================
// Request / Response
// ============================================================================

/// Values an HTTP layer extracts from an inbound request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub query: RequestQuery,
    /// Parsed JSON body; [`Request::body()`] insists on an object
    pub body: JsonValue,
    /// Raw `Authorization` header
    pub authorization: Option<String>,
}

impl Request {
    /// Request with only a query string.
    pub fn query(raw: &str) -> Self {
        Self {
            query: RequestQuery::parse(raw),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = body;
        self
    }

    /// The body as an object. A missing body reads as an empty one.
    pub fn body(&self) -> Result<&Map<String, JsonValue>, DomainError> {
        static EMPTY: LazyLock<Map<String, JsonValue>> = LazyLock::new(Map::new);
        match &self.body {
            JsonValue::Object(map) => Ok(map),
            JsonValue::Null => Ok(&*EMPTY),
            _ => Err(DomainError::malformed("Request body must be a JSON object.")),
        }
    }

    /// Sets `Authorization: Bearer {token}`.
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {token}"));
        self
    }

    pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }
}

/// Status and JSON body of an outbound response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: JsonValue,
}

impl Response {
    pub fn ok(body: JsonValue) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: JsonValue) -> Self {
        Self { status: 201, body }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: JsonValue::Null,
        }
    }

    pub fn error(error: &DomainError) -> Self {
        let (status, body) = classify(error);
        Self {
            status,
            body: json!({ "message": body.message }),
        }
    }
}

/// Collapses an action outcome into a response.
pub(crate) fn respond(result: Result<Response, DomainError>) -> Response {
    result.unwrap_or_else(|error| Response::error(&error))
}

// ============================================================================
// Api
// ============================================================================

/// Shared, read-only application state.
pub struct Api<S: Store> {
    store: S,
    schema: Schema,
    models: Models,
    hasher: Arc<dyn CredentialHasher>,
    issuer: Arc<dyn TokenIssuer>,
    token_ttl: Duration,
}

impl<S: Store> Api<S> {
    pub fn new(
        store: S,
        hasher: Arc<dyn CredentialHasher>,
        issuer: Arc<dyn TokenIssuer>,
        token_ttl: Duration,
    ) -> Result<Self, SchemaError> {
        let (schema, models) = models::build(Arc::clone(&hasher))?;
        Ok(Self {
            store,
            schema,
            models,
            hasher,
            issuer,
            token_ttl,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn models(&self) -> &Models {
        &self.models
    }

    pub fn resource(&self, model: ModelId) -> Resource<'_, S> {
        Resource::new(&self.store, &self.schema, model)
    }

    pub fn auth(&self) -> Auth<'_, S> {
        Auth { api: self }
    }

    pub fn users(&self) -> Users<'_, S> {
        Users { api: self }
    }

    pub fn events(&self) -> Events<'_, S> {
        Events { api: self }
    }

    pub fn event_types(&self) -> EventTypes<'_, S> {
        EventTypes { api: self }
    }

    pub fn records(&self) -> Records<'_, S> {
        Records { api: self }
    }

    pub fn announcements(&self) -> Announcements<'_, S> {
        Announcements { api: self }
    }

    pub(crate) fn present(&self, entity: &Entity) -> Result<JsonValue, DomainError> {
        entity.present(&self.schema).to_json()
    }

    pub(crate) fn present_all(&self, entities: &[Entity]) -> Result<JsonValue, DomainError> {
        entities
            .iter()
            .map(|e| self.present(e))
            .collect::<Result<_, _>>()
            .map(JsonValue::Array)
    }
}
