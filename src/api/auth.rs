//! Registration, login and bearer token authentication.

use roster_core::{
    Clause, DomainError, Entity, EntityId, RelationRequest, Result, Store, Value,
    attributes_from_json,
};
use serde_json::{Map, Value as JsonValue, json};

use super::{Api, Request, Response, respond, validate};
use crate::models::Role;

const SCHEME: &str = "Bearer ";

pub struct Auth<'a, S: Store> {
    pub(super) api: &'a Api<S>,
}

impl<S: Store> Auth<'_, S> {
    /// `POST /auth/register`
    pub fn register(&self, req: &Request) -> Response {
        respond(self.try_register(req))
    }

    /// `POST /auth/login`
    pub fn login(&self, req: &Request) -> Response {
        respond(self.try_login(req))
    }

    /// `GET /auth/me`: the authenticated user with its role and any
    /// requested relations.
    pub fn current_user(&self, req: &Request) -> Response {
        respond(self.try_current_user(req))
    }

    /// Resolves the bearer token of `req` to a verified user, with its role
    /// loaded.
    pub fn authenticate(&self, req: &Request) -> Result<Entity> {
        self.authenticate_with(req, &RelationRequest::none())
    }

    fn authenticate_with(&self, req: &Request, relations: &RelationRequest) -> Result<Entity> {
        let header = req
            .authorization
            .as_deref()
            .ok_or_else(|| DomainError::unauthorized("Authorization header not present."))?;
        let token = header.strip_prefix(SCHEME).ok_or_else(|| {
            DomainError::malformed(
                "Invalid authentication scheme. Required format: \"Authorization: Bearer {token}\".",
            )
        })?;

        let claims = self.api.issuer.verify(token.trim())?;
        let id: EntityId = claims
            .sub
            .parse()
            .map_err(|_| DomainError::unauthorized("Token subject is invalid."))?;

        let mut wanted = relations.clone();
        wanted.insert("role");
        let user = self
            .api
            .resource(self.api.models().user)
            .find_by_id(id, &wanted)
            .map_err(|err| match err {
                DomainError::NotFound(_) => DomainError::unauthorized("User no longer exists."),
                other => other,
            })?;

        ensure_verified(&user)?;
        Ok(user)
    }

    fn try_register(&self, req: &Request) -> Result<Response> {
        let body = req.body()?;
        validate::register(body)?;
        let users = self.api.resource(self.api.models().user);
        let email = body.get("email").and_then(JsonValue::as_str).unwrap_or_default();

        match users.find_one(&[Clause::eq("email", email)], &RelationRequest::none()) {
            Ok(_) => {
                return Err(DomainError::malformed(
                    "This email has already been registered.",
                ));
            }
            Err(DomainError::NotFound(_)) => {}
            Err(other) => return Err(other),
        }

        // A reused PID surfaces as a constraint violation.
        let user = users.create(attributes_from_json(body)?)?;
        ensure_verified(&user)?;
        let token = self.issue(&user)?;
        Ok(Response::created(json!({ "token": token })))
    }

    fn try_login(&self, req: &Request) -> Result<Response> {
        let body = req.body()?;
        validate::login(body)?;
        let email = body.get("email").and_then(JsonValue::as_str).unwrap_or_default();
        let password = body
            .get("password")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();

        let users = self.api.resource(self.api.models().user);
        let user = users
            .find_one(&[Clause::eq("email", email)], &RelationRequest::none())
            .map_err(|err| match err {
                DomainError::NotFound(_) => {
                    DomainError::malformed("An account with that email has not been registered.")
                }
                other => other,
            })?;

        let digest = user.get("password").and_then(Value::as_str).unwrap_or_default();
        if !self.api.hasher.compare(password, digest)? {
            return Err(DomainError::unauthorized(
                "The email and password entered don't match.",
            ));
        }

        ensure_verified(&user)?;
        let token = self.issue(&user)?;
        Ok(Response::ok(json!({ "token": token })))
    }

    fn try_current_user(&self, req: &Request) -> Result<Response> {
        let user = self.authenticate_with(req, &req.query.relations)?;
        Ok(Response::ok(self.api.present(&user)?))
    }

    fn issue(&self, user: &Entity) -> Result<String> {
        let mut claims = Map::new();
        if let Some(email) = user.get("email").and_then(Value::as_str) {
            claims.insert("email".into(), email.into());
        }
        let role = user
            .get("role_id")
            .and_then(|id| match id {
                Value::Integer(id) => Role::from_id(*id),
                _ => None,
            })
            .unwrap_or_default();
        claims.insert("role".into(), role.name().into());

        self.api
            .issuer
            .issue(&user.id().to_string(), claims, self.api.token_ttl)
    }
}

/// Unverified accounts may not authenticate.
fn ensure_verified(user: &Entity) -> Result<()> {
    match user.get("valid") {
        Some(Value::Integer(0)) => Err(DomainError::unauthorized(
            "This account has not been verified.",
        )),
        _ => Ok(()),
    }
}
