//! Attendance record routes: `/records` and `/users/:user_id/events/:event_id`.

use roster_core::{
    Attributes, Clause, DomainError, Entity, EntityId, RelationRequest, Result, Store, Value,
    attributes_from_json,
};
use serde_json::json;

use super::acl::{self, Access};
use super::{Api, Request, Response, respond, validate};

pub struct Records<'a, S: Store> {
    pub(super) api: &'a Api<S>,
}

const WRITERS: [Access; 2] = [Access::Officer, Access::Admin];

impl<S: Store> Records<'_, S> {
    /// `GET /records`
    pub fn index(&self, req: &Request) -> Response {
        respond(self.try_index(req))
    }

    /// `GET /records/points`: total `points_earned` over the filtered records.
    pub fn points(&self, req: &Request) -> Response {
        respond(self.try_points(req))
    }

    /// `PUT /users/:user_id/events/:event_id`: signs a user in to an event.
    pub fn create(&self, req: &Request, user_id: &str, event_id: &str) -> Response {
        respond(self.try_create(req, user_id, event_id))
    }

    /// `PATCH /users/:user_id/events/:event_id`
    pub fn update(&self, req: &Request, user_id: &str, event_id: &str) -> Response {
        respond(self.try_update(req, user_id, event_id))
    }

    /// `DELETE /users/:user_id/events/:event_id`
    pub fn delete(&self, req: &Request, user_id: &str, event_id: &str) -> Response {
        respond(self.try_delete(req, user_id, event_id))
    }

    fn try_index(&self, req: &Request) -> Result<Response> {
        let records = self.api.resource(self.api.models().attendance_record);
        let found = records.find_all(&req.query.filters, &req.query.relations)?;
        Ok(Response::ok(self.api.present_all(&found)?))
    }

    fn try_points(&self, req: &Request) -> Result<Response> {
        let records = self.api.resource(self.api.models().attendance_record);
        let found = records.find_all(&req.query.filters, &RelationRequest::none())?;
        let points: f64 = found
            .iter()
            .filter_map(|record| record.get("points_earned").and_then(Value::as_f64))
            .sum();
        Ok(Response::ok(json!({ "points": points })))
    }

    fn try_create(&self, req: &Request, user_id: &str, event_id: &str) -> Result<Response> {
        let body = req.body()?;
        validate::points(body)?;
        let (user_id, event_id): (EntityId, EntityId) = (user_id.parse()?, event_id.parse()?);
        let current = self.api.auth().authenticate(req)?;
        acl::allow_any_of(&current, &WRITERS, None)?;
        self.require_participants(user_id, event_id)?;

        let mut scope = Attributes::new();
        scope.insert("user_id".into(), user_id.into());
        scope.insert("event_id".into(), event_id.into());

        let records = self.api.resource(self.api.models().attendance_record);
        let record = records.create_scoped(scope, attributes_from_json(body)?)?;
        Ok(Response::created(self.api.present(&record)?))
    }

    fn try_update(&self, req: &Request, user_id: &str, event_id: &str) -> Result<Response> {
        let body = req.body()?;
        validate::points(body)?;
        let (user_id, event_id): (EntityId, EntityId) = (user_id.parse()?, event_id.parse()?);
        let current = self.api.auth().authenticate(req)?;
        acl::allow_any_of(&current, &WRITERS, None)?;

        let existing = self.find(user_id, event_id)?;
        let records = self.api.resource(self.api.models().attendance_record);
        let record = records.update(existing.id(), attributes_from_json(body)?)?;
        Ok(Response::ok(self.api.present(&record)?))
    }

    fn try_delete(&self, req: &Request, user_id: &str, event_id: &str) -> Result<Response> {
        let (user_id, event_id): (EntityId, EntityId) = (user_id.parse()?, event_id.parse()?);
        let current = self.api.auth().authenticate(req)?;
        acl::allow_any_of(&current, &WRITERS, None)?;

        let existing = self.find(user_id, event_id)?;
        let records = self.api.resource(self.api.models().attendance_record);
        records.delete(existing.id())?;
        Ok(Response::no_content())
    }

    /// The record pairing a user with an event.
    fn find(&self, user_id: EntityId, event_id: EntityId) -> Result<Entity> {
        let records = self.api.resource(self.api.models().attendance_record);
        records.find_one(
            &[
                Clause::eq("user_id", user_id),
                Clause::eq("event_id", event_id),
            ],
            &RelationRequest::none(),
        )
    }

    /// Both ends of a new record must exist.
    fn require_participants(&self, user_id: EntityId, event_id: EntityId) -> Result<()> {
        let models = self.api.models();
        let none = RelationRequest::none();
        let missing = |message: &'static str| {
            move |err: DomainError| match err {
                DomainError::NotFound(_) => DomainError::malformed(message),
                other => other,
            }
        };

        self.api
            .resource(models.event)
            .find_by_id(event_id, &none)
            .map_err(missing("Can't register user; this event doesn't exist."))?;
        self.api
            .resource(models.user)
            .find_by_id(user_id, &none)
            .map_err(missing("Can't register user; this user doesn't exist."))?;
        Ok(())
    }
}
