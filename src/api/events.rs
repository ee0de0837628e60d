//! `/events` routes.

use roster_core::{
    Clause, DomainError, EntityId, RelationRequest, Result, Store, Value, attributes_from_json,
    relations,
};

use super::acl::{self, Access};
use super::{Api, Request, Response, respond, validate};
use crate::models;

pub struct Events<'a, S: Store> {
    pub(super) api: &'a Api<S>,
}

const WRITERS: [Access; 2] = [Access::Officer, Access::Admin];

impl<S: Store> Events<'_, S> {
    /// `GET /events`
    pub fn index(&self, req: &Request) -> Response {
        respond(self.try_index(req))
    }

    /// `GET /events/:id`
    pub fn show(&self, req: &Request, id: &str) -> Response {
        respond(self.try_show(req, id))
    }

    /// `POST /events`
    pub fn create(&self, req: &Request) -> Response {
        respond(self.try_create(req))
    }

    /// `PATCH /events/:id`
    pub fn update(&self, req: &Request, id: &str) -> Response {
        respond(self.try_update(req, id))
    }

    /// `DELETE /events/:id`
    pub fn delete(&self, req: &Request, id: &str) -> Response {
        respond(self.try_delete(req, id))
    }

    /// `GET /events/:id/users`: attendees of the event.
    pub fn attendees(&self, req: &Request, id: &str) -> Response {
        respond(self.try_attendees(req, id))
    }

    fn try_index(&self, req: &Request) -> Result<Response> {
        let events = self.api.resource(self.api.models().event);
        let filters = canonical_times(&req.query.filters);
        let found = events.find_all(&filters, &req.query.relations)?;
        Ok(Response::ok(self.api.present_all(&found)?))
    }

    fn try_show(&self, req: &Request, id: &str) -> Result<Response> {
        let id: EntityId = id.parse()?;
        let events = self.api.resource(self.api.models().event);
        let event = events.find_by_id(id, &req.query.relations)?;
        Ok(Response::ok(self.api.present(&event)?))
    }

    fn try_create(&self, req: &Request) -> Result<Response> {
        let body = req.body()?;
        validate::event_create(body)?;
        let current = self.api.auth().authenticate(req)?;
        acl::allow_any_of(&current, &WRITERS, None)?;

        let events = self.api.resource(self.api.models().event);
        let event = events.create(attributes_from_json(body)?)?;
        Ok(Response::created(self.api.present(&event)?))
    }

    fn try_update(&self, req: &Request, id: &str) -> Result<Response> {
        let body = req.body()?;
        validate::event_update(body)?;
        let id: EntityId = id.parse()?;
        let current = self.api.auth().authenticate(req)?;
        acl::allow_any_of(&current, &WRITERS, None)?;

        let events = self.api.resource(self.api.models().event);
        let event = events.update(id, attributes_from_json(body)?)?;
        Ok(Response::ok(self.api.present(&event)?))
    }

    fn try_delete(&self, req: &Request, id: &str) -> Result<Response> {
        let id: EntityId = id.parse()?;
        let current = self.api.auth().authenticate(req)?;
        acl::allow_any_of(&current, &WRITERS, None)?;

        self.api.resource(self.api.models().event).delete(id)?;
        Ok(Response::no_content())
    }

    fn try_attendees(&self, req: &Request, id: &str) -> Result<Response> {
        let id: EntityId = id.parse()?;
        let models = self.api.models();
        let users = self.api.resource(models.user);
        relations::validate(users.descriptor(), &req.query.relations)?;

        let attendees: RelationRequest = ["users"].into_iter().collect();
        let event = self.api.resource(models.event).find_by_id(id, &attendees)?;
        let mut found = event
            .related("users")
            .map(|related| related.as_many().to_vec())
            .ok_or_else(|| DomainError::internal("users relation was not loaded"))?;

        users.load(&mut found, &req.query.relations)?;
        Ok(Response::ok(self.api.present_all(&found)?))
    }
}

/// Rewrites `start`/`end` bounds into the stored timestamp form.
fn canonical_times(filters: &[Clause]) -> Vec<Clause> {
    filters
        .iter()
        .cloned()
        .map(|mut clause| {
            if matches!(clause.key.as_str(), "start" | "end")
                && let Some(canonical) = clause.value.as_str().and_then(models::canonical_datetime)
            {
                clause.value = Value::Text(canonical);
            }
            clause
        })
        .collect()
}
