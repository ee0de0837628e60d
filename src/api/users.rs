//! `/users` routes.

use roster_core::{
    DomainError, EntityId, RelationRequest, Result, Store, attributes_from_json, relations,
};

use super::acl::{self, Access};
use super::{Api, Request, Response, respond, validate};

pub struct Users<'a, S: Store> {
    pub(super) api: &'a Api<S>,
}

impl<S: Store> Users<'_, S> {
    /// `GET /users`
    pub fn index(&self, req: &Request) -> Response {
        respond(self.try_index(req))
    }

    /// `GET /users/:id`
    pub fn show(&self, req: &Request, id: &str) -> Response {
        respond(self.try_show(req, id))
    }

    /// `PATCH /users/:id`, for the user themself or an admin.
    pub fn update(&self, req: &Request, id: &str) -> Response {
        respond(self.try_update(req, id))
    }

    /// `DELETE /users/:id`, officers and admins only.
    pub fn delete(&self, req: &Request, id: &str) -> Response {
        respond(self.try_delete(req, id))
    }

    /// `GET /users/:id/events`: events the user attended, with the requested
    /// event relations.
    pub fn attended_events(&self, req: &Request, id: &str) -> Response {
        respond(self.try_attended_events(req, id))
    }

    fn try_index(&self, req: &Request) -> Result<Response> {
        let users = self.api.resource(self.api.models().user);
        let found = users.find_all(&req.query.filters, &req.query.relations)?;
        Ok(Response::ok(self.api.present_all(&found)?))
    }

    fn try_show(&self, req: &Request, id: &str) -> Result<Response> {
        let id: EntityId = id.parse()?;
        let users = self.api.resource(self.api.models().user);
        let user = users.find_by_id(id, &req.query.relations)?;
        Ok(Response::ok(self.api.present(&user)?))
    }

    fn try_update(&self, req: &Request, id: &str) -> Result<Response> {
        let body = req.body()?;
        validate::user_update(body)?;
        let id: EntityId = id.parse()?;
        let current = self.api.auth().authenticate(req)?;
        acl::allow_any_of(&current, &[Access::Owner, Access::Admin], Some(id))?;

        let users = self.api.resource(self.api.models().user);
        let user = users.update(id, attributes_from_json(body)?)?;
        Ok(Response::ok(self.api.present(&user)?))
    }

    fn try_delete(&self, req: &Request, id: &str) -> Result<Response> {
        let id: EntityId = id.parse()?;
        let current = self.api.auth().authenticate(req)?;
        acl::allow_any_of(&current, &[Access::Officer, Access::Admin], None)?;

        self.api.resource(self.api.models().user).delete(id)?;
        Ok(Response::no_content())
    }

    fn try_attended_events(&self, req: &Request, id: &str) -> Result<Response> {
        let id: EntityId = id.parse()?;
        let models = self.api.models();
        let events = self.api.resource(models.event);
        relations::validate(events.descriptor(), &req.query.relations)?;

        let attended: RelationRequest = ["events"].into_iter().collect();
        let user = self.api.resource(models.user).find_by_id(id, &attended)?;
        let mut found = user
            .related("events")
            .map(|related| related.as_many().to_vec())
            .ok_or_else(|| DomainError::internal("events relation was not loaded"))?;

        events.load(&mut found, &req.query.relations)?;
        Ok(Response::ok(self.api.present_all(&found)?))
    }
}
