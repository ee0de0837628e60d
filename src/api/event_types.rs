//! `/events/types` routes.

use roster_core::{EntityId, Result, Store};

use super::{Api, Request, Response, respond};

pub struct EventTypes<'a, S: Store> {
    pub(super) api: &'a Api<S>,
}

impl<S: Store> EventTypes<'_, S> {
    /// `GET /events/types`
    pub fn index(&self, req: &Request) -> Response {
        respond(self.try_index(req))
    }

    /// `GET /events/types/:id`
    pub fn show(&self, req: &Request, id: &str) -> Response {
        respond(self.try_show(req, id))
    }

    fn try_index(&self, req: &Request) -> Result<Response> {
        let types = self.api.resource(self.api.models().event_type);
        let found = types.find_all(&req.query.filters, &req.query.relations)?;
        Ok(Response::ok(self.api.present_all(&found)?))
    }

    fn try_show(&self, req: &Request, id: &str) -> Result<Response> {
        let id: EntityId = id.parse()?;
        let types = self.api.resource(self.api.models().event_type);
        let found = types.find_by_id(id, &req.query.relations)?;
        Ok(Response::ok(self.api.present(&found)?))
    }
}
