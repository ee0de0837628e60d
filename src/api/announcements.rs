//! `/announcements` routes.

use roster_core::{Result, Store};

use super::{Api, Request, Response, respond};

pub struct Announcements<'a, S: Store> {
    pub(super) api: &'a Api<S>,
}

impl<S: Store> Announcements<'_, S> {
    /// `GET /announcements`
    pub fn index(&self, req: &Request) -> Response {
        respond(self.try_index(req))
    }

    fn try_index(&self, req: &Request) -> Result<Response> {
        let announcements = self.api.resource(self.api.models().announcement);
        let found = announcements.find_all(&req.query.filters, &req.query.relations)?;
        Ok(Response::ok(self.api.present_all(&found)?))
    }
}
