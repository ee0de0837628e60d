#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use roster::api::{Api, Request, Response};
use roster::credentials::{Argon2Hasher, JwtIssuer};
use roster::models::Role;
use roster::{SqliteStore, schema};
use roster_core::EntityId;
use serde_json::{Value as JsonValue, json};

pub const SECRET: &str = "test-secret";
pub const PASSWORD: &str = "hunter22";

/// In-memory database with every table installed.
pub fn setup_api() -> Api<SqliteStore> {
    let store = SqliteStore::open_in_memory().expect("Failed to create in-memory database");
    schema::install(&store).expect("Failed to install tables");

    let hasher = Argon2Hasher::new(8, 1).expect("argon2 params");
    Api::new(
        store,
        Arc::new(hasher),
        Arc::new(JwtIssuer::new(SECRET)),
        Duration::from_secs(3600),
    )
    .expect("schema")
}

pub fn exec(api: &Api<SqliteStore>, sql: &str) {
    api.store().execute_batch(sql).expect("Failed to run fixture SQL");
}

/// Registers a user and returns `(id, token)`.
pub fn register(api: &Api<SqliteStore>, email: &str) -> (EntityId, String) {
    let response = api.auth().register(&Request::default().with_body(json!({
        "email": email,
        "password": PASSWORD,
        "first_name": "Test",
        "last_name": "User",
    })));
    assert_eq!(response.status, 201, "register failed: {}", response.body);
    let token = token_of(&response);

    let me = api.auth().current_user(&Request::default().with_bearer(&token));
    let id = me.body["id"].as_i64().expect("user id");
    (EntityId::new(id), token)
}

/// Registers a user holding `role`.
pub fn register_as(api: &Api<SqliteStore>, email: &str, role: Role) -> (EntityId, String) {
    let (id, token) = register(api, email);
    exec(
        api,
        &format!("UPDATE users SET role_id = {} WHERE id = {};", role.id(), id),
    );
    (id, token)
}

pub fn token_of(response: &Response) -> String {
    response.body["token"]
        .as_str()
        .expect("token in body")
        .to_owned()
}

/// Event types `general` (1) and `social` (2).
pub fn seed_event_types(api: &Api<SqliteStore>) {
    exec(
        api,
        r#"
        INSERT INTO event_types (id, name, display_name) VALUES (1, 'general', 'General Meeting');
        INSERT INTO event_types (id, name, display_name) VALUES (2, 'social', 'Social');
        "#,
    );
}

/// Inserts an event and returns its id.
pub fn seed_event(api: &Api<SqliteStore>, summary: &str, points: i64, type_id: i64, start: &str) -> EntityId {
    let response = api
        .events()
        .create(&officer_request(api).with_body(json!({
            "summary": summary,
            "points": points,
            "start": start,
            "end": start,
            "type_id": type_id,
        })));
    assert_eq!(response.status, 201, "event create failed: {}", response.body);
    EntityId::new(response.body["id"].as_i64().expect("event id"))
}

/// A request authenticated as a lazily registered officer.
pub fn officer_request(api: &Api<SqliteStore>) -> Request {
    let login = api.auth().login(&Request::default().with_body(json!({
        "email": "officer@example.com",
        "password": PASSWORD,
    })));
    let token = if login.status == 200 {
        token_of(&login)
    } else {
        register_as(api, "officer@example.com", Role::Officer).1
    };
    Request::default().with_bearer(&token)
}

pub fn ids(body: &JsonValue) -> Vec<i64> {
    body.as_array()
        .expect("array body")
        .iter()
        .filter_map(|item| item["id"].as_i64())
        .collect()
}
