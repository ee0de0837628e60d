//! Request body validation.
//!
//! Every validator checks all of its fields and reports every problem at
//! once as a single `Malformed` error. Keys that name no column are problems
//! too; columns a route may not write are left for the guard to refuse.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use roster_core::DomainError;
use serde_json::{Map, Value as JsonValue};

use crate::models::Role;

type Body = Map<String, JsonValue>;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// User columns plus `role`, which resolves to `role_id`.
const USER_KEYS: [&str; 11] = [
    "id",
    "email",
    "password",
    "first_name",
    "last_name",
    "pid",
    "house",
    "is_admin",
    "valid",
    "role_id",
    "role",
];

const EVENT_KEYS: [&str; 11] = [
    "id",
    "summary",
    "description",
    "points",
    "location",
    "start",
    "end",
    "created_at",
    "updated_at",
    "type_id",
    "officer_id",
];

const RECORD_KEYS: [&str; 4] = ["id", "user_id", "event_id", "points_earned"];

const HOUSES: [&str; 3] = ["red", "green", "blue"];
const MIN_PASSWORD: usize = 6;
const POINT_STEP: f64 = 0.25;

/// Collected validation failures.
#[derive(Debug, Default)]
struct Problems(Vec<String>);

impl Problems {
    fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_owned());
        }
    }

    fn known_keys(&mut self, body: &Body, known: &[&str]) {
        for key in body.keys().filter(|key| !known.contains(&key.as_str())) {
            self.0.push(format!("Unknown field `{key}`."));
        }
    }

    fn finish(self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::malformed(self.0.join(" ")))
        }
    }
}

fn text<'b>(body: &'b Body, key: &str) -> Option<&'b str> {
    body.get(key).and_then(JsonValue::as_str)
}

fn non_empty(body: &Body, key: &str) -> bool {
    text(body, key).is_some_and(|s| !s.trim().is_empty())
}

/// `true` when the key is absent, otherwise `check` decides.
fn optional(body: &Body, key: &str, check: impl FnOnce(&JsonValue) -> bool) -> bool {
    body.get(key).is_none_or(check)
}

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Parses the datetime formats accepted for event times.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").ok())
}

fn is_datetime(value: &JsonValue) -> bool {
    value.as_str().and_then(parse_datetime).is_some()
}

fn is_non_negative_int(value: &JsonValue) -> bool {
    value.as_i64().is_some_and(|n| n >= 0)
}

fn is_id(value: &JsonValue) -> bool {
    value.as_i64().is_some_and(|n| n > 0)
}

fn is_non_empty_text(value: &JsonValue) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

/// `POST /auth/register`
pub fn register(body: &Body) -> Result<(), DomainError> {
    let mut problems = Problems::default();
    problems.known_keys(body, &USER_KEYS);
    problems.check(text(body, "email").is_some_and(is_email), "Email is invalid.");
    problems.check(
        text(body, "password").is_some_and(|p| p.chars().count() >= MIN_PASSWORD),
        "Password must be at least 6 characters.",
    );
    problems.check(
        optional(body, "role", |v| {
            matches!(
                v.as_str().and_then(Role::from_name),
                Some(Role::Initiate | Role::Member)
            )
        }),
        "Must register with a role as an initiate or a member.",
    );
    problems.check(
        optional(body, "pid", is_non_empty_text),
        "The PID from an ID card is required.",
    );
    problems.finish()
}

/// `POST /auth/login`
pub fn login(body: &Body) -> Result<(), DomainError> {
    let mut problems = Problems::default();
    problems.check(non_empty(body, "email"), "Email is required.");
    problems.check(non_empty(body, "password"), "Password is required.");
    problems.finish()
}

/// `PATCH /users/:id`
pub fn user_update(body: &Body) -> Result<(), DomainError> {
    let mut problems = Problems::default();
    problems.known_keys(body, &USER_KEYS);
    problems.check(
        optional(body, "first_name", is_non_empty_text),
        "First name can't be empty.",
    );
    problems.check(
        optional(body, "last_name", is_non_empty_text),
        "Last name can't be empty.",
    );
    problems.check(optional(body, "pid", is_non_empty_text), "PID can't be empty.");
    problems.check(
        optional(body, "house", |v| v.as_str().is_some_and(|h| HOUSES.contains(&h))),
        "House must be red, green, or blue.",
    );
    problems.check(
        optional(body, "role", |v| {
            matches!(
                v.as_str().and_then(Role::from_name),
                Some(Role::Initiate | Role::Pending)
            )
        }),
        "Role must be initiate or pending.",
    );
    problems.check(
        optional(body, "email", |v| v.as_str().is_some_and(is_email)),
        "Email is invalid.",
    );
    problems.check(
        optional(body, "password", |v| {
            v.as_str().is_some_and(|p| p.chars().count() >= MIN_PASSWORD)
        }),
        "Password must be at least 6 characters.",
    );
    problems.finish()
}

fn event_fields(body: &Body, problems: &mut Problems) {
    problems.known_keys(body, &EVENT_KEYS);
    problems.check(
        optional(body, "summary", is_non_empty_text),
        "The event summary can't be empty.",
    );
    problems.check(
        optional(body, "description", is_non_empty_text),
        "The description can't be empty.",
    );
    problems.check(
        optional(body, "points", is_non_negative_int),
        "Points value must be a number greater than or equal to 0.",
    );
    problems.check(
        optional(body, "location", JsonValue::is_string),
        "Location must be text.",
    );
    problems.check(optional(body, "start", is_datetime), "Start must be a valid date.");
    problems.check(optional(body, "end", is_datetime), "End must be a valid date.");
    problems.check(optional(body, "type_id", is_id), "Event type must be an id.");
    problems.check(optional(body, "officer_id", is_id), "Officer must be an id.");

    let start = text(body, "start").and_then(parse_datetime);
    let end = text(body, "end").and_then(parse_datetime);
    if let (Some(start), Some(end)) = (start, end) {
        problems.check(start <= end, "An event can't end before it starts.");
    }
}

/// `POST /events`
pub fn event_create(body: &Body) -> Result<(), DomainError> {
    let mut problems = Problems::default();
    problems.check(body.contains_key("summary"), "The event summary is required.");
    problems.check(body.contains_key("start"), "Start is required.");
    problems.check(body.contains_key("end"), "End is required.");
    problems.check(body.contains_key("type_id"), "Event type is required.");
    event_fields(body, &mut problems);
    problems.finish()
}

/// `PATCH /events/:id`
pub fn event_update(body: &Body) -> Result<(), DomainError> {
    let mut problems = Problems::default();
    event_fields(body, &mut problems);
    problems.finish()
}

/// `PUT`/`PATCH /users/:user_id/events/:event_id`
pub fn points(body: &Body) -> Result<(), DomainError> {
    let points = body.get("points_earned").and_then(JsonValue::as_f64);
    let mut problems = Problems::default();
    problems.known_keys(body, &RECORD_KEYS);
    problems.check(points.is_some(), "Number of points is required.");
    if let Some(points) = points {
        problems.check(
            points >= 0.0,
            "Number of points should be greater than or equal to 0.",
        );
        problems.check(
            (points / POINT_STEP).fract() == 0.0,
            "Number of points should be a multiple of 0.25.",
        );
    }
    problems.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: JsonValue) -> Body {
        match value {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn register_rules() {
        assert!(register(&body(json!({
            "email": "ana@example.com",
            "password": "hunter22",
            "role": "member",
        })))
        .is_ok());

        let err = register(&body(json!({
            "email": "not-an-email",
            "password": "123",
            "role": "officer",
        })))
        .unwrap_err();
        let message = err.message();
        assert!(message.contains("Email is invalid."));
        assert!(message.contains("at least 6"));
        assert!(message.contains("initiate or a member"));
    }

    #[test]
    fn email_pattern() {
        assert!(is_email("ana@example.com"));
        assert!(is_email("a.b+c@mail.example.org"));
        assert!(!is_email("ana@example"));
        assert!(!is_email("ana example@x.co"));
        assert!(!is_email(""));
    }

    #[test]
    fn unknown_keys_are_named() {
        let err = user_update(&body(json!({"nickname": "A", "first_name": "Ana"}))).unwrap_err();
        assert!(matches!(err, DomainError::Malformed(_)));
        assert_eq!(err.message(), "Unknown field `nickname`.");

        // Guarded columns are known; the guard refuses them later.
        assert!(user_update(&body(json!({"is_admin": true}))).is_ok());
        assert!(register(&body(json!({
            "email": "ana@example.com",
            "password": "hunter22",
            "nick": "a",
        })))
        .is_err());
        assert!(event_update(&body(json!({"title": "x"}))).is_err());
        assert!(points(&body(json!({"points_earned": 1, "bonus": 1}))).is_err());
    }

    #[test]
    fn login_requires_both_fields() {
        assert!(login(&body(json!({"email": "a@b.co", "password": "x"}))).is_ok());
        assert!(matches!(
            login(&body(json!({"email": ""}))),
            Err(DomainError::Malformed(_))
        ));
    }

    #[test]
    fn user_update_rules() {
        assert!(user_update(&body(json!({}))).is_ok());
        assert!(user_update(&body(json!({"house": "red", "role": "pending"}))).is_ok());
        assert!(user_update(&body(json!({"house": "purple"}))).is_err());
        assert!(user_update(&body(json!({"role": "admin"}))).is_err());
        assert!(user_update(&body(json!({"first_name": "  "}))).is_err());
    }

    #[test]
    fn event_rules() {
        let valid = body(json!({
            "summary": "General meeting",
            "start": "2020-01-18T18:00:00Z",
            "end": "2020-01-18 20:00:00",
            "type_id": 1,
            "points": 2,
        }));
        assert!(event_create(&valid).is_ok());

        assert!(event_create(&body(json!({"summary": "x"}))).is_err());
        assert!(event_update(&body(json!({"points": -1}))).is_err());
        assert!(event_update(&body(json!({
            "start": "2020-01-18T20:00",
            "end": "2020-01-18T18:00",
        })))
        .is_err());
        assert!(event_update(&body(json!({"start": "yesterday"}))).is_err());
    }

    #[test]
    fn points_rules() {
        assert!(points(&body(json!({"points_earned": 1.75}))).is_ok());
        assert!(points(&body(json!({"points_earned": 0}))).is_ok());
        assert!(points(&body(json!({"points_earned": 0.3}))).is_err());
        assert!(points(&body(json!({"points_earned": -0.25}))).is_err());
        assert!(points(&body(json!({}))).is_err());
    }
}
