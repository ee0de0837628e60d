mod common;

use common::*;
use roster::api::Request;
use roster::models::Role;
use serde_json::json;

//------------------------------------------------------------------------------
// auth
//------------------------------------------------------------------------------

#[test]
fn register_then_login() {
    let api = setup_api();
    let (id, _) = register(&api, "ana@example.com");

    let login = api.auth().login(&Request::default().with_body(json!({
        "email": "ana@example.com",
        "password": PASSWORD,
    })));
    assert_eq!(login.status, 200);

    let me = api
        .auth()
        .current_user(&Request::default().with_bearer(&token_of(&login)));
    assert_eq!(me.status, 200);
    assert_eq!(me.body["id"], id.get());
    assert_eq!(me.body["role"]["name"], "initiate");
    assert!(me.body.get("password").is_none());
}

#[test]
fn register_rejects_duplicates_and_bad_bodies() {
    let api = setup_api();
    register(&api, "ana@example.com");

    let again = api.auth().register(&Request::default().with_body(json!({
        "email": "ana@example.com",
        "password": PASSWORD,
    })));
    assert_eq!(again.status, 400);
    assert_eq!(again.body["message"], "This email has already been registered.");

    let invalid = api.auth().register(&Request::default().with_body(json!({
        "email": "not-an-email",
        "password": "short",
    })));
    assert_eq!(invalid.status, 400);
    let message = invalid.body["message"].as_str().unwrap();
    assert!(message.contains("Email is invalid."));
    assert!(message.contains("Password must be at least 6 characters."));
}

#[test]
fn register_cannot_claim_officer() {
    let api = setup_api();
    let response = api.auth().register(&Request::default().with_body(json!({
        "email": "sneaky@example.com",
        "password": PASSWORD,
        "role": "officer",
    })));
    assert_eq!(response.status, 400);

    let member = api.auth().register(&Request::default().with_body(json!({
        "email": "member@example.com",
        "password": PASSWORD,
        "role": "member",
    })));
    assert_eq!(member.status, 201);
    let me = api
        .auth()
        .current_user(&Request::default().with_bearer(&token_of(&member)));
    assert_eq!(me.body["role_id"], Role::Member.id());
}

#[test]
fn login_failures() {
    let api = setup_api();
    register(&api, "ana@example.com");

    let unknown = api.auth().login(&Request::default().with_body(json!({
        "email": "nobody@example.com",
        "password": PASSWORD,
    })));
    assert_eq!(unknown.status, 400);

    let wrong = api.auth().login(&Request::default().with_body(json!({
        "email": "ana@example.com",
        "password": "wrong-password",
    })));
    assert_eq!(wrong.status, 401);
    assert_eq!(wrong.body["message"], "The email and password entered don't match.");

    let empty = api.auth().login(&Request::default());
    assert_eq!(empty.status, 400);
}

#[test]
fn unverified_accounts_cannot_log_in() {
    let api = setup_api();
    let (id, token) = register(&api, "ana@example.com");
    exec(&api, &format!("UPDATE users SET valid = 0 WHERE id = {id};"));

    let login = api.auth().login(&Request::default().with_body(json!({
        "email": "ana@example.com",
        "password": PASSWORD,
    })));
    assert_eq!(login.status, 401);

    let me = api.auth().current_user(&Request::default().with_bearer(&token));
    assert_eq!(me.status, 401);
}

#[test]
fn bearer_header_handling() {
    let api = setup_api();

    let missing = api.auth().current_user(&Request::default());
    assert_eq!(missing.status, 401);
    assert_eq!(missing.body["message"], "Authorization header not present.");

    let scheme = api
        .auth()
        .current_user(&Request::default().with_authorization("Token abc"));
    assert_eq!(scheme.status, 400);

    let garbage = api
        .auth()
        .current_user(&Request::default().with_bearer("not.a.token"));
    assert_eq!(garbage.status, 401);
}

#[test]
fn current_user_embeds_requested_relations() {
    let api = setup_api();
    let (_, token) = register(&api, "ana@example.com");

    let mut req = Request::query("embed=events");
    req.authorization = Some(format!("Bearer {token}"));
    let me = api.auth().current_user(&req);
    assert_eq!(me.status, 200);
    assert_eq!(me.body["events"], json!([]));
    assert_eq!(me.body["role"]["name"], "initiate");
}

//------------------------------------------------------------------------------
// access control
//------------------------------------------------------------------------------

#[test]
fn only_officers_write_events() {
    let api = setup_api();
    seed_event_types(&api);
    let (_, token) = register(&api, "ana@example.com");

    let body = json!({
        "summary": "Meeting",
        "start": "2020-01-10 18:00:00",
        "end": "2020-01-10 19:00:00",
        "type_id": 1,
    });
    let denied = api
        .events()
        .create(&Request::default().with_bearer(&token).with_body(body.clone()));
    assert_eq!(denied.status, 401);
    assert_eq!(denied.body["message"], "Not authorized to access this route.");

    let created = api.events().create(&officer_request(&api).with_body(body));
    assert_eq!(created.status, 201);
    assert_eq!(created.body["summary"], "Meeting");
}

#[test]
fn body_validation_precedes_authentication() {
    let api = setup_api();
    let response = api.events().create(&Request::default().with_body(json!({
        "summary": "Backwards",
        "start": "2020-01-10 19:00:00",
        "end": "2020-01-10 18:00:00",
        "type_id": 1,
    })));
    assert_eq!(response.status, 400);
    assert_eq!(response.body["message"], "An event can't end before it starts.");
}

#[test]
fn users_update_themselves_only() {
    let api = setup_api();
    let (ana, ana_token) = register(&api, "ana@example.com");
    let (bo, _) = register(&api, "bo@example.com");

    let own = api.users().update(
        &Request::default()
            .with_bearer(&ana_token)
            .with_body(json!({ "first_name": "Ana", "house": "red" })),
        &ana.to_string(),
    );
    assert_eq!(own.status, 200);
    assert_eq!(own.body["first_name"], "Ana");
    assert_eq!(own.body["house"], "red");

    let other = api.users().update(
        &Request::default()
            .with_bearer(&ana_token)
            .with_body(json!({ "first_name": "Mallory" })),
        &bo.to_string(),
    );
    assert_eq!(other.status, 401);

    let escalate = api.users().update(
        &Request::default()
            .with_bearer(&ana_token)
            .with_body(json!({ "is_admin": true })),
        &ana.to_string(),
    );
    assert_eq!(escalate.status, 401);
    assert!(
        escalate.body["message"]
            .as_str()
            .unwrap()
            .contains("is_admin")
    );
}

#[test]
fn unknown_body_fields_are_malformed() {
    let api = setup_api();
    let (ana, ana_token) = register(&api, "ana@example.com");

    let response = api.users().update(
        &Request::default()
            .with_bearer(&ana_token)
            .with_body(json!({ "nickname": "A" })),
        &ana.to_string(),
    );
    assert_eq!(response.status, 400);
    assert_eq!(response.body["message"], "Unknown field `nickname`.");

    seed_event_types(&api);
    let created = api.events().create(&officer_request(&api).with_body(json!({
        "summary": "Meeting",
        "start": "2020-01-10 18:00:00",
        "end": "2020-01-10 19:00:00",
        "type_id": 1,
        "room": "B12",
    })));
    assert_eq!(created.status, 400);
}

#[test]
fn non_object_bodies_are_malformed() {
    let api = setup_api();
    let (ana, ana_token) = register(&api, "ana@example.com");

    let response = api.users().update(
        &Request::default()
            .with_bearer(&ana_token)
            .with_body(json!([{ "first_name": "Ana" }])),
        &ana.to_string(),
    );
    assert_eq!(response.status, 400);
    assert_eq!(response.body["message"], "Request body must be a JSON object.");

    let login = api
        .auth()
        .login(&Request::default().with_body(json!("ana@example.com")));
    assert_eq!(login.status, 400);
}

#[test]
fn admins_update_anyone() {
    let api = setup_api();
    let (_, admin_token) = register_as(&api, "admin@example.com", Role::Admin);
    let (bo, _) = register(&api, "bo@example.com");

    let response = api.users().update(
        &Request::default()
            .with_bearer(&admin_token)
            .with_body(json!({ "last_name": "Boss" })),
        &bo.to_string(),
    );
    assert_eq!(response.status, 200);
    assert_eq!(response.body["last_name"], "Boss");
}

#[test]
fn deleting_users_needs_an_officer() {
    let api = setup_api();
    let (ana, ana_token) = register(&api, "ana@example.com");

    let denied = api
        .users()
        .delete(&Request::default().with_bearer(&ana_token), &ana.to_string());
    assert_eq!(denied.status, 401);

    let deleted = api.users().delete(&officer_request(&api), &ana.to_string());
    assert_eq!(deleted.status, 204);

    let again = api.users().delete(&officer_request(&api), &ana.to_string());
    assert_eq!(again.status, 404);
}

//------------------------------------------------------------------------------
// attendance records
//------------------------------------------------------------------------------

#[test]
fn attendance_lifecycle_and_points() {
    let api = setup_api();
    seed_event_types(&api);
    let (ana, _) = register(&api, "ana@example.com");
    let first = seed_event(&api, "First", 1, 1, "2020-01-10 18:00:00");
    let second = seed_event(&api, "Second", 2, 1, "2020-01-11 18:00:00");
    let (ana, first, second) = (ana.to_string(), first.to_string(), second.to_string());

    let put = |event: &str, points: f64| {
        api.records().create(
            &officer_request(&api).with_body(json!({ "points_earned": points })),
            &ana,
            event,
        )
    };
    assert_eq!(put(&first, 1.0).status, 201);
    assert_eq!(put(&second, 2.5).status, 201);

    let total = api
        .records()
        .points(&Request::query(&format!("user_id={ana}")));
    assert_eq!(total.status, 200);
    assert_eq!(total.body["points"], 3.5);

    let patched = api.records().update(
        &officer_request(&api).with_body(json!({ "points_earned": 0.75 })),
        &ana,
        &second,
    );
    assert_eq!(patched.status, 200);
    assert_eq!(patched.body["points_earned"], 0.75);

    let deleted = api.records().delete(&officer_request(&api), &ana, &first);
    assert_eq!(deleted.status, 204);
    let again = api.records().delete(&officer_request(&api), &ana, &first);
    assert_eq!(again.status, 404);

    let total = api
        .records()
        .points(&Request::query(&format!("user_id={ana}")));
    assert_eq!(total.body["points"], 0.75);
}

#[test]
fn attendance_points_must_be_quarters() {
    let api = setup_api();
    let response = api.records().create(
        &Request::default().with_body(json!({ "points_earned": 0.3 })),
        "1",
        "1",
    );
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body["message"],
        "Number of points should be a multiple of 0.25."
    );
}

#[test]
fn attendance_needs_both_participants() {
    let api = setup_api();
    seed_event_types(&api);
    let event = seed_event(&api, "First", 1, 1, "2020-01-10 18:00:00");

    let response = api.records().create(
        &officer_request(&api).with_body(json!({ "points_earned": 1 })),
        "999",
        &event.to_string(),
    );
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body["message"],
        "Can't register user; this user doesn't exist."
    );
}

#[test]
fn attendees_of_an_event() {
    let api = setup_api();
    seed_event_types(&api);
    let (ana, _) = register(&api, "ana@example.com");
    let event = seed_event(&api, "First", 1, 1, "2020-01-10 18:00:00");
    let created = api.records().create(
        &officer_request(&api).with_body(json!({ "points_earned": 1 })),
        &ana.to_string(),
        &event.to_string(),
    );
    assert_eq!(created.status, 201);

    let response = api
        .events()
        .attendees(&Request::query("embed=role"), &event.to_string());
    assert_eq!(response.status, 200);
    assert_eq!(ids(&response.body), vec![ana.get()]);
    assert_eq!(response.body[0]["role"]["name"], "initiate");
    assert!(response.body[0].get("password").is_none());

    let missing = api.events().attendees(&Request::default(), "999");
    assert_eq!(missing.status, 404);
}

#[test]
fn announcements_list() {
    let api = setup_api();
    exec(
        &api,
        "INSERT INTO announcements (summary, description) VALUES ('Welcome', 'Hello');",
    );

    let response = api.announcements().index(&Request::query("summary=Welcome"));
    assert_eq!(response.status, 200);
    assert_eq!(response.body[0]["summary"], "Welcome");

    let none = api.announcements().index(&Request::query("summary=Nope"));
    assert_eq!(none.body, json!([]));
}
