//! HTTP tests driving the router with in-memory stores.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Duration;
use planner_core::environment::Clock;
use planner_core::form::EventForm;
use planner_testing::fixtures::{event_form, event_form_on, private_event_form, test_engine};
use planner_testing::{InMemoryStore, test_clock};
use planner_web::{AppState, REQUEST_ID_HEADER, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, InMemoryStore) {
    let (engine, store) = test_engine();
    let state = AppState::new(
        Arc::new(engine),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    );
    (build_router(state, &[]), store)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn form_json(form: &EventForm) -> Value {
    serde_json::to_value(form).unwrap()
}

async fn create(app: &Router, token: &str, form: &EventForm) -> String {
    let (status, body) = send(
        app,
        request(Method::POST, "/events", Some(token), Some(form_json(form))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    body["eventId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (app, store) = app();

    let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, request(Method::GET, "/ready", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    store.set_unavailable(true);
    let (status, body) = send(&app, request(Method::GET, "/ready", None, None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let (app, store) = app();

    let (status, body) = send(
        &app,
        request(Method::POST, "/events", None, Some(form_json(&event_form("Meetup")))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"success": false, "error": "Not authenticated"}));

    // Unknown tokens are anonymous, not rejected outright.
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/events",
            Some("forged"),
            Some(form_json(&event_form("Meetup"))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn test_create_reports_first_validation_error() {
    let (app, store) = app();
    let form = EventForm {
        title: Some(String::new()),
        ..event_form("Meetup")
    };

    let (status, body) = send(
        &app,
        request(Method::POST, "/events", Some("token-alice"), Some(form_json(&form))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Title is required"}));
    assert_eq!(store.event_count(), 0);
}

#[tokio::test]
async fn test_create_from_html_form_with_session_cookie() {
    let (app, store) = app();
    let date = (test_clock().now() + Duration::days(3)).format("%Y-%m-%dT%H:%M");
    let body = format!(
        "title=Board+games&description=Bring+your+own&date={date}&location=Library&maxAttendees=12&isPublic=on"
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/events")
        .header(header::COOKIE, "theme=dark; session_token=token-alice")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let id = body["eventId"].as_str().unwrap();
    let (status, detail) = send(&app, request_get(&format!("/events/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["title"], "Board games");
    assert_eq!(detail["maxAttendees"], 12);
    assert_eq!(detail["isPublic"], true);
    assert_eq!(detail["ownerId"], "alice");
    assert_eq!(store.event_count(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_a_failed_outcome() {
    let (app, _store) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/events")
        .header(header::AUTHORIZATION, "Bearer token-alice")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn test_anonymous_malformed_body_is_unauthenticated() {
    let (app, store) = app();
    let event_id = create(&app, "token-alice", &event_form("Meetup")).await;

    for (method, uri) in [
        (Method::POST, "/events".to_string()),
        (Method::PUT, format!("/events/{event_id}")),
        (Method::POST, format!("/events/{event_id}/rsvp")),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"success": false, "error": "Not authenticated"}));
    }
    assert_eq!(store.event_count(), 1);
}

fn request_get(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, token, None)
}

#[tokio::test]
async fn test_private_event_visibility() {
    let (app, _store) = app();
    let id = create(&app, "token-alice", &private_event_form("Surprise party")).await;
    let uri = format!("/events/{id}");

    let (status, body) = send(&app, request_get(&uri, Some("token-bob"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({"code": "FORBIDDEN", "message": "Not authorized to view this event"})
    );

    let (status, _) = send(&app, request_get(&uri, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, request_get(&uri, Some("token-alice"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Surprise party");
    assert_eq!(body["owner"]["name"], "Alice");
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let (app, _store) = app();

    let (status, body) = send(&app, request_get("/events/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let missing = uuid_like();
    let (status, _) = send(&app, request_get(&format!("/events/{missing}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn uuid_like() -> String {
    planner_core::types::EventId::new().to_string()
}

#[tokio::test]
async fn test_meetup_rsvp_flow() {
    let (app, store) = app();
    let id = create(&app, "token-alice", &event_form("Meetup")).await;
    let rsvp_uri = format!("/events/{id}/rsvp");

    let (status, body) = send(
        &app,
        request(Method::POST, &rsvp_uri, Some("token-bob"), Some(json!({"status": "GOING"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["rsvp"]["status"], "GOING");
    assert_eq!(body["rsvp"]["userId"], "bob");

    let (_, detail) = send(&app, request_get(&format!("/events/{id}"), None)).await;
    assert_eq!(detail["rsvpCount"], 1);

    let (status, _) = send(
        &app,
        request(Method::POST, &rsvp_uri, Some("token-bob"), Some(json!({"status": "MAYBE"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = send(&app, request_get(&format!("/events/{id}"), None)).await;
    assert_eq!(detail["rsvpCount"], 1);
    assert_eq!(detail["rsvps"][0]["status"], "MAYBE");
    assert_eq!(detail["rsvps"][0]["name"], "Bob");
    assert_eq!(store.rsvp_count(), 1);

    let (status, mine) = send(&app, request_get(&rsvp_uri, Some("token-bob"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine, json!({"status": "MAYBE"}));

    let (_, mine) = send(&app, request_get(&rsvp_uri, Some("token-carol"))).await;
    assert_eq!(mine, json!({"status": null}));

    let (status, _) = send(&app, request_get(&rsvp_uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, attendees) =
        send(&app, request_get(&format!("/events/{id}/rsvps"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attendees.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rsvp_rule_violations() {
    let (app, store) = app();
    let private = create(&app, "token-alice", &private_event_form("Board meeting")).await;
    let public = create(&app, "token-alice", &event_form("Picnic")).await;

    // The owner cannot RSVP to their own private event either.
    for token in ["token-bob", "token-alice"] {
        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &format!("/events/{private}/rsvp"),
                Some(token),
                Some(json!({"status": "GOING"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, json!({"success": false, "error": "Event is not public"}));
    }

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/events/{public}/rsvp"),
            Some("token-bob"),
            Some(json!({"status": "maybe"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Invalid RSVP status: maybe");

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/events/{public}/rsvp"),
            None,
            Some(json!({"status": "GOING"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authenticated");
    assert_eq!(store.rsvp_count(), 0);
}

#[tokio::test]
async fn test_delete_is_owner_only() {
    let (app, store) = app();
    let id = create(&app, "token-alice", &event_form("Meetup")).await;
    let uri = format!("/events/{id}");
    send(
        &app,
        request(
            Method::POST,
            &format!("{uri}/rsvp"),
            Some("token-bob"),
            Some(json!({"status": "GOING"})),
        ),
    )
    .await;

    let (status, body) = send(&app, request(Method::DELETE, &uri, Some("token-bob"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({"success": false, "error": "Not authorized to delete this event"})
    );
    let (status, _) = send(&app, request_get(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request(Method::DELETE, &uri, Some("token-alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "eventId": id}));

    let (status, _) = send(&app, request_get(&uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(store.rsvp_count(), 0);

    let (status, _) = send(&app, request(Method::DELETE, &uri, Some("token-alice"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_event() {
    let (app, _store) = app();
    let id = create(&app, "token-alice", &event_form("Meetup")).await;
    let uri = format!("/events/{id}");
    let renamed = form_json(&event_form("Rust Meetup"));

    let (status, body) = send(
        &app,
        request(Method::PUT, &uri, Some("token-bob"), Some(renamed.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not authorized to edit this event");

    let (status, body) = send(
        &app,
        request(Method::PUT, &uri, Some("token-alice"), Some(renamed)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eventId"], id.as_str());

    let (_, detail) = send(&app, request_get(&uri, None)).await;
    assert_eq!(detail["title"], "Rust Meetup");
}

#[tokio::test]
async fn test_listing_filters_and_search() {
    let (app, _store) = app();
    let now = test_clock().now();
    create(&app, "token-alice", &event_form_on("Retro", now - Duration::days(2))).await;
    create(&app, "token-alice", &event_form_on("Rust Meetup", now + Duration::days(2))).await;
    create(&app, "token-alice", &private_event_form("Hidden")).await;

    let titles = |body: &Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, body) = send(&app, request_get("/events", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["Retro", "Rust Meetup"]);

    let (_, body) = send(&app, request_get("/events", Some("token-alice"))).await;
    assert_eq!(titles(&body), vec!["Retro", "Rust Meetup", "Hidden"]);

    let (_, body) = send(&app, request_get("/events?filter=upcoming", None)).await;
    assert_eq!(titles(&body), vec!["Rust Meetup"]);

    let (_, body) = send(&app, request_get("/events?filter=past", None)).await;
    assert_eq!(titles(&body), vec!["Retro"]);

    let (_, body) = send(&app, request_get("/events?search=meetup", None)).await;
    assert_eq!(titles(&body), vec!["Rust Meetup"]);
    assert_eq!(body[0]["owner"]["name"], "Alice");
    assert_eq!(body[0]["rsvpCount"], 0);
}

#[tokio::test]
async fn test_dashboards_are_scoped_to_the_caller() {
    let (app, _store) = app();
    let id = create(&app, "token-alice", &private_event_form("Planning")).await;
    create(&app, "token-bob", &event_form("Bob's barbecue")).await;
    let alice_public = create(&app, "token-alice", &event_form("Open day")).await;
    send(
        &app,
        request(
            Method::POST,
            &format!("/events/{alice_public}/rsvp"),
            Some("token-bob"),
            Some(json!({"status": "NOT_GOING"})),
        ),
    )
    .await;

    let (status, body) = send(&app, request_get("/dashboard/events", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, body) = send(&app, request_get("/dashboard/events", Some("token-alice"))).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&id));

    let (status, body) = send(&app, request_get("/dashboard/rsvps", Some("token-bob"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "NOT_GOING");
    assert_eq!(body[0]["event"]["title"], "Open day");

    let (_, body) = send(&app, request_get("/dashboard/rsvps", Some("token-alice"))).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let (app, store) = app();
    store.set_unavailable(true);

    let (status, body) = send(&app, request_get("/events", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"code": "STORE_ERROR", "message": "Failed to fetch events"})
    );
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (app, _store) = app();
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "trace-me")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-me");
}
