use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use lodge_api::{AppState, AppStateInner, router, session::create_token};
use lodge_db::Database;

const SECRET: &str = "test-secret";
const UNAVAILABLE: &str = "Listing is not available for the selected dates";

struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let state = AppStateInner::new(db, SECRET, Duration::days(1));
        let router = router(state.clone());
        Self { state, router }
    }

    /// Inserts a user directly and returns a bearer token for them.
    fn user(&self, username: &str) -> String {
        let id = Uuid::new_v4();
        self.state
            .db
            .create_user(&id.to_string(), username, "not-a-hash")
            .unwrap();
        create_token(SECRET, Duration::days(1), id, username).unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Creates a 100/night USD listing and opens `[from, to)` for booking.
    async fn listing(&self, host: &str, from: &str, to: &str) -> String {
        let (status, listing) = self
            .send(
                "POST",
                "/listings",
                Some(host),
                Some(json!({
                    "title": "Cabin",
                    "description": "By the lake",
                    "pricePerNight": 100,
                    "currency": "usd"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{listing}");
        assert_eq!(listing["currency"], "USD");
        let id = listing["id"].as_str().unwrap().to_string();

        let (status, days) = self
            .send(
                "PUT",
                &format!("/listings/{id}/inventory"),
                Some(host),
                Some(json!({ "from": from, "to": to, "available": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{days}");
        id
    }
}

fn booking_body(listing_id: &str, check_in: &str, check_out: &str) -> Value {
    json!({ "listingId": listing_id, "checkIn": check_in, "checkOut": check_out })
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn register_then_login() {
    let app = TestApp::new();
    let creds = json!({ "username": "alice", "password": "correct horse" });

    let (status, registered) = app.send("POST", "/auth/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(registered["token"].is_string());

    let (status, body) = app.send("POST", "/auth/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, logged_in) = app.send("POST", "/auth/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["userId"], registered["userId"]);
    assert_eq!(logged_in["username"], "alice");

    let (status, body) = app
        .send(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username or password");

    // The issued token works on an authenticated route.
    let token = logged_in["token"].as_str().unwrap();
    let (status, _) = app.send("GET", "/me/listings", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn books_available_nights() {
    let app = TestApp::new();
    let host = app.user("host");
    let guest = app.user("guest");
    let listing = app.listing(&host, "2024-01-01", "2024-01-03").await;

    let (status, body) = app
        .send(
            "POST",
            "/bookings",
            Some(&guest),
            Some(booking_body(&listing, "2024-01-01", "2024-01-03")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    let booking = &body["booking"];
    assert_eq!(booking["totalPrice"], 200);
    assert_eq!(booking["nights"], 2);
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["dates"], json!(["2024-01-01", "2024-01-02"]));

    let (_, days) = app
        .send(
            "GET",
            &format!("/listings/{listing}/inventory?from=2024-01-01&to=2024-01-03"),
            None,
            None,
        )
        .await;
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 2);
    for day in days {
        assert_eq!(day["available"], false);
        assert_eq!(day["bookingId"], booking["id"]);
    }

    // Same request again: the nights are gone.
    let (status, body) = app
        .send(
            "POST",
            "/bookings",
            Some(&guest),
            Some(booking_body(&listing, "2024-01-01", "2024-01-03")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "success": false, "error": UNAVAILABLE }));
}

#[tokio::test]
async fn unavailable_night_changes_nothing() {
    let app = TestApp::new();
    let host = app.user("host");
    let guest = app.user("guest");
    let listing = app.listing(&host, "2024-01-01", "2024-01-03").await;

    let (status, _) = app
        .send(
            "PUT",
            &format!("/listings/{listing}/inventory"),
            Some(&host),
            Some(json!({ "from": "2024-01-02", "to": "2024-01-03", "available": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            "POST",
            "/bookings",
            Some(&guest),
            Some(booking_body(&listing, "2024-01-01", "2024-01-03")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "success": false, "error": UNAVAILABLE }));

    let (_, mine) = app.send("GET", "/bookings", Some(&guest), None).await;
    assert_eq!(mine, json!([]));

    let (_, days) = app
        .send(
            "GET",
            &format!("/listings/{listing}/inventory?from=2024-01-01&to=2024-01-03"),
            None,
            None,
        )
        .await;
    assert_eq!(days[0]["available"], true);
    assert_eq!(days[0]["bookingId"], Value::Null);
    assert_eq!(days[1]["available"], false);
}

#[tokio::test]
async fn booking_requires_session() {
    let app = TestApp::new();
    let host = app.user("host");
    let listing = app.listing(&host, "2024-01-01", "2024-01-03").await;

    let (status, body) = app
        .send(
            "POST",
            "/bookings",
            None,
            Some(booking_body(&listing, "2024-01-01", "2024-01-02")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "success": false, "error": "Authentication required" }));

    let (status, _) = app
        .send(
            "POST",
            "/bookings",
            Some("not-a-jwt"),
            Some(booking_body(&listing, "2024-01-01", "2024-01-02")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejects_empty_and_malformed_requests() {
    let app = TestApp::new();
    let host = app.user("host");
    let guest = app.user("guest");
    let listing = app.listing(&host, "2024-01-01", "2024-01-03").await;

    let (status, body) = app
        .send(
            "POST",
            "/bookings",
            Some(&guest),
            Some(booking_body(&listing, "2024-01-02", "2024-01-02")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "check-out must be after check-in");

    let (status, body) = app
        .send(
            "POST",
            "/bookings",
            Some(&guest),
            Some(json!({ "listingId": listing, "checkIn": "soon" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = app.send("GET", "/listings/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn cancel_frees_nights_for_rebooking() {
    let app = TestApp::new();
    let host = app.user("host");
    let guest = app.user("guest");
    let stranger = app.user("stranger");
    let listing = app.listing(&host, "2024-05-01", "2024-05-04").await;

    let (_, body) = app
        .send(
            "POST",
            "/bookings",
            Some(&guest),
            Some(booking_body(&listing, "2024-05-01", "2024-05-04")),
        )
        .await;
    let booking_id = body["booking"]["id"].as_str().unwrap().to_string();

    // Visible to guest and host only.
    let path = format!("/bookings/{booking_id}");
    let (status, _) = app.send("GET", &path, Some(&guest), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &path, Some(&host), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &path, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, hosted) = app
        .send("GET", &format!("/listings/{listing}/bookings"), Some(&host), None)
        .await;
    assert_eq!(hosted.as_array().unwrap().len(), 1);

    // The host cannot delete a listing with a live booking.
    let (status, _) = app
        .send("DELETE", &format!("/listings/{listing}"), Some(&host), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let cancel = format!("/bookings/{booking_id}/cancel");
    let (status, cancelled) = app.send("POST", &cancel, Some(&guest), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["totalPrice"], 300);
    assert_eq!(cancelled["dates"], json!([]));

    let (status, _) = app.send("POST", &cancel, Some(&guest), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            "POST",
            "/bookings",
            Some(&stranger),
            Some(booking_body(&listing, "2024-05-02", "2024-05-04")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn only_host_manages_listing() {
    let app = TestApp::new();
    let host = app.user("host");
    let guest = app.user("guest");
    let listing = app.listing(&host, "2024-01-01", "2024-01-03").await;
    let path = format!("/listings/{listing}");

    let (status, body) = app
        .send(
            "PUT",
            &format!("{path}/inventory"),
            Some(&guest),
            Some(json!({ "from": "2024-01-01", "to": "2024-01-02", "available": false })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send("PATCH", &path, Some(&guest), Some(json!({ "title": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .send(
            "PATCH",
            &path,
            Some(&host),
            Some(json!({ "title": "Lake cabin", "pricePerNight": 180 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Lake cabin");
    assert_eq!(updated["pricePerNight"], 180);
    assert_eq!(updated["description"], "By the lake");

    let (_, all) = app.send("GET", "/listings", None, None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = app.send("DELETE", &path, Some(&host), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send("GET", &path, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "listing not found");

    let (status, body) = app
        .send(
            "POST",
            "/bookings",
            Some(&guest),
            Some(booking_body(&listing, "2024-01-01", "2024-01-02")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], UNAVAILABLE);
}
