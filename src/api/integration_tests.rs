//! Router-level tests: every request goes through the real extractors,
//! policy and an in-memory database.

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api::{AppContext, AppState, create_router};
use crate::auth::Identity;
use crate::config::{AuthSettings, DEFAULT_TOKEN_TTL};
use crate::db::{DatabaseConfig, create_connection, ensure_schema};
use crate::types::UserId;

struct Fixture {
    app: Router,
    state: AppState,
}

impl Fixture {
    async fn new() -> Self {
        let db = create_connection(DatabaseConfig::memory()).await.unwrap();
        ensure_schema(&db).await.unwrap();
        let settings = AuthSettings::new("integration-secret", DEFAULT_TOKEN_TTL).unwrap();
        let state = AppContext::new(db, &settings);
        Self {
            app: create_router(state.clone()),
            state,
        }
    }

    /// Sign up a plain user and return its id and a bearer token.
    async fn user(&self, email: &str) -> (UserId, String) {
        let user = self.state.users.signup(email, "secret1", None).await.unwrap();
        let token = self
            .state
            .codec()
            .issue_default(&Identity::new(user.id.clone(), user.role))
            .unwrap();
        (user.id, token)
    }

    async fn admin(&self, email: &str) -> (UserId, String) {
        self.state.users.signup(email, "secret1", None).await.unwrap();
        let admin = self.state.users.promote(email).await.unwrap().unwrap();
        let token = self
            .state
            .codec()
            .issue_default(&Identity::new(admin.id.clone(), admin.role))
            .unwrap();
        (admin.id, token)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn log_period(&self, token: &str, user_id: &UserId, start: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/period-tracking/log",
                Some(token),
                Some(json!({ "userId": user_id, "startDate": start })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }
}

#[tokio::test]
async fn test_root_health_and_fallback() {
    let fx = Fixture::new().await;

    let (status, body) = fx.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sakhi Backend API running");

    let (status, body) = fx.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = fx.send(Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_signup_and_login_flow() {
    let fx = Fixture::new().await;

    let (status, body) = fx
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "amy@example.com", "password": "secret1", "name": "Amy" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "USER");
    assert_eq!(body["user"]["name"], "Amy");
    assert!(body["user"].get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    let (status, body) = fx
        .send(
            Method::POST,
            "/api/users/signup",
            None,
            Some(json!({ "email": "amy@example.com", "password": "other12" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already in use");

    let (status, body) = fx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "amy@example.com", "password": "wrong99" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = fx
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({ "email": "amy@example.com", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());

    let uri = format!("/api/users/profile/{}", user_id);
    let (status, body) = fx.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "amy@example.com");
}

#[tokio::test]
async fn test_signup_validation() {
    let fx = Fixture::new().await;

    let (status, body) = fx
        .send(
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "email": "not-an-email", "password": "123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid data");
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);

    let (status, _) = fx
        .send(Method::POST, "/api/auth/signup", None, Some(json!({ "email": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gate_rejections() {
    let fx = Fixture::new().await;
    let (user_id, token) = fx.user("a@example.com").await;
    let uri = format!("/api/period-tracking/history/{}", user_id);

    let (status, body) = fx.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing or invalid Authorization header");

    let (status, body) = fx.send(Method::GET, &uri, Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");

    // Change the first character of the signature.
    let at = token.rfind('.').unwrap() + 1;
    let mut bytes = token.clone().into_bytes();
    bytes[at] = if bytes[at] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();
    let (status, _) = fx.send(Method::GET, &uri, Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = fx.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_history_and_prediction() {
    let fx = Fixture::new().await;
    let (alice, token) = fx.user("alice@example.com").await;

    let uri = format!("/api/period-tracking/prediction/{}", alice);
    fx.log_period(&token, &alice, "2024-01-29").await;
    let (status, body) = fx.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Not enough data to predict" }));

    fx.log_period(&token, &alice, "2024-02-26T06:00:00Z").await;
    fx.log_period(&token, &alice, "2024-01-01").await;

    let (status, body) = fx.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "averageCycleLengthDays": 28,
            "lastPeriodStart": "2024-02-26",
            "predictedNextPeriod": "2024-03-25",
        })
    );

    let history = format!("/api/period-tracking/history/{}", alice);
    let (status, body) = fx.send(Method::GET, &history, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let starts: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|log| log["startDate"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(starts, vec!["2024-02-26", "2024-01-29", "2024-01-01"]);
}

#[tokio::test]
async fn test_cross_user_access_is_forbidden_unless_admin() {
    let fx = Fixture::new().await;
    let (alice, alice_token) = fx.user("alice@example.com").await;
    let (_, bob_token) = fx.user("bob@example.com").await;
    let (_, admin_token) = fx.admin("admin@example.com").await;

    fx.log_period(&alice_token, &alice, "2024-01-01").await;

    let history = format!("/api/period-tracking/history/{}", alice);
    let (status, body) = fx.send(Method::GET, &history, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden");

    let (status, body) = fx.send(Method::GET, &history, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Bob cannot log on Alice's behalf.
    let (status, _) = fx
        .send(
            Method::POST,
            "/api/period-tracking/log",
            Some(&bob_token),
            Some(json!({ "userId": alice, "startDate": "2024-02-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let profile = format!("/api/users/profile/{}", alice);
    let (status, _) = fx.send(Method::GET, &profile, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = fx.send(Method::GET, &profile, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_existence_is_checked_before_ownership() {
    let fx = Fixture::new().await;
    let (alice, alice_token) = fx.user("alice@example.com").await;
    let (_, bob_token) = fx.user("bob@example.com").await;
    let (_, admin_token) = fx.admin("admin@example.com").await;

    for token in [bob_token.as_str(), admin_token.as_str()] {
        let (status, body) = fx
            .send(Method::DELETE, "/api/period-tracking/missing", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Log not found");

        let (status, _) = fx
            .send(Method::DELETE, "/api/reminders/missing", Some(token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = fx
            .send(
                Method::PUT,
                "/api/users/profile/missing",
                Some(token),
                Some(json!({ "name": "x" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let log = fx.log_period(&alice_token, &alice, "2024-01-01").await;
    let uri = format!("/api/period-tracking/{}", log["id"].as_str().unwrap());

    let (status, _) = fx.send(Method::DELETE, &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = fx.send(Method::DELETE, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deleted");

    let (status, _) = fx.send(Method::DELETE, &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_keeps_owner() {
    let fx = Fixture::new().await;
    let (alice, alice_token) = fx.user("alice@example.com").await;
    let (bob, _) = fx.user("bob@example.com").await;

    let log = fx.log_period(&alice_token, &alice, "2024-01-01").await;
    let uri = format!("/api/period-tracking/{}", log["id"].as_str().unwrap());

    let (status, body) = fx
        .send(
            Method::PUT,
            &uri,
            Some(&alice_token),
            Some(json!({ "userId": bob, "notes": "heavy", "endDate": "2024-01-04" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], alice.as_str());
    assert_eq!(body["notes"], "heavy");
    assert_eq!(body["endDate"], "2024-01-04");
    assert_eq!(body["startDate"], "2024-01-01");

    let (status, _) = fx
        .send(
            Method::PUT,
            &uri,
            Some(&alice_token),
            Some(json!({ "endDate": "2023-12-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reminders() {
    let fx = Fixture::new().await;
    let (alice, alice_token) = fx.user("alice@example.com").await;
    let (_, bob_token) = fx.user("bob@example.com").await;

    for (title, at) in [("Evening pill", "2024-05-01T20:00:00Z"), ("Morning pill", "2024-05-01T08:00:00Z")] {
        let (status, _) = fx
            .send(
                Method::POST,
                "/api/reminders",
                Some(&alice_token),
                Some(json!({ "userId": alice, "type": "MEDICATION", "title": title, "remindAt": at })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = fx
        .send(
            Method::POST,
            "/api/reminders",
            Some(&alice_token),
            Some(json!({ "userId": alice, "type": "BIRTHDAY", "title": "Party", "remindAt": "2024-05-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/reminders/{}", alice);
    let (status, body) = fx.send(Method::GET, &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let reminders = body.as_array().unwrap();
    assert_eq!(reminders[0]["title"], "Morning pill");
    assert_eq!(reminders[1]["title"], "Evening pill");
    assert_eq!(reminders[0]["type"], "MEDICATION");

    let (status, _) = fx.send(Method::GET, &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let reminder_uri = format!("/api/reminders/{}", reminders[0]["id"].as_str().unwrap());
    let (status, _) = fx
        .send(
            Method::PUT,
            &reminder_uri,
            Some(&bob_token),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = fx
        .send(
            Method::PUT,
            &reminder_uri,
            Some(&alice_token),
            Some(json!({ "title": "Morning vitamins", "type": "CUSTOM" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Morning vitamins");
    assert_eq!(body["type"], "CUSTOM");
}

#[tokio::test]
async fn test_wellness_publishing_requires_admin() {
    let fx = Fixture::new().await;
    let (_, user_token) = fx.user("reader@example.com").await;
    let (_, admin_token) = fx.admin("editor@example.com").await;

    let article = json!({ "title": "Cycle basics", "content": "What a typical cycle looks like." });
    let (status, body) = fx
        .send(Method::POST, "/api/health-wellness/articles", Some(&user_token), Some(article.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, published) = fx
        .send(Method::POST, "/api/health-wellness/articles", Some(&admin_token), Some(article))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(published["isPublished"], true);

    let (status, draft) = fx
        .send(
            Method::POST,
            "/api/health-wellness/articles",
            Some(&admin_token),
            Some(json!({ "title": "Draft", "content": "Not ready for readers yet.", "isPublished": false })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = fx.send(Method::GET, "/api/health-wellness/articles", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/api/health-wellness/articles/{}", draft["id"].as_str().unwrap());
    let (status, _) = fx.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/health-wellness/articles/{}", published["id"].as_str().unwrap());
    let (status, _) = fx.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = fx
        .send(
            Method::POST,
            "/api/health-wellness/resources",
            Some(&admin_token),
            Some(json!({ "title": "Helpline", "url": "not a url" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = fx
        .send(
            Method::POST,
            "/api/health-wellness/tips",
            Some(&admin_token),
            Some(json!({ "content": "Drink water", "category": "hydration" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, tips) = fx.send(Method::GET, "/api/health-wellness/tips", None, None).await;
    assert_eq!(tips[0]["content"], "Drink water");
}

#[tokio::test]
async fn test_community_posts_and_comments() {
    let fx = Fixture::new().await;
    let (alice, alice_token) = fx.user("alice@example.com").await;
    let (_, bob_token) = fx.user("bob@example.com").await;

    let (status, post) = fx
        .send(
            Method::POST,
            "/api/community/posts",
            Some(&alice_token),
            Some(json!({ "title": "Hello", "content": "Glad to be here with you all." })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["userId"], alice.as_str());
    let post_id = post["id"].as_str().unwrap().to_string();

    let (status, _) = fx
        .send(
            Method::POST,
            "/api/community/comments",
            Some(&bob_token),
            Some(json!({ "postId": "missing", "content": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = fx
        .send(
            Method::POST,
            "/api/community/comments",
            Some(&bob_token),
            Some(json!({ "postId": post_id, "content": "Welcome!" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = fx.send(Method::GET, "/api/community/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["comments"][0]["content"], "Welcome!");

    let uri = format!("/api/community/posts/{}", post_id);
    let (status, _) = fx.send(Method::DELETE, &uri, Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = fx.send(Method::DELETE, &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = fx.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_checks_on_logs_and_reminders() {
    let fx = Fixture::new().await;
    let (alice, alice_token) = fx.user("alice@example.com").await;
    let (_, bob_token) = fx.user("bob@example.com").await;
    let (admin, admin_token) = fx.admin("admin@example.com").await;

    let log = fx.log_period(&alice_token, &alice, "2024-01-01").await;
    let (status, reminder) = fx
        .send(
            Method::POST,
            "/api/reminders",
            Some(&alice_token),
            Some(json!({
                "userId": alice,
                "type": "PERIOD",
                "title": "Cycle due",
                "remindAt": "2024-01-28T08:00:00Z",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let cases = [
        (
            format!("/api/period-tracking/history/{}", alice),
            format!("/api/period-tracking/{}", log["id"].as_str().unwrap()),
            json!({ "userId": admin, "notes": "reviewed" }),
        ),
        (
            format!("/api/reminders/{}", alice),
            format!("/api/reminders/{}", reminder["id"].as_str().unwrap()),
            json!({ "userId": admin, "title": "Reviewed reminder" }),
        ),
    ];

    for (list_uri, item_uri, patch) in cases {
        let (status, _) = fx.send(Method::GET, &list_uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "GET {}", list_uri);
        let (status, _) = fx
            .send(Method::PUT, &item_uri, Some(&bob_token), Some(patch.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "PUT {}", item_uri);
        let (status, _) = fx.send(Method::DELETE, &item_uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "DELETE {}", item_uri);

        let (status, body) = fx.send(Method::GET, &list_uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK, "GET {}", list_uri);
        assert_eq!(body[0]["userId"], alice.as_str());

        let (status, body) = fx
            .send(Method::PUT, &item_uri, Some(&admin_token), Some(patch))
            .await;
        assert_eq!(status, StatusCode::OK, "PUT {}", item_uri);
        assert_eq!(body["userId"], alice.as_str());

        let (status, body) = fx.send(Method::DELETE, &item_uri, Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK, "DELETE {}", item_uri);
        assert_eq!(body["message"], "Deleted");

        let (status, body) = fx.send(Method::GET, &list_uri, Some(&alice_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}
