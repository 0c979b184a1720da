use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};

use crate::auth::{self, AppState};
use crate::{listings, messages, profile, session, users};

/// 10 MB cap for profile pictures and listing photos
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/shop", get(listings::shop))
        .route("/users", post(users::create_user))
        .route(
            "/users/{email}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/listings", post(listings::create_listing))
        .route(
            "/listings/{email}",
            get(listings::get_listing)
                .put(listings::update_listing)
                .delete(listings::delete_listing),
        )
        .route("/messages", post(messages::create_message))
        .route(
            "/messages/{message_id}",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        )
        .with_state(state.clone());

    let protected = Router::new()
        .route(
            "/dashboard",
            put(profile::update_profile).post(profile::create_listing),
        )
        .route("/get-user-profile", get(profile::get_user_profile))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ))
        .with_state(state);

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as B64;
    use chrono::Duration;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::auth::AppStateInner;
    use crate::session::SessionStore;
    use thrift_db::Database;

    use super::router;

    const BOUNDARY: &str = "thrift-test-boundary";

    fn test_app() -> Router {
        test_app_with_ttl(Duration::hours(1))
    }

    fn test_app_with_ttl(ttl: Duration) -> Router {
        router(Arc::new(AppStateInner {
            db: Database::open(Path::new(":memory:")).unwrap(),
            sessions: SessionStore::new(ttl),
            allowed_email_domain: "ecu.edu".into(),
        }))
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        }
    }

    async fn send_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        (status, body_json(res).await)
    }

    async fn send_get(app: &Router, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let res = app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        (status, body_json(res).await)
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"photo.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn send_multipart(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Vec<u8>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let res = app
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = res.status();
        (status, body_json(res).await)
    }

    async fn register(app: &Router, email: &str) -> Value {
        let (status, body) = send_json(
            app,
            "POST",
            "/register",
            json!({
                "first_name": "Pat",
                "last_name": "Jones",
                "email": email,
                "password": "hunter2!"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    /// Register + login, returning the session cookie pair.
    async fn register_and_login(app: &Router, email: &str) -> String {
        register(app, email).await;

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"email": email, "password": "hunter2!"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn register_rejects_foreign_email_domain() {
        let app = test_app();
        let (status, body) = send_json(
            &app,
            "POST",
            "/register",
            json!({
                "first_name": "A",
                "last_name": "B",
                "email": "a@gmail.com",
                "password": "p"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let app = test_app();
        let (status, body) = send_json(
            &app,
            "POST",
            "/register",
            json!({"first_name": "A", "email": "a@ecu.edu"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing fields");
    }

    #[tokio::test]
    async fn register_twice_fails_the_second_time() {
        let app = test_app();
        let body = register(&app, "a@ecu.edu").await;
        assert_eq!(body["status"], "success");
        assert!(body["user_id"].as_i64().is_some());

        let (status, body) = send_json(
            &app,
            "POST",
            "/register",
            json!({
                "first_name": "Pat",
                "last_name": "Jones",
                "email": "a@ecu.edu",
                "password": "hunter2!"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists or other database error.");
    }

    #[tokio::test]
    async fn login_failures_are_unauthorized() {
        let app = test_app();
        register(&app, "a@ecu.edu").await;

        // wrong password
        let (status, body) = send_json(
            &app,
            "POST",
            "/login",
            json!({"email": "a@ecu.edu", "password": "wrong"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        // unregistered email
        let (status, _) = send_json(
            &app,
            "POST",
            "/login",
            json!({"email": "ghost@ecu.edu", "password": "hunter2!"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let app = test_app();
        for _ in 0..2 {
            let (status, body) = send_json(&app, "POST", "/logout", json!({})).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "success");
        }
    }

    #[tokio::test]
    async fn logout_invalidates_the_session() {
        let app = test_app();
        let cookie = register_and_login(&app, "a@ecu.edu").await;

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let (status, _) = send_get(&app, "/get-user-profile", Some(&cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn dashboard_requires_a_session() {
        let app = test_app();
        let (status, body) =
            send_multipart(&app, "POST", "/dashboard", None, multipart_body(&[], None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "User not logged in");
    }

    #[tokio::test]
    async fn expired_sessions_are_anonymous() {
        let app = test_app_with_ttl(Duration::seconds(-1));
        let cookie = register_and_login(&app, "a@ecu.edu").await;

        let (status, _) = send_get(&app, "/get-user-profile", Some(&cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_resources_return_not_found() {
        let app = test_app();

        let (status, body) = send_get(&app, "/users/ghost@ecu.edu", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, body) = send_get(&app, "/listings/ghost@ecu.edu", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Listing not found");

        let (status, body) = send_get(&app, "/messages/9999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Message not found");
    }

    #[tokio::test]
    async fn user_responses_never_carry_password_material() {
        let app = test_app();
        register(&app, "a@ecu.edu").await;

        let (status, body) = send_get(&app, "/users/a@ecu.edu", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "a@ecu.edu");
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn user_update_validates_then_succeeds() {
        let app = test_app();
        register(&app, "a@ecu.edu").await;

        let (status, _) = send_json(&app, "PUT", "/users/a@ecu.edu", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send_json(&app, "PUT", "/users/ghost@ecu.edu", json!({"bio": "hi"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send_json(&app, "PUT", "/users/a@ecu.edu", json!({"bio": "hi"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User updated");

        let (_, body) = send_get(&app, "/users/a@ecu.edu", None).await;
        assert_eq!(body["bio"], "hi");
        assert_eq!(body["first_name"], "Pat");
    }

    #[tokio::test]
    async fn user_delete_then_fetch_is_not_found() {
        let app = test_app();
        register(&app, "a@ecu.edu").await;

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/users/a@ecu.edu")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let (status, _) = send_get(&app, "/users/a@ecu.edu", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_flow_through_dashboard_and_shop() {
        let app = test_app();
        let cookie = register_and_login(&app, "a@ecu.edu").await;
        let photo: &[u8] = &[0x89, 0x50, 0x4e, 0x47];

        // missing required fields
        let (status, _) = send_multipart(
            &app,
            "POST",
            "/dashboard",
            Some(&cookie),
            multipart_body(&[("quality", "Good")], None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let fields = [
            ("quality", "Good"),
            ("description", "Desk lamp"),
            ("asking_price", "12.5"),
        ];
        let (status, body) = send_multipart(
            &app,
            "POST",
            "/dashboard",
            Some(&cookie),
            multipart_body(&fields, Some(("photo", photo))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Listing created");

        // the email-keyed schema allows one listing per user
        let (status, _) = send_multipart(
            &app,
            "POST",
            "/dashboard",
            Some(&cookie),
            multipart_body(&fields, None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // shop context carries the photo as base64 text
        let (status, body) = send_get(&app, "/shop", None).await;
        assert_eq!(status, StatusCode::OK);
        let products = body.as_array().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["email"], "a@ecu.edu");
        assert_eq!(products[0]["photo"], B64.encode(photo));
        assert_eq!(products[0]["asking_price"], 12.5);
    }

    #[tokio::test]
    async fn profile_update_roundtrips_the_picture() {
        let app = test_app();
        let cookie = register_and_login(&app, "a@ecu.edu").await;
        let picture: &[u8] = &[1, 2, 3, 4, 5];

        let (status, body) = send_multipart(
            &app,
            "PUT",
            "/dashboard",
            Some(&cookie),
            multipart_body(&[("bio", "Selling my stuff")], Some(("profile_picture", picture))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Profile updated successfully");

        let (status, body) = send_get(&app, "/get-user-profile", Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bio"], "Selling my stuff");
        assert_eq!(body["profile_picture"], B64.encode(picture));
    }

    #[tokio::test]
    async fn message_crud_by_id() {
        let app = test_app();
        register(&app, "a@ecu.edu").await;
        register(&app, "b@ecu.edu").await;

        let (status, body) = send_json(
            &app,
            "POST",
            "/messages",
            json!({
                "sender_id": "a@ecu.edu",
                "receiver_id": "b@ecu.edu",
                "message_text": "is the lamp still available?"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["message_id"].as_i64().unwrap();

        let (status, body) = send_get(&app, &format!("/messages/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message_text"], "is the lamp still available?");
        assert_eq!(body["sender_id"], "a@ecu.edu");

        let (status, _) = send_json(
            &app,
            "PUT",
            &format!("/messages/{id}"),
            json!({"message_text": "never mind"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/messages/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let (status, _) = send_get(&app, &format!("/messages/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn message_create_requires_known_participants() {
        let app = test_app();
        register(&app, "a@ecu.edu").await;

        let (status, _) = send_json(
            &app,
            "POST",
            "/messages",
            json!({
                "sender_id": "a@ecu.edu",
                "receiver_id": "ghost@ecu.edu",
                "message_text": "hello?"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
