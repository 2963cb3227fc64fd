//! End-to-end session lifecycle over the HTTP surface: refresh and logout
//! endpoints, the auth middleware and the user-id extractor, all backed by the
//! in-memory refresh token store so no database is needed.

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{test, web, App, HttpResponse, Responder};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use taskhive::auth::extractors::AuthenticatedUserId;
use taskhive::auth::{AuthMiddleware, MemoryRefreshTokenStore, SessionManager, TokenEncoder};
use taskhive::config::AuthConfig;
use taskhive::routes;

fn test_sessions() -> SessionManager {
    SessionManager::new(
        TokenEncoder::new(&AuthConfig {
            jwt_secret: "lifecycle-test-secret".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
        }),
        Arc::new(MemoryRefreshTokenStore::new()),
    )
}

/// Minimal protected handler exercising the middleware + extractor pair.
async fn whoami(user: AuthenticatedUserId) -> impl Responder {
    HttpResponse::Ok().json(json!({ "user_id": user.0 }))
}

macro_rules! test_app {
    ($sessions:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($sessions.clone()))
                .wrap(Logger::default())
                .service(routes::health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .service(
                            web::scope("/auth")
                                .service(routes::auth::refresh)
                                .service(routes::auth::logout),
                        )
                        .route("/whoami", web::get().to(whoami)),
                ),
        )
        .await
    };
}

/// Middleware rejections surface as service errors in tests; fold both shapes
/// into a status code.
async fn call_status<S, R, B>(app: &S, req: R) -> StatusCode
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}

#[actix_rt::test]
async fn test_full_session_lifecycle() {
    let sessions = test_sessions();
    let app = test_app!(sessions);

    let user_id = Uuid::new_v4();
    let first = sessions.issue(user_id).await.unwrap();

    // The access token authenticates protected requests
    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .append_header(("Authorization", format!("Bearer {}", first.access_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["user_id"], json!(user_id));

    // Rotate: the refresh endpoint returns a fresh, distinct pair
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": first.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(rotated["token_type"], "bearer");
    let access2 = rotated["access_token"].as_str().unwrap().to_string();
    let refresh2 = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(access2, first.access_token);
    assert_ne!(refresh2, first.refresh_token);

    // Replaying the rotated refresh token is reuse
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": first.refresh_token }))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);

    // The rotated access token works
    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .append_header(("Authorization", format!("Bearer {}", access2)))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::OK);

    // Logout revokes the live refresh token
    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .set_json(json!({ "refresh_token": refresh2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The logged-out token no longer refreshes
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": refresh2 }))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);

    // A fresh issue for the same user is unaffected by the dead session
    let third = sessions.issue(user_id).await.unwrap();
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": third.refresh_token }))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::OK);
}

#[actix_rt::test]
async fn test_protected_route_rejects_bad_credentials() {
    let sessions = test_sessions();
    let app = test_app!(sessions);

    // No token at all
    let req = test::TestRequest::get().uri("/api/whoami").to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);

    // Garbage token
    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .append_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);

    // A refresh token is not an access token
    let pair = sessions.issue(Uuid::new_v4()).await.unwrap();
    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .append_header(("Authorization", format!("Bearer {}", pair.refresh_token)))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);

    // Health stays open
    let req = test::TestRequest::get().uri("/health").to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::OK);
}

#[actix_rt::test]
async fn test_refresh_endpoint_rejects_malformed_tokens() {
    let sessions = test_sessions();
    let app = test_app!(sessions);

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": "definitely-not-a-token" }))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);

    // An access token presented at the refresh endpoint is a type confusion
    let pair = sessions.issue(Uuid::new_v4()).await.unwrap();
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": pair.access_token }))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);

    // Logout on garbage also fails to parse
    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .set_json(json!({ "refresh_token": "garbage" }))
        .to_request();
    assert_eq!(call_status(&app, req).await, StatusCode::UNAUTHORIZED);
}
