use actix_web::{get, HttpResponse, Responder};
use serde_json::json;

/// Liveness probe. Carries no auth and touches no state.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok"
    }))
}

/// Service banner at the root, pointing callers at the useful entry points.
#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "TaskHive API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health"
    }))
}
