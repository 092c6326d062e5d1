use actix_web::{get, HttpResponse};
use serde_json::json;

/// Liveness probe, mounted outside the auth scope.
#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "OK" }))
}
