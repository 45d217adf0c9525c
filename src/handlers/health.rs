use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::handlers::AppState;
use crate::models::HealthResponse;

/// Health check endpoint
pub async fn health_check(state: web::Data<Arc<AppState>>) -> impl Responder {
    let models = state.models.lock().unwrap();
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        top10_model_loaded: models.has_top10(),
        dnf_model_loaded: models.has_dnf(),
    };

    HttpResponse::Ok().json(response)
}
