//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::error::ErrorResponse;
use crate::api::health::{DependencyHealth, HealthStatus, ReadinessStatus};
use crate::model::{ClaimRecord, ScrapeRequest};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Claim Scraper API",
        description = "Extracts class-action settlement claim details from web pages"
    ),
    paths(
        crate::api::scrape::scrape,
        crate::api::health::liveness,
        crate::api::health::readiness
    ),
    components(schemas(
        ClaimRecord,
        ScrapeRequest,
        ErrorResponse,
        HealthStatus,
        ReadinessStatus,
        DependencyHealth
    )),
    tags(
        (name = "scrape", description = "Claim page scraping"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> impl Responder {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
