//! REST API endpoint for scraping claim pages

use actix_web::{HttpResponse, post, web};

use crate::api::error::{ApiError, ErrorResponse};
use crate::model::{ClaimRecord, ScrapeRequest};
use crate::service::ScrapeService;

/// Scrape a settlement page and extract claim details
#[utoipa::path(
    post,
    path = "/scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Claim details extracted", body = ClaimRecord),
        (status = 500, description = "Scraping failed", body = ErrorResponse)
    ),
    tag = "scrape"
)]
#[post("/scrape")]
pub async fn scrape(
    service: web::Data<ScrapeService>,
    request: web::Json<ScrapeRequest>,
) -> Result<HttpResponse, ApiError> {
    let record = service.scrape(&request.url).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Configure scrape routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(scrape);
}
