use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use chrono::Utc;
use log::{error, info, warn};
use serde_json::json;

use crate::calculator::CalculationRequest;
use crate::error::{ServiceError, StoreError};
use crate::service::CalculatorService;
use crate::store::QuotationStore;

const DEBUG_SAMPLE_SIZE: i64 = 5;

/// Failure of a request, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            ServiceError::Calculation(err) => write!(f, "{}", err),
            ServiceError::Store(_) => write!(f, "internal error while processing the request"),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            ServiceError::Calculation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::Calculation(cause) => warn!("Calculation rejected: {}", cause),
            ServiceError::Store(cause) => error!("Quotation store failed: {}", cause),
        }
        ApiError(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ServiceError::from(err).into()
    }
}

/// Mounts the calculator routes under `/api/calculator`.
pub fn configure<S>(cfg: &mut web::ServiceConfig)
where
    S: QuotationStore + 'static,
{
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let body = json!({ "error": err.to_string() });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    cfg.app_data(json_config).service(
        web::scope("/api/calculator")
            .route("/calculate", web::post().to(calculate::<S>))
            .route("/quotations", web::get().to(list_quotations::<S>))
            .route("/health", web::get().to(health))
            .route("/debug/dbinfo", web::get().to(db_info::<S>)),
    );
}

async fn calculate<S: QuotationStore>(
    service: web::Data<CalculatorService<S>>,
    request: web::Json<CalculationRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Received calculation request");
    let result = service.calculate(&request).await?;
    Ok(HttpResponse::Ok().json(result))
}

async fn list_quotations<S: QuotationStore>(
    service: web::Data<CalculatorService<S>>,
) -> Result<HttpResponse, ApiError> {
    info!("Listing quotations");
    let quotations = service.store().fetch_all().await?;
    Ok(HttpResponse::Ok().json(quotations))
}

async fn db_info<S: QuotationStore>(
    service: web::Data<CalculatorService<S>>,
) -> Result<HttpResponse, ApiError> {
    let total_rows = service.store().count().await?;
    let sample = service.store().sample(DEBUG_SAMPLE_SIZE).await?;
    Ok(HttpResponse::Ok().json(json!({ "total_rows": total_rows, "sample": sample })))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy", "timestamp": Utc::now() }))
}
