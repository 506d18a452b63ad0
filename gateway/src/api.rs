use std::sync::Arc;

use ::metrics::prometheus::{self, Encoder, Registry, TextEncoder};
use actix_web::{
    App, HttpResponse, HttpServer, Responder, ResponseError, error::InternalError, get,
    http::StatusCode, post, web,
};
use da_gateway_client::protocol::MAX_FRAME_LENGTH;
use serde::{Deserialize, Serialize};
use services::{ErrorKind, types::Submission};

use crate::{
    config::Config,
    dispatch::Dispatcher,
    errors::{Error, Result},
};

pub async fn launch_api_server(
    config: &Config,
    metrics_registry: Registry,
    dispatcher: Arc<Dispatcher>,
) -> Result<()> {
    let metrics_registry = Arc::new(metrics_registry);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(Arc::clone(&metrics_registry)))
            .app_data(web::Data::new(Arc::clone(&dispatcher)))
            .configure(routes)
    })
    .bind((config.app.host, config.app.port))
    .map_err(|e| Error::Other(e.to_string()))?
    .run()
    .await
    .map_err(|e| Error::Other(e.to_string()))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_FRAME_LENGTH)
            .error_handler(|err, _| {
                ApiError(services::Error::InvalidInput(err.to_string())).into()
            }),
    )
    .service(rollup_with_type)
    .service(retrieve_with_type)
    .service(healthz)
    .service(health)
    .service(metrics);
}

#[derive(Debug, Deserialize)]
struct RollupRequest {
    da_type: i64,
    /// Base64 encoded payload.
    data: String,
}

#[derive(Debug, Deserialize)]
struct RetrieveRequest {
    da_type: i64,
    /// Reference returned by the submission.
    args: String,
}

#[derive(Debug, Serialize)]
struct RetrieveResponse {
    data: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

/// Renders a [`services::Error`] with a status derived from its kind.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] services::Error);

pub fn status_code(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::UnknownBackendType => StatusCode::BAD_REQUEST,
        ErrorKind::BackendNotPrepared => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::StillPending => StatusCode::ACCEPTED,
        ErrorKind::PermanentBackendFailure => StatusCode::GONE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::NotRunning | ErrorKind::AlreadyStopped | ErrorKind::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::SubmissionFailed | ErrorKind::RetrievalFailed | ErrorKind::Network => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_code(self.0.kind())
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            kind: self.0.kind(),
            message: self.0.to_string(),
        })
    }
}

#[post("/api/v1/rollup-with-type")]
async fn rollup_with_type(
    dispatcher: web::Data<Arc<Dispatcher>>,
    request: web::Json<RollupRequest>,
) -> std::result::Result<web::Json<Submission>, ApiError> {
    let submission = dispatcher.submit(request.da_type, &request.data).await?;

    Ok(web::Json(submission))
}

#[post("/api/v1/retrieve-with-type")]
async fn retrieve_with_type(
    dispatcher: web::Data<Arc<Dispatcher>>,
    request: web::Json<RetrieveRequest>,
) -> std::result::Result<web::Json<RetrieveResponse>, ApiError> {
    let RetrieveRequest { da_type, args } = request.into_inner();
    let data = dispatcher.retrieve(da_type, args).await?;

    Ok(web::Json(RetrieveResponse { data }))
}

#[get("/healthz")]
async fn healthz() -> impl Responder {
    "ok"
}

#[get("/health")]
async fn health(dispatcher: web::Data<Arc<Dispatcher>>) -> impl Responder {
    let report = dispatcher.health_report();

    let mut response = if report.is_healthy() {
        HttpResponse::Ok()
    } else {
        HttpResponse::InternalServerError()
    };

    response.json(report)
}

#[get("/metrics")]
async fn metrics(registry: web::Data<Arc<Registry>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let mut buf: Vec<u8> = vec![];
    let mut encode = |metrics: &_| {
        encoder
            .encode(metrics, &mut buf)
            .map_err(map_to_internal_err)
    };

    encode(&registry.gather())?;
    encode(&prometheus::gather())?;

    let text = String::from_utf8(buf).map_err(map_to_internal_err)?;

    std::result::Result::<_, InternalError<_>>::Ok(text)
}

fn map_to_internal_err(error: impl std::error::Error) -> InternalError<String> {
    InternalError::new(error.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
}
