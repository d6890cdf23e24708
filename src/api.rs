use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use relief_core::{Beneficiary, Disaster, DocumentId, DocumentStore, Donation, Entity, StorageError, Summary, Volunteer};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::{
    reporting::{ReportError, Reporting},
    repository::Repository,
    telemetry,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, metrics: None }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Report(ReportError),
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Report(e) => {
                tracing::error!(error = %e, "Summary failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Storage(_) | ApiError::Task(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage failure".to_string())
            }
        };
        (status, Json(ErrorBody { success: false, error: message })).into_response()
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::Storage(e) => ApiError::Storage(e),
            other => ApiError::Report(other),
        }
    }
}

/// Store calls block, so they run on the blocking pool.
async fn run_blocking<T, E, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?.map_err(Into::into)
}

pub fn router(state: AppState) -> Router {
    let mut app: Router<AppState> = Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/metrics", get(telemetry::render_metrics))
        .route("/api/reporting/summary", get(summary));

    app = entity_routes::<Donation>(app);
    app = entity_routes::<Beneficiary>(app);
    app = entity_routes::<Volunteer>(app);
    app = entity_routes::<Disaster>(app);

    app.layer(middleware::from_fn(telemetry::track_metrics))
        .with_state(state)
}

fn entity_routes<E: Entity>(router: Router<AppState>) -> Router<AppState> {
    router
        .route(&format!("/api/{}", E::ROUTE), get(list::<E>).post(create::<E>))
        .route(
            &format!("/api/{}/:id", E::ROUTE),
            get(get_one::<E>).put(update::<E>).delete(remove::<E>),
        )
}

async fn banner() -> &'static str {
    "Disaster relief API is running"
}

async fn health(State(state): State<AppState>) -> Response {
    let store = state.store.clone();
    match run_blocking(move || store.collections()).await {
        Ok(collections) => Json(json!({ "status": "ok", "collections": collections })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" }))).into_response()
        }
    }
}

async fn summary(State(state): State<AppState>) -> Result<Json<Summary>, ApiError> {
    let reporting = Reporting::new(state.store.clone());
    let summary = run_blocking(move || reporting.summarize()).await?;
    tracing::debug!("Summary report{}", summary);
    Ok(Json(summary))
}

async fn list<E: Entity>(State(state): State<AppState>) -> Result<Json<Vec<E>>, ApiError> {
    let repo = Repository::<E>::new(state.store.clone());
    Ok(Json(run_blocking(move || repo.list_all()).await?))
}

async fn get_one<E: Entity>(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<E>, ApiError> {
    let repo = Repository::<E>::new(state.store.clone());
    let lookup = id.clone();
    run_blocking(move || repo.get_by_id(&lookup))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { kind: E::ROUTE, id })
}

async fn create<E: Entity>(State(state): State<AppState>, Json(entity): Json<E>) -> Result<Response, ApiError> {
    let repo = Repository::<E>::new(state.store.clone());
    let created = run_blocking(move || repo.create(entity)).await?;
    let id = created.id().unwrap_or_default().to_string();
    tracing::info!(kind = E::ROUTE, id = %id, "Record created");

    let location = format!("/api/{}/{}", E::ROUTE, id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)).into_response())
}

/// Full replace. The path id wins over any id in the body and is echoed back
/// in its canonical form.
async fn update<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut entity): Json<E>,
) -> Result<Json<E>, ApiError> {
    let Some(canonical) = DocumentId::parse(&id) else {
        return Err(ApiError::NotFound { kind: E::ROUTE, id });
    };
    entity.set_id(Some(canonical.to_string()));
    let repo = Repository::<E>::new(state.store.clone());
    let (target, replacement) = (id.clone(), entity.clone());
    if run_blocking(move || repo.replace(&target, &replacement)).await? {
        Ok(Json(entity))
    } else {
        Err(ApiError::NotFound { kind: E::ROUTE, id })
    }
}

async fn remove<E: Entity>(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let repo = Repository::<E>::new(state.store.clone());
    let target = id.clone();
    if run_blocking(move || repo.delete(&target)).await? {
        tracing::info!(kind = E::ROUTE, id = %id, "Record deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound { kind: E::ROUTE, id })
    }
}
