//! Integration tests for Parkline.
//!
//! Provides [`TestServer`], an in-process HTTP service that speaks the
//! parking REST contract on top of [`DemoBackend`]. Tests point a
//! `RemoteBackend` at it to exercise the real wire path without any
//! external service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p parkline-integration-tests
//! ```
//!
//! # Route Structure
//!
//! ```text
//! POST   /api/auth/login              - Issue a bearer token
//! POST   /api/auth/register           - Create an account
//!
//! GET    /api/admin/dashboard         - Platform statistics
//! GET    /api/admin/parking-lots      - All lots
//! POST   /api/admin/parking-lots      - Create lot
//! PUT    /api/admin/parking-lots/{id} - Update lot
//! DELETE /api/admin/parking-lots/{id} - Delete lot
//! GET    /api/admin/users             - Registered accounts
//!
//! GET    /api/user/parking-lots       - Bookable lots
//! POST   /api/user/book               - Book a spot
//! PUT    /api/user/release/{id}       - Release a spot
//! GET    /api/user/my-reservations    - Reservation history
//! GET    /api/user/export-csv         - History as CSV
//!
//! GET    /api/scheduler/status        - Scheduler status
//! GET    /api/scheduler/trigger/{job} - Run a job now
//! ```
//!
//! Any path can be given a canned response with [`TestServer::fail_path`]
//! or [`TestServer::respond_with`], which replaces the real handler until
//! the server is dropped.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use parkline_app::models::{
    LotInput, RegistrationForm, SchedulerJob, SchedulerStatus, Session, ValidLotInput,
};
use parkline_app::{AppError, DemoBackend, ParkingBackend};
use parkline_core::{LotId, ReservationId};

/// Jobs the test scheduler reports.
pub const SCHEDULED_JOBS: [&str; 2] = ["daily_reminders", "monthly_reports"];

// =============================================================================
// Errors
// =============================================================================

/// Error returned by a handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
enum ApiError {
    MissingToken,
    UnknownJob(String),
    App(AppError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid token".to_string(),
            ),
            Self::UnknownJob(job) => (StatusCode::NOT_FOUND, format!("Job {job} not found")),
            Self::App(err) => {
                let status = match &err {
                    AppError::Validation(_)
                    | AppError::CapacityExhausted { .. }
                    | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
                    AppError::NotFound(_) => StatusCode::NOT_FOUND,
                    AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = match err {
                    AppError::Unauthorized(reason) => reason,
                    AppError::CapacityExhausted { .. } => "No slots available".to_string(),
                    other => other.user_message(),
                };
                (status, message)
            }
        };

        tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
        (status, Json(json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// State
// =============================================================================

#[derive(Clone)]
struct ServerState {
    backend: Arc<DemoBackend>,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    triggered: Arc<Mutex<Vec<String>>>,
    canned: Arc<Mutex<HashMap<String, (StatusCode, Value)>>>,
}

impl ServerState {
    /// Resolve the bearer token on a request to the session it was issued for.
    async fn session(&self, headers: &HeaderMap) -> ApiResult<Session> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::MissingToken)?;
        self.sessions
            .lock()
            .await
            .get(token)
            .cloned()
            .ok_or(ApiError::MissingToken)
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct BookBody {
    lot_id: LotId,
}

/// Re-run form validation on a lot body the client already validated.
fn validated(input: ValidLotInput) -> Result<ValidLotInput, AppError> {
    LotInput {
        name: input.name,
        address: input.address,
        postal_code: input.postal_code,
        price_per_hour: input.price_per_hour.to_string(),
        total_spots: input.total_spots.to_string(),
    }
    .validate()
}

// =============================================================================
// Auth Handlers
// =============================================================================

async fn login(State(state): State<ServerState>, Json(body): Json<LoginBody>) -> ApiResult<Json<Value>> {
    if body.password.is_empty() {
        return Err(AppError::Validation("Please enter username and password".to_string()).into());
    }
    let session = state.backend.login(&body.username, &body.password).await?;
    let token = uuid::Uuid::new_v4().to_string();
    let user = session.identity().clone();
    state.sessions.lock().await.insert(token.clone(), session);
    Ok(Json(json!({ "access_token": token, "user": user })))
}

async fn register(
    State(state): State<ServerState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let registration = RegistrationForm {
        confirm_password: body.password.clone(),
        username: body.username,
        email: body.email,
        password: body.password,
    }
    .validate()?;
    state.backend.register(&registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

// =============================================================================
// Admin Handlers
// =============================================================================

async fn dashboard(State(state): State<ServerState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let session = state.session(&headers).await?;
    let stats = state.backend.dashboard_stats(&session).await?;
    Ok(Json(json!(stats)))
}

async fn admin_lots(State(state): State<ServerState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let session = state.session(&headers).await?;
    let lots = state.backend.admin_lots(&session).await?;
    Ok(Json(json!({ "parking_lots": lots })))
}

async fn create_lot(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(input): Json<ValidLotInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let session = state.session(&headers).await?;
    let lot = state.backend.create_lot(&session, &validated(input)?).await?;
    Ok((StatusCode::CREATED, Json(json!({ "parking_lot": lot }))))
}

async fn update_lot(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ValidLotInput>,
) -> ApiResult<Json<Value>> {
    let session = state.session(&headers).await?;
    let lot = state
        .backend
        .update_lot(&session, LotId::new(id), &validated(input)?)
        .await?;
    Ok(Json(json!({ "parking_lot": lot })))
}

async fn delete_lot(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let session = state.session(&headers).await?;
    state.backend.delete_lot(&session, LotId::new(id)).await?;
    Ok(Json(json!({ "message": "Parking lot deleted successfully" })))
}

async fn users(State(state): State<ServerState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let session = state.session(&headers).await?;
    let users = state.backend.list_users(&session).await?;
    Ok(Json(json!({ "users": users })))
}

// =============================================================================
// User Handlers
// =============================================================================

async fn user_lots(State(state): State<ServerState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let session = state.session(&headers).await?;
    let lots = state.backend.user_lots(&session).await?;
    Ok(Json(json!({ "parking_lots": lots })))
}

async fn book(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<BookBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let session = state.session(&headers).await?;
    let reservation = state.backend.book(&session, body.lot_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Spot booked", "reservation": reservation })),
    ))
}

async fn release(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let session = state.session(&headers).await?;
    let receipt = state
        .backend
        .release(&session, ReservationId::new(id))
        .await?;
    Ok(Json(json!(receipt)))
}

async fn my_reservations(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let session = state.session(&headers).await?;
    let reservations = state.backend.reservations(&session).await?;
    Ok(Json(json!({ "reservations": reservations })))
}

async fn export_csv(State(state): State<ServerState>, headers: HeaderMap) -> ApiResult<Response> {
    let session = state.session(&headers).await?;
    let csv = state.backend.export_csv(&session).await?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

// =============================================================================
// Scheduler Handlers
// =============================================================================

async fn scheduler_status(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> ApiResult<Json<SchedulerStatus>> {
    state.session(&headers).await?;
    Ok(Json(SchedulerStatus {
        running: true,
        jobs: SCHEDULED_JOBS
            .iter()
            .map(|id| SchedulerJob {
                id: (*id).to_string(),
                next_run: None,
            })
            .collect(),
    }))
}

async fn trigger_job(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(job): Path<String>,
) -> ApiResult<Json<Value>> {
    state.session(&headers).await?;
    if !SCHEDULED_JOBS.contains(&job.as_str()) {
        return Err(ApiError::UnknownJob(job));
    }
    tracing::info!(job = %job, "Job triggered");
    state.triggered.lock().await.push(job.clone());
    Ok(Json(json!({ "message": format!("Job {job} triggered") })))
}

/// Serve a canned response for paths that have one.
async fn canned_response(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    let canned = state.canned.lock().await.get(request.uri().path()).cloned();
    match canned {
        Some((status, body)) => {
            tracing::debug!(path = %request.uri().path(), status = status.as_u16(), "Canned response");
            (status, Json(body)).into_response()
        }
        None => next.run(request).await,
    }
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/admin/parking-lots", get(admin_lots).post(create_lot))
        .route(
            "/api/admin/parking-lots/{id}",
            put(update_lot).delete(delete_lot),
        )
        .route("/api/admin/users", get(users))
        .route("/api/user/parking-lots", get(user_lots))
        .route("/api/user/book", post(book))
        .route("/api/user/release/{id}", put(release))
        .route("/api/user/my-reservations", get(my_reservations))
        .route("/api/user/export-csv", get(export_csv))
        .route("/api/scheduler/status", get(scheduler_status))
        .route("/api/scheduler/trigger/{job}", get(trigger_job))
        .layer(middleware::from_fn_with_state(state.clone(), canned_response))
        .with_state(state)
}

// =============================================================================
// Test Server
// =============================================================================

/// A parking REST service on an ephemeral local port.
///
/// The server task is aborted when the value is dropped.
pub struct TestServer {
    addr: SocketAddr,
    state: ServerState,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve `backend` on `127.0.0.1` at a free port.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn spawn(backend: DemoBackend) -> std::io::Result<Self> {
        let state = ServerState {
            backend: Arc::new(backend),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            triggered: Arc::new(Mutex::new(Vec::new())),
            canned: Arc::new(Mutex::new(HashMap::new())),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Test server stopped");
            }
        });
        tracing::debug!(%addr, "Test server listening");

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL to hand to a client, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The backend behind the routes.
    #[must_use]
    pub fn backend(&self) -> &DemoBackend {
        &self.state.backend
    }

    /// Jobs triggered so far, in order.
    pub async fn triggered_jobs(&self) -> Vec<String> {
        self.state.triggered.lock().await.clone()
    }

    /// Answer every request for `path` with `503 {"error": "Service unavailable"}`.
    pub async fn fail_path(&self, path: &str) {
        self.set_canned(
            path,
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": "Service unavailable" }),
        )
        .await;
    }

    /// Answer every request for `path` with `200` and `body`.
    pub async fn respond_with(&self, path: &str, body: Value) {
        self.set_canned(path, StatusCode::OK, body).await;
    }

    async fn set_canned(&self, path: &str, status: StatusCode, body: Value) {
        self.state
            .canned
            .lock()
            .await
            .insert(path.to_string(), (status, body));
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
