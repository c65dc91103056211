//! HTTP API: routing, handlers, and bearer-token protection.
//!
//! The store is synchronous, so every handler runs its database work on the
//! blocking thread pool via [run_blocking].

use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;
use tracing::{error, info, warn};

use crate::auth;
use crate::config::ApiConfig;
use crate::models::{
    CreateStaffRequest, LoginRequest, PatientSearchQuery, SearchPatientResponse,
};
use crate::store::Store;

/// Shared state handed to every handler.
pub struct AppState {
    pub config: ApiConfig,
    pub store: Store,
}

/// Authenticated identity injected into request extensions by
/// [require_auth].
#[derive(Debug, Clone)]
pub struct AuthStaff {
    pub staff_id: String,
    pub hospital: String,
}

/// Handler failures, mapped onto response statuses. Messages are safe to
/// show to clients; internals are logged, not returned.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    NotFound(&'static str),
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/staff/create", post(create_staff))
        .route("/patient/search", get(search_patients))
        .route("/patient/search/{id}", get(get_patient_by_id))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health_check))
        .route("/staff/login", post(login_staff))
        .merge(protected)
        .with_state(state)
}

/// Run synchronous database/crypto work off the async runtime. The sync
/// postgres client must never be driven from a runtime worker thread.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "blocking task panicked");
        ApiError::Internal("Internal server error")
    })?
}

/// Require a valid `Authorization: Bearer <token>` header and expose the
/// caller's identity to downstream handlers.
async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("Unauthorized"))?;

    let claims = auth::validate_token(token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = %e, "rejected bearer token");
        ApiError::Unauthorized("Unauthorized")
    })?;

    request.extensions_mut().insert(AuthStaff {
        staff_id: claims.sub,
        hospital: claims.hospital,
    });
    Ok(next.run(request).await)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "message": "OK" }))
}

async fn login_staff(
    State(state): State<Arc<AppState>>,
    Json(input): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let token = run_blocking(move || {
        let staff = state
            .store
            .find_staff(&input.username, &input.hospital)
            .map_err(|e| {
                error!(error = %e, "staff lookup failed");
                ApiError::Internal("Failed to fetch staff")
            })?
            .ok_or_else(|| {
                warn!(username = %input.username, hospital = %input.hospital, "login failed - user not found");
                ApiError::Unauthorized("Invalid credentials")
            })?;

        let password_matches =
            auth::verify_password(&input.password, &staff.password_hash).map_err(|e| {
                error!(error = %e, "password verification failed");
                ApiError::Internal("Failed to verify credentials")
            })?;
        if !password_matches {
            warn!(username = %input.username, hospital = %input.hospital, "login failed - invalid password");
            return Err(ApiError::Unauthorized("Invalid credentials"));
        }

        let token = auth::generate_token(staff.id, &staff.hospital, &state.config.jwt_secret)
            .map_err(|e| {
                error!(error = %e, staff_id = %staff.id, "failed to generate token");
                ApiError::Internal("Failed to generate token")
            })?;

        info!(staff_id = %staff.id, username = %staff.username, hospital = %staff.hospital, "login successful");
        Ok(token)
    })
    .await?;

    Ok(Json(json!({ "token": token })).into_response())
}

async fn create_staff(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthStaff>,
    Json(input): Json<CreateStaffRequest>,
) -> Result<Response, ApiError> {
    let staff_id = run_blocking(move || {
        let password_hash = auth::hash_password(&input.password).map_err(|e| {
            error!(error = %e, "failed to hash password");
            ApiError::Internal("Failed to hash password")
        })?;

        let staff_id = state
            .store
            .create_staff(&input.username, &password_hash, &input.hospital)
            .map_err(|e| {
                error!(error = %e, username = %input.username, "failed to create staff");
                ApiError::Internal("Failed to create staff")
            })?;

        info!(
            staff_id = %staff_id,
            username = %input.username,
            hospital = %input.hospital,
            created_by = %caller.staff_id,
            "staff created successfully"
        );
        Ok(staff_id)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Staff created successfully", "id": staff_id })),
    )
        .into_response())
}

async fn search_patients(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthStaff>,
    Query(filter): Query<PatientSearchQuery>,
) -> Result<Response, ApiError> {
    let patients = run_blocking(move || {
        let filter = filter.normalized();
        let patients = state
            .store
            .search_patients(&caller.hospital, &filter)
            .map_err(|e| {
                error!(error = %e, hospital = %caller.hospital, "patient search failed");
                ApiError::Internal("Failed to fetch patients")
            })?;

        info!(hospital = %caller.hospital, results = patients.len(), "patient search completed");
        Ok(patients)
    })
    .await?;

    Ok(Json(SearchPatientResponse { patients }).into_response())
}

async fn get_patient_by_id(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthStaff>,
    Path(identifier): Path<String>,
) -> Result<Response, ApiError> {
    let patient = run_blocking(move || {
        let patient = state
            .store
            .patient_by_identifier(&identifier)
            .map_err(|e| {
                error!(error = %e, "patient lookup failed");
                ApiError::Internal("Failed to fetch patient")
            })?
            .ok_or_else(|| {
                warn!(identifier = %identifier, "patient not found");
                ApiError::NotFound("Patient not found")
            })?;

        if patient.patient_hn != caller.hospital {
            warn!(
                identifier = %identifier,
                patient_hospital = %patient.patient_hn,
                staff_hospital = %caller.hospital,
                "access denied - patient belongs to different hospital"
            );
            return Err(ApiError::Forbidden(
                "Access denied - patient belongs to different hospital",
            ));
        }

        info!(identifier = %identifier, hospital = %caller.hospital, "patient retrieved");
        Ok(patient)
    })
    .await?;

    Ok(Json(patient).into_response())
}
