//! HTTP handlers for the location endpoints.
//!
//! Registry calls touch the filesystem, so each one runs on the blocking pool.

use crate::error::ApiError;
use crate::AppState;
use api_shared::{
    CreateLocationReq, ErrorRes, HealthRes, HealthService, LocationJson, LocationListRes,
    SearchLocationsReq, UpdateLocationReq,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use emc_core::{LocationError, LocationRegistry, LocationResult, Ready};

async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&LocationRegistry<Ready>) -> LocationResult<T> + Send + 'static,
{
    let registry = state.registry.clone();
    Ok(tokio::task::spawn_blocking(move || op(&registry)).await??)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness probe. Does not touch storage.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/locations",
    responses(
        (status = 200, description = "All non-retired locations in pre-order", body = LocationListRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List every non-retired location, root first.
#[axum::debug_handler]
pub async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<LocationListRes>, ApiError> {
    let res = run_blocking(&state, |r| r.list_all()).await?;
    Ok(Json(res))
}

#[utoipa::path(
    get,
    path = "/locations/search",
    params(
        ("q" = Option<String>, Query, description = "Accepted but not used for filtering")
    ),
    responses(
        (status = 200, description = "Same result as listing", body = LocationListRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Search locations. Currently returns the full listing.
#[axum::debug_handler]
pub async fn search_locations(
    State(state): State<AppState>,
    Query(params): Query<SearchLocationsReq>,
) -> Result<Json<LocationListRes>, ApiError> {
    let res = run_blocking(&state, move |r| r.search(&params)).await?;
    Ok(Json(res))
}

#[utoipa::path(
    get,
    path = "/locations/{uuid}",
    params(
        ("uuid" = String, Path, description = "Location identifier")
    ),
    responses(
        (status = 200, description = "The location, retired or not", body = LocationJson),
        (status = 404, description = "No location with this identifier", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Fetch a single location.
///
/// # Errors
/// Returns `404 Not Found` if no location has the identifier, including identifiers that could
/// never be valid.
#[axum::debug_handler]
pub async fn get_location(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<LocationJson>, ApiError> {
    let lookup = uuid.clone();
    let found = run_blocking(&state, move |r| r.retrieve(&lookup)).await?;
    match found {
        Some(location) => Ok(Json(location)),
        None => Err(LocationError::NotFound(format!("No location found with UUID {uuid}")).into()),
    }
}

#[utoipa::path(
    post,
    path = "/locations",
    request_body = CreateLocationReq,
    responses(
        (status = 201, description = "Location created", body = LocationJson),
        (status = 400, description = "Invalid request", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Create a location under an existing parent.
///
/// # Errors
/// Returns `400 Bad Request` if the body carries a `uuid`, the parent is missing or unknown, or
/// the name is absent, blank or already taken.
#[axum::debug_handler]
pub async fn create_location(
    State(state): State<AppState>,
    Json(req): Json<CreateLocationReq>,
) -> Result<(StatusCode, Json<LocationJson>), ApiError> {
    let created = run_blocking(&state, move |r| r.create(req)).await?;
    tracing::info!("created location {}", created.uuid);
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/locations/{uuid}",
    params(
        ("uuid" = String, Path, description = "Location identifier")
    ),
    request_body = UpdateLocationReq,
    responses(
        (status = 200, description = "Location renamed", body = LocationJson),
        (status = 400, description = "Invalid name", body = ErrorRes),
        (status = 404, description = "No location with this identifier", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Rename a location. Only `names` is read from the body.
#[axum::debug_handler]
pub async fn update_location(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Json(req): Json<UpdateLocationReq>,
) -> Result<Json<LocationJson>, ApiError> {
    let updated = run_blocking(&state, move |r| r.update(&uuid, req)).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/locations/{uuid}",
    params(
        ("uuid" = String, Path, description = "Location identifier")
    ),
    responses(
        (status = 204, description = "Location and its descendants removed"),
        (status = 400, description = "Root or protected zone", body = ErrorRes),
        (status = 404, description = "No location with this identifier", body = ErrorRes),
        (status = 409, description = "Patients are assigned inside the subtree", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Remove a location and all its descendants.
///
/// # Errors
/// Returns `409 Conflict` if any patient references any location in the subtree; nothing is
/// removed in that case.
#[axum::debug_handler]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<StatusCode, ApiError> {
    let target = uuid.clone();
    run_blocking(&state, move |r| r.delete(&target)).await?;
    tracing::info!("deleted location {}", uuid);
    Ok(StatusCode::NO_CONTENT)
}
