//! # API REST
//!
//! REST binding for the EMC location registry.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - Mapping registry errors onto status codes and JSON error bodies
//!
//! Uses `api-shared` for the wire types and `emc-core` for all business rules.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

pub use error::ApiError;

use api_shared::{
    CreateLocationReq, ErrorRes, HealthRes, LocationJson, LocationListRes, UpdateLocationReq,
};
use axum::{routing::get, Router};
use emc_core::{LocationRegistry, Ready};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: LocationRegistry<Ready>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_locations,
        handlers::search_locations,
        handlers::get_location,
        handlers::create_location,
        handlers::update_location,
        handlers::delete_location,
    ),
    components(schemas(
        HealthRes,
        LocationJson,
        LocationListRes,
        CreateLocationReq,
        UpdateLocationReq,
        ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the application router over a bootstrapped registry.
pub fn router(registry: LocationRegistry<Ready>) -> Router {
    let state = AppState { registry };

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/locations",
            get(handlers::list_locations).post(handlers::create_location),
        )
        .route("/locations/search", get(handlers::search_locations))
        .route(
            "/locations/:uuid",
            get(handlers::get_location)
                .put(handlers::update_location)
                .delete(handlers::delete_location),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Binds `addr` and serves the REST API until the server stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, registry: LocationRegistry<Ready>) -> anyhow::Result<()> {
    tracing::info!("-- Starting EMC REST API on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(registry)).await?;
    Ok(())
}
