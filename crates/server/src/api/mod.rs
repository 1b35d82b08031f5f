//! API module providing the HTTP endpoints of the auth service.
//!
//! This module is organized into submodules:
//! - `auth` - Bearer extractor and the shared error body
//! - `profile` - Caller profile endpoints (/api/v1/profile*)
//! - `users` - User management endpoints (/api/v1/users*)
//! - `health` - Health check endpoint (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration

pub mod auth;
pub mod health;
pub mod openapi;
pub mod profile;
pub mod users;

pub use health::MISC_TAG;
pub use profile::PROFILE_TAG;
pub use users::USERS_TAG;

use crate::AppResources;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Prefix every profile and user route is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Builds the full application router, including the ReDoc page at `/api-docs`.
pub fn app(app_resources: AppResources) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .nest(API_PREFIX, profile::router().merge(users::router()))
        .routes(routes!(health::health))
        .layer(axum::Extension(app_resources))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .split_for_parts();

    router.merge(Redoc::with_url("/api-docs", api))
}

/// Starts the web server with all configured routes.
#[tracing::instrument(skip(app_resources))]
pub async fn start_webserver(app_resources: AppResources) -> color_eyre::Result<()> {
    let addr = app_resources.config.listen_addr;
    let router = app(app_resources);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
