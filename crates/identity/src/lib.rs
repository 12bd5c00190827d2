//! Stable identity resolution for catalog records.
//!
//! Records that describe the same real-world entity, whether extracted
//! repeatedly or from different source systems, converge on one
//! `stableTargetId`. The [`IdentityProvider`] trait has two interchangeable
//! implementations: [`MemoryIdentityProvider`] for a single process and
//! [`RemoteIdentityProvider`] for the identity service served by
//! [`create_router`].

pub mod errors;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod provider;
pub mod remote;
pub mod snapshot;

use axum::{
    Extension, Json, Router,
    routing::get,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use errors::IdentityError;
pub use memory::MemoryIdentityProvider;
pub use models::{BOOTSTRAP_PRIMARY_SOURCE_ID, Identifier, Identity, IdentityFilter};
pub use provider::{IdentityBackend, IdentityProvider};
pub use remote::RemoteIdentityProvider;
pub use snapshot::IdentityMap;

use crate::handlers::{SharedProvider, assign_identity, fetch_identities, health_check};

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health_check, handlers::assign_identity, handlers::fetch_identities),
    components(schemas(models::Identity, models::AssignRequest, models::IdentityPage)),
    tags((name = "identity", description = "Identity assignment and lookup"))
)]
pub struct ApiDoc;

/// Builds the identity service router around `provider`.
pub fn create_router(provider: SharedProvider) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route(
            "/v0/identity",
            get(fetch_identities).post(assign_identity),
        )
        .layer(Extension(provider))
        .layer(TraceLayer::new_for_http())
}

/// Serves the identity service on `0.0.0.0:port` until the process stops.
pub async fn run_server(provider: SharedProvider, port: u16) -> anyhow::Result<()> {
    let app = create_router(provider);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("Identity service running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
