//! HTTP request handlers for the identity service.

use std::sync::Arc;

use axum::{
    Extension,
    extract::Query,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    errors::AppError,
    models::{AssignRequest, Identifier, Identity, IdentityFilter, IdentityPage},
    provider::IdentityProvider,
};

/// Default page size for identity lookups.
pub const DEFAULT_LIMIT: usize = 10;
/// Largest page a client may request.
pub const MAX_LIMIT: usize = 100;

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Provider shared by all handlers.
pub type SharedProvider = Arc<dyn IdentityProvider>;

/// Query parameters for `GET /v0/identity`.
///
/// Either `stableTargetId` alone, or `hadPrimarySource` together with
/// `identifierInPrimarySource`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuery {
    pub stable_target_id: Option<String>,
    pub had_primary_source: Option<String>,
    pub identifier_in_primary_source: Option<String>,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl FetchQuery {
    fn filter(&self) -> Result<IdentityFilter, AppError> {
        match (
            &self.stable_target_id,
            &self.had_primary_source,
            &self.identifier_in_primary_source,
        ) {
            (Some(stable), None, None) => Ok(IdentityFilter::StableTargetId(Identifier::parse(
                stable.as_str(),
            )?)),
            (None, Some(source), Some(iips)) => Ok(IdentityFilter::PrimarySource {
                had_primary_source: Identifier::parse(source.as_str())?,
                identifier_in_primary_source: iips.clone(),
            }),
            _ => Err(AppError::InvalidInput(
                "Provide stableTargetId, or hadPrimarySource with identifierInPrimarySource"
                    .to_string(),
            )),
        }
    }
}

/// Health check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "identity",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Assign an identity to a record, or return the one assigned earlier.
#[utoipa::path(
    post,
    path = "/v0/identity",
    tag = "identity",
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Existing or newly created identity", body = Identity),
        (status = 422, description = "Malformed request body")
    )
)]
pub async fn assign_identity(
    Extension(provider): Extension<SharedProvider>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<Identity>, AppError> {
    let identity = provider
        .assign(&req.had_primary_source, &req.identifier_in_primary_source)
        .await?;
    Ok(Json(identity))
}

/// Look up identities by stable target id or by primary source pair.
#[utoipa::path(
    get,
    path = "/v0/identity",
    tag = "identity",
    params(FetchQuery),
    responses(
        (status = 200, description = "Matching identities", body = IdentityPage),
        (status = 400, description = "Missing or conflicting filters")
    )
)]
pub async fn fetch_identities(
    Extension(provider): Extension<SharedProvider>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<IdentityPage>, AppError> {
    let filter = query.filter()?;
    let matches = provider.fetch(&filter).await?;
    let total = matches.len();
    let items = matches
        .into_iter()
        .skip(query.skip)
        .take(query.limit.min(MAX_LIMIT))
        .collect();

    Ok(Json(IdentityPage { items, total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(stable: Option<&str>, source: Option<&str>, iips: Option<&str>) -> FetchQuery {
        FetchQuery {
            stable_target_id: stable.map(str::to_string),
            had_primary_source: source.map(str::to_string),
            identifier_in_primary_source: iips.map(str::to_string),
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    #[test]
    fn test_filter_selection() {
        assert!(matches!(
            query(Some("aaaaaaaaaaaaaa"), None, None).filter(),
            Ok(IdentityFilter::StableTargetId(_))
        ));
        assert!(matches!(
            query(None, Some("00000000000000"), Some("Person-1")).filter(),
            Ok(IdentityFilter::PrimarySource { .. })
        ));
    }

    #[test]
    fn test_filter_rejects_incomplete_or_mixed() {
        assert!(query(None, None, None).filter().is_err());
        assert!(query(None, Some("00000000000000"), None).filter().is_err());
        assert!(
            query(Some("aaaaaaaaaaaaaa"), Some("00000000000000"), Some("Person-1"))
                .filter()
                .is_err()
        );
        assert!(query(Some("bad"), None, None).filter().is_err());
    }
}
