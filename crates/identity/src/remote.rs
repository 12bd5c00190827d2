//! HTTP client for the identity service.
//!
//! The service is the durable store for a whole pipeline run, so this provider
//! has nothing to snapshot and restoring into it is a no-op.

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use crate::errors::IdentityError;
use crate::models::{AssignRequest, Identifier, Identity, IdentityFilter, IdentityPage};
use crate::provider::IdentityProvider;
use crate::snapshot::IdentityMap;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Provider backed by a remote identity service.
pub struct RemoteIdentityProvider {
    client: Client,
    base_url: String,
    page_size: usize,
}

impl RemoteIdentityProvider {
    /// Creates a provider for the service at `base_url` (no trailing slash needed).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets how many identities are requested per page when fetching.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks that the service is reachable.
    pub async fn check_health(&self) -> Result<(), IdentityError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        ensure_success(resp).await.map(|_| ())
    }

    fn identity_url(&self) -> String {
        format!("{}/v0/identity", self.base_url)
    }
}

async fn ensure_success(resp: Response) -> Result<Response, IdentityError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(IdentityError::Service { status, body })
}

fn filter_params(filter: &IdentityFilter) -> Vec<(&'static str, String)> {
    match filter {
        IdentityFilter::StableTargetId(id) => vec![("stableTargetId", id.to_string())],
        IdentityFilter::PrimarySource {
            had_primary_source,
            identifier_in_primary_source,
        } => vec![
            ("hadPrimarySource", had_primary_source.to_string()),
            (
                "identifierInPrimarySource",
                identifier_in_primary_source.clone(),
            ),
        ],
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn assign(
        &self,
        had_primary_source: &Identifier,
        identifier_in_primary_source: &str,
    ) -> Result<Identity, IdentityError> {
        let body = AssignRequest {
            had_primary_source: had_primary_source.clone(),
            identifier_in_primary_source: identifier_in_primary_source.to_string(),
        };
        let resp = self
            .client
            .post(self.identity_url())
            .json(&body)
            .send()
            .await?;
        let identity: Identity = ensure_success(resp).await?.json().await?;
        Ok(identity)
    }

    async fn fetch(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, IdentityError> {
        let mut items = Vec::new();
        loop {
            let mut params = filter_params(filter);
            params.push(("skip", items.len().to_string()));
            params.push(("limit", self.page_size.to_string()));

            let resp = self
                .client
                .get(self.identity_url())
                .query(&params)
                .send()
                .await?;
            let page: IdentityPage = ensure_success(resp).await?.json().await?;
            let received = page.items.len();
            items.extend(page.items);

            if received == 0 || items.len() >= page.total {
                break;
            }
        }
        debug!("Fetched {} identities for {:?}", items.len(), filter);
        Ok(items)
    }

    async fn snapshot(&self) -> Result<IdentityMap, IdentityError> {
        Ok(IdentityMap::new())
    }

    async fn restore(&self, _map: &IdentityMap) -> Result<(), IdentityError> {
        Ok(())
    }
}
