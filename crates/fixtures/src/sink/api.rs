use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use super::{Sink, SinkError};
use crate::entity::SyntheticEntity;

const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Serialize)]
struct IngestRequest<'a> {
    items: &'a [SyntheticEntity],
}

/// Posts entities to a catalog backend's ingest endpoint.
pub struct ApiSink {
    client: Client,
    base_url: String,
    batch_size: usize,
}

impl ApiSink {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Checks if the backend is reachable.
    pub async fn check_health(&self) -> Result<(), SinkError> {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(SinkError::BackendNotReachable(format!(
                "Health check returned status {}",
                resp.status()
            ))),
            Err(e) => Err(SinkError::BackendNotReachable(e.to_string())),
        }
    }
}

#[async_trait]
impl Sink for ApiSink {
    async fn load(
        &mut self,
        entity_type: &str,
        entities: &[SyntheticEntity],
    ) -> Result<usize, SinkError> {
        let url = format!("{}/v0/ingest", self.base_url);
        let mut uploaded = 0;

        for chunk in entities.chunks(self.batch_size) {
            debug!("Posting {} {} records", chunk.len(), entity_type);
            let resp = self
                .client
                .post(&url)
                .json(&IngestRequest { items: chunk })
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(SinkError::UploadFailed(format!("Status {status}: {body}")));
            }
            uploaded += chunk.len();
        }

        info!("Ingested {} {} records", uploaded, entity_type);
        Ok(uploaded)
    }
}
