//! Destinations for generated entities.
//!
//! A sink receives one complete, validated batch per entity type. A type whose
//! synthesis fails never reaches the sink.

mod api;
mod ndjson;

use async_trait::async_trait;
use thiserror::Error;

use crate::entity::SyntheticEntity;

pub use api::ApiSink;
pub use ndjson::NdjsonSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upload failed: {0}")]
    UploadFailed(String),
    #[error("Backend not reachable at {0}")]
    BackendNotReachable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait Sink: Send {
    /// Takes every entity of one type. Returns how many were written.
    async fn load(
        &mut self,
        entity_type: &str,
        entities: &[SyntheticEntity],
    ) -> Result<usize, SinkError>;
}

/// Keeps batches in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub batches: Vec<(String, Vec<SyntheticEntity>)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> impl Iterator<Item = &SyntheticEntity> {
        self.batches.iter().flat_map(|(_, entities)| entities)
    }

    pub fn batch(&self, entity_type: &str) -> Option<&[SyntheticEntity]> {
        self.batches
            .iter()
            .find(|(name, _)| name == entity_type)
            .map(|(_, entities)| entities.as_slice())
    }
}

#[async_trait]
impl Sink for CollectingSink {
    async fn load(
        &mut self,
        entity_type: &str,
        entities: &[SyntheticEntity],
    ) -> Result<usize, SinkError> {
        self.batches
            .push((entity_type.to_string(), entities.to_vec()));
        Ok(entities.len())
    }
}
