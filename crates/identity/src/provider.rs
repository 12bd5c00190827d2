//! The provider interface and backend selection.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::IdentityError;
use crate::memory::MemoryIdentityProvider;
use crate::models::{Identifier, Identity, IdentityFilter};
use crate::remote::RemoteIdentityProvider;
use crate::snapshot::IdentityMap;

/// Assigns and looks up canonical identities.
///
/// Implementations are interchangeable: callers hold an `Arc<dyn IdentityProvider>`
/// and never branch on which variant is active.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the identity for the pair, creating it on first use.
    ///
    /// Repeat calls return the stored identity unchanged. When callers race on
    /// a new pair, the first successful creation wins.
    async fn assign(
        &self,
        had_primary_source: &Identifier,
        identifier_in_primary_source: &str,
    ) -> Result<Identity, IdentityError>;

    /// All identities matching the filter. Empty means "not yet assigned".
    async fn fetch(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, IdentityError>;

    /// Current contents as a transportable map.
    async fn snapshot(&self) -> Result<IdentityMap, IdentityError>;

    /// Re-inserts previously snapshotted identities without uniqueness checks.
    async fn restore(&self, map: &IdentityMap) -> Result<(), IdentityError>;
}

/// Which provider a run talks to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IdentityBackend {
    /// In-process map, scoped to one process.
    #[default]
    Memory,
    /// Identity service shared by the whole pipeline run.
    Remote { url: String },
}

impl IdentityBackend {
    /// Builds the configured provider. `seed` drives identifier generation in memory.
    pub fn connect(&self, seed: u64) -> Arc<dyn IdentityProvider> {
        match self {
            Self::Memory => Arc::new(MemoryIdentityProvider::with_seed(seed)),
            Self::Remote { url } => Arc::new(RemoteIdentityProvider::new(url.clone())),
        }
    }
}
