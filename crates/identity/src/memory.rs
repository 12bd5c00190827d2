//! In-process identity provider.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::errors::IdentityError;
use crate::models::{Identifier, Identity, IdentityFilter};
use crate::provider::IdentityProvider;
use crate::snapshot::IdentityMap;

type SourceKey = (Identifier, String);

/// Map-backed provider: fast, volatile, scoped to one process.
///
/// Identifiers come from a seeded generator, so the same sequence of first-time
/// assignments yields the same identities across runs.
pub struct MemoryIdentityProvider {
    state: Mutex<MemoryState>,
}

struct MemoryState {
    rng: StdRng,
    identities: Vec<Identity>,
    by_source: HashMap<SourceKey, usize>,
    by_stable_target: HashMap<Identifier, Vec<usize>>,
    // Every identifier and stable target id handed out or restored.
    issued: HashSet<Identifier>,
}

impl MemoryState {
    /// Draws an identifier that was never issued by or restored into this state.
    fn fresh_identifier(&mut self) -> Identifier {
        loop {
            let candidate = Identifier::generate(&mut self.rng);
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn holds(&self, identity: &Identity) -> bool {
        self.by_source
            .get(&(
                identity.had_primary_source.clone(),
                identity.identifier_in_primary_source.clone(),
            ))
            .is_some_and(|&idx| self.identities[idx] == *identity)
    }

    fn insert(&mut self, identity: Identity) -> usize {
        let idx = self.identities.len();
        self.issued.insert(identity.identifier.clone());
        self.issued.insert(identity.stable_target_id.clone());
        self.by_source.insert(
            (
                identity.had_primary_source.clone(),
                identity.identifier_in_primary_source.clone(),
            ),
            idx,
        );
        self.by_stable_target
            .entry(identity.stable_target_id.clone())
            .or_default()
            .push(idx);
        self.identities.push(identity);
        idx
    }
}

impl MemoryIdentityProvider {
    /// Creates an empty provider with an entropy-seeded identifier generator.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Creates an empty provider whose identifiers are reproducible from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                rng,
                identities: Vec::new(),
                by_source: HashMap::new(),
                by_stable_target: HashMap::new(),
                issued: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, IdentityError> {
        self.state.lock().map_err(|_| IdentityError::Poisoned)
    }

    /// Number of stored identities.
    pub fn len(&self) -> Result<usize, IdentityError> {
        Ok(self.lock()?.identities.len())
    }

    pub fn is_empty(&self) -> Result<bool, IdentityError> {
        Ok(self.len()? == 0)
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn assign(
        &self,
        had_primary_source: &Identifier,
        identifier_in_primary_source: &str,
    ) -> Result<Identity, IdentityError> {
        // Lookup and insert happen under one lock, so the first writer wins.
        let mut state = self.lock()?;
        let key = (
            had_primary_source.clone(),
            identifier_in_primary_source.to_string(),
        );
        if let Some(&idx) = state.by_source.get(&key) {
            return Ok(state.identities[idx].clone());
        }

        let identifier = state.fresh_identifier();
        let stable_target_id = state.fresh_identifier();
        let identity = Identity {
            identifier,
            had_primary_source: key.0,
            identifier_in_primary_source: key.1,
            stable_target_id,
        };
        debug!(
            "Assigned {} to {}",
            identity.stable_target_id, identity.identifier_in_primary_source
        );
        state.insert(identity.clone());
        Ok(identity)
    }

    async fn fetch(&self, filter: &IdentityFilter) -> Result<Vec<Identity>, IdentityError> {
        let state = self.lock()?;
        let found: Vec<Identity> = match filter {
            IdentityFilter::StableTargetId(id) => state
                .by_stable_target
                .get(id)
                .map(|indices| {
                    indices
                        .iter()
                        .map(|&i| state.identities[i].clone())
                        .collect()
                })
                .unwrap_or_default(),
            IdentityFilter::PrimarySource {
                had_primary_source,
                identifier_in_primary_source,
            } => state
                .by_source
                .get(&(
                    had_primary_source.clone(),
                    identifier_in_primary_source.clone(),
                ))
                .map(|&i| vec![state.identities[i].clone()])
                .unwrap_or_default(),
        };
        Ok(found)
    }

    async fn snapshot(&self) -> Result<IdentityMap, IdentityError> {
        let state = self.lock()?;
        Ok(IdentityMap::from_identities(state.identities.iter().cloned()))
    }

    async fn restore(&self, map: &IdentityMap) -> Result<(), IdentityError> {
        let mut state = self.lock()?;
        let mut restored = 0;
        for identity in map.identities() {
            if state.holds(identity) {
                continue;
            }
            state.insert(identity.clone());
            // Keep the generator where the process that assigned these left it.
            Identifier::generate(&mut state.rng);
            Identifier::generate(&mut state.rng);
            restored += 1;
        }
        debug!(
            "Restored {} identities, {} already present",
            restored,
            map.len() - restored
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let provider = MemoryIdentityProvider::with_seed(1);
        let source = Identifier::bootstrap();

        let first = provider.assign(&source, "X-1").await.unwrap();
        let second = provider.assign(&source, "X-1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.len().unwrap(), 1);
        assert_ne!(first.identifier, first.stable_target_id);
    }

    #[tokio::test]
    async fn test_fetch_by_pair_and_stable_target() {
        let provider = MemoryIdentityProvider::with_seed(2);
        let source = Identifier::bootstrap();
        let identity = provider.assign(&source, "Person-10").await.unwrap();

        let by_pair = provider
            .fetch(&IdentityFilter::primary_source(&source, "Person-10"))
            .await
            .unwrap();
        assert_eq!(by_pair, vec![identity.clone()]);

        let by_stable = provider
            .fetch(&IdentityFilter::StableTargetId(
                identity.stable_target_id.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(by_stable, vec![identity]);

        let missing = provider
            .fetch(&IdentityFilter::primary_source(&source, "Person-11"))
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_first_writers_converge() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let source = Identifier::bootstrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let provider = Arc::clone(&provider);
                let source = source.clone();
                tokio::spawn(async move { provider.assign(&source, "Resource-5").await.unwrap() })
            })
            .collect();

        let mut stable_ids = std::collections::HashSet::new();
        for task in tasks {
            stable_ids.insert(task.await.unwrap().stable_target_id);
        }

        assert_eq!(stable_ids.len(), 1);
        assert_eq!(provider.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let original = MemoryIdentityProvider::with_seed(3);
        let source = Identifier::bootstrap();
        let primary = original.assign(&source, "PrimarySource-100").await.unwrap();
        for seed in 0..5 {
            original
                .assign(&primary.stable_target_id, &format!("Person-{seed}"))
                .await
                .unwrap();
        }

        let map = original.snapshot().await.unwrap();
        assert_eq!(map.get("PrimarySource").len(), 1);
        assert_eq!(map.get("Person").len(), 5);

        let restored = MemoryIdentityProvider::with_seed(99);
        restored.restore(&map).await.unwrap();

        for identity in map.identities() {
            let pair = IdentityFilter::primary_source(
                &identity.had_primary_source,
                identity.identifier_in_primary_source.clone(),
            );
            assert_eq!(
                restored.fetch(&pair).await.unwrap(),
                original.fetch(&pair).await.unwrap()
            );

            let stable = IdentityFilter::StableTargetId(identity.stable_target_id.clone());
            assert_eq!(
                restored.fetch(&stable).await.unwrap(),
                original.fetch(&stable).await.unwrap()
            );
        }

        // Restored entries are found again instead of being re-created.
        let again = restored
            .assign(&primary.stable_target_id, "Person-3")
            .await
            .unwrap();
        assert_eq!(restored.len().unwrap(), 6);
        assert_eq!(
            again,
            original
                .assign(&primary.stable_target_id, "Person-3")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_assign_after_restore_with_same_seed_is_distinct() {
        let source = Identifier::bootstrap();
        let first_stage = MemoryIdentityProvider::with_seed(5);
        let existing = first_stage.assign(&source, "PrimarySource-1").await.unwrap();
        let map = first_stage.snapshot().await.unwrap();

        let second_stage = MemoryIdentityProvider::with_seed(5);
        second_stage.restore(&map).await.unwrap();
        let added = second_stage.assign(&source, "PrimarySource-2").await.unwrap();

        assert_ne!(added.identifier, existing.identifier);
        assert_ne!(added.stable_target_id, existing.stable_target_id);
        assert_ne!(added.identifier, existing.stable_target_id);
        assert_ne!(added.stable_target_id, existing.identifier);

        let by_stable = second_stage
            .fetch(&IdentityFilter::StableTargetId(
                added.stable_target_id.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(by_stable, vec![added.clone()]);

        // Same numbers a single process would have drawn for the second pair.
        let single = first_stage.assign(&source, "PrimarySource-2").await.unwrap();
        assert_eq!(added, single);
    }

    #[tokio::test]
    async fn test_restore_skips_identities_already_held() {
        let provider = MemoryIdentityProvider::with_seed(8);
        let source = Identifier::bootstrap();
        let identity = provider.assign(&source, "Person-1").await.unwrap();
        let map = provider.snapshot().await.unwrap();

        provider.restore(&map).await.unwrap();
        provider.restore(&map).await.unwrap();

        assert_eq!(provider.len().unwrap(), 1);
        let by_stable = provider
            .fetch(&IdentityFilter::StableTargetId(
                identity.stable_target_id.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(by_stable, vec![identity]);
    }

    #[test]
    fn test_len_reports_poisoned_lock() {
        let provider = Arc::new(MemoryIdentityProvider::with_seed(4));
        let poisoner = Arc::clone(&provider);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.state.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(provider.len(), Err(IdentityError::Poisoned)));
        assert!(provider.is_empty().is_err());
    }
}
