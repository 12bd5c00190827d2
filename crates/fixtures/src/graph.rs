//! Identity graph construction ahead of value synthesis.

use std::collections::BTreeMap;

use catalog_identity::{Identifier, Identity, IdentityMap, IdentityProvider};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::GenerationError;
use crate::seeds::NumericIdRange;

/// Assigns an identity to every planned record.
///
/// The primary source type is built first so that every later record can
/// name an existing primary source. The very first primary source names the
/// bootstrap placeholder instead.
pub struct IdentityGraphBuilder<'a> {
    provider: &'a dyn IdentityProvider,
    primary_source_type: &'a str,
    bootstrap: Option<&'a Identifier>,
}

impl<'a> IdentityGraphBuilder<'a> {
    pub fn new(
        provider: &'a dyn IdentityProvider,
        primary_source_type: &'a str,
        bootstrap: Option<&'a Identifier>,
    ) -> Self {
        Self {
            provider,
            primary_source_type,
            bootstrap,
        }
    }

    /// Builds identities for `ranges` in `order`.
    ///
    /// `order` is the schema declaration order. The primary source type is
    /// moved to the front; types without a range are skipped.
    pub async fn build(
        &self,
        order: &[String],
        ranges: &BTreeMap<String, NumericIdRange>,
        rng: &mut (impl Rng + Send),
    ) -> Result<IdentityMap, GenerationError> {
        let mut graph = IdentityMap::new();
        let mut primary_sources: Vec<Identifier> = Vec::new();

        let order = std::iter::once(self.primary_source_type)
            .chain(
                order
                    .iter()
                    .map(String::as_str)
                    .filter(|t| *t != self.primary_source_type),
            )
            .filter(|t| ranges.contains_key(*t));

        for entity_type in order {
            let range = ranges[entity_type];
            let is_primary = entity_type == self.primary_source_type;
            info!(
                "Assigning {} {} identities (seeds {}..{})",
                range.count,
                entity_type,
                range.offset,
                range.end()
            );

            for seed in range.seeds() {
                let had_primary_source = self.pick_primary_source(&primary_sources, rng)?;
                let identity = self
                    .provider
                    .assign(&had_primary_source, &format!("{entity_type}-{seed}"))
                    .await?;
                debug!(
                    "{} -> {}",
                    identity.identifier_in_primary_source, identity.stable_target_id
                );

                if is_primary {
                    primary_sources.push(identity.stable_target_id.clone());
                }
                graph.push(entity_type, identity);
            }
        }

        info!("Identity graph holds {} identities", graph.len());
        Ok(graph)
    }

    fn pick_primary_source(
        &self,
        primary_sources: &[Identifier],
        rng: &mut impl Rng,
    ) -> Result<Identifier, GenerationError> {
        match primary_sources.choose(rng) {
            Some(source) => Ok(source.clone()),
            None => self
                .bootstrap
                .cloned()
                .ok_or(GenerationError::MissingPrimarySourceBootstrap),
        }
    }
}

/// Whether every identity names a primary source that existed before it.
pub fn primary_sources_precede(
    graph: &IdentityMap,
    primary_source_type: &str,
    bootstrap: &Identifier,
) -> bool {
    let primaries = graph.get(primary_source_type);
    let known = |source: &Identifier, before: usize| {
        source == bootstrap
            || primaries[..before]
                .iter()
                .any(|p: &Identity| p.stable_target_id == *source)
    };

    primaries
        .iter()
        .enumerate()
        .all(|(i, identity)| known(&identity.had_primary_source, i))
        && graph
            .iter()
            .filter(|(entity_type, _)| *entity_type != primary_source_type)
            .flat_map(|(_, identities)| identities)
            .all(|identity| known(&identity.had_primary_source, primaries.len()))
}
