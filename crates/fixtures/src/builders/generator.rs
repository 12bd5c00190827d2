//! End-to-end generation: plan, identity graph, synthesis, sink.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use catalog_identity::{IdentityMap, IdentityProvider};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};

use crate::config::SeedConfig;
use crate::entity::SyntheticEntity;
use crate::error::GenerationError;
use crate::graph::IdentityGraphBuilder;
use crate::patterns::{PatternCatalog, Vocabulary};
use crate::planner::{EntityPopulationPlanner, PopulationPlan};
use crate::schema::introspect::unsupported_leaves;
use crate::schema::{EntityTypeSpec, SchemaIntrospector, SchemaRegistry};
use crate::seeds::NumericSeedAllocator;
use crate::sink::{CollectingSink, Sink};
use crate::synth::ValueSynthesizer;

/// Independent random streams of one run.
///
/// Each phase draws from its own stream so a run split across processes
/// consumes exactly the same numbers as a single-process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Planning = 0,
    Identifiers = 1,
    Synthesis = 2,
}

/// Seed of `stream` for a run seeded with `seed`.
pub fn stream_seed(seed: u64, stream: Stream) -> u64 {
    seed.wrapping_add((stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Counts and timings of a run.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Records handed to the sink per entity type.
    pub counts: BTreeMap<String, usize>,
    /// Identities in the graph the run synthesized against.
    pub identity_count: usize,
    /// Time spent building the identity graph (milliseconds, 0 when loaded).
    pub identity_time_ms: u64,
    /// Time spent synthesizing and loading entities (milliseconds).
    pub synthesis_time_ms: u64,
}

impl GenerationReport {
    pub fn entity_count(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Runs generation for one configuration.
///
/// # Example
///
/// ```rust,ignore
/// let generator = Generator::from_config(SeedConfig::from_file("fixtures.json")?)?;
/// let mut sink = NdjsonSink::new("out");
/// let report = generator.run(&mut sink).await?;
/// ```
pub struct Generator {
    config: SeedConfig,
    registry: SchemaRegistry,
    catalog: PatternCatalog,
    allocator: NumericSeedAllocator,
    provider: Arc<dyn IdentityProvider>,
}

impl Generator {
    /// Builds the registry and provider the configuration names.
    pub fn from_config(config: SeedConfig) -> Result<Self, GenerationError> {
        let registry = match &config.schema_path {
            Some(path) => SchemaRegistry::from_json_file(path)?,
            None => SchemaRegistry::builtin(),
        };
        let provider = config
            .identity
            .connect(stream_seed(config.seed, Stream::Identifiers));
        Self::new(config, registry, provider)
    }

    /// Checks everything that can fail before any record is produced.
    pub fn new(
        config: SeedConfig,
        registry: SchemaRegistry,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, GenerationError> {
        config.validate()?;

        if registry.get(&config.primary_source_type).is_none() {
            return Err(GenerationError::UnknownEntityType(
                config.primary_source_type.clone(),
            ));
        }
        if let Some(unknown) = config.weights.keys().find(|t| registry.get(t).is_none()) {
            return Err(GenerationError::UnknownEntityType(unknown.clone()));
        }

        let allocator = NumericSeedAllocator::new(registry.names())?;

        let mut catalog = PatternCatalog::new()?;
        if let Some(path) = &config.vocabulary_path {
            catalog = catalog.with_vocabulary(Vocabulary::load(path)?);
        }

        for schema in registry.schemas() {
            for field in &schema.fields {
                if let Some(pattern) = &field.pattern {
                    catalog.check(pattern)?;
                } else if let Some(type_name) = unsupported_leaves(&field.ty).into_iter().next()
                {
                    return Err(GenerationError::UnsupportedFieldType {
                        entity_type: schema.name.clone(),
                        field: field.name.clone(),
                        type_name,
                    });
                }
            }
        }

        Ok(Self {
            config,
            registry,
            catalog,
            allocator,
            provider,
        })
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Record counts per type. The primary source type is always planned.
    pub fn plan(&self, rng: &mut StdRng) -> Result<PopulationPlan, GenerationError> {
        let mut weights = self.config.weights.clone();
        weights
            .entry(self.config.primary_source_type.clone())
            .or_insert(0);

        EntityPopulationPlanner::new(weights, self.config.count)
            .with_floor(self.config.min_per_type)
            .plan(rng)
    }

    /// Plans the population and assigns an identity to every record.
    pub async fn build_identities(&self) -> Result<IdentityMap, GenerationError> {
        let mut rng = StdRng::seed_from_u64(stream_seed(self.config.seed, Stream::Planning));
        let plan = self.plan(&mut rng)?;
        info!(
            "Planned {} records across {} types",
            plan.values().sum::<usize>(),
            plan.len()
        );

        let ranges = self.allocator.allocate(&plan)?;
        let order: Vec<String> = self.registry.names().map(str::to_string).collect();

        IdentityGraphBuilder::new(
            self.provider.as_ref(),
            &self.config.primary_source_type,
            self.config.bootstrap_primary_source.as_ref(),
        )
        .build(&order, &ranges, &mut rng)
        .await
    }

    /// Re-inserts a graph built by another process into this run's provider.
    pub async fn restore_identities(&self, graph: &IdentityMap) -> Result<(), GenerationError> {
        self.provider.restore(graph).await?;
        info!("Restored {} identities", graph.len());
        Ok(())
    }

    /// Synthesizes every entity of `graph` and hands each type to `sink`.
    ///
    /// The graph must already be known to the provider: either built by this
    /// generator or passed through [`Generator::restore_identities`].
    pub async fn synthesize(
        &self,
        graph: &IdentityMap,
        sink: &mut dyn Sink,
    ) -> Result<GenerationReport, GenerationError> {
        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(stream_seed(self.config.seed, Stream::Synthesis));

        let order = self
            .registry
            .build_order(&self.config.primary_source_type, graph.entity_types());
        for entity_type in graph.entity_types() {
            if !order.iter().any(|t| t == entity_type) {
                warn!(
                    "Skipping {} identities of unknown type {:?}",
                    graph.get(entity_type).len(),
                    entity_type
                );
            }
        }

        let specs = SchemaIntrospector::introspect_all(&self.registry, &order, &mut rng);
        let synth = ValueSynthesizer::new(
            &self.catalog,
            graph,
            &self.config.locales,
            self.config.chattiness,
        );

        let mut report = GenerationReport {
            identity_count: graph.len(),
            ..Default::default()
        };

        for entity_type in &order {
            let Some(spec) = specs.get(entity_type) else {
                continue;
            };
            let entities = self.synthesize_type(&synth, spec, graph, &mut rng)?;
            let written = sink.load(entity_type, &entities).await?;
            info!("Loaded {} {} records", written, entity_type);
            report.counts.insert(entity_type.clone(), written);
        }

        report.synthesis_time_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    fn synthesize_type(
        &self,
        synth: &ValueSynthesizer<'_>,
        spec: &EntityTypeSpec,
        graph: &IdentityMap,
        rng: &mut StdRng,
    ) -> Result<Vec<SyntheticEntity>, GenerationError> {
        graph
            .get(&spec.name)
            .iter()
            .map(|identity| {
                let fields = spec
                    .fields
                    .iter()
                    .map(|field| {
                        synth
                            .synthesize_field(&spec.name, field, identity, rng)
                            .map(|data| (field.name.clone(), data))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let entity = SyntheticEntity {
                    entity_type: spec.name.clone(),
                    identity: identity.clone(),
                    fields,
                };
                entity.validate(spec, &self.catalog)?;
                Ok(entity)
            })
            .collect()
    }

    /// Single-process run: identities, then entities, into `sink`.
    pub async fn run(&self, sink: &mut dyn Sink) -> Result<GenerationReport, GenerationError> {
        let start = Instant::now();
        let graph = self.build_identities().await?;
        let identity_time_ms = start.elapsed().as_millis() as u64;

        let mut report = self.synthesize(&graph, sink).await?;
        report.identity_time_ms = identity_time_ms;

        info!(
            "Generated {} entities from {} identities in {}ms",
            report.entity_count(),
            report.identity_count,
            report.identity_time_ms + report.synthesis_time_ms
        );
        Ok(report)
    }

    /// Runs into memory and returns every batch.
    pub async fn generate(&self) -> Result<Vec<(String, Vec<SyntheticEntity>)>, GenerationError> {
        let mut sink = CollectingSink::new();
        self.run(&mut sink).await?;
        Ok(sink.batches)
    }
}
