//! Deterministic synthetic fixtures for catalog entity schemas.
//!
//! A run plans how many records of each entity type to create, assigns every
//! record a stable identity through a [`catalog_identity::IdentityProvider`],
//! and then fills each schema field with plausible values. The same
//! configuration and seed always yield byte-identical output, whether the run
//! happens in one process or in two stages linked by an identity map file.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use catalog_fixtures::prelude::*;
//!
//! let config = SeedConfig {
//!     vocabulary_path: Some("mesh.bin".into()),
//!     ..Default::default()
//! };
//! let generator = Generator::from_config(config)?;
//! let report = generator.run(&mut NdjsonSink::new("out")).await?;
//! ```

pub mod builders;
pub mod config;
pub mod entity;
pub mod error;
pub mod graph;
pub mod patterns;
pub mod planner;
pub mod schema;
pub mod seeds;
pub mod sink;
pub mod synth;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::builders::{GenerationReport, Generator, Stream, stream_seed};
    pub use crate::config::{Locale, SeedConfig};
    pub use crate::entity::{FieldData, FieldValue, SyntheticEntity};
    pub use crate::error::GenerationError;
    pub use crate::graph::IdentityGraphBuilder;
    pub use crate::patterns::{PatternCatalog, Vocabulary};
    pub use crate::planner::{EntityPopulationPlanner, PopulationPlan};
    pub use crate::schema::{
        DeclaredField, DeclaredType, EntitySchema, EntityTypeSpec, FieldSpec, InnerType,
        SchemaIntrospector, SchemaRegistry,
    };
    pub use crate::seeds::{MAX_TOTAL_COUNT, NumericIdRange, NumericSeedAllocator};
    pub use crate::sink::{ApiSink, CollectingSink, NdjsonSink, Sink, SinkError};
    pub use crate::synth::ValueSynthesizer;
    pub use catalog_identity::{Identifier, Identity, IdentityBackend, IdentityMap};
}
