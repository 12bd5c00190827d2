//! Example: Split generation into an identity stage and an entity stage.
//!
//! The first generator builds the identity graph and writes it to a file.
//! A second generator with a fresh in-memory provider reads the file back,
//! restores it, and synthesizes the entities. The output matches a run that
//! does both in one process.
//!
//! Run with:
//! ```
//! cargo run -p catalog-fixtures --example two_stage
//! ```

use std::io::Write;

use catalog_fixtures::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let workdir = tempfile::tempdir()?;

    // A tiny vocabulary for the MeSH-backed fields of the built-in schemas
    let vocabulary_path = workdir.path().join("mesh.bin");
    let mut vocabulary = std::fs::File::create(&vocabulary_path)?;
    for code in ["D000001", "D000002", "D000003", "D012345"] {
        writeln!(vocabulary, "*NEWRECORD\nUI = {code}")?;
    }

    let config = SeedConfig {
        count: 60,
        seed: 2024,
        vocabulary_path: Some(vocabulary_path),
        ..Default::default()
    };

    // Stage 1: identities only
    let map_path = workdir.path().join("identities.json");
    {
        let generator = Generator::from_config(config.clone())?;
        let graph = generator.build_identities().await?;
        graph.save(&map_path)?;
        tracing::info!("Stage 1 wrote {} identities", graph.len());
    }

    // Stage 2: a new generator and provider, fed from the file
    let generator = Generator::from_config(config)?;
    let graph = IdentityMap::load(&map_path)?;
    generator.restore_identities(&graph).await?;

    let mut sink = NdjsonSink::new(workdir.path().join("out"));
    let report = generator.synthesize(&graph, &mut sink).await?;

    tracing::info!("Stage 2 wrote {} entities:", report.entity_count());
    for (entity_type, count) in &report.counts {
        tracing::info!("  {}: {}", entity_type, count);
    }

    let sample = std::fs::read_to_string(sink.path_for("Person"))?;
    if let Some(line) = sample.lines().next() {
        tracing::info!("First person: {}", line);
    }

    Ok(())
}
