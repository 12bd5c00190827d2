//! Fixture generation entry point.
//!
//! Run with:
//! ```
//! FIXTURES_CONFIG=fixtures.json cargo run -p catalog-fixtures --bin generate
//! ```
//!
//! `FIXTURES_STAGE=identities` only builds the identity graph and writes it to
//! `FIXTURES_IDENTITY_MAP`; `FIXTURES_STAGE=entities` reads that file back and
//! synthesizes entities. The default `all` does both in one process.

use std::env;

use catalog_fixtures::prelude::*;
use catalog_identity::RemoteIdentityProvider;
use tracing_subscriber::EnvFilter;

async fn make_sink() -> anyhow::Result<Box<dyn Sink>> {
    if let Ok(url) = env::var("INGEST_URL") {
        let sink = ApiSink::new(url.clone());
        sink.check_health().await?;
        tracing::info!("Loading entities into {}", url);
        return Ok(Box::new(sink));
    }

    let dir = env::var("FIXTURES_OUTPUT").unwrap_or_else(|_| "fixtures".to_string());
    tracing::info!("Writing entities to {}", dir);
    Ok(Box::new(NdjsonSink::new(dir)))
}

fn log_report(report: &GenerationReport) {
    tracing::info!("Generation completed!");
    for (entity_type, count) in &report.counts {
        tracing::info!("  {}: {}", entity_type, count);
    }
    tracing::info!("  Identities: {}", report.identity_count);
    tracing::info!(
        "  Time: {}ms identities, {}ms entities",
        report.identity_time_ms,
        report.synthesis_time_ms
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match env::var("FIXTURES_CONFIG") {
        Ok(path) => {
            tracing::info!("Reading configuration from {}", path);
            SeedConfig::from_file(&path)?
        }
        Err(_) => SeedConfig::default(),
    };
    if let Ok(url) = env::var("IDENTITY_URL") {
        config.identity = IdentityBackend::Remote { url };
    }

    if let IdentityBackend::Remote { url } = &config.identity {
        RemoteIdentityProvider::new(url.clone()).check_health().await?;
        tracing::info!("Connected to identity service at {}", url);
    }

    let stage = env::var("FIXTURES_STAGE").unwrap_or_else(|_| "all".to_string());
    let map_path =
        env::var("FIXTURES_IDENTITY_MAP").unwrap_or_else(|_| "identities.json".to_string());

    let generator = Generator::from_config(config)?;

    match stage.as_str() {
        "identities" => {
            let graph = generator.build_identities().await?;
            graph.save(&map_path)?;
            tracing::info!("Wrote {} identities to {}", graph.len(), map_path);
        }
        "entities" => {
            let graph = IdentityMap::load(&map_path)?;
            generator.restore_identities(&graph).await?;
            let mut sink = make_sink().await?;
            let report = generator.synthesize(&graph, sink.as_mut()).await?;
            log_report(&report);
        }
        "all" => {
            let mut sink = make_sink().await?;
            let report = generator.run(sink.as_mut()).await?;
            log_report(&report);
        }
        other => {
            anyhow::bail!("Unknown FIXTURES_STAGE {other:?}, expected all, identities or entities")
        }
    }

    Ok(())
}
