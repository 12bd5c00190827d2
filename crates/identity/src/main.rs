use std::env;
use std::sync::Arc;

use catalog_identity::{MemoryIdentityProvider, run_server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let provider = match env::var("IDENTITY_SEED") {
        Ok(seed) => {
            let seed: u64 = seed.parse()?;
            tracing::info!("Seeding identifier generation with {}", seed);
            MemoryIdentityProvider::with_seed(seed)
        }
        Err(_) => MemoryIdentityProvider::new(),
    };

    let port = env::var("PORT")
        .unwrap_or_else(|_| "3002".to_string())
        .parse::<u16>()
        .unwrap_or(3002);

    run_server(Arc::new(provider), port).await
}
