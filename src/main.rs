use pocket_purchases::{
    config::Config, models::Product, services::OfflineStorefront, PurchasesClient,
    PurchasesContext,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pocket_purchases=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting pocket-purchases receipt reconciliation");

    // Load configuration
    let config = Config::load()?;

    tracing::info!(
        "Loaded configuration - {} catalog product(s), state stored at {}",
        config.catalog.len(),
        config.storage.path.display()
    );

    let storefront = OfflineStorefront::new(config.catalog.iter().map(Product::from));
    let client = PurchasesContext::from_config(&config, storefront).await?;

    let mut events = client.subscribe();
    client.setup().await;

    for event in events.drain() {
        tracing::debug!("Event: {:?}", event);
    }

    println!("{}", serde_json::to_string_pretty(&client.state())?);

    Ok(())
}
