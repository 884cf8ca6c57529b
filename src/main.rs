//! Storefront service binary.

use anyhow::Result;
use std::sync::Arc;
use storefront::api::{router, AppState};
use storefront::catalog::Catalog;
use storefront::checkout::MockCheckoutGateway;
use storefront::config::Config;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let catalog = Arc::new(Catalog::demo());
    tracing::info!(products = catalog.len(), "catalog seeded");

    let gateway = Arc::new(MockCheckoutGateway::new(config.checkout_base_url.clone()));
    let state = AppState::new(catalog, gateway);
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("storefront listening on {addr}");
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
