use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskman::auth::TokenVerifier;
use taskman::config::AppConfig;
use taskman::db;
use taskman::routes::router;
use taskman::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "taskman=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;
    db::seed::seed_if_empty(&pool).await?;

    let verifier = config.auth.as_ref().map(|auth| Arc::new(TokenVerifier::new(auth)));
    if verifier.is_none() {
        info!("JWT settings not configured, running without authentication");
    }

    let state = AppState {
        db: pool.clone(),
        verifier,
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    pool.close().await;

    Ok(())
}
