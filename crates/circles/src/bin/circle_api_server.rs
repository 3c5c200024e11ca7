//cargo run --package circles --bin circle_api_server -- config.toml
use circles::{ServerConfig, api};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .finish()
        .init();

    // First argument wins over CIRCLES_CONFIG
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CIRCLES_CONFIG").ok());

    let config = match config_path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            ServerConfig::from_file(&path)?
        }
        None => ServerConfig::default(),
    };

    tracing::info!("Starting circle detection API server");
    if let Err(e) = api::serve(config).await {
        tracing::error!("Circle detection API failed: {:?}", e);
        return Err(e);
    }
    Ok(())
}
