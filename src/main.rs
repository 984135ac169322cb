use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emc_core::config::{locale_from_env_value, patient_location_attributes_from_env_value};
use emc_core::{
    CoreConfig, DEFAULT_DATA_DIR, FileGateway, LocationRegistry, MemoryGateway,
    PersistenceGateway,
};

/// Main entry point for the EMC location registry server
///
/// Resolves configuration from the environment, bootstraps the location skeleton and serves the
/// REST API.
///
/// # Environment Variables
/// - `EMC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `EMC_DATA_DIR`: Directory for location and patient records (default: "location_data")
/// - `EMC_STORE`: `file` (default) or `memory`
/// - `EMC_DEFAULT_LOCALE`: Locale used for names (default: "en")
/// - `EMC_PATIENT_LOCATION_ATTRIBUTES`: Comma-separated patient attributes holding a location UUID
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the data directory cannot be created,
/// - bootstrap fails, or
/// - the server address cannot be bound or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("emc=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("EMC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir =
        PathBuf::from(std::env::var("EMC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into()));

    let cfg = Arc::new(CoreConfig::new(
        data_dir.clone(),
        locale_from_env_value(std::env::var("EMC_DEFAULT_LOCALE").ok()),
        patient_location_attributes_from_env_value(
            std::env::var("EMC_PATIENT_LOCATION_ATTRIBUTES").ok(),
        ),
    )?);

    let store = std::env::var("EMC_STORE").unwrap_or_else(|_| "file".into());
    let gateway: Arc<dyn PersistenceGateway> = match store.as_str() {
        "file" => {
            std::fs::create_dir_all(&data_dir)?;
            tracing::info!("++ Using file store at {}", data_dir.display());
            Arc::new(FileGateway::new(cfg.clone()))
        }
        "memory" => {
            tracing::info!("++ Using in-memory store");
            Arc::new(MemoryGateway::new())
        }
        other => anyhow::bail!("Unknown EMC_STORE value: {other}"),
    };

    let registry = LocationRegistry::new(cfg, gateway).bootstrap()?;
    let created = registry.bootstrap_report().created.len();
    if created > 0 {
        tracing::info!("++ Bootstrap created {} locations", created);
    }

    api_rest::serve(&rest_addr, registry).await
}
