//! wpc-catalog - Work Priority Catalog service
//!
//! Maintains the catalog of prioritizable work items: weighted scoring
//! over per-subject criteria, and read-only reconciliation of
//! descriptive fields from the external Redmine tracker.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wpc_catalog::config::RedmineConfig;
use wpc_catalog::services::redmine_client::RedmineClient;
use wpc_catalog::AppState;

const BIND_ADDR: &str = "127.0.0.1:5810";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting wpc-catalog (Work Priority Catalog)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Resolve configuration. Missing Redmine credentials are
    // fatal here: the service must not come up without its sync surface.
    let toml_config = wpc_common::config::load_toml_config()?;
    let redmine_config = RedmineConfig::resolve(&toml_config)?;
    info!(url = %redmine_config.url, "Redmine credentials configured");

    // Step 2: Resolve data folder and open the database
    let data_folder = wpc_common::config::resolve_data_folder(&toml_config);
    let db_path = wpc_common::config::ensure_data_folder(&data_folder)?;
    info!("Database: {}", db_path.display());

    let db_pool = wpc_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    // Step 3: Build the tracker client and application state
    let redmine = RedmineClient::new(&redmine_config)
        .map_err(|e| anyhow::anyhow!("Failed to create Redmine client: {e}"))?;
    let state = AppState::new(db_pool, redmine, redmine_config);

    let app = wpc_catalog::build_router(state);

    let listener = tokio::net::TcpListener::bind(BIND_ADDR).await?;
    info!("Listening on http://{BIND_ADDR}");
    info!("Health check: http://{BIND_ADDR}/health");

    axum::serve(listener, app).await?;

    Ok(())
}
