use anyhow::{anyhow, Result};
use clap::Parser;
use roundtable::config::SecretsConfig;
use roundtable::engine::RemoteEngine;
use roundtable::server::{self, generate_auth_token, ServerAppState, StaticCredentials};
use roundtable::session::StepController;
use roundtable::storage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Roundtable - multi-user research conversation server
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to bind the server to
    #[arg(long, default_value = "5000")]
    port: u16,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Data directory for topics and sessions (default: ~/.roundtable)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Research engine base URL (overrides secrets.toml)
    #[arg(long, env = "ROUNDTABLE_ENGINE_URL")]
    engine_url: Option<String>,

    /// Allowed CORS origins (repeatable; default allows any origin)
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let secrets = SecretsConfig::load()?;

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not determine home directory"))?
            .join(".roundtable"),
    };
    storage::init_data_dir(&data_dir).map_err(|e| anyhow!(e))?;
    log::info!("Data directory: {}", data_dir.display());

    let engine_url = cli
        .engine_url
        .or_else(|| secrets.engine_url.clone())
        .ok_or_else(|| {
            anyhow!("No engine URL configured (use --engine-url or engine_url in secrets.toml)")
        })?;
    let engine = RemoteEngine::new(
        &engine_url,
        Duration::from_secs(secrets.engine_timeout_secs),
    )
    .map_err(|e| anyhow!("{}", e))?;
    log::info!("Research engine at {}", engine_url);

    let provider: Arc<dyn server::AuthProvider> = if secrets.credentials.is_empty() {
        let token = generate_auth_token();
        println!("No credentials configured; generated auth token: {}", token);
        Arc::new(StaticCredentials::single_user(&token, "default"))
    } else {
        Arc::new(StaticCredentials::new(secrets.credentials.clone()))
    };

    let controller = StepController::new(data_dir, Arc::new(engine), secrets);
    let state = ServerAppState::new(controller);

    let cors_origins = if cli.cors_origins.is_empty() {
        None
    } else {
        Some(cli.cors_origins)
    };

    server::run_server(cli.port, &cli.bind, state, provider, cors_origins)
        .await
        .map_err(|e| anyhow!(e))
}
