//! Skema server: serve a YAML/JSON entity config as a REST API.
//!
//! `cargo run -p skema-server -- --config skema.yml`

use clap::Parser;
use skema::{app, connect, load_from_path, materialize, resolve, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;

const EXAMPLE_CONFIG: &str = r#"server:
  port: 8080
  name: "Skema API"
  database: "sqlite://skema.db"
entities:
  - name: User
    fields:
      - { name: name, type: string, required: true }
      - { name: email, type: string, format: email, unique: true }
      - { name: age, type: int, min: 18 }
    relations:
      - { type: has_many, entity: Profile, field: user_id }
  - name: Profile
    fields:
      - { name: bio, type: text }
      - { name: user_id, type: int, required: true }
    relations:
      - { type: belongs_to, entity: User, field: user_id }
"#;

#[derive(Parser, Debug)]
#[command(name = "skema", version, about = "Serve declarative entities as a REST API")]
struct Cli {
    /// Path to the entity config (YAML, or JSON with a .json extension).
    #[arg(long, short, env = "SKEMA_CONFIG", default_value = "skema.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("skema=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    if !cli.config.exists() {
        eprintln!("Config file {} not found.", cli.config.display());
        eprintln!("Create one or pass --config <path>. Example:\n");
        print!("{}", EXAMPLE_CONFIG);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_path(&cli.config)?;
    let registry = resolve(&config)?;
    tracing::info!(name = %config.server.name, entities = registry.entities().len(), "starting");

    let pool = connect(&config.server.database).await?;
    materialize(&pool, &registry).await?;

    let state = AppState::new(pool, registry, config.server.name.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();
    tracing::info!("listening on http://localhost:{}", port);
    tracing::info!("docs available at http://localhost:{}/docs", port);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutting down");
    }
}
