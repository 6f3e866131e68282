use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use server::config::AppConfig;
use server::{create_router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sitesmith")]
#[command(about = "Builds single-page apps from task briefs and publishes them", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Overrides the port of BIND_ADDR
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Load the configuration and print it with credentials redacted
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port.or(cli.port)).await,
        Some(Commands::CheckConfig) => check_config(),
        None => serve(cli.port).await,
    }
}

fn load_config(port: Option<u16>) -> Result<AppConfig> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    Ok(match port {
        Some(port) => config.with_port(port),
        None => config,
    })
}

async fn serve(port: Option<u16>) -> Result<()> {
    init_tracing();

    let config = load_config(port)?;
    let bind_addr = config.bind_addr;
    tracing::info!("GitHub account: {}", config.github_username);
    tracing::info!("Model: {} at {}", config.llm_model, config.llm_base_url);

    let state = AppState::from_config(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    println!();
    println!("Sitesmith");
    println!("════════════════════════════════════════");
    println!();
    println!("  API Server:  http://{}", listener.local_addr()?);
    println!("  Swagger UI:  http://{}/swagger-ui", listener.local_addr()?);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn check_config() -> Result<()> {
    let config = load_config(None)?;
    println!("{:#?}", config);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

const DEFAULT_LOG_FILTER: &str =
    "sitesmith=info,server=info,orchestrator=info,github=info,llm=info,tower_http=info";

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();
}
