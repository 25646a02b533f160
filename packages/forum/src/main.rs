use anyhow::{Context, Result};
use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::cors::CorsLayer;
use tower_http::trace::MakeSpan;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use uuid::Uuid;

mod auth;
mod config;
mod db;
mod handlers;
mod metrics;
mod models;
mod repository;
#[cfg(test)]
mod test_helpers;
mod ws;

use crate::auth::AuthState;
use crate::config::{AuthConfig, FileConfig, ForumConfig, ServerConfig};
use crate::db::Database;
use crate::metrics::ServerMetrics;
use crate::repository::ForumRepository;
use crate::ws::Hub;

/// Custom span maker that adds a unique request ID to each incoming request
#[derive(Clone)]
struct RequestIdMakeSpan;

impl<B> MakeSpan<B> for RequestIdMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> tracing::Span {
        let request_id = Uuid::new_v4().to_string();
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

#[derive(Parser)]
#[command(name = "forum")]
#[command(about = "Real-time forum server with live presence and private messages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Custom data directory (defaults to ~/.forum)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server in the foreground
    Serve(ServeArgs),
}

#[derive(Parser, Default)]
struct ServeArgs {
    /// Port for the web server (overrides config.toml / FORUM_SERVER__PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides config.toml / FORUM_SERVER__HOST)
    #[arg(short = 'b', long)]
    host: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Clean start - reset database (prompt for confirmation)
    #[arg(long)]
    reset_db: bool,
}

#[derive(Clone)]
pub(crate) struct AppState {
    /// Server runtime configuration
    pub server_config: Arc<ServerConfig>,
    /// Authentication configuration
    pub auth_config: Arc<AuthConfig>,
    /// Server metrics for observability
    pub metrics: Arc<ServerMetrics>,
    pub db: Arc<Database>,
    pub repository: Arc<ForumRepository>,
    /// Live-connection hub
    pub hub: Arc<Hub>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        AuthState {
            resolver: state.repository.clone(),
            auth_config: state.auth_config.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => run_server(args, cli.data_dir).await,
        None => run_server(ServeArgs::default(), cli.data_dir).await,
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(handlers::forum_websocket_handler))
        .route(
            "/api/posts",
            get(handlers::list_posts_handler).post(handlers::create_post_handler),
        )
        .route("/api/messages", get(handlers::message_history_handler))
        .route("/api/users/online", get(handlers::online_users_handler))
        .route("/api/logout", post(handlers::logout_handler))
        .route("/health", get(handlers::health_handler))
        .route("/health/live", get(handlers::health_live_handler))
        .route("/health/ready", get(handlers::health_ready_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(TraceLayer::new_for_http().make_span_with(RequestIdMakeSpan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn run_server(args: ServeArgs, data_dir: Option<PathBuf>) -> Result<()> {
    let default_directive = if args.debug {
        "forum=debug,tower_http=debug,info"
    } else {
        "forum=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    info!("Starting forum server");

    let config = Arc::new(ForumConfig::new(data_dir)?);

    let file_config: FileConfig = config::load_config(&config.data_dir)
        .extract()
        .with_context(|| {
            format!(
                "Invalid configuration in {}",
                config.config_toml_path().display()
            )
        })?;

    if args.reset_db && config.db_path.exists() {
        println!("This will delete all users, posts and messages!");
        print!("Are you sure? (yes/no): ");
        use std::io::{self, Write};
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim() == "yes" {
            config.reset_database()?;
            println!("Database reset.");
        } else {
            println!("Cancelled.");
        }
    }

    info!("Initializing database...");
    let db = Arc::new(Database::new(&config).await?);
    let repository = Arc::new(ForumRepository::new(db.pool.clone()));

    let mut server_config = ServerConfig::from_file(&file_config.server);
    if let Some(port) = args.port {
        server_config.port = port;
    }
    if let Some(host) = args.host {
        server_config.host = host;
    }
    let server_config = Arc::new(server_config);
    info!(
        "Server config: send_queue_capacity={}",
        server_config.websocket.send_queue_capacity
    );

    let auth_config = Arc::new(AuthConfig::from_file(&file_config.auth));
    let metrics = Arc::new(ServerMetrics::new());
    let hub = Arc::new(Hub::new(repository.clone(), metrics.clone()));

    let app_state = AppState {
        server_config: server_config.clone(),
        auth_config,
        metrics,
        db: db.clone(),
        repository,
        hub,
    };

    let app = build_router(app_state);

    let addr = format!("{}:{}", server_config.host, server_config.port)
        .parse::<SocketAddr>()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                server_config.host, server_config.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Forum listening on http://{}", actual_addr);
    info!("");
    info!("API endpoints:");
    info!("  GET    /ws                 - Live connection (session cookie)");
    info!("  GET    /api/posts          - List posts");
    info!("  POST   /api/posts          - Create post");
    info!("  GET    /api/messages       - Private message history");
    info!("  GET    /api/users/online   - Online users");
    info!("  POST   /api/logout         - End session");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    db.pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
