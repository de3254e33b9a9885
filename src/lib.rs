pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod library;
pub mod models;
pub mod services;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, FavoritesCommands, HistoryCommands};
use clients::cinesearch::CinesearchClient;
pub use config::Config;
use library::MovieList;
use metrics_exporter_prometheus::PrometheusHandle;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Entry point once the runtime exists. `config` is loaded by the caller,
/// which needs it before the runtime is built.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cli = Cli::parse();

    config.validate()?;

    init_tracing(&config)?;
    match &config.source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let server_url = cli
        .server
        .clone()
        .unwrap_or_else(|| config.client.server_url.clone());
    let client = CinesearchClient::new(&server_url);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let prometheus_handle = init_metrics(&config)?;
            run_server(config, prometheus_handle).await
        }

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("Created default config.toml");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }

        Commands::Search { query, genre } => {
            let query = query.join(" ");
            cli::cmd_search(&config, &client, &query, genre).await
        }

        Commands::Genres => cli::cmd_genres(&client).await,

        Commands::Details { id } => cli::cmd_details(&client, id).await,

        Commands::History { command } => match command.unwrap_or(HistoryCommands::List) {
            HistoryCommands::List => cli::cmd_history_list(&config),
            HistoryCommands::Remove { term } => cli::cmd_history_remove(&config, &term.join(" ")),
            HistoryCommands::Clear => cli::cmd_history_clear(&config),
        },

        Commands::Favorites { command } => match command {
            FavoritesCommands::List { watchlist, filter } => {
                cli::cmd_favorites_list(&config, &client, list_for(watchlist), filter.as_deref())
                    .await
            }
            FavoritesCommands::Add { id, watchlist } => {
                cli::cmd_favorites_add(&config, list_for(watchlist), id)
            }
            FavoritesCommands::Remove { id, watchlist } => {
                cli::cmd_favorites_remove(&config, list_for(watchlist), id)
            }
        },
    }
}

const fn list_for(watchlist: bool) -> MovieList {
    if watchlist {
        MovieList::Watchlist
    } else {
        MovieList::Liked
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "cinesearch")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

fn init_metrics(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    use metrics_exporter_prometheus::PrometheusBuilder;
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

pub async fn run_server(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Cinesearch v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let shared = Arc::new(SharedState::new(config).await?);
    let api_state = api::create_app_state(shared, prometheus_handle);

    api::rate_limit::spawn_pruner(api_state.auth_limiter.clone());

    let app = api::router(api_state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 API server running at http://0.0.0.0:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
