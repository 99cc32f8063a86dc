//! tracking CLI: run the ingestion service or the worker pool.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracking_rs::api::{self, AppState};
use tracking_rs::config::Config;
use tracking_rs::db::Db;
use tracking_rs::ingest::Ingestor;
use tracking_rs::model::NewEvent;
use tracking_rs::queue::PgmqDispatcher;
use tracking_rs::store::EventStore;
use tracking_rs::telemetry::{TelemetryConfig, init_telemetry};
use tracking_rs::worker::{EventProcessor, HandlerRegistry, WorkerConfig, WorkerPool};

#[derive(Parser)]
#[command(name = "tracking", about = "Tracking event ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP ingestion service
    Serve {
        /// Listen address (overrides HTTP_ADDR)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Run the worker pool that persists queued events
    Work {
        /// Maximum parallel deliveries (overrides WORKER_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Apply database migrations and create the queue
    Migrate,
    /// Submit a single event
    Ingest {
        /// Event name
        name: String,
        /// Subject user ID
        user_id: String,
        /// Originating system
        source: String,
        /// JSON metadata object
        #[arg(long)]
        metadata: Option<String>,
        /// Occurrence time (RFC 3339)
        #[arg(long)]
        occurred_at: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve { addr } => cmd_serve(config, addr).await,
        Command::Work { concurrency } => cmd_work(config, concurrency).await,
        Command::Migrate => {
            connect(&config).await?;
            println!("Migrated; queue '{}' ready.", config.queue);
            Ok(())
        }
        Command::Ingest {
            name,
            user_id,
            source,
            metadata,
            occurred_at,
        } => cmd_ingest(config, name, user_id, source, metadata, occurred_at).await,
    }
}

/// Connect, migrate, and make sure the queue exists.
async fn connect(config: &Config) -> anyhow::Result<Arc<Db>> {
    let db = Db::connect(config.database_url.expose_secret(), config.db_max_connections).await?;
    db.migrate().await?;
    db.create_queue(&config.queue).await?;
    Ok(Arc::new(db))
}

fn ingestor(config: &Config, db: Arc<Db>) -> Ingestor {
    Ingestor::new(Arc::new(PgmqDispatcher::new(db, config.queue.clone())))
        .with_timeouts(config.dispatch_timeout, config.request_timeout)
}

async fn cmd_serve(config: Config, addr: Option<String>) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "tracking-service".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = connect(&config).await?;
    let state = AppState::new(Arc::new(ingestor(&config, db)));

    let addr = addr.unwrap_or_else(|| config.http_addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, queue = %config.queue, "ingestion service listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

async fn cmd_work(config: Config, concurrency: Option<usize>) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "tracking-worker".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = connect(&config).await?;

    let store: Arc<dyn EventStore> = db.clone();
    let registry = HandlerRegistry::empty().register(Arc::new(EventProcessor::new(store)));

    let pool = WorkerPool::new(
        db,
        Arc::new(registry),
        WorkerConfig {
            queue: config.queue.clone(),
            concurrency: concurrency.unwrap_or(config.worker_concurrency).max(1),
            ..WorkerConfig::default()
        },
    );

    let handle = pool.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        handle.shutdown();
    });

    pool.run().await?;
    Ok(())
}

async fn cmd_ingest(
    config: Config,
    name: String,
    user_id: String,
    source: String,
    metadata: Option<String>,
    occurred_at: Option<String>,
) -> anyhow::Result<()> {
    let mut new = NewEvent::new(name, user_id, source);
    if let Some(json) = metadata {
        new = new.metadata(serde_json::from_str(&json)?);
    }
    if let Some(at) = occurred_at {
        new = new.occurred_at(chrono::DateTime::parse_from_rfc3339(&at)?);
    }

    let db = connect(&config).await?;
    let event = ingestor(&config, db).ingest(new).await?;

    println!("Accepted: {} (received {})", event.id(), event.received_at());
    Ok(())
}
