//! essaygen CLI: run the server, or work with the item store directly.

use essaygen::config::{Config, StorageConfig};
use essaygen::engine::{BatchConfig, BatchProcessor};
use essaygen::event::ProgressEvent;
use essaygen::llm::{GenerationClient, RigCompleter, deepseek_client};
use essaygen::model::{Item, ItemId};
use essaygen::progress::{Broadcaster, ProgressSink};
use essaygen::server::{self, AppState};
use essaygen::storage::ItemStore;
use essaygen::telemetry::{TelemetryConfig, TelemetryGuard, init_telemetry};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "essaygen", about = "Batch essay summary generation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Item store directory (overrides DATA_DIR)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Built browser client to serve at / (overrides STATIC_DIR)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Stored essay operations
    Essays {
        #[command(subcommand)]
        action: EssayAction,
    },
}

#[derive(Subcommand)]
enum EssayAction {
    /// List stored essays, newest first
    List {
        /// Case-insensitive substring filter
        #[arg(long)]
        search: Option<String>,
        /// Maximum essays to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one essay
    Show {
        /// Essay id
        id: i64,
    },
    /// Delete one essay
    Delete {
        /// Essay id
        id: i64,
    },
    /// Generate essays for the given topics, in order
    Generate {
        #[arg(required = true)]
        topics: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            data_dir,
            static_dir,
        } => cmd_serve(port, data_dir, static_dir).await,
        Command::Essays { action } => match action {
            EssayAction::List { search, limit } => {
                let _guard = init_store_telemetry()?;
                cmd_essays_list(&open_store()?, search.as_deref(), limit).await
            }
            EssayAction::Show { id } => {
                let _guard = init_store_telemetry()?;
                cmd_essays_show(&open_store()?, id).await
            }
            EssayAction::Delete { id } => {
                let _guard = init_store_telemetry()?;
                cmd_essays_delete(&open_store()?, id).await
            }
            EssayAction::Generate { topics } => cmd_essays_generate(topics).await,
        },
    }
}

/// Warnings only, so skipped chunks surface without cluttering the output.
/// Store commands run without the API key, so this skips `Config`.
fn init_store_telemetry() -> anyhow::Result<TelemetryGuard> {
    Ok(init_telemetry(TelemetryConfig {
        endpoint: std::env::var("OTEL_ENDPOINT").ok(),
        service_name: "essaygen-cli".to_string(),
        default_filter: "warn".to_string(),
    })?)
}

fn open_store() -> anyhow::Result<ItemStore> {
    let storage = StorageConfig::from_env()?;
    Ok(ItemStore::new(storage.data_dir, storage.chunk_size))
}

fn build_processor(
    config: &Config,
    store: Arc<ItemStore>,
    sink: Arc<dyn ProgressSink>,
) -> anyhow::Result<BatchProcessor<RigCompleter>> {
    let client = deepseek_client(&config.deepseek_api_key)?;
    let generator = GenerationClient::new(
        RigCompleter::new(&client, &config.model),
        config.generation_timeout,
    );
    Ok(BatchProcessor::new(
        generator,
        store,
        sink,
        BatchConfig {
            request_delay: config.request_delay,
            flush_every: config.flush_every,
        },
    ))
}

async fn cmd_serve(
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    if static_dir.is_some() {
        config.static_dir = static_dir;
    }

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "essaygen".to_string(),
        default_filter: config.log_level.clone(),
    })?;

    let store = Arc::new(ItemStore::new(
        config.storage.data_dir.clone(),
        config.storage.chunk_size,
    ));
    let broadcaster = Broadcaster::new();
    let processor = build_processor(&config, store, Arc::new(broadcaster.clone()))?;
    let state = AppState::new(Arc::new(processor), broadcaster);
    let app = server::router(state, config.static_dir.as_deref());

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        %addr,
        data_dir = %config.storage.data_dir.display(),
        model = %config.model,
        "essaygen initialized"
    );

    server::serve(listener, app, shutdown_signal()).await?;
    tracing::info!("essaygen stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    tracing::info!("essaygen shutting down");
}

async fn cmd_essays_list(
    store: &ItemStore,
    search: Option<&str>,
    limit: usize,
) -> anyhow::Result<()> {
    let items = store.list(search).await?;

    if items.is_empty() {
        println!("No essays found.");
        return Ok(());
    }

    // Header
    println!(
        "{:<14}  {:<6}  {:<40}  {:<30}  CREATED",
        "ID", "STATUS", "TOPIC", "CATEGORY"
    );
    println!("{}", "-".repeat(110));

    for item in items.iter().take(limit) {
        let (status, category) = match item.summary() {
            Some(summary) => ("ok", summary.category.as_str()),
            None => ("error", "-"),
        };
        println!(
            "{:<14}  {:<6}  {:<40}  {:<30}  {}",
            item.id,
            status,
            truncate(&item.topic, 40),
            truncate(category, 30),
            item.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n{} of {} essay(s)", items.len().min(limit), items.len());
    Ok(())
}

async fn cmd_essays_show(store: &ItemStore, id: i64) -> anyhow::Result<()> {
    let items = store.load().await?;
    let Some(item) = items.into_iter().find(|item| item.id == ItemId(id)) else {
        anyhow::bail!("no essay with id {id}");
    };
    print_item(&item);
    Ok(())
}

async fn cmd_essays_delete(store: &ItemStore, id: i64) -> anyhow::Result<()> {
    if store.delete(ItemId(id)).await? {
        println!("Deleted: {id}");
    } else {
        println!("No essay with id {id}; nothing to delete.");
    }
    Ok(())
}

async fn cmd_essays_generate(topics: Vec<String>) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "essaygen-cli".to_string(),
        default_filter: "warn".to_string(),
    })?;

    let store = Arc::new(ItemStore::new(
        config.storage.data_dir.clone(),
        config.storage.chunk_size,
    ));
    let processor = build_processor(&config, store, Arc::new(ConsoleSink))?;
    let results = processor.run(topics).await?;

    let failed = results.iter().filter(|item| item.is_failed()).count();
    println!(
        "\nProcessed {} topic(s): {} ok, {failed} failed",
        results.len(),
        results.len() - failed
    );
    Ok(())
}

/// Prints batch progress to stdout.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Connected => {}
            ProgressEvent::Progress {
                current,
                total,
                topic,
            } => println!("[{current}/{total}] {topic}"),
            ProgressEvent::EssayCompleted { essay, .. } => {
                let category = essay.summary().map_or("-", |s| s.category.as_str());
                println!("  ok    {} ({category})", essay.id);
            }
            ProgressEvent::EssayError { error, .. } => println!("  error {error}"),
        }
    }
}

fn print_item(item: &Item) {
    println!("ID:         {}", item.id);
    println!("Topic:      {}", item.topic);
    println!("Created:    {}", item.created_at);
    match item.summary() {
        Some(s) => {
            println!("Category:   {}", s.category);
            println!("---");
            println!("Summary:    {}", s.summary);
            println!("Product:    {}", s.product);
            println!("Problem:    {}", s.problem);
            println!("Relevance:  {}", s.relevance);
            println!("Goal:       {}", s.goal);
            println!("Resources:  {}", s.resources);
            println!("Roles:      {}", s.roles);
            println!("Audience:   {}", s.target_audience);
        }
        None => println!("Error:      {}", item.error().unwrap_or("-")),
    }
}

/// Cut `s` to at most `max` characters, on a char boundary.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
