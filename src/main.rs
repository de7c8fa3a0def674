//! Trellis Server Entry Point

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trellis::classify::{DimensionRoots, SplitClassifier};
use trellis::config::LogFormat;
use trellis::metrics::get_metrics;
use trellis::oracle::GeminiOracle;
use trellis::taxonomy::{
    ContextBuilder, Dimension, EntityId, Relation, ResultSerializer, TaxonomySnapshot,
};
use trellis::{ApiState, Config, create_router};

/// Trellis: Taxonomy-Guided Classification for Learning Material
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the classification HTTP server (default behavior)
    Serve {
        /// HTTP port. If not specified, uses config file value.
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable JSON logging format
        #[arg(long)]
        json_logs: bool,
    },
    /// Classify a local file and print the result as JSON
    Classify {
        /// Path to the learning-material file
        file: PathBuf,
        /// Logical name for caching (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print the serialized oracle context for one dimension
    Context {
        /// Dimension: area, ability, or scope
        dimension: String,
    },
    /// Print the taxonomy trees as JSON
    Taxonomy,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // For CLI commands (non-serve), use minimal logging
    let is_serve = matches!(args.command, Some(Command::Serve { .. }) | None);

    if !is_serve {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::stderr)
            .init();
    }

    match args.command {
        Some(Command::Serve { port, json_logs }) => run_server(&args.config, port, json_logs).await,
        Some(Command::Classify { file, name }) => run_classify(&args.config, &file, name).await,
        Some(Command::Context { dimension }) => run_context(&args.config, &dimension),
        Some(Command::Taxonomy) => run_taxonomy(&args.config),
        None => run_server(&args.config, None, false).await,
    }
}

/// Run the classification HTTP server.
async fn run_server(
    config_path: &Option<String>,
    port: Option<u16>,
    json_logs: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    // Override port from CLI args only if explicitly provided
    if let Some(p) = port {
        config.server.http_port = p;
    }

    // Initialize tracing for server mode
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if json_logs || config.logging.format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Trellis server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        taxonomy = %config.taxonomy.path,
        model = %config.oracle.model,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    let snapshot = Arc::new(TaxonomySnapshot::from_file(config.taxonomy_path()?)?);
    get_metrics().taxonomy_entities.set(snapshot.len() as i64);
    tracing::info!(entities = snapshot.len(), "Taxonomy loaded");

    let oracle = Arc::new(GeminiOracle::from_config(&config.oracle)?);
    let classifier = Arc::new(SplitClassifier::new(
        snapshot.clone(),
        oracle,
        &dimension_roots(&config),
        Duration::from_secs(config.cache.ttl_secs),
    )?);

    let state = Arc::new(ApiState::new(snapshot, classifier, &config.server));
    let app = create_router(state, &config.server);

    let addr: SocketAddr =
        format!("{}:{}", config.server.bind_addr, config.server.http_port).parse()?;
    tracing::info!("Trellis listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    tracing::info!("Trellis shutting down");
    Ok(())
}

/// Classify one local file against the configured oracle.
async fn run_classify(
    config_path: &Option<String>,
    file: &Path,
    name: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let snapshot = Arc::new(TaxonomySnapshot::from_file(config.taxonomy_path()?)?);
    let oracle = Arc::new(GeminiOracle::from_config(&config.oracle)?);
    let classifier = SplitClassifier::new(
        snapshot.clone(),
        oracle,
        &dimension_roots(&config),
        Duration::from_secs(config.cache.ttl_secs),
    )?;

    let content = tokio::fs::read(file).await?;
    let mime_type = guess_mime_type(file);
    let name = name.or_else(|| file.file_name().map(|n| n.to_string_lossy().into_owned()));

    let result = classifier
        .classify(name.as_deref(), mime_type, content.into())
        .await?;

    println!("{}", serde_json::to_string_pretty(&result.to_response(&snapshot))?);
    Ok(())
}

/// Print the serialized oracle context for one dimension.
fn run_context(config_path: &Option<String>, dimension: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let dimension = Dimension::parse(dimension).ok_or_else(|| {
        anyhow::anyhow!("unknown dimension: {dimension} (expected area, ability, or scope)")
    })?;

    let snapshot = TaxonomySnapshot::from_file(config.taxonomy_path()?)?;
    let root_names = match dimension {
        Dimension::Area => &config.taxonomy.area_roots,
        Dimension::Ability => &config.taxonomy.ability_roots,
        Dimension::Scope => &config.taxonomy.scope_roots,
    };
    let roots = resolve_roots(&snapshot, root_names)?;

    let builder = ContextBuilder::new(&snapshot);
    print!("{}", builder.context(dimension.context_title(), &roots));
    Ok(())
}

/// Print the full taxonomy trees as JSON.
fn run_taxonomy(config_path: &Option<String>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let snapshot = TaxonomySnapshot::from_file(config.taxonomy_path()?)?;
    let serializer = ResultSerializer::new(&snapshot);

    let body = serde_json::json!({
        "taxonomy": {
            "areas": serializer.serialize_tree(
                &resolve_roots(&snapshot, &config.taxonomy.area_roots)?,
                Relation::HasPart,
            ),
            "abilities": serializer.serialize_tree(
                &resolve_roots(&snapshot, &config.taxonomy.ability_roots)?,
                Relation::HasPart,
            ),
            "scopes": serializer.serialize_tree(
                &resolve_roots(&snapshot, &config.taxonomy.scope_roots)?,
                Relation::HasPart,
            ),
        }
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn load_config(config_path: &Option<String>) -> anyhow::Result<Config> {
    Ok(match config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    })
}

fn dimension_roots(config: &Config) -> DimensionRoots {
    DimensionRoots {
        areas: config.taxonomy.area_roots.clone(),
        abilities: config.taxonomy.ability_roots.clone(),
        scopes: config.taxonomy.scope_roots.clone(),
    }
}

fn resolve_roots(snapshot: &TaxonomySnapshot, names: &[String]) -> trellis::Result<Vec<EntityId>> {
    names.iter().map(|name| snapshot.entity(name)).collect()
}

/// Guess a MIME type from the file extension.
fn guess_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
