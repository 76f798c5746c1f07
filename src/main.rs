use anyhow::Context;
use axum::{response::Json, routing::get};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use imgpro::api;
use imgpro::models::{AnalysisMode, AppConfig, ItemStatus, Upload};
use imgpro::server;
use imgpro::services::{
    auto_detect, codec, content_hash, Batch, BatchScheduler, ImagePipeline, PassKind, PassReport,
};

#[derive(Parser)]
#[command(name = "imgpro")]
#[command(about = "Batch image transform pipeline for scanned collectibles")]
struct Cli {
    /// Path to config.yaml (falls back to CONFIG_FILE)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Process image files and write the results to a directory
    Process {
        /// Input image files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for PNGs and manifest.json
        #[arg(short, long)]
        output: PathBuf,

        /// Split each input into one item per detected object first
        #[arg(long)]
        split: bool,

        /// Send results to the configured analysis service
        #[arg(long)]
        analyze: bool,

        /// Analysis mode: general, collectibles or stamps
        #[arg(long)]
        mode: Option<AnalysisMode>,
    },
    /// Print the bounding boxes of objects found on a scan
    Detect {
        /// Input image file
        input: PathBuf,

        /// Print JSON instead of one box per line
        #[arg(long)]
        json: bool,
    },
    /// Print content hashes and flag byte-identical duplicates
    Hash {
        /// Input files, in upload order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print the effective configuration as YAML
    Config,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "imgpro API",
        description = "Batch image transform pipeline for scanned collectibles",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::list_items,
        api::upload_items,
        api::clear_items,
        api::get_item,
        api::delete_item,
        api::update_edits,
        api::retry_item,
        api::get_item_image,
        api::detect_item_blobs,
        api::split_item,
        api::process_batch,
        api::analyze_batch,
        api::export_batch,
        api::get_settings,
        api::update_settings,
    ),
    components(schemas(
        api::ItemSummary,
        api::ItemDetail,
        api::ItemList,
        api::ItemIds,
        api::UploadFile,
        api::UploadRequest,
        api::ClearResponse,
        api::Region,
        api::RegionList,
        api::AnalyzeParams,
        imgpro::models::ProcessingSettings,
        imgpro::models::EditPlan,
        imgpro::models::CropRegion,
        imgpro::services::PassReport,
        imgpro::services::PassKind,
    )),
    tags(
        (name = "Items", description = "Batch membership and per-item editing"),
        (name = "Batch", description = "Transform and analysis passes, export"),
        (name = "Settings", description = "Processing settings")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var("CONFIG_FILE").ok().map(PathBuf::from));

    match cli.command {
        Some(Commands::Serve) => run_server(config_path.as_deref()).await,
        Some(Commands::Process {
            inputs,
            output,
            split,
            analyze,
            mode,
        }) => {
            init_cli_tracing();
            let config = AppConfig::load(config_path.as_deref())?;
            run_process_command(config, &inputs, &output, split, analyze, mode).await
        }
        Some(Commands::Detect { input, json }) => {
            init_cli_tracing();
            let config = AppConfig::load(config_path.as_deref())?;
            run_detect_command(&config, &input, json)
        }
        Some(Commands::Hash { inputs }) => run_hash_command(&inputs),
        Some(Commands::Config) => {
            init_cli_tracing();
            let config = AppConfig::load(config_path.as_deref())?;
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
        None => {
            run_status_command(config_path.as_deref());
            Ok(())
        }
    }
}

/// Minimal logging for CLI
fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgpro=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

fn read_upload(path: &Path) -> anyhow::Result<Upload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Upload::new(filename, codec::mime_for_path(path), bytes))
}

fn print_report(report: &PassReport) {
    let label = match report.kind {
        PassKind::Transform => "Transform",
        PassKind::Analysis => "Analysis",
    };
    println!(
        "{label}: {} eligible, {} succeeded, {} failed",
        report.eligible, report.succeeded, report.failed
    );
}

/// Run files through the pipeline without a server
async fn run_process_command(
    config: AppConfig,
    inputs: &[PathBuf],
    output: &Path,
    split: bool,
    analyze: bool,
    mode: Option<AnalysisMode>,
) -> anyhow::Result<()> {
    let uploads = inputs
        .iter()
        .map(|p| read_upload(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let batch = Batch::new(config.batch.max_items).into_shared();
    let ids = batch.write().await.add(uploads)?;

    if split {
        let options = config.detection.options();
        for id in ids {
            let Some(item) = batch.read().await.get(&id).cloned() else {
                continue;
            };
            let parts = auto_detect::split_item(&item, options).await?;
            if parts.is_empty() {
                eprintln!("{}: no objects detected, kept whole", item.source.filename);
                continue;
            }
            let count = parts.len();
            batch.write().await.split(&id, parts)?;
            println!("{}: split into {count} items", item.source.filename);
        }
    }

    let mut scheduler =
        BatchScheduler::new(config.scheduler.concurrency, Arc::new(ImagePipeline::new()));
    if analyze {
        let analyzer = server::analysis_from_config(&config)?
            .context("--analyze needs analysis.endpoint in the config")?;
        scheduler = scheduler.with_analyzer(analyzer);
    }

    let report = scheduler.process_pending(&batch, &config.processing).await;
    print_report(&report);

    if analyze {
        let mode = mode.unwrap_or(config.analysis.mode);
        let report = scheduler.analyze_completed(&batch, mode).await?;
        print_report(&report);
    }

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let batch = batch.read().await;
    let records = batch.export_records();
    for record in &records {
        let Some(png) = batch.get(&record.id).and_then(|i| i.output.as_ref()) else {
            continue;
        };
        let path = output.join(&record.new_filename);
        std::fs::write(&path, &png.png[..])
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  {} -> {}", record.original_filename, path.display());
    }

    let manifest = output.join("manifest.json");
    std::fs::write(&manifest, serde_json::to_string_pretty(&records)?)?;
    println!("Wrote {} ({} records)", manifest.display(), records.len());

    for item in batch.items().iter().filter(|i| i.status == ItemStatus::Error) {
        if let Some(error) = &item.error {
            eprintln!("  {} failed: {}", item.source.filename, error.message);
        }
    }
    Ok(())
}

fn run_detect_command(config: &AppConfig, input: &Path, json: bool) -> anyhow::Result<()> {
    let upload = read_upload(input)?;
    let regions = auto_detect::detect_regions_blocking(
        &upload.bytes,
        &upload.mime_type,
        &config.detection.options(),
    )?;

    if json {
        let regions: Vec<api::Region> = regions
            .into_iter()
            .map(|r| api::Region {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&regions)?);
    } else if regions.is_empty() {
        println!("No objects detected");
    } else {
        for (n, r) in regions.iter().enumerate() {
            println!("{:>3}: x={} y={} {}x{}", n + 1, r.x, r.y, r.width, r.height);
        }
    }
    Ok(())
}

fn run_hash_command(inputs: &[PathBuf]) -> anyhow::Result<()> {
    let mut hashes = Vec::with_capacity(inputs.len());
    for path in inputs {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        hashes.push(content_hash::compute_content_hash(&bytes));
    }

    let flags = content_hash::duplicate_flags(hashes.iter().map(String::as_str));
    for ((path, hash), duplicate) in inputs.iter().zip(&hashes).zip(flags) {
        let marker = if duplicate { "  (duplicate)" } else { "" };
        println!("{hash}  {}{marker}", path.display());
    }
    Ok(())
}

/// Display status and configuration information
fn run_status_command(config_path: Option<&Path>) {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();

    println!("imgpro v{VERSION}");
    println!("Batch image transform pipeline for scanned collectibles\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("127.0.0.1:3000 (default)")
    );
    println!(
        "  CONFIG_FILE = {}",
        std::env::var("CONFIG_FILE").as_deref().unwrap_or("(not set)")
    );

    println!("\nConfiguration:");
    let source = match config_path {
        Some(p) if p.exists() => p.display().to_string(),
        Some(p) => format!("defaults ({} not found)", p.display()),
        None => "defaults".to_string(),
    };
    println!("  Source:      {source}");
    match AppConfig::load(config_path) {
        Ok(config) => {
            println!("  Concurrency: {}", config.scheduler.concurrency);
            println!("  Max items:   {}", config.batch.max_items);
            println!(
                "  Analysis:    {}",
                config.analysis.endpoint.as_deref().unwrap_or("(disabled)")
            );
        }
        Err(e) => println!("  Error:       {e}"),
    }

    println!("\nCommands:");
    println!("  imgpro serve     Start the HTTP server");
    println!("  imgpro process   Process image files into a directory");
    println!("  imgpro detect    Print object bounding boxes on a scan");
    println!("  imgpro hash      Print content hashes and duplicates");
    println!("  imgpro config    Print the effective configuration");
    println!("\nRun 'imgpro --help' for more details.");
}

/// Run the HTTP server
async fn run_server(config_path: Option<&Path>) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgpro=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let config = AppConfig::load(config_path)?;

    tracing::info!(
        concurrency = config.scheduler.concurrency,
        max_items = config.batch.max_items,
        "Configuration ready"
    );

    let state = server::create_app_state(config)?;

    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "imgpro server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
