use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use thumbline::application::{Resolution, build_chain, extract_identifier};
use thumbline::domain::{QualityLevel, ResponseCachePort};
use thumbline::infrastructure::image::open_response_cache;
use thumbline::infrastructure::{AppConfig, CliArgs, Command, StorageManager, ThumbnailPipeline};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match (StorageManager::new(), &args.config) {
        (Ok(storage), path) => storage.load_config(path.as_deref())?,
        (Err(_), Some(path)) => {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            StorageManager::with_dir(dir).load_config(Some(path.as_path()))?
        }
        (Err(_), None) => AppConfig::default(),
    };
    config.merge_with_args(args);
    Ok(config)
}

fn print_chain(reference: &str, quality: QualityLevel) -> ExitCode {
    let chain = build_chain(reference, quality);
    if chain.is_empty() {
        eprintln!("no resolvable reference: {reference:?}");
        return ExitCode::FAILURE;
    }
    for (index, candidate) in chain.iter().enumerate() {
        let tier = candidate
            .quality()
            .map_or_else(|| "-".to_string(), |q| q.to_string());
        println!("{index}\t{tier}\t{candidate}");
    }
    ExitCode::SUCCESS
}

fn print_identifier(reference: &str) -> ExitCode {
    let id = extract_identifier(reference);
    if id.is_empty() {
        eprintln!("no identifier in {reference:?}");
        return ExitCode::FAILURE;
    }
    println!("{id}");
    ExitCode::SUCCESS
}

async fn resolve(config: &AppConfig, reference: &str, output: Option<&Path>) -> Result<ExitCode> {
    let pipeline = ThumbnailPipeline::from_config(config)
        .await
        .wrap_err("failed to set up thumbnail pipeline")?;

    match pipeline
        .resolver()
        .resolve_now(reference, config.quality)
        .await
    {
        Resolution::Resolved(resolved) => {
            println!(
                "{}\t{}\t{}x{}",
                resolved.source,
                resolved.url,
                resolved.image.width(),
                resolved.image.height()
            );
            if let Some(path) = output {
                resolved
                    .image
                    .save(path)
                    .wrap_err_with(|| format!("failed to write {}", path.display()))?;
                debug!(path = %path.display(), "Image written");
            }
            Ok(ExitCode::SUCCESS)
        }
        Resolution::Exhausted { reason, attempt } => {
            eprintln!(
                "{reason} ({} candidates, {} attempted)",
                attempt.chain().len(),
                attempt.attempts()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn clear_cache(config: &AppConfig) -> Result<ExitCode> {
    let Some(cache) = open_response_cache(config).await? else {
        println!("persistent cache disabled");
        return Ok(ExitCode::SUCCESS);
    };
    let entries = cache.len();
    cache.clear().await?;
    println!("removed {entries} entries from {}", cache.cache_dir().display());
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    debug!(version = thumbline::VERSION, command = ?args.command, "Starting");

    match &args.command {
        Command::Chain { reference, .. } => Ok(print_chain(reference, config.quality)),
        Command::Id { reference } => Ok(print_identifier(reference)),
        Command::Resolve {
            reference, output, ..
        } => resolve(&config, reference, output.as_deref()).await,
        Command::ClearCache => clear_cache(&config).await,
    }
}
