use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use notebanner::application::{ImageResolver, RateLimiter};
use notebanner::domain::entities::{BannerSpec, DocumentPath};
use notebanner::domain::ports::ObjectUrlRegistry;
use notebanner::infrastructure::providers::{build_registry, http_client};
use notebanner::infrastructure::{
    AppConfig, BlobStore, CliArgs, Command, FastRandom, FsVault, HttpImageVerifier, StorageManager,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

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
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(storage: &StorageManager, args: &CliArgs) -> Result<AppConfig> {
    let mut config = storage
        .load_config(args.config.as_deref())
        .wrap_err("failed to load configuration")?;
    config.merge_with_args(args);
    config.apply_env_overrides();
    Ok(config)
}

async fn resolve(
    config: &AppConfig,
    input: &str,
    vault: Option<PathBuf>,
    document: &str,
    shuffle: Option<String>,
) -> Result<()> {
    let root = match vault {
        Some(dir) => dir
            .canonicalize()
            .wrap_err_with(|| format!("vault directory {} not found", dir.display()))?,
        None => std::env::current_dir()?,
    };
    debug!(root = %root.display(), "Using vault directory");

    let client = http_client().wrap_err("failed to create HTTP client")?;
    let registry = build_registry(&client, &config.providers.priority, |kind| {
        config.providers.api_key(kind)
    });
    let blobs = Arc::new(BlobStore::new());

    let mut resolver = ImageResolver::new(
        Arc::new(FsVault::new(root)),
        Arc::clone(&blobs) as Arc<dyn ObjectUrlRegistry>,
        Arc::new(RateLimiter::new(config.banner.rate_limit())),
        Arc::new(FastRandom::new()),
        registry,
        &config.banner,
    );
    if config.banner.verify_images {
        resolver = resolver.with_verifier(Arc::new(HttpImageVerifier::new(client.clone())));
    }

    let mut spec = BannerSpec::new(input);
    if let Some(folder) = shuffle {
        spec = spec.with_shuffle_folder(folder);
    }

    let banner = resolver
        .resolve(&DocumentPath::new(document), &spec, true)
        .await
        .ok_or_else(|| eyre!("no banner found for {input:?}"))?;

    println!("{}", serde_json::to_string_pretty(&banner)?);
    if let Some(url) = banner.object_url() {
        if let Some(blob) = blobs.get(url) {
            println!("{} bytes of {}", blob.bytes.len(), blob.mime);
        }
        blobs.revoke(url);
    }
    Ok(())
}

fn list_providers(config: &AppConfig) {
    for (rank, kind) in config.providers.priority.iter().enumerate() {
        let state = config
            .providers
            .api_key(*kind)
            .map_or_else(|| format!("no key (set {})", kind.env_var()), |key| key.masked());
        println!("{}. {:<10} {state}", rank + 1, kind.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let storage = StorageManager::new()?;

    if matches!(args.command, Command::ConfigPath) {
        println!("{}", storage.config_path(args.config.as_deref()).display());
        return Ok(());
    }

    let config = load_config(&storage, &args)?;
    init_logging(&config)?;

    info!(version = notebanner::VERSION, "Starting notebanner");

    match args.command {
        Command::Resolve {
            input,
            vault,
            document,
            shuffle,
        } => resolve(&config, &input, vault, &document, shuffle).await,
        Command::Providers => {
            list_providers(&config);
            Ok(())
        }
        Command::ConfigPath => Ok(()),
    }
}
