use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use s3_file_store::{
    app::{create_store, StorageBackend, StoreConfig},
    FileStore, ReadOptions, S3Config, S3FileStore, StoreInfo, StoredFile, WriteOptions,
};
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "s3-file-store-cli")]
#[command(about = "Read, write and remove files through an S3 file store", long_about = None)]
struct Cli {
    /// Name the store is registered under
    #[arg(long, env = "STORE_NAME", default_value = "files")]
    store: String,

    /// Storage backend type (s3 or memory)
    #[arg(long, env = "STORAGE_BACKEND", default_value = "s3")]
    storage_backend: String,

    /// S3 bucket name
    #[arg(long, env = "S3_BUCKET")]
    s3_bucket: Option<String>,

    /// Folder prepended to every key
    #[arg(long, env = "S3_FOLDER")]
    s3_folder: Option<String>,

    /// Default canned ACL for new objects
    #[arg(long, env = "S3_ACL", default_value = "private")]
    s3_acl: String,

    /// S3 endpoint URL (for MinIO and other S3-compatible services)
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 region, falls back to AWS_REGION
    #[arg(long, env = "S3_REGION")]
    s3_region: Option<String>,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY")]
    s3_secret_key: Option<String>,

    /// Allow plain HTTP endpoints
    #[arg(long, env = "S3_ALLOW_HTTP", default_value = "false")]
    s3_allow_http: bool,

    /// Total attempts for a streaming read
    #[arg(long, env = "S3_READ_TRIES", default_value = "3")]
    read_tries: u32,

    /// Delay between read attempts in milliseconds
    #[arg(long, env = "S3_READ_TRY_FREQ_MS", default_value = "1000")]
    read_try_freq_ms: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the key a file would be stored under
    Key {
        /// Collection the file belongs to
        collection: String,
        /// File name
        name: String,
        /// File id
        #[arg(long)]
        id: Option<String>,
    },

    /// Upload a file and print its record
    Put {
        /// File path to upload
        file: PathBuf,
        /// Collection the file belongs to
        #[arg(short, long, default_value = "files")]
        collection: String,
        /// Name to store the file under, defaults to the file name
        #[arg(short, long)]
        name: Option<String>,
        /// File id, generated when omitted
        #[arg(long)]
        id: Option<String>,
        /// Content type of the stored object
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download an object
    Get {
        /// Key as printed by `put` or `key`
        key: String,
        /// Output file path, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete an object
    Rm {
        /// Key as printed by `put` or `key`
        key: String,
    },
}

impl Cli {
    fn to_store_config(&self) -> Result<StoreConfig> {
        let backend = match self.storage_backend.as_str() {
            "memory" => StorageBackend::InMemory,
            "s3" => StorageBackend::S3(S3Config {
                endpoint: self.s3_endpoint.clone(),
                region: self.s3_region.clone(),
                access_key_id: self.s3_access_key.clone(),
                secret_access_key: self.s3_secret_key.clone(),
                allow_http: self.s3_allow_http,
                ..Default::default()
            }),
            _ => anyhow::bail!("Unknown storage backend: {}", self.storage_backend),
        };

        let read_options = ReadOptions::new(
            self.read_tries,
            Duration::from_millis(self.read_try_freq_ms),
        )?;

        Ok(StoreConfig {
            name: self.store.clone(),
            bucket: self.s3_bucket.clone(),
            folder: self.s3_folder.clone(),
            default_acl: self.s3_acl.parse()?,
            key_fn: None,
            read_options,
            backend,
        })
    }

    fn init_logging(&self) {
        let level = match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // stdout carries object data for `get`
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn put(
    store: &S3FileStore,
    file: PathBuf,
    collection: String,
    name: Option<String>,
    id: Option<String>,
    content_type: Option<String>,
) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .context("Cannot derive a file name from the upload path")?,
    };

    let mut record = StoredFile::new(collection, name);
    if let Some(id) = id {
        record = record.with_id(id);
    }
    let key = store.resolve_key(&record);

    let mut options = WriteOptions::default();
    if let Some(content_type) = &content_type {
        options = options.with_content_type(content_type);
    }

    let mut source = tokio::fs::File::open(&file)
        .await
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let mut writer = store.open_write_stream(&key, options).await?;
    let size = tokio::io::copy(&mut source, &mut writer).await?;
    writer.shutdown().await?;

    info!(key = %key, size, "Uploaded file");

    record.record_copy(
        store.name().clone(),
        StoreInfo {
            key: Some(key),
            size: Some(size),
            content_type,
            updated_at: Some(Utc::now()),
            ..Default::default()
        },
    );
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

async fn get(store: &S3FileStore, key: &str, output: Option<PathBuf>) -> Result<()> {
    let stream = store
        .open_read_stream(key, store.default_read_options())
        .map_err(std::io::Error::other);
    let mut reader = StreamReader::new(stream);

    let size = match output {
        Some(path) => {
            let mut file = tokio::fs::File::create(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let size = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            size
        }
        None => {
            let mut stdout = tokio::io::stdout();
            let size = tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
            size
        }
    };

    info!(key = %key, size, "Downloaded file");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging();

    let config = cli.to_store_config()?;
    let store = Arc::new(create_store(config).context("Failed to create store")?);

    match cli.command {
        Commands::Key {
            collection,
            name,
            id,
        } => {
            let mut record = StoredFile::new(collection, name);
            if let Some(id) = id {
                record = record.with_id(id);
            }
            println!("{}", store.resolve_key(&record));
        }
        Commands::Put {
            file,
            collection,
            name,
            id,
            content_type,
        } => put(&store, file, collection, name, id, content_type).await?,
        Commands::Get { key, output } => get(&store, &key, output).await?,
        Commands::Rm { key } => {
            store.remove(&key).await?;
            info!(store = %store.name(), key = %key, "Removed file");
        }
    }

    Ok(())
}
