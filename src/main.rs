use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use cosmos_migrator::{
    load_documents, read_config, CollectionRef, EmulatorStore, MigratorService,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "migrator.json";

/// Cosmos Migrator - bulk upload and purge for partitioned containers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, env = "COSMOS_MIGRATOR_CONFIG", default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Account endpoint (path of the account snapshot file)
    #[arg(long, env = "COSMOS_MIGRATOR_ENDPOINT")]
    endpoint: Option<String>,

    /// Account primary key
    #[arg(long, env = "COSMOS_MIGRATOR_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Maximum results per page when enumerating
    #[arg(long)]
    page_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List databases in the account
    Databases,
    /// List containers in a database
    Containers { database: String },
    /// Show the partition key field of a container
    PartitionKey { database: String, container: String },
    /// Upload documents from a JSON file
    Upload {
        database: String,
        container: String,
        file: PathBuf,
    },
    /// Delete every document in a container
    Purge { database: String, container: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = read_config(&args.config)
        .await
        .with_context(|| format!("reading {}", args.config.display()))?
        .unwrap_or_default()
        .merge(args.endpoint, args.key, args.page_size);

    let endpoint = config
        .endpoint
        .clone()
        .ok_or_else(|| anyhow!("no endpoint configured"))?;
    let key = config
        .primary_key
        .clone()
        .ok_or_else(|| anyhow!("no primary key configured"))?;

    let mut service =
        MigratorService::new(EmulatorStore::file_backed().with_page_size(config.page_size));
    service.initialize(&endpoint, &key).await?;

    let result = run(&service, args.command).await;
    service.shutdown().await;
    result
}

async fn run(
    service: &MigratorService<EmulatorStore>,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Databases => {
            for name in service.list_databases().await? {
                println!("{}", name);
            }
        }
        Command::Containers { database } => {
            for name in service.list_containers(&database).await? {
                println!("{}", name);
            }
        }
        Command::PartitionKey {
            database,
            container,
        } => {
            let collection = CollectionRef::new(database, container);
            println!("{}", service.get_partition_key_path(&collection).await?);
        }
        Command::Upload {
            database,
            container,
            file,
        } => {
            let mut documents = load_documents(&file)
                .await
                .with_context(|| format!("loading {}", file.display()))?;
            let collection = CollectionRef::new(database, container);
            service.upload_documents(&collection, &mut documents).await?;
            info!("Uploaded {} documents to {}", documents.len(), collection);
        }
        Command::Purge {
            database,
            container,
        } => {
            let collection = CollectionRef::new(database, container);
            service.delete_all_items(&collection).await?;
        }
    }

    Ok(())
}
