//! metamap CLI: map extracted metadata onto stored assets.
//!
//! Usage:
//!   metamap map --config settings.yaml --metadata exif.json [--asset <id>] [--db path]
//!   metamap show <asset-id> [--db path]
//!   metamap tags | collections [--db path]

use clap::{Parser, Subcommand};
use metamap::{
    Asset, AssetId, MetaDataCollection, MetaDataMapper, OpenStore, PathEvaluator, Repositories,
    Settings, SqliteStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "metamap",
    version,
    about = "Map extracted media metadata onto assets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a metadata JSON file onto an asset
    Map {
        /// YAML settings with `metadata_mapping` and `default_context`
        #[arg(long)]
        config: PathBuf,
        /// JSON object of extracted metadata
        #[arg(long)]
        metadata: PathBuf,
        /// Existing asset to update; a new asset is created when omitted
        #[arg(long)]
        asset: Option<AssetId>,
    },
    /// Print an asset as JSON
    Show {
        /// Asset ID
        asset: AssetId,
    },
    /// List all tags
    Tags,
    /// List all collections
    Collections,
}

/// Get the default database path (~/.local/share/metamap/metamap.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("metamap").join("metamap.db")
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(Arc::new(store))
}

fn read_metadata(path: &Path) -> Result<MetaDataCollection, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("{} is not a JSON object of metadata: {}", path.display(), e))
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn run_map(store: Arc<SqliteStore>, config: &Path, metadata: &Path, asset_id: Option<AssetId>) -> Result<Asset, String> {
    let settings = Settings::load(config).map_err(|e| e.to_string())?;
    let metadata = read_metadata(metadata)?;

    let mut asset = match asset_id {
        Some(id) => store
            .load_asset(&id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("asset '{}' not found", id))?,
        None => Asset::new(),
    };

    let mapper = MetaDataMapper::new(
        settings,
        Arc::new(PathEvaluator::new()),
        Repositories::from_store(Arc::clone(&store)),
    );
    mapper
        .map_metadata(&mut asset, &metadata)
        .map_err(|e| e.to_string())?;

    if asset_id.is_none() {
        store.add_asset(&asset).map_err(|e| e.to_string())?;
        tracing::info!(asset = %asset.id, "created asset");
    }
    Ok(asset)
}

fn cmd_map(store: Arc<SqliteStore>, config: &Path, metadata: &Path, asset_id: Option<AssetId>) -> i32 {
    match run_map(store, config, metadata, asset_id) {
        Ok(asset) => print_json(&asset),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_show(store: &SqliteStore, id: &AssetId) -> i32 {
    match store.load_asset(id) {
        Ok(Some(asset)) => print_json(&asset),
        Ok(None) => {
            eprintln!("Error: asset '{}' not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_tags(store: &SqliteStore) -> i32 {
    match store.list_tags() {
        Ok(tags) => {
            for tag in tags {
                println!("{}\t{}", tag.id, tag.label);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_collections(store: &SqliteStore) -> i32 {
    match store.list_collections() {
        Ok(collections) => {
            for collection in collections {
                println!("{}\t{}", collection.id, collection.title);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match open_store(cli.db) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Map { config, metadata, asset } => cmd_map(store, &config, &metadata, asset),
        Commands::Show { asset } => cmd_show(&store, &asset),
        Commands::Tags => cmd_tags(&store),
        Commands::Collections => cmd_collections(&store),
    };
    std::process::exit(code);
}
