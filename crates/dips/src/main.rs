use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde_json::{json, Map, Value};

use dips::db::{collection_repo, dip_repo, file_repo, Database};
use dips::models::{
    Collection, DcDisplayConfig, DigitalFile, Dip, ImportStatus, NewCollection, NewDip,
};
use dips::search::IndexConfig;
use dips::worker::{tasks, WorkerPool};
use dips::{load_config, Config, DipsError};

#[derive(Parser)]
#[command(name = "dips")]
#[command(about = "Ingest DIP METS files and keep the search index in sync", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "DIPS_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds to wait for background jobs before exiting
    #[arg(long, default_value_t = 300)]
    wait_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply pending migrations
    Migrate,

    /// Create a collection
    CreateCollection {
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        link: Option<String>,
    },

    /// Create a DIP inside a collection
    CreateDip {
        #[arg(long)]
        collection: i64,
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        title: Option<String>,
        /// Path of the DIP's objects archive
        #[arg(long)]
        objectszip: String,
    },

    /// Import a METS file into an existing DIP
    Import {
        #[arg(long)]
        dip: i64,
        mets: PathBuf,
    },

    /// Print a DIP with its description and files
    ShowDip {
        id: i64,
        /// Show the DIP even if its import failed
        #[arg(long)]
        editor: bool,
    },

    /// Delete a DIP, its files and their index documents
    DeleteDip { id: i64 },

    /// Delete a collection with everything it contains
    DeleteCollection { id: i64 },

    /// Rebuild every index document from the database
    Reindex,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    dips::logging::init(&config.logging);
    info!("Starting dips v{}", env!("CARGO_PKG_VERSION"));

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &Config) -> Result<(), DipsError> {
    let db = Database::open(&config.database_path)?;
    if matches!(cli.command, Commands::Migrate) {
        println!("Database ready at {}", config.database_path.display());
        return Ok(());
    }

    if config.index == IndexConfig::Memory {
        warn!("Using the in-memory search index; documents are lost when dips exits");
    }
    let index = config.index.build()?;
    let pool = WorkerPool::new(db.clone(), index, config.worker_count)?;
    let sync = pool.synchronizer();

    match cli.command {
        Commands::Migrate => {}
        Commands::CreateCollection {
            identifier,
            title,
            link,
        } => {
            let mut new = NewCollection::new(identifier);
            new.dc.title = title.unwrap_or_default();
            new.link = link.unwrap_or_default();
            new.dc.validate().map_err(|errors| DipsError::Validation {
                entity: "collection",
                errors,
            })?;
            let collection: Collection = sync.create(new)?;
            println!("{}", collection.id);
        }
        Commands::CreateDip {
            collection,
            identifier,
            title,
            objectszip,
        } => {
            if collection_repo::find_by_id(&db, collection)?.is_none() {
                return Err(not_found("Collection", collection));
            }
            let mut new = NewDip::new(collection, identifier, objectszip);
            new.dc.title = title.unwrap_or_default();
            new.dc.validate().map_err(|errors| DipsError::Validation {
                entity: "DIP",
                errors,
            })?;
            let dip: Dip = sync.create(new)?;
            println!("{}", dip.id);
        }
        Commands::Import { dip, mets } => {
            let mut record = dip_repo::find_by_id(&db, dip)?.ok_or_else(|| not_found("DIP", dip))?;
            let job = tasks::queue_import(sync, &mut record, mets)?;
            info!("Waiting for import {}", job.id);
            wait_idle(&pool, cli.wait_timeout);

            let record = dip_repo::find_by_id(&db, dip)?.ok_or_else(|| not_found("DIP", dip))?;
            match record.import_status {
                Some(ImportStatus::Failure) => {
                    eprintln!("{}", record.import_error_message(&db)?);
                }
                status => println!(
                    "Import {}: {}",
                    job.id,
                    status.map(|s| s.as_str()).unwrap_or("UNKNOWN")
                ),
            }
        }
        Commands::ShowDip { id, editor } => {
            let dip = dip_repo::find_by_id(&db, id)?.ok_or_else(|| not_found("DIP", id))?;
            if !dip.is_visible_to(editor) {
                return Err(not_found("DIP", id));
            }
            let output = describe_dip(&db, &dip)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
            );
        }
        Commands::DeleteDip { id } => {
            let dip = dip_repo::find_by_id(&db, id)?.ok_or_else(|| not_found("DIP", id))?;
            sync.delete(dip)?;
            wait_idle(&pool, cli.wait_timeout);
            println!("Deleted DIP {}", id);
        }
        Commands::DeleteCollection { id } => {
            let collection =
                collection_repo::find_by_id(&db, id)?.ok_or_else(|| not_found("Collection", id))?;
            sync.delete(collection)?;
            wait_idle(&pool, cli.wait_timeout);
            println!("Deleted collection {}", id);
        }
        Commands::Reindex => {
            let report = sync.reindex_all()?;
            println!(
                "Reindexed {} collections, {} DIPs, {} digital files",
                report.collections, report.dips, report.digital_files
            );
        }
    }

    pool.wait();
    Ok(())
}

fn wait_idle(pool: &WorkerPool, seconds: u64) {
    if !pool.wait_idle(Duration::from_secs(seconds)) {
        warn!("Background jobs still running after {}s", seconds);
    }
}

fn not_found(kind: &'static str, id: i64) -> DipsError {
    DipsError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn describe_dip(db: &Database, dip: &Dip) -> Result<Value, DipsError> {
    let display = DcDisplayConfig::load(db)?;
    let mut description = Map::new();
    if let Some(dc) = dip.dc(db)? {
        for (label, value) in dc.display_data(&display) {
            description.insert(label.to_string(), Value::from(value));
        }
    }

    let files: Vec<Value> = file_repo::list_by_dip(db, dip.id)?
        .iter()
        .map(file_summary)
        .collect();

    let mut output = json!({
        "id": dip.id,
        "objectszip": dip.objectszip,
        "uploaded": dip.uploaded.to_rfc3339(),
        "collection_id": dip.collection_id,
        "import_status": dip.import_status.map(|s| s.as_str()),
        "description": description,
        "files": files,
    });
    if dip.import_status == Some(ImportStatus::Failure) {
        output["import_error"] = Value::from(dip.import_error_message(db)?);
    }
    Ok(output)
}

fn file_summary(file: &DigitalFile) -> Value {
    json!({
        "uuid": file.uuid,
        "filepath": file.filepath,
        "fileformat": file.fileformat,
        "size": file.size_human,
        "datemodified": file.datemodified.map(|d| d.to_rfc3339()),
    })
}
