use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use phashdb::db::store::Store;
use phashdb::utils::progress::import_bar;
use phashdb::utils::{self, AppConfig, DEFAULT_STORE};
use phashdb::{output, Db, Fingerprint, HashError};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "phashdb")]
#[command(about = "Find duplicate and near-duplicate images by perceptual hash")]
struct Cli {
    /// Store name, or a path to a store directory
    #[arg(short, long, global = true, default_value = DEFAULT_STORE)]
    store: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add one image location
    Add {
        /// Location recorded for the image (path, URL, id)
        location: String,

        #[command(flatten)]
        source: HashSource,
    },
    /// Hash image files and add them under their paths
    Import {
        /// Image files (PNG, JPEG, GIF, BMP, WebP, TIFF or netpbm)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
    /// Find images within a Hamming distance
    Search {
        #[command(flatten)]
        source: HashSource,

        /// Maximum Hamming distance (defaults to the configured distance)
        #[arg(short, long)]
        distance: Option<u32>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the locations stored under an exact fingerprint
    Find {
        /// Fingerprint in hexadecimal
        hash: Fingerprint,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the fingerprint of image files without storing them
    Hash {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show store statistics
    Stats,
    /// List all named stores
    List,
    /// Remove the selected store
    Remove,
    /// Show the configuration, or write the defaults with --init
    Config {
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct HashSource {
    /// Fingerprint in hexadecimal
    #[arg(long)]
    hash: Option<Fingerprint>,

    /// Image file to hash
    #[arg(long)]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;
    let store_dir = utils::resolve_store_dir(&cli.store)?;

    match cli.command {
        Commands::Add { location, source } => {
            let (mut store, mut db) = open_store(&store_dir, &config)?;
            let hash = source.fingerprint(&db)?;
            db.add(location.as_str(), hash)?;
            store.save(&db)?;
            println!("{}  {}", hash, location);
        }
        Commands::Import { files, quiet } => {
            let (mut store, mut db) = open_store(&store_dir, &config)?;
            import_files(&mut db, &files, &config, quiet)?;
            store.save(&db)?;
        }
        Commands::Search {
            source,
            distance,
            json,
        } => {
            let (_, db) = open_store(&store_dir, &config)?;
            let hash = source.fingerprint(&db)?;
            let distance = config.effective_distance(distance);
            let matches = db.search_matches(hash, distance)?;
            output::print_matches(&matches, json)?;
        }
        Commands::Find { hash, json } => {
            let (_, db) = open_store(&store_dir, &config)?;
            let locations = db.find(hash)?;
            output::print_locations(hash, locations, json)?;
        }
        Commands::Hash { files } => {
            let db = Db::new();
            for path in &files {
                let hash = db.hasher().hash(&fs::read(path)?)?;
                output::print_hash(path, hash)?;
            }
        }
        Commands::Stats => {
            let (store, db) = open_store(&store_dir, &config)?;
            show_stats(&store, &db);
        }
        Commands::List => {
            let stores = utils::list_stores()?;
            if stores.is_empty() {
                println!("No stores found.");
            }
            for store in stores {
                println!("{:<20} {}", store.name, store.dir.display());
            }
        }
        Commands::Remove => {
            if !store_dir.exists() {
                bail!("No store at {}", store_dir.display());
            }
            utils::remove_store(&store_dir)?;
            println!("Removed store: {}", store_dir.display());
        }
        Commands::Config { init } => {
            let config = if init {
                let defaults = AppConfig::default();
                defaults.save()?;
                defaults
            } else {
                config
            };
            let path = utils::get_config_path()?;
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

impl HashSource {
    fn fingerprint(&self, db: &Db) -> Result<Fingerprint> {
        match (&self.hash, &self.file) {
            (Some(hash), _) => Ok(*hash),
            (None, Some(path)) => {
                let data = fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Ok(db.hasher().hash(&data)?)
            }
            (None, None) => bail!("Either --hash or --file is required"),
        }
    }
}

fn open_store(dir: &Path, config: &AppConfig) -> Result<(Store, Db)> {
    let store = Store::open(dir, config.index_kind)
        .with_context(|| format!("Failed to open store {}", dir.display()))?;
    let db = store
        .load()
        .with_context(|| format!("Failed to load store {}", dir.display()))?;
    Ok((store, db))
}

/// Hash files in parallel, then add them in argument order
fn import_files(db: &mut Db, files: &[PathBuf], config: &AppConfig, quiet: bool) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_import_threads())
        .build()
        .context("Failed to build import thread pool")?;

    let bar = import_bar(files.len() as u64, quiet);
    let hasher = db.hasher();
    let hashed: Vec<_> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = fs::read(path)
                    .map_err(HashError::from)
                    .and_then(|data| hasher.hash(&data));
                bar.inc(1);
                (path, result)
            })
            .collect()
    });
    bar.finish_and_clear();

    let mut added = 0usize;
    let mut failed = 0usize;
    for (path, result) in hashed {
        match result {
            Ok(hash) => {
                db.add(path.display().to_string(), hash)?;
                added += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                failed += 1;
            }
        }
    }

    info!(added, failed, "import finished");
    println!("Imported {} images ({} skipped)", added, failed);
    Ok(())
}

fn show_stats(store: &Store, db: &Db) {
    let meta = store.meta();
    println!("Store:        {}", store.dir().display());
    println!("Index:        {}", meta.index_kind);
    println!("Fingerprints: {}", db.len());
    println!("Locations:    {}", db.location_count());
    println!("Indexed:      {}", db.index().len());
    if meta.updated_at > 0 {
        println!("Updated:      {} (unix)", meta.updated_at);
    }
}
