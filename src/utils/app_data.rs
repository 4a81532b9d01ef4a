use crate::db::store::{INDEX_FILE, LOCATIONS_FILE, META_FILE};
use crate::index::{IndexKind, MAX_DISTANCE};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "phashdb";
const CONFIG_FILE: &str = "config.json";
const STORES_DIR: &str = "stores";

/// Name of the store used when none is given
pub const DEFAULT_STORE: &str = "default";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Index strategy for newly created stores
    #[serde(default)]
    pub index_kind: IndexKind,

    /// Search distance used when none is given on the command line
    #[serde(default = "default_distance")]
    pub default_distance: u32,

    /// Upper bound applied to every search distance.
    /// Wide searches visit most of the trie, so this bounds query latency.
    #[serde(default = "default_max_distance")]
    pub max_distance: u32,

    /// Threads used to hash files during import
    /// If 0, uses the number of CPU cores
    #[serde(default)]
    pub import_threads: usize,
}

fn default_distance() -> u32 {
    5
}

fn default_max_distance() -> u32 {
    MAX_DISTANCE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            index_kind: IndexKind::default(),
            default_distance: default_distance(),
            max_distance: default_max_distance(),
            import_threads: 0,
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Resolve a requested search distance against the configured cap
    pub fn effective_distance(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_distance)
            .min(self.max_distance)
    }

    /// Get the effective import thread count (resolves 0 to CPU count)
    pub fn effective_import_threads(&self) -> usize {
        if self.import_threads == 0 {
            num_cpus()
        } else {
            self.import_threads
        }
    }
}

/// Get the number of CPUs available
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Get the directory of a named store
pub fn get_store_dir(name: &str) -> Result<PathBuf> {
    let stores_dir = get_app_data_dir()?.join(STORES_DIR);
    fs::create_dir_all(&stores_dir)?;
    Ok(stores_dir.join(sanitize_store_name(name)))
}

/// Resolve a `--store` argument. Bare names map into the app data
/// directory; only path-like arguments are used as directories.
pub fn resolve_store_dir(store: &str) -> Result<PathBuf> {
    if is_path_like(store) {
        Ok(PathBuf::from(store))
    } else {
        get_store_dir(store)
    }
}

/// Absolute, multi-component, or starting with `.`
fn is_path_like(store: &str) -> bool {
    let path = Path::new(store);
    path.is_absolute() || path.components().count() > 1 || store.starts_with('.')
}

/// Keep store names to a single safe path component
fn sanitize_store_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(64)
        .collect();

    if sanitized.is_empty() {
        DEFAULT_STORE.to_string()
    } else {
        sanitized
    }
}

/// List all named stores that have been saved at least once
pub fn list_stores() -> Result<Vec<StoreLocation>> {
    let stores_dir = get_app_data_dir()?.join(STORES_DIR);

    if !stores_dir.exists() {
        return Ok(Vec::new());
    }

    let mut stores = Vec::new();
    for entry in fs::read_dir(&stores_dir)? {
        let path = entry?.path();
        if path.join(META_FILE).exists() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                stores.push(StoreLocation {
                    name: name.to_string(),
                    dir: path.clone(),
                });
            }
        }
    }
    stores.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(stores)
}

/// Remove a store's files, then its directory if nothing else is left.
///
/// Directories without store metadata are refused, and files the store did
/// not write are never touched.
pub fn remove_store(dir: &Path) -> Result<()> {
    if !dir.join(META_FILE).is_file() {
        bail!("{} is not a phashdb store", dir.display());
    }

    for name in [INDEX_FILE, LOCATIONS_FILE, META_FILE] {
        let path = dir.join(name);
        for file in [path.with_extension("tmp"), path] {
            if file.exists() {
                fs::remove_file(&file)
                    .with_context(|| format!("Failed to remove {}", file.display()))?;
            }
        }
    }

    // Fails while unrelated files remain, which leaves them in place
    let _ = fs::remove_dir(dir);
    Ok(())
}

/// A named store on disk
#[derive(Debug, Clone)]
pub struct StoreLocation {
    pub name: String,
    pub dir: PathBuf,
}
