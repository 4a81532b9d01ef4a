//! On-disk store for a [`Db`].
//!
//! A store is a directory holding:
//! - `index.bin`: the index in its binary format (persistable kinds only)
//! - `locations.json`: the fingerprint to locations multimap
//! - `meta.json`: [`StoreMeta`]
//!
//! Each file is written and synced to a temporary sibling, then renamed into
//! place, so a crash mid-save leaves every file either old or new. The three
//! files are replaced one at a time, not as a unit.

use super::Db;
use crate::error::{Error, Result};
use crate::index::IndexKind;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub const INDEX_FILE: &str = "index.bin";
pub const LOCATIONS_FILE: &str = "locations.json";
pub const META_FILE: &str = "meta.json";

const STORE_VERSION: u32 = 1;

/// Store metadata stored in meta.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub version: u32,
    pub index_kind: IndexKind,
    pub fingerprint_count: usize,
    pub location_count: usize,
    pub created_at: u64,
    pub updated_at: u64,
}

impl StoreMeta {
    fn new(index_kind: IndexKind) -> Self {
        let now = unix_now();
        Self {
            version: STORE_VERSION,
            index_kind,
            fingerprint_count: 0,
            location_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Handle on a store directory
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
    meta: StoreMeta,
}

impl Store {
    /// Open the store at `dir`. A directory without metadata is treated as
    /// a new, empty store using `default_kind`; an existing store keeps the
    /// kind it was created with.
    pub fn open(dir: &Path, default_kind: IndexKind) -> Result<Self> {
        let meta_path = dir.join(META_FILE);
        let meta = if meta_path.exists() {
            let file = File::open(&meta_path)?;
            let meta: StoreMeta = serde_json::from_reader(BufReader::new(file))?;
            if meta.version != STORE_VERSION {
                return Err(Error::Corrupt(format!("unsupported store version {}", meta.version)));
            }
            meta
        } else {
            StoreMeta::new(default_kind)
        };

        debug!(dir = %dir.display(), kind = %meta.index_kind, "opened store");
        Ok(Self {
            dir: dir.to_path_buf(),
            meta,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    /// Build the database described by the store's files
    pub fn load(&self) -> Result<Db> {
        let mut db = Db::with_kind(self.meta.index_kind);

        let index_path = self.dir.join(INDEX_FILE);
        let index_loaded = db.index().persistable().is_some() && index_path.exists();
        if index_loaded {
            let file = File::open(&index_path)?;
            if file.metadata()?.len() == 0 {
                return Err(Error::Corrupt(format!("{} is empty", index_path.display())));
            }
            // The mapping is read-only and dropped before this call returns
            let mmap = unsafe { Mmap::map(&file)? };
            db.load_index(&mut &mmap[..])?;
        }

        let locations_path = self.dir.join(LOCATIONS_FILE);
        if locations_path.exists() {
            let file = File::open(&locations_path)?;
            db.load_locations(BufReader::new(file))?;
        }

        if !index_loaded {
            db.rebuild_index()?;
        } else if db.index().len() < db.len() {
            warn!(
                indexed = db.index().len(),
                located = db.len(),
                "index is missing fingerprints, rebuilding from locations"
            );
            db.rebuild_index()?;
        }

        debug!(
            fingerprints = db.len(),
            locations = db.location_count(),
            "loaded store"
        );
        Ok(db)
    }

    /// Write `db` into the store directory
    pub fn save(&mut self, db: &Db) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        if db.index().persistable().is_some() {
            write_atomic(&self.dir.join(INDEX_FILE), |file| db.save_index(file))?;
        }
        write_atomic(&self.dir.join(LOCATIONS_FILE), |file| db.save_locations(file))?;

        self.meta.fingerprint_count = db.len();
        self.meta.location_count = db.location_count();
        self.meta.updated_at = unix_now();
        let meta = &self.meta;
        write_atomic(&self.dir.join(META_FILE), |file| {
            serde_json::to_writer_pretty(file, meta)?;
            Ok(())
        })?;

        debug!(
            dir = %self.dir.display(),
            fingerprints = self.meta.fingerprint_count,
            "saved store"
        );
        Ok(())
    }
}

fn write_atomic(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    let written = File::create(&tmp_path)
        .map_err(Error::from)
        .and_then(|file| {
            let mut file = BufWriter::new(file);
            write(&mut file)?;
            file.flush()?;
            file.get_ref().sync_all()?;
            Ok(())
        });

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
