//! Image database: fingerprint index plus location metadata.
//!
//! A [`Db`] maps each fingerprint to the ordered list of locations it was
//! added under and keeps one [`Index`] strategy for distance queries. The
//! location map is not part of the index's binary format; it is persisted
//! separately as JSON (see [`Db::save_locations`] and [`store`]).
//!
//! ```no_run
//! use phashdb::{Db, Fingerprint};
//!
//! let mut db = Db::new();
//! db.add("images/gopher.png", Fingerprint(0x3c7e_ffe7_c381_8100))?;
//! for location in db.search(Fingerprint(0x3c7e_ffe7_c381_8101), 5)? {
//!     println!("{}", location);
//! }
//! # Ok::<(), phashdb::Error>(())
//! ```

pub mod store;

use crate::error::{Error, Result};
use crate::hash::{DifferenceHasher, Hasher};
use crate::index::{Fingerprint, Index, IndexKind, RadixIndex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::{debug, warn};

/// One location matched by a distance search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub hash: Fingerprint,
    pub location: String,
    pub distance: u32,
}

/// Persisted form of one multimap bucket
#[derive(Debug, Serialize, Deserialize)]
struct LocationRecord {
    hash: Fingerprint,
    locations: Vec<String>,
}

pub struct Db {
    index: Box<dyn Index + Send + Sync>,
    hasher: Box<dyn Hasher>,
    locations: FxHashMap<Fingerprint, Vec<String>>,
    /// Bucket keys in first-insertion order, for stable persistence
    order: Vec<Fingerprint>,
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl Db {
    /// Database over a [`RadixIndex`] with the [`DifferenceHasher`]
    pub fn new() -> Self {
        Self::with_index(RadixIndex::new())
    }

    pub fn with_index<I>(index: I) -> Self
    where
        I: Index + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(index))
    }

    /// Database over an empty index of the given kind
    pub fn with_kind(kind: IndexKind) -> Self {
        Self::from_boxed(kind.build())
    }

    fn from_boxed(index: Box<dyn Index + Send + Sync>) -> Self {
        Self {
            index,
            hasher: Box::new(DifferenceHasher::new()),
            locations: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Replace the hasher used by the byte/file convenience operations
    pub fn with_hasher<H: Hasher + 'static>(mut self, hasher: H) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn index(&self) -> &dyn Index {
        self.index.as_ref()
    }

    pub fn hasher(&self) -> &dyn Hasher {
        self.hasher.as_ref()
    }

    /// Number of distinct fingerprints with at least one location
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Total number of stored locations, duplicates included
    pub fn location_count(&self) -> usize {
        self.locations.values().map(Vec::len).sum()
    }

    /// Record `location` under `fingerprint`.
    ///
    /// The fingerprint is always handed to the index, which ignores
    /// repeats. The same location may be added more than once.
    pub fn add(&mut self, location: impl Into<String>, fingerprint: Fingerprint) -> Result<()> {
        self.index.insert(fingerprint)?;
        self.push_location(fingerprint, location.into());
        Ok(())
    }

    fn push_location(&mut self, fingerprint: Fingerprint, location: String) {
        let bucket = self.locations.entry(fingerprint).or_default();
        if bucket.is_empty() {
            self.order.push(fingerprint);
        }
        bucket.push(location);
    }

    /// Hash encoded image bytes and add them under `location`
    pub fn add_bytes(&mut self, location: impl Into<String>, data: &[u8]) -> Result<Fingerprint> {
        let fingerprint = self.hasher.hash(data)?;
        self.add(location, fingerprint)?;
        Ok(fingerprint)
    }

    /// Read an encoded image to the end, then hash and add it
    pub fn add_file<R: Read>(
        &mut self,
        location: impl Into<String>,
        mut reader: R,
    ) -> Result<Fingerprint> {
        let data = read_all(&mut reader)?;
        self.add_bytes(location, &data)
    }

    /// Locations recorded under exactly `fingerprint`, in insertion order
    pub fn find(&self, fingerprint: Fingerprint) -> Result<&[String]> {
        self.locations
            .get(&fingerprint)
            .map(Vec::as_slice)
            .ok_or(Error::NotFound(fingerprint))
    }

    /// Every location whose fingerprint is within `max_distance` bits
    pub fn search(&self, fingerprint: Fingerprint, max_distance: u32) -> Result<Vec<String>> {
        Ok(self
            .search_matches(fingerprint, max_distance)?
            .into_iter()
            .map(|m| m.location)
            .collect())
    }

    /// Like [`Db::search`], keeping each location's fingerprint and distance
    pub fn search_matches(
        &self,
        fingerprint: Fingerprint,
        max_distance: u32,
    ) -> Result<Vec<Match>> {
        let candidates = self.index.search(fingerprint, max_distance)?;

        let mut matches = Vec::new();
        for candidate in candidates {
            let Some(bucket) = self.locations.get(&candidate) else {
                warn!(hash = %candidate, "index returned a fingerprint with no locations");
                continue;
            };
            let distance = candidate.distance(fingerprint);
            matches.extend(bucket.iter().map(|location| Match {
                hash: candidate,
                location: location.clone(),
                distance,
            }));
        }
        Ok(matches)
    }

    /// Hash encoded image bytes and search for similar images
    pub fn search_bytes(&self, data: &[u8], max_distance: u32) -> Result<Vec<String>> {
        let fingerprint = self.hasher.hash(data)?;
        self.search(fingerprint, max_distance)
    }

    pub fn search_file<R: Read>(&self, mut reader: R, max_distance: u32) -> Result<Vec<String>> {
        let data = read_all(&mut reader)?;
        self.search_bytes(&data, max_distance)
    }

    /// Write the index in its binary format
    pub fn save_index(&self, writer: &mut dyn Write) -> Result<()> {
        self.index.persistable().ok_or(Error::NotSupported)?.save(writer)
    }

    /// Replace the index contents from its binary format
    pub fn load_index(&mut self, reader: &mut dyn Read) -> Result<()> {
        self.index.persistable_mut().ok_or(Error::NotSupported)?.load(reader)
    }

    /// Write the location multimap as JSON, buckets in first-added order
    pub fn save_locations<W: Write>(&self, writer: W) -> Result<()> {
        let records: Vec<_> = self
            .order
            .iter()
            .filter_map(|hash| {
                self.locations.get(hash).map(|locations| LocationRecord {
                    hash: *hash,
                    locations: locations.clone(),
                })
            })
            .collect();
        serde_json::to_writer_pretty(writer, &records)?;
        debug!(buckets = records.len(), "saved locations");
        Ok(())
    }

    /// Replace the location multimap from JSON written by
    /// [`Db::save_locations`]. The index is left as is; call
    /// [`Db::rebuild_index`] when it was not restored from its own format.
    pub fn load_locations<R: Read>(&mut self, reader: R) -> Result<()> {
        let records: Vec<LocationRecord> = serde_json::from_reader(reader)?;

        self.locations.clear();
        self.order.clear();
        for record in records {
            for location in record.locations {
                self.push_location(record.hash, location);
            }
        }
        debug!(buckets = self.locations.len(), "loaded locations");
        Ok(())
    }

    /// Insert every fingerprint that has locations into the index
    pub fn rebuild_index(&mut self) -> Result<()> {
        for &fingerprint in &self.order {
            self.index.insert(fingerprint)?;
        }
        debug!(fingerprints = self.order.len(), "rebuilt index from locations");
        Ok(())
    }
}

fn read_all<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(data)
}
