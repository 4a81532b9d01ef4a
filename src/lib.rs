//! # phashdb - Perceptual Hash Image Database
//!
//! phashdb indexes 64-bit perceptual image fingerprints and finds exact and
//! near-duplicate images by Hamming distance.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - The [`Index`] contract, the radix trie and the linear scan
//! - [`db`] - Fingerprint to location mapping on top of an index, plus the on-disk store
//! - [`hash`] - The [`Hasher`] contract and the default difference hash
//! - [`output`] - Result formatting for the command line
//! - [`utils`] - Configuration and app data directories
//!
//! ## Quick Start
//!
//! ```
//! use phashdb::{Db, Fingerprint};
//!
//! let mut db = Db::new();
//! db.add("gopher-1.png", Fingerprint(0x3c7e_ffe7_c381_8100)).unwrap();
//! db.add("gopher-2.png", Fingerprint(0x3c7e_ffe7_c381_8101)).unwrap();
//! db.add("gradient.png", Fingerprint(0x00ff_00ff_00ff_00ff)).unwrap();
//!
//! let mut similar = db.search(Fingerprint(0x3c7e_ffe7_c381_8103), 5).unwrap();
//! similar.sort();
//! assert_eq!(similar, ["gopher-1.png", "gopher-2.png"]);
//! ```
//!
//! ## Concurrency
//!
//! Nothing in this crate locks. Searches take `&self` and may run
//! concurrently; inserts take `&mut self`, so sharing a [`Db`] across
//! threads for writing needs one lock around the whole database.

pub mod db;
pub mod error;
pub mod hash;
pub mod index;
pub mod output;
pub mod utils;

pub use db::store::Store;
pub use db::{Db, Match};
pub use error::{Error, HashError, IndexError, ParseFingerprintError, Result};
pub use hash::{DifferenceHasher, GrayImage, Hasher};
pub use index::{Fingerprint, Index, IndexKind, LinearIndex, Persistable, RadixIndex};
