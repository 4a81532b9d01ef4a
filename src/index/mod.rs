//! Fingerprint indexes.
//!
//! An [`Index`] stores fingerprints and answers Hamming-distance queries.
//! Two strategies are provided:
//!
//! - [`RadixIndex`] - binary PATRICIA trie with branch-and-bound search,
//!   persistable through a compact preorder binary format
//! - [`LinearIndex`] - exhaustive scan over a set, used as a correctness
//!   oracle and for small collections
//!
//! Neither strategy locks internally. Mutation must be serialized by the
//! caller; concurrent read-only searches are safe.

pub mod linear;
pub mod radix;
pub mod types;

pub use linear::LinearIndex;
pub use radix::RadixIndex;
pub use types::*;

use crate::error::{IndexError, Result};
use std::io::{Read, Write};

/// Distance-searchable set of fingerprints
pub trait Index {
    /// Add a fingerprint. Inserting one already present is a no-op.
    fn insert(&mut self, fingerprint: Fingerprint) -> std::result::Result<(), IndexError>;

    /// Every stored fingerprint within `max_distance` bits of `fingerprint`.
    ///
    /// Results carry no ordering guarantee and contain no duplicates.
    fn search(
        &self,
        fingerprint: Fingerprint,
        max_distance: u32,
    ) -> std::result::Result<Vec<Fingerprint>, IndexError>;

    /// Number of distinct fingerprints stored
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save/load capability, if this strategy has one
    fn persistable(&self) -> Option<&dyn Persistable> {
        None
    }

    fn persistable_mut(&mut self) -> Option<&mut dyn Persistable> {
        None
    }
}

/// Binary persistence of an index's contents
pub trait Persistable {
    fn save(&self, writer: &mut dyn Write) -> Result<()>;

    /// Replace the index contents with the decoded stream. On failure the
    /// previous contents are left in place.
    fn load(&mut self, reader: &mut dyn Read) -> Result<()>;
}
