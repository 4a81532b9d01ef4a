//! Radix (PATRICIA) trie index
//!
//! Fingerprints are stored in a path-compressed binary trie: internal nodes
//! exist only where stored fingerprints diverge, so depth is bounded by the
//! 64-bit width rather than by collection size.
//!
//! ## Architecture
//!
//! - `node`: trie node with insert, branch-and-bound search and lookup
//! - `codec`: preorder 10-byte-per-node binary format
//!
//! Search charges each node the exact Hamming cost of the bits it owns and
//! abandons a subtree as soon as the remaining budget goes negative, which
//! never discards a true match.

pub mod codec;
pub mod node;

pub use codec::{NodeFlags, RECORD_SIZE};
pub use node::Node;

use crate::error::{IndexError, Result};
use crate::index::types::{Fingerprint, MAX_DISTANCE};
use crate::index::{Index, Persistable};
use std::io::{Read, Write};
use tracing::debug;

/// In-memory PATRICIA trie over 64-bit fingerprints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadixIndex {
    root: Node,
    len: usize,
}

impl RadixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of the trie; an empty index has a zero-length childless root
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exact membership test
    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.root.contains(fingerprint.0)
    }

    /// Insert a fingerprint, returning whether it was new
    pub fn add(&mut self, fingerprint: Fingerprint) -> bool {
        let inserted = self.root.insert(Node::from_fingerprint(fingerprint));
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Fingerprints within `max_distance` bits of `fingerprint`, left
    /// subtrees first
    pub fn find_within(&self, fingerprint: Fingerprint, max_distance: u32) -> Vec<Fingerprint> {
        let budget = max_distance.min(MAX_DISTANCE) as i32;
        self.root.search(fingerprint.0, 0, budget)
    }

    /// Every stored fingerprint
    pub fn fingerprints(&self) -> Vec<Fingerprint> {
        self.find_within(Fingerprint(0), MAX_DISTANCE)
    }

    /// Serialize the trie into a fresh buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RECORD_SIZE * (2 * self.len + 1));
        // Writing into a Vec cannot fail
        let _ = codec::encode(&self.root, &mut buf);
        buf
    }

    /// Decode a trie previously produced by [`RadixIndex::to_bytes`] or
    /// [`Persistable::save`]
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        let root = codec::decode(&mut bytes)?;
        let len = root.count_leaves();
        Ok(Self { root, len })
    }
}

impl Index for RadixIndex {
    fn insert(&mut self, fingerprint: Fingerprint) -> std::result::Result<(), IndexError> {
        self.add(fingerprint);
        Ok(())
    }

    fn search(
        &self,
        fingerprint: Fingerprint,
        max_distance: u32,
    ) -> std::result::Result<Vec<Fingerprint>, IndexError> {
        Ok(self.find_within(fingerprint, max_distance))
    }

    fn len(&self) -> usize {
        self.len
    }

    fn persistable(&self) -> Option<&dyn Persistable> {
        Some(self)
    }

    fn persistable_mut(&mut self) -> Option<&mut dyn Persistable> {
        Some(self)
    }
}

impl Persistable for RadixIndex {
    fn save(&self, writer: &mut dyn Write) -> Result<()> {
        codec::encode(&self.root, writer)?;
        writer.flush()?;
        debug!(fingerprints = self.len, "saved radix index");
        Ok(())
    }

    fn load(&mut self, reader: &mut dyn Read) -> Result<()> {
        let root = codec::decode(reader)?;
        self.len = root.count_leaves();
        self.root = root;
        debug!(fingerprints = self.len, "loaded radix index");
        Ok(())
    }
}
