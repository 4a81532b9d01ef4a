//! Binary node format
//!
//! A tree is written as a preorder sequence of fixed 10-byte records, with
//! no header or length prefix:
//!
//! ```text
//! +-------+--------+-------------------------------+
//! | flags | length | prefix (8 bytes, big-endian)  |
//! +-------+--------+-------------------------------+
//! ```
//!
//! `flags` bit 7 marks a left child and bit 6 a right child; the remaining
//! bits are zero. The left subtree's records follow immediately, then the
//! right subtree's. An empty tree is the single record `00 00 00..00`.

use super::node::Node;
use crate::error::{Error, Result};
use crate::index::types::{high_mask, FINGERPRINT_BITS, TOP_BIT};
use std::io::{Read, Write};

/// Size of one encoded node
pub const RECORD_SIZE: usize = 10;

/// Presence bits for a node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeFlags(pub u8);

impl NodeFlags {
    pub const HAS_LEFT: u8 = 0x80;
    pub const HAS_RIGHT: u8 = 0x40;
    const RESERVED: u8 = !(Self::HAS_LEFT | Self::HAS_RIGHT);

    pub fn of(node: &Node) -> Self {
        let mut flags = Self::default();
        if node.left.is_some() {
            flags.set_has_left();
        }
        if node.right.is_some() {
            flags.set_has_right();
        }
        flags
    }

    pub fn has_left(&self) -> bool {
        self.0 & Self::HAS_LEFT != 0
    }

    pub fn has_right(&self) -> bool {
        self.0 & Self::HAS_RIGHT != 0
    }

    pub fn set_has_left(&mut self) {
        self.0 |= Self::HAS_LEFT;
    }

    pub fn set_has_right(&mut self) {
        self.0 |= Self::HAS_RIGHT;
    }

    fn has_reserved_bits(&self) -> bool {
        self.0 & Self::RESERVED != 0
    }
}

/// Encode a single node record, ignoring its children's contents
pub fn encode_record(node: &Node) -> [u8; RECORD_SIZE] {
    let mut record = [0u8; RECORD_SIZE];
    record[0] = NodeFlags::of(node).0;
    record[1] = node.length;
    record[2..].copy_from_slice(&node.prefix.to_be_bytes());
    record
}

/// Write `root` and all its descendants in preorder
pub fn encode<W: Write + ?Sized>(root: &Node, writer: &mut W) -> std::io::Result<()> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        writer.write_all(&encode_record(node))?;
        stack.extend(node.right.as_deref());
        stack.extend(node.left.as_deref());
    }
    Ok(())
}

/// Read exactly one tree from `reader`.
///
/// The stream is checked against the trie invariants so corrupted input can
/// neither build an inconsistent tree nor recurse past the 64-bit depth
/// bound.
pub fn decode<R: Read + ?Sized>(reader: &mut R) -> Result<Node> {
    decode_node(reader, 0, None)
}

/// `side` is `None` for the root, otherwise whether the node hangs on the right
fn decode_node<R: Read + ?Sized>(
    reader: &mut R,
    consumed: u32,
    side: Option<bool>,
) -> Result<Node> {
    let is_root = side.is_none();
    let mut record = [0u8; RECORD_SIZE];
    reader.read_exact(&mut record)?;

    let [flags, length, prefix @ ..] = record;
    let flags = NodeFlags(flags);
    let prefix = u64::from_be_bytes(prefix);

    if flags.has_reserved_bits() {
        return Err(Error::Corrupt(format!("reserved flag bits set: {:#04x}", flags.0)));
    }
    if length as u32 > FINGERPRINT_BITS {
        return Err(Error::Corrupt(format!("node length {} exceeds 64 bits", length)));
    }
    if length == 0 && !is_root {
        return Err(Error::Corrupt("zero-length node below the root".to_string()));
    }
    if prefix & !high_mask(length) != 0 {
        return Err(Error::Corrupt(format!(
            "prefix {:#018x} has bits beyond its length {}",
            prefix, length
        )));
    }

    if let Some(right) = side {
        if (prefix & TOP_BIT != 0) != right {
            return Err(Error::Corrupt(format!("prefix {:#018x} on the wrong branch", prefix)));
        }
    }

    let bits = consumed + length as u32;
    if bits > FINGERPRINT_BITS {
        return Err(Error::Corrupt(format!("path accumulates {} bits", bits)));
    }

    let mut node = Node::new(prefix, length);
    if flags.has_left() {
        node.left = Some(Box::new(decode_node(reader, bits, Some(false))?));
    }
    if flags.has_right() {
        node.right = Some(Box::new(decode_node(reader, bits, Some(true))?));
    }

    let empty_root = is_root && length == 0;
    if node.is_leaf() && !empty_root && bits != FINGERPRINT_BITS {
        return Err(Error::Corrupt(format!("leaf ends after {} bits", bits)));
    }

    Ok(node)
}
