//! Trie node and the insert/search/lookup algorithms
//!
//! Every node owns `length` left-justified prefix bits. Walking from the
//! root to a leaf and concatenating each node's prefix reproduces exactly one
//! stored fingerprint. A node branches on the first bit after its prefix:
//! `left` holds descendants whose next bit is 0, `right` those whose next
//! bit is 1. Only the root may have `length == 0`, so a path is at most 65
//! nodes long.

use crate::index::types::{high_mask, shl, Fingerprint, FINGERPRINT_BITS, TOP_BIT};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub(crate) prefix: u64,
    pub(crate) length: u8,
    pub(crate) left: Option<Box<Node>>,
    pub(crate) right: Option<Box<Node>>,
}

impl Node {
    /// A leaf holding the high `length` bits of `prefix`
    pub fn new(prefix: u64, length: u8) -> Self {
        Self {
            prefix,
            length,
            left: None,
            right: None,
        }
    }

    /// A full 64-bit fingerprint ready to be inserted
    pub fn from_fingerprint(fingerprint: Fingerprint) -> Self {
        Self::new(fingerprint.0, FINGERPRINT_BITS as u8)
    }

    pub fn prefix(&self) -> u64 {
        self.prefix
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Length of the run of leading bits `value` shares with this node's
    /// prefix, capped at the prefix length
    #[inline]
    pub fn match_length(&self, value: u64) -> u8 {
        ((self.prefix ^ value).leading_zeros() as u8).min(self.length)
    }

    /// Mismatched bits between this prefix and the leading bits of `value`
    #[inline]
    fn distance(&self, value: u64) -> u32 {
        (self.prefix ^ (value & high_mask(self.length))).count_ones()
    }

    /// Insert `value`, whose prefix holds the bits still to be placed below
    /// this node. Returns `false` when the value was already present.
    pub fn insert(&mut self, mut value: Node) -> bool {
        if self.length == value.length && self.prefix == value.prefix {
            return false;
        }

        let match_length = self.match_length(value.prefix).min(value.length);
        value.prefix = shl(value.prefix, match_length);
        value.length -= match_length;

        if self.length > match_length {
            // Partial match: push the unmatched tail of this prefix down into
            // a new node that inherits the existing children.
            let tail = Node {
                prefix: shl(self.prefix, match_length),
                length: self.length - match_length,
                left: self.left.take(),
                right: self.right.take(),
            };

            self.length = match_length;
            self.prefix &= high_mask(match_length);

            let (value, tail) = (Box::new(value), Box::new(tail));
            if value.prefix & TOP_BIT == 0 {
                self.left = Some(value);
                self.right = Some(tail);
            } else {
                self.left = Some(tail);
                self.right = Some(value);
            }
            true
        } else if self.is_leaf() {
            self.prefix &= high_mask(match_length);
            if value.prefix & TOP_BIT == 0 {
                self.left = Some(Box::new(value));
            } else {
                self.right = Some(Box::new(value));
            }
            true
        } else {
            let slot = if value.prefix & TOP_BIT == 0 {
                &mut self.left
            } else {
                &mut self.right
            };
            match slot {
                Some(child) => child.insert(value),
                None => {
                    *slot = Some(Box::new(value));
                    true
                }
            }
        }
    }

    /// Branch-and-bound search for every stored value within `budget` bits
    /// of `search`.
    ///
    /// Each node charges the exact mismatch cost of the bits it owns, so a
    /// negative budget proves the subtree holds no match. Left subtrees are
    /// reported before right ones.
    pub fn search(&self, search: u64, matched: u64, budget: i32) -> Vec<Fingerprint> {
        let mut matches = Vec::new();
        let mut stack = vec![(self, search, matched, budget)];

        while let Some((node, mut search, mut matched, mut budget)) = stack.pop() {
            if node.length > 0 {
                let owned = node.prefix >> (FINGERPRINT_BITS - node.length as u32);
                matched = shl(matched, node.length) | owned;
                budget -= node.distance(search) as i32;
                search = shl(search, node.length);
            }

            if budget < 0 {
                continue;
            }

            if node.length > 0 && node.is_leaf() {
                matches.push(Fingerprint(matched));
                continue;
            }

            // Right first so left pops first
            if let Some(right) = node.right.as_deref() {
                stack.push((right, search, matched, budget));
            }
            if let Some(left) = node.left.as_deref() {
                stack.push((left, search, matched, budget));
            }
        }

        matches
    }

    /// Exact-match descent without any distance accounting
    pub fn contains(&self, value: u64) -> bool {
        let mut node = self;
        let mut value = value;

        loop {
            if node.length > 0 {
                if node.match_length(value) < node.length {
                    return false;
                }
                value = shl(value, node.length);
            }

            if node.is_leaf() {
                return node.length > 0;
            }

            let next = if value & TOP_BIT == 0 {
                node.left.as_deref()
            } else {
                node.right.as_deref()
            };
            match next {
                Some(child) => node = child,
                None => return false,
            }
        }
    }

    /// Number of stored values below and including this node
    pub fn count_leaves(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                if node.length > 0 {
                    count += 1;
                }
                continue;
            }
            stack.extend(node.left.as_deref());
            stack.extend(node.right.as_deref());
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(prefix: u64) -> Node {
        Node::new(prefix, 64)
    }

    fn tree(prefixes: &[u64]) -> Node {
        let mut root = leaf(prefixes[0]);
        for &prefix in &prefixes[1..] {
            root.insert(leaf(prefix));
        }
        root
    }

    fn assert_node(node: Option<&Node>, length: u8, prefix: u64) {
        let node = node.expect("node should exist");
        assert_eq!(node.length, length, "length of {:#018x}", node.prefix);
        assert_eq!(node.prefix, prefix, "prefix of node with length {}", node.length);
    }

    #[test]
    fn test_is_leaf() {
        let mut node = Node::default();
        assert!(node.is_leaf());
        node.left = Some(Box::default());
        assert!(!node.is_leaf());

        let mut node = Node::default();
        node.right = Some(Box::default());
        assert!(!node.is_leaf());
    }

    #[test]
    fn test_match_length() {
        let node = Node::new(0xe900_0000_0000_0000, 7);
        assert_eq!(node.match_length(0xef00_0000_0000_0000), 5);
    }

    #[test]
    fn test_match_length_capped_by_prefix() {
        let node = Node::new(0xf000_0000_0000_0000, 4);
        assert_eq!(node.match_length(0xffff_0000_0000_0000), 4);
        assert_eq!(Node::default().match_length(u64::MAX), 0);
    }

    #[test]
    fn test_insert_splits_leaf() {
        let mut root = leaf(0xff << 56);
        root.insert(leaf(0xf0 << 56));

        assert_node(Some(&root), 4, 0xf0 << 56);
        assert_node(root.left(), 60, 0x00);
        assert_node(root.right(), 60, 0x0f << 60);
    }

    #[test]
    fn test_insert_diverging_at_first_bit() {
        let mut root = leaf(0x7f << 56);
        root.insert(leaf(0xff << 56));

        assert_node(Some(&root), 0, 0x00);
        assert_node(root.left(), 64, 0x7f << 56);
        assert_node(root.right(), 64, 0xff << 56);
    }

    #[test]
    fn test_insert_builds_down_right() {
        let mut root = Node::new(0x7f << 56, 4);
        root.insert(Node::new(0x77f << 52, 12));
        assert_node(Some(&root), 4, 0x70 << 56);
        assert_node(root.left(), 8, 0x7f << 56);
        assert!(root.right().is_none());

        root.insert(Node::new(0x7f << 56, 8));
        assert_node(root.left(), 8, 0x7f << 56);
        assert_node(root.right(), 4, 0x0f << 60);

        root.insert(Node::new(0x7ff << 52, 12));
        assert_node(Some(&root), 4, 0x70 << 56);
        assert_node(root.left(), 8, 0x7f << 56);
        assert_node(root.right(), 4, 0x0f << 60);
    }

    #[test]
    fn test_insert_builds_down_left() {
        let mut root = Node::new(0xff << 56, 8);
        root.insert(Node::new(0xfff << 52, 12));
        assert_node(Some(&root), 8, 0xff << 56);
        assert!(root.left().is_none());
        assert_node(root.right(), 4, 0xf << 60);

        root.insert(Node::new(0xff7 << 52, 16));
        assert_node(root.left(), 8, 0x7 << 60);
        assert_node(root.right(), 4, 0xf << 60);

        root.insert(Node::new(0xff7f << 48, 16));
        assert_node(Some(&root), 8, 0xff << 56);
        assert_node(root.left(), 4, 0x70 << 56);
        assert_node(root.right(), 4, 0xf << 60);
    }

    #[test]
    fn test_insert_into_empty_root() {
        let mut root = Node::default();
        assert!(root.insert(leaf(0x4a00_0000_0000_0000)));
        assert_node(Some(&root), 0, 0);
        assert_node(root.left(), 64, 0x4a00_0000_0000_0000);

        assert!(root.insert(leaf(0x5d00_0000_0000_0000)));
        let branch = root.left();
        assert_node(branch, 3, 0x4000_0000_0000_0000);
        let branch = branch.unwrap();
        assert_node(branch.left(), 61, 0x5000_0000_0000_0000);
        assert_node(branch.right(), 61, 0xe800_0000_0000_0000);
        assert!(root.right().is_none());
    }

    #[test]
    fn test_insert_duplicate_is_noop() {
        let mut root = Node::default();
        root.insert(leaf(0x4a00_0000_0000_0000));
        root.insert(leaf(0x5d00_0000_0000_0000));
        let before = root.clone();

        assert!(!root.insert(leaf(0x5d00_0000_0000_0000)));
        assert!(!root.insert(leaf(0x4a00_0000_0000_0000)));
        assert_eq!(root, before);
        assert_eq!(root.count_leaves(), 2);
    }

    #[test]
    fn test_search() {
        let root = Node::default();
        assert!(root.search(0x00, 0x00, 0).is_empty());

        let mut root = Node::default();
        root.insert(leaf(0xff));
        assert!(root.search(0x00, 0x00, 0).is_empty());
        assert_eq!(root.search(0xff, 0x00, 0), vec![Fingerprint(0xff)]);
        assert_eq!(root.search(0x00, 0x00, 8), vec![Fingerprint(0xff)]);
    }

    #[test]
    fn test_search_left_before_right() {
        let mut root = Node::default();
        root.insert(leaf(u64::MAX));
        root.insert(leaf(0));
        assert_eq!(root.search(0, 0, 64), vec![Fingerprint(0), Fingerprint(u64::MAX)]);
    }

    #[test]
    fn test_search_exact_among_siblings() {
        let mut root = Node::default();
        for value in [
            0x4a00_0000_0000_0000,
            0x5d00_0000_0000_0000,
            0x5900_0000_0000_0000,
            0x6900_0000_0000_0000,
        ] {
            root.insert(leaf(value));
        }
        assert_eq!(
            root.search(0x4a00_0000_0000_0000, 0, 0),
            vec![Fingerprint(0x4a00_0000_0000_0000)]
        );
        // 0x59 and 0x5d differ in one bit
        let mut near = root.search(0x5900_0000_0000_0000, 0, 1);
        near.sort();
        assert_eq!(
            near,
            vec![Fingerprint(0x5900_0000_0000_0000), Fingerprint(0x5d00_0000_0000_0000)]
        );
    }

    #[test]
    fn test_contains() {
        let mut root = Node::default();
        assert!(!root.contains(0));

        root.insert(leaf(0xff));
        root.insert(leaf(0xfe));
        assert!(root.contains(0xff));
        assert!(root.contains(0xfe));
        assert!(!root.contains(0xfc));
        assert!(!root.contains(0xff << 8));
    }

    #[test]
    fn test_equal() {
        assert_eq!(tree(&[0xff]), tree(&[0xff]));
        assert_ne!(tree(&[0xff]), tree(&[0x00]));
        assert_ne!(tree(&[0xff, 0xfe]), tree(&[0xff, 0xff]));
        assert_eq!(tree(&[0xff, 0xfe]), tree(&[0xff, 0xfe]));
    }
}
