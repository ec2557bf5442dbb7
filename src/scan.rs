//! Ordered traversal: first/last, successor and predecessor state machines,
//! ordered-neighbor lookups, and prefix-scoped iteration.
//!
//! Entry order is the bit-string order: a shorter prefix sorts before its
//! extensions, and below a fork the 0-side precedes the 1-side. The entries'
//! sorted sequence is therefore a preorder walk of the tree — every entry
//! sorts before everything in its own subtree, which is also what makes a
//! scoped iteration a single contiguous run.

use smallvec::SmallVec;

use crate::arena::NodeRef;
use crate::bits::{bit_at, first_diff_bit, is_prefix_of};
use crate::tree::RadixTree;

impl<V> RadixTree<V> {
    /// Entry with the smallest key.
    pub fn first(&self) -> Option<NodeRef> {
        if self.root.is_null() {
            return None;
        }
        Some(self.subtree_first(self.root))
    }

    /// Entry with the largest key.
    pub fn last(&self) -> Option<NodeRef> {
        if self.root.is_null() {
            return None;
        }
        Some(self.subtree_last(self.root))
    }

    /// In-order successor of `node` among entries, or `None` at the end.
    ///
    /// Walks parent links with an explicit "arrived from" state instead of a
    /// stack: descend left, else right, else ascend; ascending out of a left
    /// child re-enters at the right sibling, ascending out of a right child
    /// keeps climbing. A node is yielded only on first visit — arrival from
    /// its parent — and only when it carries data.
    pub fn next(&self, node: NodeRef) -> Option<NodeRef> {
        let mut prev = NodeRef::NULL;
        let mut node = node;
        loop {
            let n = self.arena.get(node);
            let step = if prev.is_null() || prev == n.parent {
                if !n.left.is_null() {
                    n.left
                } else if !n.right.is_null() {
                    n.right
                } else {
                    n.parent
                }
            } else if prev == n.left {
                if !n.right.is_null() {
                    n.right
                } else {
                    n.parent
                }
            } else {
                debug_assert!(prev == n.right);
                n.parent
            };
            if step.is_null() {
                return None;
            }
            prev = node;
            node = step;
            let m = self.arena.get(node);
            if m.parent == prev && m.data.is_some() {
                return Some(node);
            }
        }
    }

    /// In-order predecessor of `node` among entries; the mirror of [`next`].
    ///
    /// Everything below `node` sorts after it, so the machine starts by
    /// ascending. A fresh sibling subtree is entered right side first, and a
    /// node's own turn comes once its subtree is exhausted: on arrival from
    /// its left child, from its right child when there is no left, or
    /// immediately when childless.
    ///
    /// [`next`]: RadixTree::next
    pub fn prev(&self, node: NodeRef) -> Option<NodeRef> {
        let mut prev = node;
        let mut node = self.arena.get(node).parent;
        while !node.is_null() {
            let n = self.arena.get(node);
            if prev == n.parent {
                // Fresh subtree on the way down.
                if !n.right.is_null() {
                    prev = node;
                    node = n.right;
                } else if !n.left.is_null() {
                    prev = node;
                    node = n.left;
                } else {
                    // Childless nodes always carry data.
                    debug_assert!(n.data.is_some());
                    return Some(node);
                }
            } else if prev == n.right {
                if !n.left.is_null() {
                    prev = node;
                    node = n.left;
                } else if n.data.is_some() {
                    return Some(node);
                } else {
                    prev = node;
                    node = n.parent;
                }
            } else {
                debug_assert!(prev == n.left);
                if n.data.is_some() {
                    return Some(node);
                }
                prev = node;
                node = n.parent;
            }
        }
        None
    }

    /// Smallest entry whose key is greater than or equal to the query.
    ///
    /// "Greater" follows the tree's order: a prefix sorts before its
    /// extensions, so a query that is a prefix of stored keys finds the
    /// shallowest of them. A zero-bit query sorts before everything and
    /// finds the first entry.
    pub fn lookup_ge(&self, key: &[u8], bits: u16) -> Option<NodeRef> {
        if bits == 0 {
            return self.first();
        }
        assert!(
            key.len() * 8 >= usize::from(bits),
            "key buffer shorter than {bits} bits"
        );
        let last = i32::from(bits) - 1;
        let mut node = self.root;
        if node.is_null() {
            return None;
        }
        loop {
            let n = self.arena.get(node);
            let overlap = last.min(n.end);
            if let Some(bit) = first_diff_bit(key, &n.bytes, n.start, overlap) {
                return if bit_at(key, bit) == 0 {
                    // The query sorts below this whole subtree.
                    Some(self.subtree_first(node))
                } else {
                    self.after_subtree(node)
                };
            }
            if last <= n.end {
                // The query is a prefix of everything down here (or exactly
                // this node's key): the subtree's first entry is the answer.
                return Some(self.subtree_first(node));
            }
            // The key runs past this node; follow the next bit.
            let one = bit_at(key, n.end + 1) == 1;
            let next = if one { n.right } else { n.left };
            if !next.is_null() {
                node = next;
                continue;
            }
            if !one && !n.right.is_null() {
                // The 0-side is absent; the 1-side sorts above the query.
                return Some(self.subtree_first(n.right));
            }
            return self.after_subtree(node);
        }
    }

    /// Largest entry whose key is less than or equal to the query.
    ///
    /// A zero-bit query sorts before every entry, so it finds nothing.
    pub fn lookup_le(&self, key: &[u8], bits: u16) -> Option<NodeRef> {
        if bits == 0 {
            return None;
        }
        assert!(
            key.len() * 8 >= usize::from(bits),
            "key buffer shorter than {bits} bits"
        );
        let last = i32::from(bits) - 1;
        let mut node = self.root;
        if node.is_null() {
            return None;
        }
        loop {
            let n = self.arena.get(node);
            let overlap = last.min(n.end);
            if let Some(bit) = first_diff_bit(key, &n.bytes, n.start, overlap) {
                return if bit_at(key, bit) == 1 {
                    // The query sorts above this whole subtree.
                    Some(self.subtree_last(node))
                } else {
                    self.before_subtree(node)
                };
            }
            if last < n.end {
                // The query is a strict prefix of the node's span, so the
                // node and its subtree all sort above it.
                return self.before_subtree(node);
            }
            if last == n.end {
                return if n.data.is_some() {
                    Some(node)
                } else {
                    self.before_subtree(node)
                };
            }
            let one = bit_at(key, n.end + 1) == 1;
            let next = if one { n.right } else { n.left };
            if !next.is_null() {
                node = next;
                continue;
            }
            if one && !n.left.is_null() {
                // The 1-side is absent; the 0-side sorts below the query.
                return Some(self.subtree_last(n.left));
            }
            // A node missing a child is an entry, and its own key is a
            // strict prefix of the query: it is the floor.
            debug_assert!(n.data.is_some());
            return Some(node);
        }
    }

    /// Iterate every entry in key order.
    pub fn iter(&self) -> Iter<'_, V> {
        self.iter_prefix(&[], 0)
    }

    /// Iterate the entries whose keys extend (`key`, `bits`), in key order.
    /// A zero-bit restriction iterates everything.
    pub fn iter_prefix(&self, key: &[u8], bits: u16) -> Iter<'_, V> {
        let last = i32::from(bits) - 1;
        let mut start = NodeRef::NULL;
        if bits == 0 {
            if !self.root.is_null() {
                start = self.subtree_first(self.root);
            }
        } else {
            assert!(
                key.len() * 8 >= usize::from(bits),
                "key buffer shorter than {bits} bits"
            );
            let node = self.closest(key, last);
            if !node.is_null() {
                // The restricted entries, if any, are exactly the stop
                // node's subtree — provided the restriction is a prefix of
                // its span.
                let n = self.arena.get(node);
                if is_prefix_of(&n.bytes, key, n.end, last) {
                    start = self.subtree_first(node);
                }
            }
        }
        Iter {
            tree: self,
            key: SmallVec::from_slice(key),
            last,
            next_node: start,
        }
    }

    /// First entry of `node`'s subtree: the shallowest data node on the
    /// left-descent path. Dataless nodes are forks and always have children.
    pub(crate) fn subtree_first(&self, node: NodeRef) -> NodeRef {
        let mut node = node;
        loop {
            let n = self.arena.get(node);
            if n.data.is_some() {
                return node;
            }
            debug_assert!(!n.left.is_null());
            node = n.left;
        }
    }

    /// Last entry of `node`'s subtree: greedy right-else-left descent ends
    /// at a childless node, which always carries data.
    pub(crate) fn subtree_last(&self, node: NodeRef) -> NodeRef {
        let mut node = node;
        loop {
            let n = self.arena.get(node);
            let next = if !n.right.is_null() { n.right } else { n.left };
            if next.is_null() {
                debug_assert!(n.data.is_some());
                return node;
            }
            node = next;
        }
    }

    /// First entry after everything in `node`'s subtree.
    fn after_subtree(&self, node: NodeRef) -> Option<NodeRef> {
        let mut node = node;
        loop {
            let parent = self.arena.get(node).parent;
            if parent.is_null() {
                return None;
            }
            let p = self.arena.get(parent);
            if p.left == node && !p.right.is_null() {
                return Some(self.subtree_first(p.right));
            }
            node = parent;
        }
    }

    /// Last entry before everything in `node`'s subtree.
    fn before_subtree(&self, node: NodeRef) -> Option<NodeRef> {
        let mut node = node;
        loop {
            let parent = self.arena.get(node).parent;
            if parent.is_null() {
                return None;
            }
            let p = self.arena.get(parent);
            if p.right == node && !p.left.is_null() {
                return Some(self.subtree_last(p.left));
            }
            // The parent's own key precedes both subtrees.
            if p.data.is_some() {
                return Some(parent);
            }
            node = parent;
        }
    }
}

/// Ordered iterator over a tree's entries, optionally scoped to the subtree
/// of a key prefix. Ends as soon as an advance leaves the scoped subtree —
/// the restricted entries form one contiguous run of the traversal.
pub struct Iter<'a, V> {
    tree: &'a RadixTree<V>,
    /// Restricting prefix bytes; unused when unrestricted.
    key: SmallVec<[u8; 16]>,
    /// Restriction's last bit index, -1 when unrestricted.
    last: i32,
    next_node: NodeRef,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let node = self.next_node;
        if node.is_null() {
            return None;
        }
        let mut step = self.tree.next(node).unwrap_or(NodeRef::NULL);
        if !step.is_null() && self.last >= 0 {
            let n = self.tree.arena.get(step);
            if !is_prefix_of(&n.bytes, &self.key, n.end, self.last) {
                step = NodeRef::NULL;
            }
        }
        self.next_node = step;
        Some(node)
    }
}
