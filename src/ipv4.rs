//! IPv4 network keys.
//!
//! A network is a (address, mask length) pair; the key is the address's four
//! big-endian octets with the mask length as the significant bit count, so
//! numerically adjacent networks are adjacent in the tree and a covering
//! network is a bit-prefix of the networks it contains.

use smallvec::SmallVec;
use std::net::Ipv4Addr;

use crate::arena::NodeRef;
use crate::scan::Iter;
use crate::tree::RadixTree;

impl<V> RadixTree<V> {
    /// Insert a network. A zero mask covers everything and indexes nothing;
    /// it is rejected like a zero-bit key.
    ///
    /// # Panics
    ///
    /// Panics if `mask > 32`.
    pub fn ipv4_insert(&mut self, addr: Ipv4Addr, mask: u8, value: V) -> (Option<NodeRef>, bool) {
        assert!(mask <= 32, "IPv4 mask length out of range: {mask}");
        self.insert(&addr.octets(), u16::from(mask), value)
    }

    /// Exact-match lookup of a network.
    pub fn ipv4_get(&self, addr: Ipv4Addr, mask: u8) -> Option<NodeRef> {
        if mask == 0 || mask > 32 {
            return None;
        }
        self.get(&addr.octets(), u16::from(mask))
    }

    /// Most specific stored network containing (`addr`, `mask`).
    pub fn ipv4_lookup_longest(&self, addr: Ipv4Addr, mask: u8) -> Option<NodeRef> {
        if mask == 0 || mask > 32 {
            return None;
        }
        self.lookup_longest(&addr.octets(), u16::from(mask))
    }

    /// Every stored network containing (`addr`, `mask`), widest first.
    pub fn ipv4_lookup_longest_path(&self, addr: Ipv4Addr, mask: u8) -> SmallVec<[NodeRef; 8]> {
        if mask == 0 || mask > 32 {
            return SmallVec::new();
        }
        self.lookup_longest_path(&addr.octets(), u16::from(mask))
    }

    /// Remove a network by exact match, returning its value.
    pub fn ipv4_remove(&mut self, addr: Ipv4Addr, mask: u8) -> Option<V> {
        let node = self.ipv4_get(addr, mask)?;
        self.remove(node)
    }

    /// Iterate the stored networks contained in (`addr`, `mask`), most
    /// general first. A zero mask iterates everything.
    pub fn ipv4_iter(&self, addr: Ipv4Addr, mask: u8) -> Iter<'_, V> {
        debug_assert!(mask <= 32);
        self.iter_prefix(&addr.octets(), u16::from(mask.min(32)))
    }

    /// Reconstruct the network stored at `node`. Host bits beyond the mask
    /// are cleared whatever buffer was inserted.
    pub fn ipv4_network(&self, node: NodeRef) -> (Ipv4Addr, u8) {
        let bits = self.key_bits(node);
        debug_assert!((1..=32).contains(&bits), "not an IPv4 entry: {bits} bits");
        let stored = self.key_bytes(node);
        let mut octets = [0u8; 4];
        let take = stored.len().min(4);
        octets[..take].copy_from_slice(&stored[..take]);
        let mask = u32::MAX << (32 - u32::from(bits));
        (Ipv4Addr::from(u32::from_be_bytes(octets) & mask), bits as u8)
    }
}
