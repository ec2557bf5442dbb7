//! Chunked node storage with 32-bit packed references.
//!
//! Native pointers cost 8 bytes, and a tree node carries three of them. At
//! tens of millions of entries that overhead dominates, so nodes live in
//! fixed-size chunks and link to each other through [`NodeRef`], a packed
//! `chunk << 16 | slot` index. Chunks are append-only and never move or
//! resize, so a reference handed out by [`NodeArena::alloc`] stays valid
//! until it is explicitly freed — no generation tagging is needed.

/// Slots per chunk. The slot index must fit the low 16 bits of a reference.
pub(crate) const CHUNK_SLOTS: usize = 1 << 16;

/// Chunk count addressable by the reference format.
pub(crate) const MAX_CHUNKS: usize = 1 << 15;

/// Packed reference to a node slot: `chunk << 16 | slot`.
///
/// Reference 0 names slot 0 of chunk 0, which is reserved at creation as the
/// permanent null sentinel and never allocated, so 0 doubles as the null
/// reference.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct NodeRef(u32);

impl NodeRef {
    pub(crate) const NULL: NodeRef = NodeRef(0);

    #[inline]
    pub(crate) fn new(chunk: usize, slot: usize) -> Self {
        debug_assert!(chunk < MAX_CHUNKS && slot < CHUNK_SLOTS);
        NodeRef(((chunk as u32) << 16) | slot as u32)
    }

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    fn chunk(self) -> usize {
        (self.0 >> 16) as usize
    }

    #[inline]
    fn slot(self) -> usize {
        (self.0 & 0xffff) as usize
    }
}

/// A tree node. `data` doubles as the leaf/branch discriminator: a branch
/// carries `None` and always has two children; a leaf carries a value and may
/// have zero, one or two children (its key being a prefix of longer entries).
pub(crate) struct Node<V> {
    /// Full key buffer as inserted; only bits [start, end] are represented by
    /// this node, bits past `end` of the buffer are padding.
    pub(crate) bytes: Box<[u8]>,
    /// Inclusive bit range this node stands for. `end == start - 1` is the
    /// empty span, which only ever appears on a root forked at bit 0.
    pub(crate) start: i32,
    pub(crate) end: i32,
    pub(crate) parent: NodeRef,
    /// Child for a next bit of 0. Doubles as the free-list link while the
    /// slot is vacant.
    pub(crate) left: NodeRef,
    /// Child for a next bit of 1.
    pub(crate) right: NodeRef,
    pub(crate) data: Option<V>,
}

impl<V> Node<V> {
    fn vacant() -> Self {
        Node {
            bytes: Box::default(),
            start: 0,
            end: -1,
            parent: NodeRef::NULL,
            left: NodeRef::NULL,
            right: NodeRef::NULL,
            data: None,
        }
    }
}

/// Pooled storage for one tree's nodes.
pub(crate) struct NodeArena<V> {
    chunks: Vec<Box<[Node<V>]>>,
    /// Head of the intrusive free list, threaded through `Node::left`.
    free_head: NodeRef,
    /// Vacant slots, excluding the null sentinel.
    free: usize,
    /// Total usable slots, excluding the null sentinel.
    capacity: usize,
}

impl<V> NodeArena<V> {
    pub(crate) fn new() -> Self {
        NodeArena {
            chunks: Vec::new(),
            free_head: NodeRef::NULL,
            free: 0,
            capacity: 0,
        }
    }

    #[inline]
    pub(crate) fn get(&self, r: NodeRef) -> &Node<V> {
        debug_assert!(!r.is_null());
        &self.chunks[r.chunk()][r.slot()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, r: NodeRef) -> &mut Node<V> {
        debug_assert!(!r.is_null());
        &mut self.chunks[r.chunk()][r.slot()]
    }

    /// Pop a vacant slot, growing by one chunk when the free list is empty.
    ///
    /// The returned slot is fully reset: empty key, empty span, null links,
    /// no data.
    ///
    /// # Panics
    ///
    /// Panics when the reference format's address space (32768 chunks of
    /// 65536 slots) is exhausted. References must never wrap into live ones.
    pub(crate) fn alloc(&mut self) -> NodeRef {
        if self.free_head.is_null() {
            self.grow();
        }
        let r = self.free_head;
        self.free_head = self.get(r).left;
        self.get_mut(r).left = NodeRef::NULL;
        self.free -= 1;
        r
    }

    /// Return a slot to the free list. The value and key bytes are dropped
    /// right away; nothing survives a free.
    pub(crate) fn free(&mut self, r: NodeRef) {
        debug_assert!(!r.is_null());
        let head = self.free_head;
        let n = self.get_mut(r);
        n.data = None;
        n.bytes = Box::default();
        n.start = 0;
        n.end = -1;
        n.parent = NodeRef::NULL;
        n.right = NodeRef::NULL;
        n.left = head;
        self.free_head = r;
        self.free += 1;
    }

    fn grow(&mut self) {
        assert!(
            self.chunks.len() < MAX_CHUNKS,
            "node arena exhausted: reference space caps at {} chunks of {} slots",
            MAX_CHUNKS,
            CHUNK_SLOTS,
        );
        let index = self.chunks.len();
        let chunk: Box<[Node<V>]> = (0..CHUNK_SLOTS).map(|_| Node::vacant()).collect();
        self.chunks.push(chunk);

        // Slot 0 of the first chunk is the permanent null sentinel: its
        // storage exists but it is never handed out and stays out of the
        // counters.
        let first_slot = usize::from(index == 0);
        for slot in (first_slot..CHUNK_SLOTS).rev() {
            self.chunks[index][slot].left = self.free_head;
            self.free_head = NodeRef::new(index, slot);
        }
        self.free += CHUNK_SLOTS - first_slot;
        self.capacity += CHUNK_SLOTS - first_slot;
    }

    /// Vacant slots currently on the free list.
    pub(crate) fn free_slots(&self) -> usize {
        self.free
    }

    /// Usable slots across all chunks.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_accounting() {
        let mut a: NodeArena<u64> = NodeArena::new();
        assert_eq!(a.capacity(), 0);
        assert_eq!(a.free_slots(), 0);

        for _ in 0..5 {
            a.grow();
        }
        // The sentinel slot of the first chunk is excluded.
        assert_eq!(a.capacity(), 5 * CHUNK_SLOTS - 1);
        assert_eq!(a.free_slots(), 5 * CHUNK_SLOTS - 1);
    }

    #[test]
    fn test_alloc_never_returns_null_or_duplicates() {
        let mut a: NodeArena<u64> = NodeArena::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let r = a.alloc();
            assert!(!r.is_null());
            assert!(seen.insert(r), "allocation returned a live reference");
        }
        assert_eq!(a.capacity() - a.free_slots(), 1000);
    }

    #[test]
    fn test_references_stable_across_growth() {
        let mut a: NodeArena<u64> = NodeArena::new();
        let r = a.alloc();
        a.get_mut(r).data = Some(42);
        a.get_mut(r).end = 31;

        // Force several growths; the early reference must still resolve to
        // the same slot contents.
        for _ in 0..4 {
            a.grow();
        }
        assert_eq!(a.get(r).data, Some(42));
        assert_eq!(a.get(r).end, 31);
    }

    #[test]
    fn test_free_recycles_and_clears() {
        let mut a: NodeArena<String> = NodeArena::new();
        let r = a.alloc();
        {
            let n = a.get_mut(r);
            n.data = Some("payload".to_owned());
            n.bytes = Box::from(&b"key"[..]);
            n.start = 3;
            n.end = 17;
            n.parent = NodeRef::new(0, 7);
            n.right = NodeRef::new(0, 9);
        }
        let live = a.capacity() - a.free_slots();
        a.free(r);
        assert_eq!(a.capacity() - a.free_slots(), live - 1);

        // The freed slot comes back first, fully reset.
        let r2 = a.alloc();
        assert_eq!(r2, r);
        let n = a.get(r2);
        assert!(n.data.is_none());
        assert!(n.bytes.is_empty());
        assert_eq!((n.start, n.end), (0, -1));
        assert!(n.parent.is_null() && n.left.is_null() && n.right.is_null());
    }

    #[test]
    fn test_packed_reference_round_trip() {
        let r = NodeRef::new(3, 4343);
        assert_eq!(r.chunk(), 3);
        assert_eq!(r.slot(), 4343);
        let again = NodeRef::new(r.chunk(), r.slot());
        assert_eq!(r, again);
    }

    #[test]
    fn test_sentinel_is_never_allocated() {
        let mut a: NodeArena<u64> = NodeArena::new();
        for _ in 0..CHUNK_SLOTS {
            assert!(!a.alloc().is_null());
        }
        // The first chunk held CHUNK_SLOTS - 1 usable slots, so one of those
        // allocations already grew a second chunk; the sentinel stayed put.
        assert_eq!(a.capacity(), 2 * CHUNK_SLOTS - 1);
    }
}
