//! Fixed event pool
//!
//! All scheduled events live in one pre-allocated `Vec` of nodes. Free nodes
//! form a singly linked list through `next`; wheel slots reuse the same
//! `next`/`prev` fields as an intrusive doubly linked list.

/// List terminator
pub(crate) const NIL: u32 = u32::MAX;

/// Where a live node currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Free,
    /// Linked into the wheel slot with this index
    Wheel(u32),
    Heap,
}

pub(crate) struct Node<P> {
    pub fire_time_ns: u64,
    pub sequence_id: u64,
    pub payload: Option<P>,
    /// Bumped on every release so stale handles never match
    pub generation: u32,
    pub next: u32,
    pub prev: u32,
    pub location: Location,
}

pub(crate) struct EventPool<P> {
    nodes: Vec<Node<P>>,
    free_head: u32,
    in_use: usize,
}

impl<P> EventPool<P> {
    /// Pre-allocate `capacity` nodes (caller guarantees `capacity < u32::MAX`)
    pub fn with_capacity(capacity: usize) -> Self {
        let nodes = (0..capacity)
            .map(|i| Node {
                fire_time_ns: 0,
                sequence_id: 0,
                payload: None,
                generation: 0,
                next: if i + 1 < capacity { (i + 1) as u32 } else { NIL },
                prev: NIL,
                location: Location::Free,
            })
            .collect();

        Self {
            nodes,
            free_head: if capacity > 0 { 0 } else { NIL },
            in_use: 0,
        }
    }

    /// Take a free node, or `None` when the pool is exhausted
    #[inline]
    pub fn alloc(&mut self, fire_time_ns: u64, sequence_id: u64, payload: P) -> Option<u32> {
        let index = self.free_head;
        if index == NIL {
            return None;
        }

        let node = &mut self.nodes[index as usize];
        self.free_head = node.next;
        node.fire_time_ns = fire_time_ns;
        node.sequence_id = sequence_id;
        node.payload = Some(payload);
        node.next = NIL;
        node.prev = NIL;
        self.in_use += 1;
        Some(index)
    }

    /// Return a node to the free list, handing back its payload
    #[inline]
    pub fn release(&mut self, index: u32) -> Option<P> {
        let free_head = self.free_head;
        let node = &mut self.nodes[index as usize];
        if node.location == Location::Free {
            return None;
        }

        let payload = node.payload.take();
        node.generation = node.generation.wrapping_add(1);
        node.location = Location::Free;
        node.prev = NIL;
        node.next = free_head;
        self.free_head = index;
        self.in_use -= 1;
        payload
    }

    /// True if `index` is live and still carries `generation`
    #[inline]
    pub fn is_live(&self, index: u32, generation: u32) -> bool {
        self.nodes
            .get(index as usize)
            .map(|n| n.location != Location::Free && n.generation == generation)
            .unwrap_or(false)
    }

    #[inline(always)]
    pub fn node(&self, index: u32) -> &Node<P> {
        &self.nodes[index as usize]
    }

    #[inline(always)]
    pub fn node_mut(&mut self, index: u32) -> &mut Node<P> {
        &mut self.nodes[index as usize]
    }

    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }
}
