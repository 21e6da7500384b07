//! Block storage for `BlockList`.
//!
//! Blocks live in a per-list arena and are addressed by [`NodeId`] handles
//! instead of pointers. Each block owns an element buffer that is reserved to
//! exactly the list's block capacity when the block is created, so filling a
//! block never reallocates.

use std::ops::{Index, IndexMut};

use allocator_api2::alloc::Allocator;
use allocator_api2::vec::Vec as BlockVec;

use crate::error::{BlockListError, Result};

/// Handle to a block inside a [`NodeArena`].
///
/// Handles are only meaningful for the arena that issued them. Moving a block
/// into another arena (see [`NodeArena::adopt_chain`]) issues a new handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

/// A fixed-capacity block of elements and the link to its successor.
pub(crate) struct Node<T, A: Allocator> {
    pub(crate) items: BlockVec<T, A>,
    pub(crate) next: Option<NodeId>,
}

impl<T, A: Allocator> Node<T, A> {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

/// Slot storage for the blocks of one list.
///
/// Vacated slots are recycled through a free list. At most one emptied element
/// buffer is kept around so that a list which is drained and refilled does not
/// go back to the allocator for its first block.
pub(crate) struct NodeArena<T, A: Allocator + Clone> {
    /// Block slots; `None` marks a vacant slot listed in `free`
    slots: Vec<Option<Node<T, A>>>,
    /// Vacant slot handles, reused before `slots` grows
    free: Vec<NodeId>,
    /// Emptied buffer kept for the next allocation
    spare: Option<BlockVec<T, A>>,
    /// Number of occupied slots
    live: usize,
    alloc: A,
}

impl<T, A: Allocator + Clone> NodeArena<T, A> {
    pub(crate) fn new_in(alloc: A) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            spare: None,
            live: 0,
            alloc,
        }
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Number of blocks currently stored.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Upper bound (exclusive) of every handle this arena has issued.
    #[inline]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Makes room for `additional` more blocks without touching any block.
    ///
    /// After a successful call, that many [`insert`](Self::insert) calls are
    /// guaranteed not to allocate.
    pub(crate) fn reserve(&mut self, additional: usize, block_capacity: usize) -> Result<()> {
        let vacant = self.free.len() + (self.slots.capacity() - self.slots.len());
        if additional <= vacant {
            return Ok(());
        }
        self.slots
            .try_reserve(additional - vacant)
            .map_err(|_| BlockListError::AllocFailed { block_capacity })
    }

    /// Creates an empty block with room for exactly `block_capacity` elements.
    ///
    /// Fails without modifying the arena's live blocks if either the slot or
    /// the element buffer cannot be allocated.
    pub(crate) fn alloc(&mut self, block_capacity: usize) -> Result<NodeId> {
        self.reserve(1, block_capacity)?;
        let items = match self.spare.take() {
            Some(items) => items,
            None => {
                let mut items = BlockVec::new_in(self.alloc.clone());
                items
                    .try_reserve_exact(block_capacity)
                    .map_err(|_| BlockListError::AllocFailed { block_capacity })?;
                items
            }
        };
        let id = self.insert(Node { items, next: None });
        log::trace!("allocated block {} (capacity {block_capacity})", id.index());
        Ok(id)
    }

    /// Stores an existing block and returns its handle.
    pub(crate) fn insert(&mut self, node: Node<T, A>) -> NodeId {
        self.live += 1;
        match self.free.pop() {
            Some(id) => {
                self.slots[id.0] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Removes a block from the arena and hands ownership to the caller.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a live block.
    pub(crate) fn take(&mut self, id: NodeId) -> Node<T, A> {
        let node = match self.slots.get_mut(id.0).and_then(Option::take) {
            Some(node) => node,
            None => panic!("{id:?} does not refer to a live block"),
        };
        self.free.push(id);
        self.live -= 1;
        node
    }

    /// Drops the elements of a block and frees its slot.
    pub(crate) fn release(&mut self, id: NodeId) {
        let mut node = self.take(id);
        log::trace!("released block {}", id.index());
        if self.spare.is_none() {
            node.items.clear();
            self.spare = Some(node.items);
        }
    }

    /// Drops every block. The spare buffer survives.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    pub(crate) fn discard_spare(&mut self) {
        self.spare = None;
    }

    /// Counts the blocks reachable from `first`, inclusive.
    pub(crate) fn chain_len(&self, first: NodeId) -> usize {
        let mut count = 0;
        let mut cursor = Some(first);
        while let Some(id) = cursor {
            count += 1;
            cursor = self[id].next;
        }
        count
    }

    /// Moves the chain starting at `first` out of `donor` and into `self`.
    ///
    /// Element buffers move by value; no element is copied. Returns the new
    /// handles of the chain's head and tail. The caller must have reserved
    /// room for the whole chain beforehand.
    pub(crate) fn adopt_chain(&mut self, donor: &mut Self, first: NodeId) -> (NodeId, NodeId) {
        let mut node = donor.take(first);
        let mut cursor = node.next.take();
        let head = self.insert(node);
        let mut tail = head;
        while let Some(id) = cursor {
            let mut node = donor.take(id);
            cursor = node.next.take();
            let adopted = self.insert(node);
            self[tail].next = Some(adopted);
            tail = adopted;
        }
        (head, tail)
    }

    /// Iterates over the live blocks in slot order, not chain order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node<T, A>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|node| (NodeId(index), node)))
    }
}

impl<T, A: Allocator + Clone> Index<NodeId> for NodeArena<T, A> {
    type Output = Node<T, A>;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("{id:?} does not refer to a live block"),
        }
    }
}

impl<T, A: Allocator + Clone> IndexMut<NodeId> for NodeArena<T, A> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("{id:?} does not refer to a live block"),
        }
    }
}
