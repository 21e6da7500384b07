//! Whole-list operations: split, concatenation, reversal and range copies.

use allocator_api2::alloc::Allocator;

use crate::error::{BlockListError, Result};
use crate::node::NodeId;
use crate::BlockList;

impl<T, A: Allocator + Clone> BlockList<T, A> {
    /// Moves the elements from `at` onwards to the back of `dest`.
    ///
    /// When `at` falls on a block boundary the trailing blocks are relinked
    /// into `dest` as they are. Otherwise the block holding `at` is split: its
    /// suffix moves into a new block owned by `dest` and the prefix stays.
    /// Element buffers of the trailing blocks change owner without copying.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::IndexOutOfRange`] if `at > len`, or
    /// [`BlockListError::AllocFailed`] if `dest` could not make room. Neither
    /// list is modified on error.
    ///
    /// # Panics
    ///
    /// Panics if the two lists use different block capacities.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::BlockList;
    /// let mut src: BlockList<i32> = BlockList::new(4).unwrap();
    /// let mut dest: BlockList<i32> = BlockList::new(4).unwrap();
    /// src.extend(0..10);
    /// dest.push(-1).unwrap();
    ///
    /// src.split_into(&mut dest, 6).unwrap();
    /// assert_eq!(src.to_vec(), vec![0, 1, 2, 3, 4, 5]);
    /// assert_eq!(dest.to_vec(), vec![-1, 6, 7, 8, 9]);
    /// ```
    pub fn split_into(&mut self, dest: &mut Self, at: usize) -> Result<()> {
        self.assert_same_layout(dest, "split");
        if at > self.len {
            return Err(BlockListError::IndexOutOfRange {
                index: at,
                len: self.len,
            });
        }
        if at == self.len {
            return Ok(());
        }

        let loc = self.locate(at)?;
        let offset = at - loc.skipped;
        let moved = self.len - at;

        // Room for every block that ends up in `dest`, split block included.
        dest.nodes
            .reserve(self.nodes.chain_len(loc.node), self.block_capacity)?;

        let (head, tail) = if offset == 0 {
            match self.predecessor(loc.node) {
                Some(prev) => {
                    self.nodes[prev].next = None;
                    self.tail = Some(prev);
                }
                None => {
                    self.head = None;
                    self.tail = None;
                }
            }
            dest.nodes.adopt_chain(&mut self.nodes, loc.node)
        } else {
            let split = dest.nodes.alloc(self.block_capacity)?;
            let rest = self.nodes[loc.node].next.take();
            dest.nodes[split]
                .items
                .extend(self.nodes[loc.node].items.drain(offset..));
            self.tail = Some(loc.node);

            let tail = match rest {
                Some(rest) => {
                    let (first, last) = dest.nodes.adopt_chain(&mut self.nodes, rest);
                    dest.nodes[split].next = Some(first);
                    last
                }
                None => split,
            };
            (split, tail)
        };

        dest.link_chain(head, tail, moved);
        self.len -= moved;
        self.invalidate_locator();
        log::debug!(
            "split {moved} elements at {at}; source keeps {} blocks, destination has {}",
            self.nodes.live(),
            dest.nodes.live()
        );
        Ok(())
    }

    /// Splits the list at `at`, returning the elements from `at` onwards in
    /// a new list with the same block capacity and allocator.
    pub fn split_off(&mut self, at: usize) -> Result<Self> {
        let mut other = Self::new_in(self.block_capacity, self.nodes.allocator().clone())?;
        self.split_into(&mut other, at)?;
        Ok(other)
    }

    /// Moves every element of `other` to the back of `self`, leaving `other`
    /// empty.
    ///
    /// Blocks are handed over whole; no element is copied. When `self` is
    /// empty the two lists simply swap storage.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::AllocFailed`] if `self` could not make room
    /// for `other`'s blocks. Neither list is modified on error.
    ///
    /// # Panics
    ///
    /// Panics if the two lists use different block capacities.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::BlockList;
    /// let mut a: BlockList<i32> = BlockList::new(4).unwrap();
    /// let mut b: BlockList<i32> = BlockList::new(4).unwrap();
    /// a.extend([1, 2]);
    /// b.extend([3, 4, 5]);
    /// a.concat(&mut b).unwrap();
    /// assert_eq!(a.to_vec(), vec![1, 2, 3, 4, 5]);
    /// assert!(b.is_empty());
    /// ```
    pub fn concat(&mut self, other: &mut Self) -> Result<()> {
        self.assert_same_layout(other, "concat");
        self.invalidate_locator();
        let Some(other_head) = other.head else {
            return Ok(());
        };

        if self.head.is_none() {
            std::mem::swap(&mut self.nodes, &mut other.nodes);
            self.head = other.head.take();
            self.tail = other.tail.take();
            self.len = std::mem::take(&mut other.len);
            other.invalidate_locator();
            return Ok(());
        }

        self.nodes
            .reserve(other.nodes.live(), self.block_capacity)?;
        let (head, tail) = self.nodes.adopt_chain(&mut other.nodes, other_head);
        self.link_chain(head, tail, other.len);

        log::debug!("concatenated {} elements", other.len);
        other.head = None;
        other.tail = None;
        other.len = 0;
        other.invalidate_locator();
        Ok(())
    }

    /// Reverses the order of the elements in place.
    ///
    /// Each block is reversed on its own and then the chain is relinked back
    /// to front; no element moves between blocks.
    pub fn reverse(&mut self) {
        let mut prev: Option<NodeId> = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let node = &mut self.nodes[id];
            node.items.reverse();
            cursor = node.next;
            node.next = prev;
            prev = Some(id);
        }
        std::mem::swap(&mut self.head, &mut self.tail);
        self.invalidate_locator();
        log::debug!("reversed {} elements across {} blocks", self.len, self.nodes.live());
    }

    /// Clones `length` elements starting at `start` into the front of `dest`.
    ///
    /// Contiguous runs are copied block by block.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::RangeOutOfBounds`] if the range extends past
    /// the end of the list, or [`BlockListError::BufferTooSmall`] if `dest`
    /// is shorter than `length`.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::BlockList;
    /// let mut list: BlockList<i32> = BlockList::new(3).unwrap();
    /// list.extend(0..10);
    /// let mut out = [0; 5];
    /// list.copy_range(2, 5, &mut out).unwrap();
    /// assert_eq!(out, [2, 3, 4, 5, 6]);
    /// ```
    pub fn copy_range(&self, start: usize, length: usize, dest: &mut [T]) -> Result<()>
    where
        T: Clone,
    {
        match start.checked_add(length) {
            Some(end) if end <= self.len => {}
            _ => {
                return Err(BlockListError::RangeOutOfBounds {
                    start,
                    length,
                    len: self.len,
                })
            }
        }
        if dest.len() < length {
            return Err(BlockListError::BufferTooSmall {
                required: length,
                available: dest.len(),
            });
        }
        if length == 0 {
            return Ok(());
        }

        let mut at = self.locate(start)?;
        let mut offset = start - at.skipped;
        let mut written = 0;
        loop {
            let node = &self.nodes[at.node];
            let take = (node.len() - offset).min(length - written);
            dest[written..written + take].clone_from_slice(&node.items[offset..offset + take]);
            written += take;
            self.locator.set(Some(at));
            if written == length {
                return Ok(());
            }
            offset = 0;
            at.skipped += node.len();
            match node.next {
                Some(next) => at.node = next,
                None => {
                    return Err(BlockListError::RangeOutOfBounds {
                        start,
                        length,
                        len: self.len,
                    })
                }
            }
        }
    }

    /// Appends an already detached chain holding `count` elements.
    fn link_chain(&mut self, head: NodeId, tail: NodeId, count: usize) {
        match self.tail {
            Some(old_tail) => self.nodes[old_tail].next = Some(head),
            None => self.head = Some(head),
        }
        self.tail = Some(tail);
        self.len += count;
    }
}
