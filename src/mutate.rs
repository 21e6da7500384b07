//! Insertion and removal at arbitrary positions.

use allocator_api2::alloc::Allocator;

use crate::error::{BlockListError, Result};
use crate::node::NodeId;
use crate::BlockList;

impl<T, A: Allocator + Clone> BlockList<T, A> {
    /// Inserts an element at position `index`, shifting later elements right.
    ///
    /// Only the block holding `index` is shifted. When that block is full, one
    /// element spills into the front of the next block if it has room, or into
    /// a new block linked right after it.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::IndexOutOfRange`] if `index > len`, or
    /// [`BlockListError::AllocFailed`] if a spill block could not be allocated.
    /// The list is unchanged on error.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::BlockList;
    /// let mut list: BlockList<i32> = BlockList::new(2).unwrap();
    /// list.extend([1, 2, 4]);
    /// list.insert(2, 3).unwrap();
    /// assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
    /// ```
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(BlockListError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        if index == self.len {
            self.append(value)?;
            return Ok(());
        }

        // The located block keeps its prefix count, so the cache stays valid.
        let at = self.locate(index)?;
        let local = index - at.skipped;
        let node_len = self.nodes[at.node].len();

        if node_len < self.block_capacity {
            self.nodes[at.node].items.insert(local, value);
            self.len += 1;
            return Ok(());
        }

        let next = self.nodes[at.node].next;
        let dest = match next {
            Some(next) if self.nodes[next].len() < self.block_capacity => next,
            _ => {
                let spill = self.nodes.alloc(self.block_capacity)?;
                self.nodes[spill].next = next;
                self.nodes[at.node].next = Some(spill);
                if next.is_none() {
                    self.tail = Some(spill);
                }
                spill
            }
        };

        // The block's last element moves on; everything from `local` shifts
        // right by one and the new value takes its place.
        let items = &mut self.nodes[at.node].items;
        items[local..].rotate_right(1);
        let carry = std::mem::replace(&mut items[local], value);
        self.nodes[dest].items.insert(0, carry);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the element at position `index`.
    ///
    /// A block emptied by the removal is unlinked and freed.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::IndexOutOfRange`] if `index >= len`.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        let at = self.locate(index)?;
        let local = index - at.skipped;

        let value = self.nodes[at.node].items.remove(local);
        self.len -= 1;
        if self.nodes[at.node].len() == 0 {
            let prev = self.predecessor(at.node);
            self.unlink(at.node, prev);
            self.invalidate_locator();
        }
        Ok(value)
    }

    /// Removes `length` elements starting at `start`.
    ///
    /// Partially covered boundary blocks are trimmed in place and fully
    /// covered blocks are freed in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::RangeOutOfBounds`] if the range extends past
    /// the end of the list. Nothing is removed in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::BlockList;
    /// let mut list: BlockList<i32> = BlockList::new(4).unwrap();
    /// list.extend(0..10);
    /// list.remove_range(2, 7).unwrap();
    /// assert_eq!(list.to_vec(), vec![0, 1, 9]);
    /// ```
    pub fn remove_range(&mut self, start: usize, length: usize) -> Result<()> {
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
        if length == 0 {
            return Ok(());
        }
        self.invalidate_locator();

        // Find the block holding `start` and the block before it.
        let mut prev: Option<NodeId> = None;
        let mut cursor = self.head;
        let mut skipped = 0;
        while let Some(id) = cursor {
            let n = self.nodes[id].len();
            if start < skipped + n {
                break;
            }
            skipped += n;
            prev = Some(id);
            cursor = self.nodes[id].next;
        }

        let mut remaining = length;
        let mut freed = 0;

        // Trim the tail end of the first block.
        if let Some(id) = cursor.filter(|_| start > skipped) {
            let offset = start - skipped;
            let items = &mut self.nodes[id].items;
            let n = items.len();
            if offset + remaining < n {
                items.drain(offset..offset + remaining);
                self.len -= remaining;
                return Ok(());
            }
            items.truncate(offset);
            let trimmed = n - offset;
            self.len -= trimmed;
            remaining -= trimmed;
            prev = Some(id);
            cursor = self.nodes[id].next;
        }

        // Free every block the range covers completely.
        while let Some(id) = cursor {
            let n = self.nodes[id].len();
            if remaining < n {
                break;
            }
            remaining -= n;
            self.len -= n;
            cursor = self.nodes[id].next;
            self.nodes.release(id);
            freed += 1;
        }
        match prev {
            Some(prev) => self.nodes[prev].next = cursor,
            None => self.head = cursor,
        }
        if cursor.is_none() {
            self.tail = prev;
        }

        // Trim the front of the last block.
        if remaining > 0 {
            if let Some(id) = cursor {
                self.nodes[id].items.drain(..remaining);
                self.len -= remaining;
            }
        }

        log::debug!("removed {length} elements at {start}, freed {freed} blocks");
        Ok(())
    }

    /// Unlinks `id` (whose predecessor is `prev`) and frees it.
    fn unlink(&mut self, id: NodeId, prev: Option<NodeId>) {
        let next = self.nodes[id].next;
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        if self.tail == Some(id) {
            self.tail = prev;
        }
        self.nodes.release(id);
    }
}
