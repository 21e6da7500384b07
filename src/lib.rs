//! A block-structured dynamic list.
//!
//! `BlockList` stores its elements in a chain of fixed-capacity blocks. Inserting
//! or removing in the middle only shifts elements inside one block (occasionally
//! spilling one element into a neighbour), and whole runs of blocks can be split
//! off or spliced onto another list without copying elements.
//!
//! Lookups by logical index remember the last block they resolved, so forward
//! scans and repeated appends cost amortized O(1) per access.
//!
//! # Example
//!
//! ```
//! use block_list::BlockList;
//!
//! let mut list: BlockList<u32> = BlockList::new(4).unwrap();
//! for i in 1..=10 {
//!     list.push(i).unwrap();
//! }
//! assert_eq!(list.node_lens(), vec![4, 4, 2]);
//!
//! list.insert(5, 99).unwrap();
//! list.remove_range(0, 5).unwrap();
//! assert_eq!(list.to_vec(), vec![99, 6, 7, 8, 9, 10]);
//! ```

mod bulk;
mod check;
mod error;
mod into_iter;
mod iter;
mod locator;
mod mutate;
mod node;
mod sorted;

use allocator_api2::alloc::{Allocator, Global};
pub use check::ConsistencyError;
pub use error::{BlockListError, Result};
pub use into_iter::IntoIter;
pub use iter::{Iter, IterMut};
pub use sorted::SortedInsert;

use locator::Locator;
use node::{NodeArena, NodeId};
use std::cell::Cell;
use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

/// Block capacity used by [`Default`] and [`FromIterator`].
pub const DEFAULT_BLOCK_CAPACITY: usize = 256;

/// A list of elements stored in a chain of fixed-capacity blocks.
///
/// # Memory Layout
///
/// Every block holds between 1 and `block_capacity` elements contiguously;
/// no empty block is ever left linked. Blocks are created lazily when the
/// tail fills up or an insert overflows a full block, and freed as soon as a
/// removal empties them.
///
/// Reads through a shared reference may update the internal locality cache,
/// so a `BlockList` is not `Sync`. Callers sharing one across threads need
/// their own locking.
pub struct BlockList<T, A: Allocator + Clone = Global> {
    /// Block storage
    pub(crate) nodes: NodeArena<T, A>,
    /// First block of the chain
    pub(crate) head: Option<NodeId>,
    /// Last block of the chain
    pub(crate) tail: Option<NodeId>,
    /// Number of elements across all blocks
    pub(crate) len: usize,
    /// Maximum number of elements per block
    pub(crate) block_capacity: usize,
    /// Most recently resolved block
    pub(crate) locator: Cell<Option<Locator>>,
}

impl<T> BlockList<T> {
    /// Creates an empty list whose blocks hold up to `block_capacity` elements.
    ///
    /// Does not allocate until elements are pushed.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::InvalidArgument`] if `block_capacity` is zero
    /// or `T` is zero-sized.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::BlockList;
    /// let list: BlockList<i32> = BlockList::new(8).unwrap();
    /// assert!(list.is_empty());
    /// assert!(BlockList::<i32>::new(0).is_err());
    /// ```
    pub fn new(block_capacity: usize) -> Result<Self> {
        Self::new_in(block_capacity, Global)
    }
}

impl<T, A: Allocator + Clone> BlockList<T, A> {
    /// Creates an empty list that allocates its blocks from `alloc`.
    ///
    /// Does not allocate until elements are pushed.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::InvalidArgument`] if `block_capacity` is zero
    /// or `T` is zero-sized.
    ///
    /// # Example
    ///
    /// ```
    /// use allocator_api2::alloc::Global;
    /// use block_list::BlockList;
    /// let list: BlockList<u16> = BlockList::new_in(16, Global).unwrap();
    /// assert_eq!(list.block_capacity(), 16);
    /// ```
    pub fn new_in(block_capacity: usize, alloc: A) -> Result<Self> {
        if block_capacity == 0 {
            return Err(BlockListError::InvalidArgument(
                "block capacity must be at least 1",
            ));
        }
        if std::mem::size_of::<T>() == 0 {
            return Err(BlockListError::InvalidArgument(
                "zero-sized element types are not supported",
            ));
        }
        Ok(Self {
            nodes: NodeArena::new_in(alloc),
            head: None,
            tail: None,
            len: 0,
            block_capacity,
            locator: Cell::new(None),
        })
    }

    /// Returns the number of elements in the list.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list contains no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the maximum number of elements a single block holds.
    #[inline]
    pub const fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Returns the size in bytes of one element.
    #[inline]
    pub const fn element_size(&self) -> usize {
        std::mem::size_of::<T>()
    }

    /// Returns the number of blocks currently linked.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    /// Returns the occupancy of every block, head first.
    ///
    /// ```
    /// use block_list::BlockList;
    /// let mut list: BlockList<i32> = BlockList::new(3).unwrap();
    /// list.extend(0..7);
    /// assert_eq!(list.node_lens(), vec![3, 3, 1]);
    /// ```
    pub fn node_lens(&self) -> Vec<usize> {
        let mut lens = Vec::with_capacity(self.nodes.live());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            lens.push(self.nodes[id].len());
            cursor = self.nodes[id].next;
        }
        lens
    }

    /// Returns a reference to the underlying allocator.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.nodes.allocator()
    }

    /// Appends an element to the back of the list and returns a reference to
    /// the stored value.
    ///
    /// A new block is linked as the tail when the current tail is full.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::AllocFailed`] if a new block was needed and
    /// could not be allocated. The list is unchanged in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::BlockList;
    /// let mut list: BlockList<i32> = BlockList::new(2).unwrap();
    /// *list.append(1).unwrap() += 10;
    /// assert_eq!(list.get(0), Ok(&11));
    /// ```
    pub fn append(&mut self, value: T) -> Result<&mut T> {
        let tail = match self.tail {
            Some(tail) if self.nodes[tail].len() < self.block_capacity => tail,
            _ => {
                let id = self.nodes.alloc(self.block_capacity)?;
                self.link_tail(id);
                id
            }
        };

        self.len += 1;
        let items = &mut self.nodes[tail].items;
        let slot = items.len();
        items.push(value);
        Ok(&mut items[slot])
    }

    /// Pushes an element onto the back of the list. Same as [`append`](Self::append).
    #[inline]
    pub fn push(&mut self, value: T) -> Result<&mut T> {
        self.append(value)
    }

    /// Appends `T::default()` and returns it for the caller to fill in.
    pub fn append_default(&mut self) -> Result<&mut T>
    where
        T: Default,
    {
        self.append(T::default())
    }

    /// Removes the last element and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::Empty`] if the list is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::{BlockList, BlockListError};
    /// let mut list: BlockList<i32> = BlockList::new(2).unwrap();
    /// list.push(1).unwrap();
    /// list.push(2).unwrap();
    /// assert_eq!(list.pop(), Ok(2));
    /// assert_eq!(list.pop(), Ok(1));
    /// assert_eq!(list.pop(), Err(BlockListError::Empty));
    /// ```
    pub fn pop(&mut self) -> Result<T> {
        let tail = self.tail.ok_or(BlockListError::Empty)?;
        if self.nodes[tail].len() > 1 {
            if let Some(value) = self.nodes[tail].items.pop() {
                self.len -= 1;
                return Ok(value);
            }
        }
        // The tail empties out and has to be unlinked.
        self.remove(self.len - 1)
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockListError::IndexOutOfRange`] if `index >= len`.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&T> {
        let at = self.locate(index)?;
        Ok(&self.nodes[at.node].items[index - at.skipped])
    }

    /// Returns a clone of the element at `index`.
    pub fn get_cloned(&self, index: usize) -> Result<T>
    where
        T: Clone,
    {
        self.get(index).cloned()
    }

    /// Returns a mutable reference to the element at `index`.
    #[inline]
    pub fn access(&mut self, index: usize) -> Result<&mut T> {
        let at = self.locate(index)?;
        Ok(&mut self.nodes[at.node].items[index - at.skipped])
    }

    /// Replaces the element at `index` and returns the previous value.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        Ok(std::mem::replace(self.access(index)?, value))
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.head.and_then(|head| self.nodes[head].items.first())
    }

    /// Returns a reference to the last element, or `None` if empty.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.tail.and_then(|tail| self.nodes[tail].items.last())
    }

    /// Returns `true` if the list contains an element equal to `x`.
    pub fn contains(&self, x: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|item| item == x)
    }

    /// Removes every element and frees every block.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.discard_spare();
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.invalidate_locator();
    }

    /// Removes every element but keeps one block's buffer for reuse.
    ///
    /// Cheaper than [`clear`](Self::clear) when the list is about to be
    /// refilled, since the next append does not go back to the allocator.
    pub fn reset(&mut self) {
        if let Some(head) = self.head {
            self.nodes.release(head);
        }
        self.nodes.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.invalidate_locator();
    }

    /// Copies the list into a standard `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::with_capacity(self.len);
        out.extend(self.iter().cloned());
        out
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter::new(self)
    }

    /// Returns an iterator over mutable references to the elements.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self)
    }

    /// Links a freshly allocated, unlinked block after the current tail.
    pub(crate) fn link_tail(&mut self, id: NodeId) {
        self.nodes[id].next = None;
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }

    /// Panics unless `other` uses the same block capacity.
    pub(crate) fn assert_same_layout(&self, other: &Self, operation: &str) {
        if self.block_capacity != other.block_capacity {
            log::error!(
                "{operation}: block capacity mismatch ({} vs {})",
                self.block_capacity,
                other.block_capacity
            );
            panic!(
                "cannot {operation} block lists with different block capacities ({} vs {})",
                self.block_capacity, other.block_capacity
            );
        }
    }

    fn push_or_panic(&mut self, value: T) {
        if let Err(err) = self.append(value) {
            panic!("{err}");
        }
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for BlockList<T, A> {
    /// Clones the elements into densely packed blocks.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails.
    fn clone(&self) -> Self {
        let mut list = Self {
            nodes: NodeArena::new_in(self.nodes.allocator().clone()),
            head: None,
            tail: None,
            len: 0,
            block_capacity: self.block_capacity,
            locator: Cell::new(None),
        };
        for item in self.iter() {
            list.push_or_panic(item.clone());
        }
        list
    }
}

impl<T: PartialEq, A: Allocator + Clone> PartialEq for BlockList<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, A: Allocator + Clone> Eq for BlockList<T, A> {}

impl<T: PartialOrd, A: Allocator + Clone> PartialOrd for BlockList<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, A: Allocator + Clone> Ord for BlockList<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: std::hash::Hash, A: Allocator + Clone> std::hash::Hash for BlockList<T, A> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for item in self.iter() {
            item.hash(state);
        }
    }
}

impl<T: std::fmt::Debug, A: Allocator + Clone> std::fmt::Debug for BlockList<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for BlockList<T> {
    /// Creates an empty list with [`DEFAULT_BLOCK_CAPACITY`].
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    fn default() -> Self {
        match Self::new(DEFAULT_BLOCK_CAPACITY) {
            Ok(list) => list,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, A: Allocator + Clone> Index<usize> for BlockList<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Ok(item) => item,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, A: Allocator + Clone> IndexMut<usize> for BlockList<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match self.access(index) {
            Ok(item) => item,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, A: Allocator + Clone> Extend<T> for BlockList<T, A> {
    /// # Panics
    ///
    /// Panics if allocation fails.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_or_panic(item);
        }
    }
}

impl<'a, T: Clone + 'a, A: Allocator + Clone> Extend<&'a T> for BlockList<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push_or_panic(item.clone());
        }
    }
}

impl<T> FromIterator<T> for BlockList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::default();
        list.extend(iter);
        list
    }
}

impl<T, A: Allocator + Clone> IntoIterator for BlockList<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, A: Allocator + Clone> IntoIterator for &'a BlockList<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator + Clone> IntoIterator for &'a mut BlockList<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(block_capacity: usize, values: impl IntoIterator<Item = i32>) -> BlockList<i32> {
        let mut list = BlockList::new(block_capacity).unwrap();
        list.extend(values);
        list
    }

    #[test]
    fn test_new_empty() {
        let list: BlockList<i32> = BlockList::new(4).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.node_count(), 0);
        assert_eq!(list.block_capacity(), 4);
        assert_eq!(list.element_size(), 4);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            BlockList::<i32>::new(0),
            Err(BlockListError::InvalidArgument(_))
        ));
        assert!(matches!(
            BlockList::<()>::new(4),
            Err(BlockListError::InvalidArgument(_))
        ));
        assert!(matches!(
            BlockList::<i32, Global>::new_in(0, Global),
            Err(BlockListError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_append_fills_blocks_in_order() {
        let list = list_of(4, 1..=10);
        assert_eq!(list.len(), 10);
        assert_eq!(list.node_lens(), vec![4, 4, 2]);
        assert_eq!(list.to_vec(), (1..=10).collect::<Vec<_>>());
        list.check_consistency().unwrap();
    }

    #[test]
    fn test_push_pop() {
        let mut list: BlockList<i32> = BlockList::new(2).unwrap();
        list.push(1).unwrap();
        list.push(2).unwrap();
        list.push(3).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.pop(), Ok(3));
        list.check_consistency().unwrap();
        assert_eq!(list.pop(), Ok(2));
        assert_eq!(list.pop(), Ok(1));
        assert_eq!(list.pop(), Err(BlockListError::Empty));
        assert!(list.is_empty());
        list.check_consistency().unwrap();
    }

    #[test]
    fn test_get_set_access() {
        let mut list = list_of(3, [10, 20, 30, 40]);
        assert_eq!(list.get(0), Ok(&10));
        assert_eq!(list.get(3), Ok(&40));
        assert_eq!(
            list.get(4),
            Err(BlockListError::IndexOutOfRange { index: 4, len: 4 })
        );

        assert_eq!(list.set(3, 400), Ok(40));
        assert_eq!(list.get_cloned(3), Ok(400));
        *list.access(1).unwrap() += 1;
        assert_eq!(list[1], 21);
        list[0] = 100;
        assert_eq!(list[0], 100);
        assert!(list.set(9, 0).is_err());
    }

    #[test]
    fn test_append_default() {
        let mut list: BlockList<u64> = BlockList::new(2).unwrap();
        *list.append_default().unwrap() = 5;
        list.append_default().unwrap();
        assert_eq!(list.to_vec(), vec![5, 0]);
    }

    #[test]
    fn test_sequential_reads_advance_cache() {
        let list = list_of(4, 0..100);
        for i in 0..100 {
            assert_eq!(list[i], i as i32);
            let cached = list.locator.get().unwrap();
            assert_eq!(cached.skipped, (i / 4) * 4);
        }
        // Backwards read after a warm cache still resolves correctly.
        assert_eq!(list[3], 3);
        list.check_consistency().unwrap();
    }

    #[test]
    fn test_first_last() {
        let mut list: BlockList<i32> = BlockList::new(2).unwrap();
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);

        list.push(1).unwrap();
        assert_eq!(list.first(), Some(&1));
        assert_eq!(list.last(), Some(&1));

        list.push(2).unwrap();
        list.push(3).unwrap();
        assert_eq!(list.first(), Some(&1));
        assert_eq!(list.last(), Some(&3));
    }

    #[test]
    fn test_clear_and_reset() {
        let mut list = list_of(4, 0..10);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.node_count(), 0);
        list.check_consistency().unwrap();

        list.extend(0..10);
        list.reset();
        assert!(list.is_empty());
        assert_eq!(list.node_count(), 0);
        list.check_consistency().unwrap();

        list.extend(0..3);
        assert_eq!(list.to_vec(), vec![0, 1, 2]);
        list.check_consistency().unwrap();
    }

    #[test]
    fn test_clone_eq_hash() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let list = list_of(3, 0..10);
        let copy = list.clone();
        assert_eq!(list, copy);
        assert_eq!(copy.block_capacity(), 3);

        let hash = |list: &BlockList<i32>| {
            let mut hasher = DefaultHasher::new();
            list.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&list), hash(&copy));

        let other = list_of(5, 0..10);
        assert_eq!(list, other);
        assert!(list < list_of(3, [0, 1, 3]));
    }

    #[test]
    fn test_from_iter_uses_default_capacity() {
        let list: BlockList<i32> = (0..300).collect();
        assert_eq!(list.block_capacity(), DEFAULT_BLOCK_CAPACITY);
        assert_eq!(list.node_lens(), vec![256, 44]);
    }

    #[test]
    fn test_debug() {
        let list = list_of(2, [1, 2, 3]);
        assert_eq!(format!("{list:?}"), "[1, 2, 3]");
    }

    #[test]
    fn test_drop_elements() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let drop_count = Rc::new(RefCell::new(0));

        struct DropCounter {
            count: Rc<RefCell<i32>>,
        }

        impl Drop for DropCounter {
            fn drop(&mut self) {
                *self.count.borrow_mut() += 1;
            }
        }

        {
            let mut list: BlockList<DropCounter> = BlockList::new(3).unwrap();
            for _ in 0..10 {
                list.push(DropCounter {
                    count: drop_count.clone(),
                })
                .unwrap();
            }
            drop(list.remove(4).unwrap());
            assert_eq!(*drop_count.borrow(), 1);
        }

        assert_eq!(*drop_count.borrow(), 10);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_out_of_range_panics() {
        let list = list_of(2, [1]);
        let _ = list[1];
    }
}
