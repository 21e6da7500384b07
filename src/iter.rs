//! Borrowing iterators for `BlockList`.

use std::slice;

use allocator_api2::alloc::{Allocator, Global};

use crate::node::NodeId;
use crate::BlockList;

/// An iterator over references to elements of a `BlockList`.
///
/// Walks the block chain directly and never touches the locality cache.
pub struct Iter<'a, T, A: Allocator + Clone = Global> {
    list: &'a BlockList<T, A>,
    /// Block to load once `current` runs dry
    next_node: Option<NodeId>,
    /// Remaining elements of the current block
    current: slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T, A: Allocator + Clone> Iter<'a, T, A> {
    pub(crate) fn new(list: &'a BlockList<T, A>) -> Self {
        Self {
            list,
            next_node: list.head,
            current: [].iter(),
            remaining: list.len,
        }
    }

    #[cold]
    fn next_block(&mut self) -> Option<&'a T> {
        let list: &'a BlockList<T, A> = self.list;
        let id = self.next_node?;
        let node = &list.nodes[id];
        self.next_node = node.next;
        self.current = node.items.iter();
        let item = self.current.next()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<'a, T, A: Allocator + Clone> Iterator for Iter<'a, T, A> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self.current.next() {
            Some(item) => {
                self.remaining -= 1;
                Some(item)
            }
            None => self.next_block(),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, A: Allocator + Clone> ExactSizeIterator for Iter<'_, T, A> {}

impl<T, A: Allocator + Clone> std::iter::FusedIterator for Iter<'_, T, A> {}

impl<T, A: Allocator + Clone> Clone for Iter<'_, T, A> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            next_node: self.next_node,
            current: self.current.clone(),
            remaining: self.remaining,
        }
    }
}

/// An iterator over mutable references to elements of a `BlockList`.
pub struct IterMut<'a, T> {
    /// Not yet visited blocks, in chain order
    blocks: std::vec::IntoIter<&'a mut [T]>,
    /// Remaining elements of the current block
    current: slice::IterMut<'a, T>,
    remaining: usize,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new<A: Allocator + Clone>(list: &'a mut BlockList<T, A>) -> Self {
        let remaining = list.len;
        // Arena slots are not in chain order; rank them first.
        let mut rank = vec![0usize; list.nodes.slot_count()];
        let mut cursor = list.head;
        let mut position = 0;
        while let Some(id) = cursor {
            rank[id.index()] = position;
            position += 1;
            cursor = list.nodes[id].next;
        }

        let mut blocks: Vec<(usize, &'a mut [T])> = list
            .nodes
            .iter_mut()
            .map(|(id, node)| (rank[id.index()], node.items.as_mut_slice()))
            .collect();
        blocks.sort_unstable_by_key(|(rank, _)| *rank);

        Self {
            blocks: blocks
                .into_iter()
                .map(|(_, block)| block)
                .collect::<Vec<_>>()
                .into_iter(),
            current: [].iter_mut(),
            remaining,
        }
    }

    #[cold]
    fn next_block(&mut self) -> Option<&'a mut T> {
        loop {
            let block = self.blocks.next()?;
            self.current = block.iter_mut();
            if let Some(item) = self.current.next() {
                self.remaining -= 1;
                return Some(item);
            }
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self.current.next() {
            Some(item) => {
                self.remaining -= 1;
                Some(item)
            }
            None => self.next_block(),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> std::iter::FusedIterator for IterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use crate::BlockList;

    #[test]
    fn test_iter_follows_chain_order() {
        let mut list: BlockList<i32> = BlockList::new(2).unwrap();
        list.extend(0..6);
        // Free the head block and let a spill reuse its slot mid-chain.
        list.remove(0).unwrap();
        list.remove(0).unwrap();
        list.insert(2, 10).unwrap();
        let expected = vec![2, 3, 10, 4, 5];

        let iter = list.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.copied().collect::<Vec<_>>(), expected);
        assert_eq!(list.iter_mut().map(|item| *item).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_iter_mut_modifies_in_place() {
        let mut list: BlockList<i32> = BlockList::new(3).unwrap();
        list.extend(0..10);
        for item in &mut list {
            *item *= 2;
        }
        assert_eq!(list.to_vec(), (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_iter_size_hint() {
        let mut list: BlockList<i32> = BlockList::new(4).unwrap();
        assert_eq!(list.iter().next(), None);
        list.extend(0..9);

        let mut iter = list.iter();
        assert_eq!(iter.size_hint(), (9, Some(9)));
        iter.nth(4);
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(iter.clone().count(), 4);

        let mut iter_mut = list.iter_mut();
        iter_mut.next();
        assert_eq!(iter_mut.len(), 8);
    }
}
