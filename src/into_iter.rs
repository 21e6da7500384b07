//! Owning iterator for `BlockList`.

use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::vec::IntoIter as BlockIntoIter;

use crate::node::{NodeArena, NodeId};
use crate::BlockList;

/// An owning iterator over elements of a `BlockList`.
///
/// This struct is created by the `into_iter` method on `BlockList`
/// (provided by the [`IntoIterator`] trait). Blocks are detached one at a
/// time; elements not yet yielded are dropped with the iterator.
pub struct IntoIter<T, A: Allocator + Clone = Global> {
    nodes: NodeArena<T, A>,
    /// Block to detach once `current` runs dry
    next_node: Option<NodeId>,
    current: Option<BlockIntoIter<T, A>>,
    remaining: usize,
}

impl<T, A: Allocator + Clone> IntoIter<T, A> {
    pub(crate) fn new(list: BlockList<T, A>) -> Self {
        Self {
            next_node: list.head,
            remaining: list.len,
            nodes: list.nodes,
            current: None,
        }
    }
}

impl<T, A: Allocator + Clone> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.as_mut().and_then(Iterator::next) {
                self.remaining -= 1;
                return Some(item);
            }
            let id = self.next_node?;
            let node = self.nodes.take(id);
            self.next_node = node.next;
            self.current = Some(node.items.into_iter());
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }

    #[inline]
    fn count(self) -> usize {
        self.remaining
    }
}

impl<T, A: Allocator + Clone> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator + Clone> std::iter::FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator + Clone> std::fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &self.remaining)
            .finish()
    }
}
