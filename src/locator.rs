//! Logical index resolution and the locality cache.

use allocator_api2::alloc::Allocator;

use crate::error::{BlockListError, Result};
use crate::node::NodeId;
use crate::BlockList;

/// A resolved block together with the number of elements stored in all
/// blocks before it.
///
/// The list remembers the most recent `Locator` so that forward scans resume
/// where the previous lookup stopped instead of walking from the head. A
/// cached locator is only valid until the next operation that moves elements
/// between blocks; such operations either clear it or leave it pointing at a
/// block whose prefix count they did not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Locator {
    pub(crate) node: NodeId,
    /// Elements in all blocks strictly before `node`
    pub(crate) skipped: usize,
}

impl<T, A: Allocator + Clone> BlockList<T, A> {
    /// Resolves `index` to the block holding it and caches the result.
    ///
    /// Starts from the cached locator when `index` lies at or after it,
    /// otherwise from the head.
    pub(crate) fn locate(&self, index: usize) -> Result<Locator> {
        let out_of_range = BlockListError::IndexOutOfRange {
            index,
            len: self.len,
        };
        if index >= self.len {
            return Err(out_of_range);
        }

        let mut at = match (self.locator.get(), self.head) {
            (Some(cached), _) if index >= cached.skipped => cached,
            (_, Some(head)) => Locator {
                node: head,
                skipped: 0,
            },
            (_, None) => return Err(out_of_range),
        };

        loop {
            let node = &self.nodes[at.node];
            if index < at.skipped + node.len() {
                self.locator.set(Some(at));
                return Ok(at);
            }
            at.skipped += node.len();
            match node.next {
                Some(next) => at.node = next,
                None => return Err(out_of_range),
            }
        }
    }

    /// Finds the block linked directly before `target`, walking from the head.
    pub(crate) fn predecessor(&self, target: NodeId) -> Option<NodeId> {
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if id == target {
                return prev;
            }
            prev = Some(id);
            cursor = self.nodes[id].next;
        }
        None
    }

    #[inline]
    pub(crate) fn invalidate_locator(&self) {
        self.locator.set(None);
    }
}

#[cfg(test)]
mod tests {
    use crate::BlockList;

    #[test]
    fn test_locate_walks_blocks() {
        let list: BlockList<i32> = (0..10).fold(BlockList::new(4).unwrap(), |mut list, i| {
            list.push(i).unwrap();
            list
        });

        let first = list.locate(0).unwrap();
        assert_eq!(first.skipped, 0);

        let third = list.locate(9).unwrap();
        assert_eq!(third.skipped, 8);
        assert_eq!(list.locator.get(), Some(third));

        // Going backwards restarts from the head.
        let second = list.locate(5).unwrap();
        assert_eq!(second.skipped, 4);
        assert_eq!(list.predecessor(third.node), Some(second.node));
        assert_eq!(list.predecessor(first.node), None);
    }

    #[test]
    fn test_locate_out_of_range() {
        let mut list: BlockList<i32> = BlockList::new(2).unwrap();
        assert!(list.locate(0).is_err());
        list.push(1).unwrap();
        assert!(list.locate(1).is_err());
        assert!(list.locate(0).is_ok());
    }
}
