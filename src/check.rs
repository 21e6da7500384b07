//! Structural self-checks used by tests and debugging sessions.

use std::cmp::Ordering;

use allocator_api2::alloc::Allocator;
use thiserror::Error;

use crate::node::NodeId;
use crate::BlockList;

/// A broken structural invariant found by [`BlockList::check_consistency`] or
/// an ordering violation found by [`BlockList::check_sorted_by`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("exactly one of head and tail is set (head: {head}, tail: {tail})")]
    HeadTailMismatch { head: bool, tail: bool },

    #[error("tail does not point at the last linked block")]
    TailMismatch,

    #[error("block at chain position {0} is empty")]
    EmptyNode(usize),

    #[error("block at chain position {position} holds {len} elements, capacity is {capacity}")]
    OverfullNode {
        position: usize,
        len: usize,
        capacity: usize,
    },

    #[error("recorded length {recorded} does not match {actual} elements found in blocks")]
    CountMismatch { recorded: usize, actual: usize },

    #[error("block chain does not terminate")]
    Cycle,

    #[error("{linked} blocks are linked but {allocated} are allocated")]
    UnlinkedNodes { linked: usize, allocated: usize },

    #[error("cached locator does not match the block chain")]
    StaleLocator,

    #[error("{count} adjacent pairs are out of order")]
    OutOfOrder { count: usize },
}

impl<T, A: Allocator + Clone> BlockList<T, A> {
    /// Walks the whole block chain and verifies every structural invariant:
    /// head and tail agree, no linked block is empty or over capacity, the
    /// recorded length matches, every allocated block is linked, and the
    /// locality cache points at a linked block with the right prefix count.
    ///
    /// Runs in O(blocks) and does not modify the list.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        let result = self.walk_chain();
        if let Err(err) = &result {
            log::warn!("block list consistency check failed: {err}");
        }
        result
    }

    fn walk_chain(&self) -> Result<(), ConsistencyError> {
        let (head, tail) = match (self.head, self.tail) {
            (None, None) => {
                return if self.len != 0 {
                    Err(ConsistencyError::CountMismatch {
                        recorded: self.len,
                        actual: 0,
                    })
                } else if self.nodes.live() != 0 {
                    Err(ConsistencyError::UnlinkedNodes {
                        linked: 0,
                        allocated: self.nodes.live(),
                    })
                } else if self.locator.get().is_some() {
                    Err(ConsistencyError::StaleLocator)
                } else {
                    Ok(())
                };
            }
            (Some(head), Some(tail)) => (head, tail),
            (head, tail) => {
                return Err(ConsistencyError::HeadTailMismatch {
                    head: head.is_some(),
                    tail: tail.is_some(),
                })
            }
        };

        let cached = self.locator.get();
        let mut cache_seen = false;
        let mut last: Option<NodeId> = None;
        let mut linked = 0;
        let mut count = 0;
        let mut cursor = Some(head);

        while let Some(id) = cursor {
            if linked == self.nodes.live() {
                return Err(ConsistencyError::Cycle);
            }
            let node = &self.nodes[id];
            if node.len() == 0 {
                return Err(ConsistencyError::EmptyNode(linked));
            }
            if node.len() > self.block_capacity {
                return Err(ConsistencyError::OverfullNode {
                    position: linked,
                    len: node.len(),
                    capacity: self.block_capacity,
                });
            }
            if let Some(at) = cached.filter(|at| at.node == id) {
                if at.skipped != count {
                    return Err(ConsistencyError::StaleLocator);
                }
                cache_seen = true;
            }
            count += node.len();
            linked += 1;
            last = Some(id);
            cursor = node.next;
        }

        if last != Some(tail) {
            return Err(ConsistencyError::TailMismatch);
        }
        if count != self.len {
            return Err(ConsistencyError::CountMismatch {
                recorded: self.len,
                actual: count,
            });
        }
        if linked != self.nodes.live() {
            return Err(ConsistencyError::UnlinkedNodes {
                linked,
                allocated: self.nodes.live(),
            });
        }
        if cached.is_some() && !cache_seen {
            return Err(ConsistencyError::StaleLocator);
        }
        Ok(())
    }

    /// Verifies that every adjacent pair is in order under `compare`.
    ///
    /// With `unique`, equal neighbours count as violations too. The error
    /// reports how many pairs failed.
    pub fn check_sorted_by<F>(&self, mut compare: F, unique: bool) -> Result<(), ConsistencyError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut count = 0;
        let mut iter = self.iter();
        if let Some(mut prev) = iter.next() {
            for item in iter {
                match compare(prev, item) {
                    Ordering::Greater => count += 1,
                    Ordering::Equal if unique => count += 1,
                    _ => {}
                }
                prev = item;
            }
        }

        if count == 0 {
            Ok(())
        } else {
            log::warn!("block list ordering check found {count} violations");
            Err(ConsistencyError::OutOfOrder { count })
        }
    }

    /// [`check_sorted_by`](Self::check_sorted_by) using `T`'s ordering.
    pub fn check_sorted(&self, unique: bool) -> Result<(), ConsistencyError>
    where
        T: Ord,
    {
        self.check_sorted_by(T::cmp, unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;

    fn list_of(block_capacity: usize, values: impl IntoIterator<Item = i32>) -> BlockList<i32> {
        let mut list = BlockList::new(block_capacity).unwrap();
        list.extend(values);
        list
    }

    #[test]
    fn test_fresh_lists_are_consistent() {
        let empty: BlockList<i32> = BlockList::new(4).unwrap();
        assert_eq!(empty.check_consistency(), Ok(()));
        assert_eq!(list_of(4, 0..13).check_consistency(), Ok(()));
        assert_eq!(list_of(1, 0..5).check_consistency(), Ok(()));
    }

    #[test]
    fn test_detects_count_mismatch() {
        let mut list = list_of(4, 0..6);
        list.len = 7;
        assert_eq!(
            list.check_consistency(),
            Err(ConsistencyError::CountMismatch {
                recorded: 7,
                actual: 6
            })
        );
    }

    #[test]
    fn test_detects_empty_and_overfull_blocks() {
        let mut list = list_of(2, 0..4);
        let head = list.head.unwrap();
        list.nodes[head].items.push(9);
        assert!(matches!(
            list.check_consistency(),
            Err(ConsistencyError::OverfullNode { position: 0, .. })
        ));

        let mut list = list_of(2, 0..4);
        let tail = list.tail.unwrap();
        list.nodes[tail].items.clear();
        assert_eq!(list.check_consistency(), Err(ConsistencyError::EmptyNode(1)));
    }

    #[test]
    fn test_detects_bad_tail_and_cycles() {
        let mut list = list_of(2, 0..6);
        list.tail = list.head;
        assert_eq!(list.check_consistency(), Err(ConsistencyError::TailMismatch));

        let mut list = list_of(2, 0..6);
        let (head, tail) = (list.head.unwrap(), list.tail.unwrap());
        list.nodes[tail].next = Some(head);
        assert_eq!(list.check_consistency(), Err(ConsistencyError::Cycle));

        let mut list = list_of(2, 0..6);
        list.tail = None;
        assert_eq!(
            list.check_consistency(),
            Err(ConsistencyError::HeadTailMismatch {
                head: true,
                tail: false
            })
        );
    }

    #[test]
    fn test_detects_unlinked_blocks() {
        let mut list = list_of(2, 0..4);
        let head = list.head.unwrap();
        list.nodes[head].next = None;
        list.tail = Some(head);
        list.len = 2;
        assert_eq!(
            list.check_consistency(),
            Err(ConsistencyError::UnlinkedNodes {
                linked: 1,
                allocated: 2
            })
        );
    }

    #[test]
    fn test_detects_stale_locator() {
        let list = list_of(2, 0..6);
        let tail = list.tail.unwrap();
        list.locator.set(Some(Locator {
            node: tail,
            skipped: 2,
        }));
        assert_eq!(list.check_consistency(), Err(ConsistencyError::StaleLocator));

        list.locator.set(Some(Locator {
            node: tail,
            skipped: 4,
        }));
        assert_eq!(list.check_consistency(), Ok(()));
    }

    #[test]
    fn test_check_sorted() {
        let list = list_of(3, [1, 2, 2, 5, 9]);
        assert_eq!(list.check_sorted(false), Ok(()));
        assert_eq!(
            list.check_sorted(true),
            Err(ConsistencyError::OutOfOrder { count: 1 })
        );

        let list = list_of(3, [3, 1, 2, 0]);
        assert_eq!(
            list.check_sorted(false),
            Err(ConsistencyError::OutOfOrder { count: 2 })
        );
        assert_eq!(
            list.check_sorted_by(|a, b| b.cmp(a), false),
            Err(ConsistencyError::OutOfOrder { count: 1 })
        );
    }
}
