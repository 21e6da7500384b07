//! Binary search and sorted insertion.
//!
//! All searches probe the list through the same index resolution as `get`,
//! so every probe may move the locality cache. Comparators must not touch the
//! list being searched.

use std::cmp::Ordering;

use allocator_api2::alloc::Allocator;

use crate::error::Result;
use crate::BlockList;

/// Outcome of [`BlockList::insert_unique_sorted_by`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortedInsert {
    /// The value was inserted at this index.
    Inserted(usize),
    /// An equal element already exists at this index; nothing was inserted.
    Duplicate(usize),
}

impl SortedInsert {
    /// Returns the index of the inserted or already present element.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            SortedInsert::Inserted(index) | SortedInsert::Duplicate(index) => index,
        }
    }

    /// Returns `true` if nothing was inserted because an equal element
    /// already exists.
    #[inline]
    pub const fn is_duplicate(self) -> bool {
        matches!(self, SortedInsert::Duplicate(_))
    }
}

impl<T, A: Allocator + Clone> BlockList<T, A> {
    /// Returns the first index whose element compares greater than `value`,
    /// i.e. the slot right after the last element equal to it.
    fn upper_bound_by<F>(&self, value: &T, compare: &mut F) -> Result<usize>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut left = 0;
        let mut right = self.len;

        while left < right {
            let mid = left + (right - left) / 2;
            match compare(value, self.get(mid)?) {
                Ordering::Less => right = mid,
                Ordering::Equal | Ordering::Greater => left = mid + 1,
            }
        }
        Ok(left)
    }

    /// Inserts `value` so that a list sorted by `compare` stays sorted, and
    /// returns the index it was placed at.
    ///
    /// The comparator receives `value` first and a list element second. The
    /// new element goes after every element that compares equal to it.
    ///
    /// # Example
    ///
    /// ```
    /// use block_list::BlockList;
    /// let mut list: BlockList<(u8, char)> = BlockList::new(2).unwrap();
    /// for item in [(5, 'a'), (3, 'b'), (8, 'c'), (3, 'd'), (1, 'e')] {
    ///     list.insert_sorted_by(item, |a, b| a.0.cmp(&b.0)).unwrap();
    /// }
    /// assert_eq!(
    ///     list.to_vec(),
    ///     vec![(1, 'e'), (3, 'b'), (3, 'd'), (5, 'a'), (8, 'c')]
    /// );
    /// ```
    pub fn insert_sorted_by<F>(&mut self, value: T, mut compare: F) -> Result<usize>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let at = self.upper_bound_by(&value, &mut compare)?;
        self.insert(at, value)?;
        Ok(at)
    }

    /// Inserts `value` in sorted position unless an equal element exists.
    ///
    /// Returns [`SortedInsert::Duplicate`] with the existing element's index
    /// without modifying the list when `compare` finds a match.
    pub fn insert_unique_sorted_by<F>(&mut self, value: T, mut compare: F) -> Result<SortedInsert>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let at = self.upper_bound_by(&value, &mut compare)?;
        if let Some(candidate) = at.checked_sub(1) {
            if compare(&value, self.get(candidate)?) == Ordering::Equal {
                return Ok(SortedInsert::Duplicate(candidate));
            }
        }
        self.insert(at, value)?;
        Ok(SortedInsert::Inserted(at))
    }

    /// Finds the index of an element equal to `value` in a list sorted by
    /// `compare`. With several equal elements, the last one is reported.
    pub fn find_index_by<F>(&self, value: &T, mut compare: F) -> Option<usize>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let at = self.upper_bound_by(value, &mut compare).ok()?;
        let candidate = at.checked_sub(1)?;
        (compare(value, self.get(candidate).ok()?) == Ordering::Equal).then_some(candidate)
    }

    /// Finds an element equal to `value` in a list sorted by `compare`.
    pub fn find_by<F>(&self, value: &T, compare: F) -> Option<&T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let index = self.find_index_by(value, compare)?;
        self.get(index).ok()
    }

    /// [`insert_sorted_by`](Self::insert_sorted_by) using `T`'s ordering.
    pub fn insert_sorted(&mut self, value: T) -> Result<usize>
    where
        T: Ord,
    {
        self.insert_sorted_by(value, T::cmp)
    }

    /// [`insert_unique_sorted_by`](Self::insert_unique_sorted_by) using `T`'s ordering.
    pub fn insert_unique_sorted(&mut self, value: T) -> Result<SortedInsert>
    where
        T: Ord,
    {
        self.insert_unique_sorted_by(value, T::cmp)
    }

    /// [`find_index_by`](Self::find_index_by) using `T`'s ordering.
    pub fn find_index(&self, value: &T) -> Option<usize>
    where
        T: Ord,
    {
        self.find_index_by(value, T::cmp)
    }

    /// [`find_by`](Self::find_by) using `T`'s ordering.
    pub fn find(&self, value: &T) -> Option<&T>
    where
        T: Ord,
    {
        self.find_by(value, T::cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sorted_is_stable_right() {
        let mut list: BlockList<(i32, u8)> = BlockList::new(2).unwrap();
        let mut indices = Vec::new();
        for (tag, key) in [5, 3, 8, 3, 1].into_iter().enumerate() {
            indices.push(
                list.insert_sorted_by((key, tag as u8), |a, b| a.0.cmp(&b.0))
                    .unwrap(),
            );
        }
        assert_eq!(indices, vec![0, 0, 2, 1, 0]);
        assert_eq!(
            list.to_vec(),
            vec![(1, 4), (3, 1), (3, 3), (5, 0), (8, 2)]
        );
        list.check_consistency().unwrap();
        list.check_sorted_by(|a, b| a.0.cmp(&b.0), false).unwrap();
    }

    #[test]
    fn test_insert_unique_sorted() {
        let mut list: BlockList<i32> = BlockList::new(3).unwrap();
        assert_eq!(list.insert_unique_sorted(5), Ok(SortedInsert::Inserted(0)));
        assert_eq!(list.insert_unique_sorted(2), Ok(SortedInsert::Inserted(0)));
        assert_eq!(list.insert_unique_sorted(9), Ok(SortedInsert::Inserted(2)));
        assert_eq!(list.insert_unique_sorted(5), Ok(SortedInsert::Duplicate(1)));
        assert_eq!(list.len(), 3);
        assert_eq!(list.to_vec(), vec![2, 5, 9]);
        list.check_sorted(true).unwrap();

        let outcome = list.insert_unique_sorted(2).unwrap();
        assert!(outcome.is_duplicate());
        assert_eq!(outcome.index(), 0);
    }

    #[test]
    fn test_find() {
        let mut list: BlockList<i32> = BlockList::new(4).unwrap();
        for value in [10, 20, 20, 30, 40, 50, 60] {
            list.insert_sorted(value).unwrap();
        }
        assert_eq!(list.find_index(&10), Some(0));
        assert_eq!(list.find_index(&20), Some(2));
        assert_eq!(list.find_index(&60), Some(6));
        assert_eq!(list.find_index(&5), None);
        assert_eq!(list.find_index(&35), None);
        assert_eq!(list.find_index(&70), None);
        assert_eq!(list.find(&30), Some(&30));
        assert_eq!(list.find(&31), None);
    }

    #[test]
    fn test_find_by_key() {
        type Entry = (u32, &'static str);
        let mut list: BlockList<Entry> = BlockList::new(2).unwrap();
        let by_key = |a: &Entry, b: &Entry| a.0.cmp(&b.0);
        list.insert_sorted_by((7, "seven"), by_key).unwrap();
        list.insert_sorted_by((2, "two"), by_key).unwrap();
        list.insert_sorted_by((4, "four"), by_key).unwrap();

        assert_eq!(list.find_by(&(4, ""), by_key), Some(&(4, "four")));
        assert_eq!(list.find_by(&(5, ""), by_key), None);
    }

    #[test]
    fn test_search_empty_list() {
        let list: BlockList<i32> = BlockList::new(4).unwrap();
        assert_eq!(list.find_index(&1), None);
        assert_eq!(list.find(&1), None);
    }
}
