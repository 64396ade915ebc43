//! Stable two-way merge of descending sequences
//!
//! Conversation history is read as two result sets, one per direction of
//! authorship, each already ordered newest first. Merging them yields one
//! thread without a second, more complex query.

use std::iter::Peekable;

/// Iterator that merges two descending iterators into one descending stream
///
/// On equal keys the element from the left iterator is emitted first, so the
/// merge is stable with a left bias.
pub struct MergeDescending<L, R, F>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
{
    left: Peekable<L>,
    right: Peekable<R>,
    key: F,
}

impl<L, R, F, K> MergeDescending<L, R, F>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
    F: FnMut(&L::Item) -> K,
    K: Ord,
{
    /// Create a merging iterator over two descending inputs
    pub fn new(
        left: impl IntoIterator<IntoIter = L>,
        right: impl IntoIterator<IntoIter = R>,
        key: F,
    ) -> Self {
        Self {
            left: left.into_iter().peekable(),
            right: right.into_iter().peekable(),
            key,
        }
    }
}

impl<L, R, F, K> Iterator for MergeDescending<L, R, F>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
    F: FnMut(&L::Item) -> K,
    K: Ord,
{
    type Item = L::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let take_right = match (self.left.peek(), self.right.peek()) {
            (Some(l), Some(r)) => (self.key)(r) > (self.key)(l),
            (Some(_), None) => false,
            (None, _) => true,
        };

        if take_right {
            self.right.next()
        } else {
            self.left.next()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (l_low, l_high) = self.left.size_hint();
        let (r_low, r_high) = self.right.size_hint();
        let high = match (l_high, r_high) {
            (Some(l), Some(r)) => l.checked_add(r),
            _ => None,
        };
        (l_low.saturating_add(r_low), high)
    }
}

/// Merge two sequences sorted descending by `key` into one descending sequence
///
/// Every element of both inputs appears exactly once. Elements with equal keys
/// keep their relative order, and left elements precede right ones.
///
/// # Example
/// ```
/// use market::merge::merge_descending;
///
/// let merged = merge_descending(vec![9, 5, 1], vec![7, 3], |n| *n);
/// assert_eq!(merged, vec![9, 7, 5, 3, 1]);
/// ```
pub fn merge_descending<T, K, F>(
    left: impl IntoIterator<Item = T>,
    right: impl IntoIterator<Item = T>,
    key: F,
) -> Vec<T>
where
    F: FnMut(&T) -> K,
    K: Ord,
{
    MergeDescending::new(left, right, key).collect()
}
