//! # MaxHeap
//!
//! An array-backed binary max-heap parameterized by an explicit ordering.
//!
//! The heap backs every ranked view in the Murmur feed engine: each user's
//! authored posts, the transient heap built for a feed or scroll request, and
//! the full ranking produced by `sort_posts`.
//!
//! ## Layout
//!
//! All index arithmetic is 1-based: the root is position 1, the parent of
//! position `p` is `p / 2`, its children are `2p` and `2p + 1`. Position `p`
//! is stored in slot `p - 1` of the backing vector, which takes the place of
//! the unused scratch slot at index 0 of the textbook layout.
//!
//! ## Example
//! ```rust
//! use heap::MaxHeap;
//!
//! let mut h = MaxHeap::from_vec(vec![4, 9, 1, 7]);
//! h.insert(8);
//! assert_eq!(h.delete_max(), Some(9));
//! assert_eq!(h.find_max(), Some(&8));
//! ```

use std::cmp::Ordering;
use std::fmt;

/// Number of elements a heap built with [`MaxHeap::new`] holds before growing.
pub const DEFAULT_CAPACITY: usize = 15;

/// A total order over heap elements. The heap surfaces the greatest element.
pub trait HeapOrder<E> {
    /// Compares `a` against `b`; `Greater` means `a` ranks above `b`.
    fn compare(&self, a: &E, b: &E) -> Ordering;
}

/// Orders elements by their [`Ord`] implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalOrder;

impl<E: Ord> HeapOrder<E> for NaturalOrder {
    fn compare(&self, a: &E, b: &E) -> Ordering {
        a.cmp(b)
    }
}

/// Adapts a comparison closure into a [`HeapOrder`].
///
/// ```rust
/// use heap::{MaxHeap, OrderFn};
///
/// // min-heap by flipping the comparison
/// let mut h: MaxHeap<u32, _> = MaxHeap::with_order(OrderFn(|a: &u32, b: &u32| b.cmp(a)));
/// h.insert(3);
/// h.insert(1);
/// assert_eq!(h.delete_max(), Some(1));
/// ```
#[derive(Clone, Copy)]
pub struct OrderFn<F>(pub F);

impl<E, F> HeapOrder<E> for OrderFn<F>
where
    F: Fn(&E, &E) -> Ordering,
{
    fn compare(&self, a: &E, b: &E) -> Ordering {
        (self.0)(a, b)
    }
}

/// A binary max-heap over elements of type `E` ordered by `O`.
#[derive(Clone)]
pub struct MaxHeap<E, O = NaturalOrder> {
    items: Vec<E>,
    order: O,
}

impl<E: Ord> MaxHeap<E> {
    /// Creates an empty heap with room for 15 elements.
    pub fn new() -> Self {
        Self::with_capacity_and_order(DEFAULT_CAPACITY, NaturalOrder)
    }

    /// Builds a heap from `items` in O(n).
    pub fn from_vec(items: Vec<E>) -> Self {
        Self::from_vec_with_order(items, NaturalOrder)
    }
}

impl<E, O: HeapOrder<E>> MaxHeap<E, O> {
    /// Creates an empty heap ranked by `order`.
    pub fn with_order(order: O) -> Self {
        Self::with_capacity_and_order(DEFAULT_CAPACITY, order)
    }

    /// Creates an empty heap ranked by `order` with room for `capacity` elements.
    pub fn with_capacity_and_order(capacity: usize, order: O) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            order,
        }
    }

    /// Builds a heap from `items` ranked by `order`.
    ///
    /// The items are placed in storage as given, then every internal node is
    /// percolated down from the last one to the root.
    pub fn from_vec_with_order(mut items: Vec<E>, order: O) -> Self {
        let len = items.len();
        items.reserve_exact(((len + 2) * 11 / 10).saturating_sub(len));
        let mut heap = Self { items, order };
        for pos in (1..=heap.items.len() / 2).rev() {
            heap.percolate_down(pos);
        }
        heap
    }

    /// Adds `item`, growing the storage to at least `2 * capacity + 1` when full.
    pub fn insert(&mut self, item: E) {
        if self.items.len() == self.items.capacity() {
            let grow_by = self.items.capacity() + 1;
            self.items.reserve_exact(grow_by);
        }
        self.items.push(item);
        self.percolate_up(self.items.len());
    }

    /// Returns the greatest element without removing it.
    pub fn find_max(&self) -> Option<&E> {
        self.items.first()
    }

    /// Removes and returns the greatest element, or `None` if the heap is empty.
    pub fn delete_max(&mut self) -> Option<E> {
        if self.items.is_empty() {
            return None;
        }
        let max = self.items.swap_remove(0);
        if !self.items.is_empty() {
            self.percolate_down(1);
        }
        Some(max)
    }

    /// Consumes the heap, yielding elements from greatest to least.
    pub fn into_sorted_iter(self) -> IntoSorted<E, O> {
        IntoSorted { heap: self }
    }

    /// Returns `true` if every node is at least as great as its children.
    pub fn is_heap(&self) -> bool {
        (2..=self.items.len()).all(|pos| self.cmp_pos(pos, pos / 2) != Ordering::Greater)
    }

    fn cmp_pos(&self, a: usize, b: usize) -> Ordering {
        self.order.compare(&self.items[a - 1], &self.items[b - 1])
    }

    /// Moves the element at `pos` towards the root while it is strictly
    /// greater than its parent.
    fn percolate_up(&mut self, mut pos: usize) {
        while pos > 1 && self.cmp_pos(pos, pos / 2) == Ordering::Greater {
            self.items.swap(pos - 1, pos / 2 - 1);
            pos /= 2;
        }
    }

    /// Sinks the element at `pos` below any child strictly greater than it.
    /// The right child is chosen only when strictly greater than the left.
    fn percolate_down(&mut self, mut pos: usize) {
        let len = self.items.len();
        while pos * 2 <= len {
            let mut child = pos * 2;
            if child != len && self.cmp_pos(child + 1, child) == Ordering::Greater {
                child += 1;
            }
            if self.cmp_pos(child, pos) != Ordering::Greater {
                break;
            }
            self.items.swap(pos - 1, child - 1);
            pos = child;
        }
    }
}

impl<E, O> MaxHeap<E, O> {
    /// Returns the number of elements in the heap.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the heap holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements the heap holds before it has to grow.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Iterates over the elements in storage order (not sorted).
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.items.iter()
    }

    /// Returns the elements in storage order.
    pub fn into_vec(self) -> Vec<E> {
        self.items
    }
}

impl<E: Ord> Default for MaxHeap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug, O> fmt::Debug for MaxHeap<E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<E: Ord> FromIterator<E> for MaxHeap<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<E, O: HeapOrder<E>> Extend<E> for MaxHeap<E, O> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<'a, E, O> IntoIterator for &'a MaxHeap<E, O> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Draining iterator returned by [`MaxHeap::into_sorted_iter`].
pub struct IntoSorted<E, O> {
    heap: MaxHeap<E, O>,
}

impl<E, O: HeapOrder<E>> Iterator for IntoSorted<E, O> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.heap.delete_max()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

impl<E, O: HeapOrder<E>> ExactSizeIterator for IntoSorted<E, O> {}
