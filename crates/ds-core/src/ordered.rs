//! Sorted-insertion container used for running order statistics.
//!
//! [`OrderedArray`] keeps its elements sorted by a caller-supplied "less than"
//! predicate. Insertion finds its slot by binary search and then shifts the
//! tail, so `add` is O(log n) comparisons plus an O(n) move. There is no
//! rebalancing; at one sample per second the shift is negligible.

use std::ops::Index;

/// Ordering predicate: returns `true` when `a` sorts strictly before `b`.
pub type LessFn<T> = fn(&T, &T) -> bool;

fn natural_less<T: PartialOrd>(a: &T, b: &T) -> bool {
    a < b
}

/// A `Vec` that stays sorted under `less`.
///
/// Elements that compare equal keep their insertion order.
pub struct OrderedArray<T, F = LessFn<T>> {
    items: Vec<T>,
    less: F,
}

impl<T: PartialOrd> OrderedArray<T> {
    /// An empty array ordered by `PartialOrd`.
    pub fn new() -> Self {
        Self::with_predicate(natural_less::<T>)
    }
}

impl<T: PartialOrd> Default for OrderedArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> OrderedArray<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    /// An empty array ordered by `less`.
    pub fn with_predicate(less: F) -> Self {
        Self {
            items: Vec::new(),
            less,
        }
    }

    /// Insert `value` at its sorted position and return that position.
    pub fn add(&mut self, value: T) -> usize {
        let idx = self.insertion_index(&value);
        self.items.insert(idx, value);
        idx
    }

    /// Upper bound: first index whose element sorts strictly after `value`.
    fn insertion_index(&self, value: &T) -> usize {
        self.items.partition_point(|probe| !(self.less)(value, probe))
    }

    pub fn remove_all(&mut self) {
        self.items.clear();
    }

    /// Remove and return the largest element, or `None` when empty.
    pub fn pop_last(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Remove and return the largest element.
    ///
    /// # Panics
    ///
    /// Panics when the array is empty.
    pub fn remove_last(&mut self) -> T {
        match self.items.pop() {
            Some(v) => v,
            None => panic!("remove_last on an empty OrderedArray"),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T, F> Index<usize> for OrderedArray<T, F> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T: std::fmt::Debug, F> std::fmt::Debug for OrderedArray<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a, T, F> IntoIterator for &'a OrderedArray<T, F> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_sorted<T, F: Fn(&T, &T) -> bool>(a: &OrderedArray<T, F>) -> bool {
        a.as_slice().windows(2).all(|w| !(a.less)(&w[1], &w[0]))
    }

    #[test]
    fn add_then_remove_from_end() {
        let mut a = OrderedArray::new();
        for v in [10, 5, 1, 11] {
            a.add(v);
        }
        assert_eq!(a.as_slice(), &[1, 5, 10, 11]);
        assert_eq!(a.remove_last(), 11);
        assert_eq!(a.pop_last(), Some(10));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn stays_sorted_for_any_length() {
        let mut a = OrderedArray::new();
        assert!(is_sorted(&a));
        // Deterministic scramble of 0..200.
        for i in 0..200u32 {
            a.add((i * 7919) % 211);
            assert!(is_sorted(&a));
        }
        assert_eq!(a.len(), 200);
    }

    #[test]
    fn equal_elements_keep_arrival_order() {
        let mut a = OrderedArray::with_predicate(|x: &(u32, char), y: &(u32, char)| x.0 < y.0);
        a.add((2, 'a'));
        a.add((1, 'b'));
        a.add((2, 'c'));
        a.add((2, 'd'));
        let tags: Vec<char> = a.iter().map(|p| p.1).collect();
        assert_eq!(tags, vec!['b', 'a', 'c', 'd']);
    }

    #[test]
    fn custom_predicate_descending() {
        let mut a = OrderedArray::with_predicate(|x: &i32, y: &i32| x > y);
        for v in [3, 9, -4, 0] {
            a.add(v);
        }
        assert_eq!(a.as_slice(), &[9, 3, 0, -4]);
        assert!(is_sorted(&a));
    }

    #[test]
    fn pop_last_on_empty_is_none() {
        let mut a: OrderedArray<f64> = OrderedArray::new();
        assert_eq!(a.pop_last(), None);
        a.add(1.0);
        a.remove_all();
        assert!(a.is_empty());
    }

    #[test]
    #[should_panic]
    fn remove_last_on_empty_panics() {
        let mut a: OrderedArray<u8> = OrderedArray::new();
        a.remove_last();
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let mut a = OrderedArray::new();
        a.add(1u8);
        let v = a[1];
        assert_eq!(v, 0);
    }
}
