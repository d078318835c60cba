use core::fmt::Debug;

use crate::hash::PtrHashState;
use crate::hash::hashbrown::HashMap;
use crate::hash::hashbrown::hash_map::Entry;

// -----------------------------------------------------------------------------
// PtrMap

/// A map keyed by the address of a heap allocation.
///
/// Used to answer "have I seen this exact object before" while walking a
/// graph, regardless of what the object contains. Keys are plain addresses,
/// so the caller must keep the referenced allocations alive for as long as
/// the map is in use, otherwise a freed address may be reused by a new
/// allocation and be reported as known.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gs_utils::PtrMap;
///
/// let a = Arc::new(1);
/// let b = Arc::new(1);
///
/// let mut map = PtrMap::new();
/// assert!(map.try_insert(Arc::as_ptr(&a), || 0));
/// assert!(!map.try_insert(Arc::as_ptr(&a), || 1));
///
/// assert_eq!(map.get(Arc::as_ptr(&a)), Some(&0));
/// assert_eq!(map.get(Arc::as_ptr(&b)), None);
/// ```
pub struct PtrMap<V>(HashMap<usize, V, PtrHashState>);

impl<V> PtrMap<V> {
    /// Creates an empty `PtrMap`.
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(PtrHashState))
    }

    /// Creates an empty `PtrMap` with the specified capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity_and_hasher(capacity, PtrHashState))
    }

    #[inline(always)]
    fn key<T: ?Sized>(ptr: *const T) -> usize {
        ptr.cast::<u8>() as usize
    }

    /// Attempts to insert a key-value pair into the map.
    ///
    /// - Returns `true` if the address was not present and the pair was inserted.
    /// - Returns `false` if the address already exists, leaving the map unchanged.
    ///
    /// The closure `f` is only called if the address is not present.
    #[inline]
    pub fn try_insert<T: ?Sized>(&mut self, ptr: *const T, f: impl FnOnce() -> V) -> bool {
        match self.0.entry(Self::key(ptr)) {
            Entry::Vacant(entry) => {
                entry.insert(f());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Inserts a key-value pair into the map, returning the previous value.
    #[inline]
    pub fn insert<T: ?Sized>(&mut self, ptr: *const T, v: V) -> Option<V> {
        self.0.insert(Self::key(ptr), v)
    }

    /// Returns a reference to the value stored for the address.
    #[inline]
    pub fn get<T: ?Sized>(&self, ptr: *const T) -> Option<&V> {
        self.0.get(&Self::key(ptr))
    }

    /// Returns `true` if the map contains the address.
    #[inline]
    pub fn contains<T: ?Sized>(&self, ptr: *const T) -> bool {
        self.0.contains_key(&Self::key(ptr))
    }

    /// Removes an address, returning its value if it was present.
    #[inline]
    pub fn remove<T: ?Sized>(&mut self, ptr: *const T) -> Option<V> {
        self.0.remove(&Self::key(ptr))
    }

    /// Clears the map, keeping the allocated memory for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for PtrMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Debug> Debug for PtrMap<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| (*k as *const u8, v)))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::PtrMap;
    use std::sync::Arc;

    #[test]
    fn distinct_allocations_with_equal_values() {
        let a = Arc::new(String::from("x"));
        let b = Arc::new(String::from("x"));
        let a2 = a.clone();

        let mut map = PtrMap::new();
        map.insert(Arc::as_ptr(&a), 0usize);
        map.insert(Arc::as_ptr(&b), 1usize);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(Arc::as_ptr(&a2)), Some(&0));
        assert_eq!(map.get(Arc::as_ptr(&b)), Some(&1));
    }

    #[test]
    fn remove_and_clear() {
        let a = Arc::new(7u8);
        let mut map = PtrMap::with_capacity(4);

        assert!(map.is_empty());
        assert!(map.try_insert(Arc::as_ptr(&a), || 'a'));
        assert!(map.contains(Arc::as_ptr(&a)));
        assert_eq!(map.remove(Arc::as_ptr(&a)), Some('a'));
        assert!(!map.contains(Arc::as_ptr(&a)));

        map.insert(Arc::as_ptr(&a), 'b');
        map.clear();
        assert!(map.is_empty());
    }
}
