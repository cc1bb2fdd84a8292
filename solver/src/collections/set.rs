use crate::collections::ref_store::{IterableRefMap, Ref, RefMap};

/// A set of values that can be converted into small unsigned integers.
#[derive(Clone)]
pub struct RefSet<K> {
    set: RefMap<K, ()>,
}

impl<K: Ref> RefSet<K> {
    pub fn new() -> RefSet<K> {
        RefSet {
            set: Default::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn insert(&mut self, k: K) {
        self.set.insert(k, ());
    }

    pub fn remove(&mut self, k: K) {
        self.set.remove(k);
    }

    pub fn clear(&mut self) {
        self.set.clear()
    }

    pub fn contains(&self, k: K) -> bool {
        self.set.contains(k)
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_
    where
        K: From<usize>,
    {
        self.set.entries().map(|(k, _)| k)
    }
}

impl<K: Ref> Default for RefSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// A `RefSet` that additionally supports cheap iteration and clearing, at the cost of a
/// duplicated key list. Used for the fixed-point loop's "propagators pending re-examination"
/// set, which is cleared and iterated every pass.
#[derive(Clone, Default)]
pub struct IterableRefSet<K> {
    map: IterableRefMap<K, ()>,
}

impl<K: Ref> IterableRefSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, k: K) {
        self.map.insert(k, ());
    }

    pub fn remove(&mut self, k: K) {
        self.map.remove(k);
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, k: K) -> bool {
        self.map.contains(k)
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.map.keys()
    }
}
