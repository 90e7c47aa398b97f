use crate::key::{AsKey, ComputingKey, ErasedKey};

/// Read access to a heterogeneous map of key family `M`.
///
/// Every lookup is typed by the key: `get(&key)` for a `Key<V, M>` yields an
/// `Option<&V>`, with no cast at the call site. Absence is `None`, never an
/// error.
///
/// Keys of another family are rejected at compile time:
///
/// ```compile_fail
/// use keyed_typemap::{BackedTypedMap, Key, TypedMap};
///
/// struct Settings;
/// static THEME: Key<String, Settings> = Key::new("theme");
///
/// let map: BackedTypedMap = BackedTypedMap::new();
/// map.get(&THEME);
/// ```
pub trait TypedMap<M = ()> {
    /// Returns the number of entries in the map
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if an entry exists for this exact key
    fn contains_key<K>(&self, key: &K) -> bool
    where
        K: AsKey<M> + ?Sized;

    /// Returns true if an entry exists for the key `key` was erased from
    fn contains_erased(&self, key: &ErasedKey) -> bool;

    /// Returns the value stored under `key`, if any
    fn get<K>(&self, key: &K) -> Option<&K::Value>
    where
        K: AsKey<M> + ?Sized;

    /// Returns the value stored under `key`, or `default` when absent.
    ///
    /// Never calls a computing key's factory.
    fn get_or<'a, K>(&'a self, key: &K, default: &'a K::Value) -> &'a K::Value
    where
        K: AsKey<M> + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Returns a snapshot of the keys currently present.
    ///
    /// The result is detached from the map; later mutation of either side is
    /// not reflected in the other.
    fn keys(&self) -> Vec<ErasedKey>;
}

/// A [`TypedMap`] that also allows insertion, removal and clearing.
pub trait MutableTypedMap<M = ()>: TypedMap<M> {
    /// Returns a mutable reference to the value stored under `key`, if any
    fn get_mut<K>(&mut self, key: &K) -> Option<&mut K::Value>
    where
        K: AsKey<M> + ?Sized;

    /// Stores `value` under `key`, returning the value it replaced
    fn put<K>(&mut self, key: &K, value: K::Value) -> Option<K::Value>
    where
        K: AsKey<M> + ?Sized;

    /// Removes the entry for `key`, returning its value. Absent keys are a no-op.
    fn remove<K>(&mut self, key: &K) -> Option<K::Value>
    where
        K: AsKey<M> + ?Sized;

    /// Removes the entry for an erased key, returning whether it was present
    fn remove_erased(&mut self, key: &ErasedKey) -> bool;

    fn clear(&mut self);

    /// Returns the value under `key`, storing `f()` first if the slot is empty
    fn compute_if_absent_with<K, F>(&mut self, key: &K, f: F) -> &mut K::Value
    where
        K: AsKey<M> + ?Sized,
        F: FnOnce() -> K::Value;

    /// Returns the value under `key`, storing the key's own default first if
    /// the slot is empty.
    ///
    /// `key.produce_default()` runs at most once per call and never when an
    /// entry already exists. The returned reference points at the stored
    /// value, so repeated calls hand out the same instance.
    fn compute_if_absent<K>(&mut self, key: &K) -> &mut K::Value
    where
        K: ComputingKey<M> + ?Sized,
    {
        self.compute_if_absent_with(key, || key.produce_default())
    }
}
