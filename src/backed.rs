use crate::any_value::AnyValue;
use crate::error::MapError;
use crate::key::{AsKey, ErasedKey};
use crate::traits::{MutableTypedMap, TypedMap};
use log::{debug, error, trace, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// The untyped store behind a [`BackedTypedMap`].
///
/// Keys hash and compare by identity only. Anyone filling one of these by
/// hand must keep every value's type equal to its key's value type.
pub type Backing = HashMap<ErasedKey, AnyValue>;

/// A [`MutableTypedMap`] realized over a single [`Backing`] store.
///
/// Each typed operation is one operation on the backing store. The value type
/// is restored from the key's type parameter on the way out.
///
/// # Examples
///
/// ```
/// use keyed_typemap::{BackedTypedMap, FactoryKey, Key, MutableTypedMap, TypedMap};
///
/// static COUNT: Key<i32> = Key::new("count");
/// static NAMES: FactoryKey<Vec<String>> = FactoryKey::new("names", Vec::new);
///
/// let mut map = BackedTypedMap::new();
/// assert_eq!(*map.get_or(&COUNT, &0), 0);
///
/// map.put(&COUNT, 5);
/// map.compute_if_absent(&NAMES).push("alice".to_string());
///
/// assert_eq!(map.get(&COUNT), Some(&5));
/// assert_eq!(map.get(&NAMES).map(Vec::len), Some(1));
/// assert_eq!(map.len(), 2);
/// ```
pub struct BackedTypedMap<M = ()> {
    map: Backing,
    _family: PhantomData<fn() -> M>,
}

impl<M> BackedTypedMap<M> {
    /// Creates a new, empty map
    pub fn new() -> Self {
        Self::from_backing(Backing::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_backing(Backing::with_capacity(capacity))
    }

    /// Adopts an existing backing store as-is.
    ///
    /// The store is trusted, not checked: every value must have the type its
    /// key was declared with. A violation surfaces as a panic when the entry
    /// is next read. `put` and `remove` still work on such an entry; they
    /// drop the mistyped value and report no previous value. Use [`try_from_backing`](Self::try_from_backing) to
    /// check up front.
    pub fn from_backing(map: Backing) -> Self {
        if !map.is_empty() {
            debug!("adopting backing store with {} entries unchecked", map.len());
        }
        Self {
            map,
            _family: PhantomData,
        }
    }

    /// Adopts an existing backing store after checking every entry's type.
    ///
    /// # Errors
    ///
    /// Returns `MapError::TypeMismatch` for the first entry whose value type
    /// differs from its key's declared value type.
    pub fn try_from_backing(map: Backing) -> Result<Self, MapError> {
        if let Some((key, value)) = map
            .iter()
            .find(|(key, value)| key.value_type() != value.value_type())
        {
            warn!(
                "rejecting backing store: key {} holds {} instead of {}",
                key,
                value.value_type_name(),
                key.value_type_name()
            );
            return Err(MapError::TypeMismatch {
                key: key.to_string(),
                expected: key.value_type_name(),
                found: value.value_type_name(),
            });
        }
        debug!("adopting backing store with {} checked entries", map.len());
        Ok(Self {
            map,
            _family: PhantomData,
        })
    }

    // Mutation has already happened when this runs, so a displaced value of
    // the wrong type is dropped rather than failing the caller.
    fn take_displaced<V: 'static>(key: &ErasedKey, old: AnyValue) -> Option<V> {
        if old.is_type::<V>() {
            Some(old.into_restored::<V>(key))
        } else {
            error!(
                "dropping displaced value of key {}: expected {}, found {}",
                key,
                key.value_type_name(),
                old.value_type_name()
            );
            None
        }
    }

    /// Borrows the backing store
    pub fn backing(&self) -> &Backing {
        &self.map
    }

    pub fn into_backing(self) -> Backing {
        self.map
    }
}

impl<M> TypedMap<M> for BackedTypedMap<M> {
    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn contains_key<K>(&self, key: &K) -> bool
    where
        K: AsKey<M> + ?Sized,
    {
        self.map.contains_key(&key.as_key().id())
    }

    fn contains_erased(&self, key: &ErasedKey) -> bool {
        self.map.contains_key(key)
    }

    fn get<K>(&self, key: &K) -> Option<&K::Value>
    where
        K: AsKey<M> + ?Sized,
    {
        let key = key.as_key().erased();
        self.map
            .get(&key.id())
            .map(|value| value.restore::<K::Value>(&key))
    }

    fn keys(&self) -> Vec<ErasedKey> {
        self.map.keys().copied().collect()
    }
}

impl<M> MutableTypedMap<M> for BackedTypedMap<M> {
    fn get_mut<K>(&mut self, key: &K) -> Option<&mut K::Value>
    where
        K: AsKey<M> + ?Sized,
    {
        let key = key.as_key().erased();
        self.map
            .get_mut(&key.id())
            .map(|value| value.restore_mut::<K::Value>(&key))
    }

    fn put<K>(&mut self, key: &K, value: K::Value) -> Option<K::Value>
    where
        K: AsKey<M> + ?Sized,
    {
        let key = key.as_key().erased();
        self.map
            .insert(key, AnyValue::new(value))
            .and_then(|old| Self::take_displaced::<K::Value>(&key, old))
    }

    fn remove<K>(&mut self, key: &K) -> Option<K::Value>
    where
        K: AsKey<M> + ?Sized,
    {
        let key = key.as_key().erased();
        self.map
            .remove(&key.id())
            .and_then(|old| Self::take_displaced::<K::Value>(&key, old))
    }

    fn remove_erased(&mut self, key: &ErasedKey) -> bool {
        self.map.remove(key).is_some()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn compute_if_absent_with<K, F>(&mut self, key: &K, f: F) -> &mut K::Value
    where
        K: AsKey<M> + ?Sized,
        F: FnOnce() -> K::Value,
    {
        let key = key.as_key().erased();
        let value = match self.map.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!("computing default for key {}", key);
                entry.insert(AnyValue::new(f()))
            }
        };
        value.restore_mut::<K::Value>(&key)
    }
}

impl<M> Default for BackedTypedMap<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for BackedTypedMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.map.keys().map(|key| format!("{}: {}", key, key.value_type_name())))
            .finish()
    }
}
