use crate::backed::BackedTypedMap;
use crate::error::MapError;
use crate::key::{AsKey, ComputingKey, ErasedKey};
use crate::traits::{MutableTypedMap, TypedMap};
use log::error;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// A thread-safe handle to a [`BackedTypedMap`].
///
/// Cloning the handle shares the same map. Every operation takes the lock for
/// its whole duration, which is what makes
/// [`compute_if_absent`](Self::compute_if_absent) run a key's factory at most
/// once per insertion even with concurrent callers. Values are reached through
/// closures, or cloned out for `V: Clone`.
///
/// # Examples
///
/// ```
/// use keyed_typemap::{FactoryKey, Key, MapError, SharedTypedMap};
/// use std::thread;
///
/// static HITS: FactoryKey<u64> = FactoryKey::new("hits", || 0);
///
/// let map = SharedTypedMap::new();
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let map = map.clone();
///         thread::spawn(move || map.compute_if_absent_with(&HITS, |hits| *hits += 1))
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap()?;
/// }
///
/// assert_eq!(map.get(&HITS)?, Some(4));
/// # Ok::<(), MapError>(())
/// ```
pub struct SharedTypedMap<M = ()> {
    inner: Arc<Mutex<BackedTypedMap<M>>>,
}

impl<M> SharedTypedMap<M> {
    /// Creates a new, empty shared map
    pub fn new() -> Self {
        Self::from_map(BackedTypedMap::new())
    }

    /// Wraps an existing map
    pub fn from_map(map: BackedTypedMap<M>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(map)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BackedTypedMap<M>>, MapError> {
        self.inner.lock().map_err(|_| {
            error!("typed map lock poisoned");
            MapError::LockError
        })
    }

    /// Returns the number of entries in the map
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn len(&self) -> Result<usize, MapError> {
        Ok(self.lock()?.len())
    }

    /// Returns true if the map contains no entries
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn is_empty(&self) -> Result<bool, MapError> {
        Ok(self.lock()?.is_empty())
    }

    /// Returns true if the map contains an entry for `key`
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn contains_key<K>(&self, key: &K) -> Result<bool, MapError>
    where
        K: AsKey<M> + ?Sized,
    {
        Ok(self.lock()?.contains_key(key))
    }

    /// Returns a snapshot of the keys currently present
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn keys(&self) -> Result<Vec<ErasedKey>, MapError> {
        Ok(self.lock()?.keys())
    }

    /// Retrieves a clone of the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn get<K>(&self, key: &K) -> Result<Option<K::Value>, MapError>
    where
        K: AsKey<M> + ?Sized,
        K::Value: Clone,
    {
        Ok(self.lock()?.get(key).cloned())
    }

    /// Runs `f` against the value stored under `key` without cloning it.
    ///
    /// Returns `Ok(None)` without calling `f` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn with<K, F, R>(&self, key: &K, f: F) -> Result<Option<R>, MapError>
    where
        K: AsKey<M> + ?Sized,
        F: FnOnce(&K::Value) -> R,
    {
        Ok(self.lock()?.get(key).map(f))
    }

    /// Runs `f` with write access to the value stored under `key`.
    ///
    /// Returns `Ok(None)` without calling `f` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn with_mut<K, F, R>(&self, key: &K, f: F) -> Result<Option<R>, MapError>
    where
        K: AsKey<M> + ?Sized,
        F: FnOnce(&mut K::Value) -> R,
    {
        Ok(self.lock()?.get_mut(key).map(f))
    }

    /// Stores a value, returning the one it replaced
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn put<K>(&self, key: &K, value: K::Value) -> Result<Option<K::Value>, MapError>
    where
        K: AsKey<M> + ?Sized,
    {
        Ok(self.lock()?.put(key, value))
    }

    /// Removes the entry for `key`, returning its value
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn remove<K>(&self, key: &K) -> Result<Option<K::Value>, MapError>
    where
        K: AsKey<M> + ?Sized,
    {
        Ok(self.lock()?.remove(key))
    }

    /// Removes all entries
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn clear(&self) -> Result<(), MapError> {
        self.lock()?.clear();
        Ok(())
    }

    /// Runs `f` against the value under `key`, storing the key's default first
    /// if the slot is empty.
    ///
    /// The lock is held from the presence check through `f`, so concurrent
    /// callers never run the factory twice for one insertion.
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn compute_if_absent_with<K, F, R>(&self, key: &K, f: F) -> Result<R, MapError>
    where
        K: ComputingKey<M> + ?Sized,
        F: FnOnce(&mut K::Value) -> R,
    {
        let mut map = self.lock()?;
        Ok(f(map.compute_if_absent(key)))
    }

    /// Returns a clone of the value under `key`, storing the key's default
    /// first if the slot is empty
    ///
    /// # Errors
    ///
    /// Returns `MapError::LockError` if the internal lock cannot be acquired.
    pub fn compute_if_absent<K>(&self, key: &K) -> Result<K::Value, MapError>
    where
        K: ComputingKey<M> + ?Sized,
        K::Value: Clone,
    {
        self.compute_if_absent_with(key, |value| value.clone())
    }

    /// Unwraps the map if this is the last handle to it
    ///
    /// # Errors
    ///
    /// - Returns `MapError::StillShared` if other handles exist
    /// - Returns `MapError::LockError` if the lock was poisoned
    pub fn into_inner(self) -> Result<BackedTypedMap<M>, MapError> {
        let mutex = Arc::try_unwrap(self.inner).map_err(|_| MapError::StillShared)?;
        mutex.into_inner().map_err(|_| {
            error!("typed map lock poisoned");
            MapError::LockError
        })
    }
}

impl<M> Clone for SharedTypedMap<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> Default for SharedTypedMap<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for SharedTypedMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Ok(map) => f.debug_tuple("SharedTypedMap").field(&*map).finish(),
            Err(TryLockError::Poisoned(_)) => f.write_str("SharedTypedMap(<poisoned>)"),
            Err(TryLockError::WouldBlock) => f.write_str("SharedTypedMap(<locked>)"),
        }
    }
}
