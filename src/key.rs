use std::any::{Any, TypeId};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Key`].
///
/// Ids are handed out from a global counter the first time a key is used and
/// never reused, so two keys share an id only if they are the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u64);

impl KeyId {
    fn next() -> Self {
        KeyId(NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed slot in a [`TypedMap`](crate::TypedMap).
///
/// A `Key<V, M>` may only ever be associated with a value of type `V`, and
/// only in maps of key family `M`. Keys are compared by identity: two keys
/// built with the same name are still two different slots.
///
/// Keys are meant to be declared as `static` items.
///
/// ```
/// use keyed_typemap::{BackedTypedMap, Key, MutableTypedMap, TypedMap};
///
/// static RETRIES: Key<u32> = Key::new("retries");
///
/// let mut map = BackedTypedMap::new();
/// map.put(&RETRIES, 3);
/// assert_eq!(map.get(&RETRIES), Some(&3));
/// ```
///
/// # Pitfalls
///
/// A `const` key compiles, but every mention of it builds a new key and so
/// names a new slot. Values written through one use site are invisible to the
/// next. Clippy's `declare_interior_mutable_const` lint flags such items.
///
/// ```
/// use keyed_typemap::{BackedTypedMap, Key, MutableTypedMap, TypedMap};
///
/// #[allow(clippy::declare_interior_mutable_const)]
/// const RETRIES: Key<u32> = Key::new("retries");
///
/// let mut map = BackedTypedMap::new();
/// map.put(&RETRIES, 3);
/// assert_eq!(map.get(&RETRIES), None);
/// assert_eq!(map.len(), 1);
/// ```
pub struct Key<V, M = ()> {
    name: &'static str,
    id: OnceLock<KeyId>,
    _marker: PhantomData<fn() -> (V, M)>,
}

impl<V, M> Key<V, M> {
    /// Creates a new key. The name is only used for diagnostics.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            id: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the identity of this key, assigning one on first use
    pub fn id(&self) -> KeyId {
        *self.id.get_or_init(KeyId::next)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<V: Any, M> Key<V, M> {
    /// Describes this key with its value type erased
    pub fn erased(&self) -> ErasedKey {
        ErasedKey {
            id: self.id(),
            name: self.name,
            value_type: TypeId::of::<V>(),
            value_type_name: std::any::type_name::<V>(),
        }
    }
}

impl<V, M> fmt::Debug for Key<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("id", &self.id.get())
            .field("value_type", &std::any::type_name::<V>())
            .finish()
    }
}

/// A [`Key`] with its value type erased.
///
/// This is what a map stores and what [`TypedMap::keys`](crate::TypedMap::keys)
/// hands back. Equality and hashing only look at the [`KeyId`].
#[derive(Clone, Copy, Debug)]
pub struct ErasedKey {
    id: KeyId,
    name: &'static str,
    value_type: TypeId,
    value_type_name: &'static str,
}

impl ErasedKey {
    pub fn id(&self) -> KeyId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The `TypeId` of the value type the key was declared with
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Returns true if this is the erased form of `key`
    pub fn is<K: AsKey<M> + ?Sized, M>(&self, key: &K) -> bool {
        self.id == key.as_key().id()
    }
}

impl PartialEq for ErasedKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ErasedKey {}

// Must agree with `Hash for KeyId` so the backing map can be probed by id.
impl Hash for ErasedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Borrow<KeyId> for ErasedKey {
    fn borrow(&self) -> &KeyId {
        &self.id
    }
}

impl fmt::Display for ErasedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Anything that designates one typed slot of a map in key family `M`.
pub trait AsKey<M = ()> {
    /// The type of value stored under this key
    type Value: Any + Send + Sync;

    fn as_key(&self) -> &Key<Self::Value, M>;
}

impl<V, M> AsKey<M> for Key<V, M>
where
    V: Any + Send + Sync,
{
    type Value = V;

    fn as_key(&self) -> &Key<V, M> {
        self
    }
}

/// A key that knows how to build its own default value.
///
/// [`MutableTypedMap::compute_if_absent`](crate::MutableTypedMap::compute_if_absent)
/// calls `produce_default` at most once per call, and only when the slot is
/// empty. Keeping the default with the key means every call site agrees on it.
pub trait ComputingKey<M = ()>: AsKey<M> {
    fn produce_default(&self) -> Self::Value;
}

/// A [`Key`] paired with a plain function producing its default value.
///
/// ```
/// use keyed_typemap::{BackedTypedMap, FactoryKey, MutableTypedMap};
///
/// static TAGS: FactoryKey<Vec<String>> = FactoryKey::new("tags", Vec::new);
///
/// let mut map = BackedTypedMap::new();
/// map.compute_if_absent(&TAGS).push("fresh".to_string());
/// assert_eq!(map.compute_if_absent(&TAGS).len(), 1);
/// ```
pub struct FactoryKey<V, M = ()> {
    key: Key<V, M>,
    factory: fn() -> V,
}

impl<V, M> FactoryKey<V, M> {
    pub const fn new(name: &'static str, factory: fn() -> V) -> Self {
        Self {
            key: Key::new(name),
            factory,
        }
    }

    pub fn key(&self) -> &Key<V, M> {
        &self.key
    }
}

impl<V, M> Deref for FactoryKey<V, M> {
    type Target = Key<V, M>;

    fn deref(&self) -> &Key<V, M> {
        &self.key
    }
}

impl<V, M> fmt::Debug for FactoryKey<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FactoryKey").field(&self.key).finish()
    }
}

impl<V, M> AsKey<M> for FactoryKey<V, M>
where
    V: Any + Send + Sync,
{
    type Value = V;

    fn as_key(&self) -> &Key<V, M> {
        &self.key
    }
}

impl<V, M> ComputingKey<M> for FactoryKey<V, M>
where
    V: Any + Send + Sync,
{
    fn produce_default(&self) -> V {
        (self.factory)()
    }
}
