use crate::key::ErasedKey;
use std::any::{Any, TypeId};
use std::fmt;

/// A container for type-erased values that preserves type information.
///
/// Entries of a [`Backing`](crate::Backing) store are `AnyValue`s. The
/// typed maps narrow them back to the key's value type here and nowhere else.
pub struct AnyValue {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl AnyValue {
    /// Create a new AnyValue from a value of any type that implements Any, Send, and Sync
    pub fn new<T: 'static + Any + Send + Sync>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    /// The `TypeId` of the stored value
    pub fn value_type(&self) -> TypeId {
        self.type_id
    }

    pub fn value_type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check if the contained value is of type T
    pub fn is_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrows the value as the type `key` was declared with.
    ///
    /// # Panics
    ///
    /// Panics if the stored value is not a `T`. That only happens when a
    /// backing store was populated behind the typed API.
    #[track_caller]
    pub(crate) fn restore<T: 'static>(&self, key: &ErasedKey) -> &T {
        match self.value.downcast_ref::<T>() {
            Some(value) => value,
            None => consistency_violation(key, self.type_name),
        }
    }

    #[track_caller]
    pub(crate) fn restore_mut<T: 'static>(&mut self, key: &ErasedKey) -> &mut T {
        let found = self.type_name;
        match self.value.downcast_mut::<T>() {
            Some(value) => value,
            None => consistency_violation(key, found),
        }
    }

    #[track_caller]
    pub(crate) fn into_restored<T: 'static>(self, key: &ErasedKey) -> T {
        let found = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => *value,
            Err(_) => consistency_violation(key, found),
        }
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cold]
#[track_caller]
fn consistency_violation(key: &ErasedKey, found: &str) -> ! {
    panic!(
        "type consistency violation: key {} expects {} but the stored value is {}",
        key,
        key.value_type_name(),
        found
    )
}
