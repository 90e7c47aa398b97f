//! # keyed-typemap
//!
//! A heterogeneous container where each key carries the type of its value.
//!
//! `keyed-typemap` stores values of many different types in a single map.
//! Instead of asking the caller for a type at every lookup, the type lives in
//! the key: a `Key<V>` can only ever be paired with a `V`, so reads come back
//! as `&V` without any cast at the call site.
//!
//! ## Key Features
//!
//! - **Typed keys**: `Key<V>` ties a slot to its value type at compile time
//! - **Identity semantics**: keys are distinct slots even when they share a name
//! - **Keys with defaults**: a `ComputingKey` builds its own default, so
//!   `compute_if_absent` needs no factory at the call site
//! - **Key families**: a marker type keeps keys of one map out of another
//! - **Thread-safe wrapper**: `SharedTypedMap` serializes access behind a lock
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use keyed_typemap::{BackedTypedMap, Key, MutableTypedMap, TypedMap};
//!
//! static COUNT: Key<i32> = Key::new("count");
//! static GREETING: Key<String> = Key::new("greeting");
//!
//! let mut map = BackedTypedMap::new();
//! map.put(&COUNT, 5);
//! map.put(&GREETING, "Hello, world!".to_string());
//!
//! // Values come back with the key's type
//! let count: &i32 = map.get(&COUNT).unwrap();
//! assert_eq!(*count, 5);
//!
//! // Absence is a normal outcome, not an error
//! map.remove(&COUNT);
//! assert_eq!(map.get(&COUNT), None);
//! assert_eq!(*map.get_or(&COUNT, &0), 0);
//! ```
//!
//! ### Keys That Know Their Default
//!
//! ```rust
//! use keyed_typemap::{BackedTypedMap, FactoryKey, MutableTypedMap};
//!
//! static VISITED: FactoryKey<Vec<&'static str>> = FactoryKey::new("visited", Vec::new);
//!
//! let mut map = BackedTypedMap::new();
//! map.compute_if_absent(&VISITED).push("/home");
//! map.compute_if_absent(&VISITED).push("/about");
//!
//! assert_eq!(*map.compute_if_absent(&VISITED), vec!["/home", "/about"]);
//! ```
//!
//! ### Key Families
//!
//! ```rust
//! use keyed_typemap::{BackedTypedMap, Key, MutableTypedMap, TypedMap};
//!
//! struct Settings;
//!
//! static THEME: Key<String, Settings> = Key::new("theme");
//!
//! let mut settings: BackedTypedMap<Settings> = BackedTypedMap::new();
//! settings.put(&THEME, "dark".to_string());
//! assert!(settings.contains_key(&THEME));
//! ```
//!
//! ### Adopting an Existing Store
//!
//! ```rust
//! use keyed_typemap::{AnyValue, Backing, BackedTypedMap, Key, MapError, TypedMap};
//!
//! static PORT: Key<u16> = Key::new("port");
//!
//! let mut backing = Backing::new();
//! backing.insert(PORT.erased(), AnyValue::new(8080u16));
//!
//! let map: BackedTypedMap = BackedTypedMap::try_from_backing(backing)?;
//! assert_eq!(map.get(&PORT), Some(&8080));
//! # Ok::<(), MapError>(())
//! ```

mod any_value;
mod backed;
mod error;
mod key;
mod shared;
mod traits;

pub use any_value::AnyValue;
pub use backed::{Backing, BackedTypedMap};
pub use error::MapError;
pub use key::{AsKey, ComputingKey, ErasedKey, FactoryKey, Key, KeyId};
pub use shared::SharedTypedMap;
pub use traits::{MutableTypedMap, TypedMap};
