use keyed_typemap::{
    AnyValue, AsKey, BackedTypedMap, Backing, ComputingKey, FactoryKey, Key, MapError,
    MutableTypedMap, TypedMap,
};
use std::cell::Cell;
use std::collections::HashMap;

static COUNT: Key<i32> = Key::new("count");
static TITLE: Key<String> = Key::new("title");
static RATIOS: Key<Vec<f64>> = Key::new("ratios");
static LIST: FactoryKey<Vec<String>> = FactoryKey::new("list", Vec::new);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_put_then_get() {
    init_logging();
    let mut map = BackedTypedMap::new();

    map.put(&COUNT, 42);
    map.put(&TITLE, "report".to_string());
    map.put(&RATIOS, vec![0.5, 0.25]);

    assert_eq!(map.get(&COUNT), Some(&42));
    assert_eq!(map.get(&TITLE).map(String::as_str), Some("report"));
    assert_eq!(map.get(&RATIOS), Some(&vec![0.5, 0.25]));
    assert!(map.contains_key(&COUNT));
    assert!(map.contains_key(&TITLE));
    assert_eq!(map.len(), 3);
}

#[test]
fn test_absent_keys() {
    let map: BackedTypedMap = BackedTypedMap::new();
    let fresh: Key<u8> = Key::new("fresh");

    assert_eq!(map.get(&fresh), None);
    assert!(!map.contains_key(&fresh));
    assert_eq!(*map.get_or(&fresh, &7), 7);
    assert!(map.is_empty());
}

#[test]
fn test_get_or_never_invokes_factory() {
    struct Counting<'a> {
        key: Key<u32>,
        calls: &'a Cell<u32>,
    }

    impl AsKey for Counting<'_> {
        type Value = u32;

        fn as_key(&self) -> &Key<u32> {
            &self.key
        }
    }

    impl ComputingKey for Counting<'_> {
        fn produce_default(&self) -> u32 {
            self.calls.set(self.calls.get() + 1);
            100
        }
    }

    let calls = Cell::new(0);
    let key = Counting {
        key: Key::new("counting"),
        calls: &calls,
    };
    let mut map = BackedTypedMap::new();

    assert_eq!(*map.get_or(&key, &1), 1);
    assert_eq!(calls.get(), 0);

    assert_eq!(*map.compute_if_absent(&key), 100);
    assert_eq!(*map.compute_if_absent(&key), 100);
    assert_eq!(calls.get(), 1);
    assert_eq!(*map.get_or(&key, &1), 100);
}

#[test]
fn test_compute_if_absent_runs_factory_once() {
    static CALLS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
    static STAMP: FactoryKey<usize> = FactoryKey::new("stamp", || {
        CALLS.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1
    });

    let mut map = BackedTypedMap::new();
    let first = *map.compute_if_absent(&STAMP);
    let second = *map.compute_if_absent(&STAMP);

    assert_eq!(first, second);
    assert_eq!(CALLS.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn test_identity_not_value_equality() {
    let a: Key<i32> = Key::new("twin");
    let b: Key<i32> = Key::new("twin");
    let mut map = BackedTypedMap::new();

    map.put(&a, 1);

    assert_eq!(map.get(&a), Some(&1));
    assert_eq!(map.get(&b), None);
    assert!(!map.contains_key(&b));

    map.put(&b, 2);
    assert_eq!(map.get(&a), Some(&1));
    assert_eq!(map.get(&b), Some(&2));
    assert_eq!(map.len(), 2);
}

#[test]
fn test_remove() {
    let mut map = BackedTypedMap::new();
    map.put(&COUNT, 3);
    map.put(&TITLE, "t".to_string());

    assert_eq!(map.remove(&COUNT), Some(3));
    assert_eq!(map.get(&COUNT), None);
    assert_eq!(map.len(), 1);

    // Removing an absent key is a no-op
    assert_eq!(map.remove(&COUNT), None);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_clear() {
    let mut map = BackedTypedMap::new();
    map.put(&COUNT, 3);
    map.put(&TITLE, "t".to_string());
    map.compute_if_absent(&LIST);

    map.clear();

    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert!(!map.contains_key(&COUNT));
    assert!(!map.contains_key(&TITLE));
    assert!(!map.contains_key(&LIST));
}

#[test]
fn test_count_scenario() {
    let mut map = BackedTypedMap::new();

    assert_eq!(*map.get_or(&COUNT, &0), 0);
    map.put(&COUNT, 5);
    assert_eq!(*map.get_or(&COUNT, &0), 5);
    map.remove(&COUNT);
    assert!(!map.contains_key(&COUNT));
}

#[test]
fn test_list_scenario_returns_stored_instance() {
    let mut map = BackedTypedMap::new();

    let first = map.compute_if_absent(&LIST);
    assert!(first.is_empty());
    let first: *const Vec<String> = first;

    let second: *const Vec<String> = map.compute_if_absent(&LIST);
    assert!(std::ptr::eq(first, second));

    let stored: *const Vec<String> = map.get(&LIST).unwrap();
    assert!(std::ptr::eq(first, stored));
}

#[test]
fn test_stored_values_are_not_cloned() {
    #[derive(Debug)]
    struct NotClone(u32);

    static HANDLE: Key<NotClone> = Key::new("handle");

    let mut map = BackedTypedMap::new();
    map.put(&HANDLE, NotClone(1));
    if let Some(handle) = map.get_mut(&HANDLE) {
        handle.0 += 1;
    }
    assert_eq!(map.get(&HANDLE).map(|h| h.0), Some(2));
    assert_eq!(map.remove(&HANDLE).map(|h| h.0), Some(2));
}

#[test]
fn test_keys_snapshot() {
    let mut map = BackedTypedMap::new();
    map.put(&COUNT, 1);
    map.put(&TITLE, "x".to_string());

    let mut names: Vec<_> = map.keys().iter().map(|key| key.name()).collect();
    names.sort();
    assert_eq!(names, vec!["count", "title"]);
}

#[test]
fn test_backing_validation() -> Result<(), MapError> {
    init_logging();

    let mut backing = Backing::new();
    backing.insert(COUNT.erased(), AnyValue::new(10i32));
    backing.insert(TITLE.erased(), AnyValue::new("ok".to_string()));
    let map: BackedTypedMap = BackedTypedMap::try_from_backing(backing)?;
    assert_eq!(map.get(&COUNT), Some(&10));

    let mut backing = map.into_backing();
    backing.insert(COUNT.erased(), AnyValue::new(10u64));
    let result = BackedTypedMap::<()>::try_from_backing(backing);
    assert!(matches!(result, Err(MapError::TypeMismatch { .. })));
    Ok(())
}

#[test]
#[should_panic(expected = "type consistency violation")]
fn test_trusted_backing_inconsistency_panics_on_get() {
    let mut backing = Backing::new();
    backing.insert(TITLE.erased(), AnyValue::new(HashMap::<u8, u8>::new()));

    let map: BackedTypedMap = BackedTypedMap::from_backing(backing);
    map.get(&TITLE);
}

#[test]
fn test_key_families_are_separate_maps() {
    struct Audio;
    struct Video;

    static VOLUME: Key<u8, Audio> = Key::new("volume");
    static BRIGHTNESS: Key<u8, Video> = Key::new("brightness");

    let mut audio: BackedTypedMap<Audio> = BackedTypedMap::new();
    let mut video: BackedTypedMap<Video> = BackedTypedMap::default();

    audio.put(&VOLUME, 80);
    video.put(&BRIGHTNESS, 40);

    assert_eq!(audio.get(&VOLUME), Some(&80));
    assert_eq!(video.get(&BRIGHTNESS), Some(&40));
    assert_eq!(audio.len(), 1);
    assert_eq!(video.len(), 1);
}

#[test]
fn test_instance_scoped_keys() {
    struct Widget {
        label: Key<String>,
    }

    let widgets = [
        Widget {
            label: Key::new("label"),
        },
        Widget {
            label: Key::new("label"),
        },
    ];

    let mut map = BackedTypedMap::new();
    for (i, widget) in widgets.iter().enumerate() {
        map.put(&widget.label, format!("widget {}", i));
    }

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&widgets[1].label).map(String::as_str), Some("widget 1"));
}
