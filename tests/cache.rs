use keyparty::{Cache, LookasideCache};
use serde_json::json;

#[test]
fn set_get() {
    let cache = LookasideCache::default();
    cache.set("item_1", json!(["foo", "bar"]));
    assert_eq!(cache.get("item_1"), Some(json!(["foo", "bar"])));
    assert!(cache.is_enabled());
}

#[test]
fn clear() {
    let cache = LookasideCache::new(true);
    cache.set("a", json!(1));
    cache.set("b", json!(2));
    cache.clear();
    assert_eq!(cache.get("a"), None);
    assert!(cache.is_empty());
}

#[test]
fn remove() {
    let cache = LookasideCache::new(true);
    cache.set("item_2", json!(["foo", "bar"]));
    assert_eq!(cache.get("item_2"), Some(json!(["foo", "bar"])));
    cache.remove("item_2");
    assert_eq!(cache.get("item_2"), None);
    cache.remove("never_set");
}

#[test]
fn disabled_cache_never_hits() {
    let cache = LookasideCache::new(false);
    cache.set("a", json!(1));
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.len(), 0);
    cache.remove("a");
    cache.clear();
    assert!(!cache.is_enabled());
}

#[test]
fn null_values_are_cached() {
    let cache = LookasideCache::new(true);
    cache.set("n", json!(null));
    assert_eq!(cache.get("n"), Some(json!(null)));
}
