use keyparty::backend::MapBackend;
use keyparty::store::{LockedMemoryStoreAdapter, StoreAdapter};
use keyparty::{
    BasicJarType, Cache, Error, JsonSerializer, LookasideCache, MemoryJarType, MemoryStoreAdapter,
    Table,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use shardmap::ShardMap;
use std::collections::HashMap;

fn exercise_backend<M: MapBackend<i32>>(map: M) {
    assert_eq!(map.map_len(), 0);
    assert!(map.insert("a".into(), 1).is_none());
    assert_eq!(map.insert("a".into(), 2), Some(1));
    assert_eq!(map.get("a"), Some(2));
    assert!(map.contains_key("a"));
    assert!(!map.contains_key("z"));

    map.insert("b".into(), 3);
    let mut keys = map.keys();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(map.map_len(), 2);

    assert_eq!(map.remove("a"), Some(2));
    assert_eq!(map.remove("a"), None);
    map.clear();
    assert_eq!(map.map_len(), 0);
}

#[test]
fn shardmap_backend() {
    exercise_backend(ShardMap::<String, i32>::default());
}

#[test]
fn rwlock_hashmap_backend() {
    exercise_backend(RwLock::new(HashMap::<String, i32>::new()));
}

#[test]
fn memory_byte_store_crud() {
    let store: MemoryStoreAdapter<Vec<u8>> = MemoryStoreAdapter::new();
    assert!(!store.exists("foo").unwrap());

    assert_eq!(store.create("foo", b"{}".to_vec()).unwrap(), 2);
    assert!(store.exists("foo").unwrap());
    assert!(matches!(
        store.create("foo", b"{}".to_vec()),
        Err(Error::AlreadyExists(_))
    ));

    store.write("foo", br#"{"bar":"baz"}"#.to_vec(), true).unwrap();
    assert_eq!(store.read("foo").unwrap(), br#"{"bar":"baz"}"#.to_vec());
    assert_eq!(store.names(), vec!["foo".to_string()]);

    store.remove("foo").unwrap();
    assert!(matches!(store.read("foo"), Err(Error::NotFound(_))));
    assert!(matches!(store.remove("foo"), Err(Error::NotFound(_))));
}

#[test]
fn json_over_locked_memory_store() {
    let adapter: LockedMemoryStoreAdapter<Vec<u8>> = MemoryStoreAdapter::new();
    let jar_type = BasicJarType::new(JsonSerializer::pretty(), adapter);
    let jar = jar_type.jar("test", true).unwrap();

    jar.upsert("a", json!({"integer": 1})).unwrap();
    let raw = jar_type.adapter().read("test").unwrap();
    let text = String::from_utf8(raw).unwrap();
    assert!(text.contains('\n'));
    assert!(text.contains("\"integer\": 1"));
}

#[test]
fn memory_jar_type_stores_tables_natively() {
    let jar_type = MemoryJarType::memory();
    let jar = jar_type.jar("native", true).unwrap();

    jar.upsert("a", json!([1, 2, 3])).unwrap();
    jar.upsert("b", json!({"x": "y"})).unwrap();

    let stored: Table = jar_type.adapter().read("native").unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored.get("a"), Some(&json!([1, 2, 3])));
    assert!(jar.delete("a").unwrap());
    assert_eq!(jar_type.adapter().read("native").unwrap().len(), 1);
}

#[test]
fn lookaside_cache_on_shardmap() {
    let cache = LookasideCache::with_backend(true, ShardMap::<String, Value>::default());
    cache.set("k", json!(["foo", "bar"]));
    assert_eq!(cache.get("k"), Some(json!(["foo", "bar"])));
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}

#[cfg(feature = "dashmap")]
mod dashmap_tests {
    use super::exercise_backend;
    use dashmap::DashMap;
    use keyparty::store::StoreAdapter;
    use keyparty::{BasicJarType, JsonSerializer, MemoryStoreAdapter};
    use serde_json::json;

    #[test]
    fn dashmap_backend() {
        exercise_backend(DashMap::<String, i32>::new());
    }

    #[test]
    fn dashmap_memory_store_jar() {
        let adapter: MemoryStoreAdapter<Vec<u8>, DashMap<String, Vec<u8>>> =
            MemoryStoreAdapter::new();
        let jar_type = BasicJarType::new(JsonSerializer::new(), adapter);
        let jar = jar_type.jar("dash", true).unwrap();
        jar.upsert("p", json!(1)).unwrap();
        jar.upsert("q", json!(2)).unwrap();
        assert_eq!(jar.len().unwrap(), 2);
        assert!(jar_type.adapter().exists("dash").unwrap());
    }
}
