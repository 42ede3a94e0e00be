use keyparty::{Config, Error, JsonJarType, SerializationErrorKind};
use serde_json::json;
use tempfile::TempDir;

fn jar_type(dir: &TempDir) -> JsonJarType {
    JsonJarType::json(&Config::with_data_dir(dir.path()))
}

#[test]
fn write_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let jar = jar_type(&dir).jar("test", true).unwrap();
    jar.upsert("a", json!(1)).unwrap();
    jar.upsert("b", json!(2)).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["test.json".to_string()]);
}

#[test]
fn corrupt_file_surfaces_syntax_error() {
    let dir = TempDir::new().unwrap();
    let jar = jar_type(&dir).jar("test", true).unwrap();
    std::fs::write(dir.path().join("test.json"), b"{\"a\": 1,").unwrap();

    match jar.get("a") {
        Err(Error::Serialization { kind, .. }) => assert_eq!(kind, SerializationErrorKind::Syntax),
        other => panic!("expected syntax error, got {other:?}"),
    }
    // nothing gets written over a table that couldn't be read
    assert!(jar.upsert("b", json!(2)).is_err());
    let raw = std::fs::read(dir.path().join("test.json")).unwrap();
    assert_eq!(raw, b"{\"a\": 1,");
}

#[test]
fn non_object_document_is_state_mismatch() {
    let dir = TempDir::new().unwrap();
    let jar = jar_type(&dir).jar("test", true).unwrap();
    std::fs::write(dir.path().join("test.json"), b"[1, 2, 3]").unwrap();

    match jar.get_all() {
        Err(Error::Serialization { kind, .. }) => {
            assert_eq!(kind, SerializationErrorKind::StateMismatch)
        }
        other => panic!("expected state mismatch, got {other:?}"),
    }
}

#[test]
fn invalid_utf8_is_encoding_error() {
    let dir = TempDir::new().unwrap();
    let jar = jar_type(&dir).jar("test", true).unwrap();
    std::fs::write(dir.path().join("test.json"), [b'{', 0xff, 0xfe, b'}']).unwrap();

    match jar.get_all() {
        Err(Error::Serialization { kind, .. }) => assert_eq!(kind, SerializationErrorKind::Encoding),
        other => panic!("expected encoding error, got {other:?}"),
    }
}

#[test]
fn zero_length_file_reads_as_empty_jar() {
    let dir = TempDir::new().unwrap();
    let jar = jar_type(&dir).jar("test", true).unwrap();
    std::fs::write(dir.path().join("test.json"), b"").unwrap();
    assert!(jar.get_all().unwrap().is_empty());
}

#[test]
fn file_deleted_underneath_is_not_found() {
    let dir = TempDir::new().unwrap();
    let jar = jar_type(&dir).jar("test", true).unwrap();
    std::fs::remove_file(dir.path().join("test.json")).unwrap();

    assert!(matches!(jar.get_all(), Err(Error::NotFound(_))));
    // empty() recreates it
    jar.empty().unwrap();
    assert!(jar.get_all().unwrap().is_empty());
}
