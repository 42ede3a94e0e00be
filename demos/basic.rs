use keyparty::{KeyParty, MemoryJarType, DEFAULT_JAR_TYPE};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), keyparty::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let dir = std::env::temp_dir().join("keyparty_demo_basic");
    let mut kp = KeyParty::new(&dir);

    // open (and create) a jar
    kp.add_jar("fruit", DEFAULT_JAR_TYPE, true)?;

    // set / get / remove
    kp.set("fruit", "apples", json!({"count": 3}))?;
    kp.set("fruit", "bananas", json!({"count": 5}))?;
    println!("apples  = {:?}", kp.get("fruit", "apples")?);
    println!("bananas = {:?}", kp.get("fruit", "bananas")?);

    let previous = kp.update("fruit", "apples", json!({"count": 4}))?;
    println!("apples was {previous:?}, now {:?}", kp.get("fruit", "apples")?);

    kp.remove("fruit", "bananas")?;
    println!("all = {}", json!(kp.get_all("fruit")?));

    // a second jar type that never touches disk
    kp.register_jar_type("memory", MemoryJarType::memory());
    kp.add_jar("session", "memory", true)?;
    kp.set("session", "token", json!("abc123"))?;
    println!("jars = {:?}", kp.jar_names());

    // deleting a jar reports success as a JarRemoved error
    match kp.delete_jar("fruit") {
        Err(e) if e.is_jar_removed() => println!("{e}"),
        Err(e) => return Err(e),
        Ok(never) => match never {},
    }

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}
