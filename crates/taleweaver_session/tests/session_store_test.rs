//! Session store behavior across the public API.

use serde_json::json;
use taleweaver_core::{ChatMessage, Role};
use taleweaver_session::SessionStore;

#[test]
fn test_generated_id_retrieves_same_history() -> anyhow::Result<()> {
    let store = SessionStore::new();
    let id = store.create(None)?.id;

    store.add_message(&id, ChatMessage::system("You are a narrator."))?;
    store.add_messages(
        &id,
        [ChatMessage::user("Begin"), ChatMessage::assistant("Once upon a time")],
    )?;

    let messages = store.messages(&id)?;
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    assert_eq!(messages[2].content, "Once upon a time");
    Ok(())
}

#[test]
fn test_delete_and_list() -> anyhow::Result<()> {
    let store = SessionStore::new();
    store.create(Some("a"))?;
    store.create(Some("b"))?;

    let mut ids = store.list()?;
    ids.sort();
    assert_eq!(ids, vec!["a", "b"]);

    assert!(store.delete("a")?);
    assert!(!store.delete("a")?);
    assert_eq!(store.list()?, vec!["b"]);
    assert!(store.get("a")?.is_none());
    Ok(())
}

#[test]
fn test_mutation_updates_timestamp() -> anyhow::Result<()> {
    let store = SessionStore::new();
    let created = store.create(Some("s"))?;
    std::thread::sleep(std::time::Duration::from_millis(2));
    store.set_state("s", "primaryObjective", json!("find the key"))?;

    let session = store.get("s")?.expect("session");
    assert!(session.updated_at > created.updated_at);
    assert_eq!(session.created_at, created.created_at);
    assert_eq!(
        store.get_state("s", "primaryObjective")?,
        Some(json!("find the key"))
    );
    Ok(())
}

#[test]
fn test_recreate_replaces_existing() -> anyhow::Result<()> {
    let store = SessionStore::new();
    store.create(Some("s"))?;
    store.add_message("s", ChatMessage::user("old"))?;

    store.create(Some("s"))?;
    assert!(store.messages("s")?.is_empty());
    Ok(())
}
