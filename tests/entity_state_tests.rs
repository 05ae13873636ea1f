use entity_access::prelude::*;
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

fn seeded() -> anyhow::Result<EntityPool> {
    let pool = EntityPool::new();
    let register = pool.register(
        "users",
        vec![
            record(json!({"id": "u1", "name": "Alice", "age": 30, "tags": ["admin"]})),
            record(json!({"id": "u2", "name": "Bob", "age": 25})),
            record(json!({"id": "u3", "name": "Carol", "age": 41, "profile": {"city": "Oslo"}})),
        ],
    )?;
    Ok(pool.apply(&register)?)
}

#[test]
fn test_register_then_read_back() -> anyhow::Result<()> {
    let pool = seeded()?;

    let alice = pool.get(&IdQuery::new("users", "u1"))?;
    assert_eq!(alice.get("name"), Some(&json!("Alice")));
    assert!(pool.has(&IdQuery::new("users", "u3")));
    assert!(!pool.has(&IdQuery::new("orders", "u1")));

    Ok(())
}

#[test]
fn test_find_is_lenient() -> anyhow::Result<()> {
    let pool = seeded()?;

    let nobody = WhereQuery::new("users", Filter::eq("name", "Zed"));
    assert!(pool.find(&nobody).is_empty());
    assert!(pool.find_one(&nobody).is_none());

    let unknown_type = WhereQuery::new("orders", Filter::all());
    assert!(pool.find(&unknown_type).is_empty());

    Ok(())
}

#[test]
fn test_find_with_operators_skip_and_limit() -> anyhow::Result<()> {
    let pool = seeded()?;

    let filter = Filter::parse(&json!({"age": {"$gte": 25, "$lt": 41}}))?;
    let ids: Vec<&str> = pool
        .find(&WhereQuery::new("users", filter))
        .into_iter()
        .map(Entity::id)
        .collect();
    assert_eq!(ids, vec!["u1", "u2"]);

    let page = pool.find(&WhereQuery::new("users", Filter::all()).skip(1).limit(1));
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id(), "u2");

    let nested = pool.find_one(&WhereQuery::new("users", Filter::eq("profile.city", "Oslo")));
    assert_eq!(nested.map(Entity::id), Some("u3"));

    let tagged = pool.find(&WhereQuery::new("users", Filter::eq("tags", "admin")));
    assert_eq!(tagged.len(), 1);

    Ok(())
}

#[test]
fn test_get_by_ids_is_all_or_nothing() -> anyhow::Result<()> {
    let pool = seeded()?;

    let found = pool.get_by_ids(&IdsQuery::new("users", ["u3", "u1"]))?;
    let ids: Vec<&str> = found.iter().map(|entity| entity.id()).collect();
    assert_eq!(ids, vec!["u3", "u1"]);

    let err = pool
        .get_by_ids(&IdsQuery::new("users", ["u1", "u2", "missing"]))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("missing"));

    Ok(())
}

#[test]
fn test_updater_describes_and_reducer_applies() -> anyhow::Result<()> {
    let pool = seeded()?;

    let bump = pool.update_multi(&MultiUpdateCommand::new(
        "users",
        Filter::parse(&json!({"age": {"$lt": 35}}))?,
        Patch::new().inc("age", 1),
    ))?;
    let rename = pool.update_by_id(&IdUpdateCommand::new(
        "users",
        "u2",
        Patch::new().set("name", "Robert"),
    ))?;
    let remove = pool.delete(&DeleteCommand::by_id("users", "u3"))?;

    // Describing changes leaves the snapshot untouched.
    assert_eq!(pool.get(&IdQuery::new("users", "u2"))?.get("age"), Some(&json!(25)));

    let next = pool.apply_all([&bump, &rename, &remove])?;
    let bob = next.get(&IdQuery::new("users", "u2"))?;
    assert_eq!(bob.get("age"), Some(&json!(26)));
    assert_eq!(bob.get("name"), Some(&json!("Robert")));
    assert!(!next.has(&IdQuery::new("users", "u3")));

    // The previous snapshot is still intact.
    assert!(pool.has(&IdQuery::new("users", "u3")));

    Ok(())
}

#[test]
fn test_patching_missing_entity_fails_on_apply() -> anyhow::Result<()> {
    let pool = seeded()?;
    let op = pool.update_by_id(&IdUpdateCommand::new("users", "ghost", Patch::new().set("a", 1)))?;

    let err = pool.apply(&op).unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[test]
fn test_update_operation_wire_format() -> anyhow::Result<()> {
    let pool = EntityPool::new();
    let op = pool.delete(&DeleteCommand::by_id("users", "u1"))?;

    let wire = serde_json::to_value(&op)?;
    assert_eq!(wire["type"], json!("remove"));
    assert_eq!(wire["entityType"], json!("users"));

    let back: UpdateOperation = serde_json::from_value(wire)?;
    assert_eq!(back, op);

    Ok(())
}
