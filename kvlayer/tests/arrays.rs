use kvlayer::{memory::InMemoryStore, prelude::*};
use serde_json::{Value, json};

fn store() -> KeyValueStore<InMemoryStore> {
    KeyValueStore::new(InMemoryStore::new())
}

#[tokio::test]
async fn push_to_absent_key_creates_a_single_element_array() {
    let store = store();

    assert_eq!(store.push("list", "a").await.unwrap(), vec![json!("a")]);
    assert_eq!(store.get("list").await.unwrap(), Some(json!(["a"])));
}

#[tokio::test]
async fn push_array_to_existing_array_appends_each_element() {
    let store = store();
    store.push("list", "a").await.unwrap();

    let items = store.push("list", json!(["b", "c"])).await.unwrap();

    assert_eq!(items, vec![json!("a"), json!("b"), json!("c")]);
    assert_eq!(store.get("list").await.unwrap(), Some(json!(["a", "b", "c"])));
}

#[tokio::test]
async fn push_array_to_absent_key_wraps_it_whole() {
    let store = store();

    let items = store.push("list2", json!(["x", "y"])).await.unwrap();

    assert_eq!(items, vec![json!(["x", "y"])]);
    assert_eq!(store.get("list2").await.unwrap(), Some(json!([["x", "y"]])));
}

#[tokio::test]
async fn push_to_existing_empty_array_appends() {
    let store = store();
    store.set("list", json!([])).await.unwrap();

    assert_eq!(store.push("list", json!(["x", "y"])).await.unwrap(), vec![json!("x"), json!("y")]);
}

#[tokio::test]
async fn push_requires_an_array_and_a_value() {
    let store = store();
    store.set("text", "hello").await.unwrap();

    let err = store.push("text", "a").await.unwrap_err();
    assert!(matches!(&err, KvError::Type(msg) if msg == "value must be an array"));

    let err = store.push("list", Value::Null).await.unwrap_err();
    assert!(matches!(&err, KvError::Validation(msg) if msg == "value is required"));
}

#[tokio::test]
async fn pull_removes_every_occurrence() {
    let store = store();
    store.set("list", json!(["a", "b", "a"])).await.unwrap();

    assert_eq!(store.pull("list", "a").await.unwrap(), Some(vec![json!("b")]));
    assert_eq!(store.get("list").await.unwrap(), Some(json!(["b"])));
}

#[tokio::test]
async fn pull_array_removes_each_of_its_elements() {
    let store = store();
    store.set("list", json!(["a", "b", "c", "b", 1])).await.unwrap();

    let items = store.pull("list", json!(["b", 1, "missing"])).await.unwrap();

    assert_eq!(items, Some(vec![json!("a"), json!("c")]));
}

#[tokio::test]
async fn pull_matches_objects_and_numbers_by_value() {
    let store = store();
    store.set("list", json!([{ "id": 1 }, { "id": 2 }, 3, 3.0])).await.unwrap();

    assert_eq!(store.pull("list", json!({ "id": 1 })).await.unwrap(), Some(vec![json!({ "id": 2 }), json!(3), json!(3.0)]));
    assert_eq!(store.pull("list", 3).await.unwrap(), Some(vec![json!({ "id": 2 })]));
}

#[tokio::test]
async fn pull_everything_leaves_an_empty_array() {
    let store = store();
    store.push("list", "only").await.unwrap();

    assert_eq!(store.pull("list", "only").await.unwrap(), Some(vec![]));
    assert!(store.has("list").await.unwrap());
}

#[tokio::test]
async fn pull_from_absent_key_returns_none() {
    let store = store();

    assert_eq!(store.pull("nothing", "a").await.unwrap(), None);
    assert!(store.is_empty().await.unwrap());
}

#[tokio::test]
async fn pull_requires_an_array() {
    let store = store();
    store.set("n", 5).await.unwrap();

    assert!(matches!(store.pull("n", 5).await, Err(KvError::Type(_))));
    assert!(matches!(store.pull("n", Value::Null).await, Err(KvError::Validation(_))));
    assert_eq!(store.get("n").await.unwrap(), Some(json!(5)));
}

#[tokio::test]
async fn array_operations_work_under_key_locks() {
    let store = KeyValueStore::builder(InMemoryStore::new())
        .serialize_keys(true)
        .build();

    store.push("queue", "a").await.unwrap();
    store.push("queue", json!(["b", "c"])).await.unwrap();
    store.pull("queue", "b").await.unwrap();

    assert_eq!(store.get("queue").await.unwrap(), Some(json!(["a", "c"])));
    assert!(store.delete("queue").await.unwrap());
}
