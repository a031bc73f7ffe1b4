/// Model instance tests
///
/// Attribute handling, dirty tracking and the save/update/delete
/// lifecycle, run against a stub transport.
/// Run with: cargo test --test model_tests
mod support;

use std::sync::{Arc, Mutex};

use serde_json::json;

use restorm::{HookResult, ModelDescriptor, ModelType, Registry};
use support::stub_registry;

fn posts(registry: &Registry) -> ModelType {
    registry
        .define("Post", ModelDescriptor::new("api/posts").date("published_at"))
        .unwrap();
    registry.named("Post").unwrap()
}

#[tokio::test]
async fn test_attributes_and_date_coercion() {
    let (registry, _) = stub_registry();
    let posts = posts(&registry);

    let post = posts
        .new_instance(json!({
            "title": "Hello",
            "published_at": "2015-11-23T12:11:03+00:00",
        }))
        .unwrap();

    assert_eq!(post.attribute("title"), Some(json!("Hello")));
    assert_eq!(post.attribute("published_at"), Some(json!(1448280663)));
    assert_eq!(
        post.date_attribute("published_at").map(|d| d.timestamp()),
        Some(1448280663)
    );
    assert_eq!(post.attribute("missing"), None);
}

#[tokio::test]
async fn test_dirty_tracking() {
    let (registry, _) = stub_registry();
    let posts = posts(&registry);

    let mut post = posts
        .hydrate_row(json!({"id": 5, "title": "Hello", "votes": 3}))
        .unwrap();
    assert!(post.dirty().is_empty());

    post.set_attribute("title", json!("Updated")).unwrap();
    let dirty = post.dirty();
    assert_eq!(dirty.len(), 1);
    assert!(dirty.contains_key("title"));

    // Setting the original value back makes the attribute clean again.
    post.set_attribute("title", json!("Hello")).unwrap();
    assert!(post.dirty().is_empty());
}

#[tokio::test]
async fn test_equivalent_date_forms_are_not_dirty() {
    let (registry, _) = stub_registry();
    let posts = posts(&registry);

    let mut post = posts
        .hydrate_row(json!({"id": 5, "published_at": 1448280663}))
        .unwrap();

    post.set_attribute("published_at", json!("2015-11-23T12:11:03Z"))
        .unwrap();
    assert!(post.dirty().is_empty());
}

#[tokio::test]
async fn test_save_inserts_a_new_instance() {
    let (registry, transport) = stub_registry();
    let posts = posts(&registry);
    transport.respond_with(json!({"id": 7, "title": "Hello"}));

    let mut post = posts.new_instance(json!({"title": "Hello"})).unwrap();
    assert!(!post.exists());

    post.save().await.unwrap();

    assert!(post.exists());
    assert_eq!(post.key(), Some(json!(7)));
    assert!(post.dirty().is_empty());

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[0].url, "api/posts");
    assert_eq!(calls[0].body, json!({"title": "Hello"}));
}

#[tokio::test]
async fn test_save_updates_only_dirty_attributes() {
    let (registry, transport) = stub_registry();
    let posts = posts(&registry);

    let mut post = posts
        .hydrate_row(json!({"id": 5, "title": "Hello", "votes": 3}))
        .unwrap();
    post.set_attribute("title", json!("Updated")).unwrap();

    post.save().await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "PUT");
    assert_eq!(calls[0].url, "api/posts/5");
    assert_eq!(calls[0].body, json!({"title": "Updated"}));
    assert_eq!(calls[0].query, "[]");

    // The snapshot re-syncs after a successful save.
    assert!(post.dirty().is_empty());
}

#[tokio::test]
async fn test_events_fire_in_order_on_create() {
    let (registry, transport) = stub_registry();
    transport.respond_with(json!({"id": 1}));

    let fired = Arc::new(Mutex::new(Vec::new()));
    let log = |name: &'static str, fired: &Arc<Mutex<Vec<&'static str>>>| {
        let fired = Arc::clone(fired);
        move |_: &mut restorm::Model| {
            fired.lock().unwrap().push(name);
            HookResult::Continue
        }
    };

    registry
        .define(
            "Post",
            ModelDescriptor::new("api/posts")
                .saving(log("saving", &fired))
                .creating(log("creating", &fired))
                .created(log("created", &fired))
                .saved(log("saved", &fired)),
        )
        .unwrap();

    let posts = registry.named("Post").unwrap();
    posts.create(json!({"title": "Hello"})).await.unwrap();

    assert_eq!(
        *fired.lock().unwrap(),
        vec!["saving", "creating", "created", "saved"]
    );
}

#[tokio::test]
async fn test_cancelling_saving_blocks_the_network() {
    let (registry, transport) = stub_registry();
    registry
        .define(
            "Post",
            ModelDescriptor::new("api/posts").saving(|_| HookResult::Cancel),
        )
        .unwrap();

    let posts = registry.named("Post").unwrap();
    let mut post = posts.new_instance(json!({"title": "Hello"})).unwrap();

    let error = post.save().await.unwrap_err();
    assert!(error.is_cancelled());
    assert_eq!(error.to_string(), "saving.cancelled");
    assert!(transport.calls().is_empty());
    assert!(!post.exists());
}

#[tokio::test]
async fn test_cancelling_deleting_blocks_the_network() {
    let (registry, transport) = stub_registry();
    registry
        .define(
            "Post",
            ModelDescriptor::new("api/posts").deleting(|_| HookResult::Cancel),
        )
        .unwrap();

    let posts = registry.named("Post").unwrap();
    let mut post = posts.hydrate_row(json!({"id": 5})).unwrap();

    assert!(post.delete().await.unwrap_err().is_cancelled());
    assert!(transport.calls().is_empty());
    assert!(post.exists());
}

#[tokio::test]
async fn test_delete_then_save_reinserts() {
    let (registry, transport) = stub_registry();
    let posts = posts(&registry);

    let mut post = posts
        .hydrate_row(json!({"id": 5, "title": "Hello"}))
        .unwrap();

    assert!(post.delete().await.unwrap());
    assert!(!post.exists());

    let calls = transport.calls();
    assert_eq!(calls[0].method, "DELETE");
    assert_eq!(calls[0].url, "api/posts/5");
    assert_eq!(calls[0].query, r#"[["where",["id",5]]]"#);

    // Saving a deleted instance goes back through the insert path.
    post.save().await.unwrap();
    assert_eq!(transport.calls()[1].method, "POST");
    assert!(post.exists());
}

#[tokio::test]
async fn test_failed_delete_keeps_the_instance_alive() {
    let (registry, transport) = stub_registry();
    transport.delete_succeeds(false);
    let posts = posts(&registry);

    let mut post = posts.hydrate_row(json!({"id": 5})).unwrap();

    assert!(!post.delete().await.unwrap());
    assert!(post.exists());
}

#[tokio::test]
async fn test_delete_without_a_key_is_an_error() {
    let (registry, transport) = stub_registry();
    let posts = posts(&registry);

    let mut post = posts.new_instance(json!({"title": "Hello"})).unwrap();
    assert!(post.delete().await.is_err());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_instance_update_fills_and_saves() {
    let (registry, transport) = stub_registry();
    let posts = posts(&registry);

    let mut post = posts
        .hydrate_row(json!({"id": 5, "title": "Hello"}))
        .unwrap();
    post.update(json!({"title": "Updated"})).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls[0].method, "PUT");
    assert_eq!(calls[0].url, "api/posts/5");
    assert_eq!(calls[0].body, json!({"title": "Updated"}));
    assert_eq!(post.attribute("title"), Some(json!("Updated")));
}

#[tokio::test]
async fn test_bulk_update_targets_the_wildcard() {
    let (registry, transport) = stub_registry();
    let posts = posts(&registry);

    posts
        .where_(("votes", "<", 0))
        .update(&json!({"hidden": true}))
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls[0].method, "PUT");
    assert_eq!(calls[0].url, "api/posts/*");
    assert_eq!(calls[0].query, r#"[["where",["votes","<",0]]]"#);
    assert_eq!(calls[0].body, json!({"hidden": true}));
}

#[tokio::test]
async fn test_bulk_delete_targets_the_wildcard() {
    let (registry, transport) = stub_registry();
    let posts = posts(&registry);

    assert!(posts.where_null("author_id").delete().await.unwrap());

    let calls = transport.calls();
    assert_eq!(calls[0].method, "DELETE");
    assert_eq!(calls[0].url, "api/posts/*");
    assert_eq!(calls[0].query, r#"[["whereNull",["author_id"]]]"#);
}

#[tokio::test]
async fn test_load_fetches_requested_relations() {
    let (registry, transport) = stub_registry();
    registry
        .define(
            "Post",
            ModelDescriptor::new("api/posts").relation("comments", "Comment"),
        )
        .unwrap();
    registry
        .define("Comment", ModelDescriptor::new("api/comments"))
        .unwrap();

    transport.respond_with(json!({
        "id": 5,
        "comments": [{"id": 1, "body": "First"}, {"id": 2, "body": "Second"}],
    }));

    let posts = registry.named("Post").unwrap();
    let mut post = posts.hydrate_row(json!({"id": 5})).unwrap();

    post.load(&["comments"]).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls[0].method, "GET");
    assert_eq!(
        calls[0].query,
        r#"[["with",["comments"]],["limit",[1]]]"#
    );

    match post.relation("comments") {
        Some(restorm::Related::Many(comments)) => {
            assert_eq!(comments.len(), 2);
            assert_eq!(comments[0].attribute("body"), Some(json!("First")));
            assert!(comments[0].exists());
        }
        _ => panic!("expected a loaded comments relation"),
    }
}

#[tokio::test]
async fn test_to_wire_uses_timestamps() {
    let (registry, _) = stub_registry();
    let posts = posts(&registry);

    let post = posts
        .new_instance(json!({
            "title": "Hello",
            "published_at": "2015-11-23T12:11:03Z",
        }))
        .unwrap();

    assert_eq!(
        post.to_wire(),
        json!({"published_at": 1448280663, "title": "Hello"})
    );
}

#[tokio::test]
async fn test_attribute_snapshot_is_detached() {
    let (registry, _) = stub_registry();
    let posts = posts(&registry);

    let mut post = posts.new_instance(json!({"title": "Hello"})).unwrap();
    let snapshot = post.attributes();

    post.set_attribute("title", json!("Changed")).unwrap();

    assert_eq!(snapshot.get("title").map(|a| a.to_wire()), Some(json!("Hello")));
    assert_eq!(post.attribute("title"), Some(json!("Changed")));
}

#[tokio::test]
async fn test_value_and_lists() {
    let (registry, transport) = stub_registry();
    let posts = posts(&registry);

    transport.respond_with(json!([{"title": "First"}]));
    transport.respond_with(json!([{"title": "First"}, {"title": "Second"}]));

    let value = posts.query().value("title").await.unwrap();
    assert_eq!(value, Some(json!("First")));

    let titles = posts.query().lists("title").await.unwrap();
    assert_eq!(titles, vec![json!("First"), json!("Second")]);

    let calls = transport.calls();
    assert_eq!(calls[0].query, r#"[["limit",[1]],["select",["title"]]]"#);
    assert_eq!(calls[1].query, r#"[["select",["title"]]]"#);
}
