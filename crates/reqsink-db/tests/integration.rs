//! Integration tests for reqsink-db
//!
//! Tests capture storage against a real SQLite in-memory database

use chrono::Utc;
use reqsink_db::{connect, entities::capture, migrate};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

/// Helper to create a test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

fn new_capture(method: &str, path: &str, domain: &str) -> capture::ActiveModel {
    capture::ActiveModel {
        id: NotSet,
        public_id: Set(Uuid::new_v4()),
        method: Set(method.to_string()),
        url_path: Set(path.to_string()),
        query_params: Set(String::new()),
        domain: Set(domain.to_string()),
        headers: Set("{}".to_string()),
        body: Set(String::new()),
        made_at: Set(Utc::now()),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_insert_assigns_increasing_ordinals() {
    let db = setup_test_db().await;

    let mut ids = Vec::new();
    for i in 0..5 {
        let inserted = new_capture("GET", &format!("/path/{}", i), "example.com")
            .insert(&db)
            .await
            .expect("Failed to insert");
        ids.push(inserted.id);
    }

    // Fresh store: ordinals are exactly 1..=5, no gaps, no reuse
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_public_id_round_trip() {
    let db = setup_test_db().await;

    let public_id = Uuid::new_v4();
    let model = capture::ActiveModel {
        id: NotSet,
        public_id: Set(public_id),
        method: Set("POST".to_string()),
        url_path: Set("/webhook".to_string()),
        query_params: Set("a=1".to_string()),
        domain: Set("example.com".to_string()),
        headers: Set(r#"{"content-type":"application/json"}"#.to_string()),
        body: Set(r#"{"x":1}"#.to_string()),
        made_at: Set(Utc::now()),
    };

    let inserted = model.insert(&db).await.expect("Failed to insert");

    let found = capture::Entity::find()
        .filter(capture::Column::PublicId.eq(public_id))
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("Capture not found");

    assert_eq!(found, inserted);
    assert_eq!(found.method, "POST");
    assert_eq!(found.query_params, "a=1");
    assert_eq!(found.body, r#"{"x":1}"#);
}

#[tokio::test]
async fn test_public_id_unique_constraint() {
    let db = setup_test_db().await;

    let public_id = Uuid::new_v4();

    let mut first = new_capture("GET", "/", "example.com");
    first.public_id = Set(public_id);
    first.insert(&db).await.expect("Failed to insert");

    let mut duplicate = new_capture("GET", "/other", "example.com");
    duplicate.public_id = Set(public_id);
    let result = duplicate.insert(&db).await;

    assert!(result.is_err(), "Duplicate public_id must be rejected");
}

#[tokio::test]
async fn test_list_descending_with_limit() {
    let db = setup_test_db().await;

    for i in 0..30 {
        new_capture("GET", &format!("/r/{}", i), "example.com")
            .insert(&db)
            .await
            .expect("Failed to insert");
    }

    let recent = capture::Entity::find()
        .order_by_desc(capture::Column::Id)
        .limit(25)
        .all(&db)
        .await
        .expect("Failed to query");

    assert_eq!(recent.len(), 25);
    assert_eq!(recent.first().map(|c| c.id), Some(30));
    assert!(recent.windows(2).all(|w| w[0].id > w[1].id));
}

#[tokio::test]
async fn test_filter_by_domain_exact_match() {
    let db = setup_test_db().await;

    for _ in 0..3 {
        new_capture("GET", "/", "a.example.com")
            .insert(&db)
            .await
            .expect("Failed to insert");
    }
    new_capture("GET", "/", "b.example.com")
        .insert(&db)
        .await
        .expect("Failed to insert");
    // Case-sensitive: must not match "a.example.com"
    new_capture("GET", "/", "A.Example.Com")
        .insert(&db)
        .await
        .expect("Failed to insert");

    let filtered = capture::Entity::find()
        .filter(capture::Column::Domain.eq("a.example.com"))
        .all(&db)
        .await
        .expect("Failed to query");

    assert_eq!(filtered.len(), 3);
    assert!(filtered.iter().all(|c| c.domain == "a.example.com"));
}

#[tokio::test]
async fn test_delete_capture() {
    let db = setup_test_db().await;

    let inserted = new_capture("DELETE", "/gone", "example.com")
        .insert(&db)
        .await
        .expect("Failed to insert");
    let public_id = inserted.public_id;

    inserted.delete(&db).await.expect("Failed to delete");

    let found = capture::Entity::find()
        .filter(capture::Column::PublicId.eq(public_id))
        .one(&db)
        .await
        .expect("Failed to query");

    assert!(found.is_none());
}

#[tokio::test]
async fn test_concurrent_inserts_unique_ordinals() {
    let db = setup_test_db().await;

    let mut handles = vec![];

    for i in 0..10 {
        let db_clone = db.clone();
        let handle = tokio::spawn(async move {
            new_capture("GET", &format!("/concurrent/{}", i), "example.com")
                .insert(&db_clone)
                .await
        });
        handles.push(handle);
    }

    let mut ids = Vec::new();
    for handle in handles {
        let result = handle.await.expect("Task panicked");
        ids.push(result.expect("Insert failed").id);
    }

    // Each concurrent insert gets a unique, strictly increasing ordinal
    ids.sort_unstable();
    assert_eq!(ids, (1..=10).collect::<Vec<i64>>());

    let count = capture::Entity::find()
        .count(&db)
        .await
        .expect("Failed to count");
    assert_eq!(count, 10);
}

#[tokio::test]
async fn test_large_body_stored_verbatim() {
    let db = setup_test_db().await;

    let large_body = "x".repeat(100_000);
    let mut model = new_capture("POST", "/upload", "example.com");
    model.body = Set(large_body.clone());

    let inserted = model.insert(&db).await.expect("Failed to insert");
    assert_eq!(inserted.body.len(), 100_000);
}

#[tokio::test]
async fn test_headers_json_object_decoding() {
    let db = setup_test_db().await;

    let headers_json = r#"{"content-type":"application/json","host":"example.com"}"#;
    let mut model = new_capture("POST", "/", "example.com");
    model.headers = Set(headers_json.to_string());

    let inserted = model.insert(&db).await.expect("Failed to insert");

    let parsed: std::collections::BTreeMap<String, String> =
        serde_json::from_str(&inserted.headers).expect("Headers must decode as an object");
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.get("host").map(String::as_str), Some("example.com"));
}

#[tokio::test]
async fn test_empty_fields_never_null() {
    let db = setup_test_db().await;

    let inserted = new_capture("GET", "/", "")
        .insert(&db)
        .await
        .expect("Failed to insert");

    // Absent values are empty strings, not NULLs
    assert_eq!(inserted.domain, "");
    assert_eq!(inserted.query_params, "");
    assert_eq!(inserted.body, "");
    assert_eq!(inserted.headers, "{}");
}
