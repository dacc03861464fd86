//! Macro-generated test suite for `Backend` contract validation.
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_create_assigns_id_and_timestamp`
//! - `test_create_keeps_given_id`
//! - `test_create_rejects_taken_id`
//! - `test_get_nonexistent`
//! - `test_update_replaces_record`
//! - `test_update_nonexistent_creates`
//! - `test_delete_existing` / `test_delete_nonexistent`
//!
//! ## Listing
//! - `test_list_empty`, `test_list_insertion_order`
//! - `test_filter_equality`, `test_filter_boolean_matches_number`
//! - `test_filter_since`, `test_filter_mismatched_types`
//! - `test_sort_with_tie_breaker`, `test_sort_missing_first`
//!
//! ## Scoping and concurrency
//! - `test_scopes_are_isolated`
//! - `test_concurrent_creates`

/// Generate a full `Backend` conformance test suite.
///
/// `$factory` is re-evaluated for each test. For the concurrent access test
/// the backend must also be `Clone + 'static` (shared state via Arc).
#[macro_export]
macro_rules! backend_tests {
    ($factory:expr) => {
        mod backend_contract_tests {
            use super::*;
            use readinglist::core::{
                Backend, BackendError, Comparison, Direction, Filter, Sort, TimeStamp,
            };
            use serde_json::json;

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_create_assigns_id_and_timestamp() {
                let backend = $factory;
                let created = backend
                    .create(article("a", true, 0), alice())
                    .await
                    .unwrap();

                uuid::Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();
                let stamp = created["last_modified"].as_i64().unwrap();
                assert!((stamp - TimeStamp::now()).abs() <= 1);

                let fetched = backend
                    .get(created["id"].as_str().unwrap(), alice())
                    .await
                    .unwrap();
                assert_eq!(fetched, created);
            }

            #[tokio::test]
            async fn test_create_keeps_given_id() {
                let backend = $factory;
                let created = backend
                    .create(record(json!({"id": "fixed", "title": "a"})), alice())
                    .await
                    .unwrap();
                assert_eq!(created["id"], "fixed");
                assert!(backend.get("fixed", alice()).await.is_ok());
            }

            #[tokio::test]
            async fn test_create_rejects_taken_id() {
                let backend = $factory;
                backend
                    .create(record(json!({"id": "fixed", "title": "original"})), alice())
                    .await
                    .unwrap();

                let result = backend
                    .create(record(json!({"id": "fixed", "title": "clobber"})), alice())
                    .await;
                assert!(matches!(
                    result,
                    Err(BackendError::AlreadyExists { ref id }) if id == "fixed"
                ));

                let stored = backend.get("fixed", alice()).await.unwrap();
                assert_eq!(stored["title"], "original");
                assert_eq!(backend.get_all(&[], &[], alice()).await.unwrap().len(), 1);

                // Ids are only unique within one partition
                assert!(backend
                    .create(record(json!({"id": "fixed"})), scope(Some("bob")))
                    .await
                    .is_ok());
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let backend = $factory;
                let result = backend.get("missing", alice()).await;
                assert!(matches!(
                    result,
                    Err(BackendError::RecordNotFound { ref id }) if id == "missing"
                ));
            }

            #[tokio::test]
            async fn test_update_replaces_record() {
                let backend = $factory;
                let created = backend
                    .create(article("a", true, 7), alice())
                    .await
                    .unwrap();
                let id = created["id"].as_str().unwrap();

                let updated = backend
                    .update(id, record(json!({"title": "b"})), alice())
                    .await
                    .unwrap();

                assert_eq!(updated["id"], id);
                assert_eq!(updated["title"], "b");
                assert!(updated.get("read_position").is_none());
                assert_eq!(backend.get(id, alice()).await.unwrap(), updated);
            }

            #[tokio::test]
            async fn test_update_nonexistent_creates() {
                let backend = $factory;
                let updated = backend
                    .update("new-id", article("a", true, 0), alice())
                    .await
                    .unwrap();
                assert_eq!(updated["id"], "new-id");
                assert!(backend.get("new-id", alice()).await.is_ok());
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let backend = $factory;
                let created = backend
                    .create(article("a", true, 0), alice())
                    .await
                    .unwrap();
                let id = created["id"].as_str().unwrap();

                let deleted = backend.delete(id, alice()).await.unwrap();
                assert_eq!(deleted, created);
                assert!(backend.get(id, alice()).await.is_err());
            }

            #[tokio::test]
            async fn test_delete_nonexistent() {
                let backend = $factory;
                assert!(matches!(
                    backend.delete("missing", alice()).await,
                    Err(BackendError::RecordNotFound { .. })
                ));
            }

            // ==================================================================
            // Listing
            // ==================================================================

            async fn seeded() -> impl Backend {
                let backend = $factory;
                for (title, unread, position) in [("b", true, 3), ("a", false, 1), ("c", true, 1)] {
                    backend
                        .create(article(title, unread, position), alice())
                        .await
                        .unwrap();
                }
                backend
            }

            #[tokio::test]
            async fn test_list_empty() {
                let backend = $factory;
                assert!(backend.get_all(&[], &[], alice()).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_list_insertion_order() {
                let backend = seeded().await;
                let records = backend.get_all(&[], &[], alice()).await.unwrap();
                assert_eq!(titles(&records), vec!["b", "a", "c"]);
            }

            #[tokio::test]
            async fn test_filter_equality() {
                let backend = seeded().await;
                let filters = [Filter::new("read_position", json!(1), Comparison::Eq)];
                let records = backend.get_all(&filters, &[], alice()).await.unwrap();
                assert_eq!(titles(&records), vec!["a", "c"]);

                let filters = [
                    Filter::new("read_position", json!(1.0), Comparison::Eq),
                    Filter::new("unread", json!(true), Comparison::Eq),
                ];
                let records = backend.get_all(&filters, &[], alice()).await.unwrap();
                assert_eq!(titles(&records), vec!["c"]);
            }

            #[tokio::test]
            async fn test_filter_boolean_matches_number() {
                let backend = $factory;
                backend
                    .create(record(json!({"title": "one", "flag": 1})), alice())
                    .await
                    .unwrap();
                backend
                    .create(record(json!({"title": "zero", "flag": 0})), alice())
                    .await
                    .unwrap();

                let filters = [Filter::new("flag", json!(true), Comparison::Eq)];
                let records = backend.get_all(&filters, &[], alice()).await.unwrap();
                assert_eq!(titles(&records), vec!["one"]);
            }

            #[tokio::test]
            async fn test_filter_since() {
                let backend = $factory;
                for (title, stamp) in [("old", 100), ("edge", 200), ("new", 300)] {
                    backend
                        .create(
                            record(json!({"title": title, "last_modified": stamp})),
                            alice(),
                        )
                        .await
                        .unwrap();
                }

                let filters = [Filter::new("last_modified", json!(200), Comparison::Gte)];
                let records = backend.get_all(&filters, &[], alice()).await.unwrap();
                assert_eq!(titles(&records), vec!["edge", "new"]);
            }

            #[tokio::test]
            async fn test_filter_mismatched_types() {
                let backend = seeded().await;
                let filters = [Filter::new("title", json!(5), Comparison::Gte)];
                assert!(backend.get_all(&filters, &[], alice()).await.unwrap().is_empty());

                let filters = [Filter::new("missing_field", json!(1), Comparison::Eq)];
                assert!(backend.get_all(&filters, &[], alice()).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_sort_with_tie_breaker() {
                let backend = seeded().await;
                let sorting = [
                    Sort::new("read_position", Direction::Ascending),
                    Sort::new("title", Direction::Descending),
                ];
                let records = backend.get_all(&[], &sorting, alice()).await.unwrap();
                assert_eq!(titles(&records), vec!["c", "a", "b"]);
            }

            #[tokio::test]
            async fn test_sort_missing_first() {
                let backend = seeded().await;
                backend
                    .create(record(json!({"title": "bare"})), alice())
                    .await
                    .unwrap();

                let sorting = [Sort::new("read_position", Direction::Ascending)];
                let records = backend.get_all(&[], &sorting, alice()).await.unwrap();
                assert_eq!(titles(&records)[0], "bare");
            }

            // ==================================================================
            // Scoping and concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_scopes_are_isolated() {
                let backend = seeded().await;

                assert!(backend.get_all(&[], &[], scope(Some("bob"))).await.unwrap().is_empty());
                assert!(backend.get_all(&[], &[], scope(None)).await.unwrap().is_empty());

                let devices = readinglist::core::Scope::new("devices", Some("alice"));
                assert!(backend.get_all(&[], &[], devices).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_concurrent_creates() {
                let backend = $factory;
                let mut handles = Vec::new();
                for i in 0..10 {
                    let backend = backend.clone();
                    handles.push(tokio::spawn(async move {
                        backend
                            .create(article(&format!("t{}", i), true, i), alice())
                            .await
                            .unwrap()
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }

                let records = backend.get_all(&[], &[], alice()).await.unwrap();
                assert_eq!(records.len(), 10);
            }
        }
    };
}
