use std::collections::HashSet;

use bson::{Bson, doc};
use memdoc::{memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::json;

async fn new_store() -> DocumentStore<InMemoryStore> {
    DocumentStore::new(InMemoryStore::builder().build().await.unwrap())
}

async fn numbered_store(count: i32) -> DocumentStore<InMemoryStore> {
    let store = new_store().await;
    store
        .collection("numbers")
        .insert_many((0..count).map(|n| doc! { "field": n }).collect())
        .await
        .unwrap();
    store
}

async fn count_matches(collection: &Collection<'_, InMemoryStore>, filter: bson::Document) -> usize {
    collection.query_raw(&filter, 0).await.unwrap().len()
}

fn field_values(documents: &[bson::Document]) -> Vec<i32> {
    documents
        .iter()
        .map(|document| document.get_i32("field").unwrap())
        .collect()
}

#[tokio::test]
async fn test_insert_then_find_round_trip() {
    let store = new_store().await;
    let animals = store.collection("TestCollection");

    let payload = json_to_document(json!({ "Name": "Platypus", "Order": "Monotremata" })).unwrap();
    let id = animals.insert(payload.clone()).await.unwrap();
    assert!(!id.is_empty());

    let mut expected = payload;
    expected.insert("objectid", id.clone());
    assert_eq!(animals.find(&id).await.unwrap(), expected);
}

#[tokio::test]
async fn test_find_all_returns_every_document_in_order() {
    let store = new_store().await;
    let animals = store.collection("TestCollectionAll");

    let mut ids = Vec::new();
    for n in 0..10 {
        ids.push(animals.insert(doc! { "Name": "Platypus", "n": n }).await.unwrap());
    }

    let documents = animals.find_all().await.unwrap();
    assert_eq!(documents.len(), 10);
    let stored_ids = documents
        .iter()
        .map(|document| document.get_str("objectid").unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(stored_ids, ids);
}

#[tokio::test]
async fn test_update_overwrites_fields() {
    let store = new_store().await;
    let animals = store.collection("TestCollection");
    let id = animals.insert(doc! { "Name": "Platypus", "Order": "Monotremata" }).await.unwrap();

    assert!(animals.update(&id, &doc! { "Name": "Fish", "Order": "Monotremata" }).await.unwrap());

    let document = animals.find(&id).await.unwrap();
    assert_eq!(document.get_str("Name").unwrap(), "Fish");
    assert_eq!(document.get_str("objectid").unwrap(), id);
}

#[tokio::test]
async fn test_update_nested_path() {
    let store = new_store().await;
    let orders = store.collection("orders");
    let id = orders.insert(doc! { "Order": { "OrderID": 7, "Status": "open" } }).await.unwrap();

    orders.update(&id, &doc! { "Order.Status": "shipped" }).await.unwrap();
    let document = orders.find(&id).await.unwrap();
    assert_eq!(document.get_document("Order").unwrap().get_str("Status").unwrap(), "shipped");

    let err = orders.update(&id, &doc! { "Order.Status.Code": 1 }).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidPath(_)));
}

#[tokio::test]
async fn test_update_unknown_identifier() {
    let store = new_store().await;
    let animals = store.collection("animals");
    animals.insert(doc! { "Name": "Platypus" }).await.unwrap();

    let err = animals.update("missing", &doc! { "Name": "Fish" }).await.unwrap_err();
    assert_eq!(
        err,
        DocumentStoreError::DocumentNotFound("missing".to_string(), "animals".to_string())
    );
}

#[tokio::test]
async fn test_delete_then_find_is_not_found() {
    let store = new_store().await;
    let animals = store.collection("animals");
    let id = animals.insert(doc! { "Name": "Platypus" }).await.unwrap();
    let other = animals.insert(doc! { "Name": "Echidna" }).await.unwrap();

    assert!(animals.delete(&id).await.unwrap());
    assert!(matches!(
        animals.find(&id).await,
        Err(DocumentStoreError::DocumentNotFound(_, _))
    ));
    assert!(matches!(
        animals.delete(&id).await,
        Err(DocumentStoreError::DocumentNotFound(_, _))
    ));
    assert_eq!(animals.find(&other).await.unwrap().get_str("Name").unwrap(), "Echidna");
    assert_eq!(animals.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_query_conjunction() {
    let store = new_store().await;
    let pairs = store.collection("pairs");
    pairs
        .insert_many(vec![
            doc! { "label": "both", "a": 1, "b": 2 },
            doc! { "label": "only a", "a": 1, "b": 3 },
            doc! { "label": "only b", "a": 0, "b": 2 },
        ])
        .await
        .unwrap();

    let labels = |documents: Vec<bson::Document>| {
        documents
            .iter()
            .map(|document| document.get_str("label").unwrap().to_string())
            .collect::<Vec<_>>()
    };

    assert_eq!(labels(pairs.query_raw(&doc! { "a": 1, "b": 2 }, 0).await.unwrap()), vec!["both"]);
    assert_eq!(labels(pairs.query_raw(&doc! { "a": 1 }, 0).await.unwrap()), vec!["both", "only a"]);
    assert_eq!(labels(pairs.query_raw(&doc! { "b": 2 }, 0).await.unwrap()), vec!["both", "only b"]);
}

#[tokio::test]
async fn test_comparator_boundaries() {
    let store = numbered_store(100).await;
    let numbers = store.collection("numbers");

    assert_eq!(count_matches(&numbers, doc! { "field": { "$gt": 50 } }).await, 49);
    assert_eq!(count_matches(&numbers, doc! { "field": { "$gte": 50 } }).await, 50);
    assert_eq!(count_matches(&numbers, doc! { "field": { "$lte": 50 } }).await, 51);
    assert_eq!(count_matches(&numbers, doc! { "field": { "$lt": 50 } }).await, 50);
    assert_eq!(count_matches(&numbers, doc! { "field": { "$ne": 50 } }).await, 99);
    assert_eq!(count_matches(&numbers, doc! { "field": { "$eq": 50 } }).await, 1);
    assert_eq!(count_matches(&numbers, doc! { "field": { "$gte": 10, "$lt": 20 } }).await, 10);
    assert_eq!(count_matches(&numbers, doc! { "field": { "$in": [1, 2, 3, 500] } }).await, 3);
    assert_eq!(count_matches(&numbers, doc! { "field": { "$nin": [1, 2, 3] } }).await, 97);
}

#[tokio::test]
async fn test_type_mismatch_returns_error_and_no_results() {
    let store = numbered_store(10).await;
    let numbers = store.collection("numbers");

    let err = numbers
        .query_raw(&doc! { "field": { "$gt": "5" } }, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::TypeMismatch(_)));

    let names = store.collection("names");
    names.insert(doc! { "Name": "Platypus" }).await.unwrap();
    let err = names
        .query_raw(&doc! { "Name": { "$lt": 5 } }, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::TypeMismatch(_)));
}

#[tokio::test]
async fn test_limit_semantics() {
    let store = numbered_store(100).await;
    let numbers = store.collection("numbers");
    let everything = doc! { "field": { "$gte": 0 } };

    let limited = numbers.query_raw(&everything, 7).await.unwrap();
    assert_eq!(field_values(&limited), (0..7).collect::<Vec<_>>());

    let first = numbers.query_raw(&doc! { "field": { "$gt": 41 } }, 1).await.unwrap();
    assert_eq!(field_values(&first), vec![42]);

    assert_eq!(numbers.query_raw(&everything, 0).await.unwrap().len(), 100);
    assert_eq!(numbers.query_raw(&everything, 1000).await.unwrap().len(), 100);
}

#[tokio::test]
async fn test_nested_path_query() {
    let store = new_store().await;
    let orders = store.collection("orders");
    orders
        .insert_many(vec![
            doc! { "label": "match", "Order": { "OrderID": 7 } },
            doc! { "label": "other id", "Order": { "OrderID": 8 } },
            doc! { "label": "no order" },
            doc! { "label": "flat order", "Order": "Monotremata" },
        ])
        .await
        .unwrap();

    let found = orders.query_raw(&doc! { "Order.OrderID": 7 }, 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_str("label").unwrap(), "match");
}

#[tokio::test]
async fn test_logical_operators_and_syntax_errors() {
    let store = numbered_store(20).await;
    let numbers = store.collection("numbers");

    let found = numbers
        .query_raw(&doc! { "$or": [ { "field": 3 }, { "field": { "$gte": 18 } } ] }, 0)
        .await
        .unwrap();
    assert_eq!(field_values(&found), vec![3, 18, 19]);

    let found = numbers
        .query_raw(&doc! { "$and": [ { "field": { "$gt": 5 } }, { "field": { "$lt": 8 } } ] }, 0)
        .await
        .unwrap();
    assert_eq!(field_values(&found), vec![6, 7]);

    let err = numbers.query_raw(&doc! { "$or": "field" }, 0).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidQuerySyntax(_)));

    let err = numbers
        .query_raw(&doc! { "field": { "$in": { "a": 1 } } }, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidQuerySyntax(_)));

    let err = numbers
        .query_raw(&doc! { "field": { "$exists": true } }, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidQuerySyntax(_)));
}

#[tokio::test]
async fn test_programmatic_query() {
    let store = numbered_store(30).await;
    let numbers = store.collection("numbers");

    let query = Query::builder()
        .filter(Filter::gte("field", 10).and(Filter::or([Filter::eq("field", 12), Filter::gt("field", 27)])))
        .limit(2)
        .build();

    assert_eq!(field_values(&numbers.query(&query).await.unwrap()), vec![12, 28]);
}

#[tokio::test]
async fn test_query_and_update() {
    let store = new_store().await;
    let orders = store.collection("orders");
    orders
        .insert_many(vec![
            doc! { "Status": "open", "Total": 50, "Audit": { "Flagged": false } },
            doc! { "Status": "open", "Total": 150, "Audit": { "Flagged": false } },
            doc! { "Status": "closed", "Total": 300, "Audit": { "Flagged": false } },
            doc! { "Status": "open", "Total": 120, "Audit": { "Flagged": false } },
        ])
        .await
        .unwrap();

    let query = Query::parse(&doc! { "Status": "open", "Total": { "$gte": 100 } }).unwrap();
    let outcome = orders
        .query_and_update(&query, &doc! { "Status": "review", "Audit.Flagged": true })
        .await
        .unwrap();

    assert!(outcome.updated);
    assert_eq!(outcome.documents.len(), 2);
    for document in &outcome.documents {
        assert_eq!(document.get_str("Status").unwrap(), "review");
        assert!(document.get_document("Audit").unwrap().get_bool("Flagged").unwrap());
    }

    let flagged = orders.query_raw(&doc! { "Audit.Flagged": true }, 0).await.unwrap();
    assert_eq!(flagged, outcome.documents);
    assert_eq!(orders.query_raw(&doc! { "Status": "open" }, 0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_query_and_update_failure_changes_nothing() {
    let store = new_store().await;
    let orders = store.collection("orders");
    orders
        .insert_many(vec![
            doc! { "Status": "open", "Audit": { "Flagged": false } },
            doc! { "Status": "open", "Audit": Bson::Null },
        ])
        .await
        .unwrap();
    let before = orders.find_all().await.unwrap();

    let query = Query::parse(&doc! { "Status": "open" }).unwrap();
    let err = orders
        .query_and_update(&query, &doc! { "Status": "review", "Audit.Flagged": true })
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentStoreError::InvalidPath(_)));
    assert_eq!(orders.find_all().await.unwrap(), before);
}

#[tokio::test]
async fn test_operator_keys_are_not_stored() {
    let store = new_store().await;
    let animals = store.collection("animals");
    let id = animals.insert(doc! { "Name": "Platypus" }).await.unwrap();

    let err = animals
        .update(&id, &doc! { "$set": { "Name": "Fish" } })
        .await
        .unwrap_err();
    assert_eq!(err, DocumentStoreError::InvalidPath("$set".to_string()));

    let query = Query::parse(&doc! { "Name": "Platypus" }).unwrap();
    let err = animals
        .query_and_update(&query, &doc! { "Legs": 4, "$inc": { "Legs": 1 } })
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidPath(_)));

    assert_eq!(
        animals.find(&id).await.unwrap(),
        doc! { "Name": "Platypus", "objectid": id.clone() }
    );
}

#[tokio::test]
async fn test_large_integers_match_doubles_exactly() {
    let store = new_store().await;
    let values = store.collection("values");
    values.insert(doc! { "v": 9_007_199_254_740_993_i64 }).await.unwrap();

    assert_eq!(count_matches(&values, doc! { "v": 9_007_199_254_740_992.0 }).await, 0);
    assert_eq!(count_matches(&values, doc! { "v": { "$gt": 9_007_199_254_740_992.0 } }).await, 1);
    assert_eq!(count_matches(&values, doc! { "v": 9_007_199_254_740_993_i64 }).await, 1);
}

#[tokio::test]
async fn test_zero_limit_in_query_literal_is_unbounded() {
    let store = numbered_store(5).await;
    let numbers = store.collection("numbers");

    let query = Query { filter: None, limit: Some(0) };
    assert_eq!(numbers.query(&query).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_identifier_is_immutable() {
    let store = new_store().await;
    let animals = store.collection("animals");
    let id = animals.insert(doc! { "Name": "Platypus" }).await.unwrap();

    let err = animals.update(&id, &doc! { "objectid": "stolen" }).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::ImmutableField(_)));

    let query = Query::parse(&doc! { "Name": "Platypus" }).unwrap();
    let err = animals
        .query_and_update(&query, &doc! { "objectid": "stolen" })
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::ImmutableField(_)));

    assert!(animals.find(&id).await.is_ok());
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let store = new_store().await;
    let id = store.collection("animals").insert(doc! { "Name": "Platypus" }).await.unwrap();
    store.collection("plants").insert(doc! { "Name": "Fern" }).await.unwrap();

    assert!(matches!(
        store.collection("plants").find(&id).await,
        Err(DocumentStoreError::DocumentNotFound(_, _))
    ));
    assert!(store.collection("fungi").find_all().await.unwrap().is_empty());
    assert_eq!(
        store.list_collections().await.unwrap(),
        vec!["animals".to_string(), "plants".to_string()]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts() {
    const TASKS: usize = 8;
    const PER_TASK: usize = 250;

    let backend = InMemoryStore::new();

    let writers = (0..TASKS).map(|task| {
        let backend = backend.clone();
        tokio::spawn(async move {
            let mut ids = Vec::with_capacity(PER_TASK);
            for n in 0..PER_TASK {
                let document = doc! { "task": task as i64, "n": n as i64 };
                ids.push(backend.insert_document("shared", document).await.unwrap());
            }
            ids
        })
    });

    let readers = (0..TASKS).map(|_| {
        let backend = backend.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                let snapshot = backend.find_all_documents("shared").await.unwrap();
                assert!(snapshot.iter().all(|document| document.contains_key("objectid")));
                tokio::task::yield_now().await;
            }
            Vec::<String>::new()
        })
    });

    let ids = futures::future::join_all(writers.chain(readers))
        .await
        .into_iter()
        .flat_map(|ids| ids.unwrap())
        .collect::<HashSet<_>>();

    assert_eq!(ids.len(), TASKS * PER_TASK);
    let documents = backend.find_all_documents("shared").await.unwrap();
    assert_eq!(documents.len(), TASKS * PER_TASK);

    let stored_ids = documents
        .iter()
        .map(|document| document.get_str("objectid").unwrap().to_string())
        .collect::<HashSet<_>>();
    assert_eq!(stored_ids, ids);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_query_and_update_never_double_claims() {
    let backend = InMemoryStore::new();
    backend
        .insert_documents("jobs", (0..100).map(|n| doc! { "n": n, "claimed": false }).collect())
        .await
        .unwrap();

    let workers = (0..10).map(|worker| {
        let backend = backend.clone();
        tokio::spawn(async move {
            let query = Query::parse(&doc! { "claimed": false }).unwrap().with_limit(5);
            let mut claimed = 0;
            loop {
                let outcome = backend
                    .query_and_update("jobs", &query, &doc! { "claimed": true, "worker": worker })
                    .await
                    .unwrap();
                if !outcome.updated {
                    break claimed;
                }
                claimed += outcome.documents.len();
            }
        })
    });

    let total = futures::future::join_all(workers)
        .await
        .into_iter()
        .map(|claimed| claimed.unwrap())
        .sum::<usize>();

    assert_eq!(total, 100);
    let unclaimed = backend
        .query_documents("jobs", &Query::parse(&doc! { "claimed": false }).unwrap())
        .await
        .unwrap();
    assert!(unclaimed.is_empty());
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Animal {
    #[serde(default, skip_serializing)]
    objectid: Option<String>,
    name: String,
    legs: i64,
}

impl Document for Animal {
    fn collection_name() -> &'static str {
        "animals"
    }
}

#[tokio::test]
async fn test_typed_collection() {
    let store = new_store().await;
    let animals = store.typed_collection::<Animal>();
    assert_eq!(animals.name(), "animals");

    let platypus = Animal { objectid: None, name: "Platypus".to_string(), legs: 4 };
    let id = animals.insert(&platypus).await.unwrap();

    let found = animals.find(&id).await.unwrap();
    assert_eq!(found.objectid.as_deref(), Some(id.as_str()));
    assert_eq!(found.name, "Platypus");

    animals.update(&id, &doc! { "legs": 2_i64 }).await.unwrap();
    let query = Query::builder().filter(Filter::lt("legs", 3)).build();
    let bipeds = animals.query(&query).await.unwrap();
    assert_eq!(bipeds.len(), 1);
    assert_eq!(bipeds[0].legs, 2);

    let raw = store.collection("animals").find(&id).await.unwrap();
    assert_eq!(document_to_json(&raw).unwrap()["name"], json!("Platypus"));
}
