mod support;

use rewards_engine::{
    db_types::Customer,
    sqlbuild::SelectQuery,
    CustomerApi,
    StoreError,
};
use support::new_test_db;

#[tokio::test]
async fn built_queries_run_through_the_facade() {
    let db = new_test_db().await;
    let api = CustomerApi::new(db.clone());
    for (i, name) in ["Amel", "Sami", "Nour"].iter().enumerate() {
        api.register_customer(format!("2165040030{i}"), name.to_string(), "Facade".to_string(), None).await.unwrap();
    }

    let q = SelectQuery::new("customers").order_by("id ASC").build().unwrap();
    let all: Vec<Customer> = db.query(&q).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].first_name, "Amel");

    let q = SelectQuery::new("customers").filter_eq("phone", "21650400301").build().unwrap();
    let one: Option<Customer> = db.query_one(&q).await.unwrap();
    assert_eq!(one.unwrap().first_name, "Sami");

    let q = SelectQuery::new("customers").filter_eq("phone", "00000000000").build().unwrap();
    let none: Option<Customer> = db.query_one(&q).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn returning_rows_persist_after_the_statement_completes() {
    // The RETURNING row alone proves nothing: the write must survive a re-read on a different
    // pooled connection, every time.
    let db = new_test_db().await;
    let api = CustomerApi::new(db.clone());
    for i in 0..10 {
        let created = api
            .register_customer(format!("216505005{i:02}"), "Dura".to_string(), "Ble".to_string(), None)
            .await
            .unwrap();
        let q = SelectQuery::new("customers").filter_eq("id", created.id).build().unwrap();
        let found: Option<Customer> = db.query_one(&q).await.unwrap();
        assert_eq!(found.expect("inserted customer must be readable").phone, created.phone);
    }
    let q = SelectQuery::new("customers").build().unwrap();
    assert_eq!(db.query::<Customer>(&q).await.unwrap().len(), 10);
}

#[tokio::test]
async fn a_missing_table_surfaces_as_schema_missing() {
    let db = new_test_db().await;
    let q = SelectQuery::new("no_such_table").build().unwrap();
    let err = db.query::<Customer>(&q).await.unwrap_err();
    assert!(matches!(err, StoreError::SchemaMissing(_)), "got {err}");
}

#[tokio::test]
async fn failed_queries_release_their_connections() {
    // The pool holds 5 connections; a leak on the error path would wedge this loop long before 25.
    let db = new_test_db().await;
    let q = SelectQuery::new("no_such_table").build().unwrap();
    for _ in 0..25 {
        assert!(db.query::<Customer>(&q).await.is_err());
    }
    assert!(db.health_check().await);
}

#[tokio::test]
async fn health_check_answers_true_on_a_live_database() {
    let db = new_test_db().await;
    assert!(db.health_check().await);
}
