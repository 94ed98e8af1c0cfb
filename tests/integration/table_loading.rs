//! Table view loading and pagination against a mock API

use super::test_utils::*;
use serde_json::{json, Value};
use tabula::collection::CollectionView;
use tabula::{ApiError, TableView};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_load_table_view_without_stored_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(
            &["r2", "r1"],
            true,
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tv = client
        .load_table_view(PAGE_ID, COLLECTION_ID, VIEW_ID, SPACE_ID, None)
        .await
        .unwrap();

    assert_eq!(tv.name(), "Tasks");
    assert_eq!(tv.column_count(), 2);
    assert_eq!(tv.columns[0].name(), "Name");
    assert_eq!(tv.columns[1].column_type(), "select");
    assert_eq!(tv.columns[1].index, 1);

    assert_eq!(tv.row_count(), 2);
    assert_eq!(tv.rows[0].id(), "r2");
    assert_eq!(tv.cell_content(0, 0).unwrap()[0].text, "Task r2");
    assert_eq!(tv.cell_content(1, 1).unwrap()[0].text, "Done");
    assert!(tv.cell_content(2, 0).is_none());
    assert!(tv.has_more);
    assert_eq!(tv.size_hint, 12);
}

#[tokio::test]
async fn test_load_table_view_refetches_with_stored_sort() {
    let server = MockServer::start().await;
    // mounted first so it wins for change-group requests
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .and(query_param("src", "change_group"))
        .and(body_partial_json(json!({
            "loader": {"sort": [{"property": "title", "direction": "descending"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(
            &["r3", "r2", "r1"],
            false,
            true,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(
            &["r1", "r2", "r3"],
            false,
            true,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tv = client
        .load_table_view(PAGE_ID, COLLECTION_ID, VIEW_ID, SPACE_ID, Some(3))
        .await
        .unwrap();

    let ids: Vec<&str> = tv.rows.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["r3", "r2", "r1"]);
}

#[tokio::test]
async fn test_load_table_view_missing_view() {
    let server = MockServer::start().await;
    let mut body = query_response(&["r1"], false, false);
    body["recordMap"]["collection_view"] = json!({});
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .load_table_view(PAGE_ID, COLLECTION_ID, VIEW_ID, SPACE_ID, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MissingCollectionView { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_fetch_table_rows_sends_change_group_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .and(query_param("src", "change_group"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(
            &["r1"],
            true,
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let initial = query_response(&[], false, false);
    let view: CollectionView =
        serde_json::from_value(initial["recordMap"]["collection_view"][VIEW_ID]["value"].clone())
            .unwrap();
    let collection =
        serde_json::from_value(initial["recordMap"]["collection"][COLLECTION_ID]["value"].clone())
            .unwrap();
    let mut tv = TableView::new(PAGE_ID, view, Some(collection), SPACE_ID);

    client.fetch_table_rows(&mut tv, Some(1)).await.unwrap();
    assert_eq!(tv.row_count(), 1);
    assert!(tv.has_more);

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(
        body["loader"]["reducers"]["collection_group_results"]["limit"],
        1
    );
    assert_eq!(body["collection"]["id"], COLLECTION_ID);
    assert_eq!(body["collectionView"]["spaceId"], SPACE_ID);
    assert!(body["loader"].get("sort").is_none());
}

#[tokio::test]
async fn test_repeated_fetch_replaces_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .and(query_param("src", "change_group"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(
            &["r1", "r2"],
            true,
            false,
        )))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .and(query_param("src", "change_group"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(
            &["r3"],
            false,
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let initial = query_response(&[], false, false);
    let view: CollectionView =
        serde_json::from_value(initial["recordMap"]["collection_view"][VIEW_ID]["value"].clone())
            .unwrap();
    let collection =
        serde_json::from_value(initial["recordMap"]["collection"][COLLECTION_ID]["value"].clone())
            .unwrap();
    let mut tv = TableView::new(PAGE_ID, view, Some(collection), SPACE_ID);

    client.fetch_table_rows(&mut tv, Some(2)).await.unwrap();
    assert_eq!(tv.row_count(), 2);
    assert!(tv.has_more);
    assert_eq!(tv.size_hint, 12);

    client.fetch_table_rows(&mut tv, Some(2)).await.unwrap();
    assert_eq!(tv.row_count(), 1);
    assert_eq!(tv.rows[0].id(), "r3");
    assert_eq!(tv.column_count(), 2);
    assert!(!tv.has_more);
    assert_eq!(tv.size_hint, 1);
}

#[tokio::test]
async fn test_fetch_table_rows_without_collection_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let view = CollectionView {
        id: VIEW_ID.to_string(),
        ..Default::default()
    };
    let mut tv = TableView::new(PAGE_ID, view, None, SPACE_ID);

    match client.fetch_table_rows(&mut tv, None).await {
        Err(ApiError::MissingCollection { page_id, view_id }) => {
            assert_eq!(page_id, "aaaabbbbcccc");
            assert_eq!(view_id, VIEW_ID);
        }
        other => panic!("expected missing collection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_attach_space_short_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/getPublicPageData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spaceShortId": "987",
            "spaceId": SPACE_ID
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let view = CollectionView {
        id: VIEW_ID.to_string(),
        ..Default::default()
    };
    let mut tv = TableView::new(PAGE_ID, view, None, SPACE_ID);
    client.attach_space_short_id(&mut tv).await.unwrap();
    assert_eq!(tv.space_short_id.as_deref(), Some("987"));
}
