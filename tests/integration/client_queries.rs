//! Collection query and short-id requests against a mock API

use super::test_utils::*;
use serde_json::{json, Value};
use tabula::query::{QueryCollectionRequest, SpacePointer};
use tabula::ApiError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> QueryCollectionRequest {
    QueryCollectionRequest::new(
        SpacePointer::new(COLLECTION_ID, SPACE_ID),
        SpacePointer::new(VIEW_ID, SPACE_ID),
    )
}

#[tokio::test]
async fn test_query_collection_resolves_graph() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .and(header("cookie", "token_v2=test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(
            &["r1", "r2"],
            false,
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let res = client.query_collection(request(), None, &[]).await.unwrap();

    assert_eq!(res.graph.blocks.len(), 2);
    assert_eq!(res.graph.block("r1").unwrap().space_id, SPACE_ID);
    assert_eq!(res.graph.collection(COLLECTION_ID).unwrap().name(), "Tasks");
    assert_eq!(
        res.graph.collection_view(VIEW_ID).unwrap().table_properties().len(),
        3
    );
    let group = res.result.group_results().unwrap();
    assert_eq!(group.block_ids, vec!["r1", "r2"]);
    assert!(!group.has_more);
}

#[tokio::test]
async fn test_query_collection_sends_default_loader() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .and(body_partial_json(json!({
            "collection": {"id": COLLECTION_ID, "spaceId": SPACE_ID},
            "collectionView": {"id": VIEW_ID, "spaceId": SPACE_ID},
            "loader": {
                "type": "reducer",
                "reducers": {
                    "collection_group_results": {"type": "results", "limit": 50}
                },
                "searchQuery": "",
                "userTimeZone": "America/Los_Angeles"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(&[], false, false)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let res = client.query_collection(request(), None, &[]).await.unwrap();
    assert!(res.graph.blocks.is_empty());
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.query_collection(request(), None, &[]).await {
        Err(ApiError::Status { status, body, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_large_error_body_is_cut_to_excerpt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .respond_with(ResponseTemplate::new(502).set_body_string("e".repeat(64 * 1024)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.query_collection(request(), None, &[]).await {
        Err(ApiError::Status { status, body, .. }) => {
            assert_eq!(status, 502);
            assert_eq!(body.len(), 512);
        }
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/queryCollection"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .query_collection(request(), None, &[])
        .await
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_query_space_short_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/getPublicPageData"))
        .and(body_partial_json(json!({
            "blockId": PAGE_ID,
            "name": "page",
            "type": "block-space",
            "collectionViewId": VIEW_ID,
            "mobileData": {"isPush": false}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pageId": PAGE_ID,
            "spaceName": "Acme",
            "spaceId": SPACE_ID,
            "spaceDomain": "acme",
            "spaceShortId": "123456",
            "betaEnabled": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rsp = client.query_space_short_id(PAGE_ID, VIEW_ID).await.unwrap();
    assert_eq!(rsp.space_name, "Acme");
    assert_eq!(rsp.space_short_id, "123456");

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["requestedOnPublicDomain"], false);
    assert_eq!(body["demoWorkspaceMode"], false);
}
