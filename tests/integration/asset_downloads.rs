//! Asset downloads and signed-URL fallback against a mock server

use super::test_utils::*;
use serde_json::json;
use tabula::record::Block;
use tabula::ApiError;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn owner() -> Block {
    Block {
        id: "block-1".to_string(),
        parent_table: "collection".to_string(),
        space_id: SPACE_ID.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_download_direct_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/a.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"png-bytes".to_vec())
                .append_header("Content-Type", "image/png"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let uri = format!("{}/files/a.png", server.uri());
    let rsp = client.download_file(&uri, None).await.unwrap();
    assert_eq!(&rsp.data[..], b"png-bytes");
    assert_eq!(rsp.url, uri);
    assert_eq!(rsp.headers.get("content-type").unwrap(), "image/png");
}

#[tokio::test]
async fn test_download_falls_back_to_signed_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/private.pdf"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/getSignedFileUrls"))
        .and(body_partial_json(json!({
            "urls": [{
                "permissionRecord": {
                    "table": "collection",
                    "id": "block-1",
                    "spaceId": SPACE_ID
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signedUrls": [format!("{}/signed/private.pdf", server.uri())]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/signed/private.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let uri = format!("{}/files/private.pdf", server.uri());
    let rsp = client.download_file_stream(&uri, Some(&owner())).await.unwrap();
    assert_eq!(&rsp.bytes().await.unwrap()[..], b"pdf");
}

#[tokio::test]
async fn test_download_without_node_returns_first_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/gone.png"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let uri = format!("{}/files/gone.png", server.uri());
    match client.download_file(&uri, None).await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected 404, got {:?}", other.map(|r| r.url)),
    }
}
