//! Workspace API Client
//!
//! Thin request/response wrapper over the workspace HTTP API plus the
//! operations that drive table materialization: collection queries, page
//! short-id lookup, and in-place pagination of a [`TableView`].
//!
//! Every call performs its round trips in sequence and returns once they
//! complete. Nothing is spawned in the background.

use crate::asset::DownloadFileResponse;
use crate::collection::Query;
use crate::config::{ClientConfig, TabulaConfig};
use crate::error::{map_http_error, ApiError};
use crate::query::{
    LoaderReducer, PageShortIdRequest, PageShortIdResponse, QueryCollectionRequest,
    QueryCollectionResponse, QueryDefaults, QueryResult, SpacePointer, SERVER_ROW_CEILING,
};
use crate::record::{Block, GraphResolver, NodeGraph, SerdeResolver};
use crate::table::TableView;
use futures::StreamExt;
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::{Client as HttpClient, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const QUERY_COLLECTION_PATH: &str = "/api/v3/queryCollection";
const PUBLIC_PAGE_DATA_PATH: &str = "/api/v3/getPublicPageData";
const SIGNED_FILE_URLS_PATH: &str = "/api/v3/getSignedFileUrls";

/// Query-string tag sent when re-fetching rows of an existing view.
const CHANGE_GROUP_SOURCE: (&str, &str) = ("src", "change_group");

/// Maximum characters of an error body kept in [`ApiError::Status`].
const ERROR_BODY_LIMIT: usize = 512;

/// A collection query whose node graph has already been resolved.
#[derive(Debug, Clone)]
pub struct CollectionQuery {
    pub graph: NodeGraph,
    pub result: QueryResult,
}

fn build_http_client(config: &ClientConfig) -> Result<HttpClient, ApiError> {
    HttpClient::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// Client for the workspace API.
pub struct Client {
    http: HttpClient,
    base_url: Url,
    auth_token: Option<String>,
    user_agent: String,
    defaults: QueryDefaults,
    resolver: Arc<dyn GraphResolver>,
}

impl Client {
    pub fn new(config: &ClientConfig, defaults: QueryDefaults) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        Ok(Self {
            http: build_http_client(config)?,
            base_url,
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
            user_agent: config.user_agent.clone(),
            defaults,
            resolver: Arc::new(SerdeResolver),
        })
    }

    pub fn from_config(config: &TabulaConfig) -> Result<Self, ApiError> {
        Self::new(&config.client, config.query.clone())
    }

    /// Replace the node-graph resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn GraphResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn query_defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    fn api_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(USER_AGENT, &self.user_agent);
        match &self.auth_token {
            Some(token) => builder.header(COOKIE, format!("token_v2={}", token)),
            None => builder,
        }
    }

    /// POST a JSON body to an API path and decode the JSON response.
    pub async fn post_api<Req, Rsp>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        body: &Req,
    ) -> Result<Rsp, ApiError>
    where
        Req: Serialize + ?Sized,
        Rsp: DeserializeOwned,
    {
        let url = self.api_url(path, params)?;
        debug!(url = %url, "POST");

        let response = self
            .authorize(self.http.post(url.clone()))
            .json(body)
            .send()
            .await
            .map_err(map_http_error)?;

        let response = check_status(response).await?;
        let text = response.text().await.map_err(map_http_error)?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Run one collection query and resolve the returned node graph.
    ///
    /// When the request carries no loader, one is built from `query` with the
    /// configured defaults. `params` are appended to the query string.
    pub async fn query_collection(
        &self,
        mut req: QueryCollectionRequest,
        query: Option<&Query>,
        params: &[(&str, &str)],
    ) -> Result<CollectionQuery, ApiError> {
        if req.loader.is_none() {
            req.loader = Some(LoaderReducer::new(query, None, &self.defaults));
        }

        let rsp: QueryCollectionResponse =
            self.post_api(QUERY_COLLECTION_PATH, params, &req).await?;
        let graph = self.resolver.resolve(rsp.record_map)?;

        debug!(
            collection_id = %req.collection.id,
            view_id = %req.collection_view.id,
            size_hint = rsp.result.size_hint,
            blocks = graph.blocks.len(),
            "Collection query resolved"
        );

        Ok(CollectionQuery {
            graph,
            result: rsp.result,
        })
    }

    /// Look up a page's short id and owning workspace.
    pub async fn query_space_short_id(
        &self,
        page_id: &str,
        collection_view_id: &str,
    ) -> Result<PageShortIdResponse, ApiError> {
        let req = PageShortIdRequest::new(page_id, collection_view_id);
        self.post_api(PUBLIC_PAGE_DATA_PATH, &[], &req).await
    }

    /// Fill in the workspace short id of a table view.
    pub async fn attach_space_short_id(&self, tv: &mut TableView) -> Result<(), ApiError> {
        let rsp = self
            .query_space_short_id(&tv.page_id, &tv.collection_view.id)
            .await?;
        tv.space_short_id = Some(rsp.space_short_id);
        Ok(())
    }

    /// Re-query a view's rows with an optional row cap and rebuild it in place.
    ///
    /// Exactly one round trip. The caller decides whether to fetch again when
    /// `has_more` is set.
    pub async fn fetch_table_rows(
        &self,
        tv: &mut TableView,
        limit: Option<usize>,
    ) -> Result<(), ApiError> {
        let collection_id = match &tv.collection {
            Some(collection) => collection.id.clone(),
            None => {
                return Err(ApiError::MissingCollection {
                    page_id: crate::record::no_dash_id(&tv.page_id),
                    view_id: tv.collection_view.id.clone(),
                })
            }
        };

        if let Some(limit) = limit.filter(|l| *l > SERVER_ROW_CEILING) {
            warn!(
                limit,
                ceiling = SERVER_ROW_CEILING,
                "Requested row limit exceeds the per-request ceiling; server windowing is unspecified"
            );
        }

        let loader = LoaderReducer::new(tv.collection_view.query.as_ref(), limit, &self.defaults);
        let req = QueryCollectionRequest::new(
            SpacePointer::new(collection_id, &tv.space_id),
            SpacePointer::new(&tv.collection_view.id, &tv.space_id),
        )
        .with_loader(loader);

        let res = self
            .query_collection(req, None, &[CHANGE_GROUP_SOURCE])
            .await?;
        tv.rebuild(&res.result, &res.graph)?;

        info!(
            view_id = %tv.collection_view.id,
            rows = tv.row_count(),
            columns = tv.column_count(),
            has_more = tv.has_more,
            size_hint = tv.size_hint,
            "Table rows fetched"
        );
        Ok(())
    }

    /// Query a collection view and build a table from the records it returns.
    ///
    /// When the view stores a sort or filter, rows are fetched a second time
    /// with that query applied.
    pub async fn load_table_view(
        &self,
        page_id: &str,
        collection_id: &str,
        view_id: &str,
        space_id: &str,
        limit: Option<usize>,
    ) -> Result<TableView, ApiError> {
        let loader = LoaderReducer::new(None, limit, &self.defaults);
        let req = QueryCollectionRequest::new(
            SpacePointer::new(collection_id, space_id),
            SpacePointer::new(view_id, space_id),
        )
        .with_loader(loader);
        let res = self.query_collection(req, None, &[]).await?;

        let view = res
            .graph
            .collection_view(view_id)
            .cloned()
            .ok_or_else(|| ApiError::MissingCollectionView {
                view_id: view_id.to_string(),
            })?;
        let collection = res.graph.collection(collection_id).cloned();

        let mut tv = TableView::new(page_id, view, collection, space_id);
        tv.rebuild(&res.result, &res.graph)?;

        let stored_query = tv
            .collection_view
            .query
            .as_ref()
            .is_some_and(|q| !q.sort.is_empty() || q.filter.is_some());
        if stored_query {
            self.fetch_table_rows(&mut tv, limit).await?;
        }
        Ok(tv)
    }

    /// Open a GET response for a URL. Statuses of 400 and above are errors.
    pub async fn download_url_stream(&self, uri: &str) -> Result<Response, ApiError> {
        let url =
            Url::parse(uri).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", uri, e)))?;
        debug!(url = %url, "GET");
        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(map_http_error)?;
        check_status(response).await
    }

    /// Download a URL into memory.
    pub async fn download_url(&self, uri: &str) -> Result<DownloadFileResponse, ApiError> {
        let response = self.download_url_stream(uri).await?;
        let headers = response.headers().clone();
        let data = response.bytes().await.map_err(map_http_error)?;
        Ok(DownloadFileResponse {
            url: uri.to_string(),
            data,
            headers,
        })
    }

    /// Ask the server for time-limited URLs of protected files owned by `node`.
    pub(crate) async fn signed_file_urls(
        &self,
        urls: &[String],
        node: &Block,
    ) -> Result<Vec<String>, ApiError> {
        let req = SignedUrlsRequest {
            urls: urls
                .iter()
                .map(|url| SignedUrlEntry {
                    url: url.clone(),
                    permission_record: PermissionRecord {
                        table: node.parent_table.clone(),
                        id: node.id.clone(),
                        space_id: node.space_id.clone(),
                    },
                })
                .collect(),
        };
        let rsp: SignedUrlsResponse = self.post_api(SIGNED_FILE_URLS_PATH, &[], &req).await?;
        Ok(rsp.signed_urls)
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();

    // Only the head of the body is kept, so stop reading once it is full.
    let mut head = Vec::with_capacity(ERROR_BODY_LIMIT);
    let mut stream = response.bytes_stream();
    while head.len() < ERROR_BODY_LIMIT {
        match stream.next().await {
            Some(Ok(chunk)) => head.extend_from_slice(&chunk),
            Some(Err(e)) => {
                debug!(url = %url, error = %e, "Error body read failed");
                break;
            }
            None => break,
        }
    }

    Err(ApiError::Status {
        url,
        status: status.as_u16(),
        body: body_excerpt(&head),
    })
}

/// Up to [`ERROR_BODY_LIMIT`] bytes of a body as text, cut on a char boundary.
fn body_excerpt(bytes: &[u8]) -> String {
    let head = &bytes[..bytes.len().min(ERROR_BODY_LIMIT)];
    match std::str::from_utf8(head) {
        Ok(text) => text.to_string(),
        Err(e) if e.error_len().is_none() => {
            String::from_utf8_lossy(&head[..e.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(head).into_owned(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PermissionRecord {
    table: String,
    id: String,
    space_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlEntry {
    url: String,
    permission_record: PermissionRecord,
}

#[derive(Serialize)]
struct SignedUrlsRequest {
    urls: Vec<SignedUrlEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlsResponse {
    #[serde(default)]
    signed_urls: Vec<String>,
}
