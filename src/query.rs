//! Collection Query Wire Types
//!
//! Request and response shapes for the collection query endpoint, and the
//! loader builder that asks the server for one paginated group of rows.

use crate::collection::{Query, QuerySort};
use crate::record::RecordMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key of the paginated-results reducer in a loader's reducer map.
pub const REDUCER_COLLECTION_GROUP_RESULTS: &str = "collection_group_results";

/// Row count the server is observed to cap a single request at.
pub const SERVER_ROW_CEILING: usize = 1000;

/// Defaults applied when building a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Rows requested when the caller does not pass a limit
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Time zone sent with the loader until the caller supplies the user's own
    #[serde(default = "default_user_time_zone")]
    pub user_time_zone: String,
}

fn default_limit() -> usize {
    50
}

fn default_user_time_zone() -> String {
    "America/Los_Angeles".to_string()
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            user_time_zone: default_user_time_zone(),
        }
    }
}

/// A single reducer directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducerSpec {
    #[serde(rename = "type")]
    pub reducer_type: String,
    pub limit: usize,
}

/// Loader in reducer form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderReducer {
    #[serde(rename = "type")]
    pub loader_type: String,
    pub reducers: BTreeMap<String, ReducerSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<QuerySort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
    #[serde(default)]
    pub search_query: String,
    pub user_time_zone: String,
}

impl LoaderReducer {
    /// Build a loader requesting one page of grouped results.
    ///
    /// Sort and filter are forwarded from `query`; `limit` falls back to the
    /// configured default.
    pub fn new(query: Option<&Query>, limit: Option<usize>, defaults: &QueryDefaults) -> Self {
        let mut reducers = BTreeMap::new();
        reducers.insert(
            REDUCER_COLLECTION_GROUP_RESULTS.to_string(),
            ReducerSpec {
                reducer_type: "results".to_string(),
                limit: limit.unwrap_or(defaults.limit),
            },
        );

        Self {
            loader_type: "reducer".to_string(),
            reducers,
            sort: query.map(|q| q.sort.clone()).unwrap_or_default(),
            filter: query
                .and_then(|q| q.filter.clone())
                .filter(|f| !f.is_empty()),
            search_query: String::new(),
            user_time_zone: defaults.user_time_zone.clone(),
        }
    }

    /// Replace the placeholder time zone with the user's own.
    pub fn with_user_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.user_time_zone = time_zone.into();
        self
    }

    /// Row limit of the grouped-results reducer.
    pub fn limit(&self) -> Option<usize> {
        self.reducers
            .get(REDUCER_COLLECTION_GROUP_RESULTS)
            .map(|r| r.limit)
    }
}

/// Table pointer: id plus owning workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacePointer {
    pub id: String,
    pub space_id: String,
}

impl SpacePointer {
    pub fn new(id: impl Into<String>, space_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            space_id: space_id.into(),
        }
    }
}

/// Body of a collection query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCollectionRequest {
    pub collection: SpacePointer,
    pub collection_view: SpacePointer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<LoaderReducer>,
}

impl QueryCollectionRequest {
    pub fn new(collection: SpacePointer, collection_view: SpacePointer) -> Self {
        Self {
            collection,
            collection_view,
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: LoaderReducer) -> Self {
        self.loader = Some(loader);
        self
    }
}

/// Paginated id list returned by the grouped-results reducer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectionGroupResults {
    #[serde(rename = "type")]
    pub result_type: String,
    pub block_ids: Vec<String>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReducerResults {
    pub collection_group_results: Option<CollectionGroupResults>,
}

/// Query result metadata. The size hint is advisory.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(rename = "type")]
    pub result_type: String,
    pub size_hint: usize,
    pub reducer_results: Option<ReducerResults>,
}

impl QueryResult {
    pub fn group_results(&self) -> Option<&CollectionGroupResults> {
        self.reducer_results
            .as_ref()
            .and_then(|r| r.collection_group_results.as_ref())
    }
}

/// Decoded collection query envelope, before graph resolution.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCollectionResponse {
    #[serde(default)]
    pub record_map: RecordMap,
    pub result: QueryResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileData {
    pub is_push: bool,
}

/// Fixed-shape request for a page's short id and owning workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageShortIdRequest {
    pub block_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub request_type: String,
    pub requested_on_public_domain: bool,
    pub collection_view_id: String,
    pub show_move_to: bool,
    pub save_parent: bool,
    pub should_duplicate: bool,
    pub project_management_launch: bool,
    pub configure_open_in_desktop_app: bool,
    pub mobile_data: MobileData,
    pub demo_workspace_mode: bool,
}

impl PageShortIdRequest {
    pub fn new(page_id: impl Into<String>, collection_view_id: impl Into<String>) -> Self {
        Self {
            block_id: page_id.into(),
            name: "page".to_string(),
            request_type: "block-space".to_string(),
            requested_on_public_domain: false,
            collection_view_id: collection_view_id.into(),
            show_move_to: false,
            save_parent: false,
            should_duplicate: false,
            project_management_launch: false,
            configure_open_in_desktop_app: false,
            mobile_data: MobileData::default(),
            demo_workspace_mode: false,
        }
    }
}

/// Page short id and workspace details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageShortIdResponse {
    pub page_id: String,
    pub space_name: String,
    pub space_id: String,
    pub space_domain: String,
    pub space_short_id: String,
    pub beta_enabled: bool,
}
