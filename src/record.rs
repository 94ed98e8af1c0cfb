//! Node Graph
//!
//! The server returns every record a query touches as a snapshot keyed by
//! table and id. [`RecordMap`] is that raw snapshot; a [`GraphResolver`]
//! turns it into a typed [`NodeGraph`] before any row or column work starts.

use crate::collection::{Collection, CollectionView};
use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Table tag for content nodes.
pub const TABLE_BLOCK: &str = "block";
/// Table tag for collections.
pub const TABLE_COLLECTION: &str = "collection";
/// Table tag for collection views.
pub const TABLE_COLLECTION_VIEW: &str = "collection_view";

/// A record wrapper: the caller's role plus the (possibly absent) payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub value: Option<T>,
}

/// Raw record as decoded from the wire.
pub type RawRecord = Record<Value>;

/// Raw node graph snapshot, keyed by table then id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordMap {
    #[serde(default, rename = "block")]
    pub blocks: HashMap<String, RawRecord>,
    #[serde(default, rename = "collection")]
    pub collections: HashMap<String, RawRecord>,
    #[serde(default, rename = "collection_view")]
    pub collection_views: HashMap<String, RawRecord>,
    #[serde(default, rename = "space")]
    pub spaces: HashMap<String, RawRecord>,
}

/// A generic content node. Rows of a collection are nodes whose parent is the
/// collection and whose properties hold one rich-text value per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub version: i64,
    pub parent_id: String,
    pub parent_table: String,
    pub space_id: String,
    pub alive: bool,
    pub properties: Option<Map<String, Value>>,
    pub content: Vec<String>,
    pub collection_id: Option<String>,
    pub view_ids: Vec<String>,
    pub created_time: Option<i64>,
    pub last_edited_time: Option<i64>,
}

impl Block {
    /// Raw property value stored under a column's property key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }
}

/// Resolved node graph.
#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    pub blocks: HashMap<String, Record<Block>>,
    pub collections: HashMap<String, Record<Collection>>,
    pub collection_views: HashMap<String, Record<CollectionView>>,
}

impl NodeGraph {
    /// Block with the given id, if present and carrying a payload.
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id).and_then(|r| r.value.as_ref())
    }

    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.get(id).and_then(|r| r.value.as_ref())
    }

    pub fn collection_view(&self, id: &str) -> Option<&CollectionView> {
        self.collection_views.get(id).and_then(|r| r.value.as_ref())
    }
}

/// Resolves a raw snapshot into typed nodes.
pub trait GraphResolver: Send + Sync {
    fn resolve(&self, snapshot: RecordMap) -> Result<NodeGraph, ApiError>;
}

/// Default resolver: decodes every payload with serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeResolver;

impl GraphResolver for SerdeResolver {
    fn resolve(&self, snapshot: RecordMap) -> Result<NodeGraph, ApiError> {
        Ok(NodeGraph {
            blocks: resolve_table(TABLE_BLOCK, snapshot.blocks)?,
            collections: resolve_table(TABLE_COLLECTION, snapshot.collections)?,
            collection_views: resolve_table(TABLE_COLLECTION_VIEW, snapshot.collection_views)?,
        })
    }
}

fn resolve_table<T: DeserializeOwned>(
    table: &str,
    records: HashMap<String, RawRecord>,
) -> Result<HashMap<String, Record<T>>, ApiError> {
    let mut resolved = HashMap::with_capacity(records.len());
    for (id, raw) in records {
        let (role, payload) = unwrap_payload(raw);
        let value = match payload {
            Some(payload) => Some(serde_json::from_value(payload).map_err(|e| {
                ApiError::Resolve {
                    table: table.to_string(),
                    id: id.clone(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };
        resolved.insert(id, Record { role, value });
    }
    Ok(resolved)
}

/// Newer snapshots nest the payload one level deeper:
/// `{"value": {"value": {...}, "role": "reader"}}`.
fn unwrap_payload(raw: RawRecord) -> (Option<String>, Option<Value>) {
    match raw.value {
        Some(Value::Object(mut obj))
            if !obj.contains_key("id") && obj.contains_key("value") =>
        {
            let role = obj
                .remove("role")
                .and_then(|r| r.as_str().map(str::to_string))
                .or(raw.role);
            let inner = obj.remove("value").filter(|v| !v.is_null());
            (role, inner)
        }
        Some(Value::Null) => (raw.role, None),
        other => (raw.role, other),
    }
}

/// Strip dashes from an id, the form used in page URLs and log lines.
pub fn no_dash_id(id: &str) -> String {
    id.replace('-', "")
}
