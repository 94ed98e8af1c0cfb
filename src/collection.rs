//! Collections and Collection Views
//!
//! A [`Collection`] carries the column schema of an embedded table. A
//! [`CollectionView`] is one configured rendering of it: which properties are
//! shown, in what order and width, and the stored sort/filter query.

use crate::text;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// View type rendered as a table.
pub const COLLECTION_VIEW_TYPE_TABLE: &str = "table";
/// View type rendered as a list.
pub const COLLECTION_VIEW_TYPE_LIST: &str = "list";

/// Option of a select or multi-select column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOption {
    pub id: String,
    pub value: String,
    pub color: String,
}

/// Node of a formula expression tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub result_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<FormulaNode>,
}

/// Type-specific column configuration, keyed by column type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    Title,
    Text,
    Number {
        /// e.g. "dollar", "number"
        number_format: Option<String>,
    },
    Select {
        options: Vec<ColumnOption>,
    },
    MultiSelect {
        options: Vec<ColumnOption>,
    },
    Relation {
        collection_id: String,
        property: Option<String>,
    },
    Rollup {
        /// e.g. "unique"
        aggregation: Option<String>,
        target_property: String,
        relation_property: String,
        target_property_type: Option<String>,
    },
    Formula {
        formula: Option<FormulaNode>,
    },
    /// Any type without type-specific configuration (date, checkbox, person, ...).
    Other { type_name: String },
}

impl ColumnKind {
    /// Wire name of the column type.
    pub fn type_name(&self) -> &str {
        match self {
            ColumnKind::Title => "title",
            ColumnKind::Text => "text",
            ColumnKind::Number { .. } => "number",
            ColumnKind::Select { .. } => "select",
            ColumnKind::MultiSelect { .. } => "multi_select",
            ColumnKind::Relation { .. } => "relation",
            ColumnKind::Rollup { .. } => "rollup",
            ColumnKind::Formula { .. } => "formula",
            ColumnKind::Other { type_name } => type_name.as_str(),
        }
    }
}

/// Schema of one collection column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawColumnSchema", into = "RawColumnSchema")]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn column_type(&self) -> &str {
        self.kind.type_name()
    }

    /// Options for select and multi-select columns; empty otherwise.
    pub fn options(&self) -> &[ColumnOption] {
        match &self.kind {
            ColumnKind::Select { options } | ColumnKind::MultiSelect { options } => options,
            _ => &[],
        }
    }
}

/// Flat wire form of [`ColumnSchema`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawColumnSchema {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aggregation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relation_property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    formula: Option<FormulaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<ColumnOption>,
}

impl From<RawColumnSchema> for ColumnSchema {
    fn from(raw: RawColumnSchema) -> Self {
        let kind = match raw.column_type.as_str() {
            "title" => ColumnKind::Title,
            "text" => ColumnKind::Text,
            "number" => ColumnKind::Number {
                number_format: raw.number_format,
            },
            "select" => ColumnKind::Select {
                options: raw.options,
            },
            "multi_select" => ColumnKind::MultiSelect {
                options: raw.options,
            },
            "relation" => ColumnKind::Relation {
                collection_id: raw.collection_id.unwrap_or_default(),
                property: raw.property,
            },
            "rollup" => ColumnKind::Rollup {
                aggregation: raw.aggregation,
                target_property: raw.target_property.unwrap_or_default(),
                relation_property: raw.relation_property.unwrap_or_default(),
                target_property_type: raw.target_property_type,
            },
            "formula" => ColumnKind::Formula {
                formula: raw.formula,
            },
            _ => ColumnKind::Other {
                type_name: raw.column_type,
            },
        };
        ColumnSchema {
            name: raw.name,
            kind,
        }
    }
}

impl From<ColumnSchema> for RawColumnSchema {
    fn from(schema: ColumnSchema) -> Self {
        let mut raw = RawColumnSchema {
            name: schema.name,
            column_type: schema.kind.type_name().to_string(),
            ..Default::default()
        };
        match schema.kind {
            ColumnKind::Title | ColumnKind::Text | ColumnKind::Other { .. } => {}
            ColumnKind::Number { number_format } => raw.number_format = number_format,
            ColumnKind::Select { options } | ColumnKind::MultiSelect { options } => {
                raw.options = options
            }
            ColumnKind::Relation {
                collection_id,
                property,
            } => {
                raw.collection_id = Some(collection_id);
                raw.property = property;
            }
            ColumnKind::Rollup {
                aggregation,
                target_property,
                relation_property,
                target_property_type,
            } => {
                raw.aggregation = aggregation;
                raw.target_property = Some(target_property);
                raw.relation_property = Some(relation_property);
                raw.target_property_type = target_property_type;
            }
            ColumnKind::Formula { formula } => raw.formula = formula,
        }
        raw
    }
}

/// Page property visibility inside a collection's page layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionPageProperty {
    pub property: String,
    pub visible: bool,
}

/// Collection-level format settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionFormat {
    #[serde(rename = "collection_cover_position")]
    pub cover_position: f64,
    #[serde(rename = "collection_page_properties")]
    pub page_properties: Vec<CollectionPageProperty>,
}

/// Schema definition of a tabular dataset embedded in a document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCollection")]
pub struct Collection {
    pub id: String,
    pub space_id: Option<String>,
    pub version: i64,
    /// Raw rich-text name as stored on the server.
    pub raw_name: Value,
    pub schema: HashMap<String, ColumnSchema>,
    pub format: Option<CollectionFormat>,
    pub parent_id: String,
    pub parent_table: String,
    pub alive: bool,
    pub copied_from: Option<String>,
    pub cover: Option<String>,
    pub icon: Option<String>,
    pub description: Value,
    pub template_pages: Vec<String>,
    name: String,
}

impl Collection {
    /// Plain-text display name, projected from the rich-text name at decode time.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_schema(&self, property: &str) -> Option<&ColumnSchema> {
        self.schema.get(property)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCollection {
    id: String,
    space_id: Option<String>,
    version: i64,
    name: Value,
    schema: Option<HashMap<String, ColumnSchema>>,
    format: Option<CollectionFormat>,
    parent_id: String,
    parent_table: String,
    alive: bool,
    copied_from: Option<String>,
    cover: Option<String>,
    icon: Option<String>,
    description: Value,
    template_pages: Vec<String>,
}

impl From<RawCollection> for Collection {
    fn from(raw: RawCollection) -> Self {
        let name = text::plain_text(&raw.name);
        Collection {
            id: raw.id,
            space_id: raw.space_id,
            version: raw.version,
            raw_name: raw.name,
            schema: raw.schema.unwrap_or_default(),
            format: raw.format,
            parent_id: raw.parent_id,
            parent_table: raw.parent_table,
            alive: raw.alive,
            copied_from: raw.copied_from,
            cover: raw.cover,
            icon: raw.icon,
            description: raw.description,
            template_pages: raw.template_pages,
            name,
        }
    }
}

/// Display entry of one property in a table view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableProperty {
    pub property: String,
    pub visible: bool,
    pub width: u32,
}

impl TableProperty {
    pub fn new(property: impl Into<String>, visible: bool, width: u32) -> Self {
        Self {
            property: property.into(),
            visible,
            width,
        }
    }
}

/// Table view format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatTable {
    pub page_sort: Vec<String>,
    pub table_wrap: bool,
    pub table_properties: Vec<TableProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySort {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sort_type: Option<String>,
    pub property: String,
    /// "ascending" or "descending"
    pub direction: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryAggregate {
    pub id: String,
    #[serde(rename = "type")]
    pub aggregate_type: String,
    pub property: String,
    pub view_type: String,
    pub aggregation_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryAggregation {
    pub property: String,
    pub aggregator: String,
}

/// Sort, filter and aggregation settings stored on a view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub sort: Vec<QuerySort>,
    pub aggregate: Vec<QueryAggregate>,
    pub aggregations: Vec<QueryAggregation>,
    pub filter: Option<Map<String, Value>>,
}

/// A configured rendering of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionView {
    pub id: String,
    pub version: i64,
    #[serde(rename = "type")]
    pub view_type: String,
    pub format: Option<FormatTable>,
    pub name: String,
    pub parent_id: String,
    pub parent_table: String,
    #[serde(rename = "query2")]
    pub query: Option<Query>,
    pub alive: bool,
    pub page_sort: Vec<String>,
    pub space_id: String,
}

impl CollectionView {
    /// Declared table properties, in view order.
    pub fn table_properties(&self) -> &[TableProperty] {
        self.format
            .as_ref()
            .map(|f| f.table_properties.as_slice())
            .unwrap_or(&[])
    }
}
