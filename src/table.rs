//! Table Views
//!
//! Materializes a collection view into ordered columns and rows:
//! 1. Columns come from the view's declared properties, filtered to visible
//!    ones and paired with the collection schema.
//! 2. Rows follow the server's id order, backed by resolved content nodes.
//!
//! A [`TableView`] is rebuilt in place on every fetch so callers can keep
//! holding the same value across pagination calls.

use crate::collection::{Collection, CollectionView, ColumnSchema, TableProperty};
use crate::error::ApiError;
use crate::query::QueryResult;
use crate::record::{no_dash_id, Block, NodeGraph};
use crate::text::{parse_text_spans, text_spans_to_string, TextSpan};
use serde::Serialize;
use tracing::{debug, error};

/// Type reported for a column whose schema entry is missing.
pub const UNKNOWN_COLUMN_TYPE: &str = "unknown";

/// A visible column: the view's display entry paired with its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Position in [`TableRow::cells`]
    pub index: usize,
    pub property: TableProperty,
    pub schema: Option<ColumnSchema>,
}

impl ColumnInfo {
    /// Property key of the column.
    pub fn id(&self) -> &str {
        &self.property.property
    }

    /// Schema name, empty when the schema is missing.
    pub fn name(&self) -> &str {
        self.schema.as_ref().map(|s| s.name.as_str()).unwrap_or("")
    }

    pub fn column_type(&self) -> &str {
        self.schema
            .as_ref()
            .map(|s| s.column_type())
            .unwrap_or(UNKNOWN_COLUMN_TYPE)
    }

    pub fn width(&self) -> u32 {
        self.property.width
    }
}

/// One row: the backing content node and one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub page: Block,
    pub cells: Vec<Vec<TextSpan>>,
}

impl TableRow {
    pub fn id(&self) -> &str {
        &self.page.id
    }
}

/// Pair the view's visible properties with the collection schema.
///
/// Order is exactly the view's declared order. A missing schema entry gives a
/// column without schema; a missing collection is an error.
pub fn reconcile_columns(
    page_id: &str,
    view: &CollectionView,
    collection: Option<&Collection>,
) -> Result<Vec<ColumnInfo>, ApiError> {
    let collection = match collection {
        Some(c) => c,
        None => {
            error!(
                page_id = %no_dash_id(page_id),
                view_id = %view.id,
                "Collection is missing for table view"
            );
            return Err(ApiError::MissingCollection {
                page_id: no_dash_id(page_id),
                view_id: view.id.clone(),
            });
        }
    };

    let columns = view
        .table_properties()
        .iter()
        .filter(|prop| prop.visible)
        .enumerate()
        .map(|(index, prop)| ColumnInfo {
            index,
            property: prop.clone(),
            schema: collection.column_schema(&prop.property).cloned(),
        })
        .collect();

    Ok(columns)
}

/// Rows materialized from one query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializedRows {
    pub rows: Vec<TableRow>,
    pub has_more: bool,
}

/// Map the result's ordered id list onto resolved nodes.
///
/// Ids without a node, or whose record carries no payload, are skipped.
pub fn materialize_rows(
    result: &QueryResult,
    graph: &NodeGraph,
    columns: &[ColumnInfo],
) -> MaterializedRows {
    let Some(group) = result.group_results() else {
        return MaterializedRows::default();
    };

    let mut rows = Vec::with_capacity(group.block_ids.len());
    for id in &group.block_ids {
        match graph.block(id) {
            Some(block) => rows.push(TableRow {
                cells: extract_cells(block, columns),
                page: block.clone(),
            }),
            None => debug!(block_id = %id, "Row missing from resolved graph, skipping"),
        }
    }

    MaterializedRows {
        rows,
        has_more: group.has_more,
    }
}

fn extract_cells(block: &Block, columns: &[ColumnInfo]) -> Vec<Vec<TextSpan>> {
    columns
        .iter()
        .map(|col| match block.property(col.id()) {
            Some(value) => parse_text_spans(value).unwrap_or_else(|e| {
                debug!(block_id = %block.id, property = %col.id(), error = %e, "Unreadable cell");
                Vec::new()
            }),
            None => Vec::new(),
        })
        .collect()
}

/// Client-side table combining a collection, one of its views, and the most
/// recent paginated query result.
#[derive(Debug, Clone)]
pub struct TableView {
    /// Page that embeds the view
    pub page_id: String,
    pub collection_view: CollectionView,
    pub collection: Option<Collection>,

    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<TableRow>,

    pub has_more: bool,
    pub size_hint: usize,
    pub space_id: String,
    pub space_short_id: Option<String>,
}

impl TableView {
    pub fn new(
        page_id: impl Into<String>,
        collection_view: CollectionView,
        collection: Option<Collection>,
        space_id: impl Into<String>,
    ) -> Self {
        Self {
            page_id: page_id.into(),
            collection_view,
            collection,
            columns: Vec::new(),
            rows: Vec::new(),
            has_more: false,
            size_hint: 0,
            space_id: space_id.into(),
            space_short_id: None,
        }
    }

    /// Replace columns, rows and pagination metadata from a resolved result.
    ///
    /// On error the view is left untouched.
    pub fn rebuild(&mut self, result: &QueryResult, graph: &NodeGraph) -> Result<(), ApiError> {
        let columns =
            reconcile_columns(&self.page_id, &self.collection_view, self.collection.as_ref())?;
        let materialized = materialize_rows(result, graph, &columns);

        self.columns = columns;
        self.rows = materialized.rows;
        self.has_more = materialized.has_more;
        self.size_hint = result.size_hint;
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Spans of one cell; `None` when out of range.
    pub fn cell_content(&self, row: usize, col: usize) -> Option<&[TextSpan]> {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(col))
            .map(Vec::as_slice)
    }

    /// Display name of the underlying collection.
    pub fn name(&self) -> &str {
        self.collection.as_ref().map(|c| c.name()).unwrap_or("")
    }

    /// Flatten to plain text for output.
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            name: self.name().to_string(),
            columns: self
                .columns
                .iter()
                .map(|c| ColumnSnapshot {
                    property: c.id().to_string(),
                    name: c.name().to_string(),
                    column_type: c.column_type().to_string(),
                    width: c.width(),
                })
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|r| RowSnapshot {
                    id: r.id().to_string(),
                    cells: r
                        .cells
                        .iter()
                        .map(|spans| text_spans_to_string(spans))
                        .collect(),
                })
                .collect(),
            has_more: self.has_more,
            size_hint: self.size_hint,
        }
    }
}

/// Plain-text rendering of a table view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub name: String,
    pub columns: Vec<ColumnSnapshot>,
    pub rows: Vec<RowSnapshot>,
    pub has_more: bool,
    pub size_hint: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSnapshot {
    pub property: String,
    pub name: String,
    pub column_type: String,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSnapshot {
    pub id: String,
    pub cells: Vec<String>,
}
