//! Untyped rows as returned by a backend and as written into relation slots.
//!
//! A [`Record`] is one row of a model: an ordered map of column names to
//! [`FilterValue`]s. Backends hand rows back as [`FetchedRow`]s, which may
//! additionally carry the junction rows that connected them to the query;
//! that payload is a correlation artifact and never reaches an entity.
//! What the engine writes into a relation slot is a [`Related`] value.
//!
//! ```rust
//! use tether_query::{Record, FilterValue};
//!
//! let order = Record::new("Order").set("id", 10).set("user_id", 1);
//! assert_eq!(order.value("user_id"), &FilterValue::Int(1));
//! assert!(order.value("missing").is_null());
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;

static NULL: FilterValue = FilterValue::Null;

/// One row of a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip)]
    model: String,
    #[serde(flatten)]
    columns: IndexMap<String, FilterValue>,
}

impl Record {
    /// Create an empty record of the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            columns: IndexMap::new(),
        }
    }

    /// Set a column value (builder style).
    pub fn set(mut self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FilterValue>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Get the model this record belongs to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get a column value if present.
    pub fn get(&self, column: &str) -> Option<&FilterValue> {
        self.columns.get(column)
    }

    /// Get a column value, or null when absent.
    ///
    /// A qualified name (`alias.column`) falls back to its last segment.
    pub fn value(&self, column: &str) -> &FilterValue {
        self.columns
            .get(column)
            .or_else(|| {
                column
                    .rsplit_once('.')
                    .and_then(|(_, bare)| self.columns.get(bare))
            })
            .unwrap_or(&NULL)
    }

    /// Iterate over the columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert into a typed value through its JSON representation.
    pub fn deserialize<T: DeserializeOwned>(&self) -> QueryResult<T> {
        let value = serde_json::to_value(self).map_err(|e| {
            QueryError::deserialization(e.to_string()).with_model(&self.model)
        })?;
        serde_json::from_value(value).map_err(|e| {
            QueryError::deserialization(e.to_string())
                .with_model(&self.model)
                .with_source(e)
        })
    }
}

/// A row returned by a backend for a fetch request.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRow {
    /// The target-model row.
    pub record: Record,
    junction: Option<(String, Vec<Record>)>,
}

impl FetchedRow {
    /// Wrap a plain row.
    pub fn new(record: Record) -> Self {
        Self {
            record,
            junction: None,
        }
    }

    /// Attach the junction rows that connected this row, keyed by junction table.
    pub fn with_junction(mut self, table: impl Into<String>, rows: Vec<Record>) -> Self {
        self.junction = Some((table.into(), rows));
        self
    }

    /// Get a column of the target row, or null when absent.
    pub fn value(&self, column: &str) -> &FilterValue {
        self.record.value(column)
    }

    /// Name of the junction table whose rows are attached, if any.
    pub fn junction_table(&self) -> Option<&str> {
        self.junction.as_ref().map(|(table, _)| table.as_str())
    }

    /// Junction rows recorded under `table`; empty for any other table.
    pub fn junction_rows(&self, table: &str) -> &[Record] {
        match &self.junction {
            Some((t, rows)) if t == table => rows,
            _ => &[],
        }
    }

    /// Drop the junction payload and keep the target row.
    pub fn into_record(self) -> Record {
        self.record
    }
}

impl From<Record> for FetchedRow {
    fn from(record: Record) -> Self {
        Self::new(record)
    }
}

/// The value written into an entity's relation slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// A scalar slot: the single related row, or none.
    One(Option<Record>),
    /// A collection slot.
    Many(Vec<Record>),
}

impl Related {
    /// The scalar value, or the first element of a collection.
    pub fn first(&self) -> Option<&Record> {
        match self {
            Self::One(record) => record.as_ref(),
            Self::Many(records) => records.first(),
        }
    }

    /// View the slot as a slice of rows.
    pub fn as_slice(&self) -> &[Record] {
        match self {
            Self::One(Some(record)) => std::slice::from_ref(record),
            Self::One(None) => &[],
            Self::Many(records) => records,
        }
    }

    /// Number of related rows.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Check if the slot holds no rows.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Check if this is a scalar slot.
    pub fn is_one(&self) -> bool {
        matches!(self, Self::One(_))
    }

    /// Collapse a collection to its first element.
    pub fn into_single(self) -> Self {
        match self {
            Self::Many(records) => Self::One(records.into_iter().next()),
            one => one,
        }
    }

    /// Convert every related row into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> QueryResult<Vec<T>> {
        self.as_slice().iter().map(Record::deserialize).collect()
    }
}
