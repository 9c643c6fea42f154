//! Filter types for building WHERE clauses and evaluating them in memory.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// A column value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Hashable identity of this value, or `None` for null.
    ///
    /// Two non-null values with equal keys compare equal, with the single
    /// exception of NaN floats.
    pub fn key(&self) -> Option<ValueKey> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(ValueKey::Bool(*b)),
            Self::Int(i) => Some(ValueKey::Int(*i)),
            // -0.0 and 0.0 compare equal, so they must share a key
            Self::Float(f) if *f == 0.0 => Some(ValueKey::Float(0.0f64.to_bits())),
            Self::Float(f) => Some(ValueKey::Float(f.to_bits())),
            Self::String(s) => Some(ValueKey::String(s.clone())),
            Self::Json(v) => Some(ValueKey::Json(v.to_string())),
            Self::List(values) => Some(ValueKey::List(
                values.iter().map(|v| v.key().unwrap_or(ValueKey::Null)).collect(),
            )),
        }
    }

    /// Equality used to correlate rows: both sides non-null and equal.
    pub fn correlates_with(&self, other: &FilterValue) -> bool {
        !self.is_null() && self == other
    }

    /// Compare two values of the same scalar kind.
    ///
    /// Integers and floats compare across kinds; everything else only
    /// compares within its own variant.
    pub fn compare(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Hashable identity of a [`FilterValue`], used for deduplication and indexing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    /// Null inside a list.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float, by normalized bit pattern.
    Float(u64),
    /// String.
    String(String),
    /// JSON, by canonical text.
    Json(String),
    /// List.
    List(Vec<ValueKey>),
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<serde_json::Value> for FilterValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// A complete filter that can be converted to SQL or evaluated against a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// No filter (always true).
    #[default]
    None,

    /// Equals comparison.
    Equals(String, FilterValue),
    /// Not equals comparison.
    NotEquals(String, FilterValue),

    /// Less than comparison.
    Lt(String, FilterValue),
    /// Less than or equal comparison.
    Lte(String, FilterValue),
    /// Greater than comparison.
    Gt(String, FilterValue),
    /// Greater than or equal comparison.
    Gte(String, FilterValue),

    /// In a list of values.
    In(String, Vec<FilterValue>),
    /// Not in a list of values.
    NotIn(String, Vec<FilterValue>),

    /// Contains (LIKE %value%).
    Contains(String, FilterValue),
    /// Starts with (LIKE value%).
    StartsWith(String, FilterValue),
    /// Ends with (LIKE %value).
    EndsWith(String, FilterValue),

    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),

    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Shorthand for an equality filter.
    pub fn equals(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::Equals(column.into(), value.into())
    }

    /// Shorthand for an `IN` filter.
    pub fn is_in(column: impl Into<String>, values: impl IntoIterator<Item = impl Into<FilterValue>>) -> Self {
        Self::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    /// Create an AND filter.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.remove(0),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.remove(0),
            _ => Self::Or(filters),
        }
    }

    /// Create a NOT filter.
    pub fn not(filter: Filter) -> Self {
        if filter.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(filter))
    }

    /// Combine with another filter using AND.
    pub fn and_then(self, other: Filter) -> Self {
        if self.is_none() {
            return other;
        }
        if other.is_none() {
            return self;
        }
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Prefix every unqualified column with `alias.`.
    pub fn qualify(&self, alias: &str) -> Filter {
        self.map_columns(&|column: &str| {
            if column.contains('.') {
                column.to_string()
            } else {
                format!("{}.{}", alias, column)
            }
        })
    }

    fn map_columns(&self, f: &impl Fn(&str) -> String) -> Filter {
        match self {
            Self::None => Self::None,
            Self::Equals(c, v) => Self::Equals(f(c), v.clone()),
            Self::NotEquals(c, v) => Self::NotEquals(f(c), v.clone()),
            Self::Lt(c, v) => Self::Lt(f(c), v.clone()),
            Self::Lte(c, v) => Self::Lte(f(c), v.clone()),
            Self::Gt(c, v) => Self::Gt(f(c), v.clone()),
            Self::Gte(c, v) => Self::Gte(f(c), v.clone()),
            Self::In(c, vs) => Self::In(f(c), vs.clone()),
            Self::NotIn(c, vs) => Self::NotIn(f(c), vs.clone()),
            Self::Contains(c, v) => Self::Contains(f(c), v.clone()),
            Self::StartsWith(c, v) => Self::StartsWith(f(c), v.clone()),
            Self::EndsWith(c, v) => Self::EndsWith(f(c), v.clone()),
            Self::IsNull(c) => Self::IsNull(f(c)),
            Self::IsNotNull(c) => Self::IsNotNull(f(c)),
            Self::And(fs) => Self::And(fs.iter().map(|x| x.map_columns(f)).collect()),
            Self::Or(fs) => Self::Or(fs.iter().map(|x| x.map_columns(f)).collect()),
            Self::Not(inner) => Self::Not(Box::new(inner.map_columns(f))),
        }
    }

    /// Generate SQL for this filter with parameter placeholders.
    ///
    /// Placeholders are numbered from `param_offset + 1`. Returns `(sql, params)`
    /// where params are the values to bind.
    pub fn to_sql(&self, param_offset: usize) -> (String, Vec<FilterValue>) {
        let mut params = Vec::new();
        let sql = self.write_sql(param_offset, &mut params);
        (sql, params)
    }

    fn write_sql(&self, offset: usize, params: &mut Vec<FilterValue>) -> String {
        let bind = |params: &mut Vec<FilterValue>, value: FilterValue| {
            params.push(value);
            format!("${}", offset + params.len())
        };

        match self {
            Self::None => "TRUE".to_string(),

            Self::Equals(col, val) if val.is_null() => format!("{} IS NULL", col),
            Self::Equals(col, val) => format!("{} = {}", col, bind(params, val.clone())),
            Self::NotEquals(col, val) if val.is_null() => format!("{} IS NOT NULL", col),
            Self::NotEquals(col, val) => format!("{} != {}", col, bind(params, val.clone())),

            Self::Lt(col, val) => format!("{} < {}", col, bind(params, val.clone())),
            Self::Lte(col, val) => format!("{} <= {}", col, bind(params, val.clone())),
            Self::Gt(col, val) => format!("{} > {}", col, bind(params, val.clone())),
            Self::Gte(col, val) => format!("{} >= {}", col, bind(params, val.clone())),

            Self::In(_, values) if values.is_empty() => "FALSE".to_string(),
            Self::In(col, values) => {
                let placeholders: Vec<_> = values.iter().map(|v| bind(params, v.clone())).collect();
                format!("{} IN ({})", col, placeholders.join(", "))
            }
            Self::NotIn(_, values) if values.is_empty() => "TRUE".to_string(),
            Self::NotIn(col, values) => {
                let placeholders: Vec<_> = values.iter().map(|v| bind(params, v.clone())).collect();
                format!("{} NOT IN ({})", col, placeholders.join(", "))
            }

            Self::Contains(col, val) => {
                format!("{} LIKE {}", col, bind(params, like_pattern(val, "%", "%")))
            }
            Self::StartsWith(col, val) => {
                format!("{} LIKE {}", col, bind(params, like_pattern(val, "", "%")))
            }
            Self::EndsWith(col, val) => {
                format!("{} LIKE {}", col, bind(params, like_pattern(val, "%", "")))
            }

            Self::IsNull(col) => format!("{} IS NULL", col),
            Self::IsNotNull(col) => format!("{} IS NOT NULL", col),

            Self::And(filters) if filters.is_empty() => "TRUE".to_string(),
            Self::And(filters) => {
                let parts: Vec<_> = filters.iter().map(|f| f.write_sql(offset, params)).collect();
                format!("({})", parts.join(" AND "))
            }
            Self::Or(filters) if filters.is_empty() => "FALSE".to_string(),
            Self::Or(filters) => {
                let parts: Vec<_> = filters.iter().map(|f| f.write_sql(offset, params)).collect();
                format!("({})", parts.join(" OR "))
            }
            Self::Not(filter) => format!("NOT ({})", filter.write_sql(offset, params)),
        }
    }

    /// Evaluate this filter against an in-memory record.
    ///
    /// Comparisons involving null are false, mirroring SQL three-valued logic
    /// collapsed to a boolean.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::None => true,
            Self::Equals(col, val) if val.is_null() => record.value(col).is_null(),
            Self::Equals(col, val) => record.value(col).correlates_with(val),
            Self::NotEquals(col, val) if val.is_null() => !record.value(col).is_null(),
            Self::NotEquals(col, val) => {
                let actual = record.value(col);
                !actual.is_null() && actual != val
            }
            Self::Lt(col, val) => record.value(col).compare(val) == Some(Ordering::Less),
            Self::Lte(col, val) => matches!(
                record.value(col).compare(val),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Self::Gt(col, val) => record.value(col).compare(val) == Some(Ordering::Greater),
            Self::Gte(col, val) => matches!(
                record.value(col).compare(val),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::In(col, values) => {
                let actual = record.value(col);
                values.iter().any(|v| actual.correlates_with(v))
            }
            Self::NotIn(col, values) => {
                let actual = record.value(col);
                !actual.is_null() && !values.iter().any(|v| actual == v)
            }
            Self::Contains(col, val) => string_test(record.value(col), val, |a, b| a.contains(b)),
            Self::StartsWith(col, val) => {
                string_test(record.value(col), val, |a, b| a.starts_with(b))
            }
            Self::EndsWith(col, val) => string_test(record.value(col), val, |a, b| a.ends_with(b)),
            Self::IsNull(col) => record.value(col).is_null(),
            Self::IsNotNull(col) => !record.value(col).is_null(),
            Self::And(filters) => filters.iter().all(|f| f.matches(record)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(record)),
            Self::Not(filter) => !filter.matches(record),
        }
    }
}

fn like_pattern(val: &FilterValue, prefix: &str, suffix: &str) -> FilterValue {
    match val {
        FilterValue::String(s) => FilterValue::String(format!("{}{}{}", prefix, s, suffix)),
        other => other.clone(),
    }
}

fn string_test(actual: &FilterValue, expected: &FilterValue, test: impl Fn(&str, &str) -> bool) -> bool {
    match (actual.as_str(), expected.as_str()) {
        (Some(a), Some(b)) => test(a, b),
        _ => false,
    }
}
