//! Backend-neutral description of a batched relation fetch.
//!
//! The engine builds a [`FetchRequest`] with a correlation filter that scopes
//! the fetch to the whole batch of source entities. Query hooks may narrow the
//! request with additional filters, orderings and limits, but there is no way
//! to replace or remove the correlation itself.
//!
//! ```rust,ignore
//! let hook = tether_query::hook(|request| {
//!     request
//!         .and_where(Filter::equals("status", "shipped"))
//!         .order_by(OrderByField::desc("created_at"))
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use crate::filter::{Filter, FilterValue};

/// Sort order for fetched rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Order by specification for a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByField {
    /// The column name to order by.
    pub column: String,
    /// The sort order.
    pub order: SortOrder,
}

impl OrderByField {
    /// Create a new order by field.
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    /// Ascending order on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Asc)
    }

    /// Descending order on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Desc)
    }
}

/// One equality in a junction join's ON clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOn {
    /// Column of the junction table.
    pub junction_column: String,
    /// Column of the target table it must equal.
    pub target_column: String,
}

/// Inner join against a junction table, used by many-to-many fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionJoin {
    table: String,
    on: Vec<JoinOn>,
    correlation: Filter,
    filters: Vec<Filter>,
}

impl JunctionJoin {
    pub(crate) fn new(table: impl Into<String>, on: Vec<JoinOn>, correlation: Filter) -> Self {
        Self {
            table: table.into(),
            on,
            correlation,
            filters: Vec::new(),
        }
    }

    /// Junction table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Equalities linking junction rows to target rows.
    pub fn on(&self) -> &[JoinOn] {
        &self.on
    }

    /// Filter on junction columns scoping the join to the source batch.
    pub fn correlation(&self) -> &Filter {
        &self.correlation
    }

    /// Correlation AND every extra junction filter.
    pub fn effective_filter(&self) -> Filter {
        Filter::and(std::iter::once(self.correlation.clone()).chain(self.filters.iter().cloned()))
    }
}

/// A lazy, not-yet-executed fetch of target-model rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    model: String,
    table: String,
    alias: String,
    correlation: Filter,
    junction: Option<JunctionJoin>,
    filters: Vec<Filter>,
    order_by: Vec<OrderByField>,
    skip: Option<u64>,
    take: Option<u64>,
}

impl FetchRequest {
    pub(crate) fn new(
        model: impl Into<String>,
        table: impl Into<String>,
        alias: impl Into<String>,
        correlation: Filter,
    ) -> Self {
        Self {
            model: model.into(),
            table: table.into(),
            alias: alias.into(),
            correlation,
            junction: None,
            filters: Vec::new(),
            order_by: Vec::new(),
            skip: None,
            take: None,
        }
    }

    pub(crate) fn with_junction(mut self, junction: JunctionJoin) -> Self {
        self.junction = Some(junction);
        self
    }

    // ============== Hook API ==============

    /// Narrow the fetched rows with an additional filter on the target table.
    pub fn and_where(mut self, filter: Filter) -> Self {
        if !filter.is_none() {
            self.filters.push(filter);
        }
        self
    }

    /// Narrow the junction rows with an additional filter.
    ///
    /// Has no effect on requests without a junction join.
    pub fn junction_where(mut self, filter: Filter) -> Self {
        if let Some(junction) = self.junction.as_mut() {
            if !filter.is_none() {
                junction.filters.push(filter);
            }
        }
        self
    }

    /// Append an ordering.
    pub fn order_by(mut self, field: OrderByField) -> Self {
        self.order_by.push(field);
        self
    }

    /// Skip the first `n` rows of the whole batch.
    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    /// Fetch at most `n` rows for the whole batch.
    pub fn take(mut self, n: u64) -> Self {
        self.take = Some(n);
        self
    }

    // ============== Accessors ==============

    /// Target model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Target table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Alias of the target table (the relation name).
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Filter that scopes the fetch to the source batch.
    pub fn correlation(&self) -> &Filter {
        &self.correlation
    }

    /// Junction join, for many-to-many fetches.
    pub fn junction(&self) -> Option<&JunctionJoin> {
        self.junction.as_ref()
    }

    /// Filters added by hooks.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Orderings added by hooks.
    pub fn ordering(&self) -> &[OrderByField] {
        &self.order_by
    }

    /// Rows to skip.
    pub fn offset(&self) -> Option<u64> {
        self.skip
    }

    /// Maximum rows to return.
    pub fn limit(&self) -> Option<u64> {
        self.take
    }

    /// Correlation AND every extra target filter.
    pub fn effective_filter(&self) -> Filter {
        Filter::and(std::iter::once(self.correlation.clone()).chain(self.filters.iter().cloned()))
    }

    /// Render a PostgreSQL-flavoured statement with `$n` placeholders.
    pub fn to_sql(&self) -> (String, Vec<FilterValue>) {
        let mut sql = format!(
            "SELECT {alias}.* FROM {table} AS {alias}",
            alias = self.alias,
            table = self.table
        );
        let mut params = Vec::new();

        if let Some(ref junction) = self.junction {
            let mut conditions: Vec<String> = junction
                .on
                .iter()
                .map(|on| {
                    format!(
                        "{}.{} = {}.{}",
                        junction.table, on.junction_column, self.alias, on.target_column
                    )
                })
                .collect();

            let filter = junction.effective_filter();
            if !filter.is_none() {
                let (filter_sql, filter_params) = filter.qualify(&junction.table).to_sql(params.len());
                conditions.push(filter_sql);
                params.extend(filter_params);
            }

            sql.push_str(&format!(
                " INNER JOIN {} ON {}",
                junction.table,
                conditions.join(" AND ")
            ));
        }

        let filter = self.effective_filter();
        if !filter.is_none() {
            let (filter_sql, filter_params) = filter.qualify(&self.alias).to_sql(params.len());
            sql.push_str(" WHERE ");
            sql.push_str(&filter_sql);
            params.extend(filter_params);
        }

        if !self.order_by.is_empty() {
            let parts: Vec<_> = self
                .order_by
                .iter()
                .map(|o| {
                    if o.column.contains('.') {
                        format!("{} {}", o.column, o.order.as_sql())
                    } else {
                        format!("{}.{} {}", self.alias, o.column, o.order.as_sql())
                    }
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        if let Some(take) = self.take {
            sql.push_str(&format!(" LIMIT {}", take));
        }
        if let Some(skip) = self.skip {
            sql.push_str(&format!(" OFFSET {}", skip));
        }

        (sql, params)
    }
}

/// A pure transformation of a fetch request.
pub type QueryHook = Arc<dyn Fn(FetchRequest) -> FetchRequest + Send + Sync>;

/// Wrap a closure as a [`QueryHook`].
pub fn hook<F>(f: F) -> QueryHook
where
    F: Fn(FetchRequest) -> FetchRequest + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An ordered list of request transformations.
#[derive(Default)]
pub struct HookChain<'a> {
    hooks: Vec<Box<dyn Fn(FetchRequest) -> FetchRequest + 'a>>,
}

impl<'a> HookChain<'a> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Append a transformation; it runs after every one already pushed.
    pub fn push(&mut self, f: impl Fn(FetchRequest) -> FetchRequest + 'a) {
        self.hooks.push(Box::new(f));
    }

    /// Number of transformations.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Apply every transformation in order.
    pub fn apply(&self, request: FetchRequest) -> FetchRequest {
        self.hooks.iter().fold(request, |request, f| f(request))
    }
}

impl fmt::Debug for HookChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain").field("len", &self.hooks.len()).finish()
    }
}
