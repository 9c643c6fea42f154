//! In-memory table store that evaluates fetch requests directly.

use std::cmp::Ordering;
use std::collections::HashMap;

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::record::{FetchedRow, Record};
use crate::request::{FetchRequest, JunctionJoin, SortOrder};

use super::FetchBackend;

/// A backend holding tables in memory.
///
/// Every executed request is recorded, so tests can assert how many round
/// trips a hydration made and what they looked like.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Vec<Record>>>,
    log: Mutex<Vec<FetchRequest>>,
    failure: Mutex<Option<QueryError>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to `table`, creating the table if needed.
    pub fn insert(&self, table: impl Into<String>, record: Record) {
        self.tables.write().entry(table.into()).or_default().push(record);
    }

    /// Create `table` with the given rows (builder style).
    pub fn with_table(self, table: impl Into<String>, records: impl IntoIterator<Item = Record>) -> Self {
        self.tables
            .write()
            .entry(table.into())
            .or_default()
            .extend(records);
        self
    }

    /// Rows currently stored in `table`.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Requests executed so far, oldest first.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.log.lock().clone()
    }

    /// Number of requests executed so far.
    pub fn request_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Forget recorded requests.
    pub fn clear_log(&self) {
        self.log.lock().clear();
    }

    /// Make the next fetch fail with `error`.
    pub fn fail_next(&self, error: QueryError) {
        *self.failure.lock() = Some(error);
    }

    fn execute(&self, request: &FetchRequest) -> QueryResult<Vec<FetchedRow>> {
        self.log.lock().push(request.clone());
        if let Some(error) = self.failure.lock().take() {
            return Err(error);
        }

        let tables = self.tables.read();
        let missing = |table: &str| {
            QueryError::query_execution(format!("relation \"{}\" does not exist", table))
                .with_model(request.model())
                .with_sql(request.to_sql().0)
        };
        let target = tables
            .get(request.table())
            .ok_or_else(|| missing(request.table()))?;

        let filter = request.effective_filter();
        let candidates = target.iter().filter(|record| filter.matches(record));

        let mut rows: Vec<FetchedRow> = match request.junction() {
            None => candidates.cloned().map(FetchedRow::new).collect(),
            Some(join) => {
                let junction_rows = tables.get(join.table()).ok_or_else(|| missing(join.table()))?;
                let junction_filter = join.effective_filter();
                let eligible: Vec<&Record> = junction_rows
                    .iter()
                    .filter(|j| junction_filter.matches(j))
                    .collect();
                candidates
                    .filter_map(|record| {
                        let linked: Vec<Record> = eligible
                            .iter()
                            .filter(|j| joins(join, j, record))
                            .map(|j| (*j).clone())
                            .collect();
                        (!linked.is_empty())
                            .then(|| FetchedRow::new(record.clone()).with_junction(join.table(), linked))
                    })
                    .collect()
            }
        };

        if !request.ordering().is_empty() {
            rows.sort_by(|a, b| {
                request
                    .ordering()
                    .iter()
                    .map(|field| {
                        let ord = sort_values(a.value(&field.column), b.value(&field.column));
                        match field.order {
                            SortOrder::Asc => ord,
                            SortOrder::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let skip = request.offset().map_or(0, to_usize);
        let take = request.limit().map_or(usize::MAX, to_usize);
        Ok(rows.into_iter().skip(skip).take(take).collect())
    }
}

impl FetchBackend for MemoryBackend {
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, QueryResult<Vec<FetchedRow>>> {
        Box::pin(async move { self.execute(request) })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

fn joins(join: &JunctionJoin, junction_row: &Record, target: &Record) -> bool {
    join.on().iter().all(|on| {
        junction_row
            .value(&on.junction_column)
            .correlates_with(target.value(&on.target_column))
    })
}

/// Nulls sort last in ascending order.
fn sort_values(a: &FilterValue, b: &FilterValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
