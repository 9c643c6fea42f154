//! The seam between the hydration engine and a relational store.
//!
//! A backend turns a [`FetchRequest`] into rows. The engine never retries and
//! never rewrites backend errors; whatever a backend returns is surfaced to
//! the caller as is.

mod memory;

pub use memory::MemoryBackend;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::QueryResult;
use crate::record::FetchedRow;
use crate::request::FetchRequest;

/// Executes fetch requests built by the engine.
///
/// For requests with a junction join, each returned row must carry the
/// junction rows that connected it, under the junction table name
/// (see [`FetchedRow::with_junction`]).
pub trait FetchBackend: Send + Sync {
    /// Execute a request and materialize its rows.
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, QueryResult<Vec<FetchedRow>>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str {
        "backend"
    }
}

impl<B: FetchBackend + ?Sized> FetchBackend for Arc<B> {
    fn fetch<'a>(&'a self, request: &'a FetchRequest) -> BoxFuture<'a, QueryResult<Vec<FetchedRow>>> {
        (**self).fetch(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
