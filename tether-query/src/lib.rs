//! # tether-query
//!
//! Batched relation hydration for the Tether ORM.
//!
//! Given a batch of already-loaded entities and the name of a declared
//! relation, this crate fetches every related row in a single request and
//! attaches the rows back onto the entities they belong to. It provides:
//! - A value and filter vocabulary (`FilterValue`, `Filter`)
//! - Relation metadata and an in-memory catalog (`RelationDescriptor`, `SchemaCatalog`)
//! - A backend-neutral fetch description (`FetchRequest`) and backend seam (`FetchBackend`)
//! - The hydration engine itself (`Hydrator`)
//!
//! ## Filters
//!
//! ```rust
//! use tether_query::{Filter, FilterValue};
//!
//! let filter = Filter::and([
//!     Filter::is_in("user_id", [1, 2]),
//!     Filter::Gt("total".into(), FilterValue::Int(10)),
//! ]);
//!
//! let (sql, params) = filter.to_sql(0);
//! assert_eq!(sql, "(user_id IN ($1, $2) AND total > $3)");
//! assert_eq!(params.len(), 3);
//! ```
//!
//! ## Hydration
//!
//! ```rust
//! use tether_query::{
//!     DynamicEntity, Hydrator, InverseRelation, MemoryBackend, Record, RelationDescriptor,
//!     SchemaCatalog,
//! };
//!
//! # futures::executor::block_on(async {
//! let catalog = SchemaCatalog::new()
//!     .with_relation(
//!         RelationDescriptor::one_to_many("orders", "User", "Order")
//!             .table("orders")
//!             .inverse(InverseRelation::new("user", "Order").join_column("user_id", "id")),
//!     )
//!     .unwrap();
//! let backend = MemoryBackend::new().with_table(
//!     "orders",
//!     [Record::new("Order").set("id", 10).set("user_id", 1)],
//! );
//!
//! let hydrator = Hydrator::new(catalog, backend);
//! let mut users = vec![DynamicEntity::new("User").set("id", 1)];
//! hydrator.hydrate(&mut users, "orders").await.unwrap();
//!
//! assert_eq!(users[0].relation("orders").map(|r| r.len()), Some(1));
//! # });
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use tether_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::relation_not_found("User", "invoices");
//! assert_eq!(err.code, ErrorCode::RelationNotFound);
//! assert_eq!(err.to_string(), "[T1001] Relation 'invoices' is not declared on model User");
//! ```

#![deny(missing_docs)]

pub mod backend;
pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod logging;
pub mod record;
pub mod relations;
pub mod request;

pub use backend::{FetchBackend, MemoryBackend};
pub use config::HydrateConfig;
pub use entity::{DynamicEntity, Entity};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use filter::{Filter, FilterValue, ValueKey};
pub use record::{FetchedRow, Record, Related};
pub use relations::{
    AssignStrategy, Catalog, FetchStrategy, HydrateReport, Hydrator, IntoRelationSpecs,
    InverseRelation, JoinColumn, JunctionTable, RelationCondition, RelationDescriptor,
    RelationKind, RelationReport, RelationSpec, RelationType, SchemaCatalog,
};
pub use request::{
    FetchRequest, HookChain, JoinOn, JunctionJoin, OrderByField, QueryHook, SortOrder, hook,
};

// Re-export logging utilities
pub use logging::{get_log_format, get_log_level, init as init_logging, init_with_level, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::backend::{FetchBackend, MemoryBackend};
    pub use crate::config::HydrateConfig;
    pub use crate::entity::{DynamicEntity, Entity};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{Filter, FilterValue};
    pub use crate::record::{Record, Related};
    pub use crate::relations::{
        Catalog, Hydrator, InverseRelation, JunctionTable, RelationCondition, RelationDescriptor,
        RelationKind, RelationSpec, SchemaCatalog,
    };
    pub use crate::request::{FetchRequest, OrderByField, QueryHook, hook};
}
