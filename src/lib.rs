//! # Tether
//!
//! Batched relation hydration for already-loaded records.
//!
//! Tether fills the relation slots of a batch of entities with one fetch per
//! relation, never one per entity:
//! - Relations are declared in a catalog passed to the engine, not in a global registry
//! - Four relation shapes: owning, non-owning, and both sides of many-to-many
//! - Query hooks narrow a fetch without being able to drop its correlation
//! - Any store can be plugged in behind the `FetchBackend` trait
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tether::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tether::QueryError> {
//!     let catalog = SchemaCatalog::new().with_relation(
//!         RelationDescriptor::one_to_many("orders", "User", "Order")
//!             .table("orders")
//!             .inverse(InverseRelation::new("user", "Order").join_column("user_id", "id")),
//!     )?;
//!     let hydrator = Hydrator::new(catalog, my_backend());
//!
//!     let mut users = load_users().await?;
//!     hydrator
//!         .hydrate(&mut users, [
//!             RelationSpec::new("profile"),
//!             RelationSpec::with_query("orders", |r| r.order_by(OrderByField::desc("id"))),
//!         ])
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The hydration engine and its vocabulary.
pub mod query {
    pub use tether_query::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tether_query::prelude::*;
}

// Re-export key types at the crate root
pub use tether_query::{
    Catalog, DynamicEntity, Entity, FetchBackend, Filter, FilterValue, HydrateConfig,
    HydrateReport, Hydrator, MemoryBackend, QueryError, QueryResult, Record, Related,
    RelationSpec, SchemaCatalog,
};
