//! Relation hydration for already-loaded entities.
//!
//! Given a batch of entities and a relation name, the [`Hydrator`] looks the
//! relation up in a [`Catalog`], classifies it into one of four
//! [`RelationKind`]s, issues exactly one fetch for the whole batch and writes
//! the matching rows back onto every entity's relation slot.
//!
//! ## Example
//!
//! ```rust,ignore
//! let catalog = SchemaCatalog::new().with_relation(
//!     RelationDescriptor::one_to_many("orders", "User", "Order")
//!         .table("orders")
//!         .inverse(InverseRelation::new("user", "Order").join_column("user_id", "id")),
//! )?;
//!
//! let hydrator = Hydrator::new(catalog, backend);
//! hydrator.hydrate(&mut users, "orders").await?;
//! ```

mod assign;
mod catalog;
mod descriptor;
mod fetch;
mod hydrator;
mod kind;
mod spec;

pub use catalog::{Catalog, SchemaCatalog};
pub use descriptor::{
    ExtraMatch, InverseRelation, JoinColumn, JunctionTable, QueryAugment, RelationCondition,
    RelationDescriptor,
};
pub use hydrator::{HydrateReport, Hydrator, RelationReport};
pub use kind::{AssignStrategy, FetchStrategy, RelationKind, RelationType};
pub use spec::{IntoRelationSpecs, RelationSpec};
