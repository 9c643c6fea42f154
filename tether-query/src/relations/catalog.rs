//! Relation metadata lookup.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{QueryError, QueryResult};

use super::descriptor::{RelationCondition, RelationDescriptor};

/// Read-only source of relation descriptors and conditions.
pub trait Catalog: Send + Sync {
    /// Resolve a relation declared on `model`.
    fn resolve_relation(&self, model: &str, relation: &str) -> QueryResult<Arc<RelationDescriptor>>;

    /// Resolve the condition attached to a relation, if any.
    fn resolve_condition(&self, model: &str, relation: &str) -> Option<Arc<RelationCondition>>;
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn resolve_relation(&self, model: &str, relation: &str) -> QueryResult<Arc<RelationDescriptor>> {
        (**self).resolve_relation(model, relation)
    }

    fn resolve_condition(&self, model: &str, relation: &str) -> Option<Arc<RelationCondition>> {
        (**self).resolve_condition(model, relation)
    }
}

#[derive(Debug, Default)]
struct ModelRelations {
    relations: IndexMap<String, Arc<RelationDescriptor>>,
    conditions: HashMap<String, Arc<RelationCondition>>,
}

/// In-memory catalog keyed by model then relation name.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    models: HashMap<String, ModelRelations>,
}

impl SchemaCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation on its source model, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: RelationDescriptor) -> QueryResult<()> {
        descriptor.validate()?;
        self.models
            .entry(descriptor.source_model.clone())
            .or_default()
            .relations
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Register a relation (builder style).
    pub fn with_relation(mut self, descriptor: RelationDescriptor) -> QueryResult<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Attach a condition to an already registered relation.
    pub fn register_condition(
        &mut self,
        model: &str,
        relation: &str,
        condition: RelationCondition,
    ) -> QueryResult<()> {
        let entry = self
            .models
            .get_mut(model)
            .filter(|m| m.relations.contains_key(relation))
            .ok_or_else(|| QueryError::relation_not_found(model, relation))?;
        entry
            .conditions
            .insert(relation.to_string(), Arc::new(condition));
        Ok(())
    }

    /// Get a registered relation.
    pub fn get(&self, model: &str, relation: &str) -> Option<&Arc<RelationDescriptor>> {
        self.models.get(model)?.relations.get(relation)
    }

    /// Relations declared on `model`, in registration order.
    pub fn relations(&self, model: &str) -> impl Iterator<Item = &RelationDescriptor> {
        self.models
            .get(model)
            .into_iter()
            .flat_map(|m| m.relations.values().map(AsRef::as_ref))
    }

    /// Models with at least one registered relation.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Total number of registered relations.
    pub fn len(&self) -> usize {
        self.models.values().map(|m| m.relations.len()).sum()
    }

    /// Check if no relation is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Catalog for SchemaCatalog {
    fn resolve_relation(&self, model: &str, relation: &str) -> QueryResult<Arc<RelationDescriptor>> {
        self.get(model, relation)
            .cloned()
            .ok_or_else(|| QueryError::relation_not_found(model, relation))
    }

    fn resolve_condition(&self, model: &str, relation: &str) -> Option<Arc<RelationCondition>> {
        self.models.get(model)?.conditions.get(relation).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::descriptor::InverseRelation;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new()
            .with_relation(
                RelationDescriptor::one_to_many("orders", "User", "Order")
                    .table("orders")
                    .inverse(InverseRelation::new("user", "Order").join_column("user_id", "id")),
            )
            .and_then(|c| {
                c.with_relation(
                    RelationDescriptor::many_to_one("user", "Order", "User")
                        .table("users")
                        .join_column("user_id", "id"),
                )
            })
            .unwrap()
    }

    #[test]
    fn test_resolve_relation() {
        let catalog = catalog();
        let orders = catalog.resolve_relation("User", "orders").unwrap();
        assert_eq!(orders.target_table, "orders");
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.relations("User").map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["orders"]
        );
    }

    #[test]
    fn test_resolve_unknown_relation() {
        let catalog = catalog();
        let err = catalog.resolve_relation("User", "invoices").unwrap_err();
        assert!(err.is_relation_not_found());
        assert!(catalog.resolve_relation("Nope", "orders").is_err());
    }

    #[test]
    fn test_register_rejects_invalid_descriptor() {
        let mut catalog = SchemaCatalog::new();
        let err = catalog
            .register(RelationDescriptor::many_to_many("tags", "Post", "Tag"))
            .unwrap_err();
        assert!(err.is_invalid_descriptor());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_conditions() {
        let mut catalog = catalog();
        assert!(catalog.resolve_condition("User", "orders").is_none());

        catalog
            .register_condition("User", "orders", RelationCondition::new().single())
            .unwrap();
        let condition = catalog.resolve_condition("User", "orders").unwrap();
        assert!(!condition.is_collection());

        let err = catalog
            .register_condition("User", "invoices", RelationCondition::new())
            .unwrap_err();
        assert!(err.is_relation_not_found());
    }

    #[test]
    fn test_shared_catalog() {
        let shared = Arc::new(catalog());
        assert!(shared.resolve_relation("Order", "user").is_ok());
    }
}
