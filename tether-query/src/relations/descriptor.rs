//! Relation metadata supplied by a catalog.

use std::fmt;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::{QueryError, QueryResult};
use crate::record::FetchedRow;
use crate::request::FetchRequest;

use super::kind::{RelationKind, RelationType};

/// A (local column, referenced column) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinColumn {
    /// Column on the side that declares the join.
    pub column: String,
    /// Column it references on the other side.
    pub referenced_column: String,
}

impl JoinColumn {
    /// Create a join column pair.
    pub fn new(column: impl Into<String>, referenced_column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            referenced_column: referenced_column.into(),
        }
    }
}

/// Junction table of a many-to-many relation, described from its owning side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionTable {
    /// Name of the junction table.
    pub table: String,
    /// Junction columns referencing the owning model.
    pub join_columns: Vec<JoinColumn>,
    /// Junction columns referencing the other model.
    pub inverse_join_columns: Vec<JoinColumn>,
}

impl JunctionTable {
    /// Create a junction table with no columns.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            join_columns: Vec::new(),
            inverse_join_columns: Vec::new(),
        }
    }

    /// Add a junction column referencing the owning model.
    pub fn join_column(mut self, column: impl Into<String>, referenced: impl Into<String>) -> Self {
        self.join_columns.push(JoinColumn::new(column, referenced));
        self
    }

    /// Add a junction column referencing the other model.
    pub fn inverse_join_column(
        mut self,
        column: impl Into<String>,
        referenced: impl Into<String>,
    ) -> Self {
        self.inverse_join_columns.push(JoinColumn::new(column, referenced));
        self
    }

    fn is_complete(&self) -> bool {
        !self.join_columns.is_empty() && !self.inverse_join_columns.is_empty()
    }
}

/// The reciprocal side of a relation, as declared on the target model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseRelation {
    /// Relation name on the target model.
    pub name: String,
    /// The target model.
    pub model: String,
    /// Join columns of the inverse side; `column` lives on the target model.
    pub join_columns: Vec<JoinColumn>,
    /// Junction metadata, when the inverse side owns a many-to-many.
    pub junction: Option<JunctionTable>,
}

impl InverseRelation {
    /// Create an inverse relation with no join metadata.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            join_columns: Vec::new(),
            junction: None,
        }
    }

    /// Add a join column (`column` on the target model, `referenced` on the source).
    pub fn join_column(mut self, column: impl Into<String>, referenced: impl Into<String>) -> Self {
        self.join_columns.push(JoinColumn::new(column, referenced));
        self
    }

    /// Set the junction table owned by the inverse side.
    pub fn junction(mut self, junction: JunctionTable) -> Self {
        self.junction = Some(junction);
        self
    }
}

/// How one model's relation correlates with another model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Relation name (the slot written on source entities).
    pub name: String,
    /// Structural shape of the relation.
    pub kind: RelationKind,
    /// Model declaring the relation.
    pub source_model: String,
    /// Model reachable through the relation.
    pub target_model: String,
    /// Table storing the target model.
    pub target_table: String,
    /// Owning-side join columns; `column` lives on the source model.
    pub join_columns: Vec<JoinColumn>,
    /// The reciprocal side.
    pub inverse: Option<InverseRelation>,
    /// Junction table, when this side owns a many-to-many.
    pub junction: Option<JunctionTable>,
}

impl RelationDescriptor {
    /// Create a descriptor; the target table defaults to the target model name.
    pub fn new(
        name: impl Into<String>,
        kind: RelationKind,
        source_model: impl Into<String>,
        target_model: impl Into<String>,
    ) -> Self {
        let target_model = target_model.into();
        Self {
            name: name.into(),
            kind,
            source_model: source_model.into(),
            target_table: target_model.clone(),
            target_model,
            join_columns: Vec::new(),
            inverse: None,
            junction: None,
        }
    }

    /// Create a descriptor from a declarative relation type and ownership.
    pub fn from_type(
        name: impl Into<String>,
        relation_type: RelationType,
        is_owner: bool,
        source_model: impl Into<String>,
        target_model: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            RelationKind::classify(relation_type, is_owner),
            source_model,
            target_model,
        )
    }

    /// Many-to-one relation; add its foreign key with [`join_column`](Self::join_column).
    pub fn many_to_one(
        name: impl Into<String>,
        source_model: impl Into<String>,
        target_model: impl Into<String>,
    ) -> Self {
        Self::new(name, RelationKind::ManyToOneOrOneToOneOwning, source_model, target_model)
    }

    /// One-to-many relation; describe the foreign key with [`inverse`](Self::inverse).
    pub fn one_to_many(
        name: impl Into<String>,
        source_model: impl Into<String>,
        target_model: impl Into<String>,
    ) -> Self {
        Self::new(name, RelationKind::OneToManyOrOneToOneNonOwning, source_model, target_model)
    }

    /// Owning many-to-many relation; describe the junction with [`junction`](Self::junction).
    pub fn many_to_many(
        name: impl Into<String>,
        source_model: impl Into<String>,
        target_model: impl Into<String>,
    ) -> Self {
        Self::new(name, RelationKind::ManyToManyOwning, source_model, target_model)
    }

    /// Inverse many-to-many relation; the junction is taken from the inverse side.
    pub fn many_to_many_inverse(
        name: impl Into<String>,
        source_model: impl Into<String>,
        target_model: impl Into<String>,
    ) -> Self {
        Self::new(name, RelationKind::ManyToManyNonOwning, source_model, target_model)
    }

    /// Set the target table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.target_table = table.into();
        self
    }

    /// Add an owning-side join column (`column` on the source, `referenced` on the target).
    pub fn join_column(mut self, column: impl Into<String>, referenced: impl Into<String>) -> Self {
        self.join_columns.push(JoinColumn::new(column, referenced));
        self
    }

    /// Set the reciprocal side.
    pub fn inverse(mut self, inverse: InverseRelation) -> Self {
        self.inverse = Some(inverse);
        self
    }

    /// Set the junction table owned by this side.
    pub fn junction(mut self, junction: JunctionTable) -> Self {
        self.junction = Some(junction);
        self
    }

    /// Junction metadata for this relation, from this side or the inverse side.
    pub fn junction_table(&self) -> Option<&JunctionTable> {
        self.junction
            .as_ref()
            .or_else(|| self.inverse.as_ref().and_then(|inv| inv.junction.as_ref()))
    }

    pub(crate) fn misconfigured(&self, reason: impl Into<String>) -> QueryError {
        QueryError::invalid_descriptor(&self.source_model, &self.name, reason)
    }

    /// Check that the metadata required by the kind is present.
    pub fn validate(&self) -> QueryResult<()> {
        match self.kind {
            RelationKind::ManyToOneOrOneToOneOwning => {
                if self.join_columns.is_empty() {
                    return Err(self.misconfigured("owning relation has no join columns"));
                }
            }
            RelationKind::OneToManyOrOneToOneNonOwning => match self.inverse {
                None => return Err(self.misconfigured("non-owning relation has no inverse side")),
                Some(ref inverse) if inverse.join_columns.is_empty() => {
                    return Err(self.misconfigured("inverse side has no join columns"));
                }
                Some(_) => {}
            },
            RelationKind::ManyToManyOwning => match self.junction {
                None => return Err(self.misconfigured("many-to-many relation has no junction table")),
                Some(ref junction) if !junction.is_complete() => {
                    return Err(self.misconfigured("junction table is missing join columns"));
                }
                Some(_) => {}
            },
            RelationKind::ManyToManyNonOwning => match self.junction_table() {
                None => return Err(self.misconfigured("many-to-many relation has no junction table")),
                Some(junction) if !junction.is_complete() => {
                    return Err(self.misconfigured("junction table is missing join columns"));
                }
                Some(_) => {}
            },
        }
        Ok(())
    }
}

/// Extra per-column predicate evaluated during assignment.
pub type ExtraMatch = Arc<dyn Fn(&dyn Entity, &FetchedRow, &JoinColumn) -> bool + Send + Sync>;

/// Request augmentation that may inspect the source batch.
pub type QueryAugment = Arc<dyn Fn(FetchRequest, &[&dyn Entity]) -> FetchRequest + Send + Sync>;

/// Optional behavior attached to a relation by the catalog.
#[derive(Clone)]
pub struct RelationCondition {
    extra_match: Option<ExtraMatch>,
    query_augment: Option<QueryAugment>,
    is_collection: bool,
}

impl RelationCondition {
    /// A condition with no predicate, no augmentation, collection slots.
    pub fn new() -> Self {
        Self {
            extra_match: None,
            query_augment: None,
            is_collection: true,
        }
    }

    /// Add an extra match predicate.
    pub fn with_match<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Entity, &FetchedRow, &JoinColumn) -> bool + Send + Sync + 'static,
    {
        self.extra_match = Some(Arc::new(f));
        self
    }

    /// Add a request augmentation.
    pub fn with_query<F>(mut self, f: F) -> Self
    where
        F: Fn(FetchRequest, &[&dyn Entity]) -> FetchRequest + Send + Sync + 'static,
    {
        self.query_augment = Some(Arc::new(f));
        self
    }

    /// Collapse collection slots to their first element.
    pub fn single(mut self) -> Self {
        self.is_collection = false;
        self
    }

    /// Whether collection slots are kept as collections.
    pub fn is_collection(&self) -> bool {
        self.is_collection
    }

    /// Check if a request augmentation is configured.
    pub fn has_query(&self) -> bool {
        self.query_augment.is_some()
    }

    /// Evaluate the extra predicate; true when none is configured.
    pub fn matches(&self, entity: &dyn Entity, row: &FetchedRow, column: &JoinColumn) -> bool {
        self.extra_match
            .as_ref()
            .is_none_or(|extra| extra(entity, row, column))
    }

    /// Apply the request augmentation, if any.
    pub fn augment(&self, request: FetchRequest, entities: &[&dyn Entity]) -> FetchRequest {
        match self.query_augment {
            Some(ref augment) => augment(request, entities),
            None => request,
        }
    }
}

impl Default for RelationCondition {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RelationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationCondition")
            .field("extra_match", &self.extra_match.is_some())
            .field("query_augment", &self.query_augment.is_some())
            .field("is_collection", &self.is_collection)
            .finish()
    }
}
