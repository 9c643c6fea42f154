//! Relation kinds and the fetch/assign strategies they select.

use std::fmt;

/// Declarative type of a relation, as written in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// One-to-one relation (e.g., User has one Profile).
    OneToOne,
    /// One-to-many relation (e.g., User has many Orders).
    OneToMany,
    /// Many-to-one relation (e.g., Order belongs to User).
    ManyToOne,
    /// Many-to-many relation (e.g., Post has many Tags).
    ManyToMany,
}

impl RelationType {
    /// Check if this relation returns multiple records.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    /// Check if this relation returns a single record.
    pub fn is_one(&self) -> bool {
        matches!(self, Self::OneToOne | Self::ManyToOne)
    }
}

/// Structural shape of a relation; fully determines how it is fetched and assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// The source row holds the foreign key (many-to-one, owning one-to-one).
    ManyToOneOrOneToOneOwning,
    /// The target rows hold the foreign key (one-to-many, inverse one-to-one).
    OneToManyOrOneToOneNonOwning,
    /// Many-to-many declared on the side that owns the junction table.
    ManyToManyOwning,
    /// Many-to-many declared on the inverse side.
    ManyToManyNonOwning,
}

impl RelationKind {
    /// Map a declarative relation type and ownership onto a kind.
    ///
    /// Many-to-one is always owning and one-to-many never is, so `is_owner`
    /// only matters for one-to-one and many-to-many.
    pub fn classify(relation_type: RelationType, is_owner: bool) -> Self {
        match (relation_type, is_owner) {
            (RelationType::ManyToOne, _) | (RelationType::OneToOne, true) => {
                Self::ManyToOneOrOneToOneOwning
            }
            (RelationType::OneToMany, _) | (RelationType::OneToOne, false) => {
                Self::OneToManyOrOneToOneNonOwning
            }
            (RelationType::ManyToMany, true) => Self::ManyToManyOwning,
            (RelationType::ManyToMany, false) => Self::ManyToManyNonOwning,
        }
    }

    /// The fetch and assign strategies for this kind.
    pub const fn strategies(self) -> (FetchStrategy, AssignStrategy) {
        match self {
            Self::ManyToOneOrOneToOneOwning => {
                (FetchStrategy::ReferencedColumns, AssignStrategy::FirstMatch)
            }
            Self::OneToManyOrOneToOneNonOwning => {
                (FetchStrategy::InverseJoinColumns, AssignStrategy::AllMatches)
            }
            Self::ManyToManyOwning => (FetchStrategy::JunctionOwning, AssignStrategy::JunctionMatches),
            Self::ManyToManyNonOwning => {
                (FetchStrategy::JunctionInverse, AssignStrategy::JunctionMatches)
            }
        }
    }

    /// Check if the declaring side holds the join columns.
    pub fn is_owning(self) -> bool {
        matches!(self, Self::ManyToOneOrOneToOneOwning | Self::ManyToManyOwning)
    }

    /// Check if rows are correlated through a junction table.
    pub fn uses_junction(self) -> bool {
        matches!(self, Self::ManyToManyOwning | Self::ManyToManyNonOwning)
    }

    /// Stable name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManyToOneOrOneToOneOwning => "many_to_one_or_one_to_one_owning",
            Self::OneToManyOrOneToOneNonOwning => "one_to_many_or_one_to_one_non_owning",
            Self::ManyToManyOwning => "many_to_many_owning",
            Self::ManyToManyNonOwning => "many_to_many_non_owning",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the batched request is scoped to the source entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Target referenced columns IN the sources' own join column values.
    ReferencedColumns,
    /// Target foreign key columns (from the inverse side) IN the sources' referenced values.
    InverseJoinColumns,
    /// Junction columns named by the descriptor's own junction metadata.
    JunctionOwning,
    /// Junction columns named by the inverse side's junction metadata.
    JunctionInverse,
}

/// How fetched rows are written back onto entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignStrategy {
    /// First matching row into a scalar slot.
    FirstMatch,
    /// All matching rows into a collection slot.
    AllMatches,
    /// All rows whose junction rows reference the entity, junction payload stripped.
    JunctionMatches,
}
