//! Batched fetch construction, one request per relation.

use indexmap::IndexSet;

use crate::entity::Entity;
use crate::error::QueryResult;
use crate::filter::{Filter, FilterValue};
use crate::request::{FetchRequest, HookChain, JoinOn, JunctionJoin, QueryHook};

use super::descriptor::{JoinColumn, RelationCondition, RelationDescriptor};
use super::kind::FetchStrategy;

/// One column pair used to correlate fetched rows back to entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CorrelatedColumn {
    /// Column read from each source entity.
    pub entity_column: String,
    /// Column read from the fetched row, or from its junction rows.
    pub row_column: String,
    /// The catalog's join column, as handed to `extra_match`.
    pub join_column: JoinColumn,
}

/// How fetched rows map back to the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Correlation {
    pub columns: Vec<CorrelatedColumn>,
    /// Set when `row_column`s live on the junction rows of this table.
    pub junction_table: Option<String>,
}

/// A built request and the correlation needed to assign its rows.
#[derive(Debug)]
pub(crate) struct FetchPlan {
    pub request: FetchRequest,
    pub correlation: Correlation,
}

/// Build the single request for `descriptor` over the whole batch.
///
/// The condition's augmentation runs before the caller's hook.
pub(crate) fn build_request<E: Entity>(
    descriptor: &RelationDescriptor,
    strategy: FetchStrategy,
    condition: Option<&RelationCondition>,
    entities: &[E],
    custom: Option<&QueryHook>,
) -> QueryResult<FetchPlan> {
    let (request, correlation) = match strategy {
        FetchStrategy::ReferencedColumns => {
            let columns = descriptor
                .join_columns
                .iter()
                .map(|jc| CorrelatedColumn {
                    entity_column: jc.column.clone(),
                    row_column: jc.referenced_column.clone(),
                    join_column: jc.clone(),
                })
                .collect();
            direct(descriptor, columns, entities)
        }
        FetchStrategy::InverseJoinColumns => {
            let inverse = descriptor
                .inverse
                .as_ref()
                .ok_or_else(|| descriptor.misconfigured("non-owning relation has no inverse side"))?;
            let columns = inverse
                .join_columns
                .iter()
                .map(|jc| CorrelatedColumn {
                    entity_column: jc.referenced_column.clone(),
                    row_column: jc.column.clone(),
                    join_column: jc.clone(),
                })
                .collect();
            direct(descriptor, columns, entities)
        }
        FetchStrategy::JunctionOwning => {
            let junction = descriptor
                .junction
                .as_ref()
                .ok_or_else(|| descriptor.misconfigured("many-to-many relation has no junction table"))?;
            through_junction(
                descriptor,
                &junction.table,
                &junction.join_columns,
                &junction.inverse_join_columns,
                entities,
            )
        }
        FetchStrategy::JunctionInverse => {
            let junction = descriptor
                .junction_table()
                .ok_or_else(|| descriptor.misconfigured("many-to-many relation has no junction table"))?;
            through_junction(
                descriptor,
                &junction.table,
                &junction.inverse_join_columns,
                &junction.join_columns,
                entities,
            )
        }
    };

    if correlation.columns.is_empty() {
        return Err(descriptor.misconfigured("relation has no join columns"));
    }

    let refs: Vec<&dyn Entity> = entities.iter().map(|e| e as &dyn Entity).collect();
    let mut chain = HookChain::new();
    if let Some(condition) = condition.filter(|c| c.has_query()) {
        chain.push(|request| condition.augment(request, &refs));
    }
    if let Some(custom) = custom {
        chain.push(move |request| custom(request));
    }

    Ok(FetchPlan {
        request: chain.apply(request),
        correlation,
    })
}

/// Target rows are correlated on their own columns.
fn direct<E: Entity>(
    descriptor: &RelationDescriptor,
    columns: Vec<CorrelatedColumn>,
    entities: &[E],
) -> (FetchRequest, Correlation) {
    let filter = Filter::and(columns.iter().map(|c| {
        Filter::In(
            c.row_column.clone(),
            correlation_values(entities, &c.entity_column),
        )
    }));
    let request = FetchRequest::new(
        &descriptor.target_model,
        &descriptor.target_table,
        &descriptor.name,
        filter,
    );
    (
        request,
        Correlation {
            columns,
            junction_table: None,
        },
    )
}

/// Target rows are correlated through junction rows.
///
/// `local` junction columns reference the source model, `remote` ones the target.
fn through_junction<E: Entity>(
    descriptor: &RelationDescriptor,
    table: &str,
    local: &[JoinColumn],
    remote: &[JoinColumn],
    entities: &[E],
) -> (FetchRequest, Correlation) {
    let on = remote
        .iter()
        .map(|jc| JoinOn {
            junction_column: jc.column.clone(),
            target_column: jc.referenced_column.clone(),
        })
        .collect();
    let junction_filter = Filter::and(local.iter().map(|jc| {
        Filter::In(
            jc.column.clone(),
            correlation_values(entities, &jc.referenced_column),
        )
    }));

    let request = FetchRequest::new(
        &descriptor.target_model,
        &descriptor.target_table,
        &descriptor.name,
        Filter::None,
    )
    .with_junction(JunctionJoin::new(table, on, junction_filter));

    let columns = local
        .iter()
        .map(|jc| CorrelatedColumn {
            entity_column: jc.referenced_column.clone(),
            row_column: jc.column.clone(),
            join_column: jc.clone(),
        })
        .collect();
    (
        request,
        Correlation {
            columns,
            junction_table: Some(table.to_string()),
        },
    )
}

/// Distinct non-null values of `column` across the batch, in first-seen order.
pub(crate) fn correlation_values<E: Entity>(entities: &[E], column: &str) -> Vec<FilterValue> {
    let mut seen = IndexSet::new();
    entities
        .iter()
        .map(|entity| entity.get_column(column))
        .filter(|value| match value.key() {
            None => false,
            Some(key) => seen.insert(key),
        })
        .collect()
}
