//! Writing fetched rows back onto the entities that correlate to them.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::filter::{FilterValue, ValueKey};
use crate::record::{FetchedRow, Record, Related};

use super::descriptor::RelationCondition;
use super::fetch::Correlation;
use super::kind::AssignStrategy;

/// Row positions keyed by the value of the first correlated column.
///
/// Positions are kept in fetch order so assigned collections follow the
/// order the backend returned them in.
struct RowIndex {
    positions: HashMap<ValueKey, Vec<usize>>,
}

impl RowIndex {
    fn build(rows: &[FetchedRow], correlation: &Correlation) -> Self {
        let mut positions: HashMap<ValueKey, Vec<usize>> = HashMap::new();
        let Some(first) = correlation.columns.first() else {
            return Self { positions };
        };

        for (idx, row) in rows.iter().enumerate() {
            let mut add = |value: &FilterValue| {
                if let Some(key) = value.key() {
                    let slot = positions.entry(key).or_default();
                    if slot.last() != Some(&idx) {
                        slot.push(idx);
                    }
                }
            };
            match correlation.junction_table {
                Some(ref table) => row
                    .junction_rows(table)
                    .iter()
                    .for_each(|j| add(j.value(&first.row_column))),
                None => add(row.value(&first.row_column)),
            }
        }

        Self { positions }
    }

    fn candidates(&self, value: &FilterValue) -> &[usize] {
        value
            .key()
            .and_then(|key| self.positions.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Check every correlated column (and the extra predicate) for one candidate.
fn row_matches(
    entity: &dyn Entity,
    values: &[FilterValue],
    row: &FetchedRow,
    correlation: &Correlation,
    condition: Option<&RelationCondition>,
) -> bool {
    correlation.columns.iter().zip(values).all(|(column, value)| {
        let linked = match correlation.junction_table {
            Some(ref table) => row
                .junction_rows(table)
                .iter()
                .any(|j| j.value(&column.row_column).correlates_with(value)),
            None => row.value(&column.row_column).correlates_with(value),
        };
        linked && condition.is_none_or(|c| c.matches(entity, row, &column.join_column))
    })
}

/// Write the relation slot of every entity; returns how many got at least one row.
///
/// Each entity's slot is written exactly once, including entities without
/// matches. Junction payloads never reach an entity.
pub(crate) fn assign<E: Entity>(
    entities: &mut [E],
    relation: &str,
    strategy: AssignStrategy,
    correlation: &Correlation,
    condition: Option<&RelationCondition>,
    rows: &[FetchedRow],
) -> usize {
    let index = RowIndex::build(rows, correlation);
    let is_collection = condition.is_none_or(RelationCondition::is_collection);
    let mut matched = 0;

    for entity in entities.iter_mut() {
        let values: Vec<FilterValue> = correlation
            .columns
            .iter()
            .map(|c| entity.get_column(&c.entity_column))
            .collect();

        let records: Vec<Record> = match values.first() {
            Some(first) => index
                .candidates(first)
                .iter()
                .map(|&idx| &rows[idx])
                .filter(|row| row_matches(&*entity, &values, row, correlation, condition))
                .map(|row| row.record.clone())
                .collect(),
            None => Vec::new(),
        };

        if !records.is_empty() {
            matched += 1;
        }

        let related = match strategy {
            AssignStrategy::FirstMatch => Related::One(records.into_iter().next()),
            AssignStrategy::AllMatches | AssignStrategy::JunctionMatches if !is_collection => {
                Related::Many(records).into_single()
            }
            AssignStrategy::AllMatches | AssignStrategy::JunctionMatches => Related::Many(records),
        };
        entity.set_relation(relation, related);
    }

    matched
}
