//! The hydration pipeline: lookup, classify, fetch, assign.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::backend::FetchBackend;
use crate::config::HydrateConfig;
use crate::entity::Entity;
use crate::error::QueryResult;
use crate::request::{FetchRequest, QueryHook};

use super::assign::assign;
use super::catalog::Catalog;
use super::descriptor::RelationCondition;
use super::fetch::{FetchPlan, build_request};
use super::kind::RelationKind;
use super::spec::{IntoRelationSpecs, RelationSpec};

/// Summary of one hydrated relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationReport {
    /// Relation name.
    pub relation: String,
    /// Kind the relation was classified as.
    pub kind: RelationKind,
    /// Rows returned by the fetch.
    pub rows_fetched: usize,
    /// Entities that received at least one row.
    pub entities_matched: usize,
    /// Time spent in the backend.
    pub elapsed: Duration,
}

/// Summary of a [`Hydrator::hydrate`] call, one entry per relation in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrateReport {
    /// Per-relation summaries.
    pub relations: Vec<RelationReport>,
}

impl HydrateReport {
    /// Summary for `relation`, if it was hydrated.
    pub fn get(&self, relation: &str) -> Option<&RelationReport> {
        self.relations.iter().find(|r| r.relation == relation)
    }

    /// Number of fetch requests issued.
    pub fn requests(&self) -> usize {
        self.relations.len()
    }

    /// Total rows fetched across relations.
    pub fn rows_fetched(&self) -> usize {
        self.relations.iter().map(|r| r.rows_fetched).sum()
    }

    /// Check if nothing was hydrated.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// A resolved relation with its request built.
struct Prepared {
    kind: RelationKind,
    condition: Option<Arc<RelationCondition>>,
    plan: FetchPlan,
}

/// Fills relation slots on batches of entities, one fetch per relation.
///
/// ```rust,ignore
/// let hydrator = Hydrator::new(catalog, backend);
///
/// hydrator
///     .hydrate(&mut users, [
///         RelationSpec::new("profile"),
///         RelationSpec::with_query("orders", |r| r.order_by(OrderByField::desc("created_at"))),
///     ])
///     .await?;
/// ```
#[derive(Debug)]
pub struct Hydrator<C, B> {
    catalog: C,
    backend: B,
    config: HydrateConfig,
}

impl<C: Catalog, B: FetchBackend> Hydrator<C, B> {
    /// Create a hydrator with default settings.
    pub fn new(catalog: C, backend: B) -> Self {
        Self {
            catalog,
            backend,
            config: HydrateConfig::default(),
        }
    }

    /// Replace the settings.
    pub fn with_config(mut self, config: HydrateConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the catalog.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Get the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the settings.
    pub fn config(&self) -> &HydrateConfig {
        &self.config
    }

    /// Hydrate each relation in `specs`, strictly in order.
    ///
    /// An empty batch is a no-op. The first failure aborts the call; relations
    /// hydrated before it keep their assignments and later ones are never
    /// fetched.
    pub async fn hydrate<E: Entity>(
        &self,
        entities: &mut [E],
        specs: impl IntoRelationSpecs,
    ) -> QueryResult<HydrateReport> {
        let mut report = HydrateReport::default();
        if entities.is_empty() {
            debug!("Empty batch, nothing to hydrate");
            return Ok(report);
        }

        for spec in specs.into_specs() {
            if let Some(summary) = self.load(entities, spec.name(), spec.custom_query()).await? {
                report.relations.push(summary);
            }
        }
        Ok(report)
    }

    /// Hydrate relations on a single entity.
    pub async fn hydrate_one<E: Entity>(
        &self,
        entity: &mut E,
        specs: impl IntoRelationSpecs,
    ) -> QueryResult<HydrateReport> {
        self.hydrate(std::slice::from_mut(entity), specs).await
    }

    /// Run the pipeline for one relation; `None` when the batch is empty.
    ///
    /// Either every entity's slot is written or, on failure, none is.
    pub async fn load<E: Entity>(
        &self,
        entities: &mut [E],
        relation: &str,
        custom: Option<&QueryHook>,
    ) -> QueryResult<Option<RelationReport>> {
        let Some(Prepared {
            kind,
            condition,
            plan,
        }) = self.prepare(entities, relation, custom)?
        else {
            return Ok(None);
        };
        let (_, assign_strategy) = kind.strategies();

        if self.config.log_requests {
            let (sql, params) = plan.request.to_sql();
            debug!(relation, sql = %sql, params = ?params, "Fetch request built");
        }

        let started = Instant::now();
        let rows = self.backend.fetch(&plan.request).await?;
        let elapsed = started.elapsed();

        if elapsed >= self.config.slow_fetch_threshold() {
            warn!(
                relation,
                backend = self.backend.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.config.slow_fetch_threshold_ms,
                "Slow relation fetch"
            );
        }
        debug!(relation, rows = rows.len(), elapsed_ms = elapsed.as_millis() as u64, "Rows fetched");

        let matched = assign(
            entities,
            relation,
            assign_strategy,
            &plan.correlation,
            condition.as_deref(),
            &rows,
        );
        debug!(relation, entities = entities.len(), matched, "Relation assigned");

        Ok(Some(RelationReport {
            relation: relation.to_string(),
            kind,
            rows_fetched: rows.len(),
            entities_matched: matched,
            elapsed,
        }))
    }

    /// Build the request `load` would execute, without executing it.
    pub fn plan<E: Entity>(
        &self,
        entities: &[E],
        spec: impl Into<RelationSpec>,
    ) -> QueryResult<Option<FetchRequest>> {
        let spec = spec.into();
        Ok(self
            .prepare(entities, spec.name(), spec.custom_query())?
            .map(|prepared| prepared.plan.request))
    }

    fn prepare<E: Entity>(
        &self,
        entities: &[E],
        relation: &str,
        custom: Option<&QueryHook>,
    ) -> QueryResult<Option<Prepared>> {
        let Some(first) = entities.first() else {
            return Ok(None);
        };
        let model = first.model_name();

        let descriptor = self.catalog.resolve_relation(model, relation)?;
        descriptor.validate()?;
        let condition = self.catalog.resolve_condition(model, relation);
        let (fetch_strategy, _) = descriptor.kind.strategies();
        debug!(
            model,
            relation,
            kind = %descriptor.kind,
            entities = entities.len(),
            "Resolved relation"
        );

        let plan = build_request(
            &descriptor,
            fetch_strategy,
            condition.as_deref(),
            entities,
            custom,
        )?;
        Ok(Some(Prepared {
            kind: descriptor.kind,
            condition,
            plan,
        }))
    }
}
