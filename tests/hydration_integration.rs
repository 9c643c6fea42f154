//! Integration tests for relation hydration.
//!
//! These tests drive the public API end to end with the in-memory backend:
//! - One fetch per relation regardless of batch size
//! - All four relation kinds
//! - Relation conditions and custom query hooks
//! - Error propagation and sequencing

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde::Deserialize;

use tether::query::{
    DynamicEntity, Entity, Filter, FilterValue, HydrateConfig, Hydrator, InverseRelation,
    JunctionTable, MemoryBackend, OrderByField, QueryError, Record, Related, RelationCondition,
    RelationDescriptor, RelationKind, RelationSpec, RelationType, SchemaCatalog,
};

// ============== Fixtures ==============

fn backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_table(
            "users",
            [
                Record::new("User").set("id", 1).set("name", "Ada"),
                Record::new("User").set("id", 2).set("name", "Grace"),
                Record::new("User").set("id", 3).set("name", "Linus"),
            ],
        )
        .with_table(
            "orders",
            [
                Record::new("Order").set("id", 10).set("user_id", 1).set("status", "paid"),
                Record::new("Order").set("id", 11).set("user_id", 1).set("status", "pending"),
                Record::new("Order").set("id", 12).set("user_id", 2).set("status", "paid"),
                Record::new("Order").set("id", 13).set("user_id", FilterValue::Null).set("status", "paid"),
            ],
        )
        .with_table(
            "profiles",
            [Record::new("Profile").set("id", 100).set("user_id", 1).set("bio", "Countess")],
        )
        .with_table(
            "posts",
            [
                Record::new("Post").set("id", 1).set("title", "Ownership"),
                Record::new("Post").set("id", 2).set("title", "Borrowing"),
            ],
        )
        .with_table(
            "tags",
            [
                Record::new("Tag").set("id", 100).set("label", "rust"),
                Record::new("Tag").set("id", 200).set("label", "sql"),
                Record::new("Tag").set("id", 300).set("label", "unused"),
            ],
        )
        .with_table(
            "post_tags",
            [
                Record::new("post_tags").set("post_id", 1).set("tag_id", 100),
                Record::new("post_tags").set("post_id", 1).set("tag_id", 200),
                Record::new("post_tags").set("post_id", 2).set("tag_id", 100),
            ],
        )
}

fn post_tags() -> JunctionTable {
    JunctionTable::new("post_tags")
        .join_column("post_id", "id")
        .inverse_join_column("tag_id", "id")
}

fn catalog() -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();
    catalog
        .register(
            RelationDescriptor::one_to_many("orders", "User", "Order")
                .table("orders")
                .inverse(InverseRelation::new("user", "Order").join_column("user_id", "id")),
        )
        .unwrap();
    catalog
        .register(
            RelationDescriptor::from_type("profile", RelationType::OneToOne, false, "User", "Profile")
                .table("profiles")
                .inverse(InverseRelation::new("user", "Profile").join_column("user_id", "id")),
        )
        .unwrap();
    catalog
        .register_condition("User", "profile", RelationCondition::new().single())
        .unwrap();
    catalog
        .register(
            RelationDescriptor::many_to_one("user", "Order", "User")
                .table("users")
                .join_column("user_id", "id"),
        )
        .unwrap();
    catalog
        .register(
            RelationDescriptor::many_to_many("tags", "Post", "Tag")
                .table("tags")
                .junction(post_tags()),
        )
        .unwrap();
    catalog
        .register(
            RelationDescriptor::many_to_many_inverse("posts", "Tag", "Post")
                .table("posts")
                .inverse(InverseRelation::new("tags", "Post").junction(post_tags())),
        )
        .unwrap();
    catalog
}

fn hydrator() -> Hydrator<SchemaCatalog, Arc<MemoryBackend>> {
    Hydrator::new(catalog(), Arc::new(backend()))
}

fn users(ids: &[i64]) -> Vec<DynamicEntity> {
    ids.iter().map(|&id| DynamicEntity::new("User").set("id", id)).collect()
}

fn ids(slot: Option<&Related>) -> Vec<i64> {
    slot.map(|related| {
        related
            .as_slice()
            .iter()
            .filter_map(|r| match r.value("id") {
                FilterValue::Int(id) => Some(*id),
                _ => None,
            })
            .collect()
    })
    .unwrap_or_default()
}

// ============== Batching and Completeness ==============

#[tokio::test]
async fn test_one_to_many_example() {
    let hydrator = hydrator();
    let mut users = users(&[1, 2]);

    let report = hydrator.hydrate(&mut users, "orders").await.unwrap();

    assert_eq!(ids(users[0].relation("orders")), vec![10, 11]);
    assert_eq!(ids(users[1].relation("orders")), vec![12]);

    let requests = hydrator.backend().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].correlation(), &Filter::is_in("user_id", [1, 2]));
    assert_eq!(
        requests[0].to_sql().0,
        "SELECT orders.* FROM orders AS orders WHERE orders.user_id IN ($1, $2)"
    );

    let summary = report.get("orders").unwrap();
    assert_eq!(summary.kind, RelationKind::OneToManyOrOneToOneNonOwning);
    assert_eq!(summary.rows_fetched, 3);
    assert_eq!(summary.entities_matched, 2);
}

#[tokio::test]
async fn test_single_request_regardless_of_batch_size() {
    let hydrator = hydrator();
    let ids_in_batch: Vec<i64> = (1..=200).map(|i| i % 5).collect();
    let mut users = users(&ids_in_batch);

    hydrator.hydrate(&mut users, "orders").await.unwrap();

    assert_eq!(hydrator.backend().request_count(), 1);
    assert_eq!(
        hydrator.backend().requests()[0].correlation(),
        &Filter::is_in("user_id", [1, 2, 3, 4, 0])
    );
}

#[tokio::test]
async fn test_duplicate_keys_are_always_removed() {
    let hydrator = Hydrator::new(catalog(), Arc::new(backend()))
        .with_config(HydrateConfig::default().log_requests(true));
    let mut users = users(&[1, 1, 2]);

    hydrator.hydrate(&mut users, "orders").await.unwrap();

    assert_eq!(
        hydrator.backend().requests()[0].correlation(),
        &Filter::is_in("user_id", [1, 2])
    );
    assert_eq!(ids(users[0].relation("orders")), vec![10, 11]);
    assert_eq!(ids(users[1].relation("orders")), vec![10, 11]);
    assert_eq!(ids(users[2].relation("orders")), vec![12]);
}

#[tokio::test]
async fn test_entities_without_matches_get_empty_slot() {
    let hydrator = hydrator();
    let mut users = users(&[3, 99]);

    let report = hydrator.hydrate(&mut users, "orders").await.unwrap();

    for user in &users {
        assert_eq!(user.relation("orders"), Some(&Related::Many(vec![])));
    }
    assert_eq!(report.get("orders").map(|r| r.entities_matched), Some(0));
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    let hydrator = hydrator();
    let mut none: Vec<DynamicEntity> = Vec::new();

    let report = hydrator
        .hydrate(&mut none, ["orders", "not_a_relation"])
        .await
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(hydrator.backend().request_count(), 0);
}

// ============== Relation Kinds ==============

#[tokio::test]
async fn test_many_to_one() {
    let hydrator = hydrator();
    let mut orders = vec![
        DynamicEntity::new("Order").set("id", 10).set("user_id", 1),
        DynamicEntity::new("Order").set("id", 12).set("user_id", 2),
        DynamicEntity::new("Order").set("id", 13).set("user_id", FilterValue::Null),
    ];

    hydrator.hydrate(&mut orders, "user").await.unwrap();

    let first = orders[0].relation("user").unwrap();
    assert!(first.is_one());
    assert_eq!(first.first().map(|u| u.value("name").clone()), Some("Ada".into()));
    assert_eq!(ids(orders[1].relation("user")), vec![2]);
    assert_eq!(orders[2].relation("user"), Some(&Related::One(None)));
    assert_eq!(
        hydrator.backend().requests()[0].correlation(),
        &Filter::is_in("id", [1, 2])
    );
}

#[tokio::test]
async fn test_one_to_one_non_owning_collapses() {
    let hydrator = hydrator();
    let mut users = users(&[1, 2]);

    hydrator.hydrate(&mut users, "profile").await.unwrap();

    let profile = users[0].relation("profile").unwrap();
    assert!(profile.is_one());
    assert_eq!(ids(Some(profile)), vec![100]);
    assert_eq!(users[1].relation("profile"), Some(&Related::One(None)));
}

#[tokio::test]
async fn test_many_to_many_owning_strips_junction() {
    let hydrator = hydrator();
    let mut posts = vec![
        DynamicEntity::new("Post").set("id", 1),
        DynamicEntity::new("Post").set("id", 2),
    ];

    hydrator.hydrate(&mut posts, "tags").await.unwrap();

    assert_eq!(
        posts[0].relation("tags"),
        Some(&Related::Many(vec![
            Record::new("Tag").set("id", 100).set("label", "rust"),
            Record::new("Tag").set("id", 200).set("label", "sql"),
        ]))
    );
    assert_eq!(ids(posts[1].relation("tags")), vec![100]);
    for record in posts.iter().flat_map(|p| p.relation("tags").unwrap().as_slice()) {
        assert!(record.get("post_id").is_none());
        assert!(record.get("tag_id").is_none());
    }

    let request = &hydrator.backend().requests()[0];
    let join = request.junction().unwrap();
    assert_eq!(join.table(), "post_tags");
    assert_eq!(join.correlation(), &Filter::is_in("post_id", [1, 2]));
}

#[tokio::test]
async fn test_many_to_many_non_owning() {
    let hydrator = hydrator();
    let mut tags = vec![
        DynamicEntity::new("Tag").set("id", 100),
        DynamicEntity::new("Tag").set("id", 200),
        DynamicEntity::new("Tag").set("id", 300),
    ];

    hydrator.hydrate(&mut tags, "posts").await.unwrap();

    assert_eq!(ids(tags[0].relation("posts")), vec![1, 2]);
    assert_eq!(ids(tags[1].relation("posts")), vec![1]);
    assert_eq!(tags[2].relation("posts"), Some(&Related::Many(vec![])));
    assert_eq!(hydrator.backend().request_count(), 1);
}

#[tokio::test]
async fn test_many_to_many_single_collapse() {
    let mut catalog = catalog();
    catalog
        .register_condition("Post", "tags", RelationCondition::new().single())
        .unwrap();
    let hydrator = Hydrator::new(catalog, Arc::new(backend()));
    let mut posts = vec![DynamicEntity::new("Post").set("id", 1)];

    hydrator
        .hydrate(&mut posts, RelationSpec::with_query("tags", |r| r.order_by(OrderByField::desc("id"))))
        .await
        .unwrap();

    let slot = posts[0].relation("tags").unwrap();
    assert!(slot.is_one());
    assert_eq!(ids(Some(slot)), vec![200]);
}

// ============== Conditions and Hooks ==============

#[tokio::test]
async fn test_custom_query_narrows_and_orders() {
    let hydrator = hydrator();
    let mut users = users(&[1, 2]);

    hydrator
        .hydrate(
            &mut users,
            RelationSpec::with_query("orders", |request| {
                request
                    .and_where(Filter::equals("status", "paid"))
                    .order_by(OrderByField::desc("id"))
            }),
        )
        .await
        .unwrap();

    assert_eq!(ids(users[0].relation("orders")), vec![10]);
    assert_eq!(ids(users[1].relation("orders")), vec![12]);

    let request = &hydrator.backend().requests()[0];
    assert_eq!(request.correlation(), &Filter::is_in("user_id", [1, 2]));
    assert_eq!(request.filters(), &[Filter::equals("status", "paid")]);
}

#[tokio::test]
async fn test_assignment_follows_fetch_order() {
    let hydrator = hydrator();
    let mut users = users(&[1]);

    hydrator
        .hydrate(&mut users, ("orders", |r: tether::query::FetchRequest| {
            r.order_by(OrderByField::desc("id"))
        }))
        .await
        .unwrap();

    assert_eq!(ids(users[0].relation("orders")), vec![11, 10]);
}

#[tokio::test]
async fn test_condition_augment_runs_before_custom_hook() {
    let mut catalog = catalog();
    catalog
        .register_condition(
            "User",
            "orders",
            RelationCondition::new().with_query(|request, entities| {
                request.take(entities.len() as u64)
            }),
        )
        .unwrap();
    let hydrator = Hydrator::new(catalog, Arc::new(backend()));
    let mut users = users(&[1, 2]);

    hydrator
        .hydrate(
            &mut users,
            RelationSpec::with_query("orders", |request| {
                let limit = request.limit().unwrap_or(0);
                request.take(limit + 1)
            }),
        )
        .await
        .unwrap();

    assert_eq!(hydrator.backend().requests()[0].limit(), Some(3));
}

#[tokio::test]
async fn test_extra_match_excludes_candidates() {
    let mut catalog = catalog();
    catalog
        .register_condition(
            "User",
            "orders",
            RelationCondition::new().with_match(|entity, row, column| {
                assert_eq!(column.column, "user_id");
                entity.get_column("id") == FilterValue::Int(2)
                    || row.value("status") == &FilterValue::String("pending".into())
            }),
        )
        .unwrap();
    let hydrator = Hydrator::new(catalog, Arc::new(backend()));
    let mut users = users(&[1, 2]);

    let report = hydrator.hydrate(&mut users, "orders").await.unwrap();

    assert_eq!(ids(users[0].relation("orders")), vec![11]);
    assert_eq!(ids(users[1].relation("orders")), vec![12]);
    assert_eq!(report.get("orders").map(|r| r.rows_fetched), Some(3));
}

// ============== Idempotence and Sequencing ==============

#[tokio::test]
async fn test_hydration_is_idempotent() {
    let hydrator = hydrator();
    let mut users = users(&[1, 2, 3]);

    hydrator.hydrate(&mut users, ["orders", "profile"]).await.unwrap();
    let first = users.clone();
    hydrator.hydrate(&mut users, ["orders", "profile"]).await.unwrap();

    assert_eq!(users, first);
    // nothing is cached between calls
    assert_eq!(hydrator.backend().request_count(), 4);
}

#[tokio::test]
async fn test_relations_run_in_order() {
    let hydrator = hydrator();
    let mut users = users(&[1]);

    let report = hydrator
        .hydrate(&mut users, vec!["profile", "orders"])
        .await
        .unwrap();

    let tables: Vec<_> = hydrator
        .backend()
        .requests()
        .iter()
        .map(|r| r.table().to_string())
        .collect();
    assert_eq!(tables, vec!["profiles", "orders"]);
    assert_eq!(report.requests(), 2);
    assert_eq!(report.rows_fetched(), 3);
}

#[tokio::test]
async fn test_failed_lookup_stops_later_relations() {
    let hydrator = hydrator();
    let mut users = users(&[1]);

    let err = hydrator
        .hydrate(&mut users, ["invoices", "orders"])
        .await
        .unwrap_err();

    assert!(err.is_relation_not_found());
    assert_eq!(err.context.model.as_deref(), Some("User"));
    assert_eq!(hydrator.backend().request_count(), 0);
    assert!(users[0].relation("orders").is_none());
}

#[tokio::test]
async fn test_earlier_relations_stay_assigned_after_failure() {
    let hydrator = hydrator();
    let mut users = users(&[1]);

    let result = hydrator.hydrate(&mut users, ["orders", "invoices"]).await;

    assert!(result.is_err());
    assert_eq!(ids(users[0].relation("orders")), vec![10, 11]);
}

#[tokio::test]
async fn test_query_error_is_surfaced_without_assignment() {
    let hydrator = hydrator();
    hydrator
        .backend()
        .fail_next(QueryError::database("connection reset by peer"));
    let mut users = users(&[1, 2]);

    let err = hydrator.hydrate(&mut users, ["orders", "profile"]).await.unwrap_err();

    assert!(err.is_query_execution());
    assert_eq!(err.message, "connection reset by peer");
    assert!(users.iter().all(|u| u.relation("orders").is_none()));
    assert_eq!(hydrator.backend().request_count(), 1);
}

#[tokio::test]
async fn test_misconfigured_catalog_fails_loudly() {
    struct BrokenCatalog;

    impl tether::Catalog for BrokenCatalog {
        fn resolve_relation(
            &self,
            _model: &str,
            _relation: &str,
        ) -> tether::QueryResult<Arc<RelationDescriptor>> {
            Ok(Arc::new(RelationDescriptor::many_to_many("tags", "Post", "Tag")))
        }

        fn resolve_condition(&self, _model: &str, _relation: &str) -> Option<Arc<RelationCondition>> {
            None
        }
    }

    let hydrator = Hydrator::new(BrokenCatalog, MemoryBackend::new());
    let mut posts = vec![DynamicEntity::new("Post").set("id", 1)];

    let err = hydrator.hydrate(&mut posts, "tags").await.unwrap_err();
    assert!(err.is_invalid_descriptor());
    assert_eq!(hydrator.backend().request_count(), 0);
}

#[tokio::test]
async fn test_half_configured_junction_fails_loudly() {
    struct OneSidedCatalog;

    impl tether::Catalog for OneSidedCatalog {
        fn resolve_relation(
            &self,
            _model: &str,
            _relation: &str,
        ) -> tether::QueryResult<Arc<RelationDescriptor>> {
            Ok(Arc::new(
                RelationDescriptor::many_to_many("tags", "Post", "Tag")
                    .table("tags")
                    .junction(JunctionTable::new("post_tags").join_column("post_id", "id")),
            ))
        }

        fn resolve_condition(&self, _model: &str, _relation: &str) -> Option<Arc<RelationCondition>> {
            None
        }
    }

    let backend = MemoryBackend::new()
        .with_table(
            "tags",
            [
                Record::new("Tag").set("id", 100),
                Record::new("Tag").set("id", 200),
            ],
        )
        .with_table("post_tags", [Record::new("post_tags").set("post_id", 1).set("tag_id", 100)]);
    let hydrator = Hydrator::new(OneSidedCatalog, backend);
    let mut posts = vec![DynamicEntity::new("Post").set("id", 1)];

    let err = hydrator.hydrate(&mut posts, "tags").await.unwrap_err();
    assert!(err.is_invalid_descriptor());
    assert!(hydrator.plan(&posts, "tags").unwrap_err().is_invalid_descriptor());
    assert!(posts[0].relation("tags").is_none());
    assert_eq!(hydrator.backend().request_count(), 0);
}

// ============== Null Correlation ==============

#[tokio::test]
async fn test_all_null_keys_still_issue_one_request() {
    let hydrator = hydrator();
    let mut orders = vec![DynamicEntity::new("Order").set("id", 13).set("user_id", FilterValue::Null)];

    hydrator.hydrate(&mut orders, "user").await.unwrap();

    let request = &hydrator.backend().requests()[0];
    assert_eq!(request.correlation(), &Filter::In("id".into(), vec![]));
    assert_eq!(request.to_sql().0, "SELECT user.* FROM users AS user WHERE FALSE");
    assert_eq!(orders[0].relation("user"), Some(&Related::One(None)));
}

// ============== Typed Entities ==============

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Order {
    id: i64,
    user_id: i64,
    status: String,
}

#[derive(Debug, Default)]
struct User {
    id: i64,
    orders: Vec<Order>,
}

impl Entity for User {
    fn model_name(&self) -> &str {
        "User"
    }

    fn get_column(&self, column: &str) -> FilterValue {
        match column {
            "id" => self.id.into(),
            _ => FilterValue::Null,
        }
    }

    fn set_relation(&mut self, relation: &str, value: Related) {
        if relation == "orders" {
            self.orders = value.deserialize().unwrap();
        }
    }
}

#[tokio::test]
async fn test_typed_entities() {
    let hydrator = hydrator();
    let mut users = vec![
        User {
            id: 2,
            ..Default::default()
        },
        User {
            id: 3,
            ..Default::default()
        },
    ];

    hydrator.hydrate(&mut users, "orders").await.unwrap();

    assert_eq!(
        users[0].orders,
        vec![Order {
            id: 12,
            user_id: 2,
            status: "paid".into()
        }]
    );
    assert!(users[1].orders.is_empty());
}

#[tokio::test]
async fn test_boxed_entities() {
    let hydrator = hydrator();
    let mut entities: Vec<Box<dyn Entity + Send>> = vec![
        Box::new(User {
            id: 1,
            ..Default::default()
        }),
        Box::new(DynamicEntity::new("User").set("id", 2)),
    ];

    let mut one = hydrator.hydrate_one(&mut entities[1], "orders").await.unwrap();
    assert_eq!(one.relations.pop().map(|r| r.entities_matched), Some(1));

    hydrator.hydrate(&mut entities, "orders").await.unwrap();
    assert_eq!(hydrator.backend().request_count(), 2);
}
