//! Integration tests for the shopping sync gateway: sessions talking to a
//! real SQLite store.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use weekmenu_core::generate::{ListGenerator, PlanContext};
use weekmenu_core::shopping::{ListError, RawItem, ShoppingSession, service};
use weekmenu_db::queries::{history, shopping};
use weekmenu_test_utils::create_test_db;

/// Replays a fixed raw batch, standing in for the plan-driven generator.
struct FixedBatch(Vec<RawItem>);

#[async_trait]
impl ListGenerator for FixedBatch {
    async fn generate(&self, _ctx: &PlanContext) -> Result<Vec<RawItem>> {
        Ok(self.0.clone())
    }
}

/// A generator that always fails, for sync-error behaviour.
struct Broken;

#[async_trait]
impl ListGenerator for Broken {
    async fn generate(&self, _ctx: &PlanContext) -> Result<Vec<RawItem>> {
        anyhow::bail!("recipe source unavailable")
    }
}

fn ctx() -> PlanContext {
    PlanContext {
        start: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
        end: NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
        person_count: 2,
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 8).unwrap()
}

#[tokio::test]
async fn generate_persists_the_batch_with_store_ids() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    let generator = FixedBatch(vec![
        RawItem::new("Melk", 1.0, "l"),
        RawItem::new("Ei", 6.0, "stuk"),
    ]);
    service::generate(&pool, &mut session, &generator, &ctx())
        .await
        .unwrap();

    assert_eq!(session.items.len(), 2);
    assert!(
        session.items.iter().all(|i| i.id > 0),
        "placeholder ids were replaced by store ids"
    );
    assert_eq!(session.items[0].name, "Melk");
    assert_eq!(session.items[1].name, "Ei");
}

#[tokio::test]
async fn checked_state_survives_regeneration_across_case_variants() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    let first = FixedBatch(vec![RawItem::new("Melk", 1.0, "l")]);
    service::generate(&pool, &mut session, &first, &ctx())
        .await
        .unwrap();
    let id = session.items[0].id;
    service::toggle(&pool, &mut session, id, true).await.unwrap();
    assert!(session.items[0].checked);

    // Regenerate with a different casing and quantity for the same need.
    let second = FixedBatch(vec![RawItem::new("melk", 2.0, "L")]);
    service::generate(&pool, &mut session, &second, &ctx())
        .await
        .unwrap();

    assert_eq!(session.items.len(), 1);
    let item = &session.items[0];
    assert!(item.checked, "checked flag carried over");
    assert_eq!(item.quantity, 2.0, "quantity taken from the new batch");
    assert_eq!(item.name, "melk");
}

#[tokio::test]
async fn generator_failure_leaves_the_session_untouched() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    service::add(&pool, &mut session, "Brood", 1.0, "").await.unwrap();
    let before = session.items.clone();

    let err = service::generate(&pool, &mut session, &Broken, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, ListError::Sync(_)));
    assert_eq!(session.items, before);
}

#[tokio::test]
async fn toggle_on_a_deleted_item_is_a_noop_after_refresh() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    service::add(&pool, &mut session, "Melk", 1.0, "l").await.unwrap();
    let id = session.items[0].id;

    // Another session deletes the row underneath us.
    shopping::delete_item(&pool, id).await.unwrap();

    service::toggle(&pool, &mut session, id, true).await.unwrap();
    assert!(session.items.is_empty(), "session refreshed to store state");
}

#[tokio::test]
async fn add_validates_before_any_round_trip() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    let err = service::add(&pool, &mut session, "  ", 1.0, "").await.unwrap_err();
    assert!(matches!(err, ListError::Validation(_)));
    assert!(shopping::list_items(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_coerces_negative_quantities() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    service::add(&pool, &mut session, "Peper", -2.0, "").await.unwrap();
    assert_eq!(session.items[0].quantity, 0.0);
}

#[tokio::test]
async fn move_within_the_open_partition_is_persisted() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    for name in ["A", "B", "C"] {
        service::add(&pool, &mut session, name, 1.0, "").await.unwrap();
    }
    let a = session.items[0].id;
    let c = session.items[2].id;

    service::move_to(&pool, &mut session, c, a, false).await.unwrap();

    let names: Vec<&str> = session.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["C", "A", "B"]);

    // A fresh session sees the same order.
    let mut other = ShoppingSession::new();
    service::load(&pool, &mut other).await.unwrap();
    let names: Vec<&str> = other.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["C", "A", "B"]);
}

#[tokio::test]
async fn cross_partition_move_is_rejected_without_touching_the_store() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    service::add(&pool, &mut session, "A", 1.0, "").await.unwrap();
    service::add(&pool, &mut session, "B", 1.0, "").await.unwrap();
    let a = session.items[0].id;
    let b = session.items[1].id;
    service::toggle(&pool, &mut session, b, true).await.unwrap();
    let stored_before = shopping::list_items(&pool).await.unwrap();

    let err = service::move_to(&pool, &mut session, a, b, true).await.unwrap_err();
    assert!(matches!(err, ListError::InvalidMove { moved, target } if moved == a && target == b));
    assert_eq!(shopping::list_items(&pool).await.unwrap(), stored_before);
}

#[tokio::test]
async fn complete_archives_checked_items_only() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    service::add(&pool, &mut session, "Melk", 1.0, "l").await.unwrap();
    service::add(&pool, &mut session, "Ei", 6.0, "stuk").await.unwrap();
    let melk = session.items[0].id;
    service::toggle(&pool, &mut session, melk, true).await.unwrap();

    let archived = service::complete(&pool, &mut session, day()).await.unwrap();
    assert_eq!(archived, 1);
    assert_eq!(session.items.len(), 1);
    assert_eq!(session.items[0].name, "Ei");

    let entries = history::list_for_day(&pool, day()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Melk");
}

#[tokio::test]
async fn complete_with_nothing_checked_is_a_safe_noop() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    service::add(&pool, &mut session, "Melk", 1.0, "l").await.unwrap();

    let archived = service::complete(&pool, &mut session, day()).await.unwrap();
    assert_eq!(archived, 0);
    assert_eq!(session.items.len(), 1);
}

#[tokio::test]
async fn clear_wipes_everything_without_archiving() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    service::add(&pool, &mut session, "Melk", 1.0, "l").await.unwrap();
    service::add(&pool, &mut session, "Ei", 6.0, "stuk").await.unwrap();
    let melk = session.items[0].id;
    service::toggle(&pool, &mut session, melk, true).await.unwrap();

    let removed = service::clear(&pool, &mut session).await.unwrap();
    assert_eq!(removed, 2);
    assert!(session.items.is_empty());
    assert!(history::list_for_day(&pool, day()).await.unwrap().is_empty());
}

// Two sessions racing on the same list: whoever syncs last wins, and the
// loser's edit is silently overwritten. This is the documented concurrency
// model, not a defect to paper over.
#[tokio::test]
async fn last_response_wins_between_sessions() {
    let (pool, _dir) = create_test_db().await;

    let mut first = ShoppingSession::new();
    service::add(&pool, &mut first, "Melk", 1.0, "l").await.unwrap();

    let mut second = ShoppingSession::new();
    service::load(&pool, &mut second).await.unwrap();

    // First session regenerates; second session still holds the old list
    // and overwrites the regeneration with its own.
    let from_first = FixedBatch(vec![RawItem::new("Ei", 6.0, "stuk")]);
    service::generate(&pool, &mut first, &from_first, &ctx()).await.unwrap();

    let from_second = FixedBatch(vec![RawItem::new("Boter", 1.0, "pak")]);
    service::generate(&pool, &mut second, &from_second, &ctx()).await.unwrap();

    let stored = shopping::list_items(&pool).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Boter", "the later sync replaced the earlier one");
}

#[tokio::test]
async fn duplicate_keys_in_one_batch_become_distinct_rows() {
    let (pool, _dir) = create_test_db().await;
    let mut session = ShoppingSession::new();

    let generator = FixedBatch(vec![
        RawItem::new("Ei", 6.0, "stuk"),
        RawItem::new("ei", 4.0, "stuk"),
    ]);
    service::generate(&pool, &mut session, &generator, &ctx()).await.unwrap();

    assert_eq!(session.items.len(), 2);
    assert!(session.items.iter().all(|i| !i.checked));
    let orders: Vec<i64> = session.items.iter().map(|i| i.sort_order).collect();
    assert_eq!(orders, vec![0, 1]);
}
