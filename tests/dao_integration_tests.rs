//! DAO-level integration: bucket sharing, effectivity filtering, request
//! scoping, and invalidation routing against in-memory row providers.

mod common;

use common::*;
use faredata_core::dao::{
    BucketGranularity, CacheControl, DataAccessObject, DaoRegistry, DeleteList,
    HistoricalDataAccessObject, ObjectKey,
};
use faredata_core::tables::rule_item::{
    RuleItemFeed, RuleItemHistoricalFeed, RuleItemId, RuleItemQuery,
};
use faredata_core::tables::tax_rules::{TaxRulesFeed, TaxRulesHistoricalFeed, TaxRulesId, TaxRulesQuery};
use faredata_core::FaredataError;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn historical_fixture() -> (Arc<MemoryRuleItemQuery>, HistoricalDataAccessObject<RuleItemHistoricalFeed>) {
    let query = Arc::new(MemoryRuleItemQuery::with_rows(vec![
        rule_item("ATP", 5, d(2020, 5, 1), d(2020, 6, 10), 51),
        rule_item("ATP", 5, d(2020, 6, 11), d(2020, 12, 31), 51),
        rule_item("ATP", 9, d(2020, 1, 1), d(2020, 12, 31), 8),
    ]));
    let feed = RuleItemHistoricalFeed::new(
        query.clone() as Arc<dyn RuleItemQuery>,
        BucketGranularity::Monthly,
    );
    (query, HistoricalDataAccessObject::new(feed))
}

#[test]
fn test_monthly_bucket_is_loaded_once_and_filtered_per_date() {
    let (query, dao) = historical_fixture();
    let del = DeleteList::new();
    let id = RuleItemId::new("ATP", 5);

    // 2020-06-15 falls in the second effectivity window.
    let found = dao.get_effective(&del, &id, d(2020, 6, 15)).unwrap().unwrap();
    assert_eq!(found.eff_date, d(2020, 6, 11));
    assert_eq!(query.range_loads.load(Ordering::SeqCst), 1);
    assert_eq!(
        query.last_range.lock().unwrap(),
        faredata_core::dao::DateRange::new(d(2020, 6, 1), d(2020, 7, 1))
    );

    // Another date in the same month shares the bucket: no second load.
    let earlier = dao.get_effective(&del, &id, d(2020, 6, 5)).unwrap().unwrap();
    assert_eq!(earlier.eff_date, d(2020, 5, 1));
    assert_eq!(query.range_loads.load(Ordering::SeqCst), 1);

    // A different month is a different bucket.
    dao.get_effective(&del, &id, d(2020, 7, 3)).unwrap();
    assert_eq!(query.range_loads.load(Ordering::SeqCst), 2);
    assert_eq!(dao.load_count(), 2);
}

#[test]
fn test_no_matching_window_is_none_not_error() {
    let (_query, dao) = historical_fixture();
    let del = DeleteList::new();
    let id = RuleItemId::new("ATP", 5);

    // The bucket loads rows, but no window contains 2021-01-05.
    let missing = dao.get_effective(&del, &id, d(2021, 1, 5)).unwrap();
    assert!(missing.is_none());

    // Unknown item: empty bucket, still not an error.
    let unknown = dao
        .get_effective(&del, &RuleItemId::new("SITA", 1), d(2020, 6, 15))
        .unwrap();
    assert!(unknown.is_none());
}

#[test]
fn test_first_row_in_stored_order_wins_ties() {
    let query: Arc<MemoryRuleItemQuery> = Arc::new(MemoryRuleItemQuery::with_rows(vec![
        rule_item("ATP", 7, d(2020, 6, 1), d(2020, 6, 30), 1),
        rule_item("ATP", 7, d(2020, 6, 1), d(2020, 6, 30), 2),
    ]));
    let dao = HistoricalDataAccessObject::new(RuleItemHistoricalFeed::new(
        query as Arc<dyn RuleItemQuery>,
        BucketGranularity::Monthly,
    ));
    let del = DeleteList::new();

    let winner = dao
        .get_effective(&del, &RuleItemId::new("ATP", 7), d(2020, 6, 15))
        .unwrap()
        .unwrap();
    assert_eq!(winner.rule_tariff, 1);
}

#[test]
fn test_db_failure_propagates_and_later_get_retries() {
    let (query, dao) = historical_fixture();
    let del = DeleteList::new();
    let id = RuleItemId::new("ATP", 5);

    query.fail_next.store(true, Ordering::SeqCst);
    let err = dao.get_effective(&del, &id, d(2020, 6, 15)).unwrap_err();
    assert!(matches!(err, FaredataError::Database { .. }));

    // The failed bucket was not poisoned permanently.
    assert!(dao.get_effective(&del, &id, d(2020, 6, 15)).unwrap().is_some());
}

#[test]
fn test_filtered_subsets_leave_the_shared_container_alone() {
    let query = Arc::new(MemoryRuleItemQuery::with_rows(vec![
        rule_item("ATP", 3, d(2020, 1, 1), d(2020, 12, 31), 100),
        rule_item("ATP", 3, d(2020, 1, 1), d(2020, 12, 31), 200),
    ]));
    let dao = DataAccessObject::new(RuleItemFeed::new(query as Arc<dyn RuleItemQuery>));
    let del = DeleteList::new();
    let id = RuleItemId::new("ATP", 3);

    let subset = dao.get_filtered(&del, &id, |row| row.rule_tariff == 200).unwrap();
    assert_eq!(subset.len(), 1);
    assert_eq!(subset[0].rule_tariff, 200);

    // Full container unchanged, and served from cache.
    let full = dao.get(&del, &id).unwrap();
    assert_eq!(full.len(), 2);
    assert_eq!(dao.load_count(), 1);
}

#[test]
fn test_get_if_resident_and_put() {
    let query = Arc::new(MemoryRuleItemQuery::default());
    let dao = DataAccessObject::new(RuleItemFeed::new(query.clone() as Arc<dyn RuleItemQuery>));
    let del = DeleteList::new();
    let id = RuleItemId::new("ATP", 11);

    assert!(dao.get_if_resident(&del, &id).is_none());
    assert_eq!(query.full_loads.load(Ordering::SeqCst), 0);

    // Eager path: insert without a per-key load.
    dao.put(id.clone(), vec![rule_item("ATP", 11, d(2020, 1, 1), d(2020, 12, 31), 5)]);
    let rows = dao.get_if_resident(&del, &id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(query.full_loads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_request_scope_releases_everything_exactly_once() {
    let (_query, dao) = historical_fixture();
    let id = RuleItemId::new("ATP", 5);

    let del = DeleteList::new();
    let rows = dao.get(&del, &id, d(2020, 6, 15)).unwrap();
    assert!(!rows.is_empty());
    let row_handle = rows[0].clone();

    // The arena retains the container; the cache holds the other reference.
    assert!(del.retained_count() >= 1);
    drop(del);

    // After request end only the cache (via the container) keeps rows alive.
    dao.clear();
    assert_eq!(Arc::strong_count(&row_handle), 1);
}

#[test]
fn test_invalidate_via_object_key_forces_reload() {
    let (query, dao) = historical_fixture();
    let del = DeleteList::new();
    let id = RuleItemId::new("ATP", 5);

    dao.get(&del, &id, d(2020, 6, 15)).unwrap();
    assert_eq!(query.range_loads.load(Ordering::SeqCst), 1);

    // Notification with the exact bucket.
    let mut object_key = ObjectKey::new("RuleItemHistorical");
    object_key.set_value("VENDOR", "ATP");
    object_key.set_value("ITEMNO", 5);
    object_key.set_date_value("STARTDATE", d(2020, 6, 1));
    object_key.set_date_value("ENDDATE", d(2020, 7, 1));
    assert_eq!(dao.invalidate(&object_key).unwrap(), 1);

    dao.get(&del, &id, d(2020, 6, 15)).unwrap();
    assert_eq!(query.range_loads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_invalidate_without_bucket_drops_every_bucket_of_the_id() {
    let (query, dao) = historical_fixture();
    let del = DeleteList::new();
    let id = RuleItemId::new("ATP", 5);

    dao.get(&del, &id, d(2020, 6, 15)).unwrap();
    dao.get(&del, &id, d(2020, 7, 15)).unwrap();
    dao.get(&del, &RuleItemId::new("ATP", 9), d(2020, 6, 15)).unwrap();
    assert_eq!(query.range_loads.load(Ordering::SeqCst), 3);

    let mut object_key = ObjectKey::new("RuleItemHistorical");
    object_key.set_value("VENDOR", "ATP");
    object_key.set_value("ITEMNO", 5);
    assert_eq!(dao.invalidate(&object_key).unwrap(), 2);
    assert_eq!(dao.resident_entries(), 1);
}

#[test]
fn test_translate_failure_is_logged_and_raised() {
    let (_query, dao) = historical_fixture();
    let object_key = ObjectKey::new("RuleItemHistorical");
    assert!(matches!(
        dao.invalidate(&object_key),
        Err(FaredataError::KeyTranslation { .. })
    ));
}

#[test]
fn test_registry_routes_notifications_to_the_right_dao() {
    let registry = DaoRegistry::new();
    let (query, dao) = historical_fixture();
    let dao = Arc::new(dao);
    registry.register(dao.clone());

    let del = DeleteList::new();
    dao.get(&del, &RuleItemId::new("ATP", 5), d(2020, 6, 15)).unwrap();
    assert_eq!(query.range_loads.load(Ordering::SeqCst), 1);

    let mut object_key = ObjectKey::new("RuleItemHistorical");
    object_key.set_value("VENDOR", "ATP");
    object_key.set_value("ITEMNO", 5);
    assert_eq!(registry.notify(&object_key).unwrap(), 1);

    // Entities nobody registered are ignored.
    assert_eq!(registry.notify(&ObjectKey::new("Mileage")).unwrap(), 0);
}

#[test]
fn test_region_capacity_comes_from_cache_class_config() {
    let mut config = faredata_core::FaredataConfig::default();
    config.cache_classes.insert(
        "Rules".to_string(),
        faredata_core::CacheClassConfig {
            pool: "RulesPool".to_string(),
            capacity: 1,
            cache_type: "lru".to_string(),
        },
    );

    let query = Arc::new(MemoryRuleItemQuery::with_rows(vec![
        rule_item("ATP", 1, d(2020, 1, 1), d(2020, 12, 31), 1),
        rule_item("ATP", 2, d(2020, 1, 1), d(2020, 12, 31), 1),
    ]));
    let dao = DataAccessObject::from_config(
        RuleItemFeed::new(query as Arc<dyn RuleItemQuery>),
        &config,
    );
    let del = DeleteList::new();

    let first = dao.get(&del, &RuleItemId::new("ATP", 1)).unwrap();
    dao.get(&del, &RuleItemId::new("ATP", 2)).unwrap();

    // Bounded region keeps one entry, and the displaced rows stay readable
    // through the handles the request already holds.
    assert_eq!(dao.resident_entries(), 1);
    assert_eq!(first.len(), 1);
}

#[test]
fn test_create_expire_window_flavor() {
    let query = Arc::new(MemoryTaxRulesQuery::with_rows(vec![
        tax_record("US", 'D', 1, d(2020, 1, 1), d(2020, 7, 1)),
        tax_record("US", 'D', 2, d(2020, 7, 1), d(2021, 1, 1)),
    ]));
    let dao = HistoricalDataAccessObject::new(TaxRulesHistoricalFeed::new(
        query.clone() as Arc<dyn TaxRulesQuery>,
        BucketGranularity::Monthly,
    ));
    let del = DeleteList::new();
    let id = TaxRulesId::new("US", 'D');

    // Expiry day itself belongs to the successor record.
    let live = dao.get_live(&del, &id, d(2020, 7, 1)).unwrap().unwrap();
    assert_eq!(live.seq_no, 2);

    let before = dao.get_live(&del, &id, d(2020, 6, 30)).unwrap().unwrap();
    assert_eq!(before.seq_no, 1);
}

#[test]
fn test_current_tax_rows_filter_by_liveness() {
    let query = Arc::new(MemoryTaxRulesQuery::with_rows(vec![
        tax_record("US", 'D', 1, d(2020, 1, 1), d(2020, 7, 1)),
        tax_record("US", 'D', 2, d(2020, 7, 1), d(2021, 1, 1)),
        tax_record("GB", 'A', 3, d(2020, 1, 1), d(2021, 1, 1)),
    ]));
    let dao = DataAccessObject::new(TaxRulesFeed::new(query.clone() as Arc<dyn TaxRulesQuery>));
    let del = DeleteList::new();
    let id = TaxRulesId::new("US", 'D');

    let live = dao
        .get_filtered(&del, &id, |row| {
            faredata_core::dao::CreateExpireDated::is_live_on(row, d(2020, 3, 15))
        })
        .unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].seq_no, 1);
    assert_eq!(query.full_loads.load(Ordering::SeqCst), 1);
}
