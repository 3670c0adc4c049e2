//! # Fare-by-Rule Item Table
//!
//! Category 25 rule item records, keyed by vendor and item number and
//! windowed by `eff_date..disc_date`. Current pricing reads the live table;
//! historical pricing ("as of" a past ticketing date) goes through the
//! date-bucketed variant so reprices against the same month share one DB
//! round trip.

use crate::dao::{
    BucketGranularity, CacheFeed, DataAccessObject, DaoHelper, DaoRegistry, DateRange, DeleteList,
    EffectiveDated, HistoricalCacheFeed, HistoricalDataAccessObject, ObjectKey,
};
use crate::error::{FaredataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One fare-by-rule item row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleItemInfo {
    pub vendor: String,
    pub item_no: i64,
    pub eff_date: NaiveDate,
    pub disc_date: NaiveDate,
    /// Fare construction indicator: calculated, specified, add-on, ...
    pub fare_ind: char,
    pub percent: f64,
    pub rule_tariff: i64,
}

impl EffectiveDated for RuleItemInfo {
    fn eff_date(&self) -> NaiveDate {
        self.eff_date
    }

    fn disc_date(&self) -> NaiveDate {
        self.disc_date
    }
}

/// Business key: vendor code plus item number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleItemId {
    pub vendor: String,
    pub item_no: i64,
}

impl RuleItemId {
    pub fn new(vendor: impl Into<String>, item_no: i64) -> Self {
        Self {
            vendor: vendor.into(),
            item_no,
        }
    }
}

impl std::fmt::Display for RuleItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.vendor, self.item_no)
    }
}

/// Row provider for the rule item table (DB query collaborator).
pub trait RuleItemQuery: Send + Sync + 'static {
    /// Every row for the vendor/item pair.
    fn rule_items(&self, vendor: &str, item_no: i64) -> Result<Vec<RuleItemInfo>>;

    /// Every row whose effectivity window intersects `bucket`, in the
    /// query's stored order.
    fn rule_items_in_range(
        &self,
        vendor: &str,
        item_no: i64,
        bucket: &DateRange,
    ) -> Result<Vec<RuleItemInfo>>;
}

const ENTITY: &str = "RuleItem";
const HISTORICAL_ENTITY: &str = "RuleItemHistorical";

/// Feed for current pricing.
pub struct RuleItemFeed {
    query: Arc<dyn RuleItemQuery>,
}

impl RuleItemFeed {
    pub fn new(query: Arc<dyn RuleItemQuery>) -> Self {
        Self { query }
    }
}

impl CacheFeed for RuleItemFeed {
    type Key = RuleItemId;
    type Row = RuleItemInfo;

    fn name(&self) -> &'static str {
        ENTITY
    }

    fn cache_class(&self) -> &'static str {
        "Rules"
    }

    fn fetch(&self, key: &RuleItemId) -> Result<Vec<RuleItemInfo>> {
        self.query.rule_items(&key.vendor, key.item_no)
    }

    fn translate_key(&self, object_key: &ObjectKey) -> Result<RuleItemId> {
        Ok(RuleItemId {
            vendor: object_key.required("VENDOR")?.to_string(),
            item_no: object_key.parsed("ITEMNO")?,
        })
    }

    fn object_key(&self, key: &RuleItemId) -> ObjectKey {
        let mut object_key = ObjectKey::new(ENTITY);
        object_key.set_value("VENDOR", &key.vendor);
        object_key.set_value("ITEMNO", key.item_no);
        object_key
    }
}

/// Feed for historical pricing; buckets by the configured granularity.
pub struct RuleItemHistoricalFeed {
    query: Arc<dyn RuleItemQuery>,
    granularity: BucketGranularity,
}

impl RuleItemHistoricalFeed {
    pub fn new(query: Arc<dyn RuleItemQuery>, granularity: BucketGranularity) -> Self {
        Self { query, granularity }
    }
}

impl HistoricalCacheFeed for RuleItemHistoricalFeed {
    type Id = RuleItemId;
    type Row = RuleItemInfo;

    fn name(&self) -> &'static str {
        HISTORICAL_ENTITY
    }

    fn cache_class(&self) -> &'static str {
        "RulesHistorical"
    }

    fn granularity(&self) -> BucketGranularity {
        self.granularity
    }

    fn fetch(&self, id: &RuleItemId, bucket: &DateRange) -> Result<Vec<RuleItemInfo>> {
        self.query.rule_items_in_range(&id.vendor, id.item_no, bucket)
    }

    fn translate_id(&self, object_key: &ObjectKey) -> Result<RuleItemId> {
        Ok(RuleItemId {
            vendor: object_key.required("VENDOR")?.to_string(),
            item_no: object_key.parsed("ITEMNO")?,
        })
    }

    fn object_key(&self, id: &RuleItemId, bucket: &DateRange) -> ObjectKey {
        let mut object_key = ObjectKey::new(HISTORICAL_ENTITY);
        object_key.set_value("VENDOR", &id.vendor);
        object_key.set_value("ITEMNO", id.item_no);
        object_key.set_date_value("STARTDATE", bucket.start);
        object_key.set_date_value("ENDDATE", bucket.end);
        object_key
    }
}

pub type RuleItemDao = DataAccessObject<RuleItemFeed>;
pub type RuleItemHistoricalDao = HistoricalDataAccessObject<RuleItemHistoricalFeed>;

static RULE_ITEM: DaoHelper<RuleItemDao> = DaoHelper::new(ENTITY);
static RULE_ITEM_HISTORICAL: DaoHelper<RuleItemHistoricalDao> = DaoHelper::new(HISTORICAL_ENTITY);

/// Process-wide current-pricing DAO, built and registered on first call.
pub fn rule_item_dao(query: &Arc<dyn RuleItemQuery>) -> Arc<RuleItemDao> {
    RULE_ITEM.instance(|| {
        let dao = Arc::new(DataAccessObject::new(RuleItemFeed::new(Arc::clone(query))));
        if let Err(err) = dao.warm_up() {
            tracing::warn!(dao = ENTITY, %err, "eager load failed, serving lazily");
        }
        DaoRegistry::global().register(dao.clone());
        dao
    })
}

/// Process-wide historical DAO, built and registered on first call.
pub fn rule_item_historical_dao(
    query: &Arc<dyn RuleItemQuery>,
    granularity: BucketGranularity,
) -> Arc<RuleItemHistoricalDao> {
    RULE_ITEM_HISTORICAL.instance(|| {
        let dao = Arc::new(HistoricalDataAccessObject::new(RuleItemHistoricalFeed::new(
            Arc::clone(query),
            granularity,
        )));
        DaoRegistry::global().register(dao.clone());
        dao
    })
}

/// Typed entry point for request code: the rule item effective on
/// `ticket_date`, from the historical or current cache as directed.
///
/// Requires the corresponding singleton to have been built during warm-up.
pub fn get_rule_item<'a>(
    del: &'a DeleteList,
    vendor: &str,
    item_no: i64,
    ticket_date: NaiveDate,
    is_historical: bool,
) -> Result<Option<&'a RuleItemInfo>> {
    let id = RuleItemId::new(vendor, item_no);
    if is_historical {
        let dao = RULE_ITEM_HISTORICAL
            .try_instance()
            .ok_or_else(|| FaredataError::not_initialized(HISTORICAL_ENTITY))?;
        return dao.get_effective(del, &id, ticket_date);
    }

    let dao = RULE_ITEM
        .try_instance()
        .ok_or_else(|| FaredataError::not_initialized(ENTITY))?;
    let rows = dao.get_filtered(del, &id, |row| row.is_effective_on(ticket_date))?;
    Ok(rows.first().map(|row| &**row))
}
