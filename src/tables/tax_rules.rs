//! # Tax Rules Record Table
//!
//! Tax rules records keyed by nation and tax point tag, windowed by
//! `create_date..expire_date` (the exclusive-expiry flavor). Tax evaluation
//! reads every live record for the tax point, so the entry points return the
//! filtered row set rather than a single record.

use crate::cache::CacheHandle;
use crate::dao::{
    BucketGranularity, CacheFeed, CreateExpireDated, DataAccessObject, DaoHelper, DaoRegistry,
    DateRange, DeleteList, HistoricalCacheFeed, HistoricalDataAccessObject, ObjectKey,
};
use crate::error::{FaredataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One tax rules record row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRulesRecord {
    pub nation: String,
    pub tax_point_tag: char,
    pub tax_code: String,
    pub seq_no: i64,
    pub create_date: NaiveDate,
    pub expire_date: NaiveDate,
    pub tax_amt: i64,
    pub currency: String,
}

impl CreateExpireDated for TaxRulesRecord {
    fn create_date(&self) -> NaiveDate {
        self.create_date
    }

    fn expire_date(&self) -> NaiveDate {
        self.expire_date
    }
}

/// Business key: nation code plus tax point tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxRulesId {
    pub nation: String,
    pub tax_point_tag: char,
}

impl TaxRulesId {
    pub fn new(nation: impl Into<String>, tax_point_tag: char) -> Self {
        Self {
            nation: nation.into(),
            tax_point_tag,
        }
    }
}

/// Row provider for the tax rules table (DB query collaborator).
pub trait TaxRulesQuery: Send + Sync + 'static {
    fn tax_rules(&self, nation: &str, tax_point_tag: char) -> Result<Vec<TaxRulesRecord>>;

    fn tax_rules_in_range(
        &self,
        nation: &str,
        tax_point_tag: char,
        bucket: &DateRange,
    ) -> Result<Vec<TaxRulesRecord>>;
}

const ENTITY: &str = "TaxRules";
const HISTORICAL_ENTITY: &str = "TaxRulesHistorical";

pub struct TaxRulesFeed {
    query: Arc<dyn TaxRulesQuery>,
}

impl TaxRulesFeed {
    pub fn new(query: Arc<dyn TaxRulesQuery>) -> Self {
        Self { query }
    }
}

impl CacheFeed for TaxRulesFeed {
    type Key = TaxRulesId;
    type Row = TaxRulesRecord;

    fn name(&self) -> &'static str {
        ENTITY
    }

    fn cache_class(&self) -> &'static str {
        "Taxes"
    }

    fn fetch(&self, key: &TaxRulesId) -> Result<Vec<TaxRulesRecord>> {
        self.query.tax_rules(&key.nation, key.tax_point_tag)
    }

    fn translate_key(&self, object_key: &ObjectKey) -> Result<TaxRulesId> {
        Ok(TaxRulesId {
            nation: object_key.required("NATION")?.to_string(),
            tax_point_tag: object_key.parsed("TAXPOINTTAG")?,
        })
    }

    fn object_key(&self, key: &TaxRulesId) -> ObjectKey {
        let mut object_key = ObjectKey::new(ENTITY);
        object_key.set_value("NATION", &key.nation);
        object_key.set_value("TAXPOINTTAG", key.tax_point_tag);
        object_key
    }
}

pub struct TaxRulesHistoricalFeed {
    query: Arc<dyn TaxRulesQuery>,
    granularity: BucketGranularity,
}

impl TaxRulesHistoricalFeed {
    pub fn new(query: Arc<dyn TaxRulesQuery>, granularity: BucketGranularity) -> Self {
        Self { query, granularity }
    }
}

impl HistoricalCacheFeed for TaxRulesHistoricalFeed {
    type Id = TaxRulesId;
    type Row = TaxRulesRecord;

    fn name(&self) -> &'static str {
        HISTORICAL_ENTITY
    }

    fn cache_class(&self) -> &'static str {
        "Taxes"
    }

    fn granularity(&self) -> BucketGranularity {
        self.granularity
    }

    fn fetch(&self, id: &TaxRulesId, bucket: &DateRange) -> Result<Vec<TaxRulesRecord>> {
        self.query
            .tax_rules_in_range(&id.nation, id.tax_point_tag, bucket)
    }

    fn translate_id(&self, object_key: &ObjectKey) -> Result<TaxRulesId> {
        Ok(TaxRulesId {
            nation: object_key.required("NATION")?.to_string(),
            tax_point_tag: object_key.parsed("TAXPOINTTAG")?,
        })
    }

    fn object_key(&self, id: &TaxRulesId, bucket: &DateRange) -> ObjectKey {
        let mut object_key = ObjectKey::new(HISTORICAL_ENTITY);
        object_key.set_value("NATION", &id.nation);
        object_key.set_value("TAXPOINTTAG", id.tax_point_tag);
        object_key.set_date_value("STARTDATE", bucket.start);
        object_key.set_date_value("ENDDATE", bucket.end);
        object_key
    }
}

pub type TaxRulesDao = DataAccessObject<TaxRulesFeed>;
pub type TaxRulesHistoricalDao = HistoricalDataAccessObject<TaxRulesHistoricalFeed>;

static TAX_RULES: DaoHelper<TaxRulesDao> = DaoHelper::new(ENTITY);
static TAX_RULES_HISTORICAL: DaoHelper<TaxRulesHistoricalDao> = DaoHelper::new(HISTORICAL_ENTITY);

/// Process-wide current-pricing DAO, built and registered on first call.
pub fn tax_rules_dao(query: &Arc<dyn TaxRulesQuery>) -> Arc<TaxRulesDao> {
    TAX_RULES.instance(|| {
        let dao = Arc::new(DataAccessObject::new(TaxRulesFeed::new(Arc::clone(query))));
        if let Err(err) = dao.warm_up() {
            tracing::warn!(dao = ENTITY, %err, "eager load failed, serving lazily");
        }
        DaoRegistry::global().register(dao.clone());
        dao
    })
}

/// Process-wide historical DAO, built and registered on first call.
pub fn tax_rules_historical_dao(
    query: &Arc<dyn TaxRulesQuery>,
    granularity: BucketGranularity,
) -> Arc<TaxRulesHistoricalDao> {
    TAX_RULES_HISTORICAL.instance(|| {
        let dao = Arc::new(HistoricalDataAccessObject::new(TaxRulesHistoricalFeed::new(
            Arc::clone(query),
            granularity,
        )));
        DaoRegistry::global().register(dao.clone());
        dao
    })
}

/// Typed entry point for tax evaluation: every record live on `ticket_date`
/// for the nation and tax point, from the historical or current cache as
/// directed.
pub fn get_tax_rules_records<'a>(
    del: &'a DeleteList,
    nation: &str,
    tax_point_tag: char,
    ticket_date: NaiveDate,
    is_historical: bool,
) -> Result<&'a [CacheHandle<TaxRulesRecord>]> {
    let id = TaxRulesId::new(nation, tax_point_tag);
    if is_historical {
        let dao = TAX_RULES_HISTORICAL
            .try_instance()
            .ok_or_else(|| FaredataError::not_initialized(HISTORICAL_ENTITY))?;
        return dao.get_filtered(del, &id, ticket_date, |row| row.is_live_on(ticket_date));
    }

    let dao = TAX_RULES
        .try_instance()
        .ok_or_else(|| FaredataError::not_initialized(ENTITY))?;
    dao.get_filtered(del, &id, |row| row.is_live_on(ticket_date))
}
