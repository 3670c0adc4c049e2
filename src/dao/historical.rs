//! # Historical Data Access Object
//!
//! The date-range-bucketed DAO variant answering "as of ticketing date"
//! queries. Keys carry an immutable bucket computed from the ticketing date
//! and the table's configured granularity; every ticketing date inside one
//! bucket shares a single DB round trip, and the per-date answer is found by
//! filtering the bucket's rows through the table's effectivity window.

use crate::cache::{CacheHandle, GenericCache};
use crate::dao::data_access_object::{CacheControl, CacheKey};
use crate::dao::{
    BucketGranularity, CreateExpireDated, DateRange, DeleteList, EffectiveDated, ObjectKey,
};
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

/// Immutable bucketed cache key: a business id plus the date bucket whose
/// row set it names.
///
/// Produced only by pure constructors; the bucket is fixed at construction
/// and two keys built from ticket dates in the same bucket are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoricalKey<Id> {
    id: Id,
    bucket: DateRange,
}

impl<Id: CacheKey> HistoricalKey<Id> {
    /// Key for the bucket containing `ticket_date` under `granularity`.
    pub fn for_ticket_date(id: Id, ticket_date: chrono::NaiveDate, granularity: BucketGranularity) -> Self {
        Self {
            id,
            bucket: granularity.bucket_for(ticket_date),
        }
    }

    /// Key for an explicitly named bucket, as carried by invalidation
    /// notifications.
    pub fn from_parts(id: Id, bucket: DateRange) -> Self {
        Self { id, bucket }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn bucket(&self) -> &DateRange {
        &self.bucket
    }
}

/// What a concrete effective-dated reference table supplies to its DAO.
pub trait HistoricalCacheFeed: Send + Sync + 'static {
    type Id: CacheKey;
    type Row: Send + Sync + 'static;

    fn name(&self) -> &'static str;

    fn cache_class(&self) -> &'static str;

    /// Bucket width for this table, from configuration.
    fn granularity(&self) -> BucketGranularity;

    /// One DB round trip for every row of `id` whose effectivity window
    /// intersects `bucket`. Row order is the query's order and is preserved.
    fn fetch(&self, id: &Self::Id, bucket: &DateRange) -> Result<Vec<Self::Row>>;

    /// Notification named fields to business id.
    fn translate_id(&self, object_key: &ObjectKey) -> Result<Self::Id>;

    /// Business id and bucket to notification named fields.
    fn object_key(&self, id: &Self::Id, bucket: &DateRange) -> ObjectKey;
}

/// Cache-aside access to one effective-dated reference table.
pub struct HistoricalDataAccessObject<F: HistoricalCacheFeed> {
    feed: F,
    cache: GenericCache<HistoricalKey<F::Id>, Vec<CacheHandle<F::Row>>>,
    get_calls: AtomicU64,
}

impl<F: HistoricalCacheFeed> HistoricalDataAccessObject<F> {
    pub fn new(feed: F) -> Self {
        let cache = GenericCache::new(feed.name());
        Self {
            feed,
            cache,
            get_calls: AtomicU64::new(0),
        }
    }

    pub fn with_capacity(feed: F, capacity: usize) -> Self {
        let cache = GenericCache::with_capacity(feed.name(), capacity);
        Self {
            feed,
            cache,
            get_calls: AtomicU64::new(0),
        }
    }

    /// Region sized per the feed's cache-class configuration.
    pub fn from_config(feed: F, config: &crate::config::FaredataConfig) -> Self {
        let class = config.class_config(feed.cache_class());
        if class.capacity > 0 {
            Self::with_capacity(feed, class.capacity)
        } else {
            Self::new(feed)
        }
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Every row in the bucket containing `ticket_date`, in stored order,
    /// retained for the request through `del`.
    pub fn get<'a>(
        &self,
        del: &'a DeleteList,
        id: &F::Id,
        ticket_date: chrono::NaiveDate,
    ) -> Result<&'a [CacheHandle<F::Row>]> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        let key = self.key_for(id, ticket_date);
        let handle = self.cache.get_or_create(&key, |k| self.load_rows(k))?;
        Ok(del.copy(handle).as_slice())
    }

    /// The single row effective on `ticket_date` under the
    /// `eff_date <= t <= disc_date` window, or `None` when no window
    /// contains it. The first matching row in stored order wins.
    pub fn get_effective<'a>(
        &self,
        del: &'a DeleteList,
        id: &F::Id,
        ticket_date: chrono::NaiveDate,
    ) -> Result<Option<&'a F::Row>>
    where
        F::Row: EffectiveDated,
    {
        let rows = self.get(del, id, ticket_date)?;
        Ok(rows
            .iter()
            .find(|row| row.is_effective_on(ticket_date))
            .map(|row| &**row))
    }

    /// The single row live on `ticket_date` under the alternate
    /// `create_date <= t < expire_date` window, or `None`.
    pub fn get_live<'a>(
        &self,
        del: &'a DeleteList,
        id: &F::Id,
        ticket_date: chrono::NaiveDate,
    ) -> Result<Option<&'a F::Row>>
    where
        F::Row: CreateExpireDated,
    {
        let rows = self.get(del, id, ticket_date)?;
        Ok(rows
            .iter()
            .find(|row| row.is_live_on(ticket_date))
            .map(|row| &**row))
    }

    /// Bucket rows matching `pred`, adopted into `del`; the shared container
    /// is never mutated.
    pub fn get_filtered<'a, P>(
        &self,
        del: &'a DeleteList,
        id: &F::Id,
        ticket_date: chrono::NaiveDate,
        pred: P,
    ) -> Result<&'a [CacheHandle<F::Row>]>
    where
        P: Fn(&F::Row) -> bool,
    {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        let key = self.key_for(id, ticket_date);
        let handle = self.cache.get_or_create(&key, |k| self.load_rows(k))?;
        let subset: Vec<CacheHandle<F::Row>> = handle
            .iter()
            .filter(|row| pred(row))
            .cloned()
            .collect();
        Ok(del.adopt(subset).as_slice())
    }

    /// DB round trips executed so far; one per distinct missed bucket.
    pub fn load_count(&self) -> u64 {
        self.cache.load_count()
    }

    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::Relaxed)
    }

    fn key_for(&self, id: &F::Id, ticket_date: chrono::NaiveDate) -> HistoricalKey<F::Id> {
        HistoricalKey::for_ticket_date(id.clone(), ticket_date, self.feed.granularity())
    }

    fn load_rows(&self, key: &HistoricalKey<F::Id>) -> Result<Vec<CacheHandle<F::Row>>> {
        match self.feed.fetch(key.id(), key.bucket()) {
            Ok(rows) => Ok(rows.into_iter().map(CacheHandle::new).collect()),
            Err(err) => {
                warn!(dao = self.feed.name(), %err, "DB exception during cache load");
                Err(err)
            }
        }
    }
}

impl<F: HistoricalCacheFeed> CacheControl for HistoricalDataAccessObject<F> {
    fn name(&self) -> &'static str {
        self.feed.name()
    }

    fn cache_class(&self) -> &'static str {
        self.feed.cache_class()
    }

    fn invalidate(&self, object_key: &ObjectKey) -> Result<usize> {
        let id = self.feed.translate_id(object_key).inspect_err(|err| {
            error!(dao = self.feed.name(), %object_key, %err, "translate failed");
        })?;
        let removed = match (
            object_key.date_value("STARTDATE"),
            object_key.date_value("ENDDATE"),
        ) {
            (Some(start), Some(end)) => {
                let key = HistoricalKey::from_parts(id, DateRange::new(start, end));
                usize::from(self.cache.invalidate(&key))
            }
            // Notification without a bucket: drop every bucket of the id.
            _ => self.cache.invalidate_where(|key| key.id() == &id),
        };
        if removed > 0 {
            info!(dao = self.feed.name(), buckets = removed, "cache entries removed");
        } else {
            warn!(
                dao = self.feed.name(),
                "invalidate matched nothing (likely empty cache after server startup)"
            );
        }
        Ok(removed)
    }

    fn clear(&self) -> usize {
        let count = self.cache.clear();
        info!(dao = self.feed.name(), entries = count, "cache cleared");
        count
    }

    fn resident_entries(&self) -> usize {
        self.cache.len()
    }
}
