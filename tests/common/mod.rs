//! Shared fixtures: in-memory row providers with load-call counters, and row
//! builders for the reference tables under test.

#![allow(dead_code)] // not every suite uses every fixture

use faredata_core::dao::DateRange;
use faredata_core::error::{FaredataError, Result};
use faredata_core::tables::rule_item::{RuleItemInfo, RuleItemQuery};
use faredata_core::tables::tax_rules::{TaxRulesRecord, TaxRulesQuery};
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn rule_item(
    vendor: &str,
    item_no: i64,
    eff: NaiveDate,
    disc: NaiveDate,
    rule_tariff: i64,
) -> RuleItemInfo {
    RuleItemInfo {
        vendor: vendor.to_string(),
        item_no,
        eff_date: eff,
        disc_date: disc,
        fare_ind: 'C',
        percent: 100.0,
        rule_tariff,
    }
}

pub fn tax_record(
    nation: &str,
    tax_point_tag: char,
    seq_no: i64,
    create: NaiveDate,
    expire: NaiveDate,
) -> TaxRulesRecord {
    TaxRulesRecord {
        nation: nation.to_string(),
        tax_point_tag,
        tax_code: "US1".to_string(),
        seq_no,
        create_date: create,
        expire_date: expire,
        tax_amt: 1850,
        currency: "USD".to_string(),
    }
}

/// In-memory rule item table instrumented for load accounting.
#[derive(Default)]
pub struct MemoryRuleItemQuery {
    rows: Vec<RuleItemInfo>,
    pub full_loads: AtomicUsize,
    pub range_loads: AtomicUsize,
    pub last_range: Mutex<Option<DateRange>>,
    pub fail_next: AtomicBool,
}

impl MemoryRuleItemQuery {
    pub fn with_rows(rows: Vec<RuleItemInfo>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(FaredataError::database("RULEITEM", "injected failure"));
        }
        Ok(())
    }
}

impl RuleItemQuery for MemoryRuleItemQuery {
    fn rule_items(&self, vendor: &str, item_no: i64) -> Result<Vec<RuleItemInfo>> {
        self.check_failure()?;
        self.full_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .iter()
            .filter(|row| row.vendor == vendor && row.item_no == item_no)
            .cloned()
            .collect())
    }

    fn rule_items_in_range(
        &self,
        vendor: &str,
        item_no: i64,
        bucket: &DateRange,
    ) -> Result<Vec<RuleItemInfo>> {
        self.check_failure()?;
        self.range_loads.fetch_add(1, Ordering::SeqCst);
        *self.last_range.lock() = Some(*bucket);
        Ok(self
            .rows
            .iter()
            .filter(|row| {
                row.vendor == vendor
                    && row.item_no == item_no
                    && row.eff_date < bucket.end
                    && row.disc_date >= bucket.start
            })
            .cloned()
            .collect())
    }
}

/// In-memory tax rules table instrumented for load accounting.
#[derive(Default)]
pub struct MemoryTaxRulesQuery {
    rows: Vec<TaxRulesRecord>,
    pub full_loads: AtomicUsize,
    pub range_loads: AtomicUsize,
}

impl MemoryTaxRulesQuery {
    pub fn with_rows(rows: Vec<TaxRulesRecord>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }
}

impl TaxRulesQuery for MemoryTaxRulesQuery {
    fn tax_rules(&self, nation: &str, tax_point_tag: char) -> Result<Vec<TaxRulesRecord>> {
        self.full_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .iter()
            .filter(|row| row.nation == nation && row.tax_point_tag == tax_point_tag)
            .cloned()
            .collect())
    }

    fn tax_rules_in_range(
        &self,
        nation: &str,
        tax_point_tag: char,
        bucket: &DateRange,
    ) -> Result<Vec<TaxRulesRecord>> {
        self.range_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .iter()
            .filter(|row| {
                row.nation == nation
                    && row.tax_point_tag == tax_point_tag
                    && row.create_date < bucket.end
                    && row.expire_date > bucket.start
            })
            .cloned()
            .collect())
    }
}
