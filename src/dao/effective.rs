//! # Effectivity Windows
//!
//! Reference rows carry one of two date-window shapes. Older record families
//! mark a row effective from `eff_date` through `disc_date` inclusive on both
//! ends; newer families mark the row live from `create_date` up to but not
//! including `expire_date`. Concrete DAOs pick whichever their table uses.

use chrono::NaiveDate;

/// Rows windowed by `eff_date <= t <= disc_date` (both inclusive).
pub trait EffectiveDated {
    fn eff_date(&self) -> NaiveDate;
    fn disc_date(&self) -> NaiveDate;

    fn is_effective_on(&self, ticket_date: NaiveDate) -> bool {
        self.eff_date() <= ticket_date && ticket_date <= self.disc_date()
    }
}

/// Rows windowed by `create_date <= t < expire_date`.
pub trait CreateExpireDated {
    fn create_date(&self) -> NaiveDate;
    fn expire_date(&self) -> NaiveDate;

    fn is_live_on(&self, ticket_date: NaiveDate) -> bool {
        self.create_date() <= ticket_date && ticket_date < self.expire_date()
    }
}
