//! Price representation.
//!
//! Amounts are integer cents. Sources quote prices against different billing
//! periods, so the period is kept alongside the amount at ingestion time and
//! only collapsed to a monthly figure where scoring and planning need a
//! common unit.

use serde::{Deserialize, Serialize};

/// Sessions assumed per month when a source quotes per-session pricing.
pub const SESSIONS_PER_MONTH: i64 = 4;

/// Weeks assumed per month when a source quotes weekly pricing.
pub const WEEKS_PER_MONTH: i64 = 4;

/// Months in a term (seasonal program block).
pub const MONTHS_PER_TERM: i64 = 3;

/// One-time fees are spread over this many months for comparison.
pub const ONE_TIME_SPREAD_MONTHS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Usd,
    Cad,
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Usd
    }
}

/// The billing period a source quoted its price against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    PerSession,
    PerWeek,
    PerMonth,
    PerTerm,
    OneTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount_cents: i64,
    pub currency: Currency,
    pub period: BillingPeriod,
}

impl Price {
    pub fn new(amount_cents: i64, currency: Currency, period: BillingPeriod) -> Self {
        Self {
            amount_cents,
            currency,
            period,
        }
    }

    /// A zero-cost price (free program).
    pub fn free() -> Self {
        Self {
            amount_cents: 0,
            currency: Currency::Usd,
            period: BillingPeriod::PerMonth,
        }
    }

    pub fn is_free(&self) -> bool {
        self.amount_cents == 0
    }

    /// Equivalent monthly cost in cents, for cross-source comparison.
    pub fn normalized_monthly_cents(&self) -> i64 {
        match self.period {
            BillingPeriod::PerSession => self.amount_cents * SESSIONS_PER_MONTH,
            BillingPeriod::PerWeek => self.amount_cents * WEEKS_PER_MONTH,
            BillingPeriod::PerMonth => self.amount_cents,
            BillingPeriod::PerTerm => self.amount_cents / MONTHS_PER_TERM,
            BillingPeriod::OneTime => self.amount_cents / ONE_TIME_SPREAD_MONTHS,
        }
    }
}
