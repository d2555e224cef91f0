// ⚙️ Configuration - lending policy + application paths
//
// The policy holds every number the lending rules depend on (loan period,
// fine rate, subscription term). AppConfig adds where state lives on disk.

use chrono::{DateTime, Duration, Utc};
use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Currency symbol used when rendering fines
pub const CURRENCY_SYMBOL: &str = "₹";

pub const DEFAULT_BORROW_PERIOD_DAYS: i64 = 7;
pub const DEFAULT_FINE_PER_DAY: u64 = 2;
pub const DEFAULT_SUBSCRIPTION_TERM_DAYS: i64 = 180;
pub const DEFAULT_RENEWAL_WINDOW_DAYS: i64 = 30;

/// Accepted range for day counts read from the environment (ten years)
pub const POLICY_DAYS_RANGE: RangeInclusive<i64> = 0..=3650;

/// Accepted range for the per-day fine read from the environment
pub const FINE_PER_DAY_RANGE: RangeInclusive<u64> = 0..=1_000_000;

pub const DEFAULT_DATA_PATH: &str = "library_data.json";
pub const DEFAULT_JOURNAL_PATH: &str = "library_journal.db";

// ============================================================================
// LENDING POLICY
// ============================================================================

/// Rules for loan periods, fines and subscription renewals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    /// Days a member may keep a book before fines accrue
    pub borrow_period_days: i64,

    /// Fine charged per whole overdue day
    pub fine_per_day: u64,

    /// Length of a subscription from its start date
    pub subscription_term_days: i64,

    /// Remind members whose subscription ends within this many days
    pub renewal_window_days: i64,
}

impl LendingPolicy {
    pub fn new() -> Self {
        LendingPolicy {
            borrow_period_days: DEFAULT_BORROW_PERIOD_DAYS,
            fine_per_day: DEFAULT_FINE_PER_DAY,
            subscription_term_days: DEFAULT_SUBSCRIPTION_TERM_DAYS,
            renewal_window_days: DEFAULT_RENEWAL_WINDOW_DAYS,
        }
    }

    pub fn with_borrow_period(mut self, days: i64) -> Self {
        self.borrow_period_days = days;
        self
    }

    pub fn with_fine_per_day(mut self, fine: u64) -> Self {
        self.fine_per_day = fine;
        self
    }

    pub fn with_subscription_term(mut self, days: i64) -> Self {
        self.subscription_term_days = days;
        self
    }

    pub fn with_renewal_window(mut self, days: i64) -> Self {
        self.renewal_window_days = days;
        self
    }

    /// Date a loan started at `borrowed_at` must be returned by
    pub fn due_date(&self, borrowed_at: DateTime<Utc>) -> DateTime<Utc> {
        add_days(borrowed_at, self.borrow_period_days)
    }

    /// Whole days past the loan period (negative while still within it)
    ///
    /// Uses `num_days`, so a partial day never counts as a full one.
    pub fn overdue_days(&self, borrowed_at: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
        (at - borrowed_at)
            .num_days()
            .saturating_sub(self.borrow_period_days)
    }

    /// Fine for a loan checked at `at`: max(overdue_days * rate, 0)
    pub fn fine_for(&self, borrowed_at: DateTime<Utc>, at: DateTime<Utc>) -> u64 {
        u64::try_from(self.overdue_days(borrowed_at, at))
            .map(|days| days.saturating_mul(self.fine_per_day))
            .unwrap_or(0)
    }

    /// Date a subscription started at `start` runs out
    pub fn subscription_expiry(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        add_days(start, self.subscription_term_days)
    }
}

/// `at + days`, clamped to chrono's representable range
fn add_days(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(if days < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// APPLICATION CONFIG
// ============================================================================

/// Runtime configuration for the CLI
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JSON snapshot of the library
    pub data_path: PathBuf,

    /// SQLite lending journal
    pub journal_path: PathBuf,

    pub policy: LendingPolicy,
}

impl AppConfig {
    /// Read configuration from LIBRARY_* environment variables
    pub fn from_env() -> Self {
        let defaults = LendingPolicy::default();

        let policy = LendingPolicy::new()
            .with_borrow_period(env_number(
                "LIBRARY_BORROW_PERIOD_DAYS",
                defaults.borrow_period_days,
                POLICY_DAYS_RANGE,
            ))
            .with_fine_per_day(env_number(
                "LIBRARY_FINE_PER_DAY",
                defaults.fine_per_day,
                FINE_PER_DAY_RANGE,
            ));

        Self {
            data_path: env::var("LIBRARY_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH)),
            journal_path: env::var("LIBRARY_JOURNAL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_JOURNAL_PATH)),
            policy,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            policy: LendingPolicy::default(),
        }
    }
}

/// Read a number from `key`; unparsable or out-of-range values give `default`
fn env_number<T>(key: &str, default: T, range: RangeInclusive<T>) -> T
where
    T: std::str::FromStr + Copy + PartialOrd + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) if range.contains(&value) => value,
            _ => {
                tracing::warn!(
                    key = key,
                    value = %raw,
                    min = %range.start(),
                    max = %range.end(),
                    fallback = %default,
                    "invalid number in environment"
                );
                default
            }
        },
        Err(_) => default,
    }
}
