//! Ledger time helpers and the monthly billing period.

use soroban_sdk::Env;

pub const SECONDS_PER_DAY: u64 = 86_400;
/// One billing month: 30 days.
pub const MONTHLY_DURATION: u64 = 30 * SECONDS_PER_DAY;

pub struct TimeUtils;

impl TimeUtils {
    pub fn now(e: &Env) -> u64 {
        e.ledger().timestamp()
    }

    pub fn months_to_seconds(months: u32) -> Option<u64> {
        (months as u64).checked_mul(MONTHLY_DURATION)
    }

    /// `from + months * MONTHLY_DURATION`, or `None` on overflow.
    pub fn add_months(from: u64, months: u32) -> Option<u64> {
        from.checked_add(Self::months_to_seconds(months)?)
    }

    pub fn is_expired(e: &Env, expires_at: u64) -> bool {
        Self::now(e) >= expires_at
    }

    /// Number of whole `period`s between `start` and `now`.
    pub fn elapsed_periods(start: u64, now: u64, period: u64) -> u64 {
        if period == 0 || now <= start {
            return 0;
        }
        (now - start) / period
    }

    /// Start of the period containing `now`, for windows anchored at `start`.
    pub fn current_period_start(start: u64, now: u64, period: u64) -> u64 {
        let periods = Self::elapsed_periods(start, now, period);
        start.saturating_add(periods.saturating_mul(period))
    }
}
