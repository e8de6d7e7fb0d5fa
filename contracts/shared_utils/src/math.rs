//! Checked arithmetic for prices, discounts and reward multipliers.

pub const PERCENT_DENOMINATOR: i128 = 100;
pub const BPS_DENOMINATOR: i128 = 10_000;

pub struct SafeMath;

impl SafeMath {
    pub fn add(a: i128, b: i128) -> Option<i128> {
        a.checked_add(b)
    }

    pub fn sub(a: i128, b: i128) -> Option<i128> {
        a.checked_sub(b)
    }

    /// `amount * count`, used for `monthly price * months`.
    pub fn mul_count(amount: i128, count: u32) -> Option<i128> {
        amount.checked_mul(count as i128)
    }

    /// Reduces `amount` by `percent` percent, rounding down.
    /// `None` when `percent > 100` or on overflow.
    pub fn apply_discount(amount: i128, percent: u32) -> Option<i128> {
        if percent as i128 > PERCENT_DENOMINATOR {
            return None;
        }
        amount
            .checked_mul(PERCENT_DENOMINATOR - percent as i128)?
            .checked_div(PERCENT_DENOMINATOR)
    }

    /// `amount * bps / 10_000`, rounding down.
    pub fn apply_bps(amount: i128, bps: u32) -> Option<i128> {
        amount
            .checked_mul(bps as i128)?
            .checked_div(BPS_DENOMINATOR)
    }

    /// Ratio `numerator / denominator` in basis points, capped at `cap_bps`.
    pub fn ratio_bps_capped(numerator: i128, denominator: i128, cap_bps: u32) -> Option<u32> {
        if denominator <= 0 || numerator < 0 {
            return None;
        }
        let bps = numerator
            .checked_mul(BPS_DENOMINATOR)?
            .checked_div(denominator)?;
        Some(if bps > cap_bps as i128 { cap_bps } else { bps as u32 })
    }
}
