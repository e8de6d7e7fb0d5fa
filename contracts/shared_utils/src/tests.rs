#![cfg(test)]

use super::*;
use soroban_sdk::{
    contract, contractimpl, symbol_short, testutils::Address as _, testutils::Ledger, Address,
    Env, String, Symbol,
};

#[contract]
pub struct HarnessContract;

#[contractimpl]
impl HarnessContract {
    pub fn version(_e: Env) -> u32 {
        1
    }
}

const ADMIN_KEY: Symbol = symbol_short!("admin");

fn setup() -> (Env, Address) {
    let e = Env::default();
    e.mock_all_auths();
    let contract_id = e.register_contract(None, HarnessContract);
    (e, contract_id)
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn test_mul_count() {
    assert_eq!(SafeMath::mul_count(10_0000000, 3), Some(30_0000000));
    assert_eq!(SafeMath::mul_count(i128::MAX, 2), None);
}

#[test]
fn test_apply_discount() {
    assert_eq!(SafeMath::apply_discount(1200, 10), Some(1080));
    assert_eq!(SafeMath::apply_discount(1200, 0), Some(1200));
    assert_eq!(SafeMath::apply_discount(1200, 100), Some(0));
    assert_eq!(SafeMath::apply_discount(1200, 101), None);
    // rounds down
    assert_eq!(SafeMath::apply_discount(999, 10), Some(899));
}

#[test]
fn test_apply_bps() {
    assert_eq!(SafeMath::apply_bps(5_0000000, 15_000), Some(7_5000000));
    assert_eq!(SafeMath::apply_bps(100, 0), Some(0));
}

#[test]
fn test_ratio_bps_capped() {
    assert_eq!(SafeMath::ratio_bps_capped(500, 1000, 20_000), Some(5_000));
    assert_eq!(SafeMath::ratio_bps_capped(5000, 1000, 20_000), Some(20_000));
    assert_eq!(SafeMath::ratio_bps_capped(1, 0, 20_000), None);
    assert_eq!(SafeMath::ratio_bps_capped(-1, 10, 20_000), None);
}

// ============================================================================
// Time
// ============================================================================

#[test]
fn test_add_months() {
    assert_eq!(TimeUtils::add_months(0, 1), Some(MONTHLY_DURATION));
    assert_eq!(TimeUtils::add_months(100, 12), Some(100 + 12 * MONTHLY_DURATION));
    assert_eq!(TimeUtils::add_months(u64::MAX, 1), None);
}

#[test]
fn test_period_windows() {
    let start = 1_000;
    assert_eq!(TimeUtils::elapsed_periods(start, start, MONTHLY_DURATION), 0);
    assert_eq!(
        TimeUtils::elapsed_periods(start, start + MONTHLY_DURATION - 1, MONTHLY_DURATION),
        0
    );
    assert_eq!(
        TimeUtils::elapsed_periods(start, start + 2 * MONTHLY_DURATION + 5, MONTHLY_DURATION),
        2
    );
    assert_eq!(
        TimeUtils::current_period_start(start, start + 2 * MONTHLY_DURATION + 5, MONTHLY_DURATION),
        start + 2 * MONTHLY_DURATION
    );
    // clock before the anchor never yields a negative window
    assert_eq!(TimeUtils::elapsed_periods(start, 10, MONTHLY_DURATION), 0);
}

#[test]
fn test_is_expired_tracks_ledger_time() {
    let (e, _) = setup();
    e.ledger().with_mut(|l| l.timestamp = 500);
    assert!(!TimeUtils::is_expired(&e, 501));
    assert!(TimeUtils::is_expired(&e, 500));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validation() {
    let e = Env::default();
    assert!(Validation::is_positive(1));
    assert!(!Validation::is_positive(0));
    assert!(Validation::is_in_range(12, 1, 12));
    assert!(!Validation::is_in_range(0, 1, 12));
    assert!(Validation::is_bounded_string(&String::from_str(&e, "Qm123"), 8));
    assert!(!Validation::is_bounded_string(&String::from_str(&e, ""), 8));
    assert!(!Validation::is_bounded_string(&String::from_str(&e, "123456789"), 8));
    assert_eq!(Validation::ensure(false, 7u32), Err(7));
    assert_eq!(Validation::ensure(true, 7u32), Ok(()));
}

// ============================================================================
// Access control and pausable
// ============================================================================

#[test]
fn test_require_admin() {
    let (e, contract_id) = setup();
    let admin = Address::generate(&e);
    let other = Address::generate(&e);

    e.as_contract(&contract_id, || {
        assert_eq!(
            AccessControl::require_admin(&e, &ADMIN_KEY, &admin, 1u32, 3u32),
            Err(1)
        );
        e.storage().instance().set(&ADMIN_KEY, &admin);
        assert_eq!(
            AccessControl::require_admin(&e, &ADMIN_KEY, &admin, 1u32, 3u32),
            Ok(admin.clone())
        );
        assert_eq!(
            AccessControl::require_admin(&e, &ADMIN_KEY, &other, 1u32, 3u32),
            Err(3)
        );
    });
}

#[test]
fn test_roles() {
    let (e, contract_id) = setup();
    let member = Address::generate(&e);
    let key = (symbol_short!("role"), member.clone());

    e.as_contract(&contract_id, || {
        assert!(!AccessControl::has_role(&e, &key));
        assert!(AccessControl::set_role(&e, &key, true));
        assert!(!AccessControl::set_role(&e, &key, true));
        assert!(AccessControl::has_role(&e, &key));
        assert!(AccessControl::set_role(&e, &key, false));
        assert!(!AccessControl::has_role(&e, &key));
    });
}

#[test]
fn test_pausable() {
    let (e, contract_id) = setup();

    e.as_contract(&contract_id, || {
        assert!(!Pausable::is_paused(&e));
        assert_eq!(Pausable::ensure_not_paused(&e, 24u32), Ok(()));
        Pausable::pause(&e);
        assert!(Pausable::is_paused(&e));
        assert_eq!(Pausable::ensure_not_paused(&e, 24u32), Err(24));
        Pausable::unpause(&e);
        assert!(!Pausable::is_paused(&e));
    });
}

#[test]
fn test_persistent_round_trip() {
    let (e, contract_id) = setup();
    let key = symbol_short!("count");

    e.as_contract(&contract_id, || {
        assert_eq!(Storage::get_persistent::<_, u64>(&e, &key), None);
        Storage::set_persistent(&e, &key, &42u64);
        assert_eq!(Storage::get_persistent::<_, u64>(&e, &key), Some(42));
        Storage::bump_instance(&e);
    });
}
