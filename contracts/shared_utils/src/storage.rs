//! Storage TTL management.
//!
//! Ledgers close roughly every 5 seconds, so a day is 17 280 ledgers. Instance
//! data lives for a week and persistent entries for a month after each write;
//! both are re-extended once they fall a day below that.

use soroban_sdk::{Env, IntoVal, TryFromVal, Val};

pub const DAY_IN_LEDGERS: u32 = 17_280;
pub const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
pub const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;
pub const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub const PERSISTENT_LIFETIME_THRESHOLD: u32 = PERSISTENT_BUMP_AMOUNT - DAY_IN_LEDGERS;

pub struct Storage;

impl Storage {
    pub fn bump_instance(e: &Env) {
        e.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
    }

    pub fn bump_persistent<K>(e: &Env, key: &K)
    where
        K: IntoVal<Env, Val>,
    {
        e.storage().persistent().extend_ttl(
            key,
            PERSISTENT_LIFETIME_THRESHOLD,
            PERSISTENT_BUMP_AMOUNT,
        );
    }

    /// Writes a persistent entry and extends its TTL.
    pub fn set_persistent<K, V>(e: &Env, key: &K, value: &V)
    where
        K: IntoVal<Env, Val>,
        V: IntoVal<Env, Val>,
    {
        e.storage().persistent().set(key, value);
        Self::bump_persistent(e, key);
    }

    /// Reads a persistent entry, extending its TTL when present.
    pub fn get_persistent<K, V>(e: &Env, key: &K) -> Option<V>
    where
        K: IntoVal<Env, Val>,
        V: TryFromVal<Env, Val>,
    {
        let value = e.storage().persistent().get::<K, V>(key);
        if value.is_some() {
            Self::bump_persistent(e, key);
        }
        value
    }
}
