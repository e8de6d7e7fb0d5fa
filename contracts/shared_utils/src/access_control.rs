//! Admin and role checks backed by contract storage.

use soroban_sdk::{Address, Env, IntoVal, Val};

use crate::storage::Storage;

/// Flat allow-list access control: one admin address in instance storage and
/// any number of boolean role flags in persistent storage.
pub struct AccessControl;

impl AccessControl {
    /// Returns the admin stored under `key`, or `None` before initialization.
    pub fn get_admin<K>(e: &Env, key: &K) -> Option<Address>
    where
        K: IntoVal<Env, Val>,
    {
        e.storage().instance().get::<K, Address>(key)
    }

    /// Requires `caller` to have signed the invocation and to be the stored admin.
    pub fn require_admin<K, E>(
        e: &Env,
        key: &K,
        caller: &Address,
        not_initialized: E,
        unauthorized: E,
    ) -> Result<Address, E>
    where
        K: IntoVal<Env, Val>,
    {
        caller.require_auth();
        let admin = Self::get_admin(e, key).ok_or(not_initialized)?;
        if *caller != admin {
            return Err(unauthorized);
        }
        Ok(admin)
    }

    /// Whether the role flag stored under `key` is set.
    pub fn has_role<K>(e: &Env, key: &K) -> bool
    where
        K: IntoVal<Env, Val>,
    {
        e.storage()
            .persistent()
            .get::<K, bool>(key)
            .unwrap_or(false)
    }

    /// Grants or revokes a role flag. Returns `true` when the flag changed.
    pub fn set_role<K>(e: &Env, key: &K, enabled: bool) -> bool
    where
        K: IntoVal<Env, Val>,
    {
        let current = Self::has_role(e, key);
        if current == enabled {
            return false;
        }
        if enabled {
            Storage::set_persistent(e, key, &true);
        } else {
            e.storage().persistent().remove(key);
        }
        true
    }
}
