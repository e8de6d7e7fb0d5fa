//! Contract-wide emergency stop.

use soroban_sdk::{symbol_short, Env, Symbol};

pub struct Pausable;

impl Pausable {
    pub const PAUSED_KEY: Symbol = symbol_short!("paused");

    pub fn is_paused(e: &Env) -> bool {
        e.storage()
            .instance()
            .get::<_, bool>(&Self::PAUSED_KEY)
            .unwrap_or(false)
    }

    pub fn pause(e: &Env) {
        e.storage().instance().set(&Self::PAUSED_KEY, &true);
        e.events()
            .publish((symbol_short!("paused"),), e.ledger().timestamp());
    }

    pub fn unpause(e: &Env) {
        e.storage().instance().set(&Self::PAUSED_KEY, &false);
        e.events()
            .publish((symbol_short!("unpaused"),), e.ledger().timestamp());
    }

    /// Returns `err` while the contract is paused.
    pub fn ensure_not_paused<E>(e: &Env, err: E) -> Result<(), E> {
        if Self::is_paused(e) {
            return Err(err);
        }
        Ok(())
    }
}
