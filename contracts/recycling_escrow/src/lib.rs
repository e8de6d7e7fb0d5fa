#![no_std]

//! Purchase escrow and recycling rewards for ProofMint receipts.
//!
//! Buyers can park a payment here until the goods arrive; the escrow id is
//! bound to the off-chain receipt hash. Once a registered recycler has marked
//! a receipt `Recycled` in the linked ProofMint contract, the receipt's current
//! owner can be paid a one-off reward from a pool funded by anyone.

use shared_utils::{AccessControl, SafeMath, Storage, TimeUtils, Validation};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, token, xdr::ToXdr,
    Address, Bytes, BytesN, Env, IntoVal, String, Symbol, Vec,
};


// ============================================================================
// Error Types
// ============================================================================

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    /// Amount must be greater than zero
    InvalidAmount = 4,
    /// An escrow with the same id is already stored
    EscrowExists = 5,
    EscrowNotFound = 6,
    /// Escrow was already released or refunded
    EscrowNotPending = 7,
    /// Caller is not a recycler in the linked ProofMint contract
    NotRecycler = 8,
    /// Receipt has not been marked recycled
    NotRecycled = 9,
    RewardAlreadyPaid = 10,
    InsufficientRewardPool = 11,
    MathOverflow = 12,
}

// ============================================================================
// Data Types
// ============================================================================

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum EscrowStatus {
    Pending = 0,
    Released = 1,
    Refunded = 2,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Escrow {
    pub buyer: Address,
    pub merchant: Address,
    pub token: Address,
    pub amount: i128,
    pub receipt_hash: BytesN<32>,
    pub created_at: u64,
    pub status: EscrowStatus,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ProductCategory {
    Smartphone = 0,
    Laptop = 1,
    Tablet = 2,
    Headphones = 3,
    Electronics = 4,
    Other = 5,
}

impl ProductCategory {
    /// Reward multiplier in basis points.
    pub fn multiplier_bps(&self) -> u32 {
        match self {
            ProductCategory::Smartphone => 15_000,
            ProductCategory::Laptop => 18_000,
            ProductCategory::Tablet => 13_000,
            ProductCategory::Headphones => 10_000,
            ProductCategory::Electronics => 12_000,
            ProductCategory::Other => 10_000,
        }
    }
}

/// `base_reward` is paid for a product worth `value_reference`; the value
/// factor is capped at 2x.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardConfig {
    pub base_reward: i128,
    pub value_reference: i128,
}

/// Mirror of ProofMint's gadget status for cross-contract reads.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum GadgetStatus {
    Active = 0,
    Stolen = 1,
    Misplaced = 2,
    Recycled = 3,
}

/// Mirror of ProofMint's receipt record for cross-contract reads.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
    pub id: u64,
    pub merchant: Address,
    pub buyer: Address,
    pub content_hash: String,
    pub issued_at: u64,
    pub gadget_status: GadgetStatus,
    pub last_status_update: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    ProofMint,
    RewardToken,
    RewardConfig,
    /// Reward tokens set aside for payouts
    RewardPool,
    Escrow(BytesN<32>),
    RewardPaid(u64),
}

/// Cap on the value factor: 2x.
pub const MAX_VALUE_FACTOR_BPS: u32 = 20_000;
/// Default product value that earns exactly `base_reward` (1000 units, 7 decimals).
pub const DEFAULT_VALUE_REFERENCE: i128 = 1_000_0000000;

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn require_admin(e: &Env, caller: &Address) -> Result<Address, Error> {
    AccessControl::require_admin(
        e,
        &DataKey::Admin,
        caller,
        Error::NotInitialized,
        Error::Unauthorized,
    )
}

/// Whether `caller` is the admin. Does not check authorization.
fn is_admin(e: &Env, caller: &Address) -> Result<bool, Error> {
    let admin = AccessControl::get_admin(e, &DataKey::Admin).ok_or(Error::NotInitialized)?;
    Ok(admin == *caller)
}

fn read_address(e: &Env, key: &DataKey) -> Result<Address, Error> {
    e.storage()
        .instance()
        .get::<_, Address>(key)
        .ok_or(Error::NotInitialized)
}

fn read_pool(e: &Env) -> i128 {
    e.storage()
        .instance()
        .get::<_, i128>(&DataKey::RewardPool)
        .unwrap_or(0)
}

fn read_config(e: &Env) -> Result<RewardConfig, Error> {
    e.storage()
        .instance()
        .get::<_, RewardConfig>(&DataKey::RewardConfig)
        .ok_or(Error::NotInitialized)
}

fn read_escrow(e: &Env, escrow_id: &BytesN<32>) -> Result<Escrow, Error> {
    Storage::get_persistent(e, &DataKey::Escrow(escrow_id.clone())).ok_or(Error::EscrowNotFound)
}

fn escrow_id(
    e: &Env,
    buyer: &Address,
    merchant: &Address,
    token: &Address,
    amount: i128,
    receipt_hash: &BytesN<32>,
) -> BytesN<32> {
    let mut builder = Bytes::new(e);
    builder.append(&buyer.clone().to_xdr(e));
    builder.append(&merchant.clone().to_xdr(e));
    builder.append(&token.clone().to_xdr(e));
    builder.append(&amount.to_xdr(e));
    builder.append(&Bytes::from(receipt_hash.clone()));
    e.crypto().sha256(&builder).into()
}

fn reward_for(
    config: &RewardConfig,
    product_value: i128,
    category: ProductCategory,
) -> Result<i128, Error> {
    let factor = SafeMath::ratio_bps_capped(
        product_value,
        config.value_reference,
        MAX_VALUE_FACTOR_BPS,
    )
    .ok_or(Error::MathOverflow)?;
    let scaled = SafeMath::apply_bps(config.base_reward, factor).ok_or(Error::MathOverflow)?;
    SafeMath::apply_bps(scaled, category.multiplier_bps()).ok_or(Error::MathOverflow)
}

/// Settle a pending escrow, paying the escrowed amount to `to`.
fn settle(
    e: &Env,
    escrow_id: &BytesN<32>,
    status: EscrowStatus,
    to: &Address,
) -> Result<Escrow, Error> {
    let mut escrow = read_escrow(e, escrow_id)?;
    if escrow.status != EscrowStatus::Pending {
        return Err(Error::EscrowNotPending);
    }
    escrow.status = status;
    Storage::set_persistent(e, &DataKey::Escrow(escrow_id.clone()), &escrow);

    token::Client::new(e, &escrow.token).transfer(
        &e.current_contract_address(),
        to,
        &escrow.amount,
    );
    Ok(escrow)
}

// ─── ProofMint calls ──────────────────────────────────────────────────────────

fn proofmint_is_recycler(e: &Env, proofmint: &Address, recycler: &Address) -> bool {
    let mut args = Vec::new(e);
    args.push_back(recycler.into_val(e));
    e.invoke_contract::<bool>(proofmint, &Symbol::new(e, "is_recycler"), args)
}

fn proofmint_receipt(e: &Env, proofmint: &Address, receipt_id: u64) -> Receipt {
    let mut args = Vec::new(e);
    args.push_back(receipt_id.into_val(e));
    e.invoke_contract::<Receipt>(proofmint, &Symbol::new(e, "get_receipt"), args)
}

fn proofmint_owner(e: &Env, proofmint: &Address, receipt_id: u64) -> Address {
    let mut args = Vec::new(e);
    args.push_back(receipt_id.into_val(e));
    e.invoke_contract::<Address>(proofmint, &Symbol::new(e, "owner_of"), args)
}

// ============================================================================
// Contract Implementation
// ============================================================================

#[contract]
pub struct RecyclingEscrowContract;

#[contractimpl]
impl RecyclingEscrowContract {
    /// Link the contract to a ProofMint deployment and a reward token.
    pub fn initialize(
        e: Env,
        admin: Address,
        proofmint: Address,
        reward_token: Address,
        base_reward: i128,
    ) -> Result<(), Error> {
        if e.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        Validation::ensure(Validation::is_positive(base_reward), Error::InvalidAmount)?;

        let instance = e.storage().instance();
        instance.set(&DataKey::Admin, &admin);
        instance.set(&DataKey::ProofMint, &proofmint);
        instance.set(&DataKey::RewardToken, &reward_token);
        instance.set(
            &DataKey::RewardConfig,
            &RewardConfig {
                base_reward,
                value_reference: DEFAULT_VALUE_REFERENCE,
            },
        );
        instance.set(&DataKey::RewardPool, &0i128);
        Storage::bump_instance(&e);

        e.events().publish((symbol_short!("init"),), (admin, proofmint));
        Ok(())
    }

    pub fn get_admin(e: Env) -> Result<Address, Error> {
        AccessControl::get_admin(&e, &DataKey::Admin).ok_or(Error::NotInitialized)
    }

    pub fn get_proofmint(e: Env) -> Result<Address, Error> {
        read_address(&e, &DataKey::ProofMint)
    }

    // ========================================================================
    // Escrow
    // ========================================================================

    /// Lock `amount` of `token` from `buyer` for `merchant`.
    ///
    /// # Returns
    /// The escrow id, derived from the parties, token, amount and receipt hash
    pub fn create_escrow(
        e: Env,
        buyer: Address,
        merchant: Address,
        token: Address,
        amount: i128,
        receipt_hash: BytesN<32>,
    ) -> Result<BytesN<32>, Error> {
        buyer.require_auth();
        Validation::ensure(Validation::is_positive(amount), Error::InvalidAmount)?;

        let id = escrow_id(&e, &buyer, &merchant, &token, amount, &receipt_hash);
        let key = DataKey::Escrow(id.clone());
        if e.storage().persistent().has(&key) {
            return Err(Error::EscrowExists);
        }

        let escrow = Escrow {
            buyer: buyer.clone(),
            merchant: merchant.clone(),
            token: token.clone(),
            amount,
            receipt_hash,
            created_at: TimeUtils::now(&e),
            status: EscrowStatus::Pending,
        };
        Storage::set_persistent(&e, &key, &escrow);
        Storage::bump_instance(&e);

        token::Client::new(&e, &token).transfer(&buyer, &e.current_contract_address(), &amount);

        e.events()
            .publish((symbol_short!("esc_new"), id.clone()), (buyer, merchant, amount));
        Ok(id)
    }

    /// Pay the escrowed funds to the merchant. Buyer or admin.
    pub fn release_escrow(e: Env, caller: Address, escrow_id: BytesN<32>) -> Result<(), Error> {
        caller.require_auth();
        let escrow = read_escrow(&e, &escrow_id)?;
        if caller != escrow.buyer && !is_admin(&e, &caller)? {
            return Err(Error::Unauthorized);
        }
        let escrow = settle(&e, &escrow_id, EscrowStatus::Released, &escrow.merchant)?;

        log!(&e, "escrow released", escrow.amount);
        e.events()
            .publish((symbol_short!("esc_rel"), escrow_id), (escrow.merchant, escrow.amount));
        Ok(())
    }

    /// Return the escrowed funds to the buyer. Merchant or admin.
    pub fn refund_escrow(e: Env, caller: Address, escrow_id: BytesN<32>) -> Result<(), Error> {
        caller.require_auth();
        let escrow = read_escrow(&e, &escrow_id)?;
        if caller != escrow.merchant && !is_admin(&e, &caller)? {
            return Err(Error::Unauthorized);
        }
        let escrow = settle(&e, &escrow_id, EscrowStatus::Refunded, &escrow.buyer)?;

        e.events()
            .publish((symbol_short!("esc_ref"), escrow_id), (escrow.buyer, escrow.amount));
        Ok(())
    }

    pub fn get_escrow(e: Env, escrow_id: BytesN<32>) -> Result<Escrow, Error> {
        read_escrow(&e, &escrow_id)
    }

    // ========================================================================
    // Recycling Rewards
    // ========================================================================

    /// Add reward tokens to the payout pool.
    pub fn fund_reward_pool(e: Env, funder: Address, amount: i128) -> Result<i128, Error> {
        funder.require_auth();
        Validation::ensure(Validation::is_positive(amount), Error::InvalidAmount)?;
        let reward_token = read_address(&e, &DataKey::RewardToken)?;

        token::Client::new(&e, &reward_token).transfer(
            &funder,
            &e.current_contract_address(),
            &amount,
        );

        let pool = SafeMath::add(read_pool(&e), amount).ok_or(Error::MathOverflow)?;
        e.storage().instance().set(&DataKey::RewardPool, &pool);
        Storage::bump_instance(&e);

        e.events().publish((symbol_short!("rw_fund"), funder), (amount, pool));
        Ok(pool)
    }

    pub fn get_reward_pool(e: Env) -> i128 {
        read_pool(&e)
    }

    pub fn get_reward_config(e: Env) -> Result<RewardConfig, Error> {
        read_config(&e)
    }

    pub fn set_reward_config(e: Env, caller: Address, config: RewardConfig) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        Validation::ensure(
            Validation::is_positive(config.base_reward)
                && Validation::is_positive(config.value_reference),
            Error::InvalidAmount,
        )?;
        e.storage().instance().set(&DataKey::RewardConfig, &config);
        e.events().publish((symbol_short!("rw_set"),), config);
        Ok(())
    }

    /// Reward owed for recycling a product of `product_value` in `category`.
    pub fn calculate_reward(
        e: Env,
        product_value: i128,
        category: ProductCategory,
    ) -> Result<i128, Error> {
        Validation::ensure(product_value >= 0, Error::InvalidAmount)?;
        reward_for(&read_config(&e)?, product_value, category)
    }

    /// Pay the recycling reward for `receipt_id` to the receipt's current owner.
    ///
    /// # Errors
    /// * `NotRecycler` - caller is not registered in ProofMint
    /// * `NotRecycled` - receipt is not marked recycled
    /// * `RewardAlreadyPaid` - receipt was already rewarded
    /// * `InsufficientRewardPool` - pool cannot cover the reward
    pub fn process_recycling_reward(
        e: Env,
        recycler: Address,
        receipt_id: u64,
        product_value: i128,
        category: ProductCategory,
    ) -> Result<i128, Error> {
        recycler.require_auth();
        Validation::ensure(product_value >= 0, Error::InvalidAmount)?;

        let paid_key = DataKey::RewardPaid(receipt_id);
        if e.storage().persistent().has(&paid_key) {
            return Err(Error::RewardAlreadyPaid);
        }

        let proofmint = read_address(&e, &DataKey::ProofMint)?;
        if !proofmint_is_recycler(&e, &proofmint, &recycler) {
            return Err(Error::NotRecycler);
        }
        let receipt = proofmint_receipt(&e, &proofmint, receipt_id);
        if receipt.gadget_status != GadgetStatus::Recycled {
            return Err(Error::NotRecycled);
        }

        let reward = reward_for(&read_config(&e)?, product_value, category)?;
        let pool = read_pool(&e);
        if reward > pool {
            return Err(Error::InsufficientRewardPool);
        }
        let remaining = SafeMath::sub(pool, reward).ok_or(Error::MathOverflow)?;

        Storage::set_persistent(&e, &paid_key, &reward);
        e.storage().instance().set(&DataKey::RewardPool, &remaining);
        Storage::bump_instance(&e);

        let owner = proofmint_owner(&e, &proofmint, receipt_id);
        if reward > 0 {
            let reward_token = read_address(&e, &DataKey::RewardToken)?;
            token::Client::new(&e, &reward_token).transfer(
                &e.current_contract_address(),
                &owner,
                &reward,
            );
        }

        log!(&e, "recycling reward paid", receipt_id, reward);
        e.events()
            .publish((symbol_short!("rw_paid"), receipt_id), (owner, recycler, reward));
        Ok(reward)
    }

    pub fn is_reward_paid(e: Env, receipt_id: u64) -> bool {
        e.storage().persistent().has(&DataKey::RewardPaid(receipt_id))
    }
}
