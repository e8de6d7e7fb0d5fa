#![no_std]

//! ProofMint: NFT purchase receipts issued by subscribed merchants.
//!
//! Verified merchants buy a monthly subscription tier and mint one receipt
//! token per sale to the buyer. Owners can flag their gadget stolen or
//! misplaced, registered recyclers close its lifecycle, and the receipt
//! itself is transferable like any other NFT.

use shared_utils::{
    AccessControl, Pausable, SafeMath, Storage, TimeUtils, Validation, MONTHLY_DURATION,
};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, token, Address, Env,
    String, Symbol, Vec,
};


#[cfg(all(test, feature = "benchmark"))]
mod benchmarks;

// ============================================================================
// Error Types
// ============================================================================

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Contract has not been initialized
    NotInitialized = 1,
    /// Contract has already been initialized
    AlreadyInitialized = 2,
    /// Caller is not the admin
    Unauthorized = 3,
    /// Caller is not in the verified merchant set
    NotVerifiedMerchant = 4,
    /// Subscription length outside 1..=12 months
    InvalidDuration = 5,
    /// Offered payment is below the tier price
    InsufficientPayment = 6,
    /// Merchant never purchased a subscription
    NoSubscription = 7,
    /// Subscription was paused by the admin
    SubscriptionInactive = 8,
    /// Subscription is past its expiry
    SubscriptionExpired = 9,
    /// Monthly receipt quota is used up
    QuotaExceeded = 10,
    /// Receipt with the given id does not exist
    ReceiptNotFound = 11,
    /// Caller is not the current owner of the receipt
    NotOwner = 12,
    /// Caller is not a registered recycler
    NotRecycler = 13,
    /// Receipt is recycled; no further changes are accepted
    AlreadyRecycled = 14,
    /// Requested status equals the current one
    InvalidStatus = 15,
    /// Content hash is empty or too long
    InvalidContentHash = 16,
    /// Arithmetic overflow while pricing
    MathOverflow = 17,
    /// Amount must be greater than zero
    InvalidAmount = 18,
    /// Subscription is paused and cannot be purchased over or renewed
    SubscriptionPaused = 19,
    /// Spender is neither approved for the token nor an operator
    NotApproved = 20,
    /// Approval expiry lies in the past
    InvalidApproval = 21,
    /// Base URI plus content hash exceeds the maximum URI length
    UriTooLong = 22,
    /// Prices must be positive and the discount at most 100%
    InvalidPricing = 23,
    /// Contract is paused
    ContractPaused = 24,
}

impl Error {
    /// Human-readable message for clients and diagnostics.
    pub fn message(&self) -> &'static str {
        match self {
            Error::NotInitialized => "Contract not initialized",
            Error::AlreadyInitialized => "Contract already initialized",
            Error::Unauthorized => "Unauthorized: caller is not the admin",
            Error::NotVerifiedMerchant => "Merchant is not verified",
            Error::InvalidDuration => "Invalid duration: must be 1 to 12 months",
            Error::InsufficientPayment => "Payment is below the subscription price",
            Error::NoSubscription => "Merchant has no subscription",
            Error::SubscriptionInactive => "Subscription is not active",
            Error::SubscriptionExpired => "Subscription has expired",
            Error::QuotaExceeded => "Monthly receipt limit reached",
            Error::ReceiptNotFound => "Receipt not found",
            Error::NotOwner => "Caller does not own the receipt",
            Error::NotRecycler => "Caller is not an authorized recycler",
            Error::AlreadyRecycled => "Gadget already recycled",
            Error::InvalidStatus => "Gadget already has this status",
            Error::InvalidContentHash => "Invalid content hash",
            Error::MathOverflow => "Arithmetic overflow",
            Error::InvalidAmount => "Invalid amount: must be greater than zero",
            Error::SubscriptionPaused => "Subscription is paused by the admin",
            Error::NotApproved => "Spender is not approved for this receipt",
            Error::InvalidApproval => "Approval expiry is in the past",
            Error::UriTooLong => "Token URI too long",
            Error::InvalidPricing => "Invalid subscription pricing",
            Error::ContractPaused => "Contract is paused",
        }
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum SubscriptionTier {
    Basic = 0,
    Premium = 1,
    Enterprise = 2,
}

impl SubscriptionTier {
    /// Receipts a merchant on this tier may issue per billing month.
    pub fn receipt_limit(&self) -> u32 {
        match self {
            SubscriptionTier::Basic => BASIC_MONTHLY_LIMIT,
            SubscriptionTier::Premium => PREMIUM_MONTHLY_LIMIT,
            SubscriptionTier::Enterprise => UNLIMITED_RECEIPTS,
        }
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum GadgetStatus {
    Active = 0,
    Stolen = 1,
    Misplaced = 2,
    Recycled = 3,
}

/// A purchase receipt. Ownership is tracked separately and follows transfers;
/// `buyer` always names the original purchaser.
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
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subscription {
    pub tier: SubscriptionTier,
    pub expires_at: u64,
    pub receipts_issued: u32,
    pub last_reset_time: u64,
    pub is_active: bool,
}

/// Subscription as seen at the current ledger time, with the usage counter
/// already rolled into the current billing month.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscriptionView {
    pub tier: SubscriptionTier,
    pub expires_at: u64,
    pub receipts_issued: u32,
    pub receipts_remaining: u32,
    pub last_reset_time: u64,
    pub is_active: bool,
    pub is_expired: bool,
}

/// Monthly prices in the native asset and in USDC (7 decimals), and the
/// percentage taken off a 12-month purchase.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscriptionPricing {
    pub basic_monthly: i128,
    pub premium_monthly: i128,
    pub enterprise_monthly: i128,
    pub basic_monthly_usdc: i128,
    pub premium_monthly_usdc: i128,
    pub enterprise_monthly_usdc: i128,
    pub yearly_discount: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlatformStats {
    pub total_receipts: u64,
    pub total_merchants: u32,
    pub total_recyclers: u32,
    pub total_recycled: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApprovalData {
    pub approved: Address,
    pub live_until_ledger: u32,
}

/// Storage keys for the contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Admin address (singleton)
    Admin,
    TokenName,
    TokenSymbol,
    BaseUri,
    /// Stellar asset contract accepted by `purchase_subscription`
    NativeToken,
    /// Stellar asset contract accepted by `purchase_subscription_usdc`
    UsdcToken,
    Pricing,
    NextReceiptId,
    TotalReceipts,
    TotalMerchants,
    TotalRecyclers,
    TotalRecycled,
    /// receipt_id -> Receipt
    Receipt(u64),
    /// receipt_id -> current owner
    Owner(u64),
    /// receipt_id -> ApprovalData
    Approval(u64),
    /// (owner, operator) -> live_until_ledger
    ApprovalForAll(Address, Address),
    /// owner -> number of receipts currently held
    OwnerReceiptCount(Address),
    /// (owner, index) -> receipt_id; indexes stay dense across transfers
    OwnerReceipt(Address, u32),
    /// receipt_id -> index in its owner's list
    OwnedIndex(u64),
    /// merchant -> number of receipts ever issued
    MerchantReceiptCount(Address),
    /// (merchant, index) -> receipt_id, append-only
    MerchantReceipt(Address, u32),
    Subscription(Address),
    Merchant(Address),
    Recycler(Address),
}

pub const BASIC_MONTHLY_LIMIT: u32 = 100;
pub const PREMIUM_MONTHLY_LIMIT: u32 = 500;
/// Quota reported for Enterprise subscriptions.
pub const UNLIMITED_RECEIPTS: u32 = u32::MAX;
pub const MAX_SUBSCRIPTION_MONTHS: u32 = 12;
/// Purchases of exactly this many months get the yearly discount.
pub const YEARLY_MONTHS: u32 = 12;
pub const MAX_CONTENT_HASH_LEN: u32 = 128;
pub const MAX_URI_LEN: usize = 256;
/// Largest page returned by the paginated receipt queries.
pub const MAX_PAGE_SIZE: u32 = 100;

// Events
const MINT: Symbol = symbol_short!("mint");
const STATUS: Symbol = symbol_short!("status");
const TRANSFER: Symbol = symbol_short!("transfer");

#[derive(Clone, Copy)]
enum PaymentAsset {
    Native,
    Usdc,
}

pub fn default_pricing() -> SubscriptionPricing {
    SubscriptionPricing {
        basic_monthly: 100_0000000,
        premium_monthly: 500_0000000,
        enterprise_monthly: 1_000_0000000,
        basic_monthly_usdc: 10_0000000,
        premium_monthly_usdc: 50_0000000,
        enterprise_monthly_usdc: 100_0000000,
        yearly_discount: 10,
    }
}

// ─── Access helpers ───────────────────────────────────────────────────────────

fn require_admin(e: &Env, caller: &Address) -> Result<Address, Error> {
    AccessControl::require_admin(
        e,
        &DataKey::Admin,
        caller,
        Error::NotInitialized,
        Error::Unauthorized,
    )
}

fn is_merchant(e: &Env, merchant: &Address) -> bool {
    AccessControl::has_role(e, &DataKey::Merchant(merchant.clone()))
}

fn is_recycler(e: &Env, recycler: &Address) -> bool {
    AccessControl::has_role(e, &DataKey::Recycler(recycler.clone()))
}

// ─── Storage helpers ──────────────────────────────────────────────────────────

fn read_counter(e: &Env, key: &DataKey) -> u64 {
    e.storage().instance().get::<_, u64>(key).unwrap_or(0)
}

fn add_to_counter(e: &Env, key: &DataKey, delta: i64) {
    let current = read_counter(e, key);
    let next = if delta >= 0 {
        current.saturating_add(delta as u64)
    } else {
        current.saturating_sub(delta.unsigned_abs())
    };
    e.storage().instance().set(key, &next);
}

fn read_receipt(e: &Env, receipt_id: u64) -> Result<Receipt, Error> {
    e.storage()
        .persistent()
        .get::<_, Receipt>(&DataKey::Receipt(receipt_id))
        .ok_or(Error::ReceiptNotFound)
}

fn write_receipt(e: &Env, receipt: &Receipt) {
    Storage::set_persistent(e, &DataKey::Receipt(receipt.id), receipt);
}

fn read_owner(e: &Env, receipt_id: u64) -> Result<Address, Error> {
    e.storage()
        .persistent()
        .get::<_, Address>(&DataKey::Owner(receipt_id))
        .ok_or(Error::ReceiptNotFound)
}

// Receipt lists: one persistent entry per index plus a count key.

fn read_count(e: &Env, key: &DataKey) -> u32 {
    e.storage().persistent().get::<_, u32>(key).unwrap_or(0)
}

fn append_merchant_receipt(e: &Env, merchant: &Address, receipt_id: u64) {
    let count_key = DataKey::MerchantReceiptCount(merchant.clone());
    let count = read_count(e, &count_key);
    Storage::set_persistent(
        e,
        &DataKey::MerchantReceipt(merchant.clone(), count),
        &receipt_id,
    );
    Storage::set_persistent(e, &count_key, &(count + 1));
}

fn add_owned(e: &Env, owner: &Address, receipt_id: u64) {
    let count_key = DataKey::OwnerReceiptCount(owner.clone());
    let count = read_count(e, &count_key);
    Storage::set_persistent(e, &DataKey::OwnerReceipt(owner.clone(), count), &receipt_id);
    Storage::set_persistent(e, &DataKey::OwnedIndex(receipt_id), &count);
    Storage::set_persistent(e, &count_key, &(count + 1));
}

/// Removes `receipt_id` from `owner`'s list by moving the last entry into its slot.
fn remove_owned(e: &Env, owner: &Address, receipt_id: u64) -> Result<(), Error> {
    let count_key = DataKey::OwnerReceiptCount(owner.clone());
    let last = read_count(e, &count_key)
        .checked_sub(1)
        .ok_or(Error::ReceiptNotFound)?;
    let index: u32 = e
        .storage()
        .persistent()
        .get(&DataKey::OwnedIndex(receipt_id))
        .ok_or(Error::ReceiptNotFound)?;

    if index != last {
        let moved: u64 = e
            .storage()
            .persistent()
            .get(&DataKey::OwnerReceipt(owner.clone(), last))
            .ok_or(Error::ReceiptNotFound)?;
        Storage::set_persistent(e, &DataKey::OwnerReceipt(owner.clone(), index), &moved);
        Storage::set_persistent(e, &DataKey::OwnedIndex(moved), &index);
    }
    let persistent = e.storage().persistent();
    persistent.remove(&DataKey::OwnerReceipt(owner.clone(), last));
    persistent.remove(&DataKey::OwnedIndex(receipt_id));
    Storage::set_persistent(e, &count_key, &last);
    Ok(())
}

/// Reads up to `limit` ids starting at `start` from an indexed list of `count` entries.
fn read_page<F>(e: &Env, count: u32, start: u32, limit: u32, key_at: F) -> Vec<u64>
where
    F: Fn(u32) -> DataKey,
{
    let mut ids = Vec::new(e);
    let end = start.saturating_add(limit).min(count);
    for index in start..end {
        if let Some(id) = e.storage().persistent().get::<_, u64>(&key_at(index)) {
            ids.push_back(id);
        }
    }
    ids
}

fn read_subscription(e: &Env, merchant: &Address) -> Option<Subscription> {
    e.storage()
        .persistent()
        .get::<_, Subscription>(&DataKey::Subscription(merchant.clone()))
}

fn write_subscription(e: &Env, merchant: &Address, subscription: &Subscription) {
    Storage::set_persistent(e, &DataKey::Subscription(merchant.clone()), subscription);
}

fn read_pricing(e: &Env) -> Result<SubscriptionPricing, Error> {
    e.storage()
        .instance()
        .get::<_, SubscriptionPricing>(&DataKey::Pricing)
        .ok_or(Error::NotInitialized)
}

// ─── Subscription rules ───────────────────────────────────────────────────────

fn monthly_price(
    pricing: &SubscriptionPricing,
    tier: SubscriptionTier,
    asset: PaymentAsset,
) -> i128 {
    match (asset, tier) {
        (PaymentAsset::Native, SubscriptionTier::Basic) => pricing.basic_monthly,
        (PaymentAsset::Native, SubscriptionTier::Premium) => pricing.premium_monthly,
        (PaymentAsset::Native, SubscriptionTier::Enterprise) => pricing.enterprise_monthly,
        (PaymentAsset::Usdc, SubscriptionTier::Basic) => pricing.basic_monthly_usdc,
        (PaymentAsset::Usdc, SubscriptionTier::Premium) => pricing.premium_monthly_usdc,
        (PaymentAsset::Usdc, SubscriptionTier::Enterprise) => pricing.enterprise_monthly_usdc,
    }
}

/// Total price for `months` of `tier`, with the yearly discount applied to
/// 12-month purchases.
fn quote(
    pricing: &SubscriptionPricing,
    tier: SubscriptionTier,
    months: u32,
    asset: PaymentAsset,
) -> Result<i128, Error> {
    Validation::ensure(
        Validation::is_in_range(months, 1, MAX_SUBSCRIPTION_MONTHS),
        Error::InvalidDuration,
    )?;
    let base = SafeMath::mul_count(monthly_price(pricing, tier, asset), months)
        .ok_or(Error::MathOverflow)?;
    if months == YEARLY_MONTHS {
        return SafeMath::apply_discount(base, pricing.yearly_discount).ok_or(Error::MathOverflow);
    }
    Ok(base)
}

fn validate_pricing(pricing: &SubscriptionPricing) -> Result<(), Error> {
    let prices = [
        pricing.basic_monthly,
        pricing.premium_monthly,
        pricing.enterprise_monthly,
        pricing.basic_monthly_usdc,
        pricing.premium_monthly_usdc,
        pricing.enterprise_monthly_usdc,
    ];
    for price in prices {
        Validation::ensure(Validation::is_positive(price), Error::InvalidPricing)?;
    }
    Validation::ensure(pricing.yearly_discount <= 100, Error::InvalidPricing)
}

/// Subscription state after buying `months` of `tier` at `now`.
///
/// An unexpired subscription of the same tier is extended from its current
/// expiry; anything else starts a fresh term. Every paid purchase opens a new
/// billing month at `now` with an empty usage counter.
fn next_subscription(
    existing: Option<Subscription>,
    tier: SubscriptionTier,
    months: u32,
    now: u64,
) -> Result<Subscription, Error> {
    let expires_from = match existing {
        Some(sub) if !sub.is_active => return Err(Error::SubscriptionPaused),
        Some(sub) if sub.tier == tier && now < sub.expires_at => sub.expires_at,
        _ => now,
    };
    Ok(Subscription {
        tier,
        expires_at: TimeUtils::add_months(expires_from, months).ok_or(Error::MathOverflow)?,
        receipts_issued: 0,
        last_reset_time: now,
        is_active: true,
    })
}

/// Moves the usage counter into the billing month containing `now`.
/// Months are 30-day windows anchored at the original `last_reset_time`.
fn roll_period(mut sub: Subscription, now: u64) -> Subscription {
    if TimeUtils::elapsed_periods(sub.last_reset_time, now, MONTHLY_DURATION) > 0 {
        sub.last_reset_time =
            TimeUtils::current_period_start(sub.last_reset_time, now, MONTHLY_DURATION);
        sub.receipts_issued = 0;
    }
    sub
}

/// Subscription checks for issuing one more receipt. Returns the rolled
/// subscription without persisting it.
fn check_subscription(e: &Env, merchant: &Address) -> Result<Subscription, Error> {
    let sub = read_subscription(e, merchant).ok_or(Error::NoSubscription)?;
    if !sub.is_active {
        return Err(Error::SubscriptionInactive);
    }
    if TimeUtils::is_expired(e, sub.expires_at) {
        return Err(Error::SubscriptionExpired);
    }
    let sub = roll_period(sub, TimeUtils::now(e));
    if sub.receipts_issued >= sub.tier.receipt_limit() {
        return Err(Error::QuotaExceeded);
    }
    Ok(sub)
}

fn to_view(sub: Subscription, now: u64) -> SubscriptionView {
    let sub = roll_period(sub, now);
    let limit = sub.tier.receipt_limit();
    let receipts_remaining = if limit == UNLIMITED_RECEIPTS {
        UNLIMITED_RECEIPTS
    } else {
        limit.saturating_sub(sub.receipts_issued)
    };
    SubscriptionView {
        tier: sub.tier,
        expires_at: sub.expires_at,
        receipts_issued: sub.receipts_issued,
        receipts_remaining,
        last_reset_time: sub.last_reset_time,
        is_active: sub.is_active,
        is_expired: now >= sub.expires_at,
    }
}

// ─── Token helpers ────────────────────────────────────────────────────────────

fn payment_token(e: &Env, asset: PaymentAsset) -> Result<Address, Error> {
    let key = match asset {
        PaymentAsset::Native => DataKey::NativeToken,
        PaymentAsset::Usdc => DataKey::UsdcToken,
    };
    e.storage()
        .instance()
        .get::<_, Address>(&key)
        .ok_or(Error::NotInitialized)
}

fn is_operator(e: &Env, owner: &Address, operator: &Address) -> bool {
    e.storage()
        .persistent()
        .get::<_, u32>(&DataKey::ApprovalForAll(owner.clone(), operator.clone()))
        .map(|live_until| live_until >= e.ledger().sequence())
        .unwrap_or(false)
}

fn approved_for(e: &Env, receipt_id: u64) -> Option<Address> {
    e.storage()
        .persistent()
        .get::<_, ApprovalData>(&DataKey::Approval(receipt_id))
        .filter(|data| data.live_until_ledger >= e.ledger().sequence())
        .map(|data| data.approved)
}

fn check_live_until(e: &Env, live_until_ledger: u32) -> Result<(), Error> {
    if live_until_ledger != 0 && live_until_ledger < e.ledger().sequence() {
        return Err(Error::InvalidApproval);
    }
    Ok(())
}

/// Moves `receipt_id` from `from` to `to`. Authorization is the caller's job.
fn move_receipt(e: &Env, from: &Address, to: &Address, receipt_id: u64) -> Result<(), Error> {
    let receipt = read_receipt(e, receipt_id)?;
    let owner = read_owner(e, receipt_id)?;
    if owner != *from {
        return Err(Error::NotOwner);
    }
    if receipt.gadget_status == GadgetStatus::Recycled {
        return Err(Error::AlreadyRecycled);
    }

    Storage::set_persistent(e, &DataKey::Owner(receipt_id), to);
    e.storage().persistent().remove(&DataKey::Approval(receipt_id));
    remove_owned(e, from, receipt_id)?;
    add_owned(e, to, receipt_id);
    Storage::bump_instance(e);

    e.events().publish(
        (TRANSFER, receipt_id),
        (from.clone(), to.clone(), e.ledger().timestamp()),
    );
    Ok(())
}

// ============================================================================
// Contract Implementation
// ============================================================================

#[contract]
pub struct ProofMintContract;

#[contractimpl]
impl ProofMintContract {
    // ========================================================================
    // Initialization & Configuration
    // ========================================================================

    /// Initialize the contract.
    ///
    /// # Arguments
    /// * `admin` - Address allowed to manage merchants, recyclers and pricing
    /// * `name` / `symbol` - NFT collection metadata
    /// * `base_uri` - Prefix joined with a receipt's content hash in `token_uri`
    /// * `native_token` - Asset contract for `purchase_subscription`
    /// * `usdc_token` - Asset contract for `purchase_subscription_usdc`
    pub fn initialize(
        e: Env,
        admin: Address,
        name: String,
        symbol: String,
        base_uri: String,
        native_token: Address,
        usdc_token: Address,
    ) -> Result<(), Error> {
        if e.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        let instance = e.storage().instance();
        instance.set(&DataKey::Admin, &admin);
        instance.set(&DataKey::TokenName, &name);
        instance.set(&DataKey::TokenSymbol, &symbol);
        instance.set(&DataKey::BaseUri, &base_uri);
        instance.set(&DataKey::NativeToken, &native_token);
        instance.set(&DataKey::UsdcToken, &usdc_token);
        instance.set(&DataKey::Pricing, &default_pricing());
        instance.set(&DataKey::NextReceiptId, &1u64);
        instance.set(&DataKey::TotalReceipts, &0u64);
        instance.set(&Pausable::PAUSED_KEY, &false);
        Storage::bump_instance(&e);

        e.events().publish((symbol_short!("init"),), admin);
        Ok(())
    }

    pub fn get_admin(e: Env) -> Result<Address, Error> {
        AccessControl::get_admin(&e, &DataKey::Admin).ok_or(Error::NotInitialized)
    }

    /// Returns `(native_token, usdc_token)`.
    pub fn get_payment_tokens(e: Env) -> Result<(Address, Address), Error> {
        Ok((
            payment_token(&e, PaymentAsset::Native)?,
            payment_token(&e, PaymentAsset::Usdc)?,
        ))
    }

    /// Replace the subscription price list. Admin only.
    pub fn set_pricing(e: Env, caller: Address, pricing: SubscriptionPricing) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        validate_pricing(&pricing)?;
        e.storage().instance().set(&DataKey::Pricing, &pricing);
        Storage::bump_instance(&e);
        e.events().publish((symbol_short!("pricing"),), pricing);
        Ok(())
    }

    /// Pause issuance, purchases, flagging and transfers. Admin only.
    pub fn pause(e: Env, caller: Address) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        Pausable::pause(&e);
        Ok(())
    }

    pub fn unpause(e: Env, caller: Address) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        Pausable::unpause(&e);
        Ok(())
    }

    pub fn is_paused(e: Env) -> bool {
        Pausable::is_paused(&e)
    }

    /// Move collected subscription revenue out of the contract. Admin only.
    pub fn withdraw(
        e: Env,
        caller: Address,
        token: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        Validation::ensure(Validation::is_positive(amount), Error::InvalidAmount)?;
        token::Client::new(&e, &token).transfer(&e.current_contract_address(), &to, &amount);
        e.events()
            .publish((symbol_short!("withdraw"), token), (to, amount));
        Ok(())
    }

    // ========================================================================
    // Merchant & Recycler Directories
    // ========================================================================

    pub fn add_merchant(e: Env, caller: Address, merchant: Address) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        if AccessControl::set_role(&e, &DataKey::Merchant(merchant.clone()), true) {
            add_to_counter(&e, &DataKey::TotalMerchants, 1);
        }
        Storage::bump_instance(&e);
        e.events().publish((symbol_short!("merch_add"), merchant), ());
        Ok(())
    }

    pub fn remove_merchant(e: Env, caller: Address, merchant: Address) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        if AccessControl::set_role(&e, &DataKey::Merchant(merchant.clone()), false) {
            add_to_counter(&e, &DataKey::TotalMerchants, -1);
        }
        Storage::bump_instance(&e);
        e.events().publish((symbol_short!("merch_rm"), merchant), ());
        Ok(())
    }

    pub fn add_recycler(e: Env, caller: Address, recycler: Address) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        if AccessControl::set_role(&e, &DataKey::Recycler(recycler.clone()), true) {
            add_to_counter(&e, &DataKey::TotalRecyclers, 1);
        }
        Storage::bump_instance(&e);
        e.events().publish((symbol_short!("recyc_add"), recycler), ());
        Ok(())
    }

    pub fn remove_recycler(e: Env, caller: Address, recycler: Address) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        if AccessControl::set_role(&e, &DataKey::Recycler(recycler.clone()), false) {
            add_to_counter(&e, &DataKey::TotalRecyclers, -1);
        }
        Storage::bump_instance(&e);
        e.events().publish((symbol_short!("recyc_rm"), recycler), ());
        Ok(())
    }

    pub fn is_verified_merchant(e: Env, merchant: Address) -> bool {
        is_merchant(&e, &merchant)
    }

    pub fn is_recycler(e: Env, recycler: Address) -> bool {
        is_recycler(&e, &recycler)
    }

    /// Suspend a merchant's subscription. Issuance fails until it is resumed.
    pub fn pause_merchant_subscription(
        e: Env,
        caller: Address,
        merchant: Address,
    ) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        let mut sub = read_subscription(&e, &merchant).ok_or(Error::NoSubscription)?;
        sub.is_active = false;
        write_subscription(&e, &merchant, &sub);
        log!(&e, "subscription paused", merchant);
        e.events()
            .publish((symbol_short!("sub_pause"), merchant), e.ledger().timestamp());
        Ok(())
    }

    pub fn resume_merchant_subscription(
        e: Env,
        caller: Address,
        merchant: Address,
    ) -> Result<(), Error> {
        require_admin(&e, &caller)?;
        let mut sub = read_subscription(&e, &merchant).ok_or(Error::NoSubscription)?;
        sub.is_active = true;
        write_subscription(&e, &merchant, &sub);
        e.events()
            .publish((Symbol::new(&e, "sub_resume"), merchant), e.ledger().timestamp());
        Ok(())
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Buy `months` of `tier`, paying in the native asset.
    ///
    /// `payment` is the most the merchant is willing to pay; exactly the quoted
    /// price is transferred.
    ///
    /// # Errors
    /// * `NotVerifiedMerchant` - merchant is not in the directory
    /// * `InvalidDuration` - months outside 1..=12
    /// * `InsufficientPayment` - payment below the quoted price
    /// * `SubscriptionPaused` - admin paused the current subscription
    pub fn purchase_subscription(
        e: Env,
        merchant: Address,
        tier: SubscriptionTier,
        months: u32,
        payment: i128,
    ) -> Result<SubscriptionView, Error> {
        Self::purchase(&e, &merchant, tier, months, payment, PaymentAsset::Native)
    }

    /// Same as `purchase_subscription`, paying in USDC.
    pub fn purchase_subscription_usdc(
        e: Env,
        merchant: Address,
        tier: SubscriptionTier,
        months: u32,
        payment: i128,
    ) -> Result<SubscriptionView, Error> {
        Self::purchase(&e, &merchant, tier, months, payment, PaymentAsset::Usdc)
    }

    /// Extend the merchant's current tier by `months`, paying in the native asset.
    pub fn renew_subscription(
        e: Env,
        merchant: Address,
        months: u32,
        payment: i128,
    ) -> Result<SubscriptionView, Error> {
        let tier = read_subscription(&e, &merchant)
            .ok_or(Error::NoSubscription)?
            .tier;
        Self::purchase(&e, &merchant, tier, months, payment, PaymentAsset::Native)
    }

    pub fn get_subscription(e: Env, merchant: Address) -> Result<SubscriptionView, Error> {
        let sub = read_subscription(&e, &merchant).ok_or(Error::NoSubscription)?;
        Ok(to_view(sub, TimeUtils::now(&e)))
    }

    pub fn get_subscription_pricing(e: Env) -> Result<SubscriptionPricing, Error> {
        read_pricing(&e)
    }

    /// Price of `months` of `tier` in the native asset, or USDC when `in_usdc`.
    pub fn quote_subscription(
        e: Env,
        tier: SubscriptionTier,
        months: u32,
        in_usdc: bool,
    ) -> Result<i128, Error> {
        let asset = if in_usdc {
            PaymentAsset::Usdc
        } else {
            PaymentAsset::Native
        };
        quote(&read_pricing(&e)?, tier, months, asset)
    }

    pub fn get_tier_limit(_e: Env, tier: SubscriptionTier) -> u32 {
        tier.receipt_limit()
    }

    /// Whether `issue_receipt` would currently succeed for `merchant`.
    pub fn can_issue_receipts(e: Env, merchant: Address) -> bool {
        !Pausable::is_paused(&e)
            && is_merchant(&e, &merchant)
            && check_subscription(&e, &merchant).is_ok()
    }

    // ========================================================================
    // Receipt Issuance
    // ========================================================================

    /// Issue a receipt to `buyer` and mint it as an NFT.
    ///
    /// # Arguments
    /// * `merchant` - Verified merchant with an active subscription
    /// * `buyer` - Initial owner of the receipt token
    /// * `content_hash` - Opaque reference to the off-chain receipt document
    ///
    /// # Returns
    /// The new receipt id
    pub fn issue_receipt(
        e: Env,
        merchant: Address,
        buyer: Address,
        content_hash: String,
    ) -> Result<u64, Error> {
        Pausable::ensure_not_paused(&e, Error::ContractPaused)?;
        merchant.require_auth();

        if !is_merchant(&e, &merchant) {
            return Err(Error::NotVerifiedMerchant);
        }
        Validation::ensure(
            Validation::is_bounded_string(&content_hash, MAX_CONTENT_HASH_LEN),
            Error::InvalidContentHash,
        )?;
        let mut sub = check_subscription(&e, &merchant)?;

        let receipt_id: u64 = e
            .storage()
            .instance()
            .get(&DataKey::NextReceiptId)
            .ok_or(Error::NotInitialized)?;
        let now = TimeUtils::now(&e);

        let receipt = Receipt {
            id: receipt_id,
            merchant: merchant.clone(),
            buyer: buyer.clone(),
            content_hash: content_hash.clone(),
            issued_at: now,
            gadget_status: GadgetStatus::Active,
            last_status_update: now,
        };
        write_receipt(&e, &receipt);
        Storage::set_persistent(&e, &DataKey::Owner(receipt_id), &buyer);
        add_owned(&e, &buyer, receipt_id);
        append_merchant_receipt(&e, &merchant, receipt_id);

        sub.receipts_issued += 1;
        write_subscription(&e, &merchant, &sub);

        e.storage()
            .instance()
            .set(&DataKey::NextReceiptId, &(receipt_id + 1));
        add_to_counter(&e, &DataKey::TotalReceipts, 1);
        Storage::bump_instance(&e);

        log!(&e, "receipt issued", receipt_id, sub.receipts_issued);
        e.events()
            .publish((MINT, receipt_id), (merchant, buyer, content_hash, now));

        Ok(receipt_id)
    }

    // ========================================================================
    // Gadget Lifecycle
    // ========================================================================

    /// Change the gadget status of a receipt.
    ///
    /// `Stolen`, `Misplaced` and `Active` may only be set by the current owner,
    /// `Recycled` only by a registered recycler. Recycled is final.
    pub fn flag_gadget(
        e: Env,
        caller: Address,
        receipt_id: u64,
        status: GadgetStatus,
    ) -> Result<(), Error> {
        Pausable::ensure_not_paused(&e, Error::ContractPaused)?;
        caller.require_auth();

        let mut receipt = read_receipt(&e, receipt_id)?;
        if receipt.gadget_status == GadgetStatus::Recycled {
            return Err(Error::AlreadyRecycled);
        }

        match status {
            GadgetStatus::Recycled => {
                if !is_recycler(&e, &caller) {
                    return Err(Error::NotRecycler);
                }
            }
            GadgetStatus::Active | GadgetStatus::Stolen | GadgetStatus::Misplaced => {
                if read_owner(&e, receipt_id)? != caller {
                    return Err(Error::NotOwner);
                }
            }
        }
        if receipt.gadget_status == status {
            return Err(Error::InvalidStatus);
        }

        let old_status = receipt.gadget_status;
        let now = TimeUtils::now(&e);
        receipt.gadget_status = status;
        receipt.last_status_update = now;
        write_receipt(&e, &receipt);

        if status == GadgetStatus::Recycled {
            add_to_counter(&e, &DataKey::TotalRecycled, 1);
        }
        Storage::bump_instance(&e);

        e.events()
            .publish((STATUS, receipt_id), (old_status, status, caller, now));
        Ok(())
    }

    /// Mark a receipt's gadget as recycled. Recycler only.
    pub fn recycle_gadget(e: Env, recycler: Address, receipt_id: u64) -> Result<(), Error> {
        Self::flag_gadget(e, recycler, receipt_id, GadgetStatus::Recycled)
    }

    // ========================================================================
    // Receipt Queries
    // ========================================================================

    pub fn get_receipt(e: Env, receipt_id: u64) -> Result<Receipt, Error> {
        read_receipt(&e, receipt_id)
    }

    /// Receipts currently owned by `owner`.
    pub fn get_user_receipts(e: Env, owner: Address) -> Vec<u64> {
        let count = read_count(&e, &DataKey::OwnerReceiptCount(owner.clone()));
        read_page(&e, count, 0, count, |i| DataKey::OwnerReceipt(owner.clone(), i))
    }

    /// Up to `limit` (at most `MAX_PAGE_SIZE`) receipts of `owner` from `start`.
    pub fn get_user_receipts_page(e: Env, owner: Address, start: u32, limit: u32) -> Vec<u64> {
        let count = read_count(&e, &DataKey::OwnerReceiptCount(owner.clone()));
        read_page(&e, count, start, limit.min(MAX_PAGE_SIZE), |i| {
            DataKey::OwnerReceipt(owner.clone(), i)
        })
    }

    /// Every receipt `merchant` has issued.
    /// For merchants with many receipts prefer `get_merchant_receipts_page`.
    pub fn get_merchant_receipts(e: Env, merchant: Address) -> Vec<u64> {
        let count = read_count(&e, &DataKey::MerchantReceiptCount(merchant.clone()));
        read_page(&e, count, 0, count, |i| {
            DataKey::MerchantReceipt(merchant.clone(), i)
        })
    }

    /// Up to `limit` (at most `MAX_PAGE_SIZE`) receipts issued by `merchant`,
    /// in issue order, from `start`.
    pub fn get_merchant_receipts_page(
        e: Env,
        merchant: Address,
        start: u32,
        limit: u32,
    ) -> Vec<u64> {
        let count = read_count(&e, &DataKey::MerchantReceiptCount(merchant.clone()));
        read_page(&e, count, start, limit.min(MAX_PAGE_SIZE), |i| {
            DataKey::MerchantReceipt(merchant.clone(), i)
        })
    }

    pub fn get_merchant_receipt_count(e: Env, merchant: Address) -> u32 {
        read_count(&e, &DataKey::MerchantReceiptCount(merchant))
    }

    /// Number of receipts issued across all merchants.
    pub fn get_total_stats(e: Env) -> u64 {
        read_counter(&e, &DataKey::TotalReceipts)
    }

    pub fn get_platform_stats(e: Env) -> PlatformStats {
        PlatformStats {
            total_receipts: read_counter(&e, &DataKey::TotalReceipts),
            total_merchants: read_counter(&e, &DataKey::TotalMerchants) as u32,
            total_recyclers: read_counter(&e, &DataKey::TotalRecyclers) as u32,
            total_recycled: read_counter(&e, &DataKey::TotalRecycled),
        }
    }

    pub fn get_next_receipt_id(e: Env) -> Result<u64, Error> {
        e.storage()
            .instance()
            .get(&DataKey::NextReceiptId)
            .ok_or(Error::NotInitialized)
    }

    // ========================================================================
    // NFT Interface
    // ========================================================================

    pub fn name(e: Env) -> Result<String, Error> {
        e.storage()
            .instance()
            .get(&DataKey::TokenName)
            .ok_or(Error::NotInitialized)
    }

    pub fn symbol(e: Env) -> Result<String, Error> {
        e.storage()
            .instance()
            .get(&DataKey::TokenSymbol)
            .ok_or(Error::NotInitialized)
    }

    /// `base_uri` followed by the receipt's content hash.
    pub fn token_uri(e: Env, receipt_id: u64) -> Result<String, Error> {
        let receipt = read_receipt(&e, receipt_id)?;
        let base_uri: String = e
            .storage()
            .instance()
            .get(&DataKey::BaseUri)
            .ok_or(Error::NotInitialized)?;

        let base_len = base_uri.len() as usize;
        let hash_len = receipt.content_hash.len() as usize;
        let total = base_len + hash_len;
        if total > MAX_URI_LEN {
            return Err(Error::UriTooLong);
        }

        let mut buf = [0u8; MAX_URI_LEN];
        base_uri.copy_into_slice(&mut buf[..base_len]);
        receipt.content_hash.copy_into_slice(&mut buf[base_len..total]);
        let uri = core::str::from_utf8(&buf[..total]).map_err(|_| Error::InvalidContentHash)?;
        Ok(String::from_str(&e, uri))
    }

    pub fn total_supply(e: Env) -> u64 {
        read_counter(&e, &DataKey::TotalReceipts)
    }

    /// Number of receipts held by `owner`.
    pub fn balance(e: Env, owner: Address) -> u32 {
        read_count(&e, &DataKey::OwnerReceiptCount(owner))
    }

    pub fn owner_of(e: Env, receipt_id: u64) -> Result<Address, Error> {
        read_owner(&e, receipt_id)
    }

    /// Transfer a receipt to a new owner.
    ///
    /// # Errors
    /// * `ReceiptNotFound` - If the receipt does not exist
    /// * `NotOwner` - If `from` is not the owner
    /// * `AlreadyRecycled` - Recycled receipts are frozen
    pub fn transfer(e: Env, from: Address, to: Address, receipt_id: u64) -> Result<(), Error> {
        Pausable::ensure_not_paused(&e, Error::ContractPaused)?;
        from.require_auth();
        move_receipt(&e, &from, &to, receipt_id)
    }

    /// Transfer on behalf of `from` by an approved address or operator.
    pub fn transfer_from(
        e: Env,
        spender: Address,
        from: Address,
        to: Address,
        receipt_id: u64,
    ) -> Result<(), Error> {
        Pausable::ensure_not_paused(&e, Error::ContractPaused)?;
        spender.require_auth();

        if read_owner(&e, receipt_id)? != from {
            return Err(Error::NotOwner);
        }
        let approved = approved_for(&e, receipt_id).map_or(false, |a| a == spender);
        if spender != from && !approved && !is_operator(&e, &from, &spender) {
            return Err(Error::NotApproved);
        }
        move_receipt(&e, &from, &to, receipt_id)
    }

    /// Let `approved` transfer `receipt_id` until `live_until_ledger`.
    /// A `live_until_ledger` of 0 revokes the approval.
    pub fn approve(
        e: Env,
        approver: Address,
        approved: Address,
        receipt_id: u64,
        live_until_ledger: u32,
    ) -> Result<(), Error> {
        approver.require_auth();
        let owner = read_owner(&e, receipt_id)?;
        if approver != owner && !is_operator(&e, &owner, &approver) {
            return Err(Error::NotOwner);
        }
        check_live_until(&e, live_until_ledger)?;

        let key = DataKey::Approval(receipt_id);
        if live_until_ledger == 0 {
            e.storage().persistent().remove(&key);
        } else {
            let data = ApprovalData {
                approved: approved.clone(),
                live_until_ledger,
            };
            Storage::set_persistent(&e, &key, &data);
        }

        e.events().publish(
            (symbol_short!("approve"), receipt_id),
            (approver, approved, live_until_ledger),
        );
        Ok(())
    }

    /// Let `operator` manage every receipt of `owner` until `live_until_ledger`.
    pub fn approve_for_all(
        e: Env,
        owner: Address,
        operator: Address,
        live_until_ledger: u32,
    ) -> Result<(), Error> {
        owner.require_auth();
        check_live_until(&e, live_until_ledger)?;

        let key = DataKey::ApprovalForAll(owner.clone(), operator.clone());
        if live_until_ledger == 0 {
            e.storage().persistent().remove(&key);
        } else {
            Storage::set_persistent(&e, &key, &live_until_ledger);
        }

        e.events().publish(
            (symbol_short!("appr_all"), owner),
            (operator, live_until_ledger),
        );
        Ok(())
    }

    pub fn get_approved(e: Env, receipt_id: u64) -> Option<Address> {
        approved_for(&e, receipt_id)
    }

    pub fn is_approved_for_all(e: Env, owner: Address, operator: Address) -> bool {
        is_operator(&e, &owner, &operator)
    }
}

impl ProofMintContract {
    fn purchase(
        e: &Env,
        merchant: &Address,
        tier: SubscriptionTier,
        months: u32,
        payment: i128,
        asset: PaymentAsset,
    ) -> Result<SubscriptionView, Error> {
        Pausable::ensure_not_paused(e, Error::ContractPaused)?;
        merchant.require_auth();

        if !is_merchant(e, merchant) {
            return Err(Error::NotVerifiedMerchant);
        }
        let price = quote(&read_pricing(e)?, tier, months, asset)?;
        if payment < price {
            return Err(Error::InsufficientPayment);
        }

        let now = TimeUtils::now(e);
        let existing = read_subscription(e, merchant);
        let renewal = existing.is_some();
        let sub = next_subscription(existing, tier, months, now)?;
        write_subscription(e, merchant, &sub);
        Storage::bump_instance(e);

        let token_address = payment_token(e, asset)?;
        token::Client::new(e, &token_address).transfer(
            merchant,
            &e.current_contract_address(),
            &price,
        );

        let topic = if renewal {
            symbol_short!("sub_renew")
        } else {
            symbol_short!("sub_buy")
        };
        log!(e, "subscription purchased", merchant.clone(), months, price);
        e.events().publish(
            (topic, merchant.clone()),
            (tier, months, price, token_address, sub.expires_at),
        );

        Ok(to_view(sub, now))
    }
}
