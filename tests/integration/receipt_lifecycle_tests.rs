// End-to-end flows across ProofMint and the recycling escrow, using real
// Stellar asset contracts for subscription payments and rewards.

use proofmint::{
    Error as ProofMintError, GadgetStatus, ProofMintContract, ProofMintContractClient,
    SubscriptionTier,
};
use recycling_escrow::{
    EscrowStatus, ProductCategory, RecyclingEscrowContract, RecyclingEscrowContractClient,
};
use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token::{Client as TokenClient, StellarAssetClient},
    Address, BytesN, Env, String,
};

const UNIT: i128 = 1_0000000;
const BILLING_MONTH: u64 = 30 * 86_400;

struct LifecycleFixture {
    env: Env,
    admin: Address,
    merchant: Address,
    recycler: Address,
    xlm: Address,
    usdc: Address,
    proofmint: ProofMintContractClient<'static>,
    escrow: RecyclingEscrowContractClient<'static>,
}

impl LifecycleFixture {
    fn setup() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.budget().reset_unlimited();
        env.ledger().with_mut(|l| {
            l.timestamp = 1_700_000_000;
            l.sequence_number = 1_000;
        });

        let admin = Address::generate(&env);
        let merchant = Address::generate(&env);
        let recycler = Address::generate(&env);

        let xlm = env.register_stellar_asset_contract_v2(admin.clone()).address();
        let usdc = env.register_stellar_asset_contract_v2(admin.clone()).address();
        StellarAssetClient::new(&env, &xlm).mint(&merchant, &(50_000 * UNIT));
        StellarAssetClient::new(&env, &usdc).mint(&merchant, &(5_000 * UNIT));
        StellarAssetClient::new(&env, &usdc).mint(&admin, &(5_000 * UNIT));

        // Deploy ProofMint
        let proofmint_id = env.register_contract(None, ProofMintContract);
        let proofmint = ProofMintContractClient::new(&env, &proofmint_id);
        proofmint.initialize(
            &admin,
            &String::from_str(&env, "ProofMint Receipt"),
            &String::from_str(&env, "PMR"),
            &String::from_str(&env, "ipfs://"),
            &xlm,
            &usdc,
        );
        proofmint.add_merchant(&admin, &merchant);
        proofmint.add_recycler(&admin, &recycler);

        // Deploy escrow with USDC rewards
        let escrow_id = env.register_contract(None, RecyclingEscrowContract);
        let escrow = RecyclingEscrowContractClient::new(&env, &escrow_id);
        escrow.initialize(&admin, &proofmint_id, &usdc, &(5 * UNIT));

        LifecycleFixture {
            env,
            admin,
            merchant,
            recycler,
            xlm,
            usdc,
            proofmint,
            escrow,
        }
    }

    fn issue(&self, buyer: &Address, hash: &str) -> u64 {
        self.proofmint
            .issue_receipt(&self.merchant, buyer, &String::from_str(&self.env, hash))
    }
}

// ============================================
// Full Receipt Lifecycle
// ============================================

#[test]
fn test_purchase_issue_resell_recycle_reward() {
    let f = LifecycleFixture::setup();
    let buyer = Address::generate(&f.env);
    let second_owner = Address::generate(&f.env);
    let usdc = TokenClient::new(&f.env, &f.usdc);

    // Merchant pays a yearly Premium plan in USDC: 12 x 50 with 10% off
    let view = f.proofmint.purchase_subscription_usdc(
        &f.merchant,
        &SubscriptionTier::Premium,
        &12,
        &(540 * UNIT),
    );
    assert_eq!(view.receipts_remaining, 500);
    assert_eq!(usdc.balance(&f.proofmint.address), 540 * UNIT);

    // Buyer pays through escrow; receipt is minted and escrow released
    let receipt_hash = BytesN::from_array(&f.env, &[7u8; 32]);
    let usdc_admin = StellarAssetClient::new(&f.env, &f.usdc);
    usdc_admin.mint(&buyer, &(900 * UNIT));
    let escrow_id =
        f.escrow
            .create_escrow(&buyer, &f.merchant, &f.usdc, &(899 * UNIT), &receipt_hash);
    let receipt_id = f.issue(&buyer, "QmLaptopReceipt");
    f.escrow.release_escrow(&buyer, &escrow_id);
    assert_eq!(
        f.escrow.get_escrow(&escrow_id).status,
        EscrowStatus::Released
    );

    // Gadget is lost, found, then resold
    f.proofmint
        .flag_gadget(&buyer, &receipt_id, &GadgetStatus::Misplaced);
    f.proofmint
        .flag_gadget(&buyer, &receipt_id, &GadgetStatus::Active);
    f.proofmint.transfer(&buyer, &second_owner, &receipt_id);
    assert_eq!(f.proofmint.owner_of(&receipt_id), second_owner);
    assert_eq!(f.proofmint.get_user_receipts(&buyer).len(), 0);

    // End of life
    f.proofmint.recycle_gadget(&f.recycler, &receipt_id);
    f.escrow.fund_reward_pool(&f.admin, &(100 * UNIT));
    let reward = f.escrow.process_recycling_reward(
        &f.recycler,
        &receipt_id,
        &(1_200 * UNIT),
        &ProductCategory::Laptop,
    );

    // 5 x 1.2 value factor x 1.8 laptop
    assert_eq!(reward, 10 * UNIT + 8 * UNIT / 10);
    assert_eq!(usdc.balance(&second_owner), reward);
    assert_eq!(usdc.balance(&buyer), UNIT);

    let stats = f.proofmint.get_platform_stats();
    assert_eq!(stats.total_receipts, 1);
    assert_eq!(stats.total_recycled, 1);
    assert_eq!(stats.total_merchants, 1);
    assert_eq!(stats.total_recyclers, 1);
}

#[test]
fn test_subscription_quota_across_billing_months() {
    let f = LifecycleFixture::setup();
    let buyer = Address::generate(&f.env);
    let xlm = TokenClient::new(&f.env, &f.xlm);
    let start = f.env.ledger().timestamp();

    f.proofmint
        .purchase_subscription(&f.merchant, &SubscriptionTier::Basic, &2, &(200 * UNIT));
    assert_eq!(xlm.balance(&f.proofmint.address), 200 * UNIT);

    for _ in 0..100 {
        f.issue(&buyer, "QmBulk");
    }
    let over = f.proofmint.try_issue_receipt(
        &f.merchant,
        &buyer,
        &String::from_str(&f.env, "QmOver"),
    );
    assert_eq!(over, Err(Ok(ProofMintError::QuotaExceeded)));

    // Second billing month frees the quota
    f.env
        .ledger()
        .with_mut(|l| l.timestamp = start + BILLING_MONTH);
    f.issue(&buyer, "QmSecondMonth");

    // Past the two paid months issuance stops
    f.env
        .ledger()
        .with_mut(|l| l.timestamp = start + 2 * BILLING_MONTH);
    let expired = f.proofmint.try_issue_receipt(
        &f.merchant,
        &buyer,
        &String::from_str(&f.env, "QmExpired"),
    );
    assert_eq!(expired, Err(Ok(ProofMintError::SubscriptionExpired)));
    assert_eq!(f.proofmint.get_total_stats(), 101);
    assert_eq!(f.proofmint.balance(&buyer), 101);

    // Admin collects the subscription revenue
    let treasury = Address::generate(&f.env);
    f.proofmint
        .withdraw(&f.admin, &f.xlm, &treasury, &(200 * UNIT));
    assert_eq!(xlm.balance(&treasury), 200 * UNIT);
}

#[test]
fn test_merchant_removal_and_subscription_pause() {
    let f = LifecycleFixture::setup();
    let buyer = Address::generate(&f.env);

    f.proofmint
        .purchase_subscription(&f.merchant, &SubscriptionTier::Enterprise, &1, &(1_000 * UNIT));
    f.issue(&buyer, "QmOne");

    f.proofmint
        .pause_merchant_subscription(&f.admin, &f.merchant);
    assert!(!f.proofmint.can_issue_receipts(&f.merchant));
    f.proofmint
        .resume_merchant_subscription(&f.admin, &f.merchant);
    assert!(f.proofmint.can_issue_receipts(&f.merchant));

    f.proofmint.remove_merchant(&f.admin, &f.merchant);
    let result = f.proofmint.try_issue_receipt(
        &f.merchant,
        &buyer,
        &String::from_str(&f.env, "QmTwo"),
    );
    assert_eq!(result, Err(Ok(ProofMintError::NotVerifiedMerchant)));

    // Issued receipts stay valid
    assert_eq!(f.proofmint.get_merchant_receipts(&f.merchant).len(), 1);
    assert_eq!(f.proofmint.owner_of(&1), buyer);
}

#[test]
fn test_escrow_refund_leaves_receipts_untouched() {
    let f = LifecycleFixture::setup();
    let buyer = Address::generate(&f.env);
    let usdc = TokenClient::new(&f.env, &f.usdc);
    StellarAssetClient::new(&f.env, &f.usdc).mint(&buyer, &(100 * UNIT));

    let escrow_id = f.escrow.create_escrow(
        &buyer,
        &f.merchant,
        &f.usdc,
        &(100 * UNIT),
        &BytesN::from_array(&f.env, &[9u8; 32]),
    );
    f.escrow.refund_escrow(&f.merchant, &escrow_id);

    assert_eq!(usdc.balance(&buyer), 100 * UNIT);
    assert_eq!(f.proofmint.get_total_stats(), 0);
}
