
use anchor_lang::prelude::{AccountDeserialize, Pubkey};
use anchor_lang::{AnchorDeserialize, InstructionData, ToAccountMetas};
use anchor_spl::associated_token::get_associated_token_address;
use anchor_spl::token::spl_token;
use common::setup::{add_token_owned, mint_data, program_test, token_account_data};
use dsc_engine::{
    AccountInformation, DscError, EngineConfig, UserLedger, DEFAULT_MAX_PRICE_AGE, ENGINE_SEED,
    LEDGER_SEED, PRECISION, VAULT_AUTHORITY_SEED,
};
use dsc_engine_tests::feed_price;
use price_feed::{PriceFeed, PriceFeedError};
use solana_program_pack::Pack;
use solana_program_test::{BanksClientError, ProgramTestContext};
use solana_sdk::instruction::{AccountMeta, Instruction, InstructionError};
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;
use solana_sdk::system_program;
use solana_sdk::transaction::{Transaction, TransactionError};

const COLLATERAL_DECIMALS: u8 = 9;
const DSC_DECIMALS: u8 = 6;
/// One whole collateral token in mint units.
const COLLATERAL: u64 = 1_000_000_000;
/// One whole stable unit in mint units.
const DSC: u64 = 1_000_000;

async fn send(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let mut all_signers = vec![&context.payer];
    all_signers.extend_from_slice(signers);
    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        &all_signers,
        context.last_blockhash,
    );
    context.banks_client.process_transaction(tx).await
}

/// Run a view instruction and return what it set as return data.
async fn view(context: &mut ProgramTestContext, instruction: Instruction) -> Vec<u8> {
    let tx = Transaction::new_signed_with_payer(
        &[instruction],
        Some(&context.payer.pubkey()),
        &[&context.payer],
        context.last_blockhash,
    );
    let simulation = context
        .banks_client
        .simulate_transaction(tx)
        .await
        .expect("simulate view");
    assert!(matches!(simulation.result, Some(Ok(()))), "{:?}", simulation.result);
    simulation
        .simulation_details
        .and_then(|details| details.return_data)
        .expect("view sets return data")
        .data
}

async fn fund(context: &mut ProgramTestContext, to: &Pubkey) {
    let ix = system_instruction::transfer(&context.payer.pubkey(), to, 2_000_000_000);
    send(context, &[ix], &[]).await.unwrap();
}

async fn fetch<T: AccountDeserialize>(
    context: &mut ProgramTestContext,
    address: Pubkey,
) -> anyhow::Result<T> {
    let account = context
        .banks_client
        .get_account(address)
        .await?
        .ok_or_else(|| anyhow::anyhow!("account {address} missing"))?;
    T::try_deserialize(&mut account.data.as_slice()).map_err(|err| anyhow::anyhow!("{err}"))
}

async fn token_balance(context: &mut ProgramTestContext, address: Pubkey) -> u64 {
    let account = context
        .banks_client
        .get_account(address)
        .await
        .expect("fetch token account")
        .expect("token account exists");
    spl_token::state::Account::unpack(&account.data)
        .expect("unpack token account")
        .amount
}

fn custom_code(err: BanksClientError) -> u32 {
    match err {
        BanksClientError::TransactionError(TransactionError::InstructionError(
            _,
            InstructionError::Custom(code),
        )) => code,
        other => panic!("unexpected error: {other:?}"),
    }
}

fn pda(seeds: &[&[u8]]) -> Pubkey {
    Pubkey::find_program_address(seeds, &dsc_engine::id()).0
}

fn ledger_address(owner: &Pubkey) -> Pubkey {
    pda(&[LEDGER_SEED, owner.as_ref()])
}

fn engine_ix(mut accounts: Vec<AccountMeta>, feed: Pubkey, data: Vec<u8>) -> Instruction {
    accounts.push(AccountMeta::new_readonly(feed, false));
    Instruction {
        program_id: dsc_engine::id(),
        accounts,
        data,
    }
}

fn initialize_feed_ix(authority: Pubkey, asset: Pubkey) -> Instruction {
    Instruction {
        program_id: price_feed::id(),
        accounts: price_feed::accounts::InitializeFeed {
            feed: PriceFeed::address(&asset).0,
            authority,
            system_program: system_program::id(),
        }
        .to_account_metas(None),
        data: price_feed::instruction::InitializeFeed { asset }.data(),
    }
}

fn update_price_ix(authority: Pubkey, asset: Pubkey, price: i64) -> Instruction {
    Instruction {
        program_id: price_feed::id(),
        accounts: price_feed::accounts::UpdatePrice {
            feed: PriceFeed::address(&asset).0,
            authority,
        }
        .to_account_metas(None),
        data: price_feed::instruction::UpdatePrice { price }.data(),
    }
}

fn initialize_engine_ix(
    payer: Pubkey,
    dsc_mint: Pubkey,
    collateral_mints: Vec<Pubkey>,
    price_feeds: Vec<Pubkey>,
) -> Instruction {
    let mut accounts = dsc_engine::accounts::InitializeEngine {
        config: pda(&[ENGINE_SEED]),
        vault_authority: pda(&[VAULT_AUTHORITY_SEED]),
        dsc_mint,
        payer,
        system_program: system_program::id(),
    }
    .to_account_metas(None);
    accounts.extend(
        collateral_mints
            .iter()
            .map(|mint| AccountMeta::new_readonly(*mint, false)),
    );
    Instruction {
        program_id: dsc_engine::id(),
        accounts,
        data: dsc_engine::instruction::InitializeEngine {
            collateral_mints,
            price_feeds,
            max_price_age: DEFAULT_MAX_PRICE_AGE,
            feed_authority: payer,
        }
        .data(),
    }
}

/// A live engine over one 9-decimal collateral priced at $2,000 by a feed the
/// payer controls, a 6-decimal stable mint, and two funded wallets.
struct Deployment {
    context: ProgramTestContext,
    collateral_mint: Pubkey,
    dsc_mint: Pubkey,
    feed: Pubkey,
    user: Keypair,
    user_collateral: Pubkey,
    user_dsc: Pubkey,
    liquidator: Keypair,
    liquidator_collateral: Pubkey,
    liquidator_dsc: Pubkey,
}

impl Deployment {
    async fn start() -> Self {
        let mut program_test = program_test();
        let vault_authority = pda(&[VAULT_AUTHORITY_SEED]);
        let collateral_mint = Pubkey::new_unique();
        let dsc_mint = Pubkey::new_unique();
        let user = Keypair::new();
        let liquidator = Keypair::new();
        let user_collateral = Pubkey::new_unique();
        let user_dsc = Pubkey::new_unique();
        let liquidator_collateral = Pubkey::new_unique();
        let liquidator_dsc = Pubkey::new_unique();

        add_token_owned(
            &mut program_test,
            collateral_mint,
            mint_data(Pubkey::new_unique(), COLLATERAL_DECIMALS),
        );
        add_token_owned(&mut program_test, dsc_mint, mint_data(vault_authority, DSC_DECIMALS));
        add_token_owned(
            &mut program_test,
            user_collateral,
            token_account_data(collateral_mint, user.pubkey(), 10 * COLLATERAL),
        );
        add_token_owned(
            &mut program_test,
            user_dsc,
            token_account_data(dsc_mint, user.pubkey(), 0),
        );
        add_token_owned(
            &mut program_test,
            liquidator_collateral,
            token_account_data(collateral_mint, liquidator.pubkey(), 20 * COLLATERAL),
        );
        add_token_owned(
            &mut program_test,
            liquidator_dsc,
            token_account_data(dsc_mint, liquidator.pubkey(), 0),
        );

        let mut context = program_test.start_with_context().await;
        fund(&mut context, &user.pubkey()).await;
        fund(&mut context, &liquidator.pubkey()).await;
        let payer = context.payer.pubkey();
        let feed = PriceFeed::address(&collateral_mint).0;
        send(
            &mut context,
            &[
                initialize_feed_ix(payer, collateral_mint),
                update_price_ix(payer, collateral_mint, feed_price(2_000)),
                initialize_engine_ix(payer, dsc_mint, vec![collateral_mint], vec![feed]),
            ],
            &[],
        )
        .await
        .unwrap();

        Self {
            context,
            collateral_mint,
            dsc_mint,
            feed,
            user,
            user_collateral,
            user_dsc,
            liquidator,
            liquidator_collateral,
            liquidator_dsc,
        }
    }

    fn vault_collateral(&self) -> Pubkey {
        get_associated_token_address(&pda(&[VAULT_AUTHORITY_SEED]), &self.collateral_mint)
    }

    fn vault_dsc(&self) -> Pubkey {
        get_associated_token_address(&pda(&[VAULT_AUTHORITY_SEED]), &self.dsc_mint)
    }

    async fn set_price(&mut self, dollars: i64) {
        let payer = self.context.payer.pubkey();
        let ix = update_price_ix(payer, self.collateral_mint, feed_price(dollars));
        send(&mut self.context, &[ix], &[]).await.unwrap();
    }

    fn manage_collateral_ix(
        &self,
        owner: Pubkey,
        owner_collateral: Pubkey,
        data: Vec<u8>,
    ) -> Instruction {
        let accounts = dsc_engine::accounts::ManageCollateral {
            config: pda(&[ENGINE_SEED]),
            ledger: ledger_address(&owner),
            user: owner,
            vault_authority: pda(&[VAULT_AUTHORITY_SEED]),
            collateral_mint: self.collateral_mint,
            user_collateral_ata: owner_collateral,
            vault_collateral_ata: self.vault_collateral(),
            token_program: spl_token::id(),
            associated_token_program: anchor_spl::associated_token::ID,
            system_program: system_program::id(),
        }
        .to_account_metas(None);
        engine_ix(accounts, self.feed, data)
    }

    fn manage_debt_ix(&self, owner: Pubkey, owner_dsc: Pubkey, data: Vec<u8>) -> Instruction {
        let accounts = dsc_engine::accounts::ManageDebt {
            config: pda(&[ENGINE_SEED]),
            ledger: ledger_address(&owner),
            user: owner,
            vault_authority: pda(&[VAULT_AUTHORITY_SEED]),
            dsc_mint: self.dsc_mint,
            user_dsc_ata: owner_dsc,
            vault_dsc_ata: self.vault_dsc(),
            token_program: spl_token::id(),
            associated_token_program: anchor_spl::associated_token::ID,
            system_program: system_program::id(),
        }
        .to_account_metas(None);
        engine_ix(accounts, self.feed, data)
    }

    fn manage_position_ix(&self, data: Vec<u8>) -> Instruction {
        let accounts = dsc_engine::accounts::ManagePosition {
            config: pda(&[ENGINE_SEED]),
            ledger: ledger_address(&self.user.pubkey()),
            user: self.user.pubkey(),
            vault_authority: pda(&[VAULT_AUTHORITY_SEED]),
            collateral_mint: self.collateral_mint,
            user_collateral_ata: self.user_collateral,
            vault_collateral_ata: self.vault_collateral(),
            dsc_mint: self.dsc_mint,
            user_dsc_ata: self.user_dsc,
            vault_dsc_ata: self.vault_dsc(),
            token_program: spl_token::id(),
            associated_token_program: anchor_spl::associated_token::ID,
            system_program: system_program::id(),
        }
        .to_account_metas(None);
        engine_ix(accounts, self.feed, data)
    }

    fn liquidate_ix(&self, debt_to_cover: u64) -> Instruction {
        let liquidator = self.liquidator.pubkey();
        let accounts = dsc_engine::accounts::Liquidate {
            config: pda(&[ENGINE_SEED]),
            target_ledger: ledger_address(&self.user.pubkey()),
            liquidator_ledger: ledger_address(&liquidator),
            liquidator,
            vault_authority: pda(&[VAULT_AUTHORITY_SEED]),
            collateral_mint: self.collateral_mint,
            liquidator_collateral_ata: get_associated_token_address(
                &liquidator,
                &self.collateral_mint,
            ),
            vault_collateral_ata: self.vault_collateral(),
            dsc_mint: self.dsc_mint,
            liquidator_dsc_ata: self.liquidator_dsc,
            vault_dsc_ata: self.vault_dsc(),
            token_program: spl_token::id(),
            associated_token_program: anchor_spl::associated_token::ID,
            system_program: system_program::id(),
        }
        .to_account_metas(None);
        engine_ix(
            accounts,
            self.feed,
            dsc_engine::instruction::Liquidate { debt_to_cover }.data(),
        )
    }

    fn health_view_ix(&self, owner: Pubkey, data: Vec<u8>) -> Instruction {
        let accounts = dsc_engine::accounts::HealthView {
            config: pda(&[ENGINE_SEED]),
            ledger: ledger_address(&owner),
        }
        .to_account_metas(None);
        engine_ix(accounts, self.feed, data)
    }

    /// 10 collateral tokens backing 5,000 stable units: health factor 2.0.
    async fn open_user_position(&mut self) {
        let ix = self.manage_position_ix(
            dsc_engine::instruction::DepositCollateralAndMintDsc {
                amount_collateral: 10 * COLLATERAL,
                amount_dsc_to_mint: 5_000 * DSC,
            }
            .data(),
        );
        send(&mut self.context, &[ix], &[&self.user]).await.unwrap();
    }

    async fn ledger_of(&mut self, owner: Pubkey) -> UserLedger {
        fetch(&mut self.context, ledger_address(&owner)).await.unwrap()
    }
}

#[tokio::test]
async fn price_feed_records_rounds() {
    let mut context = program_test().start_with_context().await;
    let asset = Pubkey::new_unique();
    let authority = context.payer.pubkey();

    send(
        &mut context,
        &[
            initialize_feed_ix(authority, asset),
            update_price_ix(authority, asset, feed_price(2_000)),
        ],
        &[],
    )
    .await
    .unwrap();

    let feed: PriceFeed = fetch(&mut context, PriceFeed::address(&asset).0)
        .await
        .unwrap();
    assert_eq!(feed.asset, asset);
    assert_eq!(feed.price, feed_price(2_000));
    assert_eq!(feed.decimals, price_feed::FEED_DECIMALS);
    assert_eq!(feed.round_id, 1);
    assert!(feed.updated_at > 0);
}

#[tokio::test]
async fn price_feed_rejects_strangers_and_non_positive_prices() {
    let mut context = program_test().start_with_context().await;
    let asset = Pubkey::new_unique();
    let authority = context.payer.pubkey();
    send(&mut context, &[initialize_feed_ix(authority, asset)], &[])
        .await
        .unwrap();

    let stranger = Keypair::new();
    let err = send(
        &mut context,
        &[update_price_ix(stranger.pubkey(), asset, feed_price(1))],
        &[&stranger],
    )
    .await
    .expect_err("stranger cannot push prices");
    assert_eq!(custom_code(err), u32::from(PriceFeedError::Unauthorized));

    let err = send(&mut context, &[update_price_ix(authority, asset, 0)], &[])
        .await
        .expect_err("zero price is refused");
    assert_eq!(custom_code(err), u32::from(PriceFeedError::InvalidPrice));
}

#[tokio::test]
async fn engine_initialization_validates_its_inputs() {
    let mut program_test = program_test();
    let vault_authority = pda(&[VAULT_AUTHORITY_SEED]);
    let collateral_mint = Pubkey::new_unique();
    let dsc_mint = Pubkey::new_unique();
    let foreign_dsc_mint = Pubkey::new_unique();
    add_token_owned(
        &mut program_test,
        collateral_mint,
        mint_data(Pubkey::new_unique(), COLLATERAL_DECIMALS),
    );
    add_token_owned(&mut program_test, dsc_mint, mint_data(vault_authority, DSC_DECIMALS));
    add_token_owned(
        &mut program_test,
        foreign_dsc_mint,
        mint_data(Pubkey::new_unique(), DSC_DECIMALS),
    );
    let mut context = program_test.start_with_context().await;
    let payer = context.payer.pubkey();
    let feed = PriceFeed::address(&collateral_mint).0;

    let err = send(
        &mut context,
        &[initialize_engine_ix(
            payer,
            dsc_mint,
            vec![collateral_mint],
            vec![feed, Pubkey::new_unique()],
        )],
        &[],
    )
    .await
    .expect_err("mismatched lists");
    assert_eq!(
        custom_code(err),
        u32::from(DscError::TokenAddressesAndPriceFeedAddressesMustBeSameLength)
    );

    let err = send(
        &mut context,
        &[initialize_engine_ix(
            payer,
            foreign_dsc_mint,
            vec![collateral_mint],
            vec![feed],
        )],
        &[],
    )
    .await
    .expect_err("stable mint must belong to the engine");
    assert_eq!(
        custom_code(err),
        u32::from(DscError::StableMintAuthorityMismatch)
    );

    send(
        &mut context,
        &[initialize_engine_ix(payer, dsc_mint, vec![collateral_mint], vec![feed])],
        &[],
    )
    .await
    .unwrap();
    let config: EngineConfig = fetch(&mut context, pda(&[ENGINE_SEED])).await.unwrap();
    assert_eq!(config.stable_mint, dsc_mint);
    assert_eq!(config.stable_decimals, DSC_DECIMALS);
    assert_eq!(config.feed_authority, payer);
    assert_eq!(config.collateral_assets.len(), 1);
    assert_eq!(config.collateral_assets[0].mint, collateral_mint);
    assert_eq!(config.collateral_assets[0].price_feed, feed);
    assert_eq!(config.collateral_assets[0].decimals, COLLATERAL_DECIMALS);
}

#[tokio::test]
async fn deposit_mint_and_burn_move_tokens() {
    let mut d = Deployment::start().await;
    d.open_user_position().await;

    let user = d.user.pubkey();
    let ledger = d.ledger_of(user).await;
    assert_eq!(ledger.owner, user);
    assert_eq!(ledger.collateral, vec![u128::from(10 * COLLATERAL)]);
    assert_eq!(ledger.dsc_minted, 5_000 * PRECISION);
    assert_eq!(token_balance(&mut d.context, d.user_dsc).await, 5_000 * DSC);
    let vault_collateral = d.vault_collateral();
    assert_eq!(token_balance(&mut d.context, vault_collateral).await, 10 * COLLATERAL);
    assert_eq!(token_balance(&mut d.context, d.user_collateral).await, 0);

    let burn = d.manage_debt_ix(
        user,
        d.user_dsc,
        dsc_engine::instruction::BurnDsc { amount: 1_000 * DSC }.data(),
    );
    send(&mut d.context, &[burn], &[&d.user]).await.unwrap();

    let ledger = d.ledger_of(user).await;
    assert_eq!(ledger.dsc_minted, 4_000 * PRECISION);
    assert_eq!(token_balance(&mut d.context, d.user_dsc).await, 4_000 * DSC);
    let vault_dsc = d.vault_dsc();
    assert_eq!(token_balance(&mut d.context, vault_dsc).await, 0);
}

#[tokio::test]
async fn redemptions_return_collateral_until_health_breaks() {
    let mut d = Deployment::start().await;
    d.open_user_position().await;
    let user = d.user.pubkey();

    let redeem = d.manage_collateral_ix(
        user,
        d.user_collateral,
        dsc_engine::instruction::RedeemCollateral {
            amount_collateral: 2 * COLLATERAL,
        }
        .data(),
    );
    send(&mut d.context, &[redeem], &[&d.user]).await.unwrap();
    assert_eq!(d.ledger_of(user).await.collateral, vec![u128::from(8 * COLLATERAL)]);
    assert_eq!(token_balance(&mut d.context, d.user_collateral).await, 2 * COLLATERAL);

    let redeem_for_dsc = d.manage_position_ix(
        dsc_engine::instruction::RedeemCollateralForDsc {
            amount_collateral: 4 * COLLATERAL,
            amount_dsc_to_burn: 2_000 * DSC,
        }
        .data(),
    );
    send(&mut d.context, &[redeem_for_dsc], &[&d.user]).await.unwrap();
    let ledger = d.ledger_of(user).await;
    assert_eq!(ledger.collateral, vec![u128::from(4 * COLLATERAL)]);
    assert_eq!(ledger.dsc_minted, 3_000 * PRECISION);
    assert_eq!(token_balance(&mut d.context, d.user_collateral).await, 6 * COLLATERAL);
    assert_eq!(token_balance(&mut d.context, d.user_dsc).await, 3_000 * DSC);

    // 1 token left would back only $1,000 of a 3,000 debt
    let too_much = d.manage_collateral_ix(
        user,
        d.user_collateral,
        dsc_engine::instruction::RedeemCollateral {
            amount_collateral: 3 * COLLATERAL,
        }
        .data(),
    );
    let err = send(&mut d.context, &[too_much], &[&d.user])
        .await
        .expect_err("redeem breaks health");
    assert_eq!(custom_code(err), u32::from(DscError::BreaksHealthFactor));
    assert_eq!(d.ledger_of(user).await.collateral, vec![u128::from(4 * COLLATERAL)]);
    assert_eq!(token_balance(&mut d.context, d.user_collateral).await, 6 * COLLATERAL);
}

#[tokio::test]
async fn views_report_health_and_account_information() {
    let mut d = Deployment::start().await;
    d.open_user_position().await;
    let user = d.user.pubkey();

    let ix = d.health_view_ix(user, dsc_engine::instruction::GetHealthFactor {}.data());
    let data = view(&mut d.context, ix).await;
    assert_eq!(u128::try_from_slice(&data).unwrap(), 2 * PRECISION);

    let ix = d.health_view_ix(user, dsc_engine::instruction::GetAccountInformation {}.data());
    let data = view(&mut d.context, ix).await;
    assert_eq!(
        AccountInformation::try_from_slice(&data).unwrap(),
        AccountInformation {
            total_dsc_minted: 5_000 * PRECISION,
            collateral_value_in_usd: 20_000 * PRECISION,
        }
    );
}

#[tokio::test]
async fn undercollateralized_position_is_liquidated_with_bonus() {
    let mut d = Deployment::start().await;
    d.open_user_position().await;
    let user = d.user.pubkey();
    let liquidator = d.liquidator.pubkey();

    // The liquidator borrows its stable units against its own collateral.
    let deposit = d.manage_collateral_ix(
        liquidator,
        d.liquidator_collateral,
        dsc_engine::instruction::DepositCollateral {
            amount_collateral: 20 * COLLATERAL,
        }
        .data(),
    );
    let mint = d.manage_debt_ix(
        liquidator,
        d.liquidator_dsc,
        dsc_engine::instruction::MintDsc {
            amount_dsc_to_mint: 2_000 * DSC,
        }
        .data(),
    );
    send(&mut d.context, &[deposit, mint], &[&d.liquidator])
        .await
        .unwrap();
    assert_eq!(token_balance(&mut d.context, d.liquidator_dsc).await, 2_000 * DSC);

    d.set_price(400).await;
    let ix = d.health_view_ix(user, dsc_engine::instruction::GetHealthFactor {}.data());
    let data = view(&mut d.context, ix).await;
    assert_eq!(u128::try_from_slice(&data).unwrap(), 4 * PRECISION / 10);

    let liquidate = d.liquidate_ix(2_000 * DSC);
    send(&mut d.context, &[liquidate], &[&d.liquidator])
        .await
        .unwrap();

    let target = d.ledger_of(user).await;
    assert_eq!(target.dsc_minted, 3_000 * PRECISION);
    assert_eq!(target.collateral, vec![u128::from(45 * COLLATERAL / 10)]);
    let own = d.ledger_of(liquidator).await;
    assert_eq!(own.dsc_minted, 2_000 * PRECISION);
    assert_eq!(own.collateral, vec![u128::from(20 * COLLATERAL)]);

    let seized_to = get_associated_token_address(&liquidator, &d.collateral_mint);
    assert_eq!(token_balance(&mut d.context, seized_to).await, 55 * COLLATERAL / 10);
    assert_eq!(token_balance(&mut d.context, d.liquidator_dsc).await, 0);
    let vault_collateral = d.vault_collateral();
    assert_eq!(
        token_balance(&mut d.context, vault_collateral).await,
        245 * COLLATERAL / 10
    );
    let vault_dsc = d.vault_dsc();
    assert_eq!(token_balance(&mut d.context, vault_dsc).await, 0);

    let ix = d.health_view_ix(user, dsc_engine::instruction::GetHealthFactor {}.data());
    let data = view(&mut d.context, ix).await;
    assert_eq!(u128::try_from_slice(&data).unwrap(), 3 * PRECISION / 10);
}

#[tokio::test]
async fn healthy_position_cannot_be_liquidated_on_chain() {
    let mut d = Deployment::start().await;
    d.open_user_position().await;

    let liquidate = d.liquidate_ix(DSC);
    let err = send(&mut d.context, &[liquidate], &[&d.liquidator])
        .await
        .expect_err("healthy position");
    assert_eq!(custom_code(err), u32::from(DscError::HealthFactorOk));
    assert_eq!(d.ledger_of(d.user.pubkey()).await.dsc_minted, 5_000 * PRECISION);
}

#[tokio::test]
async fn feeds_from_other_authorities_are_not_trusted() {
    let mut program_test = program_test();
    let vault_authority = pda(&[VAULT_AUTHORITY_SEED]);
    let collateral_mint = Pubkey::new_unique();
    let dsc_mint = Pubkey::new_unique();
    let user = Keypair::new();
    let user_collateral = Pubkey::new_unique();
    let user_dsc = Pubkey::new_unique();
    add_token_owned(
        &mut program_test,
        collateral_mint,
        mint_data(Pubkey::new_unique(), COLLATERAL_DECIMALS),
    );
    add_token_owned(&mut program_test, dsc_mint, mint_data(vault_authority, DSC_DECIMALS));
    add_token_owned(
        &mut program_test,
        user_collateral,
        token_account_data(collateral_mint, user.pubkey(), 10 * COLLATERAL),
    );
    add_token_owned(
        &mut program_test,
        user_dsc,
        token_account_data(dsc_mint, user.pubkey(), 0),
    );

    let mut context = program_test.start_with_context().await;
    fund(&mut context, &user.pubkey()).await;
    let payer = context.payer.pubkey();
    let feed = PriceFeed::address(&collateral_mint).0;

    // The user claims the feed before the engine's price authority does.
    send(
        &mut context,
        &[
            initialize_feed_ix(user.pubkey(), collateral_mint),
            update_price_ix(user.pubkey(), collateral_mint, feed_price(1_000_000)),
        ],
        &[&user],
    )
    .await
    .unwrap();
    send(
        &mut context,
        &[initialize_engine_ix(payer, dsc_mint, vec![collateral_mint], vec![feed])],
        &[],
    )
    .await
    .unwrap();

    let accounts = dsc_engine::accounts::ManagePosition {
        config: pda(&[ENGINE_SEED]),
        ledger: ledger_address(&user.pubkey()),
        user: user.pubkey(),
        vault_authority,
        collateral_mint,
        user_collateral_ata: user_collateral,
        vault_collateral_ata: get_associated_token_address(&vault_authority, &collateral_mint),
        dsc_mint,
        user_dsc_ata: user_dsc,
        vault_dsc_ata: get_associated_token_address(&vault_authority, &dsc_mint),
        token_program: spl_token::id(),
        associated_token_program: anchor_spl::associated_token::ID,
        system_program: system_program::id(),
    }
    .to_account_metas(None);
    let ix = engine_ix(
        accounts,
        feed,
        dsc_engine::instruction::DepositCollateralAndMintDsc {
            amount_collateral: COLLATERAL,
            amount_dsc_to_mint: 100_000 * DSC,
        }
        .data(),
    );
    let err = send(&mut context, &[ix], &[&user])
        .await
        .expect_err("self-priced feed");
    assert_eq!(custom_code(err), u32::from(DscError::PriceFeedMismatch));
}
