use solana_program::{
    bpf_loader_upgradeable::{self, UpgradeableLoaderState},
    clock::Clock,
    instruction::{Instruction, InstructionError},
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction, system_program,
};
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::{
    account::Account,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use spl_token::state::{Account as TokenAccount, Mint};

use custodial_vault::{
    error::VaultError,
    instruction::{self as vault_ix, VaultInstruction},
    pda::{HolderPDA, LedgerPDA, ProgramDataPDA, VaultAuthorityPDA},
    processor::Processor,
    state::{HolderAccount, Ledger, SchemaVersion},
};

struct Fixture {
    context: ProgramTestContext,
    program_id: Pubkey,
    deployer: Keypair,
    mint: Keypair,
    vault_token: Keypair,
    holder: Keypair,
    holder_token: Keypair,
}

impl Fixture {
    async fn start() -> Self {
        let program_id = custodial_vault::id();
        let deployer = Keypair::new();
        let mut program_test =
            ProgramTest::new("custodial_vault", program_id, processor!(Processor::process));

        // Loader metadata naming the deployer as upgrade authority
        let program_data = bincode::serialize(&UpgradeableLoaderState::ProgramData {
            slot: 0,
            upgrade_authority_address: Some(deployer.pubkey()),
        })
        .unwrap();
        program_test.add_account(
            ProgramDataPDA::derive(&program_id),
            Account {
                lamports: 1_000_000_000,
                data: program_data,
                owner: bpf_loader_upgradeable::id(),
                executable: false,
                rent_epoch: 0,
            },
        );
        program_test.add_account(
            deployer.pubkey(),
            Account::new(10_000_000_000, 0, &system_program::id()),
        );

        let mut context = program_test.start_with_context().await;

        let mint = Keypair::new();
        let vault_token = Keypair::new();
        let holder = Keypair::new();
        let holder_token = Keypair::new();

        let (ledger, _) = LedgerPDA::derive(&program_id, &mint.pubkey());
        let (vault_authority, _) = VaultAuthorityPDA::derive(&program_id, &ledger);

        let rent = context.banks_client.get_rent().await.unwrap();
        let payer = context.payer.pubkey();
        let instructions = vec![
            system_instruction::create_account(
                &payer,
                &mint.pubkey(),
                rent.minimum_balance(Mint::LEN),
                Mint::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint(
                &spl_token::id(),
                &mint.pubkey(),
                &payer,
                None,
                6,
            )
            .unwrap(),
            system_instruction::create_account(
                &payer,
                &vault_token.pubkey(),
                rent.minimum_balance(TokenAccount::LEN),
                TokenAccount::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_account(
                &spl_token::id(),
                &vault_token.pubkey(),
                &mint.pubkey(),
                &vault_authority,
            )
            .unwrap(),
            system_instruction::create_account(
                &payer,
                &holder_token.pubkey(),
                rent.minimum_balance(TokenAccount::LEN),
                TokenAccount::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_account(
                &spl_token::id(),
                &holder_token.pubkey(),
                &mint.pubkey(),
                &holder.pubkey(),
            )
            .unwrap(),
            spl_token::instruction::mint_to(
                &spl_token::id(),
                &mint.pubkey(),
                &holder_token.pubkey(),
                &payer,
                &[],
                10_000,
            )
            .unwrap(),
            // Holder pays rent for its own record
            system_instruction::transfer(&payer, &holder.pubkey(), 1_000_000_000),
        ];

        let mut transaction = Transaction::new_with_payer(&instructions, Some(&payer));
        transaction.sign(
            &[&context.payer, &mint, &vault_token, &holder_token],
            context.last_blockhash,
        );
        context.banks_client.process_transaction(transaction).await.unwrap();

        Self {
            context,
            program_id,
            deployer,
            mint,
            vault_token,
            holder,
            holder_token,
        }
    }

    fn ledger_key(&self) -> Pubkey {
        LedgerPDA::derive(&self.program_id, &self.mint.pubkey()).0
    }

    fn holder_pda(&self) -> Pubkey {
        HolderPDA::derive(&self.program_id, &self.ledger_key(), &self.holder.pubkey()).0
    }

    async fn send(&mut self, ix: Instruction, signer: Signers) -> Result<(), BanksClientError> {
        let blockhash = self.context.get_new_latest_blockhash().await.unwrap();
        let payer = self.context.payer.pubkey();
        let mut transaction = Transaction::new_with_payer(&[ix], Some(&payer));
        match signer {
            Signers::Admin => transaction.sign(&[&self.context.payer], blockhash),
            Signers::Holder => transaction.sign(&[&self.context.payer, &self.holder], blockhash),
            Signers::Deployer => {
                transaction.sign(&[&self.context.payer, &self.deployer], blockhash)
            }
        }
        self.context.banks_client.process_transaction(transaction).await
    }

    async fn initialize(&mut self, fee_bps: u16) -> Result<(), BanksClientError> {
        self.initialize_as(Signers::Deployer, fee_bps).await
    }

    /// Initialize with `signer` paying; the admin role always goes to the context payer
    async fn initialize_as(
        &mut self,
        signer: Signers,
        fee_bps: u16,
    ) -> Result<(), BanksClientError> {
        let payer = match signer {
            Signers::Admin => self.context.payer.pubkey(),
            Signers::Holder => self.holder.pubkey(),
            Signers::Deployer => self.deployer.pubkey(),
        };
        let ix = vault_ix::initialize(
            &self.program_id,
            &payer,
            &self.mint.pubkey(),
            &self.vault_token.pubkey(),
            &self.context.payer.pubkey(),
            fee_bps,
        );
        self.send(ix, signer).await
    }

    async fn deposit(&mut self, amount: u64) -> Result<(), BanksClientError> {
        let ix = vault_ix::deposit(
            &self.program_id,
            &self.holder.pubkey(),
            &self.mint.pubkey(),
            &self.holder_token.pubkey(),
            &self.vault_token.pubkey(),
            amount,
        );
        self.send(ix, Signers::Holder).await
    }

    /// Send lamports to an address from the context payer
    async fn fund(&mut self, to: Pubkey, lamports: u64) {
        let ix = system_instruction::transfer(&self.context.payer.pubkey(), &to, lamports);
        self.send(ix, Signers::Admin).await.unwrap();
    }

    async fn admin(&mut self, instruction: VaultInstruction) -> Result<(), BanksClientError> {
        let ix = vault_ix::ledger_admin(
            &self.program_id,
            &self.context.payer.pubkey(),
            &self.mint.pubkey(),
            instruction,
        );
        self.send(ix, Signers::Admin).await
    }

    async fn ledger(&mut self) -> Ledger {
        let account = self
            .context
            .banks_client
            .get_account(self.ledger_key())
            .await
            .unwrap()
            .unwrap();
        Ledger::unpack(&account.data).unwrap()
    }

    async fn holder_record(&mut self) -> HolderAccount {
        let holder_pda = self.holder_pda();
        let account = self
            .context
            .banks_client
            .get_account(holder_pda)
            .await
            .unwrap()
            .unwrap();
        HolderAccount::unpack(&account.data).unwrap()
    }

    async fn token_balance(&mut self, account: Pubkey) -> u64 {
        let account = self
            .context
            .banks_client
            .get_account(account)
            .await
            .unwrap()
            .unwrap();
        TokenAccount::unpack(&account.data).unwrap().amount
    }

    async fn warp_by(&mut self, seconds: i64) {
        let mut clock: Clock = self.context.banks_client.get_sysvar().await.unwrap();
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }
}

enum Signers {
    Admin,
    Holder,
    Deployer,
}

fn vault_error(err: BanksClientError) -> TransactionError {
    err.unwrap()
}

fn custom(code: VaultError) -> TransactionError {
    TransactionError::InstructionError(0, InstructionError::Custom(code as u32))
}

#[tokio::test]
async fn test_initialize_deposit_withdraw() {
    let mut fx = Fixture::start().await;
    fx.initialize(500).await.unwrap();

    let ledger = fx.ledger().await;
    assert_eq!(ledger.schema_version, SchemaVersion::V1);
    assert_eq!(ledger.deposit_fee_bps, 500);
    assert_eq!(ledger.vault_token_account, fx.vault_token.pubkey());

    let ix = vault_ix::deposit(
        &fx.program_id,
        &fx.holder.pubkey(),
        &fx.mint.pubkey(),
        &fx.holder_token.pubkey(),
        &fx.vault_token.pubkey(),
        1_000,
    );
    fx.send(ix, Signers::Holder).await.unwrap();

    assert_eq!(fx.holder_record().await.balance, 950);
    assert_eq!(fx.ledger().await.total_deposits, 950);
    assert_eq!(fx.token_balance(fx.vault_token.pubkey()).await, 1_000);

    let ix = vault_ix::withdraw(
        &fx.program_id,
        &fx.holder.pubkey(),
        &fx.mint.pubkey(),
        &fx.holder_token.pubkey(),
        &fx.vault_token.pubkey(),
        450,
    );
    fx.send(ix, Signers::Holder).await.unwrap();

    assert_eq!(fx.holder_record().await.balance, 500);
    assert_eq!(fx.token_balance(fx.holder_token.pubkey()).await, 9_450);
    assert_eq!(fx.token_balance(fx.vault_token.pubkey()).await, 550);
}

#[tokio::test]
async fn test_initialize_only_once() {
    let mut fx = Fixture::start().await;
    fx.initialize(100).await.unwrap();

    let err = fx.initialize(200).await.unwrap_err();
    assert_eq!(vault_error(err), custom(VaultError::AlreadyInitialized));
    assert_eq!(fx.ledger().await.deposit_fee_bps, 100);
}

#[tokio::test]
async fn test_initialize_requires_upgrade_authority() {
    let mut fx = Fixture::start().await;

    for signer in [Signers::Holder, Signers::Admin] {
        let err = fx.initialize_as(signer, 0).await.unwrap_err();
        assert_eq!(vault_error(err), custom(VaultError::Unauthorized));
    }
    let ledger = fx.context.banks_client.get_account(fx.ledger_key()).await.unwrap();
    assert!(ledger.is_none());

    fx.initialize(0).await.unwrap();
    assert_eq!(fx.ledger().await.roles.admin, fx.context.payer.pubkey());
}

#[tokio::test]
async fn test_initialize_into_prefunded_ledger_address() {
    let mut fx = Fixture::start().await;
    let ledger_key = fx.ledger_key();
    fx.fund(ledger_key, 5_000_000_000).await;

    fx.initialize(250).await.unwrap();

    let account = fx.context.banks_client.get_account(ledger_key).await.unwrap().unwrap();
    assert_eq!(account.owner, fx.program_id);
    assert_eq!(account.data.len(), Ledger::LEN);
    assert_eq!(fx.ledger().await.deposit_fee_bps, 250);
}

#[tokio::test]
async fn test_first_deposit_into_prefunded_holder_address() {
    let mut fx = Fixture::start().await;
    fx.initialize(0).await.unwrap();

    // Less than the rent minimum, so the deposit has to top it up
    let holder_pda = fx.holder_pda();
    fx.fund(holder_pda, 1_000_000).await;

    fx.deposit(100).await.unwrap();

    let account = fx.context.banks_client.get_account(holder_pda).await.unwrap().unwrap();
    let rent = fx.context.banks_client.get_rent().await.unwrap();
    assert_eq!(account.owner, fx.program_id);
    assert_eq!(account.lamports, rent.minimum_balance(HolderAccount::LEN));
    assert_eq!(fx.holder_record().await.balance, 100);
    assert_eq!(fx.ledger().await.total_deposits, 100);
}

#[tokio::test]
async fn test_migration_requires_upgrader() {
    let mut fx = Fixture::start().await;
    fx.initialize(0).await.unwrap();

    let ix = vault_ix::migrate(
        &fx.program_id,
        &fx.holder.pubkey(),
        &fx.mint.pubkey(),
        SchemaVersion::V2,
    );
    let err = fx.send(ix, Signers::Holder).await.unwrap_err();
    assert_eq!(vault_error(err), custom(VaultError::Unauthorized));

    let err = fx
        .admin(VaultInstruction::Migrate {
            target: SchemaVersion::V3,
        })
        .await
        .unwrap_err();
    assert_eq!(vault_error(err), custom(VaultError::MigrationOutOfOrder));
    assert_eq!(fx.ledger().await.schema_version, SchemaVersion::V1);
}

#[tokio::test]
async fn test_delayed_withdrawal_after_upgrade() {
    let mut fx = Fixture::start().await;
    fx.initialize(0).await.unwrap();

    // Holder record is created at V1 and follows the ledger lazily
    let ix = vault_ix::deposit(
        &fx.program_id,
        &fx.holder.pubkey(),
        &fx.mint.pubkey(),
        &fx.holder_token.pubkey(),
        &fx.vault_token.pubkey(),
        2_000,
    );
    fx.send(ix, Signers::Holder).await.unwrap();

    for target in [SchemaVersion::V2, SchemaVersion::V3] {
        fx.admin(VaultInstruction::Migrate { target }).await.unwrap();
    }
    let ledger = fx.ledger().await;
    assert_eq!(ledger.extension_budget, 45);
    assert_eq!(ledger.holder_extension_budget, 15);
    assert_eq!(ledger.total_deposits, 2_000);

    let ix = vault_ix::migrate_holder(&fx.program_id, &fx.mint.pubkey(), &fx.holder.pubkey());
    fx.send(ix, Signers::Admin).await.unwrap();
    assert_eq!(fx.holder_record().await.schema_version, SchemaVersion::V3);

    fx.admin(VaultInstruction::SetWithdrawalDelay { seconds: 3_600 })
        .await
        .unwrap();

    let ix = vault_ix::withdraw(
        &fx.program_id,
        &fx.holder.pubkey(),
        &fx.mint.pubkey(),
        &fx.holder_token.pubkey(),
        &fx.vault_token.pubkey(),
        500,
    );
    fx.send(ix, Signers::Holder).await.unwrap();

    let holder = fx.holder_record().await;
    assert_eq!(holder.balance, 2_000);
    assert_eq!(holder.pending().map(|request| request.amount), Some(500));
    assert_eq!(fx.token_balance(fx.holder_token.pubkey()).await, 8_000);

    let execute = vault_ix::execute_withdrawal(
        &fx.program_id,
        &fx.holder.pubkey(),
        &fx.mint.pubkey(),
        &fx.holder_token.pubkey(),
        &fx.vault_token.pubkey(),
    );
    let err = fx.send(execute.clone(), Signers::Holder).await.unwrap_err();
    assert_eq!(vault_error(err), custom(VaultError::DelayNotElapsed));

    fx.warp_by(3_600).await;
    fx.send(execute, Signers::Holder).await.unwrap();

    assert_eq!(fx.holder_record().await.balance, 1_500);
    assert_eq!(fx.token_balance(fx.holder_token.pubkey()).await, 8_500);

    let ix = vault_ix::emergency_withdraw(
        &fx.program_id,
        &fx.holder.pubkey(),
        &fx.mint.pubkey(),
        &fx.holder_token.pubkey(),
        &fx.vault_token.pubkey(),
    );
    fx.send(ix, Signers::Holder).await.unwrap();

    assert_eq!(fx.holder_record().await.balance, 0);
    assert_eq!(fx.ledger().await.total_deposits, 0);
    assert_eq!(fx.token_balance(fx.holder_token.pubkey()).await, 10_000);
    assert_eq!(fx.token_balance(fx.vault_token.pubkey()).await, 0);
}

#[tokio::test]
async fn test_paused_deposits_rejected() {
    let mut fx = Fixture::start().await;
    fx.initialize(0).await.unwrap();
    fx.admin(VaultInstruction::Migrate {
        target: SchemaVersion::V2,
    })
    .await
    .unwrap();
    fx.admin(VaultInstruction::PauseDeposits).await.unwrap();

    let ix = vault_ix::deposit(
        &fx.program_id,
        &fx.holder.pubkey(),
        &fx.mint.pubkey(),
        &fx.holder_token.pubkey(),
        &fx.vault_token.pubkey(),
        100,
    );
    let err = fx.send(ix, Signers::Holder).await.unwrap_err();
    assert_eq!(vault_error(err), custom(VaultError::DepositsPaused));
    assert_eq!(fx.token_balance(fx.vault_token.pubkey()).await, 0);
}
