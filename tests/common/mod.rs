#![allow(dead_code)]

use solana_program_test::*;
use solana_sdk::{
    account::Account,
    clock::Clock,
    instruction::{Instruction, InstructionError},
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    transaction::{Transaction, TransactionError},
};

use sol_raffle::{
    coordinator_state::{Coordinator, Subscription},
    deploy::{plan_deployment, DeployPlan, STEP_DEPLOY_MOCKS, STEP_DEPLOY_RAFFLE},
    error::RaffleError,
    instruction::{check_upkeep, enter_raffle, perform_upkeep},
    process_instruction,
    state::{CheckUpkeepResult, Raffle},
    utils::{find_subscription_address, pot_balance},
};

/// 0.01 SOL, the entrance fee of the local network configuration
pub const ENTRANCE_FEE: u64 = 10_000_000;
pub const INTERVAL: i64 = 30;

/// A raffle deployed on a fresh mock coordinator
pub struct Fixture {
    pub context: ProgramTestContext,
    pub program_id: Pubkey,
    pub raffle: Keypair,
    pub coordinator: Keypair,
    pub plan: DeployPlan,
}

pub fn program_test(program_id: Pubkey) -> ProgramTest {
    ProgramTest::new("sol_raffle", program_id, processor!(process_instruction))
}

/// Start a test validator and run the local deployment plan on it
pub async fn setup() -> Fixture {
    let program_id = Pubkey::new_unique();
    let mut context = program_test(program_id).start_with_context().await;

    let raffle = Keypair::new();
    let coordinator = Keypair::new();
    let plan = plan_deployment(
        &program_id,
        "localnet",
        &context.payer.pubkey(),
        &raffle.pubkey(),
        Some(&coordinator.pubkey()),
    )
    .unwrap();

    for step in &plan.steps {
        let extra_signers: Vec<&Keypair> = match step.label {
            STEP_DEPLOY_MOCKS => vec![&coordinator],
            STEP_DEPLOY_RAFFLE => vec![&raffle],
            _ => vec![],
        };
        process(&mut context, &step.instructions, &extra_signers)
            .await
            .unwrap();
    }

    Fixture {
        context,
        program_id,
        raffle,
        coordinator,
        plan,
    }
}

/// Send `instructions` in one transaction paid by the context payer
pub async fn process(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    extra_signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let mut signers: Vec<&Keypair> = vec![&context.payer];
    signers.extend_from_slice(extra_signers);
    let transaction = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        &signers,
        context.last_blockhash,
    );
    context.banks_client.process_transaction(transaction).await
}

/// Custom program error code carried by a failed transaction
pub fn custom_error(result: Result<(), BanksClientError>) -> u32 {
    match result.unwrap_err().unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => code,
        error => panic!("unexpected error {:?}", error),
    }
}

pub fn assert_raffle_error(result: Result<(), BanksClientError>, expected: RaffleError) {
    assert_eq!(custom_error(result), expected as u32);
}

pub async fn get_account(context: &mut ProgramTestContext, address: &Pubkey) -> Option<Account> {
    context.banks_client.get_account(*address).await.unwrap()
}

pub async fn get_raffle(context: &mut ProgramTestContext, raffle: &Pubkey) -> Raffle {
    let account = get_account(context, raffle).await.unwrap();
    Raffle::unpack(&account.data).unwrap()
}

pub async fn get_coordinator(context: &mut ProgramTestContext, coordinator: &Pubkey) -> Coordinator {
    let account = get_account(context, coordinator).await.unwrap();
    Coordinator::unpack(&account.data).unwrap()
}

pub async fn get_subscription(
    context: &mut ProgramTestContext,
    program_id: &Pubkey,
    coordinator: &Pubkey,
    subscription_id: u64,
) -> Subscription {
    let (address, _) = find_subscription_address(program_id, coordinator, subscription_id);
    let account = get_account(context, &address).await.unwrap();
    Subscription::unpack(&account.data).unwrap()
}

pub async fn lamports(context: &mut ProgramTestContext, address: &Pubkey) -> u64 {
    get_account(context, address)
        .await
        .map(|account| account.lamports)
        .unwrap_or(0)
}

/// Lamports the raffle holds above its rent-exempt minimum
pub async fn pot(context: &mut ProgramTestContext, raffle: &Pubkey) -> u64 {
    let account = get_account(context, raffle).await.unwrap();
    let rent = context.banks_client.get_rent().await.unwrap();
    pot_balance(account.lamports, rent.minimum_balance(account.data.len()))
}

pub async fn now(context: &mut ProgramTestContext) -> i64 {
    context
        .banks_client
        .get_sysvar::<Clock>()
        .await
        .unwrap()
        .unix_timestamp
}

/// Move the cluster clock forward by `seconds`
pub async fn warp_seconds(context: &mut ProgramTestContext, seconds: i64) {
    let mut clock = context.banks_client.get_sysvar::<Clock>().await.unwrap();
    clock.unix_timestamp += seconds;
    context.set_sysvar(&clock);
}

/// Simulate CheckUpkeep against the raffle and decode its return data
pub async fn simulate_check_upkeep(fixture: &mut Fixture) -> CheckUpkeepResult {
    let instruction = check_upkeep(&fixture.program_id, &fixture.raffle.pubkey(), vec![]);
    let last_blockhash = fixture.context.last_blockhash;
    fixture.context.last_blockhash = fixture
        .context
        .banks_client
        .get_new_latest_blockhash(&last_blockhash)
        .await
        .unwrap();
    let transaction = Transaction::new_signed_with_payer(
        &[instruction],
        Some(&fixture.context.payer.pubkey()),
        &[&fixture.context.payer],
        fixture.context.last_blockhash,
    );
    let simulation = fixture
        .context
        .banks_client
        .simulate_transaction(transaction)
        .await
        .unwrap();
    simulation.result.unwrap().unwrap();

    let data = simulation
        .simulation_details
        .and_then(|details| details.return_data)
        .map(|return_data| return_data.data)
        .unwrap_or_default();
    CheckUpkeepResult::unpack_return_data(&data).unwrap()
}

/// Upkeep answer reported by the program for the raffle's current state
pub async fn upkeep_needed(fixture: &mut Fixture) -> bool {
    simulate_check_upkeep(fixture).await.upkeep_needed
}

/// A funded player account
pub async fn new_player(context: &mut ProgramTestContext) -> Keypair {
    let player = Keypair::new();
    let fund = system_instruction::transfer(
        &context.payer.pubkey(),
        &player.pubkey(),
        1_000_000_000,
    );
    process(context, &[fund], &[]).await.unwrap();
    player
}

pub async fn enter(
    fixture: &mut Fixture,
    player: &Keypair,
    amount: u64,
) -> Result<(), BanksClientError> {
    let instruction = enter_raffle(
        &fixture.program_id,
        &player.pubkey(),
        &fixture.raffle.pubkey(),
        amount,
    );
    process(&mut fixture.context, &[instruction], &[player]).await
}

/// Enter `count` fresh players and return them in entry order
pub async fn enter_players(fixture: &mut Fixture, count: usize) -> Vec<Keypair> {
    let mut players = Vec::with_capacity(count);
    for _ in 0..count {
        let player = new_player(&mut fixture.context).await;
        enter(fixture, &player, ENTRANCE_FEE).await.unwrap();
        players.push(player);
    }
    players
}

/// Perform upkeep as the context payer for the coordinator's next request
pub async fn perform(fixture: &mut Fixture) -> Result<(), BanksClientError> {
    let coordinator = get_coordinator(&mut fixture.context, &fixture.coordinator.pubkey()).await;
    let instruction = perform_upkeep(
        &fixture.program_id,
        &fixture.context.payer.pubkey(),
        &fixture.raffle.pubkey(),
        &fixture.coordinator.pubkey(),
        fixture.plan.raffle_config.subscription_id,
        coordinator.next_request_id,
        vec![],
    );
    process(&mut fixture.context, &[instruction], &[]).await
}
