mod common;

use solana_program_test::*;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
};

use common::*;
use sol_raffle::{
    deploy::{CALLBACK_GAS_LIMIT, GAS_PRICE, VRF_BASE_FEE, VRF_SUB_FUND_AMOUNT},
    error::RaffleError,
    instruction::{
        add_consumer, create_subscription, enter_raffle, fulfill_random_words, fund_subscription,
        initialize_raffle, perform_upkeep,
    },
    keeper::{expected_winner, fulfill_on_mock},
    state::RaffleConfig,
    utils::find_subscription_address,
};

// Deploy a second raffle on the fixture's coordinator drawing from `subscription_id`
async fn deploy_raffle(fixture: &mut Fixture, subscription_id: u64) -> Keypair {
    let raffle = Keypair::new();
    let config = RaffleConfig {
        subscription_id,
        ..fixture.plan.raffle_config
    };
    let instruction = initialize_raffle(
        &fixture.program_id,
        &fixture.context.payer.pubkey(),
        &raffle.pubkey(),
        &config,
    );
    process(&mut fixture.context, &[instruction], &[&raffle])
        .await
        .unwrap();
    raffle
}

// Enter one player and move past the interval
async fn open_round(fixture: &mut Fixture, raffle: &Pubkey) {
    let player = new_player(&mut fixture.context).await;
    let instruction = enter_raffle(&fixture.program_id, &player.pubkey(), raffle, ENTRANCE_FEE);
    process(&mut fixture.context, &[instruction], &[&player])
        .await
        .unwrap();
    warp_seconds(&mut fixture.context, INTERVAL + 1).await;
}

async fn perform_for(
    fixture: &mut Fixture,
    raffle: &Pubkey,
    subscription_id: u64,
) -> Result<(), BanksClientError> {
    let coordinator = get_coordinator(&mut fixture.context, &fixture.coordinator.pubkey()).await;
    let instruction = perform_upkeep(
        &fixture.program_id,
        &fixture.context.payer.pubkey(),
        raffle,
        &fixture.coordinator.pubkey(),
        subscription_id,
        coordinator.next_request_id,
        vec![],
    );
    process(&mut fixture.context, &[instruction], &[]).await
}

#[tokio::test]
async fn test_deployment_funds_subscription_and_adds_consumer() {
    let mut fixture = setup().await;
    let coordinator_key = fixture.coordinator.pubkey();

    let coordinator = get_coordinator(&mut fixture.context, &coordinator_key).await;
    assert_eq!(coordinator.base_fee, VRF_BASE_FEE);
    assert_eq!(coordinator.gas_price, GAS_PRICE);
    assert_eq!(coordinator.next_subscription_id, 2);
    assert_eq!(coordinator.next_request_id, 1);

    let subscription =
        get_subscription(&mut fixture.context, &fixture.program_id, &coordinator_key, 1).await;
    assert_eq!(subscription.owner, fixture.context.payer.pubkey());
    assert_eq!(subscription.balance, VRF_SUB_FUND_AMOUNT);
    assert_eq!(subscription.consumers(), &[fixture.raffle.pubkey()]);
}

#[tokio::test]
async fn test_fulfillment_charges_subscription() {
    let mut fixture = setup().await;
    let coordinator_key = fixture.coordinator.pubkey();
    let raffle_key = fixture.raffle.pubkey();
    open_round(&mut fixture, &raffle_key).await;
    perform_for(&mut fixture, &raffle_key, 1).await.unwrap();
    let coordinator_before = lamports(&mut fixture.context, &coordinator_key).await;

    let raffle = get_raffle(&mut fixture.context, &raffle_key).await;
    let payer = fixture.context.payer.pubkey();
    let instruction =
        fulfill_on_mock(&fixture.program_id, &payer, &raffle_key, &raffle, &payer).unwrap();
    process(&mut fixture.context, &[instruction], &[]).await.unwrap();

    let payment = VRF_BASE_FEE + GAS_PRICE * CALLBACK_GAS_LIMIT as u64;
    let subscription =
        get_subscription(&mut fixture.context, &fixture.program_id, &coordinator_key, 1).await;
    assert_eq!(subscription.balance, VRF_SUB_FUND_AMOUNT - payment);
    assert_eq!(
        lamports(&mut fixture.context, &coordinator_key).await,
        coordinator_before + payment
    );
}

#[tokio::test]
async fn test_request_ids_increase() {
    let mut fixture = setup().await;
    let raffle_key = fixture.raffle.pubkey();

    open_round(&mut fixture, &raffle_key).await;
    perform_for(&mut fixture, &raffle_key, 1).await.unwrap();
    let first = get_raffle(&mut fixture.context, &raffle_key)
        .await
        .pending_request
        .unwrap();

    let raffle = get_raffle(&mut fixture.context, &raffle_key).await;
    let payer = fixture.context.payer.pubkey();
    let instruction =
        fulfill_on_mock(&fixture.program_id, &payer, &raffle_key, &raffle, &payer).unwrap();
    process(&mut fixture.context, &[instruction], &[]).await.unwrap();

    open_round(&mut fixture, &raffle_key).await;
    perform_for(&mut fixture, &raffle_key, 1).await.unwrap();
    let second = get_raffle(&mut fixture.context, &raffle_key)
        .await
        .pending_request
        .unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 2);
}

#[tokio::test]
async fn test_unregistered_consumer_cannot_request() {
    let mut fixture = setup().await;
    let outsider = deploy_raffle(&mut fixture, 1).await;
    open_round(&mut fixture, &outsider.pubkey()).await;

    let result = perform_for(&mut fixture, &outsider.pubkey(), 1).await;
    assert_raffle_error(result, RaffleError::InvalidConsumer);
}

#[tokio::test]
async fn test_only_owner_adds_consumers() {
    let mut fixture = setup().await;
    let stranger = new_player(&mut fixture.context).await;

    let instruction = add_consumer(
        &fixture.program_id,
        &stranger.pubkey(),
        &fixture.coordinator.pubkey(),
        1,
        &Pubkey::new_unique(),
    );
    let result = process(&mut fixture.context, &[instruction], &[&stranger]).await;
    assert_raffle_error(result, RaffleError::MustBeSubOwner);
}

#[tokio::test]
async fn test_funding_unknown_subscription_fails() {
    let mut fixture = setup().await;
    let payer = fixture.context.payer.pubkey();

    let instruction = fund_subscription(
        &fixture.program_id,
        &payer,
        &fixture.coordinator.pubkey(),
        7,
        1_000,
    );
    let result = process(&mut fixture.context, &[instruction], &[]).await;
    assert_raffle_error(result, RaffleError::InvalidSubscription);
}

#[tokio::test]
async fn test_unfunded_subscription_cannot_pay() {
    let mut fixture = setup().await;
    let payer = fixture.context.payer.pubkey();
    let coordinator_key = fixture.coordinator.pubkey();

    let instruction = create_subscription(&fixture.program_id, &payer, &coordinator_key, 2);
    process(&mut fixture.context, &[instruction], &[]).await.unwrap();
    let raffle = deploy_raffle(&mut fixture, 2).await;
    let instruction = add_consumer(
        &fixture.program_id,
        &payer,
        &coordinator_key,
        2,
        &raffle.pubkey(),
    );
    process(&mut fixture.context, &[instruction], &[]).await.unwrap();

    open_round(&mut fixture, &raffle.pubkey()).await;
    perform_for(&mut fixture, &raffle.pubkey(), 2).await.unwrap();

    let state = get_raffle(&mut fixture.context, &raffle.pubkey()).await;
    let request_id = state.pending_request.unwrap();
    let winner = expected_winner(&state, request_id).unwrap();
    let instruction = fulfill_random_words(
        &fixture.program_id,
        &payer,
        &coordinator_key,
        request_id,
        2,
        &payer,
        &raffle.pubkey(),
        &winner,
    );
    let result = process(&mut fixture.context, &[instruction], &[]).await;
    assert_raffle_error(result, RaffleError::InsufficientBalance);
}

#[tokio::test]
async fn test_request_cannot_be_delivered_to_another_raffle() {
    let mut fixture = setup().await;
    let payer = fixture.context.payer.pubkey();
    let coordinator_key = fixture.coordinator.pubkey();
    let raffle_key = fixture.raffle.pubkey();
    open_round(&mut fixture, &raffle_key).await;
    perform_for(&mut fixture, &raffle_key, 1).await.unwrap();

    let state = get_raffle(&mut fixture.context, &raffle_key).await;
    let request_id = state.pending_request.unwrap();
    let winner = expected_winner(&state, request_id).unwrap();
    let other = deploy_raffle(&mut fixture, 1).await;

    let instruction = fulfill_random_words(
        &fixture.program_id,
        &payer,
        &coordinator_key,
        request_id,
        1,
        &payer,
        &other.pubkey(),
        &winner,
    );
    let result = process(&mut fixture.context, &[instruction], &[]).await;
    assert_raffle_error(result, RaffleError::InvalidConsumer);
}

#[tokio::test]
async fn test_prefunded_subscription_address_can_be_created() {
    let mut fixture = setup().await;
    let payer = fixture.context.payer.pubkey();
    let coordinator_key = fixture.coordinator.pubkey();
    let (subscription, _) = find_subscription_address(&fixture.program_id, &coordinator_key, 2);
    let grief = system_instruction::transfer(&payer, &subscription, 1_000_000);
    process(&mut fixture.context, &[grief], &[]).await.unwrap();

    let instruction = create_subscription(&fixture.program_id, &payer, &coordinator_key, 2);
    process(&mut fixture.context, &[instruction], &[]).await.unwrap();

    let created =
        get_subscription(&mut fixture.context, &fixture.program_id, &coordinator_key, 2).await;
    assert_eq!(created.owner, payer);
    assert_eq!(created.balance, 0);
    let coordinator = get_coordinator(&mut fixture.context, &coordinator_key).await;
    assert_eq!(coordinator.next_subscription_id, 3);
}
