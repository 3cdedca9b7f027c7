// Mock VRF coordinator for development networks.
//
// Subscriptions are funded in lamports, consumers are authorized per
// subscription, and every request lives in its own PDA until fulfilled.
// Fulfillment is triggered explicitly and answers with keccak-derived words.
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
};

use crate::{
    coordinator_state::{mock_random_words, Coordinator, PendingRequest, Subscription, MAX_NUM_WORDS},
    error::RaffleError,
    events::RaffleEvent,
    processor::Processor,
    state::RandomnessRequest,
    utils::{
        create_program_account, find_request_address, find_subscription_address,
        transfer_lamports, REQUEST_SEED, SUBSCRIPTION_SEED,
    },
};

pub struct CoordinatorProcessor;

impl CoordinatorProcessor {
    pub fn process_initialize_coordinator(
        accounts: &[AccountInfo],
        base_fee: u64,
        gas_price: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer || !coordinator_info.is_signer {
            msg!("Authority and coordinator account must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if coordinator_info.owner == program_id {
            msg!("Coordinator account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        create_program_account(
            authority_info,
            coordinator_info,
            system_program_info,
            Coordinator::LEN,
            program_id,
            &[],
        )?;

        let coordinator = Coordinator::new(*authority_info.key, base_fee, gas_price);
        Coordinator::pack(coordinator, &mut coordinator_info.data.borrow_mut())?;

        msg!(
            "Coordinator deployed: BaseFee={}, GasPrice={}",
            base_fee,
            gas_price
        );
        Ok(())
    }

    pub fn process_create_subscription(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Subscription owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut coordinator = Self::load_coordinator(coordinator_info, program_id)?;
        let subscription_id = coordinator.take_subscription_id()?;

        let (expected_subscription, bump_seed) =
            find_subscription_address(program_id, coordinator_info.key, subscription_id);
        if *subscription_info.key != expected_subscription {
            msg!("Subscription account does not match id {}", subscription_id);
            return Err(ProgramError::InvalidSeeds);
        }

        create_program_account(
            owner_info,
            subscription_info,
            system_program_info,
            Subscription::LEN,
            program_id,
            &[&[
                SUBSCRIPTION_SEED,
                coordinator_info.key.as_ref(),
                &subscription_id.to_le_bytes(),
                &[bump_seed],
            ]],
        )?;

        let subscription = Subscription::new(*coordinator_info.key, subscription_id, *owner_info.key);
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;
        Coordinator::pack(coordinator, &mut coordinator_info.data.borrow_mut())?;

        RaffleEvent::SubscriptionCreated {
            coordinator: *coordinator_info.key,
            subscription_id,
            owner: *owner_info.key,
        }
        .emit()?;
        Ok(())
    }

    pub fn process_fund_subscription(
        accounts: &[AccountInfo],
        subscription_id: u64,
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let funder_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !funder_info.is_signer {
            msg!("Funder must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut subscription =
            Self::load_subscription(coordinator_info, subscription_info, subscription_id, program_id)?;

        invoke(
            &system_instruction::transfer(funder_info.key, subscription_info.key, amount),
            &[
                funder_info.clone(),
                subscription_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        let old_balance = subscription.balance;
        subscription.fund(amount)?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        RaffleEvent::SubscriptionFunded {
            subscription_id,
            old_balance,
            new_balance: subscription.balance,
        }
        .emit()?;
        Ok(())
    }

    pub fn process_add_consumer(
        accounts: &[AccountInfo],
        subscription_id: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let consumer_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Subscription owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut subscription =
            Self::load_subscription(coordinator_info, subscription_info, subscription_id, program_id)?;
        if subscription.owner != *owner_info.key {
            return Err(RaffleError::MustBeSubOwner.into());
        }

        subscription.add_consumer(*consumer_info.key)?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        RaffleEvent::ConsumerAdded {
            subscription_id,
            consumer: *consumer_info.key,
        }
        .emit()?;
        Ok(())
    }

    /// Record a randomness request for `consumer` and return its id.
    ///
    /// Called from the raffle's upkeep; the keeper pays for the request PDA.
    #[allow(clippy::too_many_arguments)]
    pub fn request_random_words<'a>(
        program_id: &Pubkey,
        payer_info: &AccountInfo<'a>,
        coordinator_info: &AccountInfo<'a>,
        subscription_info: &AccountInfo<'a>,
        request_info: &AccountInfo<'a>,
        system_program_info: &AccountInfo<'a>,
        consumer: &Pubkey,
        request: &RandomnessRequest,
    ) -> Result<u64, ProgramError> {
        let mut coordinator = Self::load_coordinator(coordinator_info, program_id)?;
        let subscription = Self::load_subscription(
            coordinator_info,
            subscription_info,
            request.subscription_id,
            program_id,
        )?;

        if !subscription.is_consumer(consumer) {
            msg!("{} is not a consumer of subscription {}", consumer, request.subscription_id);
            return Err(RaffleError::InvalidConsumer.into());
        }
        if request.num_words > MAX_NUM_WORDS {
            return Err(RaffleError::NumWordsTooBig.into());
        }

        let request_id = coordinator.take_request_id()?;
        let (expected_request, bump_seed) =
            find_request_address(program_id, coordinator_info.key, request_id);
        if *request_info.key != expected_request {
            msg!("Request account does not match id {}", request_id);
            return Err(ProgramError::InvalidSeeds);
        }

        create_program_account(
            payer_info,
            request_info,
            system_program_info,
            PendingRequest::LEN,
            program_id,
            &[&[
                REQUEST_SEED,
                coordinator_info.key.as_ref(),
                &request_id.to_le_bytes(),
                &[bump_seed],
            ]],
        )?;

        let pending = PendingRequest {
            is_initialized: true,
            coordinator: *coordinator_info.key,
            request_id,
            subscription_id: request.subscription_id,
            consumer: *consumer,
            payer: *payer_info.key,
            gas_lane: request.gas_lane,
            callback_gas_limit: request.callback_gas_limit,
            num_words: request.num_words,
            request_confirmations: request.request_confirmations,
        };
        PendingRequest::pack(pending, &mut request_info.data.borrow_mut())?;
        Coordinator::pack(coordinator, &mut coordinator_info.data.borrow_mut())?;

        RaffleEvent::RandomWordsRequested {
            request_id,
            subscription_id: request.subscription_id,
            consumer: *consumer,
            gas_lane: request.gas_lane,
            callback_gas_limit: request.callback_gas_limit,
            num_words: request.num_words,
        }
        .emit()?;
        Ok(request_id)
    }

    pub fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let request_payer_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let coordinator = Self::load_coordinator(coordinator_info, program_id)?;
        let pending = Self::load_pending_request(coordinator_info, request_info, request_id, program_id)?;

        let mut subscription = Self::load_subscription(
            coordinator_info,
            subscription_info,
            pending.subscription_id,
            program_id,
        )?;
        let payment = coordinator.fulfillment_payment(pending.callback_gas_limit)?;
        subscription.charge(payment)?;

        if *raffle_info.key != pending.consumer {
            msg!("Consumer {} did not make request {}", raffle_info.key, request_id);
            return Err(RaffleError::InvalidConsumer.into());
        }
        if *request_payer_info.key != pending.payer {
            msg!("Rent refund must go to the request payer {}", pending.payer);
            return Err(ProgramError::InvalidArgument);
        }

        let random_words = mock_random_words(request_id, pending.num_words);
        Processor::process_raw_fulfill_random_words(
            program_id,
            coordinator_info.key,
            raffle_info,
            winner_info,
            request_id,
            &random_words,
        )?;

        transfer_lamports(subscription_info, coordinator_info, payment)?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        // settle the request: the PDA is garbage collected once emptied
        request_info.data.borrow_mut().fill(0);
        transfer_lamports(request_info, request_payer_info, request_info.lamports())?;

        RaffleEvent::RandomWordsFulfilled {
            request_id,
            payment,
        }
        .emit()?;
        Ok(())
    }

    fn load_coordinator(coordinator_info: &AccountInfo, program_id: &Pubkey) -> Result<Coordinator, ProgramError> {
        if coordinator_info.owner != program_id {
            msg!("Coordinator account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Coordinator::unpack(&coordinator_info.data.borrow())
    }

    fn load_subscription(
        coordinator_info: &AccountInfo,
        subscription_info: &AccountInfo,
        subscription_id: u64,
        program_id: &Pubkey,
    ) -> Result<Subscription, ProgramError> {
        let (expected_subscription, _) =
            find_subscription_address(program_id, coordinator_info.key, subscription_id);
        if *subscription_info.key != expected_subscription
            || subscription_info.owner != program_id
            || subscription_info.data_len() < Subscription::LEN
        {
            msg!("Subscription {} does not exist", subscription_id);
            return Err(RaffleError::InvalidSubscription.into());
        }

        let subscription = Subscription::unpack_unchecked(&subscription_info.data.borrow())?;
        if !subscription.is_initialized
            || subscription.subscription_id != subscription_id
            || subscription.coordinator != *coordinator_info.key
        {
            msg!("Subscription {} does not exist", subscription_id);
            return Err(RaffleError::InvalidSubscription.into());
        }
        Ok(subscription)
    }

    fn load_pending_request(
        coordinator_info: &AccountInfo,
        request_info: &AccountInfo,
        request_id: u64,
        program_id: &Pubkey,
    ) -> Result<PendingRequest, ProgramError> {
        let (expected_request, _) = find_request_address(program_id, coordinator_info.key, request_id);
        if *request_info.key != expected_request
            || request_info.owner != program_id
            || request_info.data_len() < PendingRequest::LEN
        {
            msg!("Request {} is not pending", request_id);
            return Err(RaffleError::NonexistentRequest.into());
        }

        let pending = PendingRequest::unpack_unchecked(&request_info.data.borrow())?;
        if !pending.is_initialized
            || pending.request_id != request_id
            || pending.coordinator != *coordinator_info.key
        {
            msg!("Request {} is not pending", request_id);
            return Err(RaffleError::NonexistentRequest.into());
        }
        Ok(pending)
    }
}
