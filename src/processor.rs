use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    coordinator::CoordinatorProcessor,
    error::RaffleError,
    events::RaffleEvent,
    instruction::RaffleInstruction,
    state::{CheckUpkeepResult, Raffle, RaffleConfig},
    utils::{account_pot, create_program_account, transfer_lamports},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeCoordinator {
                base_fee,
                gas_price,
            } => {
                msg!("Instruction: Initialize Coordinator");
                CoordinatorProcessor::process_initialize_coordinator(
                    accounts, base_fee, gas_price, program_id,
                )
            }
            RaffleInstruction::CreateSubscription => {
                msg!("Instruction: Create Subscription");
                CoordinatorProcessor::process_create_subscription(accounts, program_id)
            }
            RaffleInstruction::FundSubscription {
                subscription_id,
                amount,
            } => {
                msg!("Instruction: Fund Subscription");
                CoordinatorProcessor::process_fund_subscription(
                    accounts,
                    subscription_id,
                    amount,
                    program_id,
                )
            }
            RaffleInstruction::AddConsumer { subscription_id } => {
                msg!("Instruction: Add Consumer");
                CoordinatorProcessor::process_add_consumer(accounts, subscription_id, program_id)
            }
            RaffleInstruction::FulfillRandomWords { request_id } => {
                msg!("Instruction: Fulfill Random Words");
                CoordinatorProcessor::process_fulfill_random_words(accounts, request_id, program_id)
            }
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                gas_lane,
                subscription_id,
                callback_gas_limit,
                interval,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(
                    accounts,
                    entrance_fee,
                    gas_lane,
                    subscription_id,
                    callback_gas_limit,
                    interval,
                    program_id,
                )
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, &check_data, program_id)
            }
            RaffleInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, &perform_data, program_id)
            }
        }
    }

    /// Deploy a raffle with its constructor arguments
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        gas_lane: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        interval: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let deployer_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !deployer_info.is_signer || !raffle_info.is_signer {
            msg!("Deployer and raffle account must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner == program_id {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle::new(
            RaffleConfig {
                vrf_coordinator: *coordinator_info.key,
                entrance_fee,
                gas_lane,
                subscription_id,
                callback_gas_limit,
                interval,
            },
            now,
        )?;

        create_program_account(
            deployer_info,
            raffle_info,
            system_program_info,
            Raffle::LEN,
            program_id,
            &[],
        )?;
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle deployed: Coordinator={}, EntranceFee={}, SubscriptionId={}, Interval={}s",
            coordinator_info.key,
            entrance_fee,
            subscription_id,
            interval
        );
        Ok(())
    }

    fn process_enter_raffle(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        raffle.enter(*player_info.key, amount)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RaffleEnter {
            raffle: *raffle_info.key,
            player: *player_info.key,
        }
        .emit()?;
        Ok(())
    }

    /// Answer the upkeep predicate through return data without writing state
    fn process_check_upkeep(accounts: &[AccountInfo], _check_data: &[u8], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let now = Clock::get()?.unix_timestamp;
        let status = raffle.check_upkeep(now, account_pot(raffle_info)?);

        msg!(
            "Upkeep needed: {} (time passed={}, open={}, players={}, balance={})",
            status.upkeep_needed,
            status.time_passed,
            status.is_open,
            status.num_players,
            status.balance
        );

        let result = CheckUpkeepResult {
            upkeep_needed: status.upkeep_needed,
            perform_data: Vec::new(),
        };
        let data = result
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        set_return_data(&data);
        Ok(())
    }

    /// Start a draw: move to Calculating and request randomness
    fn process_perform_upkeep(accounts: &[AccountInfo], _perform_data: &[u8], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let keeper_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !keeper_info.is_signer {
            msg!("Keeper must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let now = Clock::get()?.unix_timestamp;
        let request = raffle.perform_upkeep(now, account_pot(raffle_info)?)?;

        if raffle.vrf_coordinator != *coordinator_info.key {
            msg!("Coordinator {} does not serve this raffle", coordinator_info.key);
            return Err(ProgramError::InvalidArgument);
        }

        let request_id = CoordinatorProcessor::request_random_words(
            program_id,
            keeper_info,
            coordinator_info,
            subscription_info,
            request_info,
            system_program_info,
            raffle_info.key,
            &request,
        )?;
        raffle.record_request(request_id);
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        RaffleEvent::RequestedRaffleWinner {
            raffle: *raffle_info.key,
            request_id,
        }
        .emit()?;
        Ok(())
    }

    /// Settle a draw with words delivered by the raffle's coordinator.
    ///
    /// Only reachable through the coordinator's fulfillment, which has
    /// already matched `request_id` to a live request for this raffle.
    pub fn process_raw_fulfill_random_words(
        program_id: &Pubkey,
        coordinator: &Pubkey,
        raffle_info: &AccountInfo,
        winner_info: &AccountInfo,
        request_id: u64,
        random_words: &[[u8; 32]],
    ) -> ProgramResult {
        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        if raffle.vrf_coordinator != *coordinator {
            msg!("Only coordinator {} can fulfill", raffle.vrf_coordinator);
            return Err(RaffleError::OnlyCoordinatorCanFulfill.into());
        }
        if raffle.pending_request != Some(request_id) {
            return Err(RaffleError::NonexistentRequest.into());
        }
        match raffle.drawn_winner(random_words) {
            Some(drawn) if drawn == *winner_info.key => {}
            Some(drawn) => {
                msg!("Drawn winner is {}, got {}", drawn, winner_info.key);
                return Err(RaffleError::WinnerMismatch.into());
            }
            None => return Err(RaffleError::InvalidInstructionData.into()),
        }

        let now = Clock::get()?.unix_timestamp;
        let balance = account_pot(raffle_info)?;
        let winner = raffle.fulfill_random_words(request_id, random_words, now, balance, |_, amount| {
            transfer_lamports(raffle_info, winner_info, amount)
        })?;
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        msg!("Winner picked: {} receives {} lamports", winner, balance);
        RaffleEvent::WinnerPicked {
            raffle: *raffle_info.key,
            winner,
        }
        .emit()?;
        Ok(())
    }

    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        Raffle::unpack(&raffle_info.data.borrow())
    }
}
