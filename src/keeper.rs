// Raffle keeper - off-chain upkeep trigger
use solana_program::{clock::UnixTimestamp, instruction::Instruction, pubkey::Pubkey};

use crate::{
    coordinator_state::{mock_random_words, Coordinator},
    error::RaffleError,
    instruction::{fulfill_random_words, perform_upkeep},
    state::{Raffle, UpkeepStatus},
};

/// What a keeper should do for a raffle right now
#[derive(Clone, Debug, PartialEq)]
pub enum UpkeepAction {
    /// No draw is due
    Idle(UpkeepStatus),
    /// Send `instruction`, which will open request `request_id`
    PerformUpkeep {
        request_id: u64,
        instruction: Instruction,
    },
}

/// Decide whether `raffle` needs upkeep at `now` with `balance` lamports in
/// the pot, and build the instruction that starts the draw if so.
///
/// The request PDA is derived from `coordinator`'s next request id, so the
/// coordinator must be read right before sending.
pub fn next_upkeep(
    program_id: &Pubkey,
    keeper: &Pubkey,
    raffle_key: &Pubkey,
    raffle: &Raffle,
    coordinator: &Coordinator,
    now: UnixTimestamp,
    balance: u64,
) -> UpkeepAction {
    let status = raffle.check_upkeep(now, balance);
    if !status.upkeep_needed {
        return UpkeepAction::Idle(status);
    }

    let request_id = coordinator.next_request_id;
    UpkeepAction::PerformUpkeep {
        request_id,
        instruction: perform_upkeep(
            program_id,
            keeper,
            raffle_key,
            &raffle.vrf_coordinator,
            raffle.subscription_id,
            request_id,
            Vec::new(),
        ),
    }
}

/// Build the mock coordinator's answer to the raffle's pending request.
///
/// The mock's words are public, so the winner account can be resolved here.
/// `request_payer` is the keeper that paid for the request account.
pub fn fulfill_on_mock(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle_key: &Pubkey,
    raffle: &Raffle,
    request_payer: &Pubkey,
) -> Result<Instruction, RaffleError> {
    let request_id = raffle
        .pending_request
        .ok_or(RaffleError::NonexistentRequest)?;
    let winner = expected_winner(raffle, request_id)?;

    Ok(fulfill_random_words(
        program_id,
        caller,
        &raffle.vrf_coordinator,
        request_id,
        raffle.subscription_id,
        request_payer,
        raffle_key,
        &winner,
    ))
}

/// Player the mock coordinator will draw for `request_id`
pub fn expected_winner(raffle: &Raffle, request_id: u64) -> Result<Pubkey, RaffleError> {
    let words = mock_random_words(request_id, raffle.num_words());
    raffle
        .drawn_winner(&words)
        .ok_or(RaffleError::InvalidInstructionData)
}
