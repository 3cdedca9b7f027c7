// Sol Raffle
// A self-running lottery: players buy in, a keeper starts the draw once the
// interval has passed, and a VRF coordinator picks and pays the winner.

// Program modules
pub mod coordinator;
pub mod coordinator_state;
pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod utils;

// Off-chain orchestration
pub mod deploy;
pub mod keeper;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
