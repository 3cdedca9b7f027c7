// Raffle program - notifications
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, program_error::ProgramError, pubkey::Pubkey};

/// Events written to the transaction log with `sol_log_data`
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player entered the raffle
    RaffleEnter { raffle: Pubkey, player: Pubkey },
    /// Upkeep started a draw
    RequestedRaffleWinner { raffle: Pubkey, request_id: u64 },
    /// A draw was settled and paid
    WinnerPicked { raffle: Pubkey, winner: Pubkey },
    SubscriptionCreated {
        coordinator: Pubkey,
        subscription_id: u64,
        owner: Pubkey,
    },
    SubscriptionFunded {
        subscription_id: u64,
        old_balance: u64,
        new_balance: u64,
    },
    ConsumerAdded { subscription_id: u64, consumer: Pubkey },
    RandomWordsRequested {
        request_id: u64,
        subscription_id: u64,
        consumer: Pubkey,
        gas_lane: [u8; 32],
        callback_gas_limit: u32,
        num_words: u32,
    },
    RandomWordsFulfilled { request_id: u64, payment: u64 },
}

impl RaffleEvent {
    pub fn emit(&self) -> Result<(), ProgramError> {
        let data = self
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        msg!("Event: {:?}", self);
        sol_log_data(&[&data]);
        Ok(())
    }
}
