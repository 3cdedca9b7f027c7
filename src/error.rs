use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the raffle program and its mock coordinator
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Payment is below the entrance fee
    #[error("Raffle__NotEnoughEntered")]
    NotEnoughEntered,

    /// Entry attempted while a winner is being calculated
    #[error("Raffle__NotOpen")]
    NotOpen,

    /// Upkeep performed while the upkeep predicate is false
    #[error("Raffle__UpkeepNotNeeded")]
    UpkeepNotNeeded,

    /// Payout to the winner could not be made
    #[error("Raffle__TransferFailed")]
    TransferFailed,

    /// Fulfillment for a request that is unknown or already settled
    #[error("nonexistent request")]
    NonexistentRequest,

    /// Only the raffle's coordinator may deliver random words
    #[error("Only the coordinator can fulfill")]
    OnlyCoordinatorCanFulfill,

    /// Winner account does not match the drawn player
    #[error("Winner account does not match the drawn player")]
    WinnerMismatch,

    /// The raffle account holds no more entries
    #[error("Raffle is full")]
    RaffleFull,

    /// Entrance fee and interval must be positive
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    #[error("Invalid subscription")]
    InvalidSubscription,

    #[error("Invalid consumer")]
    InvalidConsumer,

    #[error("Must be subscription owner")]
    MustBeSubOwner,

    #[error("Too many consumers")]
    TooManyConsumers,

    /// Subscription cannot cover the fulfillment payment
    #[error("Insufficient subscription balance")]
    InsufficientBalance,

    #[error("Too many random words requested")]
    NumWordsTooBig,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
