// Raffle program - raffle account state machine
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::{error::RaffleError, utils::word_mod};

/// Maximum number of entries a raffle account has room for
pub const MAX_PLAYERS: usize = 64;
/// Confirmations the coordinator waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;

/// Status of a raffle
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Raffle accepts entries
    Open,
    /// Randomness has been requested, waiting for the coordinator
    Calculating,
}

impl Default for RaffleState {
    fn default() -> Self {
        RaffleState::Open
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Constructor arguments of a raffle, in deployment order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Coordinator account that answers randomness requests
    pub vrf_coordinator: Pubkey,
    /// Minimum payment to enter, in lamports
    pub entrance_fee: u64,
    /// Key hash selecting the coordinator's gas lane
    pub gas_lane: [u8; 32],
    /// Coordinator subscription paying for requests
    pub subscription_id: u64,
    /// Gas budget granted to the fulfillment callback
    pub callback_gas_limit: u32,
    /// Seconds between draws
    pub interval: u64,
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    pub vrf_coordinator: Pubkey,
    /// Entrance fee in lamports (1 SOL = 1,000,000,000 lamports)
    pub entrance_fee: u64,
    pub gas_lane: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    /// Seconds that must elapse after `last_timestamp` before a draw
    pub interval: u64,
    pub raffle_state: RaffleState,
    /// Time of deployment or of the last completed draw
    pub last_timestamp: UnixTimestamp,
    /// Winner of the last draw (default key before the first one)
    pub recent_winner: Pubkey,
    /// Outstanding randomness request, set while calculating
    pub pending_request: Option<u64>,
    /// Entrants in entry order
    pub players: Vec<Pubkey>,
}

/// Randomness parameters produced by a successful upkeep
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub gas_lane: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// Result of the upkeep predicate, with the values it was computed from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub upkeep_needed: bool,
    pub time_passed: bool,
    pub is_open: bool,
    pub has_players: bool,
    pub has_balance: bool,
    pub balance: u64,
    pub num_players: u64,
    pub raffle_state: RaffleState,
}

/// Return data of the CheckUpkeep instruction
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct CheckUpkeepResult {
    pub upkeep_needed: bool,
    pub perform_data: Vec<u8>,
}

impl CheckUpkeepResult {
    /// bool flag + u32 length prefix
    const MIN_LEN: usize = 1 + 4;

    /// Decode the CheckUpkeep return data as seen by a client.
    ///
    /// The runtime strips trailing zero bytes from return data, so a `false`
    /// answer arrives empty and `true` with no perform data arrives as `[1]`.
    /// The stripped zeros are restored before decoding.
    pub fn unpack_return_data(data: &[u8]) -> Result<Self, ProgramError> {
        let mut buf = data.to_vec();
        if buf.len() < Self::MIN_LEN {
            buf.resize(Self::MIN_LEN, 0);
        }
        let perform_len = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
        let full_len = Self::MIN_LEN
            .checked_add(perform_len)
            .ok_or(ProgramError::InvalidAccountData)?;
        if buf.len() > full_len {
            return Err(ProgramError::InvalidAccountData);
        }
        buf.resize(full_len, 0);
        Self::try_from_slice(&buf).map_err(|_| ProgramError::InvalidAccountData)
    }
}

impl Raffle {
    /// Serialized size of a raffle account sized for `MAX_PLAYERS` entries
    pub const LEN: usize = 1 // is_initialized
        + 32 // vrf_coordinator
        + 8 // entrance_fee
        + 32 // gas_lane
        + 8 // subscription_id
        + 4 // callback_gas_limit
        + 8 // interval
        + 1 // raffle_state
        + 8 // last_timestamp
        + 32 // recent_winner
        + 1 + 8 // pending_request
        + 4 + 32 * MAX_PLAYERS; // players

    pub fn new(config: RaffleConfig, now: UnixTimestamp) -> Result<Self, RaffleError> {
        if config.entrance_fee == 0 || config.interval == 0 {
            return Err(RaffleError::InvalidConfig);
        }

        Ok(Raffle {
            is_initialized: true,
            vrf_coordinator: config.vrf_coordinator,
            entrance_fee: config.entrance_fee,
            gas_lane: config.gas_lane,
            subscription_id: config.subscription_id,
            callback_gas_limit: config.callback_gas_limit,
            interval: config.interval,
            raffle_state: RaffleState::Open,
            last_timestamp: now,
            recent_winner: Pubkey::default(),
            pending_request: None,
            players: Vec::new(),
        })
    }

    /// Read raffle data from an account, failing if it was never initialized
    pub fn unpack(src: &[u8]) -> Result<Self, ProgramError> {
        let raffle = Self::unpack_unchecked(src)?;
        if !raffle.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(raffle)
    }

    pub fn unpack_unchecked(src: &[u8]) -> Result<Self, ProgramError> {
        let mut buf = src;
        Raffle::deserialize(&mut buf).map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn pack(&self, dst: &mut [u8]) -> Result<(), ProgramError> {
        if self.players.len() > MAX_PLAYERS {
            return Err(RaffleError::RaffleFull.into());
        }
        let mut buf = dst;
        self.serialize(&mut buf)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    /// Record an entry paying `amount` lamports
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<(), RaffleError> {
        if amount < self.entrance_fee {
            return Err(RaffleError::NotEnoughEntered);
        }
        if self.raffle_state != RaffleState::Open {
            return Err(RaffleError::NotOpen);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RaffleError::RaffleFull);
        }
        self.players.push(player);
        Ok(())
    }

    /// Whether a draw should start now, given the pot `balance` in lamports
    pub fn check_upkeep(&self, now: UnixTimestamp, balance: u64) -> UpkeepStatus {
        let interval = i64::try_from(self.interval).unwrap_or(i64::MAX);
        let time_passed = now.saturating_sub(self.last_timestamp) >= interval;
        let is_open = self.raffle_state == RaffleState::Open;
        let has_players = !self.players.is_empty();
        let has_balance = balance > 0;

        UpkeepStatus {
            upkeep_needed: time_passed && is_open && has_players && has_balance,
            time_passed,
            is_open,
            has_players,
            has_balance,
            balance,
            num_players: self.players.len() as u64,
            raffle_state: self.raffle_state,
        }
    }

    /// Move to Calculating and describe the randomness request to issue
    pub fn perform_upkeep(
        &mut self,
        now: UnixTimestamp,
        balance: u64,
    ) -> Result<RandomnessRequest, RaffleError> {
        let status = self.check_upkeep(now, balance);
        if !status.upkeep_needed {
            msg!(
                "Raffle__UpkeepNotNeeded: balance={}, players={}, state={}",
                status.balance,
                status.num_players,
                u8::from(status.raffle_state)
            );
            return Err(RaffleError::UpkeepNotNeeded);
        }

        self.raffle_state = RaffleState::Calculating;
        Ok(RandomnessRequest {
            gas_lane: self.gas_lane,
            subscription_id: self.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: self.callback_gas_limit,
            num_words: NUM_WORDS,
        })
    }

    pub fn record_request(&mut self, request_id: u64) {
        self.pending_request = Some(request_id);
    }

    /// Index of the player drawn by `random_words`
    pub fn winner_index(&self, random_words: &[[u8; 32]]) -> Option<usize> {
        let word = random_words.first()?;
        if self.players.is_empty() {
            return None;
        }
        Some(word_mod(word, self.players.len() as u64) as usize)
    }

    pub fn drawn_winner(&self, random_words: &[[u8; 32]]) -> Option<Pubkey> {
        self.winner_index(random_words).map(|index| self.players[index])
    }

    /// Settle the pending draw.
    ///
    /// `pay` must move `balance` lamports to the winner. State is reset only
    /// after it succeeds; on failure the raffle is left exactly as it was.
    pub fn fulfill_random_words<F>(
        &mut self,
        request_id: u64,
        random_words: &[[u8; 32]],
        now: UnixTimestamp,
        balance: u64,
        pay: F,
    ) -> Result<Pubkey, RaffleError>
    where
        F: FnOnce(&Pubkey, u64) -> Result<(), ProgramError>,
    {
        if self.pending_request != Some(request_id) {
            return Err(RaffleError::NonexistentRequest);
        }
        let winner = self
            .drawn_winner(random_words)
            .ok_or(RaffleError::InvalidInstructionData)?;

        if let Err(err) = pay(&winner, balance) {
            msg!("Payout of {} lamports to {} failed: {}", balance, winner, err);
            return Err(RaffleError::TransferFailed);
        }

        self.recent_winner = winner;
        self.players.clear();
        self.raffle_state = RaffleState::Open;
        self.last_timestamp = now;
        self.pending_request = None;
        Ok(winner)
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn raffle_state(&self) -> RaffleState {
        self.raffle_state
    }

    pub fn recent_winner(&self) -> Pubkey {
        self.recent_winner
    }

    pub fn player(&self, index: usize) -> Option<Pubkey> {
        self.players.get(index).copied()
    }

    pub fn number_of_players(&self) -> u64 {
        self.players.len() as u64
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }
}
