use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;
use std::mem::size_of;

use crate::{
    error::RaffleError,
    state::RaffleConfig,
    utils::{find_request_address, find_subscription_address},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaffleInstruction {
    /// Deploy a mock VRF coordinator (development networks only)
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority, pays for the coordinator account
    /// 1. `[signer, writable]` The coordinator account, must not exist yet
    /// 2. `[]` The system program
    InitializeCoordinator {
        /// Flat fee per fulfillment in lamports
        base_fee: u64,
        /// Lamports per unit of callback gas
        gas_price: u64,
    },

    /// Create a subscription with the coordinator's next subscription id
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The subscription owner, pays for the subscription account
    /// 1. `[writable]` The coordinator account
    /// 2. `[writable]` The subscription PDA for the next subscription id
    /// 3. `[]` The system program
    CreateSubscription,

    /// Add lamports to a subscription
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The funder
    /// 1. `[]` The coordinator account
    /// 2. `[writable]` The subscription PDA
    /// 3. `[]` The system program
    FundSubscription { subscription_id: u64, amount: u64 },

    /// Authorize a raffle to draw randomness from a subscription
    ///
    /// Accounts expected:
    /// 0. `[signer]` The subscription owner
    /// 1. `[]` The coordinator account
    /// 2. `[writable]` The subscription PDA
    /// 3. `[]` The consumer (raffle) account
    AddConsumer { subscription_id: u64 },

    /// Deliver random words for a pending request to its raffle
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any account (the mock answers on demand)
    /// 1. `[writable]` The coordinator account
    /// 2. `[writable]` The request PDA
    /// 3. `[writable]` The subscription PDA the request draws from
    /// 4. `[writable]` The account that paid for the request PDA (rent refund)
    /// 5. `[writable]` The consumer raffle account
    /// 6. `[writable]` The drawn winner
    FulfillRandomWords { request_id: u64 },

    /// Deploy a raffle
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The deployer, pays for the raffle account
    /// 1. `[signer, writable]` The raffle account, must not exist yet
    /// 2. `[]` The coordinator account answering this raffle's requests
    /// 3. `[]` The system program
    InitializeRaffle {
        /// Entrance fee in lamports
        entrance_fee: u64,
        gas_lane: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        /// Seconds between draws
        interval: u64,
    },

    /// Enter the raffle, paying `amount` lamports
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle { amount: u64 },

    /// Evaluate the upkeep predicate; the answer is written as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep { check_data: Vec<u8> },

    /// Start a draw and request randomness from the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The keeper, pays for the request PDA
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The coordinator account
    /// 3. `[]` The subscription PDA
    /// 4. `[writable]` The request PDA for the coordinator's next request id
    /// 5. `[]` The system program
    PerformUpkeep { perform_data: Vec<u8> },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (base_fee, rest) = Self::unpack_u64(rest)?;
                let (gas_price, _) = Self::unpack_u64(rest)?;
                Self::InitializeCoordinator {
                    base_fee,
                    gas_price,
                }
            }
            1 => Self::CreateSubscription,
            2 => {
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::FundSubscription {
                    subscription_id,
                    amount,
                }
            }
            3 => {
                let (subscription_id, _) = Self::unpack_u64(rest)?;
                Self::AddConsumer { subscription_id }
            }
            4 => {
                let (request_id, _) = Self::unpack_u64(rest)?;
                Self::FulfillRandomWords { request_id }
            }
            5 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (gas_lane, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, rest) = Self::unpack_u32(rest)?;
                let (interval, _) = Self::unpack_u64(rest)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    gas_lane,
                    subscription_id,
                    callback_gas_limit,
                    interval,
                }
            }
            6 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            7 => Self::CheckUpkeep {
                check_data: rest.to_vec(),
            },
            8 => Self::PerformUpkeep {
                perform_data: rest.to_vec(),
            },
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match self {
            Self::InitializeCoordinator {
                base_fee,
                gas_price,
            } => {
                buf.push(0);
                buf.extend_from_slice(&base_fee.to_le_bytes());
                buf.extend_from_slice(&gas_price.to_le_bytes());
            }
            Self::CreateSubscription => buf.push(1),
            Self::FundSubscription {
                subscription_id,
                amount,
            } => {
                buf.push(2);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::AddConsumer { subscription_id } => {
                buf.push(3);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
            }
            Self::FulfillRandomWords { request_id } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
            }
            Self::InitializeRaffle {
                entrance_fee,
                gas_lane,
                subscription_id,
                callback_gas_limit,
                interval,
            } => {
                buf.push(5);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(gas_lane);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(6);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep { check_data } => {
                buf.push(7);
                buf.extend_from_slice(check_data);
            }
            Self::PerformUpkeep { perform_data } => {
                buf.push(8);
                buf.extend_from_slice(perform_data);
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes: [u8; N] = bytes
            .try_into()
            .map_err(|_| RaffleError::InvalidInstructionData)?;
        Ok((bytes, rest))
    }
}

/// Create initialize_coordinator instruction
pub fn initialize_coordinator(
    program_id: &Pubkey,
    authority: &Pubkey,
    coordinator: &Pubkey,
    base_fee: u64,
    gas_price: u64,
) -> Instruction {
    let data = RaffleInstruction::InitializeCoordinator {
        base_fee,
        gas_price,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new(*coordinator, true),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create create_subscription instruction; `subscription_id` must be the
/// coordinator's next subscription id
pub fn create_subscription(
    program_id: &Pubkey,
    owner: &Pubkey,
    coordinator: &Pubkey,
    subscription_id: u64,
) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, coordinator, subscription_id);

    let accounts = vec![
        AccountMeta::new(*owner, true),
        AccountMeta::new(*coordinator, false),
        AccountMeta::new(subscription, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::CreateSubscription.pack(),
    }
}

/// Create fund_subscription instruction
pub fn fund_subscription(
    program_id: &Pubkey,
    funder: &Pubkey,
    coordinator: &Pubkey,
    subscription_id: u64,
    amount: u64,
) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, coordinator, subscription_id);
    let data = RaffleInstruction::FundSubscription {
        subscription_id,
        amount,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*funder, true),
        AccountMeta::new_readonly(*coordinator, false),
        AccountMeta::new(subscription, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create add_consumer instruction
pub fn add_consumer(
    program_id: &Pubkey,
    owner: &Pubkey,
    coordinator: &Pubkey,
    subscription_id: u64,
    consumer: &Pubkey,
) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, coordinator, subscription_id);

    let accounts = vec![
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new_readonly(*coordinator, false),
        AccountMeta::new(subscription, false),
        AccountMeta::new_readonly(*consumer, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::AddConsumer { subscription_id }.pack(),
    }
}

/// Create fulfill_random_words instruction
#[allow(clippy::too_many_arguments)]
pub fn fulfill_random_words(
    program_id: &Pubkey,
    caller: &Pubkey,
    coordinator: &Pubkey,
    request_id: u64,
    subscription_id: u64,
    request_payer: &Pubkey,
    raffle: &Pubkey,
    winner: &Pubkey,
) -> Instruction {
    let (request, _) = find_request_address(program_id, coordinator, request_id);
    let (subscription, _) = find_subscription_address(program_id, coordinator, subscription_id);

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*coordinator, false),
        AccountMeta::new(request, false),
        AccountMeta::new(subscription, false),
        AccountMeta::new(*request_payer, false),
        AccountMeta::new(*raffle, false),
        AccountMeta::new(*winner, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::FulfillRandomWords { request_id }.pack(),
    }
}

/// Create initialize_raffle instruction from the raffle's constructor arguments
pub fn initialize_raffle(
    program_id: &Pubkey,
    deployer: &Pubkey,
    raffle: &Pubkey,
    config: &RaffleConfig,
) -> Instruction {
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee: config.entrance_fee,
        gas_lane: config.gas_lane,
        subscription_id: config.subscription_id,
        callback_gas_limit: config.callback_gas_limit,
        interval: config.interval,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*deployer, true),
        AccountMeta::new(*raffle, true),
        AccountMeta::new_readonly(config.vrf_coordinator, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle: &Pubkey,
    amount: u64,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::EnterRaffle { amount }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle: &Pubkey, check_data: Vec<u8>) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle, false)],
        data: RaffleInstruction::CheckUpkeep { check_data }.pack(),
    }
}

/// Create perform_upkeep instruction; `request_id` must be the coordinator's
/// next request id
#[allow(clippy::too_many_arguments)]
pub fn perform_upkeep(
    program_id: &Pubkey,
    keeper: &Pubkey,
    raffle: &Pubkey,
    coordinator: &Pubkey,
    subscription_id: u64,
    request_id: u64,
    perform_data: Vec<u8>,
) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, coordinator, subscription_id);
    let (request, _) = find_request_address(program_id, coordinator, request_id);

    let accounts = vec![
        AccountMeta::new(*keeper, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new(*coordinator, false),
        AccountMeta::new_readonly(subscription, false),
        AccountMeta::new(request, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::PerformUpkeep { perform_data }.pack(),
    }
}
