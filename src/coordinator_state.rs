// Mock VRF coordinator - account layouts
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    keccak,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::error::RaffleError;

/// Consumers a single subscription can authorize
pub const MAX_CONSUMERS: usize = 8;
/// Upper bound on words per request
pub const MAX_NUM_WORDS: u32 = 500;

/// Coordinator account data. Fulfillment payments accumulate in the
/// coordinator account's lamports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinator {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Account that deployed the coordinator
    pub authority: Pubkey,
    /// Flat fee per fulfillment in lamports (0.25 SOL = 250,000,000 lamports)
    pub base_fee: u64,
    /// Lamports charged per unit of callback gas
    pub gas_price: u64,
    pub next_subscription_id: u64,
    pub next_request_id: u64,
}

impl Coordinator {
    pub fn new(authority: Pubkey, base_fee: u64, gas_price: u64) -> Self {
        Self {
            is_initialized: true,
            authority,
            base_fee,
            gas_price,
            next_subscription_id: 1,
            next_request_id: 1,
        }
    }

    /// Hand out the next subscription id
    pub fn take_subscription_id(&mut self) -> Result<u64, RaffleError> {
        let id = self.next_subscription_id;
        self.next_subscription_id = id.checked_add(1).ok_or(RaffleError::Overflow)?;
        Ok(id)
    }

    /// Hand out the next request id
    pub fn take_request_id(&mut self) -> Result<u64, RaffleError> {
        let id = self.next_request_id;
        self.next_request_id = id.checked_add(1).ok_or(RaffleError::Overflow)?;
        Ok(id)
    }

    /// Lamports charged to a subscription for delivering one request
    pub fn fulfillment_payment(&self, callback_gas_limit: u32) -> Result<u64, RaffleError> {
        self.gas_price
            .checked_mul(callback_gas_limit as u64)
            .and_then(|gas| gas.checked_add(self.base_fee))
            .ok_or(RaffleError::Overflow)
    }
}

/// Subscription account data (PDA ["subscription", coordinator, id])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub is_initialized: bool,
    pub coordinator: Pubkey,
    pub subscription_id: u64,
    pub owner: Pubkey,
    /// Funded lamports available for fulfillment payments
    pub balance: u64,
    pub consumer_count: u8,
    pub consumers: [Pubkey; MAX_CONSUMERS],
}

impl Subscription {
    pub fn new(coordinator: Pubkey, subscription_id: u64, owner: Pubkey) -> Self {
        Self {
            is_initialized: true,
            coordinator,
            subscription_id,
            owner,
            balance: 0,
            consumer_count: 0,
            consumers: [Pubkey::default(); MAX_CONSUMERS],
        }
    }

    pub fn consumers(&self) -> &[Pubkey] {
        &self.consumers[..self.consumer_count as usize]
    }

    pub fn is_consumer(&self, consumer: &Pubkey) -> bool {
        self.consumers().contains(consumer)
    }

    /// Authorize `consumer`; adding an existing consumer is a no-op
    pub fn add_consumer(&mut self, consumer: Pubkey) -> Result<(), RaffleError> {
        if self.is_consumer(&consumer) {
            return Ok(());
        }
        let count = self.consumer_count as usize;
        if count >= MAX_CONSUMERS {
            return Err(RaffleError::TooManyConsumers);
        }
        self.consumers[count] = consumer;
        self.consumer_count += 1;
        Ok(())
    }

    pub fn fund(&mut self, amount: u64) -> Result<(), RaffleError> {
        self.balance = self.balance.checked_add(amount).ok_or(RaffleError::Overflow)?;
        Ok(())
    }

    pub fn charge(&mut self, payment: u64) -> Result<(), RaffleError> {
        self.balance = self
            .balance
            .checked_sub(payment)
            .ok_or(RaffleError::InsufficientBalance)?;
        Ok(())
    }
}

/// Outstanding randomness request (PDA ["request", coordinator, id])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub is_initialized: bool,
    pub coordinator: Pubkey,
    pub request_id: u64,
    pub subscription_id: u64,
    /// Raffle account that receives the words
    pub consumer: Pubkey,
    /// Account that paid rent for this record, refunded on fulfillment
    pub payer: Pubkey,
    pub gas_lane: [u8; 32],
    pub callback_gas_limit: u32,
    pub num_words: u32,
    pub request_confirmations: u16,
}

/// Words the mock coordinator delivers for `request_id`
pub fn mock_random_words(request_id: u64, num_words: u32) -> Vec<[u8; 32]> {
    (0..num_words as u64)
        .map(|index| keccak::hashv(&[&request_id.to_le_bytes(), &index.to_le_bytes()]).to_bytes())
        .collect()
}

impl Sealed for Coordinator {}
impl Sealed for Subscription {}
impl Sealed for PendingRequest {}

impl IsInitialized for Coordinator {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for Subscription {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for PendingRequest {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Coordinator {
    const LEN: usize = 1 + 32 + 8 + 8 + 8 + 8;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Coordinator::LEN];
        let (is_initialized, authority, base_fee, gas_price, next_subscription_id, next_request_id) =
            array_refs![src, 1, 32, 8, 8, 8, 8];

        Ok(Coordinator {
            is_initialized: is_initialized[0] != 0,
            authority: Pubkey::new_from_array(*authority),
            base_fee: u64::from_le_bytes(*base_fee),
            gas_price: u64::from_le_bytes(*gas_price),
            next_subscription_id: u64::from_le_bytes(*next_subscription_id),
            next_request_id: u64::from_le_bytes(*next_request_id),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Coordinator::LEN];
        let (
            is_initialized_dst,
            authority_dst,
            base_fee_dst,
            gas_price_dst,
            next_subscription_id_dst,
            next_request_id_dst,
        ) = mut_array_refs![dst, 1, 32, 8, 8, 8, 8];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        *base_fee_dst = self.base_fee.to_le_bytes();
        *gas_price_dst = self.gas_price.to_le_bytes();
        *next_subscription_id_dst = self.next_subscription_id.to_le_bytes();
        *next_request_id_dst = self.next_request_id.to_le_bytes();
    }
}

impl Pack for Subscription {
    const LEN: usize = 1 + 32 + 8 + 32 + 8 + 1 + 32 * MAX_CONSUMERS;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Subscription::LEN];
        let (is_initialized, coordinator, subscription_id, owner, balance, consumer_count, consumers_src) =
            array_refs![src, 1, 32, 8, 32, 8, 1, 32 * MAX_CONSUMERS];

        let consumer_count = consumer_count[0];
        if consumer_count as usize > MAX_CONSUMERS {
            return Err(ProgramError::InvalidAccountData);
        }

        let mut consumers = [Pubkey::default(); MAX_CONSUMERS];
        for (consumer, bytes) in consumers.iter_mut().zip(consumers_src.chunks_exact(32)) {
            *consumer = Pubkey::new_from_array(*array_ref![bytes, 0, 32]);
        }

        Ok(Subscription {
            is_initialized: is_initialized[0] != 0,
            coordinator: Pubkey::new_from_array(*coordinator),
            subscription_id: u64::from_le_bytes(*subscription_id),
            owner: Pubkey::new_from_array(*owner),
            balance: u64::from_le_bytes(*balance),
            consumer_count,
            consumers,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Subscription::LEN];
        let (
            is_initialized_dst,
            coordinator_dst,
            subscription_id_dst,
            owner_dst,
            balance_dst,
            consumer_count_dst,
            consumers_dst,
        ) = mut_array_refs![dst, 1, 32, 8, 32, 8, 1, 32 * MAX_CONSUMERS];

        is_initialized_dst[0] = self.is_initialized as u8;
        coordinator_dst.copy_from_slice(self.coordinator.as_ref());
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        owner_dst.copy_from_slice(self.owner.as_ref());
        *balance_dst = self.balance.to_le_bytes();
        consumer_count_dst[0] = self.consumer_count;
        for (bytes, consumer) in consumers_dst.chunks_exact_mut(32).zip(self.consumers.iter()) {
            bytes.copy_from_slice(consumer.as_ref());
        }
    }
}

impl Pack for PendingRequest {
    const LEN: usize = 1 + 32 + 8 + 8 + 32 + 32 + 32 + 4 + 4 + 2;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, PendingRequest::LEN];
        let (
            is_initialized,
            coordinator,
            request_id,
            subscription_id,
            consumer,
            payer,
            gas_lane,
            callback_gas_limit,
            num_words,
            request_confirmations,
        ) = array_refs![src, 1, 32, 8, 8, 32, 32, 32, 4, 4, 2];

        Ok(PendingRequest {
            is_initialized: is_initialized[0] != 0,
            coordinator: Pubkey::new_from_array(*coordinator),
            request_id: u64::from_le_bytes(*request_id),
            subscription_id: u64::from_le_bytes(*subscription_id),
            consumer: Pubkey::new_from_array(*consumer),
            payer: Pubkey::new_from_array(*payer),
            gas_lane: *gas_lane,
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            num_words: u32::from_le_bytes(*num_words),
            request_confirmations: u16::from_le_bytes(*request_confirmations),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, PendingRequest::LEN];
        let (
            is_initialized_dst,
            coordinator_dst,
            request_id_dst,
            subscription_id_dst,
            consumer_dst,
            payer_dst,
            gas_lane_dst,
            callback_gas_limit_dst,
            num_words_dst,
            request_confirmations_dst,
        ) = mut_array_refs![dst, 1, 32, 8, 8, 32, 32, 32, 4, 4, 2];

        is_initialized_dst[0] = self.is_initialized as u8;
        coordinator_dst.copy_from_slice(self.coordinator.as_ref());
        *request_id_dst = self.request_id.to_le_bytes();
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        consumer_dst.copy_from_slice(self.consumer.as_ref());
        payer_dst.copy_from_slice(self.payer.as_ref());
        gas_lane_dst.copy_from_slice(&self.gas_lane);
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *num_words_dst = self.num_words.to_le_bytes();
        *request_confirmations_dst = self.request_confirmations.to_le_bytes();
    }
}
