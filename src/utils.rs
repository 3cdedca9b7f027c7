// Raffle program - utility functions
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::error::RaffleError;

pub const SUBSCRIPTION_SEED: &[u8] = b"subscription";
pub const REQUEST_SEED: &[u8] = b"request";

/// Create a rent-exempt account of `space` bytes owned by `program_id`.
///
/// `signer_seeds` is empty for keypair accounts that sign the transaction.
/// An address that already holds lamports (anyone can send to a PDA) is
/// topped up to the rent-exempt minimum, then allocated and assigned.
pub fn create_program_account<'a>(
    payer: &AccountInfo<'a>,
    new_account: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    space: usize,
    program_id: &Pubkey,
    signer_seeds: &[&[&[u8]]],
) -> ProgramResult {
    let rent_lamports = Rent::get()?.minimum_balance(space).max(1);
    let current_lamports = new_account.lamports();

    if current_lamports == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer.key,
                new_account.key,
                rent_lamports,
                space as u64,
                program_id,
            ),
            &[payer.clone(), new_account.clone(), system_program.clone()],
            signer_seeds,
        );
    }

    let top_up = rent_lamports.saturating_sub(current_lamports);
    if top_up > 0 {
        invoke(
            &system_instruction::transfer(payer.key, new_account.key, top_up),
            &[payer.clone(), new_account.clone(), system_program.clone()],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(new_account.key, space as u64),
        &[new_account.clone(), system_program.clone()],
        signer_seeds,
    )?;
    invoke_signed(
        &system_instruction::assign(new_account.key, program_id),
        &[new_account.clone(), system_program.clone()],
        signer_seeds,
    )
}

/// Move lamports between accounts the program may debit directly
pub fn transfer_lamports(from: &AccountInfo, to: &AccountInfo, amount: u64) -> ProgramResult {
    if !from.is_writable || !to.is_writable {
        return Err(ProgramError::InvalidArgument);
    }
    let from_balance = from
        .lamports()
        .checked_sub(amount)
        .ok_or(ProgramError::InsufficientFunds)?;
    let to_balance = to
        .lamports()
        .checked_add(amount)
        .ok_or(RaffleError::Overflow)?;

    **from.try_borrow_mut_lamports()? = from_balance;
    **to.try_borrow_mut_lamports()? = to_balance;
    Ok(())
}

/// Lamports an account holds above the rent-exempt minimum for its size
pub fn account_pot(account: &AccountInfo) -> Result<u64, ProgramError> {
    let rent = Rent::get()?;
    Ok(pot_balance(
        account.lamports(),
        rent.minimum_balance(account.data_len()),
    ))
}

/// Find the program derived address of a coordinator subscription
pub fn find_subscription_address(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    subscription_id: u64,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            SUBSCRIPTION_SEED,
            coordinator.as_ref(),
            &subscription_id.to_le_bytes(),
        ],
        program_id,
    )
}

/// Find the program derived address of a pending randomness request
pub fn find_request_address(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    request_id: u64,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[REQUEST_SEED, coordinator.as_ref(), &request_id.to_le_bytes()],
        program_id,
    )
}

/// Reduce a 256-bit big-endian random word modulo `modulus`.
pub fn word_mod(word: &[u8; 32], modulus: u64) -> u64 {
    if modulus == 0 {
        return 0;
    }
    let modulus = modulus as u128;
    // acc < 2^64, so acc * 256 + 255 fits in u128
    word.iter()
        .fold(0u128, |acc, byte| (acc * 256 + *byte as u128) % modulus) as u64
}

/// Lamports held by an account above its rent-exempt minimum
pub fn pot_balance(lamports: u64, rent_exempt_minimum: u64) -> u64 {
    lamports.saturating_sub(rent_exempt_minimum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_mod_uses_the_full_word() {
        let mut word = [0u8; 32];
        word[31] = 7;
        assert_eq!(word_mod(&word, 4), 3);

        // 2^8 mod 5 = 1
        let mut word = [0u8; 32];
        word[30] = 1;
        assert_eq!(word_mod(&word, 5), 1);

        // 2^255 mod 3 = 2
        let mut word = [0u8; 32];
        word[0] = 0x80;
        assert_eq!(word_mod(&word, 3), 2);
    }

    #[test]
    fn word_mod_of_zero_modulus_is_zero() {
        assert_eq!(word_mod(&[0xff; 32], 0), 0);
    }

    #[test]
    fn pot_balance_excludes_rent() {
        assert_eq!(pot_balance(1_500, 1_000), 500);
        assert_eq!(pot_balance(900, 1_000), 0);
    }

    #[test]
    fn request_addresses_are_keyed_by_id() {
        let program_id = Pubkey::new_unique();
        let coordinator = Pubkey::new_unique();
        let (first, _) = find_request_address(&program_id, &coordinator, 1);
        let (second, _) = find_request_address(&program_id, &coordinator, 2);
        assert_ne!(first, second);
        let (subscription, _) = find_subscription_address(&program_id, &coordinator, 1);
        assert_ne!(first, subscription);
    }
}
