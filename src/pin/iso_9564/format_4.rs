//! Module for Encoding, Encrypting, and Decrypting of PIN Blocks in ISO 9564 Format 4.
//!
//! Format 4 is the AES-based ISO 9564 PIN block: a 16-byte PIN field (control
//! nibble `0x4`, length nibble, BCD PIN digits, `0xA` filler, second half
//! filled with random padding) is AES-ECB encrypted, XORed with a 16-byte PAN
//! field, then AES-ECB encrypted again. Unlike formats 0/3 this binds PIN to
//! PAN through two encryption passes rather than a single XOR.
//!
//! # Example
//!
//! ```
//! use keycustody::pin::{encipher_pinblock_iso_4, decipher_pinblock_iso_4};
//!
//! let key = hex::decode("00112233445566778899AABBCCDDEEFF").unwrap();
//! let pin = "1234";
//! let pan = "1234567890123456789";
//! let rnd_seed = vec![0xFF; 8];
//! let block = encipher_pinblock_iso_4(&key, pin, pan, rnd_seed).unwrap();
//! assert_eq!(decipher_pinblock_iso_4(&key, &block, pan).unwrap(), pin);
//! ```

use crate::utils::{left_pad_str, right_pad_str, xor_byte_arrays};

use soft_aes::aes::{aes_dec_ecb, aes_enc_ecb};
use std::error::Error;

const ISO4_PIN_BLOCK_LENGTH: usize = 16;

/// Build the ISO-4 PIN field: control nibble `0x4`, length nibble, BCD PIN
/// digits, `0xA` filler, second half filled from `rnd_seed`.
pub fn encode_pin_field_iso_4(
    pin: &str,
    rnd_seed: Vec<u8>,
) -> Result<[u8; ISO4_PIN_BLOCK_LENGTH], Box<dyn Error>> {
    if pin.len() < 4 || pin.len() > 12 || !pin.chars().all(char::is_numeric) {
        return Err("PIN BLOCK ISO 4 ERROR: PIN must be between 4 and 12 digits long".into());
    }
    if rnd_seed.len() < 8 {
        return Err("PIN BLOCK ISO 4 ERROR: Random seed must be at least 8 bytes long".into());
    }

    let mut pin_field = [0u8; ISO4_PIN_BLOCK_LENGTH];
    pin_field[0] = 0x40 | pin.len() as u8;

    for (i, c) in pin.chars().enumerate() {
        let digit = c.to_digit(10).unwrap() as u8;
        pin_field[1 + i / 2] |= if i % 2 == 0 { digit << 4 } else { digit };
    }

    for i in pin.len()..14 {
        pin_field[1 + i / 2] |= if i % 2 == 0 { 0xA0 } else { 0x0A };
    }

    pin_field[8..].copy_from_slice(&rnd_seed[..8]);

    Ok(pin_field)
}

/// Decode an ISO-4 PIN field, recovering the PIN.
pub fn decode_pin_field_iso_4(pin_field: &[u8]) -> Result<String, Box<dyn Error>> {
    if pin_field.len() != 16 {
        return Err("PIN BLOCK ISO 4 ERROR: PIN field must be 16 bytes long".into());
    }

    if pin_field[0] >> 4 != 0x4 {
        return Err(format!(
            "PIN BLOCK ISO 4 ERROR: PIN block is not ISO format 4: control field `{}`",
            pin_field[0] >> 4
        )
        .into());
    }

    let pin_len = (pin_field[0] & 0x0F) as usize;
    if pin_len < 4 || pin_len > 12 {
        return Err(format!(
            "PIN BLOCK ISO 4 ERROR: PIN length must be between 4 and 12: `{}`",
            pin_len
        )
        .into());
    }

    let mut pin = String::new();
    for i in 0..pin_len {
        let digit = if i % 2 == 0 {
            pin_field[1 + i / 2] >> 4
        } else {
            pin_field[1 + i / 2] & 0x0F
        };
        if digit > 9 {
            return Err("PIN BLOCK ISO 4 ERROR: PIN contains invalid digit".into());
        }
        pin.push_str(&digit.to_string());
    }

    for i in pin_len..14 {
        let filler = if i % 2 == 0 {
            pin_field[1 + i / 2] >> 4
        } else {
            pin_field[1 + i / 2] & 0x0F
        };
        if filler != 0xA {
            return Err("PIN BLOCK ISO 4 ERROR: PIN block filler is incorrect".into());
        }
    }

    Ok(pin)
}

/// Build the ISO-4 PAN field: a length-of-excess nibble (PAN digits beyond
/// 12, or 0), the PAN left-padded to 12 digits, right-padded with zero
/// nibbles to fill the 16-byte field.
pub fn encode_pan_field_iso_4(pan: &str) -> Result<[u8; 16], Box<dyn Error>> {
    if pan.is_empty() || pan.len() > 19 || !pan.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "PAN OUT OF RANGE ISO 4 ERROR: PAN must be 1..19 numeric digits long, got {}",
            pan.len()
        )
        .into());
    }

    let pan_len = if pan.len() > 12 {
        (pan.len() - 12).to_string()
    } else {
        "0".to_string()
    };

    let pan_padded = left_pad_str(pan, 12, '0');
    let pan_field = pan_len + &pan_padded;
    let pan_field_hex = right_pad_str(&pan_field, 32, '0');
    let pan_bytes = hex::decode(&pan_field_hex)?;

    Ok(pan_bytes
        .as_slice()
        .try_into()
        .expect("Invalid length for conversion"))
}

/// Encipher a PIN and PAN into an encrypted ISO 9564 format 4 PIN block.
pub fn encipher_pinblock_iso_4(
    key: &[u8],
    pin: &str,
    pan: &str,
    rnd_seed: Vec<u8>,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let pin_field = encode_pin_field_iso_4(pin, rnd_seed)?;
    let pan_field = encode_pan_field_iso_4(pan)?;

    let intermediate_block_a = aes_enc_ecb(&pin_field, key, None)?;
    let intermediate_block_b = xor_byte_arrays(&intermediate_block_a, &pan_field)?;
    let encrypted_block = aes_enc_ecb(&intermediate_block_b, key, None)?;

    Ok(encrypted_block)
}

/// Decipher an ISO 9564 format 4 PIN block, recovering the PIN.
pub fn decipher_pinblock_iso_4(
    key: &[u8],
    pin_block: &[u8],
    pan: &str,
) -> Result<String, Box<dyn Error>> {
    if pin_block.len() != 16 {
        return Err(
            "PIN BLOCK ISO 4 ERROR: Data length must be multiple of AES block size 16".into(),
        );
    }

    let intermediate_block_b = aes_dec_ecb(pin_block, key, None)?;
    let pan_field = encode_pan_field_iso_4(pan)?;
    let intermediate_block_a = xor_byte_arrays(&intermediate_block_b, &pan_field)?;
    let pin_field = aes_dec_ecb(&intermediate_block_a, key, None)?;
    let pin = decode_pin_field_iso_4(&pin_field)?;

    Ok(pin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_pan_out_of_range() {
        assert!(encode_pan_field_iso_4("").is_err());
        assert!(encode_pan_field_iso_4(&"1".repeat(20)).is_err());
    }
}
