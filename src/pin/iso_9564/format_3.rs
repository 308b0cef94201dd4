//! Module for Encoding and Decoding of PIN Blocks in ISO 9564 Format 3.
//!
//! Format 3 is structurally identical to format 0 (control nibble, length
//! nibble, BCD PIN digits, XORed with a PAN field built from the rightmost
//! 12 digits of the PAN excluding the check digit) except the control
//! nibble is `0x3` and the filler nibbles are random hex digits in A..F
//! (derived from `rnd_seed`) rather than a fixed `0xF`.
//!
//! # Example
//!
//! ```
//! use keycustody::pin::{encode_pinblock_iso_3, decode_pinblock_iso_3};
//!
//! let pin = "1234";
//! let pan = "12345678901234";
//! let rnd_seed = vec![0xFF; 8];
//! let block = encode_pinblock_iso_3(pin, pan, rnd_seed).unwrap();
//! assert_eq!(decode_pinblock_iso_3(&block, pan).unwrap(), pin);
//! ```

use crate::utils::{transform_nibbles_to_af, xor_byte_arrays};
use std::error::Error;

const ISO3_PIN_BLOCK_LENGTH: usize = 8;

/// Encode a PIN and PAN into an ISO 9564 format 3 PIN block.
pub fn encode_pinblock_iso_3(
    pin: &str,
    pan: &str,
    rnd_seed: Vec<u8>,
) -> Result<[u8; ISO3_PIN_BLOCK_LENGTH], Box<dyn Error>> {
    let pin_field = encode_pin_field_iso_3(pin, &rnd_seed)?;
    let pan_field = encode_pan_field_iso_3(pan)?;
    let pin_block = xor_byte_arrays(&pin_field, &pan_field)?;
    Ok(pin_block.try_into().unwrap_or_else(|_| {
        panic!(
            "Failed to convert the result into an array of length {}",
            ISO3_PIN_BLOCK_LENGTH
        )
    }))
}

/// Decode an ISO 9564 format 3 PIN block, recovering the PIN.
pub fn decode_pinblock_iso_3(pin_block: &[u8], pan: &str) -> Result<String, Box<dyn Error>> {
    if pin_block.len() != 8 {
        return Err("PIN BLOCK ISO 3 ERROR: Invalid PIN block length".into());
    }
    let pan_field = encode_pan_field_iso_3(pan)?;
    let pin_field = xor_byte_arrays(pin_block, &pan_field)?;
    decode_pin_field_iso_3(&pin_field)
}

/// Build the ISO-3 PIN field: control nibble `0x3`, length nibble, BCD PIN
/// digits, filler nibbles taken from `rnd_seed` transformed into A..F.
pub fn encode_pin_field_iso_3(
    pin: &str,
    rnd_seed: &Vec<u8>,
) -> Result<[u8; ISO3_PIN_BLOCK_LENGTH], Box<dyn Error>> {
    if pin.len() < 4 || pin.len() > 12 || !pin.chars().all(char::is_numeric) {
        return Err("PIN BLOCK ISO 3 ERROR: PIN must be between 4 and 12 digits long".into());
    }

    let transformed_seed = transform_nibbles_to_af(rnd_seed);
    if transformed_seed.len() < ISO3_PIN_BLOCK_LENGTH {
        return Err("PIN BLOCK ISO 3 ERROR: Insufficient seed length for PIN block".into());
    }

    let mut pin_field = [0u8; ISO3_PIN_BLOCK_LENGTH];
    pin_field.copy_from_slice(&transformed_seed[..ISO3_PIN_BLOCK_LENGTH]);
    pin_field[0] = 0x30 | pin.len() as u8;

    for (i, c) in pin.chars().enumerate() {
        let digit = c.to_digit(10).unwrap() as u8;
        if i % 2 == 0 {
            pin_field[1 + i / 2] = (pin_field[1 + i / 2] & 0x0F) | (digit << 4);
        } else {
            pin_field[1 + i / 2] = (pin_field[1 + i / 2] & 0xF0) | digit;
        }
    }

    Ok(pin_field)
}

/// Decode an ISO-3 PIN field, recovering the PIN.
pub fn decode_pin_field_iso_3(pin_field: &[u8]) -> Result<String, Box<dyn Error>> {
    if pin_field.len() != 8 {
        return Err("PIN BLOCK ISO 3 ERROR: PIN field must be 8 bytes long".into());
    }
    if (pin_field[0] >> 4) != 0x3 {
        return Err("PIN BLOCK ISO 3 ERROR: PIN block is not ISO format 3.".into());
    }

    let pin_len = (pin_field[0] & 0x0F) as usize;
    if pin_len < 4 || pin_len > 12 {
        return Err("PIN BLOCK ISO 3 ERROR: PIN length must be between 4 and 12".into());
    }

    let mut pin = String::new();
    for i in 0..pin_len {
        let digit = if i % 2 == 0 {
            pin_field[1 + i / 2] >> 4
        } else {
            pin_field[1 + i / 2] & 0x0F
        };
        if digit > 9 {
            return Err("PIN BLOCK ISO 3 ERROR: PIN contains invalid digit".into());
        }
        pin.push_str(&digit.to_string());
    }

    for i in pin_len..14 {
        let filler = if i % 2 == 0 {
            pin_field[1 + i / 2] >> 4
        } else {
            pin_field[1 + i / 2] & 0x0F
        };
        if !(0xA..=0xF).contains(&filler) {
            return Err("PIN BLOCK ISO 3 ERROR: PIN block filler is incorrect".into());
        }
    }

    Ok(pin)
}

/// Build the ISO-3 PAN field: 4 zero nibbles followed by the rightmost 12
/// digits of the PAN excluding the check digit, BCD-encoded.
pub fn encode_pan_field_iso_3(pan: &str) -> Result<[u8; ISO3_PIN_BLOCK_LENGTH], Box<dyn Error>> {
    if pan.len() < 13 {
        return Err(
            "PIN BLOCK ISO 3 ERROR: PAN must be at least 13 digits long for ISO 3 encoding".into(),
        );
    }
    if pan.len() > 19 || !pan.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "PAN OUT OF RANGE ISO 3 ERROR: PAN must be 13..19 numeric digits long, got {}",
            pan.len()
        )
        .into());
    }

    let pan_last_12 = &pan[pan.len() - 13..pan.len() - 1];
    let mut pan_field = [0u8; ISO3_PIN_BLOCK_LENGTH];
    for (i, digit_char) in pan_last_12.chars().enumerate() {
        let digit = digit_char.to_digit(10).ok_or("Invalid digit in PAN")? as u8;
        if i % 2 == 0 {
            pan_field[2 + i / 2] = digit << 4;
        } else {
            pan_field[2 + i / 2] |= digit;
        }
    }

    Ok(pan_field)
}
