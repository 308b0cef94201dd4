//! Module for Encoding and Decoding of PIN Blocks in ISO 9564 Format 0.
//!
//! Format 0 (equivalent to ANSI X9.8) is the most common PIN block format:
//! an 8-byte PIN field holding a control nibble, a length nibble, the BCD
//! PIN digits, and `0xF` filler, XORed with an 8-byte PAN field built from
//! the rightmost 12 digits of the PAN excluding the check digit. Unlike
//! format 3, the filler is fixed rather than derived from a random seed.
//!
//! # Example
//!
//! ```
//! use keycustody::pin::{encode_pinblock_iso_0, decode_pinblock_iso_0};
//!
//! let pin = "1234";
//! let pan = "4111111111111111";
//! let block = encode_pinblock_iso_0(pin, pan).unwrap();
//! assert_eq!(decode_pinblock_iso_0(&block, pan).unwrap(), pin);
//! ```

use crate::utils::xor_byte_arrays;
use std::error::Error;

const ISO0_PIN_BLOCK_LENGTH: usize = 8;

/// Encode a PIN and PAN into an ISO 9564 format 0 PIN block.
pub fn encode_pinblock_iso_0(pin: &str, pan: &str) -> Result<[u8; ISO0_PIN_BLOCK_LENGTH], Box<dyn Error>> {
    let pin_field = encode_pin_field_iso_0(pin)?;
    let pan_field = encode_pan_field_iso_0(pan)?;
    let pin_block = xor_byte_arrays(&pin_field, &pan_field)?;
    Ok(pin_block.try_into().unwrap_or_else(|_| {
        panic!(
            "Failed to convert the result into an array of length {}",
            ISO0_PIN_BLOCK_LENGTH
        )
    }))
}

/// Decode an ISO 9564 format 0 PIN block, recovering the PIN.
pub fn decode_pinblock_iso_0(pin_block: &[u8], pan: &str) -> Result<String, Box<dyn Error>> {
    if pin_block.len() != ISO0_PIN_BLOCK_LENGTH {
        return Err("PIN BLOCK ISO 0 ERROR: Invalid PIN block length".into());
    }
    let pan_field = encode_pan_field_iso_0(pan)?;
    let pin_field = xor_byte_arrays(pin_block, &pan_field)?;
    decode_pin_field_iso_0(&pin_field)
}

/// Build the ISO-0 PIN field: control nibble `0x0`, length nibble, BCD PIN
/// digits, `0xF` filler for the remaining nibbles.
pub fn encode_pin_field_iso_0(pin: &str) -> Result<[u8; ISO0_PIN_BLOCK_LENGTH], Box<dyn Error>> {
    if pin.len() < 4 || pin.len() > 12 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("PIN OUT OF RANGE ISO 0 ERROR: PIN must be between 4 and 12 digits long, got {}", pin.len()).into());
    }

    let mut pin_field = [0xFFu8; ISO0_PIN_BLOCK_LENGTH];
    pin_field[0] = 0x00 | pin.len() as u8;

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

/// Decode an ISO-0 PIN field, recovering the PIN.
pub fn decode_pin_field_iso_0(pin_field: &[u8]) -> Result<String, Box<dyn Error>> {
    if pin_field.len() != ISO0_PIN_BLOCK_LENGTH {
        return Err("PIN BLOCK ISO 0 ERROR: PIN field must be 8 bytes long".into());
    }
    if (pin_field[0] >> 4) != 0x0 {
        return Err("PIN BLOCK ISO 0 ERROR: PIN block is not ISO format 0.".into());
    }

    let pin_len = (pin_field[0] & 0x0F) as usize;
    if !(4..=12).contains(&pin_len) {
        return Err("PIN BLOCK ISO 0 ERROR: PIN length must be between 4 and 12".into());
    }

    let mut pin = String::new();
    for i in 0..pin_len {
        let digit = if i % 2 == 0 {
            pin_field[1 + i / 2] >> 4
        } else {
            pin_field[1 + i / 2] & 0x0F
        };
        if digit > 9 {
            return Err("PIN BLOCK ISO 0 ERROR: PIN contains invalid digit".into());
        }
        pin.push_str(&digit.to_string());
    }

    for i in pin_len..14 {
        let filler = if i % 2 == 0 {
            pin_field[1 + i / 2] >> 4
        } else {
            pin_field[1 + i / 2] & 0x0F
        };
        if filler != 0xF {
            return Err("PIN BLOCK ISO 0 ERROR: PIN block filler is incorrect".into());
        }
    }

    Ok(pin)
}

/// Build the ISO-0 PAN field: 4 zero nibbles followed by the rightmost 12
/// digits of the PAN excluding the check digit, BCD-encoded.
pub fn encode_pan_field_iso_0(pan: &str) -> Result<[u8; ISO0_PIN_BLOCK_LENGTH], Box<dyn Error>> {
    if pan.len() < 13 || pan.len() > 19 || !pan.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("PAN OUT OF RANGE ISO 0 ERROR: PAN must be 13..19 numeric digits long, got {}", pan.len()).into());
    }

    let pan_last_12 = &pan[pan.len() - 13..pan.len() - 1];
    let mut pan_field = [0u8; ISO0_PIN_BLOCK_LENGTH];
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
