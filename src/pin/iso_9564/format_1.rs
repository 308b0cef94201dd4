//! Module for Encoding and Decoding of PIN Blocks in ISO 9564 Format 1.
//!
//! Format 1 has no PAN binding: the PIN field is transmitted as-is, with
//! random filler (restricted to the A-F nibble range, as in format 3) in
//! place of a PAN XOR. This trades the format-0/3 replay protection for a
//! field that any HSM can decode without the caller resupplying the PAN.
//!
//! # Example
//!
//! ```
//! use keycustody::pin::{encode_pinblock_iso_1, decode_pinblock_iso_1};
//!
//! let block = encode_pinblock_iso_1("1234", vec![0x5A; 8]).unwrap();
//! assert_eq!(decode_pinblock_iso_1(&block).unwrap(), "1234");
//! ```

use crate::utils::transform_nibbles_to_af;
use std::error::Error;

const ISO1_PIN_BLOCK_LENGTH: usize = 8;

/// Encode a PIN into an ISO 9564 format 1 PIN block (no PAN binding).
pub fn encode_pinblock_iso_1(pin: &str, rnd_seed: Vec<u8>) -> Result<[u8; ISO1_PIN_BLOCK_LENGTH], Box<dyn Error>> {
    if pin.len() < 4 || pin.len() > 12 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "PIN OUT OF RANGE ISO 1 ERROR: PIN must be between 4 and 12 digits long, got {}",
            pin.len()
        )
        .into());
    }

    let transformed_seed = transform_nibbles_to_af(&rnd_seed);
    if transformed_seed.len() < ISO1_PIN_BLOCK_LENGTH {
        return Err("PIN BLOCK ISO 1 ERROR: Insufficient seed length for PIN block".into());
    }

    let mut pin_field = [0u8; ISO1_PIN_BLOCK_LENGTH];
    pin_field.copy_from_slice(&transformed_seed[..ISO1_PIN_BLOCK_LENGTH]);
    pin_field[0] = 0x10 | pin.len() as u8;

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

/// Decode an ISO 9564 format 1 PIN block, recovering the PIN.
pub fn decode_pinblock_iso_1(pin_block: &[u8]) -> Result<String, Box<dyn Error>> {
    if pin_block.len() != ISO1_PIN_BLOCK_LENGTH {
        return Err("PIN BLOCK ISO 1 ERROR: PIN block must be 8 bytes long".into());
    }
    if (pin_block[0] >> 4) != 0x1 {
        return Err("PIN BLOCK ISO 1 ERROR: PIN block is not ISO format 1.".into());
    }

    let pin_len = (pin_block[0] & 0x0F) as usize;
    if !(4..=12).contains(&pin_len) {
        return Err("PIN BLOCK ISO 1 ERROR: PIN length must be between 4 and 12".into());
    }

    let mut pin = String::new();
    for i in 0..pin_len {
        let digit = if i % 2 == 0 {
            pin_block[1 + i / 2] >> 4
        } else {
            pin_block[1 + i / 2] & 0x0F
        };
        if digit > 9 {
            return Err("PIN BLOCK ISO 1 ERROR: PIN contains invalid digit".into());
        }
        pin.push_str(&digit.to_string());
    }

    for i in pin_len..14 {
        let filler = if i % 2 == 0 {
            pin_block[1 + i / 2] >> 4
        } else {
            pin_block[1 + i / 2] & 0x0F
        };
        if !(0xA..=0xF).contains(&filler) {
            return Err("PIN BLOCK ISO 1 ERROR: PIN block filler is incorrect".into());
        }
    }

    Ok(pin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_without_pan() {
        let block = encode_pinblock_iso_1("654321", vec![0x11; 8]).unwrap();
        assert_eq!(decode_pinblock_iso_1(&block).unwrap(), "654321");
    }

    #[test]
    fn rejects_pin_out_of_range() {
        assert!(encode_pinblock_iso_1("12", vec![0x00; 8]).is_err());
    }

    #[test]
    fn decode_rejects_wrong_control_nibble() {
        let mut block = encode_pinblock_iso_1("1234", vec![0x22; 8]).unwrap();
        block[0] = 0x24;
        assert!(decode_pinblock_iso_1(&block).is_err());
    }
}
