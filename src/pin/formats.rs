//! Dispatch from a two-digit Thales PIN block format code to the matching
//! codec. Only the unkeyed formats (those that do not require an
//! encryption key) are reachable here; format 4 is AES-keyed and is
//! exposed directly through [`crate::pin::encipher_pinblock_iso_4`] /
//! [`crate::pin::decipher_pinblock_iso_4`] instead.

use crate::error::HsmError;
use crate::pin::iso_9564::{
    decode_pinblock_iso_0, decode_pinblock_iso_1, decode_pinblock_iso_3, encode_pinblock_iso_0,
    encode_pinblock_iso_1, encode_pinblock_iso_3,
};
use crate::utils::secure_random_fill;
use std::error::Error;

/// Classify a codec error into the specific `HsmError` variant a host
/// expects, by the marker the codec embeds at the validation site that
/// rejected the PIN or PAN length. Anything else collapses to
/// [`HsmError::HandlerFailure`].
fn classify_codec_error(e: Box<dyn Error>) -> HsmError {
    let msg = e.to_string();
    if msg.contains("PIN OUT OF RANGE")
        || msg.contains("PIN must be between 4 and 12 digits long")
        || msg.contains("PIN length must be between 4 and 12")
    {
        HsmError::PinOutOfRange(msg)
    } else if msg.contains("PAN OUT OF RANGE")
        || msg.contains("PAN must be at least 13 digits long")
    {
        HsmError::PanOutOfRange(msg)
    } else {
        HsmError::HandlerFailure(msg)
    }
}

/// The supported unkeyed PIN block formats, keyed by Thales's two-digit
/// decimal code. Codes present in the Thales catalogue but not implemented
/// here (Docutel, PLUS, Mastercard, Visa, ISO format 2) are intentionally
/// absent and fall through to [`HsmError::UnsupportedPinBlockFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinBlockFormat {
    Iso0,
    Iso1,
    Iso3,
}

fn lookup(format_code: &str) -> Result<PinBlockFormat, HsmError> {
    match format_code {
        "01" => Ok(PinBlockFormat::Iso0),
        "05" => Ok(PinBlockFormat::Iso1),
        "47" => Ok(PinBlockFormat::Iso3),
        other => Err(HsmError::UnsupportedPinBlockFormat(other.to_string())),
    }
}

/// Encode `pin` (and, for PAN-bound formats, `pan`) under `format_code`,
/// producing an 8-byte PIN block.
pub fn encode(format_code: &str, pin: &str, pan: &str) -> Result<[u8; 8], HsmError> {
    let format = lookup(format_code)?;
    match format {
        PinBlockFormat::Iso0 => encode_pinblock_iso_0(pin, pan).map_err(classify_codec_error),
        PinBlockFormat::Iso1 => {
            let mut seed = [0u8; 8];
            secure_random_fill(&mut seed);
            encode_pinblock_iso_1(pin, seed.to_vec()).map_err(classify_codec_error)
        }
        PinBlockFormat::Iso3 => {
            let mut seed = [0u8; 8];
            secure_random_fill(&mut seed);
            encode_pinblock_iso_3(pin, pan, seed.to_vec()).map_err(classify_codec_error)
        }
    }
}

/// Decode a PIN block produced by [`encode`] with the same `format_code`
/// and `pan`.
pub fn decode(format_code: &str, block: &[u8], pan: &str) -> Result<String, HsmError> {
    let format = lookup(format_code)?;
    match format {
        PinBlockFormat::Iso0 => decode_pinblock_iso_0(block, pan).map_err(classify_codec_error),
        PinBlockFormat::Iso1 => decode_pinblock_iso_1(block).map_err(classify_codec_error),
        PinBlockFormat::Iso3 => decode_pinblock_iso_3(block, pan).map_err(classify_codec_error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s5_iso0_roundtrip() {
        let pan = "4111111111111111";
        let block = encode("01", "1234", pan).unwrap();
        assert_eq!(block.len(), 8);
        assert_eq!(decode("01", &block, pan).unwrap(), "1234");
    }

    #[test]
    fn iso1_roundtrip_ignores_pan() {
        let block = encode("05", "998877", "4111111111111111").unwrap();
        assert_eq!(decode("05", &block, "").unwrap(), "998877");
    }

    #[test]
    fn iso3_roundtrip() {
        let pan = "12345678901234";
        let block = encode("47", "4321", pan).unwrap();
        assert_eq!(decode("47", &block, pan).unwrap(), "4321");
    }

    #[test]
    fn unknown_format_code_is_rejected() {
        assert_eq!(
            encode("41", "1234", "4111111111111111"),
            Err(HsmError::UnsupportedPinBlockFormat("41".to_string()))
        );
    }

    #[test]
    fn pin_out_of_range_is_typed() {
        assert!(matches!(
            encode("01", "123", "4111111111111111"),
            Err(HsmError::PinOutOfRange(_))
        ));
    }

    #[test]
    fn pan_out_of_range_is_typed() {
        assert!(matches!(
            encode("01", "1234", &"1".repeat(25)),
            Err(HsmError::PanOutOfRange(_))
        ));
    }

    #[test]
    fn pin_out_of_range_is_typed_on_decode() {
        let pan = "4111111111111111";
        let mut block = encode("01", "1234", pan).unwrap();
        block[0] = (block[0] & 0xF0) | 0x0D; // corrupt the PIN length nibble to 13
        assert!(matches!(
            decode("01", &block, pan),
            Err(HsmError::PinOutOfRange(_))
        ));
    }
}
