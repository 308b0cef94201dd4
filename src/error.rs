//! Error taxonomy for the key-custody engine and command dispatcher.
//!
//! Every variant maps to exactly one two-digit wire status code (see the
//! status code table in the crate's top-level documentation). Handlers and
//! engine functions return `HsmError` so the dispatcher can derive the
//! response status without inspecting error messages.

use thiserror::Error;

/// Errors produced by the variant LMK engine, the key-block engines, the
/// PIN block codecs, and the command dispatcher.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum HsmError {
    #[error("malformed request: {0}")]
    Framing(String),

    #[error("unknown command")]
    UnknownCommand,

    #[error("unknown key type code: {0}")]
    UnknownKeyType(String),

    #[error("invalid key scheme byte: {0}")]
    InvalidScheme(char),

    #[error("wrong key length for scheme {scheme}: expected {expected}, got {actual}")]
    WrongKeyLengthForScheme {
        scheme: char,
        expected: usize,
        actual: usize,
    },

    #[error("parity check failed on input key")]
    ParityFailed,

    #[error("variant id out of range: {0}")]
    VariantUnknown(u8),

    #[error("unsupported AES key length: {0}")]
    AesKeyLength(usize),

    #[error("key block header is malformed: {0}")]
    HeaderInvalid(String),

    #[error("optional block truncated")]
    OptionalBlockTruncated,

    #[error("key block MAC verification failed")]
    MacVerificationFailed,

    #[error("ciphertext is not a multiple of the cipher block size")]
    CiphertextAlignment,

    #[error("decrypted key length is inconsistent with the payload")]
    KeyLengthInconsistent,

    #[error("unsupported PIN block format code: {0}")]
    UnsupportedPinBlockFormat(String),

    #[error("PIN out of range: {0}")]
    PinOutOfRange(String),

    #[error("PAN out of range: {0}")]
    PanOutOfRange(String),

    #[error("handler failure: {0}")]
    HandlerFailure(String),
}

impl HsmError {
    /// Two-ASCII-digit status code surfaced on the wire, per the status
    /// code table.
    pub fn status_code(&self) -> &'static str {
        match self {
            HsmError::ParityFailed => "01",
            HsmError::WrongKeyLengthForScheme { .. } => "04",
            HsmError::InvalidScheme(_) => "05",
            HsmError::UnknownKeyType(_) => "10",
            HsmError::Framing(_) => "15",
            HsmError::UnsupportedPinBlockFormat(_) => "24",
            HsmError::MacVerificationFailed => "40",
            HsmError::UnknownCommand => "86",
            // Every other engine-level failure surfaces as a generic
            // handler failure; individual handlers may choose a more
            // specific code where the wire protocol defines one.
            HsmError::VariantUnknown(_)
            | HsmError::AesKeyLength(_)
            | HsmError::HeaderInvalid(_)
            | HsmError::OptionalBlockTruncated
            | HsmError::CiphertextAlignment
            | HsmError::KeyLengthInconsistent
            | HsmError::PinOutOfRange(_)
            | HsmError::PanOutOfRange(_)
            | HsmError::HandlerFailure(_) => "68",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_wire_table() {
        assert_eq!(HsmError::ParityFailed.status_code(), "01");
        assert_eq!(
            HsmError::WrongKeyLengthForScheme {
                scheme: 'X',
                expected: 8,
                actual: 7
            }
            .status_code(),
            "04"
        );
        assert_eq!(HsmError::InvalidScheme('Q').status_code(), "05");
        assert_eq!(HsmError::UnknownKeyType("999".into()).status_code(), "10");
        assert_eq!(HsmError::Framing("short read".into()).status_code(), "15");
        assert_eq!(
            HsmError::UnsupportedPinBlockFormat("99".into()).status_code(),
            "24"
        );
        assert_eq!(HsmError::MacVerificationFailed.status_code(), "40");
        assert_eq!(HsmError::UnknownCommand.status_code(), "86");
        assert_eq!(HsmError::HandlerFailure("boom".into()).status_code(), "68");
    }
}
