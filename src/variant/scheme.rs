//! Scheme tags: the single ASCII byte identifying a variant-wrapped key's
//! length and per-segment variant mask.

use crate::error::HsmError;

/// `X` = 8-byte single key, `U` = 16-byte double key, `T` = 24-byte triple key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeTag {
    Single,
    Double,
    Triple,
}

impl SchemeTag {
    pub fn from_char(c: char) -> Result<Self, HsmError> {
        match c {
            'X' => Ok(SchemeTag::Single),
            'U' => Ok(SchemeTag::Double),
            'T' => Ok(SchemeTag::Triple),
            other => Err(HsmError::InvalidScheme(other)),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            SchemeTag::Single => 'X',
            SchemeTag::Double => 'U',
            SchemeTag::Triple => 'T',
        }
    }

    /// Expected clear-key length in bytes for this scheme.
    pub fn key_len(&self) -> usize {
        match self {
            SchemeTag::Single => 8,
            SchemeTag::Double => 16,
            SchemeTag::Triple => 24,
        }
    }

    /// Number of 8-byte segments.
    pub fn segment_count(&self) -> usize {
        self.key_len() / 8
    }

    /// Per-segment variant bytes XORed into byte 8 of each segment's
    /// 2-key 3DES key before encrypting that segment.
    pub fn segment_variants(&self) -> &'static [u8] {
        match self {
            SchemeTag::Single => &[0x00],
            SchemeTag::Double => &[0xA6, 0x5A],
            SchemeTag::Triple => &[0x6A, 0xDE, 0x2B],
        }
    }

    pub fn check_key_len(&self, actual: usize) -> Result<(), HsmError> {
        let expected = self.key_len();
        if actual != expected {
            return Err(HsmError::WrongKeyLengthForScheme {
                scheme: self.as_char(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}
