//! The 16-byte ASCII key-block header shared by the Thales-S and TR-31
//! wire representations.
//!
//! Unlike [`crate::keyblock::tr31_2018::KeyBlockHeader`], which restricts
//! every field to the TR-31:2018 allowed-value tables, this header accepts
//! any printable-ASCII field value. Thales' proprietary key-block variant
//! uses version tags (e.g. `'1'`) that fall outside the TR-31 table, so the
//! two header types are kept independent rather than sharing one
//! restrictive validator.

use crate::error::HsmError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThalesHeader {
    pub version_id: u8,
    pub kb_length: u16,
    pub key_usage: [u8; 2],
    pub algorithm: u8,
    pub mode_of_use: u8,
    pub key_version_number: [u8; 2],
    pub exportability: u8,
    pub num_opt_blocks: u8,
    pub lmk_id: [u8; 2],
}

impl ThalesHeader {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version_id: u8,
        key_usage: [u8; 2],
        algorithm: u8,
        mode_of_use: u8,
        key_version_number: [u8; 2],
        exportability: u8,
        lmk_id: [u8; 2],
    ) -> Self {
        Self {
            version_id,
            kb_length: 0,
            key_usage,
            algorithm,
            mode_of_use,
            key_version_number,
            exportability,
            num_opt_blocks: 0,
            lmk_id,
        }
    }

    /// Render the fixed 16-byte ASCII header. `kb_length` must already be
    /// final (the caller computes it before encryption, since the header
    /// doubles as the CBC IV).
    pub fn to_ascii(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[0] = self.version_id;
        let len_str = format!("{:04}", self.kb_length);
        out[1..5].copy_from_slice(len_str.as_bytes());
        out[5..7].copy_from_slice(&self.key_usage);
        out[7] = self.algorithm;
        out[8] = self.mode_of_use;
        out[9..11].copy_from_slice(&self.key_version_number);
        out[11] = self.exportability;
        let opt_str = format!("{:02}", self.num_opt_blocks);
        out[12..14].copy_from_slice(opt_str.as_bytes());
        out[14..16].copy_from_slice(&self.lmk_id);
        out
    }

    pub fn from_ascii(bytes: &[u8]) -> Result<Self, HsmError> {
        if bytes.len() != 16 || !bytes.is_ascii() {
            return Err(HsmError::HeaderInvalid(
                "header must be exactly 16 ASCII bytes".to_string(),
            ));
        }
        let s = std::str::from_utf8(bytes).expect("already checked is_ascii");
        let kb_length: u16 = s[1..5]
            .parse()
            .map_err(|_| HsmError::HeaderInvalid("non-numeric length field".to_string()))?;
        let num_opt_blocks: u8 = s[12..14]
            .parse()
            .map_err(|_| HsmError::HeaderInvalid("non-numeric optional block count".to_string()))?;

        let mut key_usage = [0u8; 2];
        key_usage.copy_from_slice(&bytes[5..7]);
        let mut key_version_number = [0u8; 2];
        key_version_number.copy_from_slice(&bytes[9..11]);
        let mut lmk_id = [0u8; 2];
        lmk_id.copy_from_slice(&bytes[14..16]);

        Ok(Self {
            version_id: bytes[0],
            kb_length,
            key_usage,
            algorithm: bytes[7],
            mode_of_use: bytes[8],
            key_version_number,
            exportability: bytes[11],
            num_opt_blocks,
            lmk_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_ascii() {
        let mut header = ThalesHeader::new(b'1', *b"B0", b'A', b'E', *b"00", b'S', *b"00");
        header.kb_length = 70;
        let ascii = header.to_ascii();
        assert_eq!(ascii.len(), 16);
        let parsed = ThalesHeader::from_ascii(&ascii).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_non_ascii_or_wrong_length() {
        assert!(ThalesHeader::from_ascii(&[0u8; 15]).is_err());
        assert!(ThalesHeader::from_ascii(&[0xFFu8; 16]).is_err());
    }
}
