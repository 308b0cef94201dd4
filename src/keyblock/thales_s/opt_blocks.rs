//! Optional-block TLV list for the Thales-S key block: a 2-character ASCII
//! id, a 2-digit ASCII decimal length (counting the whole TLV in
//! characters), and hex-encoded data.

use crate::error::HsmError;
use crate::utils::{hex_decode, hex_encode_upper};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptBlockEntry {
    pub id: [u8; 2],
    pub data: Vec<u8>,
}

impl OptBlockEntry {
    pub fn new(id: [u8; 2], data: Vec<u8>) -> Self {
        Self { id, data }
    }

    fn ascii_len(&self) -> usize {
        4 + self.data.len() * 2
    }

    fn serialize(&self) -> String {
        format!(
            "{}{:02}{}",
            std::str::from_utf8(&self.id).expect("id is ASCII"),
            self.ascii_len(),
            hex_encode_upper(&self.data)
        )
    }
}

/// Render a list of optional blocks as one concatenated ASCII string.
pub fn serialize_opt_blocks(blocks: &[OptBlockEntry]) -> String {
    blocks.iter().map(|b| b.serialize()).collect()
}

/// Parse `count` optional blocks from the front of `s`, returning the
/// parsed blocks and the byte offset of the remainder.
pub fn parse_opt_blocks(s: &str, count: u8) -> Result<(Vec<OptBlockEntry>, usize), HsmError> {
    let bytes = s.as_bytes();
    let mut offset = 0usize;
    let mut blocks = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if bytes.len() < offset + 4 {
            return Err(HsmError::OptionalBlockTruncated);
        }
        let id_slice = &bytes[offset..offset + 2];
        let mut id = [0u8; 2];
        id.copy_from_slice(id_slice);
        let len_str = std::str::from_utf8(&bytes[offset + 2..offset + 4])
            .map_err(|_| HsmError::OptionalBlockTruncated)?;
        let ascii_len: usize = len_str
            .parse()
            .map_err(|_| HsmError::OptionalBlockTruncated)?;
        if ascii_len < 4 || bytes.len() < offset + ascii_len {
            return Err(HsmError::OptionalBlockTruncated);
        }
        let hex_data = &s[offset + 4..offset + ascii_len];
        let data = hex_decode(hex_data).map_err(|_| HsmError::OptionalBlockTruncated)?;
        blocks.push(OptBlockEntry::new(id, data));
        offset += ascii_len;
    }
    Ok((blocks, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_single_block() {
        let blocks = vec![OptBlockEntry::new(*b"KS", vec![0xDE, 0xAD, 0xBE, 0xEF])];
        let ascii = serialize_opt_blocks(&blocks);
        let (parsed, offset) = parse_opt_blocks(&ascii, 1).unwrap();
        assert_eq!(parsed, blocks);
        assert_eq!(offset, ascii.len());
    }

    #[test]
    fn roundtrips_multiple_blocks_and_empty_data() {
        let blocks = vec![
            OptBlockEntry::new(*b"KS", vec![]),
            OptBlockEntry::new(*b"TS", vec![0x01, 0x02, 0x03]),
        ];
        let ascii = serialize_opt_blocks(&blocks);
        let (parsed, offset) = parse_opt_blocks(&ascii, 2).unwrap();
        assert_eq!(parsed, blocks);
        assert_eq!(offset, ascii.len());
    }

    #[test]
    fn zero_blocks_consume_nothing() {
        let (parsed, offset) = parse_opt_blocks("irrelevant", 0).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(offset, 0);
    }

    #[test]
    fn truncated_block_is_rejected() {
        assert!(parse_opt_blocks("KS", 1).is_err());
        assert!(parse_opt_blocks("KS10AB", 1).is_err());
    }
}
