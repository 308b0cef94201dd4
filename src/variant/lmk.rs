//! LMK pairs, the LMK set, and the non-PCI / PCI-HSM key-type tables.

use crate::error::HsmError;

/// An ordered pair of 8-byte halves. The 16-byte concatenation `left ||
/// right` is a 2-key triple-DES key used in `K1-K2-K1` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LmkPair {
    pub left: [u8; 8],
    pub right: [u8; 8],
}

impl LmkPair {
    pub fn new(left: [u8; 8], right: [u8; 8]) -> Self {
        Self { left, right }
    }

    /// The effective 3DES key `left || right || left` (K1-K2-K1).
    pub fn effective_key(&self) -> [u8; 24] {
        let mut out = [0u8; 24];
        out[..8].copy_from_slice(&self.left);
        out[8..16].copy_from_slice(&self.right);
        out[16..].copy_from_slice(&self.left);
        out
    }
}

/// A fixed array of 20 LMK pairs, immutable for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct LmkSet {
    pairs: [LmkPair; 20],
}

/// The payShield test LMK used throughout the test vectors in this crate's
/// documentation: `0123456789ABCDEF || FEDCBA9876543210`.
const TEST_LMK_LEFT: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
const TEST_LMK_RIGHT: [u8; 8] = [0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54, 0x32, 0x10];

impl LmkSet {
    /// Build the built-in default test set: pair 0 is the canonical
    /// payShield test LMK; pairs 1..19 are derived from it by XORing the
    /// pair index into the last byte of each half, which keeps every pair
    /// distinct while remaining fully deterministic and built into the
    /// binary (no key material is read from disk).
    pub fn default_test_set() -> Self {
        let mut pairs = [LmkPair::new(TEST_LMK_LEFT, TEST_LMK_RIGHT); 20];
        for (i, pair) in pairs.iter_mut().enumerate() {
            pair.left[7] ^= i as u8;
            pair.right[7] ^= i as u8;
        }
        Self { pairs }
    }

    /// Build a set whose pair 0 is derived from externally supplied key
    /// material (the `HSM_LMK` environment variable), with pairs 1..19
    /// derived the same way as [`LmkSet::default_test_set`].
    ///
    /// `seed` must be 8, 16, or 24 bytes (decoded from 16/32/48 hex chars).
    /// Shorter-than-16-byte seeds are cycled to fill the 16-byte pair.
    pub fn from_seed(seed: &[u8]) -> Result<Self, HsmError> {
        if ![8, 16, 24].contains(&seed.len()) {
            return Err(HsmError::HandlerFailure(format!(
                "HSM_LMK must decode to 8, 16, or 24 bytes, got {}",
                seed.len()
            )));
        }
        let mut cycled = [0u8; 16];
        for (i, b) in cycled.iter_mut().enumerate() {
            *b = seed[i % seed.len()];
        }
        let mut left = [0u8; 8];
        let mut right = [0u8; 8];
        left.copy_from_slice(&cycled[..8]);
        right.copy_from_slice(&cycled[8..]);

        let mut pairs = [LmkPair::new(left, right); 20];
        for (i, pair) in pairs.iter_mut().enumerate().skip(1) {
            pair.left[7] ^= i as u8;
            pair.right[7] ^= i as u8;
        }
        Ok(Self { pairs })
    }

    pub fn pair(&self, index: usize) -> Option<&LmkPair> {
        self.pairs.get(index)
    }
}

impl Default for LmkSet {
    fn default() -> Self {
        Self::default_test_set()
    }
}

/// A key-type descriptor: the LMK pair and variant to use for a given
/// three-character Thales key-type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTypeDescriptor {
    pub code: &'static str,
    pub name: &'static str,
    pub lmk_pair_index: usize,
    pub variant_id: u8,
}

/// The non-PCI key-type table. A representative subset of the Thales
/// variant key-type catalogue, sufficient to exercise the engine end to
/// end; entries are not exhaustive (see spec.md §1's "representative
/// command set" framing).
pub const NON_PCI_KEY_TYPES: &[KeyTypeDescriptor] = &[
    KeyTypeDescriptor {
        code: "000",
        name: "ZMK",
        lmk_pair_index: 0,
        variant_id: 0,
    },
    KeyTypeDescriptor {
        code: "001",
        name: "ZPK",
        lmk_pair_index: 1,
        variant_id: 1,
    },
    KeyTypeDescriptor {
        code: "002",
        name: "PVK",
        lmk_pair_index: 9,
        variant_id: 1,
    },
    KeyTypeDescriptor {
        code: "101",
        name: "TMK",
        lmk_pair_index: 2,
        variant_id: 2,
    },
    KeyTypeDescriptor {
        code: "102",
        name: "TPK",
        lmk_pair_index: 2,
        variant_id: 3,
    },
    KeyTypeDescriptor {
        code: "200",
        name: "MK-AC",
        lmk_pair_index: 3,
        variant_id: 4,
    },
    KeyTypeDescriptor {
        code: "402",
        name: "CVK",
        lmk_pair_index: 4,
        variant_id: 5,
    },
    KeyTypeDescriptor {
        code: "602",
        name: "BDK",
        lmk_pair_index: 5,
        variant_id: 6,
    },
];

/// The PCI-HSM key-type table. Same codes, independent LMK pair / variant
/// assignments, consulted when `pci_mode` is enabled.
pub const PCI_KEY_TYPES: &[KeyTypeDescriptor] = &[
    KeyTypeDescriptor {
        code: "000",
        name: "ZMK",
        lmk_pair_index: 10,
        variant_id: 1,
    },
    KeyTypeDescriptor {
        code: "001",
        name: "ZPK",
        lmk_pair_index: 11,
        variant_id: 2,
    },
    KeyTypeDescriptor {
        code: "002",
        name: "PVK",
        lmk_pair_index: 12,
        variant_id: 3,
    },
    KeyTypeDescriptor {
        code: "101",
        name: "TMK",
        lmk_pair_index: 13,
        variant_id: 4,
    },
    KeyTypeDescriptor {
        code: "102",
        name: "TPK",
        lmk_pair_index: 13,
        variant_id: 5,
    },
    KeyTypeDescriptor {
        code: "200",
        name: "MK-AC",
        lmk_pair_index: 14,
        variant_id: 6,
    },
    KeyTypeDescriptor {
        code: "402",
        name: "CVK",
        lmk_pair_index: 15,
        variant_id: 7,
    },
    KeyTypeDescriptor {
        code: "602",
        name: "BDK",
        lmk_pair_index: 16,
        variant_id: 8,
    },
];

/// Look up a key-type descriptor by code in the given table.
pub fn lookup_key_type(table: &[KeyTypeDescriptor], code: &str) -> Result<KeyTypeDescriptor, HsmError> {
    table
        .iter()
        .find(|d| d.code == code)
        .copied()
        .ok_or_else(|| HsmError::UnknownKeyType(code.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_table_entries_have_valid_lmk_pair_index() {
        for entry in NON_PCI_KEY_TYPES.iter().chain(PCI_KEY_TYPES.iter()) {
            assert!(
                entry.lmk_pair_index < 20,
                "key type {} has out-of-range lmk_pair_index {}",
                entry.code,
                entry.lmk_pair_index
            );
        }
    }

    #[test]
    fn default_test_set_pair_zero_matches_published_test_lmk() {
        let set = LmkSet::default_test_set();
        let pair0 = set.pair(0).unwrap();
        assert_eq!(pair0.left, TEST_LMK_LEFT);
        assert_eq!(pair0.right, TEST_LMK_RIGHT);
    }

    #[test]
    fn default_test_set_pairs_are_distinct() {
        let set = LmkSet::default_test_set();
        for i in 1..20 {
            assert_ne!(set.pair(0).unwrap(), set.pair(i).unwrap());
        }
    }

    #[test]
    fn from_seed_rejects_bad_lengths() {
        assert!(LmkSet::from_seed(&[0u8; 7]).is_err());
        assert!(LmkSet::from_seed(&[0u8; 20]).is_err());
    }

    #[test]
    fn from_seed_accepts_allowed_lengths() {
        assert!(LmkSet::from_seed(&[0u8; 8]).is_ok());
        assert!(LmkSet::from_seed(&[0u8; 16]).is_ok());
        assert!(LmkSet::from_seed(&[0u8; 24]).is_ok());
    }

    #[test]
    fn lookup_key_type_finds_known_code() {
        let d = lookup_key_type(NON_PCI_KEY_TYPES, "001").unwrap();
        assert_eq!(d.name, "ZPK");
    }

    #[test]
    fn lookup_key_type_rejects_unknown_code() {
        assert_eq!(
            lookup_key_type(NON_PCI_KEY_TYPES, "999"),
            Err(HsmError::UnknownKeyType("999".to_string()))
        );
    }
}
