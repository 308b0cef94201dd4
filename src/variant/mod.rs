//! The variant LMK engine: type-varianted LMK derivation, per-segment
//! encryption/decryption of clear keys under an LMK, and the public
//! `encrypt_under_variant` / `decrypt_under_variant` contract.

pub mod kcv;
pub mod lmk;
pub mod scheme;

pub use kcv::{check_parity, fix_parity, kcv};
pub use lmk::{lookup_key_type, KeyTypeDescriptor, LmkPair, LmkSet, NON_PCI_KEY_TYPES, PCI_KEY_TYPES};
pub use scheme::SchemeTag;

use crate::des::{expand_2key_tdes, tdes_decrypt_block, tdes_encrypt_block};
use crate::error::HsmError;

/// Fixed `variant_id → byte` mapping, index 0 unused (variant 0 is the
/// identity XOR).
const VARIANT_MAP: [u8; 10] = [0x00, 0xA6, 0x5A, 0x6A, 0xDE, 0x2B, 0x50, 0x74, 0x9C, 0xFA];

/// Derive the type-varianted LMK pair for a given `variant_id`: the low
/// byte of `left` is XORed with `VARIANT_MAP[variant_id]`, and (for
/// component key handling) with `0xFF` on top of that.
fn varianted_pair(pair: &LmkPair, variant_id: u8, is_component: bool) -> Result<LmkPair, HsmError> {
    let v = *VARIANT_MAP
        .get(variant_id as usize)
        .ok_or(HsmError::VariantUnknown(variant_id))?;
    let mut left = pair.left;
    left[0] ^= v;
    if is_component {
        left[0] ^= 0xFF;
    }
    Ok(LmkPair {
        left,
        right: pair.right,
    })
}

/// Build the effective 24-byte 3DES key for one 8-byte segment: the
/// type-varianted LMK pair with the segment's scheme variant XORed into
/// byte 8, in `K1-K2-K1` form.
fn segment_key(varianted: &LmkPair, segment_variant: u8) -> [u8; 24] {
    let mut k16 = [0u8; 16];
    k16[..8].copy_from_slice(&varianted.left);
    k16[8..].copy_from_slice(&varianted.right);
    k16[8] ^= segment_variant;
    expand_2key_tdes(&k16)
}

fn resolve(
    table: &[KeyTypeDescriptor],
    key_type_code: &str,
    lmk_set: &LmkSet,
) -> Result<(KeyTypeDescriptor, LmkPair), HsmError> {
    let descriptor = lookup_key_type(table, key_type_code)?;
    let pair = *lmk_set
        .pair(descriptor.lmk_pair_index)
        .expect("table entries are validated to reference an existing LMK pair");
    Ok((descriptor, pair))
}

/// Encrypt a clear key under the LMK, varianted for `key_type_code` and
/// scheme-tagged for `scheme`. `is_component` selects the additional
/// `0xFF` XOR applied when the clear key is a key component rather than a
/// complete key.
///
/// Fails with [`HsmError::UnknownKeyType`] if `key_type_code` is not in
/// `table`, or with [`HsmError::WrongKeyLengthForScheme`] if `clear_key`'s
/// length does not match `scheme`.
pub fn encrypt_under_variant(
    table: &[KeyTypeDescriptor],
    key_type_code: &str,
    scheme: SchemeTag,
    clear_key: &[u8],
    lmk_set: &LmkSet,
    is_component: bool,
) -> Result<Vec<u8>, HsmError> {
    scheme.check_key_len(clear_key.len())?;
    let (descriptor, pair) = resolve(table, key_type_code, lmk_set)?;
    let varianted = varianted_pair(&pair, descriptor.variant_id, is_component)?;

    let mut out = Vec::with_capacity(clear_key.len());
    for (segment, &segment_variant) in clear_key.chunks(8).zip(scheme.segment_variants()) {
        let key24 = segment_key(&varianted, segment_variant);
        let block: [u8; 8] = segment.try_into().expect("scheme guarantees 8-byte segments");
        out.extend_from_slice(&tdes_encrypt_block(&key24, &block));
    }
    Ok(out)
}

/// Inverse of [`encrypt_under_variant`]: recover the clear key from an
/// LMK-encrypted key under the same key type, scheme, and component flag.
pub fn decrypt_under_variant(
    table: &[KeyTypeDescriptor],
    key_type_code: &str,
    scheme: SchemeTag,
    encrypted_key: &[u8],
    lmk_set: &LmkSet,
    is_component: bool,
) -> Result<Vec<u8>, HsmError> {
    scheme.check_key_len(encrypted_key.len())?;
    let (descriptor, pair) = resolve(table, key_type_code, lmk_set)?;
    let varianted = varianted_pair(&pair, descriptor.variant_id, is_component)?;

    let mut out = Vec::with_capacity(encrypted_key.len());
    for (segment, &segment_variant) in encrypted_key.chunks(8).zip(scheme.segment_variants()) {
        let key24 = segment_key(&varianted, segment_variant);
        let block: [u8; 8] = segment.try_into().expect("scheme guarantees 8-byte segments");
        out.extend_from_slice(&tdes_decrypt_block(&key24, &block));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_is_identity_for_every_scheme_and_key_type() {
        let lmk_set = LmkSet::default_test_set();
        let schemes = [
            (SchemeTag::Single, vec![0x11u8; 8]),
            (SchemeTag::Double, vec![0x22u8; 16]),
            (SchemeTag::Triple, vec![0x33u8; 24]),
        ];
        for descriptor in NON_PCI_KEY_TYPES {
            for (scheme, clear) in &schemes {
                let encrypted = encrypt_under_variant(
                    NON_PCI_KEY_TYPES,
                    descriptor.code,
                    *scheme,
                    clear,
                    &lmk_set,
                    false,
                )
                .unwrap();
                assert_ne!(&encrypted, clear);
                let decrypted = decrypt_under_variant(
                    NON_PCI_KEY_TYPES,
                    descriptor.code,
                    *scheme,
                    &encrypted,
                    &lmk_set,
                    false,
                )
                .unwrap();
                assert_eq!(&decrypted, clear);
            }
        }
    }

    #[test]
    fn component_flag_changes_ciphertext() {
        let lmk_set = LmkSet::default_test_set();
        let clear = vec![0x44u8; 16];
        let as_key = encrypt_under_variant(NON_PCI_KEY_TYPES, "000", SchemeTag::Double, &clear, &lmk_set, false).unwrap();
        let as_component = encrypt_under_variant(NON_PCI_KEY_TYPES, "000", SchemeTag::Double, &clear, &lmk_set, true).unwrap();
        assert_ne!(as_key, as_component);
    }

    #[test]
    fn unknown_key_type_is_rejected() {
        let lmk_set = LmkSet::default_test_set();
        let err = encrypt_under_variant(NON_PCI_KEY_TYPES, "999", SchemeTag::Single, &[0u8; 8], &lmk_set, false)
            .unwrap_err();
        assert_eq!(err, HsmError::UnknownKeyType("999".to_string()));
    }

    #[test]
    fn variant_id_out_of_range_is_rejected() {
        let lmk_set = LmkSet::default_test_set();
        let table = [KeyTypeDescriptor {
            code: "999",
            name: "BOGUS",
            lmk_pair_index: 0,
            variant_id: 10,
        }];
        let err = encrypt_under_variant(&table, "999", SchemeTag::Single, &[0u8; 8], &lmk_set, false).unwrap_err();
        assert_eq!(err, HsmError::VariantUnknown(10));
    }

    #[test]
    fn wrong_key_length_for_scheme_is_rejected() {
        let lmk_set = LmkSet::default_test_set();
        let err = encrypt_under_variant(NON_PCI_KEY_TYPES, "000", SchemeTag::Single, &[0u8; 16], &lmk_set, false)
            .unwrap_err();
        assert_eq!(
            err,
            HsmError::WrongKeyLengthForScheme {
                scheme: 'X',
                expected: 8,
                actual: 16
            }
        );
    }

    /// End-to-end scenario: key type "002" (PVK), scheme U, the published
    /// test clear key `0123456789ABCDEFFEDCBA9876543210` round-trips
    /// through encryption and decryption under the default test LMK set.
    #[test]
    fn scenario_s3_pvk_double_length_roundtrip() {
        let lmk_set = LmkSet::default_test_set();
        let clear = hex::decode("0123456789ABCDEFFEDCBA9876543210").unwrap();
        let encrypted =
            encrypt_under_variant(NON_PCI_KEY_TYPES, "002", SchemeTag::Double, &clear, &lmk_set, false).unwrap();
        let decrypted =
            decrypt_under_variant(NON_PCI_KEY_TYPES, "002", SchemeTag::Double, &encrypted, &lmk_set, false).unwrap();
        assert_eq!(decrypted, clear);
    }
}
