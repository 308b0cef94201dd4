//! DES and 3DES block primitives, plus AES block/CBC wrappers.
//!
//! Single- and triple-DES are implemented with the `des` crate (RustCrypto's
//! block-cipher family). A 2-key 3DES key is always expanded to its 24-byte
//! `K1 || K2 || K1` effective form before reaching [`tdes_encrypt_block`] /
//! [`tdes_decrypt_block`], per the "2-key 3DES is modelled as 3-key with
//! `K3 = K1`" convention.
//!
//! AES primitives delegate to `soft-aes`, the same crate the key-block
//! engines use, so there is exactly one AES implementation in the crate.

use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use des::{Des, TdesEde3};
use soft_aes::aes::{aes_dec_cbc, aes_enc_cbc};
use std::error::Error;

/// Encrypt a single 8-byte block under single DES.
pub fn des_encrypt_block(key: &[u8; 8], block: &[u8; 8]) -> [u8; 8] {
    let cipher = Des::new(GenericArray::from_slice(key));
    let mut buf = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut buf);
    buf.into()
}

/// Decrypt a single 8-byte block under single DES.
pub fn des_decrypt_block(key: &[u8; 8], block: &[u8; 8]) -> [u8; 8] {
    let cipher = Des::new(GenericArray::from_slice(key));
    let mut buf = GenericArray::clone_from_slice(block);
    cipher.decrypt_block(&mut buf);
    buf.into()
}

/// Encrypt a single 8-byte block under 3DES with a 24-byte effective key
/// (`K1 || K2 || K3`).
pub fn tdes_encrypt_block(key24: &[u8; 24], block: &[u8; 8]) -> [u8; 8] {
    let cipher = TdesEde3::new(GenericArray::from_slice(key24));
    let mut buf = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut buf);
    buf.into()
}

/// Decrypt a single 8-byte block under 3DES with a 24-byte effective key
/// (`K1 || K2 || K3`).
pub fn tdes_decrypt_block(key24: &[u8; 24], block: &[u8; 8]) -> [u8; 8] {
    let cipher = TdesEde3::new(GenericArray::from_slice(key24));
    let mut buf = GenericArray::clone_from_slice(block);
    cipher.decrypt_block(&mut buf);
    buf.into()
}

/// Build the 24-byte effective 3DES key for a 2-key (16-byte) key: `K1 || K2 || K1`.
pub fn expand_2key_tdes(key16: &[u8; 16]) -> [u8; 24] {
    let mut out = [0u8; 24];
    out[..16].copy_from_slice(key16);
    out[16..].copy_from_slice(&key16[..8]);
    out
}

/// Encrypt a single 16-byte block under AES ECB using a single-block CBC
/// call with a zero IV, matching the way the rest of the crate reaches AES
/// only through `soft-aes`.
pub fn aes_encrypt_block(key: &[u8], block: &[u8; 16]) -> Result<[u8; 16], Box<dyn Error>> {
    let iv = [0u8; 16];
    let out = aes_enc_cbc(block, key, &iv, None)?;
    let mut result = [0u8; 16];
    result.copy_from_slice(&out[..16]);
    Ok(result)
}

/// AES-CBC encrypt, no padding (caller must supply block-aligned data).
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8; 16], data: &[u8]) -> Result<Vec<u8>, Box<dyn Error>> {
    Ok(aes_enc_cbc(data, key, iv, None)?)
}

/// AES-CBC decrypt, no padding removal (caller knows the exact plaintext length).
pub fn aes_cbc_decrypt(key: &[u8], iv: &[u8; 16], data: &[u8]) -> Result<Vec<u8>, Box<dyn Error>> {
    Ok(aes_dec_cbc(data, key, iv, None)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_des_roundtrip() {
        let key = [0x01u8, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let block = [0xAAu8; 8];
        let ct = des_encrypt_block(&key, &block);
        assert_eq!(des_decrypt_block(&key, &ct), block);
    }

    #[test]
    fn test_tdes_roundtrip_2key() {
        let key16 = [0x11u8; 16];
        let key24 = expand_2key_tdes(&key16);
        let block = [0x22u8; 8];
        let ct = tdes_encrypt_block(&key24, &block);
        assert_eq!(tdes_decrypt_block(&key24, &ct), block);
    }

    #[test]
    fn test_tdes_roundtrip_3key() {
        let key24 = [0x01u8; 24];
        let block = [0x33u8; 8];
        let ct = tdes_encrypt_block(&key24, &block);
        assert_eq!(tdes_decrypt_block(&key24, &ct), block);
    }
}
