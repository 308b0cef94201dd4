//! ISO 20038 key-block derivation and the Thales-S wire representation.
//!
//! KBEK/KBAK derivation follows ISO 20038 directly rather than the TR-31
//! key-derivation-binding-method tables in
//! [`crate::keyblock::tr31_2018::key_derivations`]: the CMAC input layout
//! is computed per iteration instead of read from a fixed constant table,
//! since ISO 20038 derives keys of arbitrary AES length (16 or 32 bytes)
//! rather than the three fixed TR-31 sizes.

mod header;
mod opt_blocks;

pub use header::ThalesHeader;
pub use opt_blocks::{parse_opt_blocks, serialize_opt_blocks, OptBlockEntry};

use crate::des::{aes_cbc_decrypt, aes_cbc_encrypt};
use crate::error::HsmError;
use crate::utils::{hex_decode, hex_encode_upper, secure_random_fill};
use soft_aes::aes::aes_cmac;
use subtle::ConstantTimeEq;

const USAGE_ENCRYPT: u16 = 0x0000;
const USAGE_AUTHENTICATE: u16 = 0x0001;
const ALGORITHM_AES: u16 = 0x0004;

fn derive_usage(lmk: &[u8], usage: u16) -> Result<Vec<u8>, HsmError> {
    let n = lmk.len();
    let bit_len = (n * 8) as u16;
    let iters = (n * 8).div_ceil(128);
    let mut out = Vec::with_capacity(iters * 16);
    for cnt in 1..=iters {
        let mut block = [0u8; 16];
        block[0] = cnt as u8;
        block[1..3].copy_from_slice(&usage.to_be_bytes());
        block[3] = 0x00;
        block[4..6].copy_from_slice(&ALGORITHM_AES.to_be_bytes());
        block[6..8].copy_from_slice(&bit_len.to_be_bytes());
        let mac = aes_cmac(&block, lmk).map_err(|e| HsmError::HandlerFailure(e.to_string()))?;
        out.extend_from_slice(&mac);
    }
    out.truncate(n);
    Ok(out)
}

/// Derive `(KBEK, KBAK)` from an AES LMK of 16 or 32 bytes, per ISO 20038.
pub fn derive_keys_iso20038(lmk: &[u8]) -> Result<(Vec<u8>, Vec<u8>), HsmError> {
    if lmk.len() != 16 && lmk.len() != 32 {
        return Err(HsmError::AesKeyLength(lmk.len()));
    }
    let kbek = derive_usage(lmk, USAGE_ENCRYPT)?;
    let kbak = derive_usage(lmk, USAGE_AUTHENTICATE)?;
    Ok((kbek, kbak))
}

fn build_payload(clear_key: &[u8], random_fill: impl Fn(&mut [u8])) -> Vec<u8> {
    let bit_len = (clear_key.len() * 8) as u16;
    let mut payload = Vec::with_capacity(2 + clear_key.len() + 16);
    payload.extend_from_slice(&bit_len.to_be_bytes());
    payload.extend_from_slice(clear_key);
    let remainder = payload.len() % 16;
    if remainder != 0 {
        let pad_len = 16 - remainder;
        let mut pad = vec![0u8; pad_len];
        random_fill(&mut pad);
        payload.extend_from_slice(&pad);
    }
    payload
}

/// Wrap `clear_key` under `lmk` as a Thales-S key block: `"S" || header ||
/// opt_blocks || HEX(ciphertext) || HEX(mac_trunc_8)`.
pub fn wrap(
    lmk: &[u8],
    mut header: ThalesHeader,
    opt_blocks: &[OptBlockEntry],
    clear_key: &[u8],
) -> Result<String, HsmError> {
    let (kbek, kbak) = derive_keys_iso20038(lmk)?;
    let payload = build_payload(clear_key, secure_random_fill);

    let opt_blocks_ascii = serialize_opt_blocks(opt_blocks);
    header.num_opt_blocks = opt_blocks.len() as u8;
    header.kb_length = (16 + opt_blocks_ascii.len() + 2 * (payload.len() + 8)) as u16;
    let header_ascii = header.to_ascii();

    let mut iv = [0u8; 16];
    iv.copy_from_slice(&header_ascii);
    let ciphertext = aes_cbc_encrypt(&kbek, &iv, &payload)
        .map_err(|e| HsmError::HandlerFailure(e.to_string()))?;
    let ciphertext_hex = hex_encode_upper(&ciphertext);

    let mut mac_input = Vec::with_capacity(header_ascii.len() + opt_blocks_ascii.len() + ciphertext_hex.len());
    mac_input.extend_from_slice(&header_ascii);
    mac_input.extend_from_slice(opt_blocks_ascii.as_bytes());
    mac_input.extend_from_slice(ciphertext_hex.as_bytes());
    let mac = aes_cmac(&mac_input, &kbak).map_err(|e| HsmError::HandlerFailure(e.to_string()))?;
    let mac_trunc = &mac[..8];

    let mut out = String::with_capacity(1 + header_ascii.len() + opt_blocks_ascii.len() + ciphertext_hex.len() + 16);
    out.push('S');
    out.push_str(std::str::from_utf8(&header_ascii).expect("header is ASCII"));
    out.push_str(&opt_blocks_ascii);
    out.push_str(&ciphertext_hex);
    out.push_str(&hex_encode_upper(mac_trunc));
    Ok(out)
}

/// Unwrap a Thales-S key block, returning the parsed header, the optional
/// blocks, and the clear key.
pub fn unwrap(lmk: &[u8], wire: &str) -> Result<(ThalesHeader, Vec<OptBlockEntry>, Vec<u8>), HsmError> {
    let body = wire
        .strip_prefix('S')
        .ok_or_else(|| HsmError::HeaderInvalid("Thales-S key block must start with 'S'".to_string()))?;
    if body.len() < 16 {
        return Err(HsmError::HeaderInvalid("key block shorter than header".to_string()));
    }
    let header = ThalesHeader::from_ascii(body[..16].as_bytes())?;
    let (opt_blocks, opt_offset) = parse_opt_blocks(&body[16..], header.num_opt_blocks)?;
    let mut remainder = body[16 + opt_offset..].to_string();
    if remainder.len() % 2 != 0 {
        remainder.pop();
    }

    let (kbek, kbak) = derive_keys_iso20038(lmk)?;

    let header_ascii = header.to_ascii();
    let opt_blocks_ascii = serialize_opt_blocks(&opt_blocks);
    let ciphertext_hex_len = remainder.len().saturating_sub(16);
    if remainder.len() < 16 {
        return Err(HsmError::MacVerificationFailed);
    }
    let ciphertext_hex = &remainder[..ciphertext_hex_len];
    let mac_hex = &remainder[ciphertext_hex_len..];

    let mut mac_input = Vec::with_capacity(header_ascii.len() + opt_blocks_ascii.len() + ciphertext_hex.len());
    mac_input.extend_from_slice(&header_ascii);
    mac_input.extend_from_slice(opt_blocks_ascii.as_bytes());
    mac_input.extend_from_slice(ciphertext_hex.as_bytes());
    let expected_mac = aes_cmac(&mac_input, &kbak).map_err(|e| HsmError::HandlerFailure(e.to_string()))?;
    let received_mac = hex_decode(mac_hex).map_err(|_| HsmError::MacVerificationFailed)?;
    if received_mac.len() != 8 || expected_mac[..8].ct_eq(&received_mac).unwrap_u8() != 1 {
        return Err(HsmError::MacVerificationFailed);
    }

    let ciphertext = hex_decode(ciphertext_hex).map_err(|_| HsmError::CiphertextAlignment)?;
    if ciphertext.len() % 16 != 0 {
        return Err(HsmError::CiphertextAlignment);
    }
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&header_ascii);
    let payload = aes_cbc_decrypt(&kbek, &iv, &ciphertext)
        .map_err(|e| HsmError::HandlerFailure(e.to_string()))?;
    if payload.len() < 2 {
        return Err(HsmError::KeyLengthInconsistent);
    }
    let bit_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
    let byte_len = bit_len.div_ceil(8);
    if payload.len() < 2 + byte_len {
        return Err(HsmError::KeyLengthInconsistent);
    }
    let clear_key = payload[2..2 + byte_len].to_vec();

    Ok((header, opt_blocks, clear_key))
}
