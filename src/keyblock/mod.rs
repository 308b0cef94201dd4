//! Key-block wrapping: the Thales-S representation (ISO 20038 derivation,
//! CMAC-authenticated, hex-on-the-wire) and the TR-31:2018 "R"
//! representation (ASCII-on-the-wire, binding-method key derivation).
//!
//! The two representations are kept as separate entry points rather than
//! unified behind one `KeyBlock` type: a Thales-S block and a TR-31 block
//! are produced by distinct key-derivation schemes (§4.2 ISO 20038 vs the
//! TR-31:2018 AES key derivation binding method) and carry distinct header
//! validation rules, so collapsing them into one call would either erase
//! TR-31's stricter header field tables or force Thales-S through them.
//! `wrap_key_block`/`unwrap_key_block` cover Thales-S; `wrap_key_block_tr31`
//! / `unwrap_key_block_tr31` cover TR-31 "R", both reachable from
//! [`crate::context::HSMContext`] and the `WR`/`UR` command handlers.

pub mod tr31_2018;

pub mod thales_s;

pub use thales_s::{derive_keys_iso20038, OptBlockEntry, ThalesHeader};
pub use tr31_2018::{KeyBlockHeader, OptBlock};

use crate::error::HsmError;

/// A wrapped Thales-S key block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyBlock {
    ThalesS(String),
}

impl KeyBlock {
    pub fn as_wire_str(&self) -> &str {
        match self {
            KeyBlock::ThalesS(s) => s,
        }
    }
}

/// Wrap `clear_key` as a Thales-S key block under an AES LMK.
pub fn wrap_key_block(
    lmk: &[u8],
    header: ThalesHeader,
    opt_blocks: &[OptBlockEntry],
    clear_key: &[u8],
) -> Result<KeyBlock, HsmError> {
    thales_s::wrap(lmk, header, opt_blocks, clear_key).map(KeyBlock::ThalesS)
}

/// Unwrap a Thales-S key block (wire bytes starting with ASCII `S`).
pub fn unwrap_key_block(lmk: &[u8], wire: &str) -> Result<(ThalesHeader, Vec<OptBlockEntry>, Vec<u8>), HsmError> {
    thales_s::unwrap(lmk, wire)
}

/// Wrap `clear_key` as a TR-31:2018 "R" key block under a KBPK, from a
/// 16-byte TR-31 header string (e.g. `"D0000P0AE00E0000"`, length field
/// is recomputed). `random_seed` feeds the payload padding; the dispatcher
/// sources it from [`crate::context::HSMContext::random_bytes`].
pub fn wrap_key_block_tr31(
    kbpk: &[u8],
    header_str: &str,
    clear_key: &[u8],
    random_seed: &[u8],
) -> Result<String, HsmError> {
    tr31_2018::tr31_wrap_with_header_string(header_str, kbpk, clear_key, 0, random_seed)
        .map_err(|e| HsmError::HandlerFailure(e.to_string()))
}

/// Unwrap a TR-31:2018 "R" key block under a KBPK.
pub fn unwrap_key_block_tr31(kbpk: &[u8], wire: &str) -> Result<(KeyBlockHeader, Vec<u8>), HsmError> {
    tr31_2018::tr31_unwrap(kbpk, wire).map_err(|e| HsmError::HandlerFailure(e.to_string()))
}
