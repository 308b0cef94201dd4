//! `WK` / `UK`: wrap and unwrap a clear key as a Thales-S key block under
//! the AES LMK. `WK` body: `header_ascii[16] || key_hex`. `UK` body: the
//! key block wire bytes. No optional blocks travel over this path; a
//! caller needing them drives [`crate::context::HSMContext::wrap_key_block`]
//! directly.
//!
//! `WR` / `UR`: the same two operations against the TR-31:2018 "R"
//! representation. `WR` body: `header_str[16] || key_hex`, where
//! `header_str` is a TR-31 header (e.g. `D0000P0AE00E0000`) rather than the
//! Thales header layout `WK` accepts — TR-31's header field tables are
//! stricter (fixed version/usage/algorithm vocabularies) and are validated
//! by [`crate::keyblock::tr31_2018::KeyBlockHeader`] on the way in.

use super::CommandHandler;
use crate::context::HSMContext;
use crate::error::HsmError;
use crate::keyblock::ThalesHeader;
use crate::utils::{hex_decode, hex_encode_upper};

pub struct WrapKeyBlockHandler;

impl CommandHandler for WrapKeyBlockHandler {
    fn handle(&self, ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError> {
        if body.len() < 16 {
            return Err(HsmError::Framing("WK body shorter than a header".to_string()));
        }
        let header = ThalesHeader::from_ascii(&body[..16])?;
        let key_hex = std::str::from_utf8(&body[16..])
            .map_err(|_| HsmError::Framing("key field is not ASCII".to_string()))?;
        let clear_key = hex_decode(key_hex).map_err(|_| HsmError::Framing("key field is not valid hex".to_string()))?;
        let block = ctx.wrap_key_block(header, &[], &clear_key)?;
        Ok(block.as_wire_str().as_bytes().to_vec())
    }
}

pub struct UnwrapKeyBlockHandler;

impl CommandHandler for UnwrapKeyBlockHandler {
    fn handle(&self, ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError> {
        let wire = std::str::from_utf8(body)
            .map_err(|_| HsmError::Framing("key block is not ASCII".to_string()))?;
        let (header, _opt_blocks, clear_key) = ctx.unwrap_key_block(wire)?;
        let mut response = header.to_ascii().to_vec();
        response.extend_from_slice(hex_encode_upper(&clear_key).as_bytes());
        Ok(response)
    }
}

pub struct WrapKeyBlockTr31Handler;

impl CommandHandler for WrapKeyBlockTr31Handler {
    fn handle(&self, ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError> {
        if body.len() < 16 {
            return Err(HsmError::Framing("WR body shorter than a header".to_string()));
        }
        let header_str = std::str::from_utf8(&body[..16])
            .map_err(|_| HsmError::Framing("header field is not ASCII".to_string()))?;
        let key_hex = std::str::from_utf8(&body[16..])
            .map_err(|_| HsmError::Framing("key field is not ASCII".to_string()))?;
        let clear_key = hex_decode(key_hex).map_err(|_| HsmError::Framing("key field is not valid hex".to_string()))?;
        let wire = ctx.wrap_key_block_tr31(header_str, &clear_key)?;
        Ok(wire.into_bytes())
    }
}

pub struct UnwrapKeyBlockTr31Handler;

impl CommandHandler for UnwrapKeyBlockTr31Handler {
    fn handle(&self, ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError> {
        let wire = std::str::from_utf8(body)
            .map_err(|_| HsmError::Framing("key block is not ASCII".to_string()))?;
        let (header, clear_key) = ctx.unwrap_key_block_tr31(wire)?;
        let header_str = header.export_str().map_err(|e| HsmError::HandlerFailure(e.to_string()))?;
        let mut response = header_str.into_bytes();
        response.extend_from_slice(hex_encode_upper(&clear_key).as_bytes());
        Ok(response)
    }
}
