//! `EK` / `DK`: encrypt and decrypt a clear key under the variant LMK
//! engine. Body layout: `key_type[3] || scheme['X'|'U'|'T'] ||
//! is_component['0'|'1'] || key_hex`.

use super::CommandHandler;
use crate::context::HSMContext;
use crate::error::HsmError;
use crate::utils::{hex_decode, hex_encode_upper};
use crate::variant::SchemeTag;

fn parse_body(body: &[u8]) -> Result<(&str, SchemeTag, bool, Vec<u8>), HsmError> {
    if body.len() < 5 {
        return Err(HsmError::Framing("body too short for a key operation".to_string()));
    }
    let body_str = std::str::from_utf8(body)
        .map_err(|_| HsmError::Framing("body must be ASCII".to_string()))?;
    let key_type = &body_str[0..3];
    let scheme = SchemeTag::from_char(body_str.as_bytes()[3] as char)?;
    let is_component = match body_str.as_bytes()[4] {
        b'0' => false,
        b'1' => true,
        _ => return Err(HsmError::Framing("is_component flag must be '0' or '1'".to_string())),
    };
    let key = hex_decode(&body_str[5..]).map_err(|_| HsmError::Framing("key field is not valid hex".to_string()))?;
    Ok((key_type, scheme, is_component, key))
}

pub struct EncryptUnderLmkHandler;

impl CommandHandler for EncryptUnderLmkHandler {
    fn handle(&self, ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError> {
        let (key_type, scheme, is_component, clear_key) = parse_body(body)?;
        let encrypted = ctx.encrypt_under_lmk(key_type, scheme, &clear_key, is_component)?;
        Ok(hex_encode_upper(&encrypted).into_bytes())
    }
}

pub struct DecryptUnderLmkHandler;

impl CommandHandler for DecryptUnderLmkHandler {
    fn handle(&self, ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError> {
        let (key_type, scheme, is_component, encrypted_key) = parse_body(body)?;
        let clear = ctx.decrypt_under_lmk(key_type, scheme, &encrypted_key, is_component)?;
        Ok(hex_encode_upper(&clear).into_bytes())
    }
}
