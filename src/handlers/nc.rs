//! `NC`: diagnostics echo. Returns the request body unchanged; used to
//! exercise the dispatcher and the hot-reload path without touching key
//! material.

use super::CommandHandler;
use crate::context::HSMContext;
use crate::error::HsmError;

pub struct NcHandler;

impl CommandHandler for NcHandler {
    fn handle(&self, _ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError> {
        Ok(body.to_vec())
    }
}
