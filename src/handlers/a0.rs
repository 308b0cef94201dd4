//! `A0`: generate a random key under the default LMK view. Predates the
//! variant engine; preserved byte-for-byte for compatibility tests.

use super::CommandHandler;
use crate::context::HSMContext;
use crate::des::tdes_encrypt_block;
use crate::error::HsmError;

pub struct A0Handler;

impl CommandHandler for A0Handler {
    fn handle(&self, ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError> {
        if body.len() != 16 {
            return Err(HsmError::Framing(
                "A0 requires a 16-byte body".to_string(),
            ));
        }
        let pair = ctx
            .lmk_set()
            .pair(0)
            .expect("pair 0 is always present in a 20-pair LMK set");
        let key24 = pair.effective_key();

        let mut out = Vec::with_capacity(16);
        for block in body.chunks(8) {
            let b: [u8; 8] = block.try_into().expect("16-byte body splits into two 8-byte blocks");
            out.extend_from_slice(&tdes_encrypt_block(&key24, &b));
        }
        Ok(out)
    }
}
