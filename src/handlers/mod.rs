//! The command handler ABI and the built-in handler set.
//!
//! Handlers are compiled directly into the binary as trait implementations
//! (design option (b) in the design notes) rather than loaded through a
//! WebAssembly sandbox: process-level isolation is enough here, and it
//! keeps the handler ABI a plain Rust trait instead of a host-import
//! surface.

mod a0;
mod keyblock_handlers;
mod nc;
mod variant_handlers;

pub use a0::A0Handler;
pub use keyblock_handlers::{
    UnwrapKeyBlockHandler, UnwrapKeyBlockTr31Handler, WrapKeyBlockHandler, WrapKeyBlockTr31Handler,
};
pub use nc::NcHandler;
pub use variant_handlers::{DecryptUnderLmkHandler, EncryptUnderLmkHandler};

use crate::context::HSMContext;
use crate::error::HsmError;
use std::collections::HashMap;
use std::sync::Arc;

/// A single command handler, keyed by its two-character opcode in the
/// handler table. Implementations must not retain any reference to clear
/// key material beyond the call to `handle`.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, ctx: &HSMContext, body: &[u8]) -> Result<Vec<u8>, HsmError>;
}

pub type HandlerTable = HashMap<&'static str, Arc<dyn CommandHandler>>;

/// Build the handler table the server starts with: A0 (legacy compat),
/// NC (diagnostics/echo), and the variant and key-block engine front ends.
/// `WK`/`UK` cover the Thales-S key-block representation, `WR`/`UR` the
/// TR-31:2018 "R" representation.
pub fn default_handlers() -> HandlerTable {
    let mut table: HandlerTable = HashMap::new();
    table.insert("A0", Arc::new(A0Handler));
    table.insert("NC", Arc::new(NcHandler));
    table.insert("EK", Arc::new(EncryptUnderLmkHandler));
    table.insert("DK", Arc::new(DecryptUnderLmkHandler));
    table.insert("WK", Arc::new(WrapKeyBlockHandler));
    table.insert("UK", Arc::new(UnwrapKeyBlockHandler));
    table.insert("WR", Arc::new(WrapKeyBlockTr31Handler));
    table.insert("UR", Arc::new(UnwrapKeyBlockTr31Handler));
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_handlers_cover_every_built_in_opcode() {
        let table = default_handlers();
        for opcode in ["A0", "NC", "EK", "DK", "WK", "UK", "WR", "UR"] {
            assert!(table.contains_key(opcode), "missing handler for {opcode}");
        }
    }
}
