mod key_block_header;
mod key_derivations;
mod opt_block;
mod payload;
mod tr31;

pub use key_block_header::*;
pub use key_derivations::derive_keys_version_d;
pub use opt_block::*;
pub use tr31::{tr31_unwrap, tr31_wrap, tr31_wrap_with_header_string};

#[cfg(test)]
mod tests;
