//! ISO 9564 PIN block formats and the Thales format-code dispatch table.

pub mod formats;
pub mod iso_9564;

pub use formats::{decode, encode, PinBlockFormat};
pub use iso_9564::*;
