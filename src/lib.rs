//! A Thales payShield-compatible key-custody engine: variant LMK key
//! derivation, the Key-Block (TR-31:2018 and Thales-S/ISO 20038) wrapping
//! engines, ISO 9564 PIN block codecs, and the length-prefixed command
//! dispatcher that exposes them over TCP.
//!
//! # Status codes
//!
//! Every [`error::HsmError`] variant maps to a two-ASCII-digit wire status
//! code via [`error::HsmError::status_code`]; the dispatcher never inspects
//! error messages to decide what to put on the wire.

pub mod context;
pub mod des;
pub mod error;
pub mod handlers;
pub mod keyblock;
pub mod pin;
pub mod server;
pub mod utils;
pub mod variant;

pub use context::{HSMContext, LogLevel};
pub use error::HsmError;
pub use server::{HsmServer, ServerConfig};
