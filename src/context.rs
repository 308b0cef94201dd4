//! `HSMContext`: the capability surface handlers receive. Per the design
//! notes, PCI-HSM mode is carried as an immutable field on this struct
//! rather than a process-global, and the dispatcher hands out one shared
//! reference per connection rather than constructing a new context per
//! request.

use crate::error::HsmError;
use crate::keyblock::{self, KeyBlock, OptBlockEntry, ThalesHeader};
use crate::utils::secure_random_fill;
use crate::variant::{self, KeyTypeDescriptor, LmkSet, SchemeTag};
use tracing::{event, Level};

/// Log severity passed to [`HSMContext::log`]. Mirrors `tracing`'s levels
/// so the context's `log` method is a thin, handler-facing wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

pub struct HSMContext {
    lmk_set: LmkSet,
    aes_lmk: Vec<u8>,
    pci_mode: bool,
}

impl HSMContext {
    pub fn new(lmk_set: LmkSet, aes_lmk: Vec<u8>, pci_mode: bool) -> Self {
        Self {
            lmk_set,
            aes_lmk,
            pci_mode,
        }
    }

    fn key_type_table(&self) -> &'static [KeyTypeDescriptor] {
        if self.pci_mode {
            variant::PCI_KEY_TYPES
        } else {
            variant::NON_PCI_KEY_TYPES
        }
    }

    pub fn pci_mode(&self) -> bool {
        self.pci_mode
    }

    pub fn lmk_set(&self) -> &LmkSet {
        &self.lmk_set
    }

    /// Encrypt `clear_key` under the LMK, varianted for `key_type_code`
    /// and scheme-tagged for `scheme`.
    pub fn encrypt_under_lmk(
        &self,
        key_type_code: &str,
        scheme: SchemeTag,
        clear_key: &[u8],
        is_component: bool,
    ) -> Result<Vec<u8>, HsmError> {
        variant::encrypt_under_variant(
            self.key_type_table(),
            key_type_code,
            scheme,
            clear_key,
            &self.lmk_set,
            is_component,
        )
    }

    /// Inverse of [`HSMContext::encrypt_under_lmk`].
    pub fn decrypt_under_lmk(
        &self,
        key_type_code: &str,
        scheme: SchemeTag,
        encrypted_key: &[u8],
        is_component: bool,
    ) -> Result<Vec<u8>, HsmError> {
        variant::decrypt_under_variant(
            self.key_type_table(),
            key_type_code,
            scheme,
            encrypted_key,
            &self.lmk_set,
            is_component,
        )
    }

    /// Wrap `clear_key` as a Thales-S key block under the AES LMK.
    pub fn wrap_key_block(
        &self,
        header: ThalesHeader,
        opt_blocks: &[OptBlockEntry],
        clear_key: &[u8],
    ) -> Result<KeyBlock, HsmError> {
        keyblock::wrap_key_block(&self.aes_lmk, header, opt_blocks, clear_key)
    }

    /// Unwrap a Thales-S key block under the AES LMK.
    pub fn unwrap_key_block(
        &self,
        wire: &str,
    ) -> Result<(ThalesHeader, Vec<OptBlockEntry>, Vec<u8>), HsmError> {
        keyblock::unwrap_key_block(&self.aes_lmk, wire)
    }

    /// Wrap `clear_key` as a TR-31:2018 "R" key block under the AES LMK
    /// used as KBPK.
    pub fn wrap_key_block_tr31(&self, header_str: &str, clear_key: &[u8]) -> Result<String, HsmError> {
        let random_seed = self.random_bytes(16);
        keyblock::wrap_key_block_tr31(&self.aes_lmk, header_str, clear_key, &random_seed)
    }

    /// Unwrap a TR-31:2018 "R" key block under the AES LMK used as KBPK.
    pub fn unwrap_key_block_tr31(&self, wire: &str) -> Result<(keyblock::KeyBlockHeader, Vec<u8>), HsmError> {
        keyblock::unwrap_key_block_tr31(&self.aes_lmk, wire)
    }

    /// Fill a freshly allocated buffer with CSPRNG bytes.
    pub fn random_bytes(&self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        secure_random_fill(&mut buf);
        buf
    }

    /// The 3-byte Key Check Value of `clear_key`.
    pub fn kcv(&self, clear_key: &[u8]) -> [u8; 3] {
        variant::kcv(clear_key)
    }

    /// Side-effecting diagnostic log; never influences the response.
    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => event!(Level::DEBUG, "{}", message),
            LogLevel::Info => event!(Level::INFO, "{}", message),
            LogLevel::Warn => event!(Level::WARN, "{}", message),
            LogLevel::Error => event!(Level::ERROR, "{}", message),
        }
    }
}
