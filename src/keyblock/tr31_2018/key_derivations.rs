use soft_aes::aes::aes_cmac;
use std::error::Error;

// Key derivation input blocks for the TR-31:2018 AES key derivation binding
// method (the fixed "KDI" constants the standard mandates per KBPK size).

const AES_128_KDI_KBEK: [u8; 8] = [0x01, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x80];
const AES_128_KDI_KBAK: [u8; 8] = [0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x00, 0x80];

const AES_192_KDI_KBEK_1: [u8; 8] = [0x01, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0xC0];
const AES_192_KDI_KBEK_2: [u8; 8] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0xC0];
const AES_192_KDI_KBAK_1: [u8; 8] = [0x01, 0x00, 0x01, 0x00, 0x00, 0x03, 0x00, 0xC0];
const AES_192_KDI_KBAK_2: [u8; 8] = [0x02, 0x00, 0x01, 0x00, 0x00, 0x03, 0x00, 0xC0];

const AES_256_KDI_KBEK_1: [u8; 8] = [0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x01, 0x00];
const AES_256_KDI_KBEK_2: [u8; 8] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x04, 0x01, 0x00];
const AES_256_KDI_KBAK_1: [u8; 8] = [0x01, 0x00, 0x01, 0x00, 0x00, 0x04, 0x01, 0x00];
const AES_256_KDI_KBAK_2: [u8; 8] = [0x02, 0x00, 0x01, 0x00, 0x00, 0x04, 0x01, 0x00];

/// Derive `(KBEK, KBAK)` from the KBPK for key block version 'D', per the
/// TR-31:2018 AES key derivation binding method. Each derived key matches
/// the KBPK's length (16/24/32 bytes); 192/256-bit keys need two CMAC
/// blocks concatenated (then truncated to 24 bytes for the 192-bit case,
/// since CMAC output is a single 16-byte block).
pub fn derive_keys_version_d(kbpk: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Box<dyn Error>> {
    match kbpk.len() {
        16 => {
            let kbek = aes_cmac(&AES_128_KDI_KBEK, kbpk)?.to_vec();
            let kbak = aes_cmac(&AES_128_KDI_KBAK, kbpk)?.to_vec();
            Ok((kbek, kbak))
        }
        24 => {
            let mut kbek = aes_cmac(&AES_192_KDI_KBEK_1, kbpk)?.to_vec();
            kbek.extend_from_slice(&aes_cmac(&AES_192_KDI_KBEK_2, kbpk)?.to_vec());
            kbek.truncate(24);

            let mut kbak = aes_cmac(&AES_192_KDI_KBAK_1, kbpk)?.to_vec();
            kbak.extend_from_slice(&aes_cmac(&AES_192_KDI_KBAK_2, kbpk)?.to_vec());
            kbak.truncate(24);

            Ok((kbek, kbak))
        }
        32 => {
            let mut kbek = aes_cmac(&AES_256_KDI_KBEK_1, kbpk)?.to_vec();
            kbek.extend_from_slice(&aes_cmac(&AES_256_KDI_KBEK_2, kbpk)?.to_vec());
            let mut kbak = aes_cmac(&AES_256_KDI_KBAK_1, kbpk)?.to_vec();
            kbak.extend_from_slice(&aes_cmac(&AES_256_KDI_KBAK_2, kbpk)?.to_vec());
            Ok((kbek, kbak))
        }
        n => Err(format!("TR-31 key derivation: unsupported KBPK length {n}").into()),
    }
}
