//! Small helpers shared across the key-custody engine: byte XOR, strict hex
//! codecs, CSPRNG fill, buffer zeroization, and the ASCII padding helpers
//! used by the ISO 9564 PIN block codecs.

use rand::RngCore;
use zeroize::Zeroize as _;

/// Perform bitwise XOR operation between two byte arrays of equal length.
///
/// This function takes two byte arrays `a` and `b` and performs a bitwise XOR
/// operation between their elements. The two input arrays must have the same length.
///
/// # Parameters
///
/// * `a`: A reference to the first byte array.
/// * `b`: A reference to the second byte array.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - A new byte array containing the result of the XOR operation.
/// * `Err(String)` - If the input arrays have different lengths.
///
/// # Errors
///
/// This function will return an error if:
/// - The input arrays `a` and `b` have different lengths.
pub fn xor_byte_arrays(a: &[u8], b: &[u8]) -> Result<Vec<u8>, String> {
    if a.len() != b.len() {
        return Err("Arrays must be of the same length".to_string());
    }

    Ok(a.iter().zip(b.iter()).map(|(&x, &y)| x ^ y).collect())
}

/// XOR `src` into `dst` in place. Both slices must have equal length.
pub fn xor(dst: &mut [u8], src: &[u8]) {
    assert_eq!(dst.len(), src.len(), "xor: buffers must be equal length");
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= s;
    }
}

/// Strict hex decode: rejects odd-length input and non-hex characters.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s)
}

/// Strict hex encode, uppercase, matching the wire representation used by
/// the Thales-S key block and the human-facing variant-key representation.
pub fn hex_encode_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Fill `buf` with bytes from the OS CSPRNG.
pub fn secure_random_fill(buf: &mut [u8]) {
    rand::rngs::OsRng.fill_bytes(buf);
}

/// Overwrite `buf` with zeros. Used on every exit path of a scope that held
/// clear key material.
pub fn zeroize(buf: &mut [u8]) {
    buf.zeroize();
}

/// Transform each nibble of `data` into the hexadecimal range A-F (0xA..=0xF).
///
/// Used by the ISO 9564 format 3 PIN field encoder to derive padding
/// characters from an externally supplied random seed: every nibble of the
/// output is guaranteed to decode as a valid ISO-3 filler digit.
pub fn transform_nibbles_to_af(data: &[u8]) -> Vec<u8> {
    data.iter()
        .map(|&b| {
            let hi = 0xA + ((b >> 4) % 6);
            let lo = 0xA + (b & 0x0F) % 6;
            (hi << 4) | lo
        })
        .collect()
}

/// Left-pad `s` with `pad` until it is at least `len` characters long.
/// Strings already at least `len` characters are returned unchanged.
pub fn left_pad_str(s: &str, len: usize, pad: char) -> String {
    if s.len() >= len {
        return s.to_string();
    }
    let mut padded: String = std::iter::repeat(pad).take(len - s.len()).collect();
    padded.push_str(s);
    padded
}

/// Right-pad `s` with `pad` until it is at least `len` characters long.
/// Strings already at least `len` characters are returned unchanged.
pub fn right_pad_str(s: &str, len: usize, pad: char) -> String {
    if s.len() >= len {
        return s.to_string();
    }
    let mut padded = s.to_string();
    padded.extend(std::iter::repeat(pad).take(len - s.len()));
    padded
}
