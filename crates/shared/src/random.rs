//! Random token generation.

use rand::Rng;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const HEX_DIGITS: &[u8] = b"0123456789abcdef";

/// Draws `len` characters uniformly from `alphabet`.
pub fn random_string(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..alphabet.len());
            alphabet[idx] as char
        })
        .collect()
}

/// ASCII letters, both cases.
pub fn random_letters(len: usize) -> String {
    random_string(LETTERS, len)
}

pub fn random_digits(len: usize) -> String {
    random_string(DIGITS, len)
}

/// Lowercase hex digits.
pub fn random_hex(len: usize) -> String {
    random_string(HEX_DIGITS, len)
}
