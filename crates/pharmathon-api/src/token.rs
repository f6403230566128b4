use rand::Rng;

/// Restricted alphabet for confirmation tokens and check-in codes: no 0/O or
/// 1/I, so a code read off a phone screen or printout is unambiguous.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LEN: usize = 10;

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
