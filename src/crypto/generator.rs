//! Random password generation for new entries.

use rand::seq::SliceRandom;
use rand::Rng;

/// Length used by `passman add --generate`.
pub const DEFAULT_GENERATED_LEN: usize = 20;

/// Shortest password `generate_password` will produce.
pub const MIN_GENERATED_LEN: usize = 12;

// Look-alike characters (0/O, 1/l/I) are left out.
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+[]{};:,.?";

/// Generate a random password of `len` characters (at least
/// `MIN_GENERATED_LEN`).
///
/// The result always holds at least one lowercase letter, one uppercase
/// letter, one digit and one symbol.  Characters come from the thread-local
/// CSPRNG.
pub fn generate_password(len: usize) -> String {
    let len = len.max(MIN_GENERATED_LEN);
    let mut rng = rand::rng();

    let mut chars: Vec<u8> = [LOWER, UPPER, DIGITS, SYMBOLS]
        .iter()
        .map(|set| set[rng.random_range(0..set.len())])
        .collect();

    let all: Vec<u8> = [LOWER, UPPER, DIGITS, SYMBOLS].concat();
    while chars.len() < len {
        chars.push(all[rng.random_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}
