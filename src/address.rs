//! Address derivation, validation and ownership proof.
//!
//! Addresses are deterministic functions of a seed: `ZED-<w1>-<w2>-<w3>-<w4>-<checksum>`,
//! where the four words are drawn from a fixed 2048-entry wordlist (the
//! standard BIP-39 English wordlist, reused here purely as a convenient
//! public 2048-word dictionary — there is no BIP-39 mnemonic/seed-phrase
//! semantics involved).

use bip39::Language;
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const ADDRESS_PREFIX: &str = "ZED";
/// The reserved pseudo-address representing the coinbase/protocol source.
pub const COINBASE: &str = "node";

fn wordlist() -> &'static [&'static str; 2048] {
    Language::English.word_list()
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GeneratedAddress {
    pub address: String,
    pub seed: String,
}

/// Draws 16 cryptographically secure random bytes and hex-encodes them.
fn random_seed() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn phrase_from_seed(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let words = wordlist();
    let indices: Vec<usize> = (0..8)
        .step_by(2)
        .map(|i| u16::from_be_bytes([digest[i], digest[i + 1]]) as usize % words.len())
        .collect();
    indices
        .into_iter()
        .map(|i| words[i])
        .collect::<Vec<_>>()
        .join("-")
}

fn checksum_for(phrase: &str) -> String {
    let digest = Sha256::digest(phrase.as_bytes());
    hex::encode(digest)[..4].to_string()
}

/// Derives `{address, seed}` from `seed`, or from 16 fresh random bytes if
/// `seed` is `None`.
pub fn generate(seed: Option<String>) -> GeneratedAddress {
    let seed = seed.unwrap_or_else(random_seed);
    let phrase = phrase_from_seed(&seed);
    let checksum = checksum_for(&phrase);
    GeneratedAddress {
        address: format!("{ADDRESS_PREFIX}-{phrase}-{checksum}"),
        seed,
    }
}

/// Structural and checksum validation. The reserved `"node"` pseudo-address
/// is never a valid address under this check.
pub fn validate(address: &str) -> bool {
    if address == COINBASE {
        return false;
    }
    let parts: Vec<&str> = address.split('-').collect();
    if parts.len() != 6 || parts[0] != ADDRESS_PREFIX {
        return false;
    }
    let checksum = parts[5];
    let phrase = parts[1..5].join("-");
    checksum == checksum_for(&phrase)
}

/// Re-derives the address from `seed` and compares byte-for-byte.
pub fn verify_ownership(address: &str, seed: &str) -> bool {
    generate(Some(seed.to_string())).address == address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_deterministic_and_valid() {
        let seed = "00".repeat(16);
        let a = generate(Some(seed.clone()));
        let b = generate(Some(seed));
        assert_eq!(a, b);
        assert!(validate(&a.address));
    }

    #[test]
    fn verify_ownership_round_trips_for_any_seed() {
        for seed in ["00".repeat(16), "ff".repeat(16), hex::encode(b"abcdefgh12345678")] {
            let generated = generate(Some(seed.clone()));
            assert!(verify_ownership(&generated.address, &seed));
        }
    }

    #[test]
    fn mutating_a_word_breaks_validation() {
        let generated = generate(Some("00".repeat(16)));
        let mut parts: Vec<String> = generated.address.split('-').map(String::from).collect();
        parts[2] = format!("{}x", parts[2]);
        let mutated = parts.join("-");
        assert!(!validate(&mutated));
    }

    #[test]
    fn reserved_coinbase_is_never_valid() {
        assert!(!validate(COINBASE));
    }

    #[test]
    fn malformed_addresses_are_rejected_not_panicking() {
        assert!(!validate(""));
        assert!(!validate("ZED-only-three-parts"));
        assert!(!validate("NOTZED-a-b-c-d-ffff"));
    }

    #[test]
    fn random_generation_yields_distinct_addresses() {
        let a = generate(None);
        let b = generate(None);
        assert_ne!(a.seed, b.seed);
        assert!(validate(&a.address));
        assert!(validate(&b.address));
    }
}
