//! Block signer/verifier: a secondary 32-byte witness derived from a
//! block's fingerprint and a key (spec §4.8).

use crate::block::Block;
use crate::mixer;
use crate::salt;

const DEFAULT_KEY: &str = "default-key";

/// A fixed nonce for signing: the signature must be reproducible by
/// `verify`, so (unlike admission) it cannot vary per call.
const SIGN_NONCE: u64 = 0;

fn key_hex(key_bytes: Option<&[u8]>) -> String {
    match key_bytes {
        Some(bytes) => hex::encode(&bytes[..bytes.len().min(32)]),
        None => DEFAULT_KEY.to_string(),
    }
}

fn compute_signature(fingerprint: &[u8; 32], key_bytes: Option<&[u8]>) -> [u8; 32] {
    let input = hex::encode(fingerprint);
    let output = key_hex(key_bytes);
    mixer::fingerprint(input.as_bytes(), output.as_bytes(), SIGN_NONCE, salt::device_salt())
}

/// Signs `block` in place: `signature = Mixer(hex(block.hash), key_hex)`.
pub fn sign(block: &mut Block, key_bytes: Option<&[u8]>) {
    block.signature = compute_signature(&block.hash, key_bytes);
}

/// Recomputes the signature and compares it against `block.signature`.
pub fn verify(block: &Block, key_bytes: Option<&[u8]>) -> bool {
    block.signature == compute_signature(&block.hash, key_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_block() -> Block {
        let mut b = Block::default();
        b.hash = [7u8; 32];
        b
    }

    #[test]
    fn test_sign_then_verify_default_key() {
        let mut b = signed_block();
        sign(&mut b, None);
        assert!(b.signature != [0u8; 32]);
        assert!(verify(&b, None));
    }

    #[test]
    fn test_sign_then_verify_explicit_key() {
        let mut b = signed_block();
        sign(&mut b, Some(b"my-secret-key"));
        assert!(verify(&b, Some(b"my-secret-key")));
    }

    #[test]
    fn test_verify_fails_for_wrong_key() {
        let mut b = signed_block();
        sign(&mut b, Some(b"key-a"));
        assert!(!verify(&b, Some(b"key-b")));
    }

    #[test]
    fn test_sign_is_deterministic() {
        let mut a = signed_block();
        let mut b = signed_block();
        sign(&mut a, None);
        sign(&mut b, None);
        assert_eq!(a.signature, b.signature);
    }

    #[test]
    fn test_key_longer_than_32_bytes_is_truncated() {
        let mut a = signed_block();
        let mut b = signed_block();
        let long_key = vec![9u8; 64];
        let short_key = vec![9u8; 32];
        sign(&mut a, Some(&long_key));
        sign(&mut b, Some(&short_key));
        assert_eq!(a.signature, b.signature);
    }
}
