//! Process-wide device salt: lazily initialized once from environment
//! variables, never mutated thereafter (spec §4.1, §9).
//!
//! The salt is folded from the first ordered, platform-specific list of
//! environment variables that yields any value at all, reduced with
//! FNV-1a 64-bit. It is audit-witness material, not a secret: the mixer
//! built on top of it is explicitly non-cryptographic (spec §1 Non-goals).

use std::sync::OnceLock;

static DEVICE_SALT: OnceLock<u64> = OnceLock::new();

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit hash over arbitrary bytes.
pub fn fnv1a64(data: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn platform_env_vars() -> &'static [&'static str] {
    if cfg!(windows) {
        &["USERNAME", "USERPROFILE", "COMPUTERNAME"]
    } else {
        &["USER", "HOME", "SHELL", "HOSTNAME"]
    }
}

fn derive_salt() -> u64 {
    let mut acc = FNV_OFFSET_BASIS;
    let mut any = false;
    for var in platform_env_vars() {
        if let Ok(value) = std::env::var(var) {
            any = true;
            acc ^= fnv1a64(value.as_bytes());
            acc = acc.wrapping_mul(FNV_PRIME);
        }
    }
    if !any {
        tracing::warn!("device salt: no platform environment variables present, using offset basis only");
    }
    acc
}

/// Returns the process-wide device salt, computing it from the environment
/// on first call. Every later call returns the same value.
pub fn device_salt() -> u64 {
    *DEVICE_SALT.get_or_init(derive_salt)
}

/// Explicitly initializes the device salt to a fixed value. Intended for
/// tests that need reproducibility across runs; succeeds only if the salt
/// has not already been derived by a prior `device_salt()` call in this
/// process, matching `OnceLock::set` semantics.
pub fn init(value: u64) -> Result<(), u64> {
    DEVICE_SALT.set(value).map_err(|_| *DEVICE_SALT.get().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a64_deterministic() {
        let a = fnv1a64(b"hello");
        let b = fnv1a64(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fnv1a64_differs_by_input() {
        assert_ne!(fnv1a64(b"hello"), fnv1a64(b"world"));
    }

    #[test]
    fn test_fnv1a64_known_vector() {
        // FNV-1a 64-bit of the empty string is the offset basis.
        assert_eq!(fnv1a64(b""), FNV_OFFSET_BASIS);
    }
}
