//! Chain-level verification and reporting: whole-chain integrity checks,
//! trust scoring, coverage, and the chain-level fingerprint (spec §4.9).

use crate::chain::Chain;

/// Every block in `[0, count)` verifies (spec §4.9 `verify_block`).
pub fn verify_chain(chain: &Chain) -> bool {
    chain.active_blocks().all(|b| b.verify())
}

/// Mean confidence across valid, immutable blocks with confidence >= 0.9;
/// `0.0` if none qualify.
pub fn chain_trust_score(chain: &Chain) -> f32 {
    let mut sum = 0.0f32;
    let mut n = 0u32;
    for b in chain.active_blocks() {
        if b.valid == 1 && b.immutable && b.confidence >= 0.9 {
            sum += b.confidence;
            n += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f32
    }
}

/// Ratio of fully-valid blocks (spec §4.9 `knowledge_coverage`) to `count`;
/// `0.0` on an empty chain.
pub fn knowledge_coverage(chain: &Chain) -> f32 {
    if chain.count == 0 {
        return 0.0;
    }
    let fully_valid = chain.active_blocks().filter(|b| b.is_fully_valid()).count();
    fully_valid as f32 / chain.count as f32
}

/// Chain-level fingerprint: 32 bytes seeded with `0xA5 ^ i`, then folded
/// with every valid block's `(hash, timestamp, confidence, usage_count)`
/// and its position (spec §4.9). A pure function of those fields and
/// position - untouched by any other mutation.
pub fn chain_fingerprint(chain: &Chain) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = 0xA5 ^ (i as u8);
    }

    for (j, block) in chain.active_blocks().enumerate() {
        if block.valid != 1 {
            continue;
        }
        for i in 0..32 {
            let ts_byte = ((block.timestamp >> ((i % 8) * 8)) & 0xff) as u8;
            let mut mixed = block.hash[i] ^ ts_byte;
            let shift = ((j % 7) + 1) as u32;
            mixed = mixed.rotate_left(shift);
            mixed ^= ((j * 31 + i * 17) & 0xff) as u8;
            out[i] ^= mixed;
        }
        let conf_byte = (block.confidence * 255.0).round() as u8;
        let usage_byte = (block.usage_count & 0xff) as u8;
        out[j % 32] ^= conf_byte ^ usage_byte;
    }

    out
}
