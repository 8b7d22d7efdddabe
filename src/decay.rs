//! Lifecycle/decay engine: exponential confidence decay by block age
//! (spec §4.5).

use crate::chain::Chain;
use crate::limits::MIN_CONFIDENCE;

/// Decays every valid block's confidence by age, using `half_life_seconds`
/// (clamped below at `1.0`) and the caller-supplied `now` (spec keeps
/// `timestamp` in whole seconds everywhere - see `SPEC_FULL.md` §9 OQ-2).
///
/// Blocks whose age is `<= 0` are skipped. A block whose decayed
/// confidence drops below `MIN_CONFIDENCE` is marked `valid = 0`
/// (tombstoned), but never compacted out - pair this with `cleanup` when
/// you also want the slot reclaimed.
pub fn decay(chain: &mut Chain, half_life_seconds: f64, now: u64) {
    let half_life = half_life_seconds.max(1.0);

    for i in 0..chain.count {
        let block = &mut chain.blocks[i];
        if block.valid == 0 {
            continue;
        }
        let age = now as i64 - block.timestamp as i64;
        if age <= 0 {
            continue;
        }
        let factor = 0.5_f64.powf(age as f64 / half_life);
        let decayed = (block.confidence as f64 * factor).clamp(0.0, 1.0) as f32;
        block.confidence = decayed;
        if block.confidence < MIN_CONFIDENCE {
            block.valid = 0;
            tracing::debug!(index = i, "block decayed below floor, tombstoned");
        }
    }
}
