//! `Chain` - a bounded, ordered container of `Block`s plus chain-level
//! metadata (spec §3). Owned exclusively by its caller; there is no
//! lifetime beyond what persistence gives it.

use crate::block::Block;
use crate::bounded_string::BoundedString;
use crate::error::{ChainError, Result};
use crate::limits::{IN_CAP, MAX_MEM, MIN_CONFIDENCE, OUT_CAP, REINFORCE_STEP};
use crate::mixer;
use crate::salt;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Ordered, bounded collection of blocks owned by a single caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub blocks: Vec<Block>,
    pub count: usize,
    pub device_id: [u8; 16],
    pub created_at: u64,
    pub updated_at: u64,
}

impl Chain {
    /// A fresh, empty chain with the given writer device id.
    pub fn new(device_id: [u8; 16]) -> Self {
        let now = now_secs();
        Self {
            blocks: vec![Block::default(); MAX_MEM],
            count: 0,
            device_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Field-for-field comparison of chain-level metadata and blocks
    /// (spec's "compare" operation).
    pub fn compare(&self, other: &Chain) -> bool {
        self == other
    }

    fn touch(&mut self) {
        self.updated_at = now_secs();
    }

    /// Nearest previous valid block by position, scanning backward from
    /// (but not including) `before_index`.
    fn nearest_previous_valid(&self, before_index: usize) -> Option<&Block> {
        self.blocks[..before_index]
            .iter()
            .rev()
            .find(|b| b.valid == 1)
    }

    /// First slot with `valid == 0`, scanning the whole fixed-capacity
    /// array (covers both tombstone reuse and append-past-`count`;
    /// spec §4.2 step 2).
    fn first_free_slot(&self) -> Option<usize> {
        self.blocks.iter().position(|b| b.valid == 0)
    }

    /// Learns `(input, output)`: reinforces an existing exact match, or
    /// admits a new block into the first free slot. Silently drops the
    /// admission if the chain remains full after a `cleanup` retry
    /// (spec §4.2 / §7 documented default).
    pub fn learn(&mut self, input: &str, output: &str) {
        let _ = self.learn_inner(input, output, false);
    }

    /// Strict sibling of `learn`: returns `Err(ChainError::CapacityReached)`
    /// instead of silently dropping the admission.
    pub fn try_learn(&mut self, input: &str, output: &str) -> Result<()> {
        self.learn_inner(input, output, true)
    }

    fn learn_inner(&mut self, input: &str, output: &str, strict: bool) -> Result<()> {
        if let Some(i) = (0..self.count).find(|&i| {
            self.blocks[i].valid == 1 && self.blocks[i].matches(input, output)
        }) {
            let block = &mut self.blocks[i];
            block.usage_count += 1;
            block.confidence = (block.confidence + REINFORCE_STEP).min(1.0);
            block.timestamp = now_secs();
            self.touch();
            tracing::debug!(index = i, "reinforced existing block");
            return Ok(());
        }

        if self.admit_into_free_slot(input, output) {
            return Ok(());
        }

        tracing::warn!("chain full, running cleanup before retrying admission");
        self.cleanup();
        if self.admit_into_free_slot(input, output) {
            return Ok(());
        }

        tracing::warn!("chain capacity reached, admission dropped");
        if strict {
            Err(ChainError::CapacityReached)
        } else {
            Ok(())
        }
    }

    fn admit_into_free_slot(&mut self, input: &str, output: &str) -> bool {
        let Some(index) = self.first_free_slot() else {
            return false;
        };

        let ts = now_secs();
        let delta_ms = self
            .nearest_previous_valid(index)
            .map(|prev| ts.saturating_sub(prev.timestamp).saturating_mul(1000) as u32)
            .unwrap_or(0);

        let in_bytes = BoundedString::<IN_CAP>::from_str(input);
        let out_bytes = BoundedString::<OUT_CAP>::from_str(output);
        let hash = mixer::fingerprint(
            in_bytes.as_bytes(),
            out_bytes.as_bytes(),
            now_micros(),
            salt::device_salt(),
        );

        self.blocks[index] = Block {
            input: in_bytes,
            output: out_bytes,
            hash,
            timestamp: ts,
            delta_ms,
            duration_ms: 0,
            valid: 1,
            confidence: 1.0,
            usage_count: 0,
            immutable: false,
            device_id: [0u8; 16],
            signature: [0u8; 32],
        };

        if index >= self.count {
            self.count = index + 1;
        }
        self.touch();
        tracing::debug!(index, "admitted new block");
        true
    }

    /// Keep only `valid == 1 && confidence >= MIN_CONFIDENCE` blocks
    /// (immutable blocks are always kept), stable order preserved, zeroed
    /// tail. Returns the number removed.
    pub fn cleanup(&mut self) -> usize {
        self.retain_stable(|b| b.valid == 1 && (b.immutable || b.confidence >= MIN_CONFIDENCE))
    }

    /// Keep all `valid == 1` blocks (no confidence filter), stable order
    /// preserved, zeroed tail. Returns the number removed.
    pub fn compact(&mut self) -> usize {
        self.retain_stable(|b| b.valid == 1)
    }

    /// Removes blocks with `valid == 0` or `confidence < min_confidence`
    /// (immutable blocks are never removed), preserving survivor order.
    /// Returns the number removed.
    pub fn prune(&mut self, min_confidence: f32) -> usize {
        self.retain_stable(|b| b.valid == 1 && (b.immutable || b.confidence >= min_confidence))
    }

    fn retain_stable(&mut self, keep: impl Fn(&Block) -> bool) -> usize {
        let mut write = 0;
        for read in 0..self.count {
            if keep(&self.blocks[read]) {
                if write != read {
                    self.blocks[write] = self.blocks[read];
                }
                write += 1;
            }
        }
        let removed = self.count - write;
        for slot in self.blocks[write..self.count].iter_mut() {
            *slot = Block::default();
        }
        self.count = write;
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// O(n^2) scan: for each position, removes later blocks sharing the
    /// same `(input, output)`. Returns the number removed.
    pub fn dedupe(&mut self) -> usize {
        let mut removed = 0;
        for i in 0..self.count {
            if self.blocks[i].valid == 0 {
                continue;
            }
            for j in (i + 1)..self.count {
                if self.blocks[j].valid == 1
                    && self.blocks[j].input == self.blocks[i].input
                    && self.blocks[j].output == self.blocks[i].output
                {
                    self.blocks[j] = Block::default();
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            self.retain_stable(|b| b.valid == 1);
        }
        removed
    }

    /// Sorts the active blocks descending by confidence and truncates to
    /// `max_blocks`. Unlike the other maintenance operations, this does
    /// NOT preserve survivor order (spec §4.3). Returns the number removed.
    pub fn trim(&mut self, max_blocks: usize) -> usize {
        if self.count <= max_blocks {
            return 0;
        }
        let mut active: Vec<Block> = self.blocks[..self.count].to_vec();
        active.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
        let removed = active.len() - max_blocks;
        active.truncate(max_blocks);
        for (slot, block) in self.blocks.iter_mut().zip(active.into_iter()) {
            *slot = block;
        }
        for slot in self.blocks[max_blocks..self.count].iter_mut() {
            *slot = Block::default();
        }
        self.count = max_blocks;
        self.touch();
        removed
    }

    /// `true` iff a valid block exists with `input == input` and
    /// `output != output` (spec §3 / §8 property 7).
    pub fn detect_conflict(&self, input: &str, output: &str) -> bool {
        self.blocks[..self.count]
            .iter()
            .any(|b| b.valid == 1 && b.input_matches(input) && b.output.as_str() != output)
    }

    /// Among blocks with an exact input match, the one with maximal
    /// confidence; ties prefer an immutable block (spec §4.4).
    pub fn best_memory(&self, input: &str) -> Option<&Block> {
        self.blocks[..self.count]
            .iter()
            .filter(|b| b.valid == 1 && b.input_matches(input))
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap()
                    .then(a.immutable.cmp(&b.immutable))
            })
    }

    /// Iterator over the currently active (in-use) blocks.
    pub fn active_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks[..self.count].iter()
    }
}
