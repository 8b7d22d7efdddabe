//! `Block` - a single learned `(input, output)` association plus metadata
//! (spec §3).

use crate::bounded_string::BoundedString;
use crate::limits::{IN_CAP, OUT_CAP};
use serde::{Deserialize, Serialize};

/// A learned association, its audit fingerprint, and lifecycle metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub input: BoundedString<IN_CAP>,
    pub output: BoundedString<OUT_CAP>,
    pub hash: [u8; 32],
    pub timestamp: u64,
    pub delta_ms: u32,
    pub duration_ms: u32,
    pub valid: u8,
    pub confidence: f32,
    pub usage_count: u32,
    pub immutable: bool,
    pub device_id: [u8; 16],
    pub signature: [u8; 32],
}

impl Default for Block {
    fn default() -> Self {
        Self {
            input: BoundedString::empty(),
            output: BoundedString::empty(),
            hash: [0u8; 32],
            timestamp: 0,
            delta_ms: 0,
            duration_ms: 0,
            valid: 0,
            confidence: 0.0,
            usage_count: 0,
            immutable: false,
            device_id: [0u8; 16],
            signature: [0u8; 32],
        }
    }
}

impl Block {
    /// Is this slot free to be claimed by `learn` (a tombstone or never
    /// written)?
    pub fn is_tombstone(&self) -> bool {
        self.valid == 0
    }

    /// Truncated-capacity comparison against a candidate `(input, output)`
    /// pair, matching how `learn`/`reason` compare against bounded fields.
    pub fn matches(&self, input: &str, output: &str) -> bool {
        self.input.as_str() == BoundedString::<IN_CAP>::from_str(input).as_str()
            && self.output.as_str() == BoundedString::<OUT_CAP>::from_str(output).as_str()
    }

    /// Truncated-capacity comparison of just the input field.
    pub fn input_matches(&self, input: &str) -> bool {
        self.input.as_str() == BoundedString::<IN_CAP>::from_str(input).as_str()
    }

    /// Clamps `confidence` into `[0.0, 1.0]`.
    pub fn clamp_confidence(&mut self) {
        self.confidence = self.confidence.clamp(0.0, 1.0);
    }

    /// Non-empty input and output, fingerprint not all zero (spec §4.9).
    pub fn verify(&self) -> bool {
        !self.input.is_empty() && !self.output.is_empty() && self.hash != [0u8; 32]
    }

    /// Fully-valid per `knowledge_coverage`'s definition (spec §4.9):
    /// valid flag set, non-empty input/output, non-zero fingerprint,
    /// non-zero device id and signature, non-zero timestamp.
    pub fn is_fully_valid(&self) -> bool {
        self.valid == 1
            && !self.input.is_empty()
            && !self.output.is_empty()
            && self.hash != [0u8; 32]
            && self.device_id != [0u8; 16]
            && self.signature != [0u8; 32]
            && self.timestamp != 0
    }
}
