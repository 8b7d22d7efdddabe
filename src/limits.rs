//! Capacity and format constants - single source of truth for the chain's
//! fixed-size fields and the persistence format's literal tokens.
//!
//! This module is the crate's configuration surface: the chain core has no
//! external config file or CLI (spec §6), so the knobs a host would
//! otherwise tune live here as constants, mirroring the teacher's
//! `CODEC_VERSION`/`MAX_BLOCK_SIZE`-style constants block.

/// Maximum input text length, including the NUL terminator.
pub const IN_CAP: usize = 256;

/// Maximum output text length, including the NUL terminator.
pub const OUT_CAP: usize = 256;

/// Maximum number of blocks a chain holds.
pub const MAX_MEM: usize = 256;

/// Maximum tags kept per mindset model descriptor.
pub const MAX_TAGS: usize = 16;

/// Maximum referenced model files kept per mindset model descriptor.
pub const MAX_MODELS: usize = 8;

/// Confidence floor below which a block is demoted to a tombstone.
pub const MIN_CONFIDENCE: f32 = 0.05;

/// Confidence bump applied to a block on exact-match reinforcement via `learn`.
pub const REINFORCE_STEP: f32 = 0.1;

/// Confidence bump applied to a block on a successful exact-match `reason`.
pub const REASON_STEP: f32 = 0.05;

/// Chain file signature (`.fish` format header).
pub const FISH_SIGNATURE: &str = "JFS1";

/// Chain file format version written on save.
pub const FISH_VERSION_CURRENT: &str = "1.0.0";

/// Chain file format version still accepted on load.
pub const FISH_VERSION_LEGACY: &str = "0.1";

/// Largest `.fish` file `load` will accept, in bytes.
pub const MAX_FISH_FILE_BYTES: u64 = 1024 * 1024;

/// The sentinel returned by the reasoner when no association is found.
pub const UNKNOWN: &str = "Unknown";
