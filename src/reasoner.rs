//! Retrieval: exact-match lookup, a positional fuzzy fallback, and a
//! verbose variant that reports confidence and provenance (spec §4.4).

use crate::chain::Chain;
use crate::limits::{REASON_STEP, UNKNOWN};

/// Positional mismatch score between `query` and `candidate`: differing
/// lowercase characters over the shared prefix, plus one point per
/// leftover character on the longer side. Strictly positional, not an
/// edit distance (spec §9 - intentional).
fn positional_score(query: &str, candidate: &str) -> usize {
    let q: Vec<char> = query.chars().collect();
    let c: Vec<char> = candidate.chars().collect();
    let shared = q.len().min(c.len());
    let mismatches = (0..shared)
        .filter(|&i| q[i].to_ascii_lowercase() != c[i].to_ascii_lowercase())
        .count();
    let leftover = q.len().abs_diff(c.len());
    mismatches + leftover
}

/// Exact match: first valid block whose input equals `query` (truncated
/// compare). On success, increments `usage_count` and bumps confidence by
/// `REASON_STEP` (clamped at 1.0).
fn exact_reason(chain: &mut Chain, query: &str) -> Option<String> {
    let index = (0..chain.count)
        .find(|&i| chain.blocks[i].valid == 1 && chain.blocks[i].input_matches(query))?;

    let block = &mut chain.blocks[index];
    block.usage_count += 1;
    if block.confidence < 1.0 {
        block.confidence = (block.confidence + REASON_STEP).min(1.0);
    }
    Some(block.output.as_str().to_string())
}

/// Best fuzzy match by minimal positional score, rejecting anything over
/// `len(query) / 2`.
fn fuzzy_reason(chain: &Chain, query: &str) -> Option<String> {
    let threshold = query.chars().count() / 2;
    chain
        .active_blocks()
        .filter(|b| b.valid == 1)
        .map(|b| (positional_score(query, b.input.as_str()), b))
        .min_by_key(|(score, _)| *score)
        .filter(|(score, _)| *score <= threshold)
        .map(|(_, b)| b.output.as_str().to_string())
}

/// Exact match first, falling back to the positional fuzzy match, falling
/// back to the `"Unknown"` sentinel. Mutates `usage_count`/`confidence` on
/// an exact hit - treat this call as a writer (spec §5).
pub fn reason(chain: &mut Chain, query: &str) -> String {
    if let Some(out) = exact_reason(chain, query) {
        tracing::debug!(query, "exact match");
        return out;
    }
    if let Some(out) = fuzzy_reason(chain, query) {
        tracing::debug!(query, "fuzzy match");
        return out;
    }
    tracing::debug!(query, "no match");
    UNKNOWN.to_string()
}

/// Exact-match-only scan, returning `(output, confidence, source index)`.
/// Never fabricates a string (spec §8 property 6): on a miss, returns
/// `(UNKNOWN, 0.0, None)`.
pub fn reason_verbose(chain: &mut Chain, query: &str) -> (String, f32, Option<usize>) {
    let index = (0..chain.count)
        .find(|&i| chain.blocks[i].valid == 1 && chain.blocks[i].input_matches(query));

    match index {
        Some(i) => {
            let block = &mut chain.blocks[i];
            block.usage_count += 1;
            if block.confidence < 1.0 {
                block.confidence = (block.confidence + REASON_STEP).min(1.0);
            }
            (block.output.as_str().to_string(), block.confidence, Some(i))
        }
        None => (UNKNOWN.to_string(), 0.0, None),
    }
}
