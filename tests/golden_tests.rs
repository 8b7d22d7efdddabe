//! Golden scenario tests covering every concrete scenario and quantified
//! invariant from the design (sections "Concrete scenarios" and
//! "Quantified invariants"): S1-S6 plus the boundary behaviors around an
//! empty chain, a full immutable chain, and input truncation.

use memchain::chain::Chain;
use memchain::codec;
use memchain::reasoner;
use memchain::verify;
use pretty_assertions::assert_eq;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Emits `tracing` output (admit/reinforce/decay/tombstone events) to
/// stderr when a test fails; set `RUST_LOG=debug` to see the full trace.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[test]
fn s1_exact_match_and_unknown_fallback() {
    init_tracing();
    let mut c = Chain::new([1u8; 16]);
    c.learn("hello", "world");
    c.learn("foo", "bar");
    assert_eq!(reasoner::reason(&mut c, "hello"), "world");
    assert_eq!(reasoner::reason(&mut c, "foo"), "bar");
    assert_eq!(reasoner::reason(&mut c, "unknown"), "Unknown");
}

#[test]
fn s2_positional_fuzzy_fallback() {
    let mut c = Chain::new([1u8; 16]);
    c.learn("cat", "meow");
    c.learn("dog", "bark");
    c.learn("bird", "tweet");
    assert_eq!(reasoner::reason(&mut c, "cot"), "meow");
    assert_eq!(reasoner::reason(&mut c, "bog"), "bark");
    assert_eq!(reasoner::reason(&mut c, "elephant"), "Unknown");
}

#[test]
fn s3_repeated_learn_reinforces_in_place() {
    let mut c = Chain::new([1u8; 16]);
    c.learn("x", "y");
    c.learn("x", "y");
    assert_eq!(c.count, 1);
    assert_eq!(c.blocks[0].usage_count, 1);
    assert_eq!(c.blocks[0].confidence, 1.0);
}

#[test]
fn s4_decay_then_cleanup_drops_floor_crossing_block() {
    let mut c = Chain::new([1u8; 16]);
    c.learn("x", "y");
    c.blocks[0].confidence = 0.5;
    c.blocks[0].timestamp = 1_000;
    c.learn("foo", "bar");
    c.blocks[1].confidence = 0.1;
    c.blocks[1].timestamp = 1_000;

    memchain::decay::decay(&mut c, 0.2, 1_002);
    // Pinned clock (age = 2s, half_life clamped to 1.0): factor = 0.25.
    assert!((c.blocks[0].confidence - 0.125).abs() < 1e-3);
    assert_eq!(c.blocks[1].valid, 0);

    let removed = c.cleanup();
    assert_eq!(removed, 1);
    assert_eq!(c.count, 1);
    assert_eq!(c.blocks[0].input.as_str(), "x");
}

#[test]
fn s5_save_load_roundtrip_preserves_blocks() {
    let mut c1 = Chain::new([2u8; 16]);
    c1.learn("alpha", "beta");
    c1.learn("gamma", "delta");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chain.fish");
    codec::save(&c1, &path).unwrap();
    let c2 = codec::load(&path).unwrap();

    assert_eq!(c2.count, 2);
    for i in 0..2 {
        assert_eq!(c1.blocks[i].input, c2.blocks[i].input);
        assert_eq!(c1.blocks[i].output, c2.blocks[i].output);
        assert_eq!(c1.blocks[i].hash, c2.blocks[i].hash);
        assert_eq!(c1.blocks[i].timestamp, c2.blocks[i].timestamp);
        assert_eq!(c1.blocks[i].delta_ms, c2.blocks[i].delta_ms);
        assert_eq!(c1.blocks[i].duration_ms, c2.blocks[i].duration_ms);
        assert_eq!(c1.blocks[i].valid, c2.blocks[i].valid);
        assert_eq!(c1.blocks[i].usage_count, c2.blocks[i].usage_count);
        assert_eq!(c1.blocks[i].device_id, c2.blocks[i].device_id);
        assert_eq!(c1.blocks[i].signature, c2.blocks[i].signature);
        assert!((c1.blocks[i].confidence - c2.blocks[i].confidence).abs() < 1e-6);
    }
}

#[test]
fn s6_detect_conflict_on_contradicting_output_only() {
    let mut c = Chain::new([1u8; 16]);
    c.learn("earth", "round");
    assert!(c.detect_conflict("earth", "flat"));
    assert!(!c.detect_conflict("earth", "round"));
}

#[test]
fn invariant_cleanup_never_drops_below_confidence_floor() {
    let mut c = Chain::new([1u8; 16]);
    c.learn("a", "1");
    c.learn("b", "2");
    c.blocks[0].confidence = 0.01;
    c.cleanup();
    for block in c.active_blocks() {
        assert!(block.valid == 1);
        assert!(block.confidence >= 0.05);
    }
}

#[test]
fn invariant_compact_preserves_order_and_zeros_tail() {
    let mut c = Chain::new([1u8; 16]);
    c.learn("a", "1");
    c.learn("b", "2");
    c.learn("c", "3");
    c.blocks[1].valid = 0;
    let before_count = c.count;
    c.compact();
    assert_eq!(c.count, before_count - 1);
    assert_eq!(c.blocks[0].input.as_str(), "a");
    assert_eq!(c.blocks[1].input.as_str(), "c");
    for slot in &c.blocks[c.count..] {
        assert_eq!(slot.valid, 0);
    }
}

#[test]
fn invariant_fingerprint_stable_unless_tracked_fields_change() {
    let mut c = Chain::new([1u8; 16]);
    c.learn("a", "1");
    c.learn("b", "2");
    let fp1 = verify::chain_fingerprint(&c);
    c.compact();
    let fp2 = verify::chain_fingerprint(&c);
    assert_eq!(fp1, fp2);

    c.blocks[0].confidence -= 0.1;
    let fp3 = verify::chain_fingerprint(&c);
    assert_ne!(fp1, fp3);
}

#[test]
fn invariant_reason_never_fabricates() {
    let mut c = Chain::new([1u8; 16]);
    c.learn("a", "1");
    let out = reasoner::reason(&mut c, "completely different query");
    assert!(out == "1" || out == "Unknown");
}

#[test]
fn boundary_empty_chain() {
    let mut c = Chain::new([1u8; 16]);
    assert_eq!(reasoner::reason(&mut c, "anything"), "Unknown");
    assert!(c.best_memory("anything").is_none());
    let fp = verify::chain_fingerprint(&c);
    let expected: Vec<u8> = (0..32u8).map(|i| 0xA5 ^ i).collect();
    assert_eq!(fp.to_vec(), expected);
}

#[test]
fn boundary_full_immutable_chain_rejects_new_learn_and_resists_cleanup() {
    let mut c = Chain::new([1u8; 16]);
    let cap = c.blocks.len();
    for i in 0..cap {
        c.learn(&format!("k{i}"), &format!("v{i}"));
        c.blocks[i].confidence = 1.0;
        c.blocks[i].immutable = true;
    }
    assert_eq!(c.count, cap);

    c.learn("overflow-key", "overflow-value");
    assert_eq!(c.count, cap, "full immutable chain must drop new learns");

    let removed = c.cleanup();
    assert_eq!(removed, 0, "immutable blocks must survive cleanup");
    let pruned = c.prune(1.1);
    assert_eq!(pruned, 0, "immutable blocks must survive prune regardless of threshold");
}

#[test]
fn boundary_input_longer_than_cap_is_truncated() {
    let mut c = Chain::new([1u8; 16]);
    let long_input = "x".repeat(memchain::limits::IN_CAP + 50);
    c.learn(&long_input, "value");
    assert!(c.blocks[0].input.len() <= memchain::limits::IN_CAP - 1);
}
