//! Persistence codec for the `.fish` chain file format (spec §4.6, §6).
//!
//! The format is a textual key/value record, one key per line, with a
//! fixed field order at both the header and per-block level. It is not
//! JSON: there are no commas and no nested-value types, only quoted
//! strings, lowercase hex, and decimal numbers. Decoding is strict and
//! atomic - any missing, malformed, or out-of-order field aborts the
//! whole load before anything is written into the destination chain.

use crate::block::Block;
use crate::bounded_string::BoundedString;
use crate::chain::Chain;
use crate::error::{ChainError, Result};
use crate::limits::{
    FISH_SIGNATURE, FISH_VERSION_CURRENT, FISH_VERSION_LEGACY, IN_CAP, MAX_FISH_FILE_BYTES,
    OUT_CAP,
};
use std::io::Write as _;
use std::path::Path;

/// Escapes `\` and `"` with a backslash so the value round-trips as a
/// single-line quoted string.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '\\' || ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Reverses [`escape`]. `chars` must not include the surrounding quotes.
fn unescape(chars: &str) -> Result<String> {
    let mut out = String::with_capacity(chars.len());
    let mut iter = chars.chars();
    while let Some(ch) = iter.next() {
        if ch == '\\' {
            match iter.next() {
                Some(next) => out.push(next),
                None => return Err(ChainError::ParseFailure { detail: "dangling escape in string".into() }),
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

fn write_quoted(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": \"");
    out.push_str(&escape(value));
    out.push_str("\"\n");
}

fn write_plain(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

/// Serializes one block into its record body, using `previous_hash` as
/// computed by the caller (the predecessor block's hash, or all-zero for
/// the first block).
fn encode_block(index: usize, block: &Block, previous_hash: &[u8; 32]) -> String {
    let mut out = String::new();
    out.push_str("{\n");
    write_plain(&mut out, "block_index", &index.to_string());
    write_quoted(&mut out, "input", block.input.as_str());
    write_quoted(&mut out, "output", block.output.as_str());
    write_plain(&mut out, "hash", &hex::encode(block.hash));
    write_plain(&mut out, "previous_hash", &hex::encode(previous_hash));
    write_plain(&mut out, "timestamp", &block.timestamp.to_string());
    write_plain(&mut out, "delta_ms", &block.delta_ms.to_string());
    write_plain(&mut out, "duration_ms", &block.duration_ms.to_string());
    write_plain(&mut out, "valid", &block.valid.to_string());
    write_plain(&mut out, "confidence", &format!("{:.6}", block.confidence));
    write_plain(&mut out, "usage_count", &block.usage_count.to_string());
    write_plain(&mut out, "device_id", &hex::encode(block.device_id));
    write_plain(&mut out, "signature", &hex::encode(block.signature));
    out.push_str("}\n");
    out
}

/// Serializes `chain` into the full `.fish` document text.
pub fn encode_chain(chain: &Chain) -> String {
    let mut out = String::new();
    write_quoted(&mut out, "signature", FISH_SIGNATURE);
    write_quoted(&mut out, "version", FISH_VERSION_CURRENT);
    write_plain(&mut out, "origin_device_id", &hex::encode(chain.device_id));
    write_plain(&mut out, "created_at", &chain.created_at.to_string());
    write_plain(&mut out, "updated_at", &chain.updated_at.to_string());
    out.push_str("blocks: [\n");

    let mut previous_hash = [0u8; 32];
    for (i, block) in chain.active_blocks().enumerate() {
        out.push_str(&encode_block(i, block, &previous_hash));
        previous_hash = block.hash;
    }
    out.push_str("]\n");
    out
}

/// A cursor over non-empty, trimmed lines of the document.
struct Lines<'a> {
    iter: std::vec::IntoIter<&'a str>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        Self {
            iter: lines.into_iter(),
        }
    }

    fn next(&mut self) -> Result<&'a str> {
        self.iter
            .next()
            .ok_or_else(|| ChainError::ParseFailure { detail: "unexpected end of file".into() })
    }
}

/// Splits a `key: value` line, verifying the key matches `expected`.
fn expect_key(line: &str, expected: &str) -> Result<String> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| ChainError::ParseFailure { detail: format!("malformed line: {line}") })?;
    let key = key.trim();
    if key != expected {
        return Err(ChainError::ParseFailure { detail: format!(
            "expected field '{expected}', found '{key}'"
        ) });
    }
    Ok(value.trim().to_string())
}

fn parse_quoted(value: &str) -> Result<String> {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(|| ChainError::ParseFailure { detail: format!("expected quoted string: {value}") })?;
    unescape(inner)
}

fn parse_hex<const N: usize>(value: &str) -> Result<[u8; N]> {
    let bytes =
        hex::decode(value).map_err(|e| ChainError::ParseFailure { detail: format!("invalid hex: {e}") })?;
    if bytes.len() != N {
        return Err(ChainError::ParseFailure { detail: format!(
            "expected {N} bytes, found {}",
            bytes.len()
        ) });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn parse_u64(value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| ChainError::ParseFailure { detail: format!("invalid integer: {value}") })
}

fn parse_u32(value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| ChainError::ParseFailure { detail: format!("invalid integer: {value}") })
}

fn parse_u8(value: &str) -> Result<u8> {
    value
        .parse()
        .map_err(|_| ChainError::ParseFailure { detail: format!("invalid integer: {value}") })
}

fn parse_f32(value: &str) -> Result<f32> {
    value
        .parse()
        .map_err(|_| ChainError::ParseFailure { detail: format!("invalid float: {value}") })
}

/// Parses one block record whose opening `{` has already been consumed by
/// the caller (the array-loop needs to look at that token to decide
/// whether the array has ended).
fn decode_block_fields(lines: &mut Lines<'_>, expected_index: usize) -> Result<(Block, [u8; 32])> {
    let index = parse_u64(&expect_key(lines.next()?, "block_index")?)? as usize;
    if index != expected_index {
        return Err(ChainError::ParseFailure { detail: format!(
            "out-of-order block_index: expected {expected_index}, found {index}"
        ) });
    }
    let input = parse_quoted(&expect_key(lines.next()?, "input")?)?;
    let output = parse_quoted(&expect_key(lines.next()?, "output")?)?;
    let hash: [u8; 32] = parse_hex(&expect_key(lines.next()?, "hash")?)?;
    let previous_hash: [u8; 32] = parse_hex(&expect_key(lines.next()?, "previous_hash")?)?;
    let timestamp = parse_u64(&expect_key(lines.next()?, "timestamp")?)?;
    let delta_ms = parse_u32(&expect_key(lines.next()?, "delta_ms")?)?;
    let duration_ms = parse_u32(&expect_key(lines.next()?, "duration_ms")?)?;
    let valid = parse_u8(&expect_key(lines.next()?, "valid")?)?;
    let confidence = parse_f32(&expect_key(lines.next()?, "confidence")?)?;
    let usage_count = parse_u32(&expect_key(lines.next()?, "usage_count")?)?;
    let device_id: [u8; 16] = parse_hex(&expect_key(lines.next()?, "device_id")?)?;
    let signature: [u8; 32] = parse_hex(&expect_key(lines.next()?, "signature")?)?;

    let close = lines.next()?;
    if close != "}" {
        return Err(ChainError::ParseFailure { detail: format!(
            "expected block end '}}', found '{close}'"
        ) });
    }

    let block = Block {
        input: BoundedString::<IN_CAP>::from_str(&input),
        output: BoundedString::<OUT_CAP>::from_str(&output),
        hash,
        timestamp,
        delta_ms,
        duration_ms,
        valid,
        confidence,
        usage_count,
        immutable: false,
        device_id,
        signature,
    };
    Ok((block, previous_hash))
}

/// Parses a `.fish` document into a fresh [`Chain`]. Fails atomically: on
/// any parse error nothing is returned and no partial state is observable
/// by the caller.
pub fn decode_chain(text: &str) -> Result<Chain> {
    let mut lines = Lines::new(text);

    let signature = parse_quoted(&expect_key(lines.next()?, "signature")?)?;
    if signature != FISH_SIGNATURE {
        return Err(ChainError::ParseFailure { detail: format!(
            "unrecognized signature: {signature}"
        ) });
    }
    let version = parse_quoted(&expect_key(lines.next()?, "version")?)?;
    if version != FISH_VERSION_CURRENT && version != FISH_VERSION_LEGACY {
        return Err(ChainError::ParseFailure { detail: format!(
            "unsupported version: {version}"
        ) });
    }
    let device_id: [u8; 16] = parse_hex(&expect_key(lines.next()?, "origin_device_id")?)?;
    let created_at = parse_u64(&expect_key(lines.next()?, "created_at")?)?;
    let updated_at = parse_u64(&expect_key(lines.next()?, "updated_at")?)?;

    let blocks_open = expect_key(lines.next()?, "blocks")?;
    if blocks_open != "[" {
        return Err(ChainError::ParseFailure { detail: 
            "expected 'blocks: [' array start".into(),
         });
    }

    let mut chain = Chain::new(device_id);
    let mut expected_previous = [0u8; 32];
    let mut index = 0usize;
    loop {
        let token = lines.next()?;
        if token == "]" {
            break;
        }
        if token != "{" {
            return Err(ChainError::ParseFailure { detail: format!(
                "expected block or array end, found '{token}'"
            ) });
        }
        if index >= chain.blocks.len() {
            return Err(ChainError::ParseFailure { detail: "too many blocks for capacity".into() });
        }
        let (block, previous_hash) = decode_block_fields(&mut lines, index)?;
        if previous_hash != expected_previous {
            return Err(ChainError::ParseFailure { detail: format!(
                "previous_hash mismatch at block {index}"
            ) });
        }
        expected_previous = block.hash;
        chain.blocks[index] = block;
        index += 1;
    }
    chain.count = index;
    chain.created_at = created_at;
    chain.updated_at = updated_at;

    tracing::info!(blocks = index, "decoded fish chain");
    Ok(chain)
}

/// Saves `chain` to `path` in the `.fish` format. Writes in binary mode so
/// no platform-specific newline translation touches the byte-exact hex
/// and escaped-string fields.
pub fn save(chain: &Chain, path: &Path) -> Result<()> {
    let text = encode_chain(chain);
    let mut file = std::fs::File::create(path)?;
    file.write_all(text.as_bytes())?;
    tracing::info!(path = %path.display(), blocks = chain.count, "saved chain");
    Ok(())
}

/// Loads a `.fish` file from `path`, rejecting anything over
/// `MAX_FISH_FILE_BYTES` before it is even parsed.
pub fn load(path: &Path) -> Result<Chain> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_FISH_FILE_BYTES {
        return Err(ChainError::FileTooLarge {
            actual: metadata.len(),
            max: MAX_FISH_FILE_BYTES,
        });
    }
    let bytes = std::fs::read(path)?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| ChainError::ParseFailure { detail: "file is not valid utf-8".into() })?;
    decode_chain(text)
}
