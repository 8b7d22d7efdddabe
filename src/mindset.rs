//! Mindset loader: a line-oriented `.jellyfish` format describing model
//! descriptors (spec §4.7). Unlike the `.fish` chain format this parser is
//! tolerant: unknown keys are ignored and excess tags/model files are
//! silently truncated rather than rejected, since a mindset file is a
//! declarative hint, not an audit record.

use crate::chain::Chain;
use crate::limits::{MAX_MODELS, MAX_TAGS};
use std::collections::HashMap;

/// A declarative description of a model the chain host may load, parsed
/// from a single `model('name') { ... }` record.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub name: String,
    pub description: String,
    pub activation_condition: String,
    pub source_uri: String,
    pub origin_device_id: String,
    pub version: String,
    pub content_hash: String,
    pub state_machine: String,
    pub created_at: u64,
    pub updated_at: u64,
    pub trust_score: f64,
    pub immutable: bool,
    pub priority: i64,
    pub confidence_threshold: f64,
    pub tags: Vec<String>,
    pub model_files: Vec<String>,
    pub chain: Option<Chain>,
}

impl Default for ModelDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            activation_condition: String::new(),
            source_uri: String::new(),
            origin_device_id: String::new(),
            version: String::new(),
            content_hash: String::new(),
            state_machine: String::new(),
            created_at: 0,
            updated_at: 0,
            trust_score: 0.0,
            immutable: false,
            priority: 0,
            confidence_threshold: 0.0,
            tags: Vec::new(),
            model_files: Vec::new(),
            chain: None,
        }
    }
}

/// Strips a single layer of matching quotes (`'` or `"`) from `value`, or
/// returns `value` unchanged if it isn't quoted.
fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parses a `[a, b, c]` bracketed list, stripping quotes off each element.
/// A value with no brackets is treated as a single-element list.
fn parse_list(value: &str) -> Vec<String> {
    let value = value.trim();
    let inner = match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) => inner,
        None => return vec![strip_quotes(value).to_string()],
    };
    inner
        .split(',')
        .map(|item| strip_quotes(item).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Extracts the quoted name out of a `model('name') {` header line.
fn parse_model_header(line: &str) -> Option<String> {
    let line = line.trim();
    let rest = line.strip_prefix("model(")?;
    let close = rest.find(')')?;
    let name = strip_quotes(&rest[..close]).to_string();
    let tail = rest[close + 1..].trim();
    if tail != "{" {
        return None;
    }
    Some(name)
}

fn apply_field(desc: &mut ModelDescriptor, key: &str, value: &str) {
    match key {
        "description" => desc.description = strip_quotes(value).to_string(),
        "activation_condition" => desc.activation_condition = strip_quotes(value).to_string(),
        "source_uri" => desc.source_uri = strip_quotes(value).to_string(),
        "origin_device_id" => desc.origin_device_id = strip_quotes(value).to_string(),
        "version" => desc.version = strip_quotes(value).to_string(),
        "content_hash" => desc.content_hash = strip_quotes(value).to_string(),
        "state_machine" => desc.state_machine = strip_quotes(value).to_string(),
        "created_at" => desc.created_at = value.trim().parse().unwrap_or(0),
        "updated_at" => desc.updated_at = value.trim().parse().unwrap_or(0),
        "trust_score" => desc.trust_score = value.trim().parse().unwrap_or(0.0),
        "confidence_threshold" => desc.confidence_threshold = value.trim().parse().unwrap_or(0.0),
        "priority" => desc.priority = value.trim().parse().unwrap_or(0),
        "immutable" => desc.immutable = value.trim() == "true",
        "tags" => {
            desc.tags = parse_list(value);
            desc.tags.truncate(MAX_TAGS);
        }
        "model_files" => {
            desc.model_files = parse_list(value);
            desc.model_files.truncate(MAX_MODELS);
        }
        // Unknown keys are ignored - forward compatibility for fields a
        // newer writer may add.
        _ => {}
    }
}

/// Parses every `model('name') { ... }` record out of a `.jellyfish`
/// document into a name-keyed map. A record runs until a line containing
/// only `}`. Malformed records are skipped with a warning rather than
/// aborting the whole parse, since a mindset file commonly accretes
/// entries from multiple writers.
pub fn parse(text: &str) -> HashMap<String, ModelDescriptor> {
    let mut models = HashMap::new();
    let mut lines = text.lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }
        let Some(name) = parse_model_header(line) else {
            continue;
        };
        let mut desc = ModelDescriptor {
            name: name.clone(),
            ..ModelDescriptor::default()
        };
        let mut closed = false;
        for body_line in lines.by_ref() {
            let body_line = body_line.trim();
            if body_line == "}" {
                closed = true;
                break;
            }
            if body_line.is_empty() {
                continue;
            }
            let Some((key, value)) = body_line.split_once(':') else {
                continue;
            };
            apply_field(&mut desc, key.trim(), value.trim());
        }
        if !closed {
            tracing::warn!(model = %name, "unterminated model record, discarding");
            continue;
        }
        models.insert(name, desc);
    }

    models
}
