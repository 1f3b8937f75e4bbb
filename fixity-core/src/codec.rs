//! The flat `path: hash` manifest text format.
//!
//! One record per `\n`-separated line, no header or trailer. The delimiter is
//! not escaped: a path containing `": "` cannot be represented and such a line
//! is dropped on parse.

use std::collections::BTreeMap;
use std::fmt::Display;

pub const DELIMITER: &str = ": ";

/// path -> recorded hash. A path listed twice keeps its last hash.
pub type PathIndex = BTreeMap<String, String>;

/// recorded hash -> path. Files with identical content share a hash, and only
/// the last one parsed is kept.
pub type HashIndex = BTreeMap<String, String>;

pub fn format_entry(path: &str, hash: impl Display) -> String {
    format!("{path}{DELIMITER}{hash}")
}

/// Split one line into `(path, hash)`. Anything other than exactly one
/// delimiter yields `None`.
pub fn parse_entry(line: &str) -> Option<(&str, &str)> {
    let mut tokens = line.split(DELIMITER);
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(path), Some(hash), None) => Some((path, hash)),
        _ => None,
    }
}

/// Build both indices from manifest text. Malformed and blank lines are
/// skipped without error; hashes are not validated.
pub fn parse(content: &str) -> (PathIndex, HashIndex) {
    parse_bytes(content.as_bytes())
}

/// [`parse`] over raw manifest bytes. A line that is not valid UTF-8 counts
/// as malformed and is skipped like any other.
pub fn parse_bytes(content: &[u8]) -> (PathIndex, HashIndex) {
    let mut by_path = PathIndex::new();
    let mut by_hash = HashIndex::new();
    for (lineno, raw) in content.split(|b| *b == b'\n').enumerate() {
        let Some((path, hash)) = std::str::from_utf8(raw).ok().and_then(parse_entry) else {
            if !raw.is_empty() {
                tracing::trace!(line = lineno + 1, "skipping malformed manifest line");
            }
            continue;
        };
        by_path.insert(path.to_string(), hash.to_string());
        by_hash.insert(hash.to_string(), path.to_string());
    }
    (by_path, by_hash)
}

/// Entries joined by `\n`, with no trailing newline.
pub fn render<E: AsRef<str>>(entries: &[E]) -> String {
    entries.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n")
}
