// src/core/dotenv.rs

//! Parsing of `.env` overlay files.

use std::collections::BTreeMap;

/// Parses the content of an overlay file into key/value entries.
///
/// Each line of the form `KEY=VALUE` yields one entry; the value is everything
/// after the first `=` and may be empty. Lines without `=` (or with an empty
/// key) are skipped. When a key repeats, the last occurrence wins.
///
/// No quoting, escaping or comment syntax is recognized.
pub fn parse(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            if key.is_empty() {
                log::trace!("Skipping overlay line without a key: {:?}", line);
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
