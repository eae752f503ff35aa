//! Suggested-filename extraction from `Content-Disposition` headers.
//!
//! Two forms are recognised, in order:
//!
//! 1. RFC 5987 extended syntax: `filename*=UTF-8''<percent-encoded>`
//! 2. Quoted plain syntax: `filename="<literal>"`
//!
//! When neither yields a usable name the mode's default archive name is used.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::types::Mode;

static EXTENDED_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)filename\*\s*=\s*UTF-8''([^;]+)").expect("extended filename pattern is valid")
});

static QUOTED_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\s*=\s*"([^"]+)""#).expect("quoted filename pattern is valid")
});

/// Extract a filename from a `Content-Disposition` header value.
///
/// Returns `None` when neither form is present, or when the extended form
/// does not decode to valid UTF-8 and no quoted form is available.
pub fn filename_from_header(header: &str) -> Option<String> {
    extended_filename(header).or_else(|| quoted_filename(header))
}

/// Suggested filename for a successful response of `mode`.
pub fn suggested_filename(header: Option<&str>, mode: Mode) -> String {
    header
        .and_then(filename_from_header)
        .unwrap_or_else(|| mode.default_archive_name().to_string())
}

fn extended_filename(header: &str) -> Option<String> {
    let encoded = EXTENDED_FILENAME.captures(header)?.get(1)?.as_str().trim();
    let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
    non_empty(decoded.into_owned())
}

fn quoted_filename(header: &str) -> Option<String> {
    let literal = QUOTED_FILENAME.captures(header)?.get(1)?.as_str();
    non_empty(literal.to_string())
}

fn non_empty(name: String) -> Option<String> {
    if name.trim().is_empty() {
        None
    } else {
        Some(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
