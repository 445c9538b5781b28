//! Directory glob matching
//!
//! Globs are matched against `/`-separated keys relative to the input root.
//! A `*` segment matches exactly one path segment; `*` or `?` inside a
//! segment never cross a `/`.

use crate::error::{Error, Result};
use regex::Regex;

/// A compiled directory glob
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
    literal_prefix: String,
}

impl GlobPattern {
    /// Compile a glob such as `song_data/*/*/*/*.json`
    pub fn new(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim().trim_start_matches("./").trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::glob(pattern, "pattern is empty"));
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::glob(pattern, "pattern contains an empty segment"));
        }
        if segments.iter().any(|s| *s == "." || *s == "..") {
            return Err(Error::glob(pattern, "relative segments are not allowed"));
        }

        let mut source = String::from("^");
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                source.push('/');
            }
            source.push_str(&segment_regex(segment));
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| Error::glob(pattern, e.to_string()))?;

        let literal_prefix = segments
            .iter()
            .take_while(|s| !has_wildcard(s))
            .copied()
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            pattern: trimmed.to_string(),
            regex,
            literal_prefix,
        })
    }

    /// The normalized pattern text
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Leading segments without wildcards; the narrowest prefix to list
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    /// Check whether a relative key matches
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?'])
}

fn segment_regex(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() * 2);
    for c in segment.chars() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out
}
