//! Query patterns: literal prefix, or `*` wildcards anchored at both ends.

use regex::Regex;

use crate::errors::{AkvError, Result};

/// The wildcard character. There is no escape for a literal `*`.
pub const WILDCARD: char = '*';

/// A compiled search pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches any path starting with the string.
    Prefix(String),
    /// Matches whole paths; each `*` stands for any run of characters.
    Wildcard(Regex),
}

impl Pattern {
    /// Compile `raw`. Anything containing `*` becomes a wildcard pattern;
    /// every other character is matched literally.
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.contains(WILDCARD) {
            return Ok(Self::Prefix(raw.to_string()));
        }

        let body = raw
            .split(WILDCARD)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("(?s)^{body}$"))
            .map_err(|e| AkvError::CommandFailed(format!("invalid pattern '{raw}': {e}")))?;
        Ok(Self::Wildcard(regex))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Wildcard(regex) => regex.is_match(path),
        }
    }
}
