//! Name patterns for argument aliases.
//!
//! An alias is one of:
//! - a literal word (`verbose`), matched exactly
//! - a glob (`log-*`, `v?`), matched against the whole name via `globset`
//! - a regex, written with the `re::` prefix (`re::^no-.+$`), searched via `regex`
//!
//! Matching is always case-sensitive.

use globset::{Glob, GlobMatcher};
use regex::Regex;

/// Prefix marking an alias as a regular expression.
pub const REGEX_PREFIX: &str = "re::";

/// A compiled alias pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Glob { source: String, matcher: GlobMatcher },
    Regex(Regex),
}

/// Returns true if the text would be compiled as a glob or regex.
pub fn is_pattern(text: &str) -> bool {
    text.contains('*') || text.contains('?') || text.contains("::")
}

impl Pattern {
    /// Compile pattern text. Plain words become literals.
    pub fn new(text: &str) -> Result<Self, String> {
        if let Some(expr) = text.strip_prefix(REGEX_PREFIX) {
            return Regex::new(expr)
                .map(Pattern::Regex)
                .map_err(|e| format!("invalid regex '{expr}': {e}"));
        }
        if is_pattern(text) {
            let matcher = Glob::new(text)
                .map_err(|e| format!("invalid glob '{text}': {e}"))?
                .compile_matcher();
            return Ok(Pattern::Glob {
                source: text.to_string(),
                matcher,
            });
        }
        Ok(Pattern::Literal(text.to_string()))
    }

    /// Compile, falling back to a literal match when the text does not compile.
    pub fn lenient(text: &str) -> Self {
        Self::new(text).unwrap_or_else(|reason| {
            tracing::warn!("alias '{}' treated as literal: {}", text, reason);
            Pattern::Literal(text.to_string())
        })
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Pattern::Literal(lit) => lit == value,
            Pattern::Glob { matcher, .. } => matcher.is_match(value),
            Pattern::Regex(re) => re.is_match(value),
        }
    }

    /// The literal text, if this pattern is a plain word.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Pattern::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Source text as written at registration.
    pub fn source(&self) -> String {
        match self {
            Pattern::Literal(lit) => lit.clone(),
            Pattern::Glob { source, .. } => source.clone(),
            Pattern::Regex(re) => format!("{REGEX_PREFIX}{}", re.as_str()),
        }
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Pattern::Regex(re)
    }
}

/// One-shot match of pattern text against a value.
pub fn matches(pattern: &str, value: &str) -> bool {
    Pattern::lenient(pattern).is_match(value)
}
