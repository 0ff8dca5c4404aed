//! Raw argument vectors: tokenizing strings and classifying tokens.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::sync::OnceLock;

use regex::Regex;

/// The literal `--` token that starts transfer capture.
pub const TERMINATOR: &str = "--";

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex literal")
}

fn regex_command_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"^[a-zA-Z0-9_-]+$"))
}

fn regex_compound_flag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"^-[a-zA-Z0-9]{2,}$"))
}

/// Split a command string into tokens, honoring single and double quotes.
///
/// `a "b c" d` becomes `["a", "b c", "d"]`. Quotes of the other kind inside
/// a quoted span are kept verbatim.
pub fn string_to_argv(cmd: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in cmd.chars() {
        match (ch, quote) {
            ('\'' | '"', Some(q)) if q == ch => {
                quote = None;
            }
            ('\'' | '"', None) => {
                quote = Some(ch);
            }
            (c, None) if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            (c, _) => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Anything that can be turned into an argument vector.
///
/// Strings are tokenized with [`string_to_argv`]; lists are taken as-is.
pub trait IntoArgv {
    fn into_argv(self) -> Vec<String>;
}

impl IntoArgv for &str {
    fn into_argv(self) -> Vec<String> {
        string_to_argv(self)
    }
}

impl IntoArgv for String {
    fn into_argv(self) -> Vec<String> {
        string_to_argv(&self)
    }
}

impl IntoArgv for Vec<String> {
    fn into_argv(self) -> Vec<String> {
        self
    }
}

impl IntoArgv for &[String] {
    fn into_argv(self) -> Vec<String> {
        self.to_vec()
    }
}

impl IntoArgv for Vec<&str> {
    fn into_argv(self) -> Vec<String> {
        self.into_iter().map(String::from).collect()
    }
}

impl IntoArgv for &[&str] {
    fn into_argv(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoArgv for [&str; N] {
    fn into_argv(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

/// Token starts with `-` (includes `--` and `-`).
pub fn is_flag_shaped(token: &str) -> bool {
    token.starts_with('-')
}

/// Token could be one word of a command path.
pub fn is_command_word(token: &str) -> bool {
    !is_flag_shaped(token) && regex_command_word().is_match(token)
}

/// Strip the `-`/`--` prefix from a flag-shaped token.
pub fn flag_name(token: &str) -> &str {
    token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))
        .unwrap_or(token)
}

/// Expand compounded short flags: `-abc` becomes `-a -b -c`.
///
/// Only single-dash tokens made entirely of ASCII alphanumerics are
/// expanded. Long flags, lone letters and tokens with symbols pass through.
/// Tokens after the `--` terminator are never touched.
pub fn expand_compound_flags(argv: &[String]) -> Vec<String> {
    let mut expanded = Vec::with_capacity(argv.len());
    let mut after_terminator = false;

    for token in argv {
        if after_terminator || !regex_compound_flag().is_match(token) {
            if token == TERMINATOR {
                after_terminator = true;
            }
            expanded.push(token.clone());
            continue;
        }
        expanded.extend(token[1..].chars().map(|c| format!("-{c}")));
    }

    expanded
}

/// Words of an argv that could belong to a command path, joined by spaces.
///
/// Used for not-found reports and suggestions.
pub fn command_words(argv: &[String]) -> String {
    argv.iter()
        .filter(|t| is_command_word(t))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_string_to_argv_quotes() {
        assert_eq!(string_to_argv(r#"a "b c" d"#), strings(&["a", "b c", "d"]));
        assert_eq!(
            string_to_argv("run 'it \"now\"'  --fast"),
            strings(&["run", "it \"now\"", "--fast"])
        );
        assert!(string_to_argv("   ").is_empty());
    }

    #[test]
    fn test_classification() {
        assert!(is_flag_shaped("-t"));
        assert!(is_flag_shaped("--to-do"));
        assert!(is_command_word("do"));
        assert!(is_command_word("run_all-now2"));
        assert!(!is_command_word("-t"));
        assert!(!is_command_word("a.txt"));
        assert!(!is_command_word(""));
    }

    #[test]
    fn test_flag_name() {
        assert_eq!(flag_name("--to-do"), "to-do");
        assert_eq!(flag_name("-t"), "t");
        assert_eq!(flag_name("plain"), "plain");
    }

    #[test]
    fn test_expand_compound_flags() {
        let argv = strings(&["-abc", "--long", "-x", "-a.b", "value", "--", "-zz"]);
        assert_eq!(
            expand_compound_flags(&argv),
            strings(&["-a", "-b", "-c", "--long", "-x", "-a.b", "value", "--", "-zz"])
        );
    }

    #[test]
    fn test_command_words() {
        let argv = strings(&["do", "-t", "x", "a.txt", "--", "now"]);
        assert_eq!(command_words(&argv), "do x now");
    }
}
