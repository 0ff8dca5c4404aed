//! Parse options and per-context settings.
//!
//! [`ParseOptions`] can be loaded from a TOML file:
//!
//! ```toml
//! strict = false
//! show_help_on_error = true
//! exit_code_on_error = -1
//! ```
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::resolver::DEFAULT_MAX_COMMAND_VARIANTS;

/// Behavior of one `Cli::parse` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Run the resolved command's action on success
    pub invoke: bool,
    /// Render help when the help flag is bound
    pub show_help: bool,
    /// Render the error tables on validation failure
    pub show_errors: bool,
    /// Also render errors when help is shown
    pub show_errors_on_help: bool,
    /// Append help to a failure report
    pub show_help_on_error: bool,
    /// Show help for a command without an action instead of running nothing
    pub show_help_on_menu: bool,
    /// Suggest close command paths when nothing resolves
    pub show_did_you_mean: bool,
    /// Return `CliError::CommandNotFound` instead of a report
    pub throw_command_not_found_error: bool,
    /// Unknown flags and unclaimed positionals are failures
    pub strict: bool,
    /// Exit status signaled on failure; `-1` means none
    pub exit_code_on_error: i32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            invoke: true,
            show_help: true,
            show_errors: true,
            show_errors_on_help: false,
            show_help_on_error: false,
            show_help_on_menu: true,
            show_did_you_mean: true,
            throw_command_not_found_error: false,
            strict: true,
            exit_code_on_error: 2,
        }
    }
}

impl ParseOptions {
    /// Load options from a TOML file.
    /// Returns defaults if the file doesn't exist or is invalid.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(options) => options,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse options from TOML text, failing on invalid input.
    pub fn from_toml_str(content: &str) -> Result<Self, CliError> {
        toml::from_str(content).map_err(|e| CliError::Config {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// The exit status to signal on failure, if any.
    pub fn exit_code(&self) -> Option<i32> {
        (self.exit_code_on_error != -1).then_some(self.exit_code_on_error)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorMode::Auto => "auto",
            ColorMode::Always => "always",
            ColorMode::Never => "never",
        })
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            other => Err(format!(
                "Invalid color mode '{}'. Use: auto, always, or never.",
                other
            )),
        }
    }
}

/// Settings shared by every handle of one command tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// Program name shown in help and reports
    pub name: String,
    /// Offer `--help` / `-h` on every command
    pub catch_help_markers: bool,
    /// Offer `--no-color` on every command
    pub catch_no_color_marker: bool,
    /// Hide inherited options in help unless `--help-all` is given
    pub hide_parent_command_options_on_help: bool,
    pub color: ColorMode,
    /// Upper bound on path readings during resolution
    pub max_command_variants: usize,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            catch_help_markers: true,
            catch_no_color_marker: true,
            hide_parent_command_options_on_help: true,
            color: ColorMode::Auto,
            max_command_variants: DEFAULT_MAX_COMMAND_VARIANTS,
        }
    }
}

impl CliSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.invoke);
        assert!(options.strict);
        assert!(!options.show_errors_on_help);
        assert!(!options.throw_command_not_found_error);
        assert_eq!(options.exit_code(), Some(2));
    }

    #[test]
    fn test_minus_one_means_no_exit() {
        let options = ParseOptions {
            exit_code_on_error: -1,
            ..Default::default()
        };
        assert_eq!(options.exit_code(), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let options =
            ParseOptions::from_toml_str("strict = false\nexit_code_on_error = 3\n").expect("parse");
        assert!(!options.strict);
        assert_eq!(options.exit_code(), Some(3));
        assert!(options.show_help);
        assert!(options.show_did_you_mean);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = ParseOptions::from_toml_str("strict = \"maybe\"").unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let options = ParseOptions::load_from_path(&temp.path().join("clitree.toml"));
        assert_eq!(options, ParseOptions::default());
    }

    #[test]
    fn test_load_valid_and_invalid_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("clitree.toml");

        let mut file = std::fs::File::create(&path).expect("create config");
        writeln!(file, "show_help_on_error = true\nshow_did_you_mean = false").expect("write");
        let options = ParseOptions::load_from_path(&path);
        assert!(options.show_help_on_error);
        assert!(!options.show_did_you_mean);

        std::fs::write(&path, "this is = not [toml").expect("overwrite");
        assert_eq!(ParseOptions::load_from_path(&path), ParseOptions::default());
    }

    #[test]
    fn test_color_mode_from_str() {
        assert_eq!("never".parse::<ColorMode>(), Ok(ColorMode::Never));
        assert!("sometimes".parse::<ColorMode>().is_err());
        assert_eq!(ColorMode::Always.to_string(), "always");
    }
}
