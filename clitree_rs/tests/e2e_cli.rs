//! End-to-End CLI Tests for clitree-demo
//!
//! Drives the demo binary the way a user would: real argv, real process
//! environment, real exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command pointing to the demo binary
fn demo() -> Command {
    let mut cmd = cargo_bin_cmd!("clitree-demo");
    cmd.env_remove("CLITREE_DEMO_PROFILE")
        .env_remove("CLITREE_DEMO_OPTIONS");
    cmd
}

// ============================================
// Resolution and invocation
// ============================================

mod invocation {
    use super::*;

    #[test]
    fn runs_leaf_command() {
        demo()
            .args(["init", "my-project", "-f"])
            .assert()
            .success()
            .stdout(predicate::str::contains("initialized my-project [dev] (forced)"));
    }

    #[test]
    fn selects_longest_command_path() {
        demo()
            .args(["do", "something", "regular", "-t", "x", "thing"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("do something regular "))
            .stdout(predicate::str::contains(r#""to_do":"x""#))
            .stdout(predicate::str::contains(r#""what":"thing""#));
    }

    #[test]
    fn collects_overflow_and_transfer() {
        demo()
            .args(["run", "build", "test", "-v", "--count", "2", "--", "--release"])
            .assert()
            .success()
            .stdout(predicate::str::contains("running build --release"))
            .stdout(predicate::str::contains("running test --release"))
            .stdout(predicate::function(|out: &str| {
                out.matches("running build").count() == 2
            }));
    }

    #[test]
    fn empty_overflow_binds_as_empty_list() {
        demo()
            .args(["run", "-v"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn compound_flags_expand() {
        demo()
            .args(["run", "a", "-vc", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("running a"));
    }

    #[test]
    fn action_errors_exit_with_one() {
        demo()
            .arg("fail")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("the fail command failed"));
    }
}

// ============================================
// Environment-bound arguments
// ============================================

mod environment {
    use super::*;

    #[test]
    fn environment_overrides_default() {
        demo()
            .env("CLITREE_DEMO_PROFILE", "prod")
            .args(["init", "app"])
            .assert()
            .success()
            .stdout(predicate::str::contains("initialized app [prod]"));
    }

    #[test]
    fn command_line_overrides_environment() {
        demo()
            .env("CLITREE_DEMO_PROFILE", "prod")
            .args(["init", "app", "--profile", "staging"])
            .assert()
            .success()
            .stdout(predicate::str::contains("initialized app [staging]"));
    }
}

// ============================================
// Failure reports
// ============================================

mod failures {
    use super::*;

    #[test]
    fn missing_required_positional() {
        demo()
            .arg("init")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid or missing arguments"))
            .stderr(predicate::str::contains("<name>"))
            .stderr(predicate::str::contains("required"));
    }

    #[test]
    fn unknown_flag_is_reported() {
        demo()
            .args(["init", "app", "--bogus"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("--bogus"))
            .stderr(predicate::str::contains("Unknown flag or argument"));
    }

    #[test]
    fn value_transform_errors_are_reported() {
        demo()
            .args(["run", "a", "--count", "abc"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("'abc' is not a positive number"));
    }

    #[test]
    fn every_problem_is_reported_together() {
        demo()
            .args(["init", "--bogus"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid or missing arguments"))
            .stderr(predicate::str::contains("<name>"))
            .stderr(predicate::str::contains("Unrecognized command sequence"))
            .stderr(predicate::str::contains("--bogus"));
    }

    #[test]
    fn mistyped_command_gets_a_suggestion() {
        demo()
            .arg("int")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Unexpected positional value"))
            .stderr(predicate::str::contains("Did you mean?"))
            .stderr(predicate::str::contains("clitree-demo init"));
    }
}

// ============================================
// Help
// ============================================

mod help {
    use super::*;

    #[test]
    fn root_help_lists_commands() {
        demo()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage clitree-demo"))
            .stdout(predicate::str::contains("Commands"))
            .stdout(predicate::str::contains("init"))
            .stdout(predicate::str::contains("Create a new project"));
    }

    #[test]
    fn menu_command_shows_help() {
        demo()
            .args(["do", "something"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Things to do"))
            .stdout(predicate::str::contains("regular"));
    }

    #[test]
    fn help_hides_inherited_options_unless_asked() {
        demo()
            .args(["init", "-h"])
            .assert()
            .success()
            .stdout(predicate::str::contains("<name>"))
            .stdout(predicate::str::contains("--profile").not());

        demo()
            .args(["init", "--help-all"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--profile | -p"));
    }
}

// ============================================
// Parse options file
// ============================================

mod options_file {
    use super::*;

    #[test]
    fn lenient_options_allow_extra_positionals() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("clitree.toml");
        std::fs::write(&path, "strict = false\n").expect("write options");

        demo()
            .env("CLITREE_DEMO_OPTIONS", &path)
            .args(["init", "app", "extra"])
            .assert()
            .success()
            .stdout(predicate::str::contains("initialized app"));
    }

    #[test]
    fn exit_code_can_be_disabled() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("clitree.toml");
        std::fs::write(&path, "exit_code_on_error = -1\n").expect("write options");

        demo()
            .env("CLITREE_DEMO_OPTIONS", &path)
            .arg("init")
            .assert()
            .success()
            .stderr(predicate::str::contains("required"));
    }
}
