//! Integration tests for stagerun
//!
//! Each test builds a temporary working directory holding small shell scripts
//! at the fixed stage paths and runs the real binary against it.

#![cfg(unix)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a stagerun Command
fn stagerun() -> Command {
    cargo_bin_cmd!("stagerun")
}

/// Helper to create a temporary working directory
fn create_temp_workdir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write an executable stage script. Every script appends its name to
/// `calls.log` before running `body`, so tests can check invocation order.
fn write_stage(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    let content = format!("#!/bin/sh\necho {} >> calls.log\n{}\n", name, body);
    fs::write(&path, content).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
}

fn write_all_stages(dir: &Path, a: &str, b: &str, c: &str) {
    write_stage(dir, "stage_a", a);
    write_stage(dir, "stage_b", b);
    write_stage(dir, "stage_c", c);
}

fn calls(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_stagerun_help() {
        stagerun().arg("--help").assert().success();
    }

    #[test]
    fn test_stagerun_version() {
        stagerun()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        stagerun().arg("--bogus").assert().failure();
    }
}

// =============================================================================
// Stage Sequencing
// =============================================================================

mod sequencing {
    use super::*;

    #[test]
    fn test_all_stages_succeed() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "exit 0", "exit 0", "exit 0");

        stagerun()
            .current_dir(dir.path())
            .assert()
            .code(0)
            .stdout(predicate::str::contains("stage-a completed successfully"))
            .stdout(predicate::str::contains("stage-b completed successfully"))
            .stdout(predicate::str::contains("stage-c completed successfully"))
            .stdout(predicate::str::contains("All stages completed successfully"));

        assert_eq!(calls(dir.path()), vec!["stage_a", "stage_b", "stage_c"]);
    }

    #[test]
    fn test_stage_a_failure_skips_remaining_stages() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "exit 5", "exit 0", "exit 0");

        stagerun()
            .current_dir(dir.path())
            .assert()
            .code(5)
            .stdout(predicate::str::contains("Run aborted with exit code 5"));

        assert_eq!(calls(dir.path()), vec!["stage_a"]);
    }

    #[test]
    fn test_stage_b_failure_skips_stage_c() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "exit 0", "exit 7", "exit 0");

        stagerun().current_dir(dir.path()).assert().code(7);

        assert_eq!(calls(dir.path()), vec!["stage_a", "stage_b"]);
    }

    #[test]
    fn test_stage_c_failure_propagates_code() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "exit 0", "exit 0", "exit 3");

        stagerun().current_dir(dir.path()).assert().code(3);

        assert_eq!(calls(dir.path()), vec!["stage_a", "stage_b", "stage_c"]);
    }

    #[test]
    fn test_stage_b_terminated_is_not_retried() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "exit 0", "exit 143", "exit 0");

        stagerun().current_dir(dir.path()).assert().code(143);

        assert_eq!(calls(dir.path()), vec!["stage_a", "stage_b"]);
    }

    #[test]
    fn test_stage_without_shebang_runs_like_shell() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "exit 0", "exit 0", "exit 0");
        let bare = dir.path().join("stage_b");
        fs::write(&bare, "echo stage_b >> calls.log\nexit 0\n").unwrap();

        stagerun().current_dir(dir.path()).assert().code(0);

        assert_eq!(calls(dir.path()), vec!["stage_a", "stage_b", "stage_c"]);
    }

    #[test]
    fn test_abort_writes_nothing_to_stderr() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "exit 5", "exit 0", "exit 0");

        stagerun()
            .current_dir(dir.path())
            .assert()
            .code(5)
            .stderr(predicate::str::is_empty());
    }

    #[test]
    fn test_missing_stage_aborts_with_127() {
        let dir = create_temp_workdir();
        write_stage(dir.path(), "stage_a", "exit 0");
        write_stage(dir.path(), "stage_c", "exit 0");

        stagerun()
            .current_dir(dir.path())
            .assert()
            .code(127)
            .stdout(predicate::str::contains("stage-b could not run"))
            .stdout(predicate::str::contains("failed with exit code").not());

        assert_eq!(calls(dir.path()), vec!["stage_a"]);
    }
}

// =============================================================================
// Restart on Termination
// =============================================================================

mod restart {
    use super::*;

    #[test]
    fn test_stage_a_restarts_on_143_until_success() {
        let dir = create_temp_workdir();
        let counting = r#"n=$(cat count 2>/dev/null || echo 0)
n=$((n + 1))
echo $n > count
[ "$n" -lt 3 ] && exit 143
exit 0"#;
        write_all_stages(dir.path(), counting, "exit 0", "exit 0");

        stagerun()
            .current_dir(dir.path())
            .assert()
            .code(0)
            .stdout(predicate::str::contains("restarting in 2.0s"))
            .stdout(predicate::str::contains("(attempt 3)"))
            .stderr(predicate::str::is_empty());

        assert_eq!(
            calls(dir.path()),
            vec!["stage_a", "stage_a", "stage_a", "stage_b", "stage_c"]
        );
    }

    #[test]
    fn test_stage_a_killed_by_sigterm_is_restarted() {
        let dir = create_temp_workdir();
        let self_terminating = r#"if [ ! -f terminated ]; then
  touch terminated
  kill -TERM $$
  sleep 5
fi
exit 0"#;
        write_all_stages(dir.path(), self_terminating, "exit 0", "exit 0");

        stagerun().current_dir(dir.path()).assert().code(0);

        assert_eq!(
            calls(dir.path()),
            vec!["stage_a", "stage_a", "stage_b", "stage_c"]
        );
    }

    #[test]
    fn test_stage_a_new_code_after_restart_aborts() {
        let dir = create_temp_workdir();
        let flaky = r#"if [ ! -f restarted ]; then
  touch restarted
  exit 143
fi
exit 4"#;
        write_all_stages(dir.path(), flaky, "exit 0", "exit 0");

        stagerun().current_dir(dir.path()).assert().code(4);

        assert_eq!(calls(dir.path()), vec!["stage_a", "stage_a"]);
    }
}

// =============================================================================
// Child I/O
// =============================================================================

mod child_io {
    use super::*;

    #[test]
    fn test_child_output_passes_through() {
        let dir = create_temp_workdir();
        write_all_stages(
            dir.path(),
            "echo 'hello from a'\necho 'warning from a' >&2\nexit 0",
            "exit 0",
            "exit 0",
        );

        stagerun()
            .current_dir(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("hello from a"))
            .stderr(predicate::str::contains("warning from a"));
    }

    #[test]
    fn test_status_line_precedes_child_output() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "echo 'output of a'\nexit 0", "exit 0", "exit 0");

        let output = stagerun().current_dir(dir.path()).output().unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);

        let announced = stdout.find("stage-a...").unwrap();
        let child = stdout.find("output of a").unwrap();
        let completed = stdout.find("stage-a completed successfully").unwrap();
        assert!(announced < child);
        assert!(child < completed);
    }

    #[test]
    fn test_children_get_no_stdin() {
        let dir = create_temp_workdir();
        write_all_stages(
            dir.path(),
            "if read line; then exit 9; fi\nexit 0",
            "exit 0",
            "exit 0",
        );

        stagerun()
            .current_dir(dir.path())
            .write_stdin("unexpected input\n")
            .assert()
            .code(0);
    }

    #[test]
    fn test_verbose_shows_command_lines() {
        let dir = create_temp_workdir();
        write_all_stages(dir.path(), "exit 0", "exit 0", "exit 0");

        stagerun()
            .current_dir(dir.path())
            .arg("--verbose")
            .assert()
            .success()
            .stdout(predicate::str::contains("./stage_b"));
    }
}
