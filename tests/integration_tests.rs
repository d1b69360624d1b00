//! Integration tests for the lipcoder CLI.
//!
//! Only offline subcommands are exercised; `edit` is driven up to the point
//! where it would call the completion service.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn lipcoder() -> Command {
    let mut cmd = cargo_bin_cmd!("lipcoder");
    cmd.env_remove("LIPCODER_MODEL")
        .env_remove("LIPCODER_ENDPOINT")
        .env_remove("RUST_LOG");
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

fn write_ollama_config(dir: &TempDir) {
    let config_dir = dir.path().join(".lipcoder");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("lipcoder.toml"),
        "[llm]\nprovider = \"ollama\"\nmodel = \"qwen2.5-coder\"\nendpoint = \"http://127.0.0.1:9\"\n",
    )
    .unwrap();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        lipcoder()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("edit"))
            .stdout(predicate::str::contains("diff"))
            .stdout(predicate::str::contains("context"));
    }

    #[test]
    fn test_version() {
        lipcoder()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("lipcoder"));
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        lipcoder().arg("frobnicate").assert().failure();
    }
}

// =============================================================================
// Diff Tests
// =============================================================================

mod diff_command {
    use super::*;

    #[test]
    fn test_docstring_addition_report() {
        let dir = create_temp_project();
        let original = dir.path().join("before.py");
        let modified = dir.path().join("after.py");
        fs::write(&original, "def f():\n    pass\n").unwrap();
        fs::write(&modified, "def f():\n    \"\"\"doc\"\"\"\n    pass\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["diff", "before.py", "after.py", "-i", "add a docstring"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added 1 line"))
            .stdout(predicate::str::contains("addition"))
            .stdout(predicate::str::contains("+     \"\"\"doc\"\"\""));
    }

    #[test]
    fn test_identical_files_report_no_changes() {
        let dir = create_temp_project();
        let file = dir.path().join("same.py");
        fs::write(&file, "x = 1\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["diff", "same.py", "same.py"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No changes"));
    }

    #[test]
    fn test_json_output() {
        let dir = create_temp_project();
        fs::write(dir.path().join("a.py"), "def f():\n    return 1\n").unwrap();
        fs::write(
            dir.path().join("b.py"),
            "def f():\n    return 1\n\nclass TestF:\n    def test_one(self):\n        assert f() == 1\n",
        )
        .unwrap();

        let output = lipcoder()
            .current_dir(dir.path())
            .args(["diff", "a.py", "b.py", "--json", "-i", "write a test for f"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["change_kind"], "test_addition");
        assert_eq!(value["removed_count"], 0);
        assert_eq!(value["affected_names"][0], "TestF");
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = create_temp_project();
        lipcoder()
            .current_dir(dir.path())
            .args(["diff", "nope.py", "nada.py"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read"));
    }
}

// =============================================================================
// Context Tests
// =============================================================================

mod context_command {
    use super::*;

    #[test]
    fn test_small_file_uses_document_scope() {
        let dir = create_temp_project();
        fs::write(dir.path().join("small.py"), "def f():\n    return 1\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["context", "small.py", "--line", "2", "-i", "add a docstring"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Scope:              document"))
            .stdout(predicate::str::contains("Inside function:    yes"))
            .stdout(predicate::str::contains("return 1"));
    }

    #[test]
    fn test_large_file_uses_window() {
        let dir = create_temp_project();
        let text: String = (0..10_000)
            .map(|i| format!("value_{i:05} = {i:05}  # padding\n"))
            .collect();
        fs::write(dir.path().join("big.py"), text).unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["context", "big.py", "--line", "5000"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Partial:            true"))
            .stdout(predicate::str::contains("of 10000 total lines]"));
    }

    #[test]
    fn test_line_out_of_range_fails() {
        let dir = create_temp_project();
        fs::write(dir.path().join("small.py"), "x = 1\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["context", "small.py", "--line", "40"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("outside the file"));
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config_command {
    use super::*;

    #[test]
    fn test_show_without_file_uses_defaults() {
        let dir = create_temp_project();
        lipcoder()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No lipcoder.toml found"))
            .stdout(predicate::str::contains("model = \"gpt-4o-mini\""));
    }

    #[test]
    fn test_init_then_validate() {
        let dir = create_temp_project();
        lipcoder()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created lipcoder.toml"));
        assert!(dir.path().join(".lipcoder/lipcoder.toml").exists());

        lipcoder()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid."));

        lipcoder()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_validate_reports_warnings() {
        let dir = create_temp_project();
        let config_dir = dir.path().join(".lipcoder");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("lipcoder.toml"), "[llm]\ntemperature = 7.0\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("temperature"));
    }

    #[test]
    fn test_model_env_override_is_shown() {
        let dir = create_temp_project();
        lipcoder()
            .current_dir(dir.path())
            .env("LIPCODER_MODEL", "env-model")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("model = \"env-model\""));
    }
}

// =============================================================================
// Edit Tests (offline failure paths)
// =============================================================================

mod edit_command {
    use super::*;

    #[test]
    fn test_blank_instruction_is_rejected_before_any_request() {
        let dir = create_temp_project();
        write_ollama_config(&dir);
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["edit", "a.py", "-i", "   "])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Instruction is empty"));
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "x = 1\n");
    }

    #[test]
    fn test_missing_api_key_fails() {
        let dir = create_temp_project();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .env_remove("OPENAI_API_KEY")
            .args(["edit", "a.py", "-i", "rename x to y"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("API key"));
    }

    #[test]
    fn test_missing_api_key_names_configured_variable() {
        let dir = create_temp_project();
        let config_dir = dir.path().join(".lipcoder");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("lipcoder.toml"),
            "[llm]\napi_key_env = \"LIPCODER_TEST_KEY\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .env_remove("LIPCODER_TEST_KEY")
            .args(["edit", "a.py", "-i", "rename x to y"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("$LIPCODER_TEST_KEY"));
    }

    #[test]
    fn test_unreachable_service_leaves_file_unchanged() {
        let dir = create_temp_project();
        write_ollama_config(&dir);
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["edit", "a.py", "-i", "rename x to y", "--yes"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Code transformation failed"));
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "x = 1\n");
    }

    #[test]
    fn test_bad_selection_fails() {
        let dir = create_temp_project();
        write_ollama_config(&dir);
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        lipcoder()
            .current_dir(dir.path())
            .args(["edit", "a.py", "-i", "change it", "--select", "3"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Expected START:END"));
    }
}
