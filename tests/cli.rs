use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const AMBIENT_ENV: &[&str] = &[
    "GITHUB_OUTPUT",
    "GITHUB_REPOSITORY",
    "EVENT_NAME",
    "INPUT_MODE",
    "INPUT_BOT_NAME",
    "COMMENT_BODY",
    "REVIEW_BODY",
    "ANTHROPIC_API_KEY",
    "OPENAI_API_KEY",
    "GEMINI_API_KEY",
    "AUTH_JSON",
    "OMO_CONFIG_JSON",
    "MODEL_PRESET",
    "PRIMARY_MODEL",
    "ORACLE_MODEL",
    "FAST_MODEL",
    "GIT_MASTER_COMMIT_FOOTER",
    "GIT_MASTER_INCLUDE_CO_AUTHORED_BY",
    "ENABLE_GIT_MASTER_SKILL",
    "ENABLE_PLAYWRIGHT_SKILL",
    "ENABLE_FRONTEND_UI_UX_SKILL",
    "ENABLED_PROVIDERS",
    "DISABLED_PROVIDERS",
];

fn sisyphus() -> Command {
    let mut cmd = Command::cargo_bin("sisyphus").unwrap();
    for var in AMBIENT_ENV {
        cmd.env_remove(var);
    }
    cmd
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn substitute_fills_template_from_stdin() {
    sisyphus()
        .args(["substitute", r#"{"name": "World", "count": 3}"#])
        .write_stdin("Hello {{ name }}! x{{count}} {{ missing }}")
        .assert()
        .success()
        .stdout("Hello World! x3 {{ missing }}\n");
}

#[test]
fn substitute_resolves_nested_references() {
    sisyphus()
        .args(["substitute", r#"{"outer": "[{{ inner }}]", "inner": "core"}"#])
        .write_stdin("{{ outer }}")
        .assert()
        .success()
        .stdout("[core]\n");
}

#[test]
fn substitute_rejects_non_object_variables() {
    sisyphus()
        .args(["substitute", "[1, 2]"])
        .write_stdin("x")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn vars_merges_with_precedence() {
    let root = tempfile::tempdir().unwrap();
    let action = root.path().join("action");
    let consumer = root.path().join("consumer");
    std::fs::create_dir_all(action.join("prompts/base")).unwrap();
    std::fs::create_dir_all(consumer.join("base")).unwrap();
    std::fs::write(action.join("prompts/base/intro.md"), "action intro").unwrap();
    std::fs::write(action.join("prompts/base/rules.md"), "action rules").unwrap();
    std::fs::write(consumer.join("base/intro.md"), "consumer intro").unwrap();

    let output = sisyphus()
        .arg("vars")
        .arg(&action)
        .arg(&consumer)
        .arg(r#"{"base_rules": "user rules", "extra": "x"}"#)
        .output()
        .unwrap();
    assert!(output.status.success());
    let vars: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(vars["base_intro"], "consumer intro");
    assert_eq!(vars["base_rules"], "user rules");
    assert_eq!(vars["extra"], "x");
}

#[test]
fn vars_prints_caller_values_with_their_json_type() {
    let root = tempfile::tempdir().unwrap();
    sisyphus()
        .arg("vars")
        .arg(root.path().join("missing-action"))
        .arg(root.path().join("missing-prompts"))
        .arg(r#"{"n": 3, "ok": false, "name": "x"}"#)
        .assert()
        .success()
        .stdout("{\"n\":3,\"name\":\"x\",\"ok\":false}\n");
}

#[test]
fn vars_defaults_to_no_user_variables() {
    let root = tempfile::tempdir().unwrap();
    sisyphus()
        .arg("vars")
        .arg(root.path().join("missing-action"))
        .arg(root.path().join("missing-prompts"))
        .assert()
        .success()
        .stdout("{}\n");
}

#[test]
fn prompt_prefers_consumer_template() {
    let root = tempfile::tempdir().unwrap();
    let action = root.path().join("action");
    let consumer = root.path().join("consumer");
    std::fs::create_dir_all(action.join("prompts")).unwrap();
    std::fs::create_dir_all(&consumer).unwrap();
    std::fs::write(action.join("prompts/review.md"), "built-in review").unwrap();
    std::fs::write(action.join("prompts/agent.md"), "built-in agent").unwrap();
    std::fs::write(consumer.join("review.md"), "custom review").unwrap();

    sisyphus()
        .arg("prompt")
        .arg(&action)
        .arg(&consumer)
        .arg("review")
        .assert()
        .success()
        .stdout("custom review\n");

    sisyphus()
        .arg("prompt")
        .arg(&action)
        .arg(&consumer)
        .arg("agent")
        .assert()
        .success()
        .stdout("built-in agent\n");
}

#[test]
fn prompt_missing_template_lists_tried_paths() {
    let root = tempfile::tempdir().unwrap();
    sisyphus()
        .arg("prompt")
        .arg(root.path().join("action"))
        .arg(root.path().join("consumer"))
        .arg("triage")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no prompt file found for mode 'triage'"))
        .stderr(predicate::str::contains("Tried:").count(2));
}

#[test]
fn prompt_inline_text_is_echoed() {
    sisyphus()
        .args(["prompt", "--prompt", "Do the thing"])
        .assert()
        .success()
        .stdout("Do the thing\n");
}

#[test]
fn detect_mode_writes_workflow_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("github_output");
    sisyphus()
        .arg("detect-mode")
        .env("EVENT_NAME", "pull_request")
        .env("GITHUB_OUTPUT", &out)
        .assert()
        .success()
        .stdout("Detected mode: review\n");
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "value=review\n");
}

#[test]
fn detect_mode_reads_comment_mentions() {
    sisyphus()
        .arg("detect-mode")
        .env("EVENT_NAME", "issue_comment")
        .env("INPUT_BOT_NAME", "dobbyphus")
        .env("COMMENT_BODY", "@dobbyphus please review this")
        .assert()
        .success()
        .stdout("Detected mode: review\n");

    sisyphus()
        .arg("detect-mode")
        .env("EVENT_NAME", "issue_comment")
        .env("INPUT_BOT_NAME", "dobbyphus")
        .env("COMMENT_BODY", "@dobbyphus fix the build")
        .assert()
        .success()
        .stdout("Detected mode: agent\n");
}

#[test]
fn detect_mode_honors_explicit_mode() {
    sisyphus()
        .args(["detect-mode", "--event-name", "workflow_dispatch", "--mode", "triage"])
        .assert()
        .success()
        .stdout("Detected mode: triage\n");
}

#[test]
fn config_writes_both_documents() {
    let dir = tempfile::tempdir().unwrap();
    let auth = dir.path().join("share/auth.json");
    let config = dir.path().join("config/oh-my-opencode.json");

    sisyphus()
        .arg("config")
        .arg("--auth-path")
        .arg(&auth)
        .arg("--config-path")
        .arg(&config)
        .env("ANTHROPIC_API_KEY", "sk-ant")
        .env("MODEL_PRESET", "fast")
        .env("ORACLE_MODEL", "custom/oracle")
        .env("ENABLE_PLAYWRIGHT_SKILL", "true")
        .env("GIT_MASTER_COMMIT_FOOTER", "false")
        .env("ENABLED_PROVIDERS", r#"["anthropic"]"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated auth:"))
        .stdout(predicate::str::contains("Generated config:"));

    let auth_doc = read_json(&auth);
    assert_eq!(auth_doc["anthropic"]["type"], "api");
    assert_eq!(auth_doc["anthropic"]["key"], "sk-ant");
    assert!(auth_doc.get("openai").is_none());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&auth).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    let config_doc = read_json(&config);
    assert_eq!(config_doc["agents"]["oracle"]["model"], "custom/oracle");
    assert_eq!(
        config_doc["disabled_skills"],
        serde_json::json!(["git-master", "frontend-ui-ux"])
    );
    assert_eq!(config_doc["git_master"], serde_json::json!({"commit_footer": false}));
    assert_eq!(config_doc["enabled_providers"], serde_json::json!(["anthropic"]));
}

#[test]
fn config_preserves_existing_and_applies_override() {
    let dir = tempfile::tempdir().unwrap();
    let auth = dir.path().join("auth.json");
    let config = dir.path().join("omo.json");
    std::fs::write(&config, r#"{"theme": "dark", "agents": {"custom": {"model": "m"}}}"#).unwrap();

    sisyphus()
        .arg("config")
        .arg("--auth-path")
        .arg(&auth)
        .arg("--config-path")
        .arg(&config)
        .env("OMO_CONFIG_JSON", r#"{"agents": {"explore": {"model": "override"}}}"#)
        .assert()
        .success();

    let doc = read_json(&config);
    assert_eq!(doc["theme"], "dark");
    assert_eq!(doc["agents"]["custom"]["model"], "m");
    assert_eq!(doc["agents"]["explore"]["model"], "override");
    assert!(doc["agents"]["Sisyphus"]["model"].is_string());
    // No credentials and no override: nothing to persist.
    assert!(!auth.exists());
}

#[test]
fn config_rejects_invalid_inputs_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let auth = dir.path().join("auth.json");
    let config = dir.path().join("omo.json");

    for (var, value) in [
        ("AUTH_JSON", "{not json"),
        ("AUTH_JSON", "[1]"),
        ("OMO_CONFIG_JSON", "\"string\""),
        ("ENABLED_PROVIDERS", r#"["ok", 1]"#),
        ("GIT_MASTER_COMMIT_FOOTER", "maybe"),
    ] {
        sisyphus()
            .arg("config")
            .arg("--auth-path")
            .arg(&auth)
            .arg("--config-path")
            .arg(&config)
            .env("ANTHROPIC_API_KEY", "sk-ant")
            .env(var, value)
            .assert()
            .code(2)
            .stderr(predicate::str::contains(var));
        assert!(!auth.exists(), "{var}={value}");
        assert!(!config.exists(), "{var}={value}");
    }
}

#[test]
fn config_rejects_corrupt_existing_document() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("omo.json");
    std::fs::write(&config, "[]").unwrap();

    sisyphus()
        .arg("config")
        .arg("--auth-path")
        .arg(dir.path().join("auth.json"))
        .arg("--config-path")
        .arg(&config)
        .assert()
        .code(2);
    assert_eq!(std::fs::read_to_string(&config).unwrap(), "[]");
}

#[test]
fn format_output_replays_stdin_stream() {
    let stream = [
        r#"{"type": "step_start", "part": {}}"#,
        r#"{"type": "tool_use", "part": {"tool": "bash", "state": {"input": {"command": "ls", "description": "List files"}, "output": "a\nb"}}}"#,
        r#"{"type": "text", "part": {"text": "All done"}}"#,
        "not json at all",
        "",
    ]
    .join("\n");

    sisyphus()
        .args(["format-output", "-"])
        .write_stdin(stream)
        .assert()
        .success()
        .stdout("::group::🔨 Bash: List files\n$ ls\na\nb\n::endgroup::\nAll done\nnot json at all\n");
}

#[test]
fn format_output_fails_when_agent_missing() {
    sisyphus()
        .args(["format-output", "hello", "--agent", "nonexistent-agent-xyz"])
        .assert()
        .failure();
}

#[test]
fn fetch_threads_rejects_bad_pr_number() {
    sisyphus()
        .args(["fetch-threads", "octo", "repo", "abc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid PR number: abc"));
}

#[test]
fn replay_requires_repository() {
    sisyphus()
        .args(["replay-commits", "abc123", "main"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GITHUB_REPOSITORY"));
}

#[test]
fn prompt_requires_arguments() {
    sisyphus()
        .arg("prompt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}
