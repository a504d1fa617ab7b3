//! Agent runtime configuration: credentials (`auth.json`) and agent
//! behavior (`oh-my-opencode.json`).
//!
//! Both documents are built by deep-merging layers in a fixed order, so a
//! workflow can start from computed defaults and patch any field with a raw
//! JSON override.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Map, Value};

/// Credential store, relative to the home directory.
pub const AUTH_FILE: &str = ".local/share/opencode/auth.json";
/// Agent behavior config, relative to the home directory.
pub const AGENT_CONFIG_FILE: &str = ".config/opencode/oh-my-opencode.json";

/// Nesting depth beyond which [`deep_merge`] stops recursing and lets the
/// override replace the subtree wholesale.
pub const MAX_MERGE_DEPTH: usize = 64;

/// Models assigned to each routing role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub primary: &'static str,
    pub oracle: &'static str,
    pub fast: &'static str,
}

pub const DEFAULT_PRESET: &str = "balanced";

const PRESETS: &[(&str, Preset)] = &[
    (
        "balanced",
        Preset {
            primary: "anthropic/claude-sonnet-4-5",
            oracle: "anthropic/claude-sonnet-4-5",
            fast: "anthropic/claude-haiku-4-5",
        },
    ),
    (
        "fast",
        Preset {
            primary: "anthropic/claude-haiku-4-5",
            oracle: "anthropic/claude-haiku-4-5",
            fast: "anthropic/claude-haiku-4-5",
        },
    ),
    (
        "powerful",
        Preset {
            primary: "anthropic/claude-opus-4-5",
            oracle: "openai/gpt-5.2",
            fast: "anthropic/claude-sonnet-4-5",
        },
    ),
];

/// Agent that receives the primary model.
pub const PRIMARY_AGENT: &str = "Sisyphus";
/// Agent that receives the oracle model.
pub const ORACLE_AGENT: &str = "oracle";
/// Auxiliary agents that all share the fast model.
pub const FAST_AGENTS: &[&str] = &["explore", "librarian", "document-writer", "multimodal-looker"];

/// Built-in skills that stay disabled unless explicitly enabled.
pub const GIT_MASTER_SKILL: &str = "git-master";
pub const PLAYWRIGHT_SKILL: &str = "playwright";
pub const FRONTEND_UI_UX_SKILL: &str = "frontend-ui-ux";

/// Input validation failures. All of these are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is invalid JSON: {source}")]
    InvalidJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{name} must be a JSON object")]
    NotAnObject { name: String },

    #[error("{name} must be a JSON array of strings")]
    NotStringArray { name: String },

    #[error("{name} must be a boolean (true/false), got {value:?}")]
    InvalidBool { name: String, value: String },
}

/// Look up a preset by name, falling back to [`DEFAULT_PRESET`].
pub fn preset(name: &str) -> Preset {
    PRESETS
        .iter()
        .find(|(n, _)| *n == name)
        .or_else(|| PRESETS.iter().find(|(n, _)| *n == DEFAULT_PRESET))
        .map(|(_, p)| *p)
        .unwrap_or(PRESETS[0].1)
}

/// Recursively merge `overlay` onto `base`.
///
/// Objects merge key by key; every other value kind (arrays included) is
/// replaced wholesale by the overlay.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    merge_at_depth(base, overlay, 0)
}

fn merge_at_depth(base: &Value, overlay: &Value, depth: usize) -> Value {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) if depth < MAX_MERGE_DEPTH => {
            let mut merged = b.clone();
            for (key, value) in o {
                let next = match merged.get(key) {
                    Some(existing) => merge_at_depth(existing, value, depth + 1),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

/// Parse an optional JSON-object input. Empty or absent means "not provided".
pub fn parse_object(name: &str, raw: Option<&str>) -> Result<Option<Map<String, Value>>, ConfigError> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw).map_err(|source| ConfigError::InvalidJson {
        name: name.to_string(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(ConfigError::NotAnObject {
            name: name.to_string(),
        }),
    }
}

/// Parse a provider allow/deny list: a JSON array of strings.
pub fn parse_provider_list(raw: &str, name: &str) -> Result<Vec<String>, ConfigError> {
    let value: Value = serde_json::from_str(raw).map_err(|source| ConfigError::InvalidJson {
        name: name.to_string(),
        source,
    })?;
    let not_strings = || ConfigError::NotStringArray {
        name: name.to_string(),
    };
    value
        .as_array()
        .ok_or_else(not_strings)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(not_strings))
        .collect()
}

/// Parse an optional boolean flag, keeping "not set" distinct from `false`.
pub fn parse_flag(name: &str, raw: Option<&str>) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = non_empty(raw.map(str::trim)) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidBool {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Auth document
// ---------------------------------------------------------------------------

fn api_entry(key: &str) -> Value {
    serde_json::json!({ "type": "api", "key": key })
}

/// Credential entries for each non-empty key, by provider name.
pub fn generate_auth(
    anthropic_key: Option<&str>,
    openai_key: Option<&str>,
    gemini_key: Option<&str>,
) -> Map<String, Value> {
    let mut auth = Map::new();
    for (provider, key) in [
        ("anthropic", anthropic_key),
        ("openai", openai_key),
        ("google", gemini_key),
    ] {
        if let Some(key) = non_empty(key) {
            auth.insert(provider.to_string(), api_entry(key));
        }
    }
    auth
}

/// Computed credentials with `auth_json` deep-merged on top.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthDocument {
    pub value: Map<String, Value>,
    /// Whether the caller supplied an override (possibly `{}`).
    pub override_provided: bool,
}

impl AuthDocument {
    /// Persist only when there is something to say.
    pub fn should_persist(&self) -> bool {
        !self.value.is_empty() || self.override_provided
    }
}

pub fn build_auth(
    anthropic_key: Option<&str>,
    openai_key: Option<&str>,
    gemini_key: Option<&str>,
    auth_json: Option<&str>,
) -> Result<AuthDocument, ConfigError> {
    let base = Value::Object(generate_auth(anthropic_key, openai_key, gemini_key));
    let overlay = parse_object("AUTH_JSON", auth_json)?;
    let override_provided = overlay.is_some();
    let merged = match overlay {
        Some(o) => deep_merge(&base, &Value::Object(o)),
        None => base,
    };
    Ok(AuthDocument {
        value: into_object(merged),
        override_provided,
    })
}

// ---------------------------------------------------------------------------
// Agent behavior document
// ---------------------------------------------------------------------------

/// Per-role model overrides; empty strings count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelOverrides<'a> {
    pub primary: Option<&'a str>,
    pub oracle: Option<&'a str>,
    pub fast: Option<&'a str>,
}

/// Final model per role after applying overrides to a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    pub primary: String,
    pub oracle: String,
    pub fast: String,
}

pub fn resolve_models(preset_name: &str, overrides: ModelOverrides<'_>) -> ModelSet {
    let p = preset(preset_name);
    let pick = |o: Option<&str>, fallback: &str| non_empty(o).unwrap_or(fallback).to_string();
    ModelSet {
        primary: pick(overrides.primary, p.primary),
        oracle: pick(overrides.oracle, p.oracle),
        fast: pick(overrides.fast, p.fast),
    }
}

/// Which built-in skills were explicitly enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillToggles {
    pub git_master: bool,
    pub playwright: bool,
    pub frontend_ui_ux: bool,
}

impl SkillToggles {
    pub fn disabled(&self) -> Vec<&'static str> {
        [
            (GIT_MASTER_SKILL, self.git_master),
            (PLAYWRIGHT_SKILL, self.playwright),
            (FRONTEND_UI_UX_SKILL, self.frontend_ui_ux),
        ]
        .into_iter()
        .filter(|(_, enabled)| !enabled)
        .map(|(name, _)| name)
        .collect()
    }
}

/// git-master behavior flags; `None` means the input was not provided.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitMasterFlags {
    pub commit_footer: Option<bool>,
    pub include_co_authored_by: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct AgentConfigInputs<'a> {
    pub preset: &'a str,
    pub models: ModelOverrides<'a>,
    pub skills: SkillToggles,
    pub git_master: GitMasterFlags,
    pub enabled_providers: Option<Vec<String>>,
    pub disabled_providers: Option<Vec<String>>,
}

/// Defaults layer for the agent behavior document.
pub fn generate_agent_config(inputs: &AgentConfigInputs<'_>) -> Map<String, Value> {
    let models = resolve_models(inputs.preset, inputs.models);

    let mut agents = Map::new();
    agents.insert(PRIMARY_AGENT.to_string(), serde_json::json!({ "model": models.primary }));
    agents.insert(ORACLE_AGENT.to_string(), serde_json::json!({ "model": models.oracle }));
    for agent in FAST_AGENTS {
        agents.insert((*agent).to_string(), serde_json::json!({ "model": models.fast }));
    }

    let mut config = Map::new();
    config.insert("agents".to_string(), Value::Object(agents));

    let disabled = inputs.skills.disabled();
    if !disabled.is_empty() {
        config.insert("disabled_skills".to_string(), serde_json::json!(disabled));
    }

    let mut git_master = Map::new();
    if let Some(v) = inputs.git_master.commit_footer {
        git_master.insert("commit_footer".to_string(), Value::Bool(v));
    }
    if let Some(v) = inputs.git_master.include_co_authored_by {
        git_master.insert("include_co_authored_by".to_string(), Value::Bool(v));
    }
    if !git_master.is_empty() {
        config.insert("git_master".to_string(), Value::Object(git_master));
    }

    if let Some(ref providers) = inputs.enabled_providers {
        config.insert("enabled_providers".to_string(), serde_json::json!(providers));
    }
    if let Some(ref providers) = inputs.disabled_providers {
        config.insert("disabled_providers".to_string(), serde_json::json!(providers));
    }

    config
}

/// Layer existing document < defaults < raw override.
pub fn build_agent_config(
    existing: Option<Map<String, Value>>,
    inputs: &AgentConfigInputs<'_>,
    raw_override: Option<&str>,
) -> Result<Map<String, Value>, ConfigError> {
    let overlay = parse_object("OMO_CONFIG_JSON", raw_override)?;

    let mut doc = Value::Object(existing.unwrap_or_default());
    doc = deep_merge(&doc, &Value::Object(generate_agent_config(inputs)));
    if let Some(o) = overlay {
        doc = deep_merge(&doc, &Value::Object(o));
    }
    Ok(into_object(doc))
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

pub fn default_auth_path() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?.join(AUTH_FILE))
}

pub fn default_agent_config_path() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?.join(AGENT_CONFIG_FILE))
}

/// Read a previously persisted document. A file that exists but is not a
/// JSON object is an error.
pub fn read_existing(path: &Path) -> anyhow::Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path.display().to_string();
    let value: Value = serde_json::from_str(&contents)
        .map_err(|source| ConfigError::InvalidJson { name: name.clone(), source })?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(ConfigError::NotAnObject { name }.into()),
    }
}

/// Write `doc` as pretty JSON, creating parent directories.
pub fn write_document(path: &Path, doc: &Map<String, Value>) -> anyhow::Result<()> {
    write_json(path, doc, &std::fs::OpenOptions::new())
}

/// Write the credential store and restrict it to owner read/write.
///
/// A new file is created 0600; an existing one is tightened afterwards.
pub fn write_auth(path: &Path, doc: &Map<String, Value>) -> anyhow::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    write_json(path, doc, &options)?;
    restrict_to_owner(path)
}

fn write_json(
    path: &Path,
    doc: &Map<String, Value>,
    options: &std::fs::OpenOptions,
) -> anyhow::Result<()> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut text = serde_json::to_string_pretty(doc).context("serializing config")?;
    text.push('\n');
    let mut file = options
        .clone()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("writing {}", path.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("writing {}", path.display()))
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("setting permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn deep_merge_is_right_biased_per_key() {
        let merged = deep_merge(&json!({"a": {"x": 1, "y": 2}}), &json!({"a": {"y": 3}}));
        assert_eq!(merged, json!({"a": {"x": 1, "y": 3}}));
    }

    #[test]
    fn deep_merge_replaces_arrays() {
        let merged = deep_merge(&json!({"a": [1, 2]}), &json!({"a": [3]}));
        assert_eq!(merged, json!({"a": [3]}));
    }

    #[test]
    fn deep_merge_scalar_replaces_object() {
        let merged = deep_merge(&json!({"a": {"x": 1}, "b": 1}), &json!({"a": null, "c": 2}));
        assert_eq!(merged, json!({"a": null, "b": 1, "c": 2}));
    }

    #[test]
    fn deep_merge_stops_recursing_at_depth_limit() {
        let mut base = json!({"leaf": 1});
        let mut overlay = json!({"other": 2});
        for _ in 0..MAX_MERGE_DEPTH + 4 {
            base = json!({ "n": base });
            overlay = json!({ "n": overlay });
        }
        let merged = deep_merge(&base, &overlay);
        let mut cursor = &merged;
        while let Some(next) = cursor.get("n") {
            cursor = next;
        }
        assert_eq!(cursor, &json!({"other": 2}));
    }

    #[test]
    fn generate_auth_empty_when_no_keys() {
        assert!(generate_auth(None, None, None).is_empty());
        assert!(generate_auth(Some(""), Some(""), None).is_empty());
    }

    #[test]
    fn generate_auth_all_providers() {
        let auth = generate_auth(Some("ant"), Some("oai"), Some("gem"));
        assert_eq!(
            Value::Object(auth),
            json!({
                "anthropic": {"type": "api", "key": "ant"},
                "openai": {"type": "api", "key": "oai"},
                "google": {"type": "api", "key": "gem"},
            })
        );
    }

    #[test]
    fn build_auth_merges_override() {
        let doc = build_auth(
            Some("ant"),
            Some("oai"),
            None,
            Some(r#"{"openai": {"key": "override"}}"#),
        )
        .unwrap();
        assert_eq!(
            Value::Object(doc.value),
            json!({
                "anthropic": {"type": "api", "key": "ant"},
                "openai": {"type": "api", "key": "override"},
            })
        );
    }

    #[test]
    fn build_auth_persistence_rules() {
        assert!(!build_auth(None, None, None, None).unwrap().should_persist());
        assert!(!build_auth(None, None, None, Some("")).unwrap().should_persist());
        assert!(build_auth(None, None, None, Some("{}")).unwrap().should_persist());
        assert!(build_auth(Some("ant"), None, None, None).unwrap().should_persist());
    }

    #[test]
    fn build_auth_rejects_bad_override() {
        assert!(matches!(
            build_auth(None, None, None, Some("not-json")),
            Err(ConfigError::InvalidJson { .. })
        ));
        assert!(matches!(
            build_auth(None, None, None, Some("[1]")),
            Err(ConfigError::NotAnObject { .. })
        ));
    }

    #[test]
    fn provider_list_validation() {
        assert_eq!(
            parse_provider_list(r#"["anthropic", "openai"]"#, "ENABLED_PROVIDERS").unwrap(),
            vec!["anthropic", "openai"]
        );
        let err = parse_provider_list("not-json", "ENABLED_PROVIDERS").unwrap_err();
        assert!(err.to_string().contains("ENABLED_PROVIDERS is invalid JSON"));
        let err = parse_provider_list(r#"{"anthropic": true}"#, "ENABLED_PROVIDERS").unwrap_err();
        assert!(err.to_string().contains("must be a JSON array of strings"));
        let err = parse_provider_list("[1]", "ENABLED_PROVIDERS").unwrap_err();
        assert!(err.to_string().contains("must be a JSON array of strings"));
    }

    #[test]
    fn flags_distinguish_unset_from_false() {
        assert_eq!(parse_flag("X", None).unwrap(), None);
        assert_eq!(parse_flag("X", Some("")).unwrap(), None);
        assert_eq!(parse_flag("X", Some("false")).unwrap(), Some(false));
        assert_eq!(parse_flag("X", Some("TRUE")).unwrap(), Some(true));
        assert!(parse_flag("X", Some("maybe")).is_err());
    }

    #[test]
    fn unknown_preset_falls_back_to_balanced() {
        assert_eq!(preset("no-such-preset"), preset(DEFAULT_PRESET));
        let models = resolve_models("no-such-preset", ModelOverrides::default());
        assert_eq!(models.primary, "anthropic/claude-sonnet-4-5");
        assert_eq!(models.fast, "anthropic/claude-haiku-4-5");
    }

    #[test]
    fn overrides_beat_preset() {
        let models = resolve_models(
            "powerful",
            ModelOverrides {
                primary: Some("custom/primary"),
                oracle: Some(""),
                fast: None,
            },
        );
        assert_eq!(models.primary, "custom/primary");
        assert_eq!(models.oracle, "openai/gpt-5.2");
        assert_eq!(models.fast, "anthropic/claude-sonnet-4-5");
    }

    #[test]
    fn fast_roles_share_fast_model() {
        let config = generate_agent_config(&AgentConfigInputs {
            preset: "balanced",
            models: ModelOverrides {
                fast: Some("custom/fast"),
                ..Default::default()
            },
            ..Default::default()
        });
        for agent in FAST_AGENTS {
            assert_eq!(config["agents"][*agent]["model"], "custom/fast");
        }
        assert_eq!(config["agents"]["Sisyphus"]["model"], "anthropic/claude-sonnet-4-5");
    }

    #[test]
    fn skills_disabled_by_default() {
        let config = generate_agent_config(&AgentConfigInputs::default());
        assert_eq!(
            config["disabled_skills"],
            json!(["git-master", "playwright", "frontend-ui-ux"])
        );
        assert!(!config.contains_key("git_master"));
    }

    #[test]
    fn skills_all_enabled_omits_array() {
        let config = generate_agent_config(&AgentConfigInputs {
            skills: SkillToggles {
                git_master: true,
                playwright: true,
                frontend_ui_ux: true,
            },
            ..Default::default()
        });
        assert!(!config.contains_key("disabled_skills"));
    }

    #[test]
    fn skills_partially_enabled() {
        let config = generate_agent_config(&AgentConfigInputs {
            skills: SkillToggles {
                git_master: true,
                playwright: false,
                frontend_ui_ux: true,
            },
            ..Default::default()
        });
        assert_eq!(config["disabled_skills"], json!(["playwright"]));
    }

    #[test]
    fn git_master_flags_only_when_provided() {
        let config = generate_agent_config(&AgentConfigInputs {
            git_master: GitMasterFlags {
                commit_footer: None,
                include_co_authored_by: Some(false),
            },
            ..Default::default()
        });
        assert_eq!(config["git_master"], json!({"include_co_authored_by": false}));
    }

    #[test]
    fn build_agent_config_layers_in_order() {
        let existing = obj(json!({
            "agents": {"custom": {"model": "keep/me"}, "oracle": {"model": "old"}},
            "theme": "dark",
        }));
        let doc = build_agent_config(
            Some(existing),
            &AgentConfigInputs {
                preset: "fast",
                ..Default::default()
            },
            Some(r#"{"agents": {"oracle": {"model": "forced"}}, "disabled_skills": []}"#),
        )
        .unwrap();

        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc["agents"]["custom"]["model"], "keep/me");
        assert_eq!(doc["agents"]["oracle"]["model"], "forced");
        assert_eq!(doc["agents"]["Sisyphus"]["model"], "anthropic/claude-haiku-4-5");
        assert_eq!(doc["disabled_skills"], json!([]));
    }

    #[test]
    fn build_agent_config_rejects_non_object_override() {
        let err = build_agent_config(None, &AgentConfigInputs::default(), Some("[]")).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject { .. }));
    }

    #[test]
    fn read_existing_handles_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(read_existing(&path).unwrap().is_none());

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(read_existing(&path).is_err());

        std::fs::write(&path, "{broken").unwrap();
        assert!(read_existing(&path).is_err());

        std::fs::write(&path, r#"{"a": 1}"#).unwrap();
        assert_eq!(read_existing(&path).unwrap().unwrap()["a"], 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_auth_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/auth.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_auth(&path, &obj(json!({"anthropic": {"type": "api", "key": "k"}}))).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(read_existing(&path).unwrap().unwrap()["anthropic"]["key"], "k");
    }

    #[cfg(unix)]
    #[test]
    fn new_auth_file_is_created_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("share/opencode/auth.json");

        write_auth(&path, &obj(json!({"openai": {"type": "api", "key": "s"}}))).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(read_existing(&path).unwrap().unwrap()["openai"]["key"], "s");
    }

    #[test]
    fn rewriting_a_document_truncates_old_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opencode.json");
        std::fs::write(&path, format!("{{\"pad\": \"{}\"}}", "x".repeat(200))).unwrap();

        write_document(&path, &obj(json!({"model": "m"}))).unwrap();

        assert_eq!(
            read_existing(&path).unwrap().unwrap(),
            obj(json!({"model": "m"}))
        );
    }
}
