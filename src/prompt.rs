//! Prompt assembly: snippet loading, variable merging and template lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Map, Value};

use crate::error::ExitError;

/// Extension of snippet and prompt template files.
pub const SNIPPET_EXT: &str = "md";
/// Prefix applied to snippet-derived variable names.
pub const SNIPPET_PREFIX: &str = "base_";

/// Load every `*.md` file directly inside `dir` as `base_<stem>` → contents.
///
/// A missing directory contributes nothing.
pub fn load_snippets(dir: &Path) -> anyhow::Result<HashMap<String, String>> {
    let mut snippets = HashMap::new();
    if !dir.is_dir() {
        return Ok(snippets);
    }

    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(SNIPPET_EXT) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        snippets.insert(format!("{SNIPPET_PREFIX}{stem}"), contents);
    }

    Ok(snippets)
}

/// Parse caller-supplied variables; anything but a JSON object is fatal.
///
/// Values keep their JSON type; stringify with
/// [`variables_from_json`](crate::template::variables_from_json) before substituting.
pub fn parse_user_vars(json: &str) -> anyhow::Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ExitError::InvalidInput(format!("prompt variables are invalid JSON: {e}")))?;
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(
            ExitError::InvalidInput("prompt variables must be a JSON object".to_string()).into(),
        ),
    }
}

/// Merge action snippets, consumer snippets and explicit variables.
///
/// Later sources win: `<action>/prompts/base` < `<prompt>/base` < `user_vars`.
pub fn load_variables(
    action_path: &Path,
    prompt_path: &Path,
    user_vars: &str,
) -> anyhow::Result<Map<String, Value>> {
    let mut merged = Map::new();
    for dir in [action_path.join("prompts").join("base"), prompt_path.join("base")] {
        merged.extend(
            load_snippets(&dir)?
                .into_iter()
                .map(|(name, text)| (name, Value::String(text))),
        );
    }
    merged.extend(parse_user_vars(user_vars)?);
    Ok(merged)
}

/// Candidate template paths for `mode`, in lookup order.
pub fn prompt_candidates(mode: &str, prompt_path: &Path, action_path: &Path) -> [PathBuf; 2] {
    let file = format!("{mode}.{SNIPPET_EXT}");
    [
        prompt_path.join(&file),
        action_path.join("prompts").join(&file),
    ]
}

/// Find the template for `mode`, preferring the consumer's directory.
pub fn find_prompt_file(mode: &str, prompt_path: &Path, action_path: &Path) -> Option<PathBuf> {
    prompt_candidates(mode, prompt_path, action_path)
        .into_iter()
        .find(|p| p.is_file())
}
