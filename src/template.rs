//! Placeholder substitution for prompt templates.
//!
//! Templates reference variables as `{{ name }}`. Values may themselves
//! contain placeholders, so substitution runs repeatedly until the text stops
//! changing or [`TRANSFORM_LIMIT`] passes have run.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Maximum number of substitution passes.
pub const TRANSFORM_LIMIT: usize = 10;

pub fn var_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid placeholder regex"))
}

/// Outcome of iterating a transformation towards a fixpoint.
#[derive(Debug, PartialEq, Eq)]
pub enum Convergence<T> {
    /// A pass produced no change after `passes` passes.
    Settled { value: T, passes: usize },
    /// The pass budget ran out before the value settled.
    Exhausted { value: T },
}

impl<T> Convergence<T> {
    pub fn into_value(self) -> T {
        match self {
            Self::Settled { value, .. } | Self::Exhausted { value } => value,
        }
    }
}

/// Apply `step` until it returns its input unchanged or `limit` passes ran.
pub fn converge<T, F>(mut value: T, limit: usize, mut step: F) -> Convergence<T>
where
    T: PartialEq,
    F: FnMut(&T) -> T,
{
    for pass in 1..=limit {
        let next = step(&value);
        if next == value {
            return Convergence::Settled {
                value,
                passes: pass,
            };
        }
        value = next;
    }
    Convergence::Exhausted { value }
}

/// Run one substitution pass. Unknown names are left verbatim.
pub fn substitute_once(template: &str, variables: &HashMap<String, String>) -> String {
    var_pattern()
        .replace_all(template, |caps: &Captures| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Names of all placeholders present in `text`, sorted and deduplicated.
pub fn placeholders(text: &str) -> BTreeSet<String> {
    var_pattern()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Expand every resolvable placeholder in `template`.
///
/// Terminates on cyclic definitions; anything still unresolved after the
/// pass limit is reported as a warning and left in the output.
pub fn substitute(template: &str, variables: &HashMap<String, String>) -> String {
    match converge(template.to_string(), TRANSFORM_LIMIT, |text| {
        substitute_once(text, variables)
    }) {
        Convergence::Settled { value, .. } => value,
        Convergence::Exhausted { value } => {
            let unresolved = placeholders(&value);
            if !unresolved.is_empty() {
                tracing::warn!(
                    passes = TRANSFORM_LIMIT,
                    unresolved = ?unresolved,
                    "unresolved variables after {TRANSFORM_LIMIT} passes"
                );
            }
            value
        }
    }
}

/// Stringify a JSON object's values for use as substitution variables.
///
/// Strings are used as-is; every other value uses its JSON text.
pub fn variables_from_json(
    object: &serde_json::Map<String, serde_json::Value>,
) -> HashMap<String, String> {
    object
        .iter()
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect()
}
