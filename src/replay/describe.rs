//! Pull request title and body for a set of replayed commits.

use std::fmt::Write as _;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use super::ReplayedCommit;
use crate::subprocess::Tool;

/// Longest title accepted from the agent, in characters.
pub const MAX_TITLE_CHARS: usize = 256;
pub const DEFAULT_DESCRIBE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrText {
    pub title: String,
    pub body: String,
}

/// Writes a pull request description for several commits.
pub trait Describe {
    fn describe(&self, commits: &[ReplayedCommit], issue: Option<&str>) -> Option<PrText>;
}

/// Asks the coding agent to write the title and body into two files.
#[derive(Debug, Clone)]
pub struct AgentDescriber {
    program: String,
    timeout: Duration,
}

impl AgentDescriber {
    pub fn new(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            timeout,
        }
    }

    fn prompt(
        commits: &[ReplayedCommit],
        issue: Option<&str>,
        title_path: &str,
        body_path: &str,
    ) -> String {
        let mut prompt = String::from(
            "Write a pull request title and description for the following commits.\n\n",
        );
        for commit in commits {
            let _ = writeln!(prompt, "- {}", commit.subject);
        }
        if let Some(issue) = issue {
            let _ = write!(prompt, "\nThe changes address issue #{issue}.\n");
        }
        let _ = write!(
            prompt,
            "\nWrite only the title, on a single line, to {title_path}.\n\
             Write only the Markdown description to {body_path}.\n\
             Do not modify any other files."
        );
        prompt
    }
}

impl Describe for AgentDescriber {
    fn describe(&self, commits: &[ReplayedCommit], issue: Option<&str>) -> Option<PrText> {
        // Removed with everything in it when dropped, whatever the outcome.
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("could not create temp dir for PR description: {e}");
                return None;
            }
        };
        let title_path = dir.path().join("title.txt");
        let body_path = dir.path().join("body.md");
        let prompt = Self::prompt(
            commits,
            issue,
            &title_path.to_string_lossy(),
            &body_path.to_string_lossy(),
        );

        let output = Tool::new(&self.program)
            .args(&["run", &prompt])
            .timeout(self.timeout)
            .run();
        match output {
            Ok(output) if output.success() => {}
            Ok(output) => {
                tracing::warn!(
                    code = output.exit_code,
                    "{} failed to describe changes; using commit subjects",
                    self.program
                );
                return None;
            }
            Err(e) => {
                tracing::warn!("PR description fallback: {e:#}");
                return None;
            }
        }

        let title = std::fs::read_to_string(&title_path).ok()?;
        let title = title.trim();
        if title.is_empty() {
            tracing::warn!("agent wrote an empty PR title; using commit subjects");
            return None;
        }
        let body = std::fs::read_to_string(&body_path).unwrap_or_default();

        Some(PrText {
            title: truncate_title(title),
            body: body.trim().to_string(),
        })
    }
}

fn truncate_title(title: &str) -> String {
    let first_line = title.lines().next().unwrap_or_default().trim();
    first_line.chars().take(MAX_TITLE_CHARS).collect()
}

/// Whether `body` already closes `issue` with a closing keyword.
pub fn body_has_issue_reference(body: &str, issue: &str) -> bool {
    if body.is_empty() || issue.is_empty() {
        return false;
    }
    static KEYWORD: OnceLock<Regex> = OnceLock::new();
    let keyword = KEYWORD.get_or_init(|| {
        Regex::new(r"(?i)\b(?:close[sd]?|fix(?:e[sd])?|resolve[sd]?)\b:?\s*#(\d+)\b")
            .expect("valid regex")
    });
    keyword
        .captures_iter(body)
        .any(|caps| caps.get(1).is_some_and(|m| m.as_str() == issue))
}

fn with_issue_reference(body: &str, issue: Option<&str>) -> String {
    match issue {
        Some(issue) if !body_has_issue_reference(body, issue) => {
            if body.is_empty() {
                format!("Closes #{issue}")
            } else {
                format!("{body}\n\nCloses #{issue}")
            }
        }
        _ => body.to_string(),
    }
}

/// Deterministic description used when the agent is unavailable.
pub fn rule_based(
    commits: &[ReplayedCommit],
    issue: Option<&str>,
    issue_title: &str,
    branch: &str,
) -> PrText {
    let title = if !issue_title.is_empty() {
        issue_title.to_string()
    } else if let Some(first) = commits.first() {
        first.subject.clone()
    } else {
        format!("Changes from {branch}")
    };

    let mut body = String::from("## Changes\n\n");
    for commit in commits {
        let _ = writeln!(body, "- {}", commit.subject);
    }
    let body = with_issue_reference(body.trim_end(), issue);
    PrText { title, body }
}

/// Title and body for the pull request, or `None` when nothing was replayed.
pub fn pr_content(
    commits: &[ReplayedCommit],
    issue: Option<&str>,
    issue_title: &str,
    branch: &str,
    describer: &impl Describe,
) -> Option<PrText> {
    match commits {
        [] => None,
        [only] => Some(PrText {
            title: only.subject.clone(),
            body: with_issue_reference(only.body(), issue),
        }),
        many => {
            let text = describer
                .describe(many, issue)
                .map(|text| PrText {
                    body: with_issue_reference(&text.body, issue),
                    title: text.title,
                })
                .unwrap_or_else(|| rule_based(many, issue, issue_title, branch));
            Some(text)
        }
    }
}
