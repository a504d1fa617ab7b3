use base64::Engine;
use serde_json::{Value, json};

use super::{Forge, TreeEntry};
use crate::github::{GhCli, Method};

/// The git data API of one GitHub repository, through `gh api`.
#[derive(Debug, Clone)]
pub struct GhForge {
    gh: GhCli,
    repo: String,
}

impl GhForge {
    /// `repo` is `owner/name`.
    pub fn new(gh: GhCli, repo: &str) -> Self {
        Self {
            gh,
            repo: repo.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("repos/{}/{path}", self.repo)
    }

    fn post_for_sha(&self, path: &str, body: &Value) -> anyhow::Result<String> {
        let response = self
            .gh
            .rest_ok(&self.endpoint(path), Method::Post, Some(body), None)?;
        sha_from_response(&response)
    }
}

pub(crate) fn sha_from_response(response: &str) -> anyhow::Result<String> {
    let value: Value = serde_json::from_str(response)
        .map_err(|e| anyhow::anyhow!("unexpected API response: {e}"))?;
    value
        .get("sha")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("API response has no sha: {response}"))
}

/// A full 40-character hex object id.
pub(crate) fn is_full_sha(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Forge for GhForge {
    fn default_branch(&self) -> anyhow::Result<String> {
        self.gh.rest_ok(
            &format!("repos/{}", self.repo),
            Method::Get,
            None,
            Some(".default_branch"),
        )
    }

    fn issue_title(&self, number: &str) -> String {
        self.gh
            .rest_ok(
                &self.endpoint(&format!("issues/{number}")),
                Method::Get,
                None,
                Some(".title"),
            )
            .unwrap_or_else(|e| {
                tracing::warn!("reading issue #{number}: {e:#}");
                String::new()
            })
    }

    fn remote_branch_sha(&self, branch: &str) -> Option<String> {
        let output = self
            .gh
            .rest(
                &self.endpoint(&format!("git/refs/heads/{branch}")),
                Method::Get,
                None,
                Some(".object.sha"),
            )
            .ok()?;
        let sha = output.stdout.trim();
        (output.success() && is_full_sha(sha)).then(|| sha.to_string())
    }

    fn commit_tree(&self, commit_sha: &str) -> anyhow::Result<String> {
        self.gh.rest_ok(
            &self.endpoint(&format!("git/commits/{commit_sha}")),
            Method::Get,
            None,
            Some(".tree.sha"),
        )
    }

    fn create_blob(&self, content: &[u8]) -> anyhow::Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        self.post_for_sha(
            "git/blobs",
            &json!({"content": encoded, "encoding": "base64"}),
        )
    }

    fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> anyhow::Result<String> {
        self.post_for_sha("git/trees", &json!({"base_tree": base_tree, "tree": entries}))
    }

    fn create_commit(&self, message: &str, tree: &str, parent: &str) -> anyhow::Result<String> {
        self.post_for_sha(
            "git/commits",
            &json!({"message": message, "tree": tree, "parents": [parent]}),
        )
    }

    fn create_ref(&self, branch: &str, sha: &str) -> anyhow::Result<()> {
        self.gh.rest_ok(
            &self.endpoint("git/refs"),
            Method::Post,
            Some(&json!({"ref": format!("refs/heads/{branch}"), "sha": sha})),
            None,
        )?;
        Ok(())
    }

    fn update_ref(&self, branch: &str, sha: &str) -> anyhow::Result<()> {
        self.gh.rest_ok(
            &self.endpoint(&format!("git/refs/heads/{branch}")),
            Method::Patch,
            Some(&json!({"sha": sha, "force": true})),
            None,
        )?;
        Ok(())
    }

    fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> anyhow::Result<String> {
        let response = self.gh.rest_ok(
            &self.endpoint("pulls"),
            Method::Post,
            Some(&json!({"title": title, "body": body, "head": head, "base": base})),
            None,
        )?;
        let value: Value = serde_json::from_str(&response)?;
        value
            .get("html_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("pull request response has no html_url"))
    }
}
