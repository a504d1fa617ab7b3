//! Replay locally authored commits as server-signed commits and publish them.
//!
//! Every commit between the start point and `HEAD` is cherry-picked onto the
//! previously replayed result, its changed files uploaded as blobs, and a new
//! commit created through the forge API so the forge signs it. The local
//! working tree is reset onto each signed commit before the next pick.

pub mod describe;
pub mod forge;
pub mod git;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ExitError;

pub use describe::{AgentDescriber, Describe, PrText, body_has_issue_reference};
pub use forge::GhForge;
pub use git::Git;

/// Git mode for a regular file.
pub const MODE_FILE: &str = "100644";
/// Git mode for an executable file.
pub const MODE_EXECUTABLE: &str = "100755";

/// Local repository operations the pipeline needs.
pub trait Vcs {
    fn current_branch(&self) -> anyhow::Result<String>;
    /// Commits in `start..HEAD`, oldest first. Empty if the range is invalid.
    fn commits_since(&self, start: &str) -> Vec<String>;
    /// Best-effort fetch; failures are logged, not returned.
    fn fetch(&self, remote: &str, refspec: &str);
    fn is_ancestor(&self, commit: &str, of: &str) -> bool;
    fn commit_message(&self, sha: &str) -> anyhow::Result<String>;
    fn commit_subject(&self, sha: &str) -> anyhow::Result<String>;
    /// Apply `sha` to the index without committing. `false` when it conflicts.
    fn cherry_pick_no_commit(&self, sha: &str) -> anyhow::Result<bool>;
    fn staged_files(&self) -> anyhow::Result<Vec<String>>;
    fn reset_hard(&self, target: &str) -> anyhow::Result<()>;
    fn workdir(&self) -> &Path;
}

/// Remote repository operations. Object-creating calls return the new sha.
pub trait Forge {
    fn default_branch(&self) -> anyhow::Result<String>;
    /// Empty when the issue cannot be read.
    fn issue_title(&self, number: &str) -> String;
    /// Tip of `branch` on the remote, or `None` if the branch does not exist.
    fn remote_branch_sha(&self, branch: &str) -> Option<String>;
    fn commit_tree(&self, commit_sha: &str) -> anyhow::Result<String>;
    fn create_blob(&self, content: &[u8]) -> anyhow::Result<String>;
    fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> anyhow::Result<String>;
    fn create_commit(&self, message: &str, tree: &str, parent: &str) -> anyhow::Result<String>;
    fn create_ref(&self, branch: &str, sha: &str) -> anyhow::Result<()>;
    /// Force-move `branch` to `sha`.
    fn update_ref(&self, branch: &str, sha: &str) -> anyhow::Result<()>;
    /// Returns the pull request's web URL.
    fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> anyhow::Result<String>;
}

/// One entry of a tree layered on the parent tree. A `None` sha deletes the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub sha: Option<String>,
}

/// A commit that was successfully re-created on the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedCommit {
    pub original: String,
    pub signed: String,
    pub subject: String,
    pub message: String,
}

impl ReplayedCommit {
    /// The message without its subject line.
    pub fn body(&self) -> &str {
        self.message
            .split_once('\n')
            .map_or("", |(_, rest)| rest)
            .trim()
    }
}

#[derive(Debug, Clone)]
pub struct ReplayRequest<'a> {
    pub start_sha: &'a str,
    pub start_branch: &'a str,
    pub issue_number: Option<&'a str>,
}

/// What the remote side looked like before replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub pending: Vec<String>,
    pub base: String,
    pub branch_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publication {
    /// A new branch ref was created; carries the pull request URL if one was opened.
    Created { pull_request: Option<String> },
    /// An existing branch ref was force-updated.
    Updated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub replayed: Vec<ReplayedCommit>,
    pub head: Option<String>,
    pub publication: Option<Publication>,
}

/// Drives a replay against a local repository, a forge and a PR describer.
pub struct Replayer<'a, V: Vcs, F: Forge, D: Describe> {
    vcs: &'a V,
    forge: &'a F,
    describer: &'a D,
}

impl<'a, V: Vcs, F: Forge, D: Describe> Replayer<'a, V, F, D> {
    pub fn new(vcs: &'a V, forge: &'a F, describer: &'a D) -> Self {
        Self {
            vcs,
            forge,
            describer,
        }
    }

    pub fn run(&self, request: &ReplayRequest<'_>) -> anyhow::Result<ReplayOutcome> {
        let current_branch = self.vcs.current_branch()?;
        let default_branch = self.forge.default_branch()?;
        let issue_number = request.issue_number.filter(|n| !n.is_empty());
        let issue_title = issue_number
            .map(|n| self.forge.issue_title(n))
            .unwrap_or_default();

        println!("Current branch: {current_branch}");
        println!("Start branch: {}", request.start_branch);
        println!("Default branch: {default_branch}");

        let commits = self.vcs.commits_since(request.start_sha);
        if commits.is_empty() {
            println!("\nNo commits to replay");
            return Ok(ReplayOutcome::default());
        }

        if current_branch == default_branch {
            return Err(ExitError::Policy(format!(
                "cannot replay commits to default branch '{default_branch}'; \
                 the agent must create a branch for its changes"
            ))
            .into());
        }

        let reconciled = self.reconcile(&current_branch, commits, request.start_sha);
        if reconciled.pending.is_empty() {
            println!("\nNo new commits to replay");
            return Ok(ReplayOutcome::default());
        }

        println!(
            "\nReplaying {} commit(s) as signed...",
            reconciled.pending.len()
        );
        self.vcs.reset_hard(&reconciled.base)?;

        let mut parent = reconciled.base.clone();
        let mut replayed = Vec::new();
        for original in &reconciled.pending {
            if let Some(commit) = self.replay_commit(original, &parent)? {
                parent = commit.signed.clone();
                replayed.push(commit);
            }
        }

        if replayed.is_empty() {
            println!("\nNo commits produced changes; nothing to publish");
            return Ok(ReplayOutcome::default());
        }

        let publication = if reconciled.branch_exists {
            println!("\nUpdating ref {current_branch} -> {}", short(&parent));
            self.forge.update_ref(&current_branch, &parent)?;
            Publication::Updated
        } else {
            println!("\nCreating ref {current_branch} -> {}", short(&parent));
            self.forge.create_ref(&current_branch, &parent)?;
            let pull_request = match describe::pr_content(
                &replayed,
                issue_number,
                &issue_title,
                &current_branch,
                self.describer,
            ) {
                Some(text) => {
                    println!("\nCreating pull request...");
                    let url = self.forge.create_pull_request(
                        &text.title,
                        &text.body,
                        &current_branch,
                        &default_branch,
                    )?;
                    println!("PR created: {url}");
                    Some(url)
                }
                None => None,
            };
            Publication::Created { pull_request }
        };

        println!("Done! Replayed {} commit(s) as signed.", replayed.len());

        Ok(ReplayOutcome {
            head: Some(parent),
            replayed,
            publication: Some(publication),
        })
    }

    /// Drop commits the remote branch already contains and pick the replay base.
    pub fn reconcile(&self, branch: &str, commits: Vec<String>, start_sha: &str) -> Reconciled {
        match self.forge.remote_branch_sha(branch) {
            Some(remote_sha) => {
                println!("Remote branch exists at {}", short(&remote_sha));
                self.vcs.fetch("origin", branch);
                let remote_ref = format!("origin/{branch}");
                let pending = commits
                    .into_iter()
                    .filter(|sha| {
                        let known = self.vcs.is_ancestor(sha, &remote_ref);
                        if known {
                            println!("  Skipping {} (already on remote)", short(sha));
                        }
                        !known
                    })
                    .collect();
                Reconciled {
                    pending,
                    base: remote_sha,
                    branch_exists: true,
                }
            }
            None => Reconciled {
                pending: commits,
                base: start_sha.to_string(),
                branch_exists: false,
            },
        }
    }

    /// Replay one commit onto `parent`. `None` when it was skipped.
    pub fn replay_commit(
        &self,
        original: &str,
        parent: &str,
    ) -> anyhow::Result<Option<ReplayedCommit>> {
        let message = self.vcs.commit_message(original)?;
        let subject = self.vcs.commit_subject(original)?;
        println!("\n==> {subject}");

        if !self.vcs.cherry_pick_no_commit(original)? {
            println!("    Cherry-pick failed, skipping");
            tracing::warn!(commit = %original, "cherry-pick failed");
            self.vcs.reset_hard("HEAD")?;
            return Ok(None);
        }

        let files = self.vcs.staged_files()?;
        if files.is_empty() {
            println!("    No file changes, skipping");
            return Ok(None);
        }

        let base_tree = self.forge.commit_tree(parent)?;
        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            let entry = self.snapshot(path)?;
            match entry.sha {
                Some(_) => println!("    + {}", entry.path),
                None => println!("    - {} (deleted)", entry.path),
            }
            entries.push(entry);
        }
        let tree = self.forge.create_tree(&base_tree, &entries)?;
        let signed = self.forge.create_commit(&message, &tree, parent)?;
        println!("    Signed: {}", short(&signed));

        self.vcs.fetch("origin", &signed);
        self.vcs.reset_hard(&signed)?;

        Ok(Some(ReplayedCommit {
            original: original.to_string(),
            signed,
            subject,
            message,
        }))
    }

    fn snapshot(&self, path: String) -> anyhow::Result<TreeEntry> {
        let full: PathBuf = self.vcs.workdir().join(&path);
        let content = match std::fs::read(&full) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("reading {}", full.display())));
            }
        };
        let sha = content
            .map(|bytes| self.forge.create_blob(&bytes))
            .transpose()?;
        Ok(TreeEntry {
            mode: file_mode(&full),
            path,
            kind: "blob",
            sha,
        })
    }
}

/// `100755` for an existing executable file, otherwise `100644`.
pub fn file_mode(path: &Path) -> &'static str {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(path)
            && meta.is_file()
            && meta.permissions().mode() & 0o111 != 0
        {
            return MODE_EXECUTABLE;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    MODE_FILE
}

fn short(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
