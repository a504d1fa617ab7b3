use std::path::{Path, PathBuf};

use super::Vcs;
use crate::subprocess::{RunOutput, Tool};

/// The `git` CLI operating on one working tree.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn tool(&self, args: &[&str]) -> Tool {
        Tool::new("git").args(args).current_dir(&self.workdir)
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<RunOutput> {
        self.tool(args).run()
    }

    fn stdout(&self, args: &[&str]) -> anyhow::Result<String> {
        Ok(self.tool(args).run_ok()?.stdout.trim().to_string())
    }
}

impl Vcs for Git {
    fn current_branch(&self) -> anyhow::Result<String> {
        self.stdout(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn commits_since(&self, start: &str) -> Vec<String> {
        let range = format!("{start}..HEAD");
        match self.stdout(&["rev-list", "--reverse", &range]) {
            Ok(out) => out.split_whitespace().map(str::to_string).collect(),
            Err(e) => {
                tracing::warn!("listing commits in {range}: {e:#}");
                Vec::new()
            }
        }
    }

    fn fetch(&self, remote: &str, refspec: &str) {
        match self.run(&["fetch", remote, refspec]) {
            Ok(out) if out.success() => {}
            Ok(out) => tracing::debug!("git fetch {remote} {refspec}: {}", out.stderr.trim()),
            Err(e) => tracing::debug!("git fetch {remote} {refspec}: {e:#}"),
        }
    }

    fn is_ancestor(&self, commit: &str, of: &str) -> bool {
        self.run(&["merge-base", "--is-ancestor", commit, of])
            .is_ok_and(|out| out.success())
    }

    fn commit_message(&self, sha: &str) -> anyhow::Result<String> {
        self.stdout(&["log", "-1", "--format=%B", sha])
    }

    fn commit_subject(&self, sha: &str) -> anyhow::Result<String> {
        self.stdout(&["log", "-1", "--format=%s", sha])
    }

    fn cherry_pick_no_commit(&self, sha: &str) -> anyhow::Result<bool> {
        let out = self.run(&["cherry-pick", "-n", sha])?;
        if !out.success() {
            tracing::debug!("cherry-pick {sha}: {}", out.stderr.trim());
        }
        Ok(out.success())
    }

    /// Renames are listed as delete plus add; `-z` keeps paths unquoted.
    fn staged_files(&self) -> anyhow::Result<Vec<String>> {
        let out = self
            .tool(&["diff", "--cached", "--name-only", "--no-renames", "-z"])
            .run_ok()?;
        Ok(out
            .stdout
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn reset_hard(&self, target: &str) -> anyhow::Result<()> {
        self.tool(&["reset", "--hard", target]).run_ok()?;
        Ok(())
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }
}
