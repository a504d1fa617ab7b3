use std::time::Duration;

use clap::Args;

use crate::error::ExitError;
use crate::github::GhCli;
use crate::replay::describe::DEFAULT_DESCRIBE_TIMEOUT;
use crate::replay::{AgentDescriber, GhForge, Git, ReplayRequest, Replayer};

#[derive(Debug, Args)]
pub struct ReplayCommitsArgs {
    /// Commit the agent started from; everything after it is replayed
    pub start_sha: String,
    /// Branch the agent started from
    pub start_branch: String,
    /// Issue the changes close, if any
    pub issue_number: Option<String>,
    /// `owner/name` of the repository
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,
    /// Agent used to describe multi-commit pull requests
    #[arg(long, env = "SISYPHUS_AGENT", default_value = "opencode")]
    pub agent: String,
    /// Seconds to wait for the agent's description
    #[arg(long, default_value_t = DEFAULT_DESCRIBE_TIMEOUT.as_secs())]
    pub describe_timeout: u64,
}

impl ReplayCommitsArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let repo = self
            .repository
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ExitError::InvalidInput("GITHUB_REPOSITORY not set".to_string()))?;

        let vcs = Git::new(std::env::current_dir()?);
        let forge = GhForge::new(GhCli::default(), repo);
        let describer =
            AgentDescriber::new(&self.agent, Duration::from_secs(self.describe_timeout));

        let outcome = Replayer::new(&vcs, &forge, &describer).run(&ReplayRequest {
            start_sha: &self.start_sha,
            start_branch: &self.start_branch,
            issue_number: self.issue_number.as_deref(),
        })?;
        tracing::debug!(replayed = outcome.replayed.len(), head = ?outcome.head, "replay finished");
        Ok(())
    }
}
