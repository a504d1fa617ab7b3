use clap::Args;

use crate::error::ExitError;
use crate::github::GhCli;
use crate::output::WorkflowOutput;
use crate::threads::{ThreadReport, fetch_unresolved_threads, resolve_thread, unresolve_thread};

#[derive(Debug, Args)]
pub struct FetchThreadsArgs {
    pub owner: String,
    pub repo: String,
    /// Pull request number
    pub pr_number: String,
}

impl FetchThreadsArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let pr_number: i64 = self.pr_number.parse().map_err(|_| {
            ExitError::InvalidInput(format!("invalid PR number: {}", self.pr_number))
        })?;

        let threads = fetch_unresolved_threads(&GhCli::default(), &self.owner, &self.repo, pr_number);
        let report = ThreadReport::new(&threads);

        match WorkflowOutput::from_env() {
            Some(out) => {
                out.set_multiline("json", &serde_json::to_string(&report)?)?;
                out.set("count", &report.count.to_string())?;
            }
            None => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct ResolveThreadArgs {
    /// GraphQL node id of the review thread
    pub thread_id: String,
    /// Reopen the thread instead of resolving it
    #[arg(long)]
    pub unresolve: bool,
}

impl ResolveThreadArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let gh = GhCli::default();
        let (ok, action) = if self.unresolve {
            (unresolve_thread(&gh, &self.thread_id), "unresolve")
        } else {
            (resolve_thread(&gh, &self.thread_id), "resolve")
        };

        if !ok {
            return Err(ExitError::Other(format!(
                "failed to {action} thread: {}",
                self.thread_id
            ))
            .into());
        }
        println!("{}d thread: {}", capitalize(action), self.thread_id);
        Ok(())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
