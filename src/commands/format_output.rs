use clap::Args;

use crate::error::ExitError;
use crate::transcript::{process_stream, run_agent_stream};

#[derive(Debug, Args)]
pub struct FormatOutputArgs {
    /// Prompt for a live agent run, or `-` to format a recorded stream from stdin
    pub prompt: String,
    /// Agent executable
    #[arg(long, env = "SISYPHUS_AGENT", default_value = "opencode")]
    pub agent: String,
}

impl FormatOutputArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let stdout = std::io::stdout();
        if self.prompt == "-" {
            let stdin = std::io::stdin();
            process_stream(stdin.lock(), stdout.lock())?;
            return Ok(());
        }

        let code = run_agent_stream(&self.agent, &self.prompt, stdout.lock())?;
        if code != 0 {
            return Err(ExitError::ChildExit {
                tool: self.agent.clone(),
                code,
            }
            .into());
        }
        Ok(())
    }
}

