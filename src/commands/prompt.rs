use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::error::ExitError;
use crate::prompt::{find_prompt_file, prompt_candidates};

#[derive(Debug, Args)]
pub struct PromptArgs {
    /// Root of the action checkout
    #[arg(required_unless_present = "inline")]
    pub action_path: Option<PathBuf>,
    /// Consumer prompt directory, searched first
    #[arg(required_unless_present = "inline")]
    pub prompt_path: Option<PathBuf>,
    /// Mode whose template to print (e.g. agent, review)
    #[arg(required_unless_present = "inline")]
    pub mode: Option<String>,
    /// Print this text instead of looking up a template
    #[arg(long = "prompt", conflicts_with_all = ["action_path", "prompt_path", "mode"])]
    pub inline: Option<String>,
}

impl PromptArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        if let Some(ref text) = self.inline {
            println!("{text}");
            return Ok(());
        }

        let (Some(action_path), Some(prompt_path), Some(mode)) =
            (&self.action_path, &self.prompt_path, &self.mode)
        else {
            return Err(ExitError::InvalidInput(
                "expected <ACTION_PATH> <PROMPT_PATH> <MODE> or --prompt <TEXT>".to_string(),
            )
            .into());
        };

        let Some(path) = find_prompt_file(mode, prompt_path, action_path) else {
            let tried = prompt_candidates(mode, prompt_path, action_path)
                .iter()
                .map(|p| format!("\n  Tried: {}", p.display()))
                .collect::<String>();
            return Err(ExitError::InvalidInput(format!(
                "no prompt file found for mode '{mode}'{tried}"
            ))
            .into());
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        println!("{contents}");
        Ok(())
    }
}
