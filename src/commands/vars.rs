use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;

use crate::prompt::load_variables;

#[derive(Debug, Args)]
pub struct VarsArgs {
    /// Root of the action checkout (snippets under prompts/base)
    pub action_path: PathBuf,
    /// Consumer prompt directory (snippets under base)
    pub prompt_path: PathBuf,
    /// Extra variables as a JSON object; these win over snippets
    #[arg(default_value = "{}")]
    pub vars_json: String,
}

impl VarsArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let merged: BTreeMap<String, serde_json::Value> =
            load_variables(&self.action_path, &self.prompt_path, &self.vars_json)?
                .into_iter()
                .collect();
        println!("{}", serde_json::to_string(&merged)?);
        Ok(())
    }
}
