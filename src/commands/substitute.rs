use std::io::Read;

use anyhow::Context;
use clap::Args;

use crate::prompt::parse_user_vars;
use crate::template::{substitute, variables_from_json};

#[derive(Debug, Args)]
pub struct SubstituteArgs {
    /// Variables as a JSON object; the template is read from stdin
    pub vars_json: String,
}

impl SubstituteArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let variables = variables_from_json(&parse_user_vars(&self.vars_json)?);
        let mut template = String::new();
        std::io::stdin()
            .read_to_string(&mut template)
            .context("reading template from stdin")?;
        println!("{}", substitute(&template, &variables));
        Ok(())
    }
}
