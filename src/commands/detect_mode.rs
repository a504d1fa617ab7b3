use clap::Args;

use crate::mode::{DEFAULT_MODE, EventContext, detect_mode};
use crate::output::WorkflowOutput;

#[derive(Debug, Args)]
pub struct DetectModeArgs {
    /// Triggering event name
    #[arg(long, env = "EVENT_NAME", default_value = "")]
    pub event_name: String,
    /// Mode configured on the workflow step
    #[arg(long, env = "INPUT_MODE", default_value = DEFAULT_MODE)]
    pub mode: String,
    /// Handle the bot answers to when mentioned
    #[arg(long, env = "INPUT_BOT_NAME", default_value = "ai-agent")]
    pub bot_name: String,
    /// Body of the triggering comment
    #[arg(long, env = "COMMENT_BODY")]
    pub comment_body: Option<String>,
    /// Body of the triggering review
    #[arg(long, env = "REVIEW_BODY")]
    pub review_body: Option<String>,
}

impl DetectModeArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let mode = detect_mode(&EventContext {
            event_name: &self.event_name,
            input_mode: &self.mode,
            bot_name: &self.bot_name,
            comment_body: self.comment_body.as_deref(),
            review_body: self.review_body.as_deref(),
        });

        println!("Detected mode: {mode}");
        if let Some(out) = WorkflowOutput::from_env() {
            out.set("value", &mode)?;
        }
        Ok(())
    }
}
