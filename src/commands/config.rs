use std::path::PathBuf;

use clap::Args;

use crate::config::{
    AgentConfigInputs, ConfigError, DEFAULT_PRESET, GitMasterFlags, ModelOverrides, SkillToggles,
    build_agent_config, build_auth, default_agent_config_path, default_auth_path,
    parse_flag, parse_provider_list, read_existing, write_auth, write_document,
};
use crate::error::ExitError;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,
    /// JSON object merged over the generated credentials
    #[arg(long, env = "AUTH_JSON", hide_env_values = true)]
    pub auth_json: Option<String>,
    /// JSON object merged over the generated agent config
    #[arg(long, env = "OMO_CONFIG_JSON")]
    pub omo_config_json: Option<String>,
    /// Model preset: balanced, fast or powerful
    #[arg(long, env = "MODEL_PRESET", default_value = DEFAULT_PRESET)]
    pub model_preset: String,
    #[arg(long, env = "PRIMARY_MODEL")]
    pub primary_model: Option<String>,
    #[arg(long, env = "ORACLE_MODEL")]
    pub oracle_model: Option<String>,
    #[arg(long, env = "FAST_MODEL")]
    pub fast_model: Option<String>,
    #[arg(long, env = "GIT_MASTER_COMMIT_FOOTER")]
    pub git_master_commit_footer: Option<String>,
    #[arg(long, env = "GIT_MASTER_INCLUDE_CO_AUTHORED_BY")]
    pub git_master_include_co_authored_by: Option<String>,
    #[arg(long, env = "ENABLE_GIT_MASTER_SKILL")]
    pub enable_git_master_skill: Option<String>,
    #[arg(long, env = "ENABLE_PLAYWRIGHT_SKILL")]
    pub enable_playwright_skill: Option<String>,
    #[arg(long, env = "ENABLE_FRONTEND_UI_UX_SKILL")]
    pub enable_frontend_ui_ux_skill: Option<String>,
    /// JSON array of provider names to allow
    #[arg(long, env = "ENABLED_PROVIDERS")]
    pub enabled_providers: Option<String>,
    /// JSON array of provider names to deny
    #[arg(long, env = "DISABLED_PROVIDERS")]
    pub disabled_providers: Option<String>,
    /// Where to write credentials (default ~/.local/share/opencode/auth.json)
    #[arg(long)]
    pub auth_path: Option<PathBuf>,
    /// Where to write agent config (default ~/.config/opencode/oh-my-opencode.json)
    #[arg(long)]
    pub config_path: Option<PathBuf>,
}

fn invalid(e: ConfigError) -> anyhow::Error {
    ExitError::InvalidInput(e.to_string()).into()
}

fn providers(raw: Option<&str>, name: &str) -> anyhow::Result<Option<Vec<String>>> {
    match raw.filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_provider_list(raw, name).map(Some).map_err(invalid),
        None => Ok(None),
    }
}

fn enabled(name: &str, raw: Option<&str>) -> anyhow::Result<bool> {
    Ok(parse_flag(name, raw).map_err(invalid)?.unwrap_or(false))
}

impl ConfigArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        // Validate every input before touching the filesystem.
        let auth = build_auth(
            self.anthropic_api_key.as_deref(),
            self.openai_api_key.as_deref(),
            self.gemini_api_key.as_deref(),
            self.auth_json.as_deref(),
        )
        .map_err(invalid)?;

        let inputs = AgentConfigInputs {
            preset: &self.model_preset,
            models: ModelOverrides {
                primary: self.primary_model.as_deref(),
                oracle: self.oracle_model.as_deref(),
                fast: self.fast_model.as_deref(),
            },
            skills: SkillToggles {
                git_master: enabled(
                    "ENABLE_GIT_MASTER_SKILL",
                    self.enable_git_master_skill.as_deref(),
                )?,
                playwright: enabled(
                    "ENABLE_PLAYWRIGHT_SKILL",
                    self.enable_playwright_skill.as_deref(),
                )?,
                frontend_ui_ux: enabled(
                    "ENABLE_FRONTEND_UI_UX_SKILL",
                    self.enable_frontend_ui_ux_skill.as_deref(),
                )?,
            },
            git_master: GitMasterFlags {
                commit_footer: parse_flag(
                    "GIT_MASTER_COMMIT_FOOTER",
                    self.git_master_commit_footer.as_deref(),
                )
                .map_err(invalid)?,
                include_co_authored_by: parse_flag(
                    "GIT_MASTER_INCLUDE_CO_AUTHORED_BY",
                    self.git_master_include_co_authored_by.as_deref(),
                )
                .map_err(invalid)?,
            },
            enabled_providers: providers(self.enabled_providers.as_deref(), "ENABLED_PROVIDERS")?,
            disabled_providers: providers(
                self.disabled_providers.as_deref(),
                "DISABLED_PROVIDERS",
            )?,
        };

        let config_path = match self.config_path {
            Some(ref p) => p.clone(),
            None => default_agent_config_path()?,
        };
        let existing = read_existing(&config_path).map_err(|e| match e.downcast::<ConfigError>() {
            Ok(config_err) => invalid(config_err),
            Err(other) => other,
        })?;
        let agent_config = build_agent_config(existing, &inputs, self.omo_config_json.as_deref())
            .map_err(invalid)?;

        let auth_path = match self.auth_path {
            Some(ref p) => p.clone(),
            None => default_auth_path()?,
        };
        if auth.should_persist() {
            write_auth(&auth_path, &auth.value)?;
            println!("Generated auth: {}", auth_path.display());
        } else {
            tracing::debug!("no credentials supplied; leaving {} untouched", auth_path.display());
        }

        write_document(&config_path, &agent_config)?;
        println!("Generated config: {}", config_path.display());
        Ok(())
    }
}
