//! Workflow output channel (`$GITHUB_OUTPUT`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rand::Rng;

pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Appends `key=value` records to the file the workflow runner reads back.
#[derive(Debug, Clone)]
pub struct WorkflowOutput {
    path: PathBuf,
}

impl WorkflowOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The channel named by `$GITHUB_OUTPUT`, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var_os(GITHUB_OUTPUT_ENV)
            .filter(|p| !p.is_empty())
            .map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single-line value.
    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.append(&format!("{key}={value}\n"))
    }

    /// Append a possibly multi-line value using a random heredoc delimiter.
    pub fn set_multiline(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let delimiter = loop {
            let candidate = random_delimiter();
            if !value.contains(&candidate) {
                break candidate;
            }
        };
        self.append(&format!("{key}<<{delimiter}\n{value}\n{delimiter}\n"))
    }

    fn append(&self, record: &str) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(record.as_bytes())
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

fn random_delimiter() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
