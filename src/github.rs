//! Thin wrapper over the `gh` CLI for GraphQL and REST calls.

use serde_json::Value;

use crate::subprocess::{RunOutput, Tool};

/// A typed GraphQL variable; `gh` needs `-f` for strings and `-F` for numbers.
#[derive(Debug, Clone, Copy)]
pub enum GraphQlVar<'a> {
    Str(&'a str),
    Int(i64),
}

/// Executes GraphQL documents. Any failure yields `None` with a warning.
pub trait GraphQl {
    fn graphql(&self, query: &str, variables: &[(&str, GraphQlVar<'_>)]) -> Option<Value>;
}

/// HTTP method for REST calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

/// `gh api` invoked as a subprocess.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl GhCli {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    pub(crate) fn graphql_args(
        query: &str,
        variables: &[(&str, GraphQlVar<'_>)],
    ) -> Vec<String> {
        let mut args = vec![
            "api".to_string(),
            "graphql".to_string(),
            "-f".to_string(),
            format!("query={query}"),
        ];
        for (key, value) in variables {
            match value {
                GraphQlVar::Str(s) => {
                    args.push("-f".to_string());
                    args.push(format!("{key}={s}"));
                }
                GraphQlVar::Int(n) => {
                    args.push("-F".to_string());
                    args.push(format!("{key}={n}"));
                }
            }
        }
        args
    }

    /// Call a REST endpoint. A JSON `body` is piped through `--input -`.
    /// Non-zero exits are returned, not raised.
    pub fn rest(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
        jq: Option<&str>,
    ) -> anyhow::Result<RunOutput> {
        let mut tool = Tool::new(&self.program).args(&["api", endpoint]);
        if method != Method::Get {
            tool = tool.args(&["-X", method.as_str()]);
        }
        if let Some(filter) = jq {
            tool = tool.args(&["--jq", filter]);
        }
        if let Some(body) = body {
            tool = tool.args(&["--input", "-"]).stdin(body.to_string());
        }
        tool.run()
    }

    /// Like [`GhCli::rest`] but a non-zero exit is an error.
    pub fn rest_ok(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
        jq: Option<&str>,
    ) -> anyhow::Result<String> {
        let output = self.rest(endpoint, method, body, jq)?;
        if !output.success() {
            anyhow::bail!(
                "gh api {} {endpoint} failed: {}",
                method.as_str(),
                output.stderr.trim()
            );
        }
        Ok(output.stdout.trim().to_string())
    }
}

impl GraphQl for GhCli {
    fn graphql(&self, query: &str, variables: &[(&str, GraphQlVar<'_>)]) -> Option<Value> {
        let args = Self::graphql_args(query, variables);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = match Tool::new(&self.program).args(&arg_refs).run() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("GraphQL error: {e:#}");
                return None;
            }
        };

        if !output.success() {
            tracing::warn!("GraphQL error: {}", output.stderr.trim());
            return None;
        }

        match output.parse_json::<Value>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Failed to parse GraphQL response: {}", output.stdout.trim());
                None
            }
        }
    }
}

/// Log every `errors[].message` in a GraphQL response.
pub fn log_graphql_errors(response: &Value) {
    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        for error in errors {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            tracing::warn!("GraphQL error: {message}");
        }
    }
}
