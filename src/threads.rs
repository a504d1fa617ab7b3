//! Pull-request review threads: fetch unresolved threads, render them for a
//! prompt, and resolve or unresolve a single thread.

use std::fmt::Write;

use serde::Serialize;
use serde_json::Value;

use crate::github::{GraphQl, GraphQlVar, log_graphql_errors};

/// Threads fetched per request.
pub const THREAD_PAGE_SIZE: u64 = 100;
/// Comments fetched per thread.
pub const COMMENT_PAGE_SIZE: u64 = 10;
/// Comment bodies longer than this are truncated in summaries.
pub const SUMMARY_BODY_LIMIT: usize = 200;

pub const THREADS_QUERY: &str = r"
query($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      reviewThreads(first: 100) {
        totalCount
        nodes {
          id
          isResolved
          path
          line
          startLine
          viewerCanResolve
          comments(first: 10) {
            totalCount
            nodes {
              id
              databaseId
              author {
                login
              }
              body
              createdAt
            }
          }
        }
      }
    }
  }
}
";

pub const RESOLVE_MUTATION: &str = r"
mutation($threadId: ID!) {
  resolveReviewThread(input: { pullRequestReviewThreadId: $threadId }) {
    thread {
      id
      isResolved
    }
  }
}
";

pub const UNRESOLVE_MUTATION: &str = r"
mutation($threadId: ID!) {
  unresolveReviewThread(input: { pullRequestReviewThreadId: $threadId }) {
    thread {
      id
      isResolved
    }
  }
}
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadComment {
    pub id: Option<String>,
    pub database_id: Option<i64>,
    pub author: String,
    pub body: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewThread {
    pub id: Option<String>,
    pub path: Option<String>,
    pub line: Option<i64>,
    pub start_line: Option<i64>,
    pub can_resolve: bool,
    pub comments: Vec<ThreadComment>,
}

impl ReviewThread {
    /// `path:line`, or `path:start-line` for a multi-line range.
    pub fn location(&self) -> String {
        let path = self.path.as_deref().unwrap_or("unknown");
        match (self.start_line, self.line) {
            (Some(start), Some(line)) if start != line => format!("{path}:{start}-{line}"),
            (_, Some(line)) => format!("{path}:{line}"),
            (Some(start), None) => format!("{path}:{start}"),
            (None, None) => path.to_string(),
        }
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_comment(node: &Value) -> ThreadComment {
    ThreadComment {
        id: str_field(node, "id"),
        database_id: node.get("databaseId").and_then(Value::as_i64),
        author: node
            .get("author")
            .and_then(|a| a.get("login"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        body: str_field(node, "body").unwrap_or_default(),
        created_at: str_field(node, "createdAt"),
    }
}

fn parse_thread(node: &Value) -> ReviewThread {
    let comments = node.get("comments");
    let comment_nodes: &[Value] = comments
        .and_then(|c| c.get("nodes"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let comment_total = comments
        .and_then(|c| c.get("totalCount"))
        .and_then(Value::as_u64)
        .unwrap_or(comment_nodes.len() as u64);

    let id = str_field(node, "id");
    if comment_total > COMMENT_PAGE_SIZE {
        tracing::warn!(
            "Thread {} has {comment_total} comments, but only fetching first {COMMENT_PAGE_SIZE}",
            id.as_deref().unwrap_or("?")
        );
    }

    ReviewThread {
        id,
        path: str_field(node, "path"),
        line: node.get("line").and_then(Value::as_i64),
        start_line: node.get("startLine").and_then(Value::as_i64),
        can_resolve: node
            .get("viewerCanResolve")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        comments: comment_nodes
            .iter()
            .filter(|c| c.is_object())
            .map(parse_comment)
            .collect(),
    }
}

/// Extract unresolved threads from a raw GraphQL response.
///
/// Returns an empty list when the response does not have the expected shape.
pub fn unresolved_from_response(response: &Value) -> Vec<ReviewThread> {
    let Some(review_threads) = response
        .pointer("/data/repository/pullRequest/reviewThreads")
        .filter(|v| v.is_object())
    else {
        log_graphql_errors(response);
        return Vec::new();
    };
    let Some(nodes) = review_threads.get("nodes").and_then(Value::as_array) else {
        return Vec::new();
    };

    let total = review_threads
        .get("totalCount")
        .and_then(Value::as_u64)
        .unwrap_or(nodes.len() as u64);
    if total > THREAD_PAGE_SIZE {
        tracing::warn!(
            "PR has {total} review threads, but only fetching first {THREAD_PAGE_SIZE}; results are truncated"
        );
    }

    nodes
        .iter()
        .filter(|n| n.is_object())
        .filter(|n| n.get("isResolved").and_then(Value::as_bool) == Some(false))
        .map(parse_thread)
        .collect()
}

/// Fetch unresolved review threads for a pull request.
///
/// An empty result means "nothing to report", which includes transport
/// failures; it does not prove the PR has no open threads.
pub fn fetch_unresolved_threads(
    client: &impl GraphQl,
    owner: &str,
    repo: &str,
    pr_number: i64,
) -> Vec<ReviewThread> {
    let variables = [
        ("owner", GraphQlVar::Str(owner)),
        ("repo", GraphQlVar::Str(repo)),
        ("number", GraphQlVar::Int(pr_number)),
    ];
    client
        .graphql(THREADS_QUERY, &variables)
        .map(|response| unresolved_from_response(&response))
        .unwrap_or_default()
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > SUMMARY_BODY_LIMIT {
        let kept: String = body.chars().take(SUMMARY_BODY_LIMIT - 3).collect();
        format!("{kept}...")
    } else {
        body.to_string()
    }
}

/// Human-readable summary for inclusion in the agent prompt.
pub fn format_threads_for_prompt(threads: &[ReviewThread]) -> String {
    if threads.is_empty() {
        return "No unresolved review threads.".to_string();
    }

    let mut out = format!("Found {} unresolved review thread(s):\n\n", threads.len());
    for (i, thread) in threads.iter().enumerate() {
        let _ = writeln!(out, "### Thread {}: `{}`", i + 1, thread.location());
        let _ = writeln!(
            out,
            "- **Thread ID**: `{}`",
            thread.id.as_deref().unwrap_or("unknown")
        );
        let _ = writeln!(out, "- **Can Resolve**: {}", thread.can_resolve);
        if !thread.comments.is_empty() {
            out.push_str("- **Comments**:\n");
            for comment in &thread.comments {
                let database_id = comment
                    .database_id
                    .map_or_else(|| "unknown".to_string(), |id| id.to_string());
                let _ = writeln!(out, "  - **Comment ID**: `{database_id}`");
                let _ = writeln!(
                    out,
                    "  - @{}: {}",
                    comment.author,
                    truncate_body(comment.body.trim())
                );
            }
        }
        out.push('\n');
    }
    out.trim_end_matches('\n').to_string()
}

/// Machine-readable payload written for the workflow.
#[derive(Debug, Serialize)]
pub struct ThreadReport<'a> {
    pub threads: &'a [ReviewThread],
    pub count: usize,
    pub summary: String,
}

impl<'a> ThreadReport<'a> {
    pub fn new(threads: &'a [ReviewThread]) -> Self {
        Self {
            threads,
            count: threads.len(),
            summary: format_threads_for_prompt(threads),
        }
    }
}

fn set_resolution(client: &impl GraphQl, thread_id: &str, resolve: bool) -> bool {
    let (mutation, field) = if resolve {
        (RESOLVE_MUTATION, "resolveReviewThread")
    } else {
        (UNRESOLVE_MUTATION, "unresolveReviewThread")
    };

    let Some(response) = client.graphql(mutation, &[("threadId", GraphQlVar::Str(thread_id))])
    else {
        return false;
    };

    log_graphql_errors(&response);
    if response
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|e| !e.is_empty())
    {
        return false;
    }

    response
        .pointer(&format!("/data/{field}/thread/isResolved"))
        .and_then(Value::as_bool)
        == Some(resolve)
}

/// Mark a thread resolved. True only if the returned thread is resolved.
pub fn resolve_thread(client: &impl GraphQl, thread_id: &str) -> bool {
    set_resolution(client, thread_id, true)
}

/// Mark a thread unresolved. True only if the returned thread is unresolved.
pub fn unresolve_thread(client: &impl GraphQl, thread_id: &str) -> bool {
    set_resolution(client, thread_id, false)
}
