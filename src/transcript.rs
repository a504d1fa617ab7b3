//! Render the agent's JSON-lines event stream as GitHub Actions log groups.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{Sender, channel};
use std::thread;

use anyhow::Context;
use serde_json::Value;

use crate::error::ExitError;

/// Blocks longer than this many lines are cut with a "N more lines" marker.
pub const MAX_BLOCK_LINES: usize = 50;

const DEFAULT_ICON: &str = "🔧";
const DEFAULT_STATUS_ICON: &str = "•";

const TOOL_ICONS: &[(&str, &str)] = &[
    ("read", "📄"),
    ("write", "✏️"),
    ("edit", "✏️"),
    ("bash", "🔨"),
    ("grep", "🔍"),
    ("glob", "🔍"),
    ("task", "🤖"),
    ("todowrite", "📋"),
    ("todoread", "📋"),
    ("webfetch", "🌐"),
    ("lsp_diagnostics", "🔬"),
    ("lsp_hover", "🔬"),
    ("lsp_goto_definition", "🔬"),
    ("lsp_find_references", "🔬"),
    ("ast_grep_search", "🌳"),
    ("ast_grep_replace", "🌳"),
];

const STATUS_ICONS: &[(&str, &str)] = &[
    ("completed", "✅"),
    ("in_progress", "🔄"),
    ("pending", "⬚"),
    ("cancelled", "❌"),
];

/// How an event's `type` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Lifecycle,
    ToolUse,
    ToolResult,
    Text,
    Other,
}

impl EventKind {
    pub fn of(event: &Value) -> Self {
        match event.get("type").and_then(Value::as_str).unwrap_or("") {
            "step_start" | "step_finish" => Self::Lifecycle,
            "tool_use" => Self::ToolUse,
            "tool_result" => Self::ToolResult,
            "text" => Self::Text,
            _ => Self::Other,
        }
    }
}

/// Icon for a tool, case-insensitive.
pub fn tool_icon(tool_name: &str) -> &'static str {
    let lower = tool_name.to_lowercase();
    TOOL_ICONS
        .iter()
        .find(|(name, _)| *name == lower)
        .map_or(DEFAULT_ICON, |(_, icon)| icon)
}

/// `ast_grep_search` → `Ast Grep Search`.
pub fn format_tool_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.replace('_', " ").chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = !ch.is_alphabetic();
    }
    out
}

/// Keep the first `max_chars` characters, appending `...` when cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let kept: String = s.chars().take(max_chars).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Keep the first `max_lines` lines, noting how many were dropped.
pub fn truncate_content(content: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.len() <= max_lines {
        return content.to_string();
    }
    format!(
        "{}\n... ({} more lines)",
        lines[..max_lines].join("\n"),
        lines.len() - max_lines
    )
}

fn input_str<'a>(input: &'a Value, key: &str) -> &'a str {
    input.get(key).and_then(Value::as_str).unwrap_or("")
}

/// One-line summary of a tool's input for the group title.
pub fn format_tool_input(tool_name: &str, input: &Value) -> String {
    match tool_name.to_lowercase().as_str() {
        "read" | "write" | "edit" => input_str(input, "filePath").to_string(),
        "bash" => {
            let description = input_str(input, "description");
            if description.is_empty() {
                truncate_chars(input_str(input, "command"), 60)
            } else {
                description.to_string()
            }
        }
        "grep" | "glob" => truncate_chars(input_str(input, "pattern"), 40),
        "task" => input_str(input, "description").to_string(),
        "webfetch" => truncate_chars(input_str(input, "url"), 50),
        _ => String::new(),
    }
}

/// Checklist rendering of a todo list.
pub fn format_todos(todos: &[Value]) -> String {
    todos
        .iter()
        .map(|todo| {
            let status = todo.get("status").and_then(Value::as_str).unwrap_or("pending");
            let icon = STATUS_ICONS
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(DEFAULT_STATUS_ICON, |(_, icon)| icon);
            format!("{icon} {}", input_str(todo, "content"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tool-specific rendering of captured output.
pub fn format_tool_output(tool_name: &str, input: &Value, output: &str) -> String {
    let body = if output.is_empty() {
        String::new()
    } else {
        truncate_content(output, MAX_BLOCK_LINES)
    };

    match tool_name.to_lowercase().as_str() {
        "todowrite" => match input.get("todos").and_then(Value::as_array) {
            Some(todos) if !todos.is_empty() => format_todos(todos),
            _ => body,
        },
        "bash" => {
            let command = input_str(input, "command");
            match (command.is_empty(), body.is_empty()) {
                (true, _) => body,
                (false, true) => format!("$ {command}"),
                (false, false) => format!("$ {command}\n{body}"),
            }
        }
        _ => body,
    }
}

/// Stateful renderer; tracks whether a log group is open.
pub struct Formatter<W: Write> {
    out: W,
    group_open: bool,
}

impl<W: Write> Formatter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            group_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    fn open_group(&mut self, title: &str) -> io::Result<()> {
        self.close_group()?;
        self.emit(&format!("::group::{title}"))?;
        self.group_open = true;
        Ok(())
    }

    fn close_group(&mut self) -> io::Result<()> {
        if self.group_open {
            self.group_open = false;
            self.emit("::endgroup::")?;
        }
        Ok(())
    }

    fn tool_use(&mut self, part: &Value) -> io::Result<()> {
        let tool_name = part
            .get("tool")
            .or_else(|| part.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let state = part.get("state");
        let empty = Value::Object(serde_json::Map::new());
        let input = state
            .and_then(|s| s.get("input"))
            .or_else(|| part.get("input"))
            .unwrap_or(&empty);
        let output = state
            .and_then(|s| s.get("output"))
            .and_then(Value::as_str)
            .unwrap_or("");

        let summary = format_tool_input(tool_name, input);
        let mut title = format!("{} {}", tool_icon(tool_name), format_tool_name(tool_name));
        if !summary.is_empty() {
            title.push_str(": ");
            title.push_str(&summary);
        }

        self.open_group(&title)?;
        let rendered = format_tool_output(tool_name, input, output);
        if !rendered.is_empty() {
            self.emit(&rendered)?;
        }
        Ok(())
    }

    fn tool_result(&mut self, part: &Value) -> io::Result<()> {
        let content = match part.get("content") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        if !content.is_empty() {
            self.emit("---")?;
            self.emit(&truncate_content(&content, MAX_BLOCK_LINES))?;
        }
        self.close_group()
    }

    fn text(&mut self, part: &Value) -> io::Result<()> {
        let text = input_str(part, "text");
        if text.trim().is_empty() {
            return Ok(());
        }
        self.close_group()?;
        self.emit(text)
    }

    /// Render one decoded event.
    pub fn process_event(&mut self, event: &Value) -> io::Result<()> {
        let empty = Value::Object(serde_json::Map::new());
        let part = event.get("part").unwrap_or(&empty);
        match EventKind::of(event) {
            EventKind::Lifecycle => Ok(()),
            EventKind::ToolUse => self.tool_use(part),
            EventKind::ToolResult => self.tool_result(part),
            EventKind::Text => self.text(part),
            EventKind::Other => {
                self.close_group()?;
                self.emit(&event.to_string())
            }
        }
    }

    /// Render one raw line; lines that are not JSON are printed unchanged.
    pub fn process_line(&mut self, line: &str) -> io::Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        match serde_json::from_str::<Value>(line) {
            Ok(event) if event.is_object() => self.process_event(&event),
            _ => {
                self.close_group()?;
                self.emit(line)
            }
        }
    }

    /// Close any group left open at end of stream.
    pub fn finish(&mut self) -> io::Result<()> {
        self.close_group()
    }
}

/// Render every line of `input` to `out`.
pub fn process_stream(mut input: impl BufRead, out: impl Write) -> io::Result<()> {
    let mut formatter = Formatter::new(out);
    let mut buf = Vec::new();
    while let Some(line) = next_line(&mut input, &mut buf)? {
        formatter.process_line(&line)?;
    }
    formatter.finish()
}

/// Read up to the next newline. Invalid UTF-8 is replaced, never rejected.
fn next_line(input: &mut impl BufRead, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if input.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Command line for a live agent run, line-buffered through `stdbuf` when
/// it is installed.
pub fn agent_command(agent: &str, prompt: &str) -> (String, Vec<String>) {
    let base = vec![
        agent.to_string(),
        "run".to_string(),
        "--format".to_string(),
        "json".to_string(),
        prompt.to_string(),
    ];
    match which::which("stdbuf") {
        Ok(stdbuf) => {
            let mut args = vec!["-oL".to_string()];
            args.extend(base);
            (stdbuf.to_string_lossy().into_owned(), args)
        }
        Err(_) => (agent.to_string(), base[1..].to_vec()),
    }
}

fn forward_lines(reader: impl Read, tx: Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        match next_line(&mut reader, &mut buf) {
            Ok(Some(line)) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("reading agent output: {e}");
                break;
            }
        }
    }
}

/// Run the agent and render its combined stdout/stderr. Returns the agent's
/// exit code.
pub fn run_agent_stream(agent: &str, prompt: &str, out: impl Write) -> anyhow::Result<i32> {
    let (program, args) = agent_command(agent, prompt);
    tracing::debug!(program = %program, "starting agent");

    let mut child = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| -> anyhow::Error {
            if e.kind() == io::ErrorKind::NotFound {
                ExitError::ToolNotFound {
                    tool: program.clone(),
                }
                .into()
            } else {
                anyhow::Error::new(e).context(format!("spawning {program}"))
            }
        })?;

    let stdout = child.stdout.take().context("failed to capture stdout")?;
    let stderr = child.stderr.take().context("failed to capture stderr")?;

    let (tx, rx) = channel();
    let stderr_tx = tx.clone();
    let stdout_reader = thread::spawn(move || forward_lines(stdout, tx));
    let stderr_reader = thread::spawn(move || forward_lines(stderr, stderr_tx));

    let mut formatter = Formatter::new(out);
    // Ends once both readers hit EOF and drop their senders.
    for line in rx {
        formatter
            .process_line(&line)
            .context("writing formatted output")?;
    }
    formatter.finish().context("writing formatted output")?;

    let _ = stdout_reader.join();
    let _ = stderr_reader.join();

    let status = child.wait().with_context(|| format!("waiting for {program}"))?;
    Ok(status.code().unwrap_or(-1))
}
