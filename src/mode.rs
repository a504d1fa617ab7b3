//! Operating-mode detection from the triggering GitHub event.

use regex::Regex;

/// Mode used when nothing else applies.
pub const DEFAULT_MODE: &str = "agent";
/// Mode selected for review requests and reviewer assignment.
pub const REVIEW_MODE: &str = "review";

/// Events that always mean "review this pull request".
const PULL_REQUEST_EVENTS: &[&str] = &["pull_request", "pull_request_target"];

/// Inputs for [`detect_mode`], as supplied by the workflow.
#[derive(Debug, Clone, Default)]
pub struct EventContext<'a> {
    pub event_name: &'a str,
    pub input_mode: &'a str,
    pub bot_name: &'a str,
    pub comment_body: Option<&'a str>,
    pub review_body: Option<&'a str>,
}

fn mention_regex(bot_name: &str) -> Option<Regex> {
    // The handle must not continue into a longer one (`@bot-extended`, `@bot123`).
    Regex::new(&format!(
        r"(?i)(?:^|[^\w@])@{}(?:$|[^\w-])",
        regex::escape(bot_name)
    ))
    .ok()
}

fn review_word_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\breview\b").expect("valid review regex"))
}

/// True when `body` mentions `@bot_name` and contains the word "review".
///
/// Order and line breaks between the two do not matter. Variants such as
/// "reviewed" or "reviewer" do not count.
pub fn is_review_request(body: &str, bot_name: &str) -> bool {
    if body.is_empty() || bot_name.is_empty() {
        return false;
    }
    let Some(mention) = mention_regex(bot_name) else {
        return false;
    };
    mention.is_match(body) && review_word_regex().is_match(body)
}

/// Pick the mode for this run. First match wins:
///
/// 1. pull request events → `review`
/// 2. an explicit review request in the comment (or review) body → `review`
/// 3. a caller-specified mode other than `agent` → that mode
/// 4. `agent`
pub fn detect_mode(ctx: &EventContext<'_>) -> String {
    if PULL_REQUEST_EVENTS.contains(&ctx.event_name) {
        return REVIEW_MODE.to_string();
    }

    let body = ctx
        .comment_body
        .filter(|b| !b.is_empty())
        .or(ctx.review_body)
        .unwrap_or("");
    if is_review_request(body, ctx.bot_name) {
        return REVIEW_MODE.to_string();
    }

    if !ctx.input_mode.is_empty() && ctx.input_mode != DEFAULT_MODE {
        return ctx.input_mode.to_string();
    }

    DEFAULT_MODE.to_string()
}
