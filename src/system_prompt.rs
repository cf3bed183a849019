//! System prompt construction
//!
//! The prompt establishes the agent's role and embeds the workflow
//! dependency chain so the model sees it on every request.

use crate::workflow::dependency_summary;

/// Base system prompt establishing the agent's role
const BASE_PROMPT: &str = r"You are an assistant for Ghostwriter, a penetration testing report management platform. You search, create and link clients, projects, reports and findings by calling the provided tools.

Call one tool at a time and wait for its result before deciding the next step. Reuse ids exactly as they appear in tool results; never invent an id or a codename. If a tool returns an error, read it, fix the arguments and try again or explain the problem to the user.

When the task is done, answer in plain text without calling a tool.";

/// Build the complete system prompt for a run.
pub fn build_system_prompt() -> String {
    let mut prompt = String::from(BASE_PROMPT);
    prompt.push_str("\n\n<workflow>\n");
    prompt.push_str(&dependency_summary());
    prompt.push_str("Call explain_workflow for the full guidance, including search-first alternatives.\n");
    prompt.push_str("</workflow>");
    prompt
}
