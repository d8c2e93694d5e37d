//! Tools agents can call while working on a task, plus the HTTP and
//! reply-parsing helpers they share.

pub mod calculator;
pub mod http;
pub mod parse;
pub mod search;

pub use calculator::CalculatorTool;
pub use parse::{ReactStep, parse_react, strip_code_fences};
pub use search::WebSearchTool;

use crate::agent::StepError;
use std::sync::Arc;

/// A callable capability an agent may invoke during task execution.
pub trait Tool: Send + Sync {
    /// Identifier the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// One or two sentences telling the model when and how to use the tool.
    fn description(&self) -> &str;

    fn call(&self, input: &str) -> Result<String, StepError>;
}

pub type ToolRef = Arc<dyn Tool>;

/// The minimal research kit: web search and calculator.
pub fn research_tools() -> Vec<ToolRef> {
    vec![
        Arc::new(WebSearchTool::new()) as ToolRef,
        Arc::new(CalculatorTool),
    ]
}

/// Look a tool up by the name a model wrote, ignoring case.
pub fn find<'a>(tools: &'a [ToolRef], name: &str) -> Option<&'a ToolRef> {
    let name = name.trim();
    tools.iter().find(|t| t.name().eq_ignore_ascii_case(name))
}

/// `- name: description` lines for a system prompt.
pub fn describe(tools: &[ToolRef]) -> String {
    tools
        .iter()
        .map(|t| format!("- {}: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_kit_is_search_then_calculator() {
        let names: Vec<String> = research_tools().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["web_search", "calculator"]);
    }

    #[test]
    fn find_ignores_case_and_whitespace() {
        let tools = research_tools();
        assert_eq!(find(&tools, " Calculator ").map(|t| t.name()), Some("calculator"));
        assert!(find(&tools, "rag_search").is_none());
    }

    #[test]
    fn describe_lists_each_tool() {
        let text = describe(&research_tools());
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("- web_search: "));
    }
}
