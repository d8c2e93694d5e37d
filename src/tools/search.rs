use super::{Tool, http};
use crate::agent::StepError;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";
const DEFAULT_MAX_RESULTS: usize = 5;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Web search backed by the DuckDuckGo Instant Answer API.
pub struct WebSearchTool {
    endpoint: String,
    max_results: usize,
    agent: ureq::Agent,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            agent: http::agent(SEARCH_TIMEOUT),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }
}

impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for short facts about a destination. \
         Input: a plain-text search query, e.g. `Lisbon best time to visit`."
    }

    fn call(&self, input: &str) -> Result<String, StepError> {
        let query = input.trim().trim_matches('"');
        if query.is_empty() {
            return Err(StepError::invalid("search query is empty"));
        }
        debug!(query, endpoint = %self.endpoint, "web search");

        let answer: InstantAnswer = http::get_json(
            &self.agent,
            &self.endpoint,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )?;
        Ok(answer.render(query, self.max_results))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    definition: String,
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RelatedTopic {
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
    /// Present on grouped entries instead of `Text`.
    topics: Vec<RelatedTopic>,
}

impl RelatedTopic {
    fn flatten<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            out.push((text, self.first_url.as_deref().unwrap_or_default()));
        }
        for topic in &self.topics {
            topic.flatten(out);
        }
    }
}

impl InstantAnswer {
    fn render(&self, query: &str, max_results: usize) -> String {
        let mut lines = Vec::new();

        if !self.abstract_text.trim().is_empty() {
            let heading: &str = if self.heading.is_empty() { query } else { &self.heading };
            lines.push(bullet(
                &format!("{heading}: {}", self.abstract_text.trim()),
                &self.abstract_url,
            ));
        }
        if !self.definition.trim().is_empty() {
            lines.push(bullet(self.definition.trim(), ""));
        }

        let mut related = Vec::new();
        for topic in &self.related_topics {
            topic.flatten(&mut related);
        }
        for (text, url) in related {
            if lines.len() >= max_results {
                break;
            }
            lines.push(bullet(text, url));
        }

        if lines.is_empty() {
            return format!("No results found for \"{query}\". Try a broader query.");
        }
        lines.truncate(max_results);
        format!("Results for \"{query}\":\n{}", lines.join("\n"))
    }
}

fn bullet(text: &str, url: &str) -> String {
    if url.is_empty() {
        format!("- {text}")
    } else {
        format!("- {text} ({url})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> InstantAnswer {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn renders_abstract_then_related_topics() {
        let answer = parse(json!({
            "Heading": "Lisbon",
            "AbstractText": "Lisbon is the capital of Portugal.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Lisbon",
            "RelatedTopics": [
                { "Text": "Belem Tower - fortified tower", "FirstURL": "https://duckduckgo.com/Belem_Tower" },
                { "Name": "Food", "Topics": [
                    { "Text": "Pastel de nata - custard tart", "FirstURL": "https://duckduckgo.com/Pastel_de_nata" }
                ]}
            ]
        }));

        let out = answer.render("lisbon", 5);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Results for \"lisbon\":");
        assert_eq!(
            lines[1],
            "- Lisbon: Lisbon is the capital of Portugal. (https://en.wikipedia.org/wiki/Lisbon)"
        );
        assert!(lines[2].starts_with("- Belem Tower"));
        assert!(lines[3].starts_with("- Pastel de nata"));
    }

    #[test]
    fn caps_results() {
        let topics: Vec<_> = (0..10)
            .map(|i| json!({ "Text": format!("fact {i}"), "FirstURL": "" }))
            .collect();
        let answer = parse(json!({ "RelatedTopics": topics }));

        let out = answer.render("x", 3);
        assert_eq!(out.lines().count(), 4);
        assert!(out.ends_with("- fact 2"));
    }

    #[test]
    fn empty_answer_says_so() {
        let answer = parse(json!({ "Heading": "", "RelatedTopics": [] }));
        assert_eq!(
            answer.render("zzqx", 5),
            "No results found for \"zzqx\". Try a broader query."
        );
    }

    #[test]
    fn blank_query_is_invalid() {
        let err = WebSearchTool::new().call("  \"\" ").unwrap_err();
        assert!(matches!(err, StepError::Invalid(_)));
    }

    #[test]
    fn unreachable_endpoint_is_an_error() {
        let tool = WebSearchTool::new().with_endpoint("http://localhost:1/");
        assert!(tool.call("porto").is_err());
    }
}
