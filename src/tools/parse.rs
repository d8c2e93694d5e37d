/// Remove a Markdown code fence wrapping the whole response, if present.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    // Drop the opening ```lang line and a closing ``` line when there is one.
    let end = if lines.len() > 1 && lines[lines.len() - 1].trim() == "```" {
        lines.len() - 1
    } else {
        lines.len()
    };
    // Another fence inside means the block is only part of the answer.
    if lines[1..end].iter().any(|line| line.trim_start().starts_with("```")) {
        return trimmed.to_string();
    }
    lines[1..end].join("\n").trim().to_string()
}

/// What a model reply asks the executor to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactStep {
    /// Run `tool` with `input`, then feed the observation back.
    Action { tool: String, input: String },
    /// The task is finished.
    FinalAnswer(String),
    /// Neither marker present.
    Text(String),
}

const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const OBSERVATION: &str = "Observation:";
const FINAL_ANSWER: &str = "Final Answer:";

/// Parse a Thought / Action / Action Input / Final Answer reply.
///
/// When a reply contains an action before a final answer, the action wins:
/// anything after it was written without seeing the observation.
pub fn parse_react(reply: &str) -> ReactStep {
    let action_at = find_marker(reply, ACTION);
    let final_at = reply.find(FINAL_ANSWER);

    match (action_at, final_at) {
        (Some(a), Some(f)) if a < f => parse_action(&reply[a..]).unwrap_or_else(|| final_answer(&reply[f..])),
        (Some(a), None) => parse_action(&reply[a..]).unwrap_or_else(|| ReactStep::Text(reply.trim().to_string())),
        (_, Some(f)) => final_answer(&reply[f..]),
        (None, None) => ReactStep::Text(reply.trim().to_string()),
    }
}

fn final_answer(from_marker: &str) -> ReactStep {
    ReactStep::FinalAnswer(from_marker[FINAL_ANSWER.len()..].trim().to_string())
}

/// `Action:` at the start of a line, not the `Action:` inside `Action Input:`.
fn find_marker(text: &str, marker: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        if line.trim_start().starts_with(marker) {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

fn parse_action(from_marker: &str) -> Option<ReactStep> {
    let rest = &from_marker[ACTION.len()..];
    let (tool_line, after) = rest.split_once('\n').unwrap_or((rest, ""));
    let tool = clean(tool_line);
    if tool.is_empty() {
        return None;
    }

    let input = match after.find(ACTION_INPUT) {
        Some(i) => {
            let raw = &after[i + ACTION_INPUT.len()..];
            let raw = raw.find(OBSERVATION).map_or(raw, |end| &raw[..end]);
            tool_input(raw)
        }
        None => String::new(),
    };

    Some(ReactStep::Action { tool, input })
}

fn clean(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '`' || c == '"' || c == '\'').trim().to_string()
}

/// Models often send `{"query": "..."}`; unwrap a single string argument.
fn tool_input(raw: &str) -> String {
    let cleaned = clean(&strip_code_fences(raw));
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&cleaned)
        && let Some(s) = map.values().find_map(|v| v.as_str())
    {
        return s.trim().to_string();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- code fences ---

    #[test]
    fn strips_wrapping_fence() {
        assert_eq!(strip_code_fences("```markdown\n# Day 1\nAlfama\n```"), "# Day 1\nAlfama");
    }

    #[test]
    fn leaves_unfenced_text() {
        assert_eq!(strip_code_fences("  # Day 1 \n"), "# Day 1");
    }

    #[test]
    fn keeps_leading_block_followed_by_prose() {
        let answer = "```bash\nbook.sh\n```\n\n## Day 1\nAlfama";
        assert_eq!(strip_code_fences(answer), answer);
    }

    #[test]
    fn keeps_answer_made_of_several_blocks() {
        let answer = "```text\nPacking\n```\n```text\nBooking\n```";
        assert_eq!(strip_code_fences(answer), answer);
    }

    #[test]
    fn tolerates_missing_closing_fence() {
        assert_eq!(strip_code_fences("```\nDay 1"), "Day 1");
    }

    // --- ReAct ---

    #[test]
    fn parses_action_and_input() {
        let reply = "Thought: I need the season.\nAction: web_search\nAction Input: Lisbon best time to visit\n";
        assert_eq!(
            parse_react(reply),
            ReactStep::Action {
                tool: "web_search".into(),
                input: "Lisbon best time to visit".into()
            }
        );
    }

    #[test]
    fn unwraps_json_input_and_quoted_tool() {
        let reply = "Action: `calculator`\nAction Input: {\"expression\": \"3 * 85\"}";
        assert_eq!(
            parse_react(reply),
            ReactStep::Action {
                tool: "calculator".into(),
                input: "3 * 85".into()
            }
        );
    }

    #[test]
    fn action_before_hallucinated_answer_wins() {
        let reply = "Action: calculator\nAction Input: 2 + 2\nObservation: 4\nFinal Answer: 4";
        assert!(matches!(parse_react(reply), ReactStep::Action { ref input, .. } if input == "2 + 2"));
    }

    #[test]
    fn final_answer_keeps_multiline_body() {
        let reply = "Thought: done\nFinal Answer: - Best season: spring\n- Budget: $200-$350";
        assert_eq!(
            parse_react(reply),
            ReactStep::FinalAnswer("- Best season: spring\n- Budget: $200-$350".into())
        );
    }

    #[test]
    fn plain_text_is_text() {
        assert_eq!(parse_react(" just an itinerary "), ReactStep::Text("just an itinerary".into()));
    }

    #[test]
    fn empty_action_name_falls_back_to_text() {
        assert!(matches!(parse_react("Action:\nAction Input: x"), ReactStep::Text(_)));
    }
}
