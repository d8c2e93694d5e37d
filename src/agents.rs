//! The four crew roles: planner, researcher, writer, reviewer.

use crate::llm::ChatModel;
use crate::tools::{self, ToolRef};
use std::fmt;
use std::sync::Arc;

const PLANNER_PROMPT: &str = "\
You are an expert travel planner AI. Your job is to create optimized, realistic,
budget-friendly and experience-rich travel itineraries. Follow these guidelines:

- Structure all plans into morning / afternoon / evening blocks.
- Recommend transport modes with realistic time estimates.
- Include free attractions, hidden gems, cultural experiences, and local food options.
- Adapt plans to the user's interests, weather, season, and budget.
- Keep recommendations specific, actionable, and practical.
- Add distances, opening hours, and travel durations when useful.";

const RESEARCHER_PROMPT: &str = "\
You are **Destination Analyst Lite**, an assistant that finds simple, reliable travel info.
Only provide short bullet points. Do NOT provide citations or long explanations.

Research Rules:
- Only include information if confident (otherwise skip it)
- Keep everything concise (max 7 bullets)
- Include numeric ranges only when easy (e.g., $200-$350)
- Focus on season, key places, local food, and typical budget";

const WRITER_PROMPT: &str = "\
You are the Travel Writer / Concierge Agent.
Input: itinerary outline + research.
Output: friendly, clear itinerary with day-by-day steps, booking checklist, packing list, and short local tips.
Keep tone helpful and concise.";

const REVIEWER_PROMPT: &str = "\
You are the Itinerary Reviewer. You receive a finished travel guide together with the
plan and research it was built from.
- Check timings, transport legs and opening hours for feasibility.
- Check that costs stay inside the stated budget range.
- Fix mistakes and fill obvious gaps directly in the guide.
- Never remove sections the traveler needs (itinerary, checklists, tips).";

/// A named role with a fixed prompt and goal, bound to a model client.
#[derive(Clone)]
pub struct AgentSpec {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub system_prompt: String,
    pub tools: Vec<ToolRef>,
    pub llm: Arc<dyn ChatModel>,
    pub allow_delegation: bool,
    pub verbose: bool,
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("model", &self.llm.model())
            .field("tools", &self.tool_names())
            .field("allow_delegation", &self.allow_delegation)
            .finish_non_exhaustive()
    }
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        llm: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: String::new(),
            system_prompt: String::new(),
            tools: Vec::new(),
            llm,
            allow_delegation: false,
            verbose: true,
        }
    }

    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolRef>) -> Self {
        self.tools = tools;
        self
    }

    /// Designs the milestone-based itinerary skeleton.
    pub fn planner(llm: Arc<dyn ChatModel>, tools: Vec<ToolRef>) -> Self {
        Self::new(
            "Travel Itinerary Planner",
            "Architect of smart, cost-efficient and enjoyable travel plans",
            "Design personalized itineraries that optimize time, cost, and experience. \
             Break down trips into morning-afternoon-evening activities, assign transport modes, \
             and include free attractions, hidden gems, and local food spots matching the user's budget.",
            llm,
        )
        .with_backstory(
            "You have planned hundreds of trips for travelers on tight budgets and \
             know how to pace a day so nobody ends up exhausted or stuck in transit.",
        )
        .with_system_prompt(PLANNER_PROMPT)
        .with_tools(tools)
    }

    /// Gathers a handful of short, reliable destination facts.
    pub fn researcher(llm: Arc<dyn ChatModel>, tools: Vec<ToolRef>) -> Self {
        Self::new(
            "Destination Analyst Lite",
            "Provide short, reliable travel facts.",
            "Help itinerary planning with minimal but accurate travel insights.",
            llm,
        )
        .with_backstory(
            "You are a fast and practical travel researcher who specializes in quick, \
             useful summaries instead of long detailed reports.",
        )
        .with_system_prompt(RESEARCHER_PROMPT)
        .with_tools(tools)
    }

    /// Turns plan and research into the traveler-facing guide.
    pub fn writer(llm: Arc<dyn ChatModel>, tools: Vec<ToolRef>) -> Self {
        Self::new(
            "Travel Writer / Concierge Agent",
            "Compose detailed, friendly, and actionable travel itineraries from provided outlines and research",
            "Produce clear day-by-day itineraries, packing and booking checklists, and concise local tips for travelers",
            llm,
        )
        .with_backstory(
            "You specialize in turning research and outlines into practical, engaging travel guides. \
             Your output should be helpful, concise, and easy to follow for travelers of all experience levels.",
        )
        .with_system_prompt(WRITER_PROMPT)
        .with_tools(tools)
    }

    pub fn reviewer(llm: Arc<dyn ChatModel>, tools: Vec<ToolRef>) -> Self {
        Self::new(
            "Itinerary Reviewer",
            "Quality gate for travel guides before they reach the traveler",
            "Catch infeasible schedules, budget overruns and missing essentials, \
             and return a corrected, ready-to-use guide.",
            llm,
        )
        .with_backstory(
            "You used to run a travel agency's complaints desk, so you know exactly \
             which itinerary mistakes ruin a trip.",
        )
        .with_system_prompt(REVIEWER_PROMPT)
        .with_tools(tools)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// The full system message for a task run with `tools`.
    pub fn system_message(&self, tools: &[ToolRef]) -> String {
        let mut out = format!("You are {}.", self.role.trim_end_matches('.'));
        if !self.backstory.is_empty() {
            out.push(' ');
            out.push_str(&self.backstory);
        }
        out.push_str(&format!("\nYour personal goal is: {}", self.goal));

        if !self.system_prompt.is_empty() {
            out.push_str("\n\n");
            out.push_str(self.system_prompt.trim());
        }

        if tools.is_empty() {
            out.push_str(
                "\n\nWhen you are ready, reply in exactly this format:\n\n\
                 Thought: I can now give a complete answer\n\
                 Final Answer: <the complete deliverable, not a summary of it>",
            );
            return out;
        }

        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        out.push_str(&format!(
            "\n\nYou can use only these tools:\n\n{}\n\n\
             To use a tool, reply with exactly:\n\n\
             Thought: what you need and why\n\
             Action: one of [{}]\n\
             Action Input: the input for the tool\n\n\
             Then stop and wait for the Observation. Use one tool per reply.\n\
             When you have everything you need, reply with:\n\n\
             Thought: I can now give a complete answer\n\
             Final Answer: <the complete deliverable, not a summary of it>",
            tools::describe(tools),
            names.join(", ")
        ));
        out
    }
}
