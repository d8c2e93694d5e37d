//! Task descriptors and the fixed four-step travel task list.

use crate::agents::AgentSpec;
use crate::tools::{ToolRef, research_tools};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const PLANNING: &str = "planning";
pub const RESEARCH: &str = "research";
pub const WRITING: &str = "writing";
pub const REVIEW: &str = "review";

/// A unit of work with a description and expected output, assigned to one agent.
#[derive(Clone)]
pub struct TaskSpec {
    /// Stable step key.
    pub id: &'static str,
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub agent: Arc<AgentSpec>,
    /// When set, replaces the agent's own tools for this task.
    pub tools: Option<Vec<ToolRef>>,
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("agent", &self.agent.name)
            .field(
                "tools",
                &self.effective_tools().iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl TaskSpec {
    pub fn effective_tools(&self) -> &[ToolRef] {
        self.tools.as_deref().unwrap_or(&self.agent.tools)
    }

    /// Replace `{key}` placeholders in the description and expected output.
    pub fn interpolate(&self, inputs: &HashMap<String, String>) -> TaskSpec {
        let fill = |text: &str| {
            inputs.iter().fold(text.to_string(), |acc, (key, value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
        };
        TaskSpec {
            description: fill(&self.description),
            expected_output: fill(&self.expected_output),
            ..self.clone()
        }
    }
}

/// Task 1: draft a personalized itinerary plan.
pub fn planning_task(agent: Arc<AgentSpec>) -> TaskSpec {
    TaskSpec {
        id: PLANNING,
        name: "Travel Planning".into(),
        description: "Analyze the user's travel preferences, budget, and trip duration. \
            Create a milestone-based itinerary structured into morning, afternoon, and evening activities. \
            Include transport modes, distances, estimated times, cultural experiences, hidden gems, local food, and free attractions. \
            Account for weather, season, and user interests."
            .into(),
        expected_output: "A structured, actionable travel plan with 3-5 milestones (e.g., Day 1, Day 2, Day 3), \
            complete with timings, locations, travel durations, recommended meals, and notable experiences. \
            Should be practical, budget-friendly, and optimized for maximum enjoyment."
            .into(),
        agent,
        tools: None,
    }
}

/// Task 2: light research. `None` means the default search + calculator kit.
pub fn research_task(agent: Arc<AgentSpec>, tools: Option<Vec<ToolRef>>) -> TaskSpec {
    TaskSpec {
        id: RESEARCH,
        name: "Quick Travel Research".into(),
        description: "Collect short and reliable travel information for the selected destination. \
            Focus ONLY on: best season to visit, 2 key attractions, 1 local food suggestion, \
            and typical cost range for budget travelers."
            .into(),
        expected_output: "A short bullet list including:\n\
            Best visiting season\n\
            2 recommended attractions (with short notes)\n\
            1 local food or cultural experience\n\
            Approximate budget range (e.g. $200-$350)\n\
            *Do not provide citations, only concise facts.*"
            .into(),
        agent,
        tools: Some(tools.unwrap_or_else(research_tools)),
    }
}

/// Task 3: author the traveler-facing guide.
pub fn writing_task(agent: Arc<AgentSpec>) -> TaskSpec {
    TaskSpec {
        id: WRITING,
        name: "Travel Itinerary Authoring".into(),
        description: "Using the provided travel outlines and research, create detailed, user-friendly travel itineraries. \
            Include day-by-day schedules, suggested activities, booking and packing checklists, and concise local tips. \
            Ensure the output is clear, actionable, and easy to follow for travelers of all experience levels."
            .into(),
        expected_output: "A polished, Markdown-formatted travel guide including:\n\
            - Day-by-day itinerary with activities and timings\n\
            - Booking checklist for accommodations, transport, and tours\n\
            - Packing checklist tailored to the destination and planned activities\n\
            - Concise, practical local tips (restaurants, attractions, cultural advice)"
            .into(),
        agent,
        tools: None,
    }
}

/// Task 4: review and correct the guide; its output is the pipeline result.
pub fn review_task(agent: Arc<AgentSpec>) -> TaskSpec {
    TaskSpec {
        id: REVIEW,
        name: "Itinerary Review".into(),
        description: "Review the travel guide for '{topic}' against the plan and research. \
            Check that timings and transport legs are feasible, that costs fit the budget range, \
            and that the booking and packing checklists cover the planned activities. \
            Correct problems directly in the guide."
            .into(),
        expected_output: "The corrected travel guide in Markdown, with every section of the writer's guide kept, \
            followed by a short '## Review Notes' section listing what was changed and why."
            .into(),
        agent,
        tools: None,
    }
}

/// The fixed plan -> research -> write -> review task list.
pub fn build_travel_tasks(
    planner: Arc<AgentSpec>,
    researcher: Arc<AgentSpec>,
    writer: Arc<AgentSpec>,
    reviewer: Arc<AgentSpec>,
    research_tools: Option<Vec<ToolRef>>,
) -> Vec<TaskSpec> {
    vec![
        planning_task(planner),
        research_task(researcher, research_tools),
        writing_task(writer),
        review_task(reviewer),
    ]
}
