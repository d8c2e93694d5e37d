//! A four-agent travel crew: a planner, a researcher, a writer and a reviewer
//! turn a trip request into a Markdown itinerary.
//!
//! Each task is a step in a sequential [`Workflow`]; the [`Runner`] executes
//! them in order, retrying transient model failures. Agents talk to an
//! OpenAI-compatible endpoint (OpenRouter by default) through [`llm::LlmClient`]
//! and may call [`tools`] in a Thought / Action / Observation loop.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use travel_crew::agents::AgentSpec;
//! use travel_crew::crew::Crew;
//! use travel_crew::llm::{ChatModel, Message};
//! use travel_crew::tasks::build_travel_tasks;
//! use travel_crew::StepError;
//!
//! struct Canned;
//! impl ChatModel for Canned {
//!     fn model(&self) -> &str { "canned" }
//!     fn chat(&self, _messages: &[Message]) -> Result<String, StepError> {
//!         Ok("Thought: done\nFinal Answer: # Day 1\nWalk the old town.".into())
//!     }
//! }
//!
//! let llm: Arc<dyn ChatModel> = Arc::new(Canned);
//! let tasks = build_travel_tasks(
//!     Arc::new(AgentSpec::planner(llm.clone(), vec![])),
//!     Arc::new(AgentSpec::researcher(llm.clone(), vec![])),
//!     Arc::new(AgentSpec::writer(llm.clone(), vec![])),
//!     Arc::new(AgentSpec::reviewer(llm, vec![])),
//!     Some(vec![]),
//! );
//!
//! let out = Crew::new("demo", tasks).kickoff("A weekend in Porto").unwrap();
//! assert_eq!(out.tasks_output.len(), 4);
//! assert_eq!(out.raw, "# Day 1\nWalk the old town.");
//! ```
//!
//! With `OPENROUTER_API_KEY` set, [`crew::run_pipeline`] does the same against
//! the real model.

mod agent;
mod ctx;
mod runner;
mod workflow;

pub mod agents;
pub mod crew;
pub mod executor;
pub mod llm;
pub mod tasks;
pub mod tools;

#[cfg(test)]
mod testing;

pub use agent::{Agent, Outcome, RetryHint, StepError, StepResult};
pub use crew::{Crew, CrewOutput, PipelineError, TaskOutput, run_pipeline, travel_crew};
pub use ctx::Ctx;
pub use runner::{ErrorEvent, Runner, StepEvent};
pub use workflow::{Workflow, WorkflowBuilder, WorkflowError};
