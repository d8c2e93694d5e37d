//! Runs one task for its agent: the Thought / Action / Observation loop.

use crate::crew::TaskOutput;
use crate::llm::Message;
use crate::tasks::TaskSpec;
use crate::tools::{self, ReactStep, ToolRef, parse_react, strip_code_fences};
use crate::{Ctx, StepError};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ITERATIONS: usize = 8;

const FORCE_FINAL: &str = "You have used tools enough times. Do not call any more tools. \
    Reply now with:\n\nThought: I can now give a complete answer\nFinal Answer: <the complete deliverable>";

const NO_TOOLS: &str = "No tools are available for this task. \
    Reply with your Final Answer.";

/// The user message for a task: trip request, task, criteria, then prior outputs.
pub fn task_prompt(task: &TaskSpec, topic: &str, context: &[TaskOutput]) -> String {
    let mut out = format!(
        "Trip request: {topic}\n\n\
         Current Task: {}\n\n\
         This is the expected criteria for your final answer: {}\n\
         You MUST return the actual complete content as the final answer, not a summary.",
        task.description.trim(),
        task.expected_output.trim()
    );

    if !context.is_empty() {
        out.push_str("\n\nThis is the context you're working with:\n");
        for prior in context {
            out.push_str(&format!(
                "\n### {} ({})\n{}\n",
                prior.task_name,
                prior.agent,
                prior.raw.trim()
            ));
        }
    }
    out
}

/// Drives the agent's model through tool calls until it gives a final answer.
pub struct AgentExecutor<'a> {
    task: &'a TaskSpec,
    max_iterations: usize,
}

impl<'a> AgentExecutor<'a> {
    pub fn new(task: &'a TaskSpec) -> Self {
        Self {
            task,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Model turns allowed before a final answer is demanded.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Returns the final answer with any wrapping code fence removed.
    ///
    /// Model errors propagate unchanged so the caller can decide whether to
    /// retry. An empty answer is a [`StepError::Failed`].
    pub fn execute(&self, prompt: &str, ctx: &mut Ctx) -> Result<String, StepError> {
        let agent = &self.task.agent;
        let tools = self.task.effective_tools();
        let mut messages = vec![
            Message::system(agent.system_message(tools)),
            Message::user(prompt),
        ];

        for iteration in 1..=self.max_iterations {
            let reply = agent.llm.chat(&messages)?;
            debug!(task = self.task.id, iteration, chars = reply.len(), "model replied");

            match parse_react(&reply) {
                ReactStep::FinalAnswer(answer) | ReactStep::Text(answer) => {
                    return self.finish(&answer);
                }
                ReactStep::Action { tool, input } => {
                    let observation = if tools.is_empty() {
                        NO_TOOLS.to_string()
                    } else {
                        self.use_tool(tools, &tool, &input, ctx)
                    };
                    messages.push(Message::assistant(until_observation(&reply)));
                    messages.push(Message::user(format!("Observation: {observation}")));
                }
            }
        }

        warn!(
            task = self.task.id,
            max_iterations = self.max_iterations,
            "iteration limit reached, demanding final answer"
        );
        ctx.log(format!("{}: iteration limit reached", self.task.id));
        messages.push(Message::user(FORCE_FINAL));

        let reply = agent.llm.chat(&messages)?;
        match parse_react(&reply) {
            ReactStep::FinalAnswer(answer) | ReactStep::Text(answer) => self.finish(&answer),
            ReactStep::Action { .. } => Err(StepError::Failed(format!(
                "task '{}' kept calling tools after {} iterations",
                self.task.id, self.max_iterations
            ))),
        }
    }

    fn use_tool(&self, tools: &[ToolRef], name: &str, input: &str, ctx: &mut Ctx) -> String {
        let agent = &self.task.agent.name;
        ctx.log(format!("{agent} -> {name}({input})"));

        let Some(tool) = tools::find(tools, name) else {
            warn!(task = self.task.id, tool = name, "unknown tool requested");
            let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
            return format!(
                "'{name}' is not a valid tool. Use one of [{}].",
                names.join(", ")
            );
        };

        match tool.call(input) {
            Ok(out) => {
                info!(task = self.task.id, tool = tool.name(), "tool call succeeded");
                out
            }
            Err(err) => {
                warn!(task = self.task.id, tool = tool.name(), error = %err, "tool call failed");
                format!("The tool failed: {err}. Try a different input or another tool.")
            }
        }
    }

    fn finish(&self, answer: &str) -> Result<String, StepError> {
        let answer = strip_code_fences(answer);
        if answer.is_empty() {
            return Err(StepError::Failed(format!(
                "agent '{}' returned an empty answer for task '{}'",
                self.task.agent.name, self.task.id
            )));
        }
        Ok(answer)
    }
}

/// Anything after `Observation:` was invented by the model.
fn until_observation(reply: &str) -> &str {
    reply
        .find("Observation:")
        .map_or(reply, |end| &reply[..end])
        .trim()
}
