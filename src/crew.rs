//! Sequential crew: wraps each task in a workflow step and runs them in order.

use crate::agents::AgentSpec;
use crate::executor::{AgentExecutor, DEFAULT_MAX_ITERATIONS, task_prompt};
use crate::llm::{ChatModel, ConfigError, LlmConfig, LlmOverrides};
use crate::tasks::{TaskSpec, build_travel_tasks};
use crate::{Agent, Ctx, Outcome, RetryHint, Runner, StepError, StepResult, Workflow, WorkflowError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Backoff when a rate-limited response carries no `Retry-After`.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("trip request is empty")]
    EmptyTopic,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Step(#[from] StepError),
}

/// The finished output of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput {
    pub task_id: &'static str,
    pub task_name: String,
    pub agent: String,
    pub raw: String,
}

/// State threaded through the workflow.
#[derive(Debug, Clone, Default)]
pub struct CrewState {
    pub outputs: Vec<TaskOutput>,
}

/// What [`Crew::kickoff`] returns.
#[derive(Debug, Clone)]
pub struct CrewOutput {
    /// Output of the last task.
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
    /// Step transitions, retries and tool calls, in order.
    pub log: Vec<String>,
}

struct TaskStep {
    task: TaskSpec,
    last: bool,
    max_iterations: usize,
}

impl Agent<CrewState> for TaskStep {
    fn name(&self) -> &'static str {
        self.task.id
    }

    fn run(&mut self, mut state: CrewState, ctx: &mut Ctx) -> StepResult<CrewState> {
        let task = self.task.interpolate(ctx.inputs());
        let prompt = task_prompt(&task, ctx.input("topic").unwrap_or_default(), &state.outputs);
        info!(task = task.id, agent = %task.agent.name, model = task.agent.llm.model(), "task started");

        let result = AgentExecutor::new(&task)
            .with_max_iterations(self.max_iterations)
            .execute(&prompt, ctx);

        match result {
            Ok(raw) => {
                state.outputs.push(TaskOutput {
                    task_id: task.id,
                    task_name: task.name.clone(),
                    agent: task.agent.name.clone(),
                    raw,
                });
                let outcome = if self.last {
                    Outcome::Done
                } else {
                    Outcome::Continue
                };
                Ok((state, outcome))
            }
            Err(StepError::Transient(reason)) => Ok((state, Outcome::Retry(RetryHint::new(reason)))),
            Err(StepError::RateLimited { retry_after, .. }) => {
                let wait = retry_after.unwrap_or(DEFAULT_BACKOFF).min(MAX_BACKOFF);
                Ok((state, Outcome::Wait(wait)))
            }
            Err(StepError::Failed(reason)) => Ok((state, Outcome::Fail(reason))),
            Err(err) => Err(err),
        }
    }
}

/// An ordered list of tasks run one after another.
pub struct Crew {
    name: &'static str,
    tasks: Vec<TaskSpec>,
    max_retries: usize,
    max_iterations: usize,
}

impl Crew {
    pub fn new(name: &'static str, tasks: Vec<TaskSpec>) -> Self {
        Self {
            name,
            tasks,
            max_retries: 3,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Re-runs allowed per task after transient or rate-limit errors.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    /// Run every task in order for `topic` and return the last task's output.
    pub fn kickoff(&self, topic: &str) -> Result<CrewOutput, PipelineError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(PipelineError::EmptyTopic);
        }

        let count = self.tasks.len();
        let steps = self.tasks.iter().enumerate().map(|(i, task)| {
            Box::new(TaskStep {
                task: task.clone(),
                last: i + 1 == count,
                max_iterations: self.max_iterations,
            }) as Box<dyn Agent<CrewState>>
        });
        let wf = Workflow::builder(self.name).sequence(steps).build()?;

        info!(crew = self.name, tasks = count, topic, "kickoff");
        let mut ctx = Ctx::with_inputs([("topic", topic)]);
        let mut runner = Runner::new(wf)
            .with_max_retries(self.max_retries)
            .with_tracing();

        let state = runner.run(CrewState::default(), &mut ctx)?;

        Ok(CrewOutput {
            raw: state.outputs.last().map(|o| o.raw.clone()).unwrap_or_default(),
            tasks_output: state.outputs,
            log: ctx.take_logs(),
        })
    }
}

fn client(config: &LlmConfig, overrides: &LlmOverrides) -> Result<Arc<dyn ChatModel>, ConfigError> {
    Ok(Arc::new(config.build_client(overrides)?))
}

/// The four-agent travel crew, each agent with its own client.
pub fn travel_crew(config: &LlmConfig, overrides: &LlmOverrides) -> Result<Crew, ConfigError> {
    let planner = AgentSpec::planner(client(config, overrides)?, vec![]);
    let researcher = AgentSpec::researcher(client(config, overrides)?, vec![]);
    let writer = AgentSpec::writer(client(config, overrides)?, vec![]);
    let reviewer = AgentSpec::reviewer(client(config, overrides)?, vec![]);

    let tasks = build_travel_tasks(
        Arc::new(planner),
        Arc::new(researcher),
        Arc::new(writer),
        Arc::new(reviewer),
        None,
    );
    Ok(Crew::new("travel_crew", tasks))
}

/// Build the crew from the environment and run it for `topic`.
pub fn run_pipeline(topic: &str) -> Result<String, PipelineError> {
    let crew = travel_crew(&LlmConfig::from_env(), &LlmOverrides::default())?;
    Ok(crew.kickoff(topic)?.raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{PLANNING, RESEARCH, REVIEW, WRITING, planning_task};
    use crate::testing::ScriptedModel;
    use crate::tools::{CalculatorTool, ToolRef};

    fn travel(model: &Arc<ScriptedModel>, research_tools: Vec<ToolRef>) -> Crew {
        let llm: Arc<dyn ChatModel> = model.clone();
        let tasks = build_travel_tasks(
            Arc::new(AgentSpec::planner(llm.clone(), vec![])),
            Arc::new(AgentSpec::researcher(llm.clone(), vec![])),
            Arc::new(AgentSpec::writer(llm.clone(), vec![])),
            Arc::new(AgentSpec::reviewer(llm, vec![])),
            Some(research_tools),
        );
        Crew::new("test_crew", tasks)
    }

    fn planning_only(model: &Arc<ScriptedModel>) -> Crew {
        let llm: Arc<dyn ChatModel> = model.clone();
        Crew::new(
            "plan_only",
            vec![planning_task(Arc::new(AgentSpec::planner(llm, vec![])))],
        )
    }

    #[test]
    fn runs_tasks_in_order_and_returns_review() {
        let model = Arc::new(ScriptedModel::replying([
            "Final Answer: Day 1 Alfama",
            "Final Answer: - Best season: spring",
            "Final Answer: # Lisbon guide",
            "Thought: fixed\nFinal Answer: ```markdown\n# Lisbon guide\n## Review Notes\n- ok\n```",
        ]));
        let out = travel(&model, vec![]).kickoff("3 days in Lisbon").unwrap();

        let ids: Vec<&str> = out.tasks_output.iter().map(|t| t.task_id).collect();
        assert_eq!(ids, vec![PLANNING, RESEARCH, WRITING, REVIEW]);
        assert_eq!(out.raw, "# Lisbon guide\n## Review Notes\n- ok");
        assert_eq!(out.tasks_output[0].agent, "Travel Itinerary Planner");
        assert_eq!(
            out.log,
            vec!["planning -> research", "research -> writing", "writing -> review"]
        );
    }

    #[test]
    fn later_tasks_see_topic_and_prior_outputs() {
        let model = Arc::new(ScriptedModel::replying([
            "Final Answer: Day 1 Alfama",
            "Final Answer: - Best season: spring",
            "Final Answer: # Lisbon guide",
            "Final Answer: reviewed",
        ]));
        travel(&model, vec![]).kickoff("3 days in Lisbon").unwrap();

        let planning = model.last_message(0);
        assert!(planning.starts_with("Trip request: 3 days in Lisbon"));
        assert!(!planning.contains("context you're working with"));

        let writing = model.last_message(2);
        assert!(writing.contains("Day 1 Alfama"));
        assert!(writing.contains("Best season: spring"));

        let review = model.last_message(3);
        assert!(review.contains("travel guide for '3 days in Lisbon'"));
        assert!(review.contains("# Lisbon guide"));
    }

    #[test]
    fn research_tool_call_feeds_observation_back() {
        let model = Arc::new(ScriptedModel::replying([
            "Final Answer: plan",
            "Thought: budget\nAction: calculator\nAction Input: 3 * 85",
            "Final Answer: - Budget: $255",
            "Final Answer: guide",
            "Final Answer: reviewed",
        ]));
        let out = travel(&model, vec![Arc::new(CalculatorTool) as ToolRef])
            .kickoff("Lisbon")
            .unwrap();

        assert_eq!(model.last_message(2), "Observation: 255");
        assert_eq!(out.tasks_output[1].raw, "- Budget: $255");
        assert!(out.log.iter().any(|l| l.ends_with("calculator(3 * 85)")));
    }

    #[test]
    fn transient_errors_are_retried() {
        let model = Arc::new(ScriptedModel::new([
            Err(StepError::transient("http status 503")),
            Ok("Final Answer: plan".to_string()),
        ]));
        let out = planning_only(&model).kickoff("Rome").unwrap();
        assert_eq!(out.raw, "plan");
        assert_eq!(out.log, vec!["planning retry 1: http status 503"]);
    }

    #[test]
    fn rate_limits_wait_then_retry() {
        let model = Arc::new(ScriptedModel::new([
            Err(StepError::RateLimited {
                message: "http status 429".into(),
                retry_after: Some(Duration::from_millis(1)),
            }),
            Ok("Final Answer: plan".to_string()),
        ]));
        let out = planning_only(&model).kickoff("Rome").unwrap();
        assert_eq!(out.raw, "plan");
        assert_eq!(out.log, vec!["planning waiting 1ms"]);
    }

    #[test]
    fn retries_are_bounded() {
        let model = Arc::new(ScriptedModel::new([
            Err(StepError::transient("down")),
            Err(StepError::transient("down")),
        ]));
        let err = planning_only(&model)
            .with_max_retries(1)
            .kickoff("Rome")
            .unwrap_err();
        assert!(err.to_string().contains("exceeded max retries (1)"));
    }

    #[test]
    fn invalid_errors_stop_immediately() {
        let model = Arc::new(ScriptedModel::new([
            Err(StepError::invalid("http status 401")),
            Ok("Final Answer: never".to_string()),
        ]));
        let err = planning_only(&model).kickoff("Rome").unwrap_err();
        assert!(matches!(err, PipelineError::Step(StepError::Invalid(_))));
        assert_eq!(model.calls().len(), 1);
    }

    #[test]
    fn empty_answer_fails_the_run() {
        let model = Arc::new(ScriptedModel::replying(["Final Answer:"]));
        let err = planning_only(&model).kickoff("Rome").unwrap_err();
        assert!(matches!(err, PipelineError::Step(StepError::Failed(_))));
    }

    #[test]
    fn blank_topic_is_rejected() {
        let model = Arc::new(ScriptedModel::replying(["Final Answer: plan"]));
        assert!(matches!(
            planning_only(&model).kickoff("   "),
            Err(PipelineError::EmptyTopic)
        ));
        assert!(model.calls().is_empty());
    }

    #[test]
    fn empty_crew_is_a_workflow_error() {
        let err = Crew::new("empty", vec![]).kickoff("Rome").unwrap_err();
        assert!(matches!(err, PipelineError::Workflow(_)));
    }

    #[test]
    fn travel_crew_requires_api_key() {
        let config = LlmConfig::from_lookup(|_| None);
        assert!(matches!(
            travel_crew(&config, &LlmOverrides::default()),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn travel_crew_wires_four_routed_agents() {
        let config = LlmConfig::from_lookup(|key| {
            (key == "OPENROUTER_API_KEY").then(|| "sk-test".to_string())
        });
        let crew = travel_crew(&config, &LlmOverrides::default().model("openai/gpt-4o-mini")).unwrap();

        assert_eq!(crew.tasks().len(), 4);
        for task in crew.tasks() {
            assert_eq!(task.agent.llm.model(), "openrouter/openai/gpt-4o-mini");
        }
        assert_eq!(crew.tasks()[1].effective_tools().len(), 2);
    }
}
