use crate::{Ctx, Outcome, StepError, Workflow};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Passed to the `on_step` hook after each successful step.
pub struct StepEvent<'a> {
    pub step: &'a str,
    pub outcome: &'a Outcome,
    pub duration: Duration,
    pub step_number: usize,
    pub retries: usize,
}

/// Passed to the `on_error` hook when a step errors or a limit is exceeded.
pub struct ErrorEvent<'a> {
    pub step: &'a str,
    pub error: &'a StepError,
    pub step_number: usize,
}

type StepHook = Box<dyn FnMut(&StepEvent)>;
type ErrorHook = Box<dyn FnMut(&ErrorEvent)>;

/// Drives a [`Workflow`] one step at a time, strictly in sequence.
pub struct Runner<S: Clone + 'static> {
    wf: Workflow<S>,
    max_steps: usize,
    max_retries: usize,
    on_step: Option<StepHook>,
    on_error: Option<ErrorHook>,
}

impl<S: Clone + 'static> Runner<S> {
    pub fn new(wf: Workflow<S>) -> Self {
        Self {
            wf,
            max_steps: 1_000,
            max_retries: 3,
            on_step: None,
            on_error: None,
        }
    }

    /// Prevent accidental infinite loops.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Register a callback that fires after each successful task step.
    pub fn on_step(mut self, cb: impl FnMut(&StepEvent) + 'static) -> Self {
        self.on_step = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when a step errors or a limit is exceeded.
    pub fn on_error(mut self, cb: impl FnMut(&ErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Set both hooks to emit `tracing` events.
    pub fn with_tracing(self) -> Self {
        let workflow = self.wf.name();
        self.on_step(move |e| {
            info!(
                workflow,
                step = e.step,
                step_number = e.step_number,
                retries = e.retries,
                outcome = ?e.outcome,
                elapsed_ms = e.duration.as_millis() as u64,
                "step finished"
            );
        })
        .on_error(move |e| {
            warn!(
                workflow,
                step = e.step,
                step_number = e.step_number,
                error = %e.error,
                "step failed"
            );
        })
    }

    fn report(&mut self, step: &str, error: &StepError, step_number: usize) {
        if let Some(cb) = &mut self.on_error {
            cb(&ErrorEvent {
                step,
                error,
                step_number,
            });
        }
    }

    pub fn run(&mut self, mut state: S, ctx: &mut Ctx) -> Result<S, StepError> {
        let mut current = self.wf.start();
        let mut retries: usize = 0;
        let mut step_number: usize = 0;

        for _ in 0..self.max_steps {
            step_number += 1;

            let step = self
                .wf
                .step_mut(current)
                .ok_or_else(|| StepError::other(format!("unknown step: {current}")))?;

            let start = Instant::now();
            let result = step.run(state.clone(), ctx);
            let duration = start.elapsed();

            let (next_state, outcome) = match result {
                Ok(ok) => ok,
                Err(err) => {
                    self.report(current, &err, step_number);
                    return Err(err);
                }
            };

            if let Some(cb) = &mut self.on_step {
                cb(&StepEvent {
                    step: current,
                    outcome: &outcome,
                    duration,
                    step_number,
                    retries,
                });
            }

            state = next_state;

            match outcome {
                Outcome::Done => return Ok(state),
                Outcome::Fail(msg) => {
                    let err = StepError::Failed(msg);
                    self.report(current, &err, step_number);
                    return Err(err);
                }
                Outcome::Continue => {
                    let Some(next) = self.wf.default_next(current) else {
                        let err = StepError::other(format!(
                            "step '{current}' returned Continue but no default next step is configured"
                        ));
                        self.report(current, &err, step_number);
                        return Err(err);
                    };
                    ctx.log(format!("{current} -> {next}"));
                    current = next;
                    retries = 0;
                }
                Outcome::Retry(hint) => {
                    retries += 1;
                    if retries > self.max_retries {
                        let err = StepError::other(format!(
                            "step '{}' exceeded max retries ({}): {}",
                            current, self.max_retries, hint.reason
                        ));
                        self.report(current, &err, step_number);
                        return Err(err);
                    }
                    ctx.log(format!("{current} retry {retries}: {}", hint.reason));
                }
                Outcome::Wait(dur) => {
                    retries += 1;
                    if retries > self.max_retries {
                        let err = StepError::other(format!(
                            "step '{}' exceeded max retries ({}) while waiting",
                            current, self.max_retries
                        ));
                        self.report(current, &err, step_number);
                        return Err(err);
                    }
                    ctx.log(format!("{current} waiting {}ms", dur.as_millis()));
                    std::thread::sleep(dur);
                }
            }
        }

        let err = StepError::other(format!(
            "max_steps exceeded (possible infinite loop) in workflow {}",
            self.wf.name()
        ));
        self.report(current, &err, step_number);
        Err(err)
    }
}
