use crate::Agent;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("duplicate step name: {0}")]
    DuplicateStep(&'static str),
    #[error("unknown step: {0}")]
    UnknownStep(&'static str),
    #[error("workflow has no steps")]
    MissingStart,
}

// ---------------------------------------------------------------------------
// WorkflowBuilder
// ---------------------------------------------------------------------------

pub struct WorkflowBuilder<S: Clone + 'static> {
    name: &'static str,
    start: Option<&'static str>,
    chain_last: Option<&'static str>,
    order: Vec<&'static str>,
    steps: HashMap<&'static str, Box<dyn Agent<S>>>,
    default_next: HashMap<&'static str, &'static str>,
    duplicate: Option<&'static str>,
}

impl<S: Clone + 'static> WorkflowBuilder<S> {
    pub fn register<A: Agent<S>>(self, step: A) -> Self {
        self.register_boxed(Box::new(step))
    }

    pub fn register_boxed(mut self, step: Box<dyn Agent<S>>) -> Self {
        let name = step.name();
        if self.steps.contains_key(name) {
            self.duplicate.get_or_insert(name);
        } else {
            self.order.push(name);
        }
        self.steps.insert(name, step);

        // The first registered step is the default start.
        if self.start.is_none() {
            self.start = Some(name);
        }
        if self.chain_last.is_none() {
            self.chain_last = Some(name);
        }

        self
    }

    pub fn start_at(mut self, step: &'static str) -> Self {
        self.start = Some(step);
        self.chain_last = Some(step);
        self
    }

    /// Chain the next step: current(chain_last) -> next
    pub fn then(mut self, next: &'static str) -> Self {
        let Some(current) = self.chain_last else {
            self.start = Some(next);
            self.chain_last = Some(next);
            return self;
        };

        self.default_next.insert(current, next);
        self.chain_last = Some(next);
        self
    }

    /// Register every step and chain them in the given order.
    pub fn sequence<I>(self, steps: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Agent<S>>>,
    {
        let mut builder = self;
        let mut first = true;
        for step in steps {
            let name = step.name();
            builder = builder.register_boxed(step);
            builder = if first { builder.start_at(name) } else { builder.then(name) };
            first = false;
        }
        builder
    }

    pub fn build(self) -> Result<Workflow<S>, WorkflowError> {
        if let Some(name) = self.duplicate {
            return Err(WorkflowError::DuplicateStep(name));
        }

        let start = self.start.ok_or(WorkflowError::MissingStart)?;
        if !self.steps.contains_key(start) {
            return Err(WorkflowError::UnknownStep(start));
        }
        for &target in self.default_next.values() {
            if !self.steps.contains_key(target) {
                return Err(WorkflowError::UnknownStep(target));
            }
        }

        Ok(Workflow {
            name: self.name,
            start,
            order: self.order,
            steps: self.steps,
            default_next: self.default_next,
        })
    }
}

// ---------------------------------------------------------------------------
// Workflow (validated, only constructed via build())
// ---------------------------------------------------------------------------

pub struct Workflow<S: Clone + 'static> {
    name: &'static str,
    start: &'static str,
    order: Vec<&'static str>,
    steps: HashMap<&'static str, Box<dyn Agent<S>>>,
    default_next: HashMap<&'static str, &'static str>,
}

impl<S: Clone + 'static> Workflow<S> {
    pub fn builder(name: &'static str) -> WorkflowBuilder<S> {
        WorkflowBuilder {
            name,
            start: None,
            chain_last: None,
            order: Vec::new(),
            steps: HashMap::new(),
            default_next: HashMap::new(),
            duplicate: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Step names in registration order.
    pub fn steps(&self) -> &[&'static str] {
        &self.order
    }

    pub(crate) fn start(&self) -> &'static str {
        self.start
    }

    pub(crate) fn step_mut(&mut self, name: &'static str) -> Option<&mut Box<dyn Agent<S>>> {
        self.steps.get_mut(name)
    }

    pub(crate) fn default_next(&self, from: &'static str) -> Option<&'static str> {
        self.default_next.get(from).copied()
    }
}
