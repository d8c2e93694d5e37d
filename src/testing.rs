//! Scripted chat model for unit tests.

use crate::StepError;
use crate::llm::{ChatModel, Message};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replies from a fixed script and records every conversation it was sent.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, StepError>>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, StepError>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// A script of successful replies.
    pub fn replying<I, T>(replies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(r.into())))
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    /// Last message of the n-th call.
    pub fn last_message(&self, call: usize) -> String {
        self.calls()[call]
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

impl ChatModel for ScriptedModel {
    fn model(&self) -> &str {
        "openrouter/scripted/model"
    }

    fn chat(&self, messages: &[Message]) -> Result<String, StepError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StepError::invalid("script exhausted")))
    }
}
