use std::collections::HashMap;

/// Execution context shared by the steps of one run.
///
/// Holds the run inputs (`topic`, ...) and a human-readable log of what
/// happened. Task outputs travel in the workflow state, not here.
#[derive(Debug, Default)]
pub struct Ctx {
    inputs: HashMap<String, String>,
    log: Vec<String>,
}

impl Ctx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a context seeded with run inputs.
    pub fn with_inputs<I, K, V>(inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inputs: inputs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn inputs(&self) -> &HashMap<String, String> {
        &self.inputs
    }

    pub fn input(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).map(|s| s.as_str())
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push(msg.into());
    }

    pub fn logs(&self) -> &[String] {
        &self.log
    }

    /// Hand the log over, leaving it empty.
    pub fn take_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_are_seeded() {
        let ctx = Ctx::with_inputs([("topic", "Lisbon in spring")]);
        assert_eq!(ctx.input("topic"), Some("Lisbon in spring"));
        assert_eq!(ctx.input("missing"), None);
    }

    #[test]
    fn take_logs_drains() {
        let mut ctx = Ctx::new();
        ctx.log("one");
        ctx.log("two");
        assert_eq!(ctx.take_logs(), vec!["one".to_string(), "two".to_string()]);
        assert!(ctx.logs().is_empty());
    }
}
