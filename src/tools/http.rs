use std::time::Duration;

use crate::agent::StepError;
use serde::de::DeserializeOwned;
use ureq::Agent;

/// A blocking HTTP agent with a global timeout.
///
/// Non-2xx responses are returned as responses, not errors, so callers can
/// read the status, headers and body before classifying the failure.
pub fn agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// GET `url` with query parameters and decode a JSON body.
pub fn get_json<T: DeserializeOwned>(
    agent: &Agent,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, StepError> {
    let mut req = agent.get(url).header("Accept", "application/json");
    for (key, value) in query {
        req = req.query(*key, *value);
    }

    let mut response = req.call()?;
    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        let body = response.body_mut().read_to_string().unwrap_or_default();
        return Err(StepError::from_status(status, &body, None));
    }

    Ok(response.body_mut().read_json()?)
}
