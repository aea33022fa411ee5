use pennywise_core::{AppError, AppResult};
use pennywise_domain::{HttpMethod, OutboundRequest};
use serde_json::Value;

use crate::client_config::ClientConfig;

/// One parsed line of client input.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// `login <username> <password>`: exchanges credentials for an access token.
    Login { username: String, password: String },
    /// `METHOD /path [json-body]`: an API call.
    Request(OutboundRequest),
}

impl ClientCommand {
    pub fn parse(line: &str, config: &ClientConfig) -> AppResult<Self> {
        let line = line.trim();
        let (head, rest) = split_word(line);

        if head.eq_ignore_ascii_case("login") {
            let mut parts = rest.split_whitespace();
            let (Some(username), Some(password), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(AppError::Validation(
                    "usage: login <username> <password>".to_owned(),
                ));
            };
            return Ok(Self::Login {
                username: username.to_owned(),
                password: password.to_owned(),
            });
        }

        let method = head.parse::<HttpMethod>()?;
        let (path, body) = split_word(rest);
        if path.is_empty() {
            return Err(AppError::Validation(format!(
                "usage: {method} /path [json-body]"
            )));
        }

        let mut request = OutboundRequest::new(method, config.endpoint(path)?);
        if !body.is_empty() {
            let body = serde_json::from_str::<Value>(body)
                .map_err(|error| AppError::Validation(format!("invalid JSON body: {error}")))?;
            request = request.with_json_body(body);
        }

        Ok(Self::Request(request))
    }
}

fn split_word(value: &str) -> (&str, &str) {
    let value = value.trim_start();
    match value.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (value, ""),
    }
}
