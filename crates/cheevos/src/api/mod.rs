//! Achievement service request builders and response decoding.
//!
//! Every call is a form encoded POST to `{host}/dorequest.php` with the API
//! name in the `r` parameter. Responses are JSON objects with a `Success`
//! flag; failed calls carry `Error` (text) and optionally `Code`.

mod types;

pub(crate) use types::*;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::transport::{FORM_CONTENT_TYPE, HttpRequest, HttpResponse, Method, Transport, user_agent};

pub(crate) const API_LOGIN: &str = "login2";
pub(crate) const API_GAME_ID: &str = "gameid";
pub(crate) const API_ACHIEVEMENT_SETS: &str = "achievementsets";
pub(crate) const API_START_SESSION: &str = "startsession";
pub(crate) const API_AWARD_ACHIEVEMENT: &str = "awardachievement";
pub(crate) const API_SUBMIT_LEADERBOARD: &str = "submitlbentry";
pub(crate) const API_PING: &str = "ping";
pub(crate) const API_ALL_PROGRESS: &str = "allprogress";
pub(crate) const API_HASH_LIBRARY: &str = "hashlibrary";

/// Username and session token attached to authenticated calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub username: String,
    pub token: String,
}

/// One service call before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApiRequest {
    pub api: &'static str,
    params: Vec<(&'static str, String)>,
}

impl ApiRequest {
    pub fn new(api: &'static str) -> Self {
        Self {
            api,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    pub fn auth(self, credentials: &Credentials) -> Self {
        self.param("u", &credentials.username)
            .param("t", &credentials.token)
    }

    /// Form body, `r` first.
    pub fn body(&self) -> String {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("r", self.api);
        for (key, value) in &self.params {
            form.append_pair(key, value);
        }
        form.finish()
    }

    pub fn to_http(&self, config: &ClientConfig) -> HttpRequest {
        HttpRequest {
            method: Method::Post,
            url: config.request_url(),
            headers: vec![
                ("User-Agent".to_string(), user_agent()),
                ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
            ],
            body: Some(self.body()),
        }
    }
}

/// Perform `request` and decode the typed response.
pub(crate) fn call<T: DeserializeOwned>(
    transport: &dyn Transport,
    config: &ClientConfig,
    request: &ApiRequest,
) -> Result<T> {
    debug!(api = request.api, "sending request");
    let response = transport.perform(&request.to_http(config))?;
    decode(request.api, &response)
}

/// Decode a raw response, mapping failures onto the error taxonomy.
pub(crate) fn decode<T: DeserializeOwned>(api: &str, response: &HttpResponse) -> Result<T> {
    if response.status == 0 || response.status >= 500 {
        warn!(api, status = response.status, "service unavailable");
        return Err(Error::NetworkFailure(format!(
            "{api}: HTTP {}",
            response.status
        )));
    }

    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) if response.is_success() => return Err(e.into()),
        Err(_) => {
            return Err(Error::ServerRejected {
                code: response.status.to_string(),
                message: format!("{api}: HTTP {}", response.status),
            });
        }
    };

    let success = value
        .get("Success")
        .and_then(Value::as_bool)
        .unwrap_or(response.is_success());
    if !success || !response.is_success() {
        let message = value
            .get("Error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{api}: HTTP {}", response.status));
        let code = value.get("Code").and_then(Value::as_str);
        return Err(Error::from_server(code, message));
    }

    Ok(serde_json::from_value(value)?)
}

/// Whether a failed award means the server already has the unlock.
pub(crate) fn is_already_unlocked(error: &Error) -> bool {
    match error {
        Error::ServerRejected { message, .. } => message.contains("already has"),
        _ => false,
    }
}
