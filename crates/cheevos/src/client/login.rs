use std::fmt;
use std::sync::Arc;

use super::{Client, Shared};
use crate::api::{self, API_LOGIN, ApiRequest, LoginResponse};
use crate::config::LogLevel;
use crate::error::{Error, Result};
use crate::model::{UserInfo, media};
use crate::operation::{self, AsyncHandle, Completer};
use crate::session::OpKind;

/// Secret used to log in.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Password(String),
    /// Token from an earlier login (see [`Client::login_token`]).
    Token(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Password(***)"),
            Credential::Token(_) => f.write_str("Token(***)"),
        }
    }
}

impl Client {
    /// Log in. Replaces the current user on success.
    pub fn login(&self, username: &str, credential: Credential) -> Result<AsyncHandle<UserInfo>> {
        let secret = match &credential {
            Credential::Password(s) | Credential::Token(s) => s,
        };
        if username.trim().is_empty() || secret.is_empty() {
            return Err(Error::InvalidCredentials(
                "username and password or token are required".to_string(),
            ));
        }

        let token = self
            .shared
            .with_session(|session| session.begin_op(OpKind::Login))?;
        let (handle, completer) = operation::pair();
        let cancel = Arc::clone(&self.shared);
        completer.on_cancel(move || cancel.with_session(|session| session.abandon_op(token)));

        let shared = Arc::clone(&self.shared);
        let username = username.to_string();
        self.shared.executor.spawn(
            "login",
            Box::new(move || shared.run_login(token, username, credential, completer)),
        );
        Ok(handle)
    }

    /// Forget the user. Unloads the game and aborts any pending operation.
    pub fn logout(&self) {
        self.shared.with_session(|session| session.logout());
    }
}

impl Shared {
    fn run_login(
        &self,
        token: u64,
        username: String,
        credential: Credential,
        completer: Completer<UserInfo>,
    ) {
        let request = ApiRequest::new(API_LOGIN).param("u", &username);
        let request = match credential {
            Credential::Password(password) => request.param("p", password),
            Credential::Token(token) => request.param("t", token),
        };
        let response = api::call::<LoginResponse>(self.transport.as_ref(), &self.config, &request);
        let media_host = self.config.media_host.clone();

        self.complete(completer, move |session| {
            if !session.finish_op(token) {
                return Err(Error::Aborted);
            }
            match response {
                Ok(response) => {
                    let avatar_url = response
                        .avatar_url
                        .unwrap_or_else(|| media::user_avatar(&media_host, &response.user));
                    let user = UserInfo {
                        display_name: response
                            .display_name
                            .unwrap_or_else(|| response.user.clone()),
                        username: response.user,
                        token: response.token,
                        score: response.score,
                        score_softcore: response.softcore_score,
                        num_unread_messages: response.messages,
                        avatar_url: Some(avatar_url),
                    };
                    session.log(LogLevel::Info, format!("{} logged in", user.display_name));
                    session.user = Some(user.clone());
                    Ok(user)
                }
                Err(e) => {
                    session.log(LogLevel::Error, format!("Login failed for {username}: {e}"));
                    Err(e)
                }
            }
        });
    }
}
