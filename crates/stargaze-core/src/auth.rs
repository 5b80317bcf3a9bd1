//! Session callbacks for GitHub sign-in.
//!
//! Sessions are stateless: identity lives in a signed token that the auth
//! layer decodes on every request. These callbacks decide what goes into
//! that token at sign-in and how it is projected into the session that
//! application code sees. The OAuth exchange itself is handled upstream.

use crate::config::AuthConfig;
use serde_json::Value;
use stargaze_types::{ProviderUser, Session, Token};

/// Session strategy used with these callbacks.
pub const SESSION_STRATEGY: &str = "jwt";

/// OAuth client settings for the GitHub provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubProviderSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub callback_url: String,
}

impl From<&AuthConfig> for GitHubProviderSettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            client_id: config.github_id.clone(),
            client_secret: config.github_secret.clone(),
            callback_url: config.callback_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthCallbacks {
    debug: bool,
}

impl AuthCallbacks {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            debug: config.debug_callbacks,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enrich the token at sign-in. Without a user the token is returned as is.
    pub fn jwt(&self, mut token: Token, user: Option<&ProviderUser>) -> Token {
        if self.debug {
            log::debug!("jwt callback token={:?} user={:?}", token, user);
        }

        if let Some(user) = user {
            token.insert("id".to_string(), Value::String(user.id.clone()));
            token.insert(
                "randomKey".to_string(),
                Value::String(user.random_key.clone()),
            );
        }

        token
    }

    /// Project the token into the session, keeping the user's other fields.
    pub fn session(&self, mut session: Session, token: &Token) -> Session {
        if self.debug {
            log::debug!("session callback session={:?} token={:?}", session, token);
        }

        let user = session.user.get_or_insert_with(Default::default);
        user.id = token_string(token, "id");
        user.random_key = token_string(token, "randomKey");

        session
    }

    /// Every request is allowed; access control happens elsewhere.
    pub fn authorized(&self, session: Option<&Session>) -> bool {
        if self.debug {
            log::debug!("authorized callback session={:?}", session);
        }
        true
    }
}

fn token_string(token: &Token, key: &str) -> Option<String> {
    match token.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
