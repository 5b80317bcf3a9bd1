//! Chat page: resolves the session and hands its user to the widget.

use crate::widget::ChatWidget;
use crate::ChatTransport;
use anyhow::{Context, Result};
use stargaze_core::AuthCallbacks;
use stargaze_types::{Session, Token};
use std::path::Path;

pub struct ChatPage {
    pub widget: ChatWidget,
}

impl ChatPage {
    pub fn new(session: Option<Session>, transport: Box<dyn ChatTransport>) -> Self {
        let user = session.and_then(|session| session.user);
        Self {
            widget: ChatWidget::new(transport, user),
        }
    }

    /// Greeting line for the signed-in user, if any.
    pub fn greeting(&self) -> String {
        match self.widget.user().and_then(|user| user.display_name()) {
            Some(name) => format!("Welcome back, {}!", name),
            None => "Welcome! Ask about your starred repositories.".to_string(),
        }
    }
}

/// Resolve a session from a JSON file.
///
/// The file holds either a session (`{"user": ...}`) or a decoded token. A
/// token is projected into a session through the auth callbacks.
pub fn load_session(path: &Path, callbacks: &AuthCallbacks) -> Result<Session> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse session file {}", path.display()))?;

    if value.get("user").is_some() {
        return Ok(serde_json::from_value(value)?);
    }

    let token: Token = serde_json::from_value(value)?;
    let mut session = Session::default();
    if let Some(user) = session_user_from_token(&token) {
        session.user = Some(user);
    }
    Ok(callbacks.session(session, &token))
}

fn session_user_from_token(token: &Token) -> Option<stargaze_types::SessionUser> {
    let profile = serde_json::Value::Object(token.clone());
    let mut user: stargaze_types::SessionUser = serde_json::from_value(profile).ok()?;
    // Token-only claims stay out of the projected user
    user.extra.retain(|key, _| !matches!(key.as_str(), "sub" | "iat" | "exp" | "jti"));
    Some(user)
}
