//! Chat widget state machine.

use crate::render::render_message;
use crate::ChatTransport;
use stargaze_types::{ChatRequest, Message, SessionUser};

/// Assistant entry appended when a send fails for any reason.
pub const ERROR_REPLY: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Idle,
    AwaitingResponse,
}

pub struct ChatWidget {
    transport: Box<dyn ChatTransport>,
    user: Option<SessionUser>,
    history: Vec<Message>,
    input: String,
    state: WidgetState,
}

impl ChatWidget {
    pub fn new(transport: Box<dyn ChatTransport>, user: Option<SessionUser>) -> Self {
        Self {
            transport,
            user,
            history: Vec::new(),
            input: String::new(),
            state: WidgetState::Idle,
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == WidgetState::AwaitingResponse
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Send the input buffer as one chat turn.
    ///
    /// Whitespace-only input is ignored. On success the server's transcript
    /// replaces the local one; on any failure a single error reply is
    /// appended instead. The input is cleared either way.
    pub async fn send(&mut self) {
        let text = self.input.clone();
        if text.trim().is_empty() {
            return;
        }

        self.state = WidgetState::AwaitingResponse;
        self.history.push(Message::user(text.clone()));

        match self.transport.send_chat(&ChatRequest::new(text)).await {
            Ok(response) => {
                self.history = response.chat_history;
            }
            Err(e) => {
                log::error!("Error: {:#}", e);
                self.history.push(Message::assistant(ERROR_REPLY));
            }
        }

        self.state = WidgetState::Idle;
        self.input.clear();
    }

    /// Submit `text` as if typed into the input.
    pub async fn submit(&mut self, text: impl Into<String>) {
        self.set_input(text);
        self.send().await;
    }

    /// Render the whole transcript as terminal text.
    pub fn render(&self) -> String {
        self.history
            .iter()
            .map(render_message)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use stargaze_types::ChatResponse;
    use std::sync::{Arc, Mutex};

    /// Records requests and replays queued outcomes.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        requests: Arc<Mutex<Vec<ChatRequest>>>,
        replies: Arc<Mutex<Vec<Result<ChatResponse>>>>,
    }

    impl ScriptedTransport {
        fn reply(self, reply: Result<ChatResponse>) -> Self {
            self.replies.lock().unwrap().push(reply);
            self
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn server_history(turns: &[(&str, &str)]) -> ChatResponse {
        ChatResponse {
            response: turns.last().map(|t| t.1.to_string()).unwrap_or_default(),
            chat_history: turns
                .iter()
                .flat_map(|(u, a)| [Message::user(*u), Message::assistant(*a)])
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_blank_input_is_a_noop() {
        let transport = ScriptedTransport::default();
        let mut widget = ChatWidget::new(Box::new(transport.clone()), None);

        widget.submit("  \t\n").await;

        assert_eq!(transport.request_count(), 0);
        assert!(widget.history().is_empty());
        assert_eq!(widget.state(), WidgetState::Idle);
    }

    #[tokio::test]
    async fn test_success_replaces_history_and_resets() {
        let transport =
            ScriptedTransport::default().reply(Ok(server_history(&[("earlier", "ok"), ("hi", "hello")])));
        let mut widget = ChatWidget::new(Box::new(transport.clone()), None);

        widget.submit("hi").await;

        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests.lock().unwrap()[0].message, "hi");
        assert_eq!(widget.history().len(), 4);
        assert_eq!(widget.history()[0], Message::user("earlier"));
        assert!(!widget.is_loading());
        assert_eq!(widget.input(), "");
    }

    #[tokio::test]
    async fn test_failure_appends_one_error_reply() {
        let transport = ScriptedTransport::default()
            .reply(Ok(server_history(&[("first", "answer")])))
            .reply(Err(anyhow!("connection refused")));
        let mut widget = ChatWidget::new(Box::new(transport), None);

        widget.submit("first").await;
        widget.submit("second").await;

        assert_eq!(
            widget.history(),
            &[
                Message::user("first"),
                Message::assistant("answer"),
                Message::user("second"),
                Message::assistant(ERROR_REPLY),
            ]
        );
        assert_eq!(widget.state(), WidgetState::Idle);
        assert_eq!(widget.input(), "");
    }

    #[tokio::test]
    async fn test_render_joins_entries() {
        let transport = ScriptedTransport::default().reply(Ok(server_history(&[("q", "**a**")])));
        let mut widget = ChatWidget::new(Box::new(transport), None);
        widget.submit("q").await;

        let rendered = widget.render();
        assert!(rendered.starts_with("You: q"));
        assert!(rendered.ends_with("Assistant:\na"));
    }
}
