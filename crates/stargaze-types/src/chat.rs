//! Chat transcript types.
//!
//! A transcript is an ordered list of [`Message`] entries. Each entry is a
//! single-key JSON object: `{"user": "..."}` or `{"assistant": ...}`. The
//! assistant payload is either plain text or a detailed reply carrying the
//! model's response metadata; both shapes are accepted on the way in.
//!
//! Some backends report history as one object per turn,
//! `{"user": "...", "assistant": ...}`. Such turns are flattened into a user
//! entry followed by an assistant entry when a [`ChatResponse`] is read.

use serde::{Deserialize, Deserializer, Serialize};

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Message {
    /// Something the user typed.
    User(String),
    /// A reply from the assistant.
    Assistant(AssistantContent),
}

impl Message {
    /// Create a user entry.
    pub fn user(text: impl Into<String>) -> Self {
        Message::User(text.into())
    }

    /// Create a plain-text assistant entry.
    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant(AssistantContent::Text(text.into()))
    }

    /// Create an assistant entry that carries response metadata.
    pub fn assistant_with_metadata(text: impl Into<String>, metadata: ResponseMetadata) -> Self {
        Message::Assistant(AssistantContent::Detailed(DetailedReply {
            message: ReplyText {
                assistant: text.into(),
            },
            raw_response: metadata,
        }))
    }

    /// The displayable text of the entry.
    pub fn text(&self) -> &str {
        match self {
            Message::User(text) => text,
            Message::Assistant(content) => content.text(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User(_))
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Message::Assistant(_))
    }

    /// Response metadata, present only on detailed assistant entries.
    pub fn metadata(&self) -> Option<&ResponseMetadata> {
        match self {
            Message::Assistant(AssistantContent::Detailed(reply)) => Some(&reply.raw_response),
            _ => None,
        }
    }
}

/// The payload of an assistant entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssistantContent {
    /// `{"assistant": "text"}`
    Text(String),
    /// `{"assistant": {"message": {"assistant": "text"}, "raw_response": {...}}}`
    Detailed(DetailedReply),
}

impl AssistantContent {
    pub fn text(&self) -> &str {
        match self {
            AssistantContent::Text(text) => text,
            AssistantContent::Detailed(reply) => &reply.message.assistant,
        }
    }
}

/// An assistant reply together with the provider's response metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedReply {
    pub message: ReplyText,
    pub raw_response: ResponseMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyText {
    pub assistant: String,
}

/// Metadata reported by the model provider for one completion.
///
/// Field names follow the Ollama response; other providers map onto them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Wall time of the completion in nanoseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl ResponseMetadata {
    /// Duration in seconds with two decimals, e.g. `"2.50"`.
    pub fn duration_seconds(&self) -> Option<String> {
        self.total_duration.map(format_duration_secs)
    }

    /// Prompt plus completion tokens, when either count is known.
    pub fn total_tokens(&self) -> Option<u64> {
        match (self.prompt_eval_count, self.eval_count) {
            (None, None) => None,
            (prompt, completion) => Some(prompt.unwrap_or(0) + completion.unwrap_or(0)),
        }
    }
}

/// Format a nanosecond duration as seconds with two decimals.
pub fn format_duration_secs(nanos: u64) -> String {
    format!("{:.2}", nanos as f64 / 1_000_000_000.0)
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Return the formatted repository list without calling the model.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub format_only: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            format_only: false,
        }
    }
}

/// Successful response of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: String,
    #[serde(deserialize_with = "deserialize_history")]
    pub chat_history: Vec<Message>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryEntry {
    Single(Message),
    Turn(CombinedTurn),
}

#[derive(Deserialize)]
struct CombinedTurn {
    user: String,
    #[serde(default)]
    assistant: Option<AssistantContent>,
}

impl HistoryEntry {
    fn into_messages(self) -> Vec<Message> {
        match self {
            HistoryEntry::Single(message) => vec![message],
            HistoryEntry::Turn(turn) => std::iter::once(Message::User(turn.user))
                .chain(turn.assistant.map(Message::Assistant))
                .collect(),
        }
    }
}

fn deserialize_history<'de, D>(deserializer: D) -> Result<Vec<Message>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<HistoryEntry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .flat_map(HistoryEntry::into_messages)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_entry_shape() {
        let value = serde_json::to_value(Message::user("hello")).unwrap();
        assert_eq!(value, json!({"user": "hello"}));
    }

    #[test]
    fn test_plain_assistant_entry() {
        let message: Message = serde_json::from_value(json!({"assistant": "hi"})).unwrap();
        assert_eq!(message, Message::assistant("hi"));
        assert!(message.metadata().is_none());
    }

    #[test]
    fn test_detailed_assistant_entry() {
        let message: Message = serde_json::from_value(json!({
            "assistant": {
                "message": {"assistant": "Here are your repos"},
                "raw_response": {
                    "model": "llama3",
                    "created_at": "2024-05-01T10:00:00Z",
                    "total_duration": 2_500_000_000u64,
                    "prompt_eval_count": 120,
                    "eval_count": 30
                }
            }
        }))
        .unwrap();

        assert_eq!(message.text(), "Here are your repos");
        let metadata = message.metadata().unwrap();
        assert_eq!(metadata.model.as_deref(), Some("llama3"));
        assert_eq!(metadata.duration_seconds().as_deref(), Some("2.50"));
        assert_eq!(metadata.total_tokens(), Some(150));
    }

    #[test]
    fn test_format_duration_secs() {
        assert_eq!(format_duration_secs(2_500_000_000), "2.50");
        assert_eq!(format_duration_secs(0), "0.00");
        assert_eq!(format_duration_secs(1_234_000_000), "1.23");
    }

    #[test]
    fn test_total_tokens_partial_counts() {
        let metadata = ResponseMetadata {
            eval_count: Some(7),
            ..Default::default()
        };
        assert_eq!(metadata.total_tokens(), Some(7));
        assert_eq!(ResponseMetadata::default().total_tokens(), None);
    }

    #[test]
    fn test_chat_request_omits_format_only_by_default() {
        let value = serde_json::to_value(ChatRequest::new("repos about timescale")).unwrap();
        assert_eq!(value, json!({"message": "repos about timescale"}));
    }

    #[test]
    fn test_chat_response_requires_history() {
        let missing: Result<ChatResponse, _> = serde_json::from_value(json!({"response": "x"}));
        assert!(missing.is_err());

        let ok: ChatResponse = serde_json::from_value(json!({
            "response": "x",
            "chat_history": [{"user": "q"}, {"assistant": "x"}]
        }))
        .unwrap();
        assert_eq!(ok.chat_history.len(), 2);
        assert!(ok.chat_history[0].is_user());
        assert!(ok.chat_history[1].is_assistant());
    }

    #[test]
    fn test_combined_turns_are_flattened() {
        let response: ChatResponse = serde_json::from_value(json!({
            "chat_history": [
                {"user": "q1", "assistant": "a1"},
                {"user": "q2", "assistant": {
                    "message": {"assistant": "a2"},
                    "raw_response": {"model": "llama3"}
                }},
                {"user": "q3"}
            ]
        }))
        .unwrap();

        assert_eq!(response.response, "");
        assert_eq!(response.chat_history.len(), 5);
        assert_eq!(response.chat_history[0], Message::user("q1"));
        assert_eq!(response.chat_history[1], Message::assistant("a1"));
        assert_eq!(response.chat_history[2], Message::user("q2"));
        assert_eq!(response.chat_history[3].text(), "a2");
        assert_eq!(
            response.chat_history[3].metadata().and_then(|m| m.model.as_deref()),
            Some("llama3")
        );
        assert_eq!(response.chat_history[4], Message::user("q3"));
    }

    #[test]
    fn test_history_serializes_as_single_entries() {
        let response = ChatResponse {
            response: "a".to_string(),
            chat_history: vec![Message::user("q"), Message::assistant("a")],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["chat_history"], json!([{"user": "q"}, {"assistant": "a"}]));

        let back: ChatResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, response);
    }
}
