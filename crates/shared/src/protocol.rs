use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const TRANSCRIBE_ROUTE: &str = "/transcribe";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const CHAT_ROUTE: &str = "/chat";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are helpful.";

/// Body returned by `/transcribe`: exactly one of `text` or `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscribeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscribeResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            text: None,
            error: Some(message.into()),
        }
    }

    /// Text to store as the marker note. A non-empty transcript wins, then the
    /// error message, then the empty string.
    pub fn into_note(self) -> String {
        match (self.text, self.error) {
            (Some(text), _) if !text.is_empty() => text,
            (_, Some(error)) if !error.is_empty() => error,
            _ => String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.text.as_deref().is_some_and(|text| !text.is_empty())
    }
}

impl From<ApiError> for TranscribeResponse {
    fn from(value: ApiError) -> Self {
        Self::failure(value.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Body accepted by `/chat`: a full conversation, or a single user message
/// that gets the default system prompt in front of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChatRequest {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        match self.messages {
            Some(messages) if !messages.is_empty() => messages,
            _ => vec![
                ChatMessage::new("system", DEFAULT_SYSTEM_PROMPT),
                ChatMessage::new("user", self.message.unwrap_or_default()),
            ],
        }
    }
}

/// Body returned by `/chat`: exactly one of `reply` or `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn success(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            error: None,
        }
    }
}

impl From<ApiError> for ChatResponse {
    fn from(value: ApiError) -> Self {
        Self {
            reply: None,
            error: Some(value.message),
        }
    }
}
