//! Conversation history types.
//!
//! A conversation is an ordered list of [`Turn`]s, each carrying one or more
//! [`Part`]s. The JSON shape matches what the LLM provider accepts, so the
//! relay can forward client history without re-mapping it.

use serde::{Deserialize, Deserializer, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human on the browser side.
    User,
    /// The language model.
    Model,
}

/// Base64-encoded binary attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    /// MIME type of the decoded payload (e.g. `image/jpeg`).
    #[serde(alias = "mimeType")]
    pub mime_type: String,
    /// Standard base64 of the payload, without a `data:` prefix.
    pub data: String,
}

/// A single piece of a turn: either text or an inline attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    /// Returns the text content, or `None` for attachments.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::InlineData { .. } => None,
        }
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenates every text part, skipping attachments.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Prior turns, oldest first. Does not include `message`.
    #[serde(default)]
    pub history: Vec<Turn>,
    /// The new user turn. A bare string is accepted as a user text turn.
    #[serde(deserialize_with = "deserialize_message")]
    pub message: Turn,
}

fn deserialize_message<'de, D>(deserializer: D) -> Result<Turn, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Message {
        Turn(Turn),
        Text(String),
    }

    Ok(match Message::deserialize(deserializer)? {
        Message::Turn(turn) => turn,
        Message::Text(text) => Turn::user_text(text),
    })
}
