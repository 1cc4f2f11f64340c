use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub const USER_SENDER: &str = "USER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Character(String), // Display name of the persona speaking.
}

impl Sender {
    pub fn label(&self) -> &str {
        match self {
            Sender::User => USER_SENDER,
            Sender::Character(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64, // UI identity only, never used for ordering.
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Ordered conversation history of one session.
///
/// Messages are only ever appended, except for [`Transcript::truncate_last_turn`] (undo)
/// and [`Transcript::clear`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &Message {
        self.push(Sender::User, text.into())
    }

    pub fn push_character(&mut self, name: &str, text: impl Into<String>) -> &Message {
        self.push(Sender::Character(name.to_string()), text.into())
    }

    fn push(&mut self, sender: Sender, text: String) -> &Message {
        self.next_id += 1;
        self.messages.push(Message {
            id: self.next_id,
            sender,
            text,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Number of messages the player has sent so far.
    pub fn player_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    /// Drops the most recent user message and everything after it.
    /// Returns false (and leaves the transcript alone) when there is nothing to undo.
    pub fn truncate_last_turn(&mut self) -> bool {
        if self.messages.len() <= 1 {
            return false;
        }
        match self.messages.iter().rposition(Message::is_user) {
            Some(index) => {
                self.messages.truncate(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Role-tagged view of the whole transcript, greeting included.
    pub fn to_chat_history(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|message| {
                let role = if message.is_user() {
                    ChatRole::User
                } else {
                    ChatRole::Assistant
                };
                ChatMessage::new(role, message.text.clone())
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum OptionId {
    A,
    B,
    C,
}

impl OptionId {
    pub const ALL: [OptionId; 3] = [OptionId::A, OptionId::B, OptionId::C];

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "A" => Some(OptionId::A),
            "B" => Some(OptionId::B),
            "C" => Some(OptionId::C),
            _ => None,
        }
    }
}

// One of the three suggested next questions shown after every turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub text: String,
}

impl QuestionOption {
    pub fn new(id: OptionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}
