pub mod ai;
pub mod ai_response;
pub mod app_state;
pub mod content_filter;
pub mod conversation;
pub mod credentials;
pub mod error;
pub mod game_state;
pub mod level;
pub mod logging;
pub mod message;
pub mod persona;
pub mod progression;
pub mod prompts;
pub mod save;
pub mod settings;
pub mod tags;

// Re-export commonly used items for easier access
pub use ai::{ChatRequest, ChatTransport, GameAI, HttpTransport, Purpose, RetryPolicy};
pub use app_state::{Phase, SessionState};
pub use content_filter::{ContentFilter, ContentRating};
pub use conversation::{ConversationEngine, SessionSnapshot, TurnOutcome};
pub use credentials::{CredentialProvider, CredentialStore, StaticCredential};
pub use error::{AppError, TransportError};
pub use game_state::{PersonaDraft, QuestionSetup, SessionConfig};
pub use level::{LevelCatalog, LevelRecord};
pub use message::{ChatMessage, ChatRole, Message, OptionId, QuestionOption, Sender, Transcript};
pub use persona::PersonaBuilder;
pub use progression::{Completion, ProgressionState, ProgressionStore, ProgressionTracker};
pub use save::JsonProgressionStore;
pub use settings::Settings;
