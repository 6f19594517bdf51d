pub mod client;
pub mod config;
pub mod controller;
pub mod endpoint;
pub mod error;
pub mod state;
pub mod widgets;

// Re-export main types for convenience
pub use client::{ChatReply, ChatTransport, HttpChatClient};
pub use config::Config;
pub use controller::{ChatController, ChatWidgets, Completion};
pub use endpoint::Endpoint;
pub use error::ChatError;
pub use state::{ChatMessage, ChatRole, ConversationLog, LogEntry};
pub use widgets::{EndpointSelector, InputField};
