// Public modules
pub mod chat_request;
pub mod chat_response;
pub mod conversation_turn;
pub mod message;

// Re-exports
pub use chat_request::ChatRequest;
pub use chat_response::ChatResponse;
pub use conversation_turn::{ConversationTurn, TurnRole};
pub use message::{Message, MessageBody, MessageHandle, Sender};
