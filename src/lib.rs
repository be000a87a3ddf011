//! A chat front end for a single-endpoint chat backend.
//!
//! A [`ChatController`] locates a message list, a form and a text input on a
//! [`surface::Page`], then turns every form submission into one
//! `POST /api/chat` exchange rendered into the message list.

// Public modules
pub mod chat;
pub mod client;
pub mod controller;
pub mod error;
pub mod observability;
pub mod render;
pub mod surface;
pub mod transform;
pub mod types;

// Re-exports
pub use client::{ChatClient, ChatTransport};
pub use controller::{ChatController, Resolution, SessionStats, SubmissionState};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
