//! Request handlers that need more than a few lines.

pub mod chat;
