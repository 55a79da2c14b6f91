// Command modules
mod announce;

// Re-export all commands
pub use announce::{no_spam, voice_spam};
