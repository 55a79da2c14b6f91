/// Handler modules for Discord events
mod reaction;
mod ready;
mod voice;

// Re-export main handler functions
pub use reaction::handle_reaction;
pub use ready::handle_ready;
pub use voice::handle_voice_state_update;
