use std::sync::Arc;

use poise::serenity_prelude::GuildId;
use tracing::Span;

use crate::{
    constants::DEDUP_TIMEOUT,
    engine::{ConfigStore, DedupWindow, GuildConfig},
    error::UnknownGuildError,
    services::{Soundboard, VoiceSessions},
};

/// Bot state shared across all handlers
pub struct Data {
    /// Per-guild configuration and resolved IDs
    pub config: ConfigStore,
    /// Recently announced users
    pub dedup: DedupWindow,
    /// The bot's own voice joins, per guild
    pub voice_sessions: Arc<VoiceSessions>,
    /// Soundboard REST client
    pub soundboard: Soundboard,
}

impl Data {
    /// Create bot state from static configuration
    pub fn new(config: ConfigStore, soundboard: Soundboard) -> Self {
        Self {
            config,
            dedup: DedupWindow::new(DEDUP_TIMEOUT),
            voice_sessions: Arc::new(VoiceSessions::new()),
            soundboard,
        }
    }

    /// Bundle what a single event handler needs for one guild
    pub fn event_context(&self, guild_id: GuildId, span: Span) -> Result<EventContext<'_>, UnknownGuildError> {
        Ok(EventContext {
            config: self.config.get(guild_id)?,
            span,
            dedup: &self.dedup,
            voice_sessions: &self.voice_sessions,
            soundboard: &self.soundboard,
        })
    }
}

/// Per-event view of the bot state
pub struct EventContext<'a> {
    /// Snapshot of the guild's configuration at event time
    pub config: Arc<GuildConfig>,
    /// Span every log line of this event is recorded under
    pub span: Span,
    pub dedup: &'a DedupWindow,
    pub voice_sessions: &'a Arc<VoiceSessions>,
    pub soundboard: &'a Soundboard,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
