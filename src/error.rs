//! Error types for startup, configuration resolution, and outbound Discord calls.
//!
//! None of these ever reach the gateway host: per-event failures are logged by the
//! handler that hit them and the event is dropped.

use poise::serenity_prelude::GuildId;
use thiserror::Error;

/// Malformed static configuration. Always fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The guild configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The guild configuration file is not valid JSON for the expected shape.
    #[error("Failed to parse guild config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field that should hold a Discord snowflake does not.
    #[error("Invalid {field} '{value}': expected a non-zero numeric Discord ID")]
    InvalidId { field: &'static str, value: String },

    /// The timezone name is not a known IANA zone.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// A guild's configured names do not resolve against its live role roster.
///
/// Scoped to one guild: the guild stays registered with whatever did resolve.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// A reaction emoji maps to a role name the guild does not have.
    #[error("Reaction emoji '{emoji}' maps to unknown role '{role}' in guild {guild_id}")]
    UnknownReactionRole {
        guild_id: GuildId,
        emoji: String,
        role: String,
    },

    /// The role roster itself could not be fetched.
    #[error("Failed to fetch roles for guild {guild_id}: {source}")]
    Roster {
        guild_id: GuildId,
        #[source]
        source: Box<poise::serenity_prelude::Error>,
    },
}

/// A delegated platform call failed. Logged, never retried.
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size.
    #[error(transparent)]
    Discord(#[from] Box<poise::serenity_prelude::Error>),

    /// Joining or leaving a voice channel failed.
    #[error(transparent)]
    Voice(#[from] songbird::error::JoinError),

    /// The voice manager was not registered on the client.
    #[error("Voice manager is not registered on the client")]
    VoiceUnavailable,

    /// The soundboard endpoint rejected the request or was unreachable.
    #[error(transparent)]
    Soundboard(#[from] reqwest::Error),
}

impl From<poise::serenity_prelude::Error> for CapabilityError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        Self::Discord(Box::new(err))
    }
}

/// An event referenced a guild with no configuration.
#[derive(Error, Debug)]
#[error("Guild {0} has no configuration")]
pub struct UnknownGuildError(pub GuildId);
