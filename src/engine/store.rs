use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use poise::serenity_prelude::{GuildId, RoleId};

use crate::{config::GuildSettings, error::UnknownGuildError};

use super::resolver::ResolvedConfig;

/// Static settings of one guild plus the IDs resolved from its role roster
#[derive(Clone, Debug)]
pub struct GuildConfig {
    pub settings: GuildSettings,
    /// `None` until resolved, or when the guild has no role with the configured name
    pub required_role_id: Option<RoleId>,
    /// Emoji name to role, filled on successful resolution
    pub emoji_roles: HashMap<String, RoleId>,
}

impl GuildConfig {
    /// Configuration before any roster has been seen
    pub fn unresolved(settings: GuildSettings) -> Self {
        Self {
            settings,
            required_role_id: None,
            emoji_roles: HashMap::new(),
        }
    }

    /// Soundboard sound configured for a username, if any
    pub fn sound_for(&self, username: &str) -> Option<&str> {
        self.settings.user_sounds.get(username).map(String::as_str)
    }
}

/// Per-guild configuration shared across all handlers
///
/// Entries are replaced wholesale on resolution and handed out as `Arc` snapshots,
/// so a handler never observes a half-written guild.
pub struct ConfigStore {
    guilds: DashMap<GuildId, Arc<GuildConfig>>,
}

impl ConfigStore {
    /// Create a store from static configuration, every guild unresolved
    pub fn new(settings: HashMap<GuildId, GuildSettings>) -> Self {
        let guilds = settings
            .into_iter()
            .map(|(guild_id, settings)| (guild_id, Arc::new(GuildConfig::unresolved(settings))))
            .collect();
        Self { guilds }
    }

    /// Snapshot of a guild's configuration
    pub fn get(&self, guild_id: GuildId) -> Result<Arc<GuildConfig>, UnknownGuildError> {
        self.guilds
            .get(&guild_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(UnknownGuildError(guild_id))
    }

    /// Static settings of a guild, used as resolver input
    pub fn settings(&self, guild_id: GuildId) -> Option<GuildSettings> {
        self.guilds.get(&guild_id).map(|entry| entry.settings.clone())
    }

    /// Write resolved IDs for one guild, leaving every other guild untouched
    pub fn install(&self, guild_id: GuildId, resolved: ResolvedConfig) {
        if let Some(mut entry) = self.guilds.get_mut(&guild_id) {
            let mut config = GuildConfig::clone(entry.value());
            config.required_role_id = resolved.required_role_id;
            config.emoji_roles = resolved.emoji_roles;
            *entry = Arc::new(config);
        }
    }

    /// All configured guild IDs
    pub fn guild_ids(&self) -> Vec<GuildId> {
        self.guilds.iter().map(|entry| *entry.key()).collect()
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.guilds.contains_key(&guild_id)
    }
}
