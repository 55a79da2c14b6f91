//! Static guild configuration as loaded from disk.
//!
//! The file is a JSON object keyed by guild ID. Everything here is read once at
//! startup and never written back; resolved role IDs live in [`crate::engine::store`].

use std::collections::HashMap;

use chrono_tz::Tz;
use poise::serenity_prelude::{ChannelId, GuildId, MessageId};
use serde::Deserialize;

use crate::{error::ConfigError, utils::timezone::parse_timezone};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawGuildConfig {
    #[serde(rename = "NotificationChannelID")]
    notification_channel_id: String,
    #[serde(rename = "EmojiID", default)]
    emoji_id: String,
    #[serde(default)]
    required_role_name: String,
    #[serde(default)]
    user_config: HashMap<String, RawUserConfig>,
    #[serde(default)]
    role_config: Option<RawRoleConfig>,
    #[serde(default)]
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawUserConfig {
    #[serde(default)]
    on_join_sound: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRoleConfig {
    #[serde(rename = "ManagementChannelID")]
    management_channel_id: String,
    #[serde(rename = "MessageID")]
    message_id: String,
    #[serde(default)]
    emoji_role_config: HashMap<String, String>,
}

/// Reaction-role setup for one guild
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionRoleSettings {
    pub management_channel_id: ChannelId,
    pub message_id: MessageId,
    /// Emoji name to role name (or role ID)
    pub emoji_roles: HashMap<String, String>,
}

/// Typed static configuration for one guild
#[derive(Clone, Debug, PartialEq)]
pub struct GuildSettings {
    pub notification_channel_id: ChannelId,
    pub announce_emoji: String,
    pub required_role_name: String,
    /// Username to soundboard sound ID; users with an empty sound are left out
    pub user_sounds: HashMap<String, String>,
    pub reaction_roles: Option<ReactionRoleSettings>,
    pub timezone: Tz,
}

/// Read and parse the guild configuration file
pub fn load_guild_configs(
    path: &str,
    default_timezone: Tz,
) -> Result<HashMap<GuildId, GuildSettings>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    parse_guild_configs(&contents, default_timezone)
}

/// Parse guild configuration from a JSON document
pub fn parse_guild_configs(
    json: &str,
    default_timezone: Tz,
) -> Result<HashMap<GuildId, GuildSettings>, ConfigError> {
    let raw: HashMap<String, RawGuildConfig> = serde_json::from_str(json)?;

    raw.into_iter()
        .map(|(guild_id, config)| -> Result<_, ConfigError> {
            let guild_id = GuildId::new(parse_snowflake("guild ID", &guild_id)?);
            Ok((guild_id, convert_guild(config, default_timezone)?))
        })
        .collect()
}

fn convert_guild(raw: RawGuildConfig, default_timezone: Tz) -> Result<GuildSettings, ConfigError> {
    let notification_channel_id = ChannelId::new(parse_snowflake(
        "NotificationChannelID",
        &raw.notification_channel_id,
    )?);

    let reaction_roles = raw
        .role_config
        .map(|rc| -> Result<ReactionRoleSettings, ConfigError> {
            Ok(ReactionRoleSettings {
                management_channel_id: ChannelId::new(parse_snowflake(
                    "ManagementChannelID",
                    &rc.management_channel_id,
                )?),
                message_id: MessageId::new(parse_snowflake("MessageID", &rc.message_id)?),
                emoji_roles: rc.emoji_role_config,
            })
        })
        .transpose()?;

    let timezone = match raw.timezone {
        Some(name) => parse_timezone(&name)?,
        None => default_timezone,
    };

    let user_sounds = raw
        .user_config
        .into_iter()
        .filter(|(_, user)| !user.on_join_sound.trim().is_empty())
        .map(|(username, user)| (username, user.on_join_sound))
        .collect();

    Ok(GuildSettings {
        notification_channel_id,
        announce_emoji: raw.emoji_id,
        required_role_name: raw.required_role_name,
        user_sounds,
        reaction_roles,
        timezone,
    })
}

/// Parse a Discord snowflake, rejecting zero since serenity IDs are non-zero
fn parse_snowflake(field: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| ConfigError::InvalidId {
            field,
            value: value.to_string(),
        })
}
