//! Turns opt-in commands and reaction events into role mutations.
//!
//! Both triggers resolve to the same [`RoleToggleRequest`], so granting through a
//! command and through a reaction are interchangeable.

use poise::serenity_prelude::{ChannelId, GuildId, MessageId, ReactionType, RoleId, UserId};

use crate::constants::{OPT_IN_COMMAND, OPT_OUT_COMMAND};

use super::store::GuildConfig;

/// Whether a role is being added or removed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Grant,
    Revoke,
}

/// Command name to the direction it toggles the required role
pub const COMMAND_REGISTRY: [(&str, Direction); 2] = [
    (OPT_IN_COMMAND, Direction::Grant),
    (OPT_OUT_COMMAND, Direction::Revoke),
];

/// A role change for one member
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleToggleRequest {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub direction: Direction,
}

impl RoleToggleRequest {
    /// The member's roles already reflect this request
    pub fn is_satisfied_by(&self, roles: &[RoleId]) -> bool {
        let has_role = roles.contains(&self.role_id);
        match self.direction {
            Direction::Grant => has_role,
            Direction::Revoke => !has_role,
        }
    }
}

/// A reaction added to or removed from a message
#[derive(Clone, Debug)]
pub struct ReactionEvent {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
    pub direction: Direction,
}

/// Direction registered for a command name
pub fn command_direction(command: &str) -> Option<Direction> {
    COMMAND_REGISTRY
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, direction)| *direction)
}

/// Request for an opt-in command; `None` for unknown commands or an unresolved role
pub fn command_request(
    config: &GuildConfig,
    guild_id: GuildId,
    user_id: UserId,
    command: &str,
) -> Option<RoleToggleRequest> {
    let direction = command_direction(command)?;
    let role_id = config.required_role_id?;
    Some(RoleToggleRequest {
        guild_id,
        user_id,
        role_id,
        direction,
    })
}

/// Request for a reaction; `None` unless it targets the management message with a mapped emoji
pub fn reaction_request(config: &GuildConfig, event: &ReactionEvent) -> Option<RoleToggleRequest> {
    let management = config.settings.reaction_roles.as_ref()?;
    if event.channel_id != management.management_channel_id
        || event.message_id != management.message_id
    {
        return None;
    }

    let role_id = *config.emoji_roles.get(&event.emoji)?;
    Some(RoleToggleRequest {
        guild_id: event.guild_id,
        user_id: event.user_id,
        role_id,
        direction: event.direction,
    })
}

/// Name used to look an emoji up in the reaction map
pub fn emoji_key(emoji: &ReactionType) -> Option<String> {
    match emoji {
        ReactionType::Unicode(unicode) => Some(unicode.clone()),
        ReactionType::Custom { name, .. } => name.clone(),
        _ => None,
    }
}
