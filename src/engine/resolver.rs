//! Binds configured role names to the IDs a guild actually has.
//!
//! A missing required role only closes the role gate for that guild. A reaction
//! emoji pointing at a missing role fails the guild's reaction setup as a whole.

use std::collections::HashMap;

use poise::serenity_prelude::{GuildId, Role, RoleId};

use crate::{config::GuildSettings, error::ResolutionError};

/// Role name to ID for one guild
pub type RoleRoster = HashMap<String, RoleId>;

/// IDs resolved for one guild
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedConfig {
    pub required_role_id: Option<RoleId>,
    pub emoji_roles: HashMap<String, RoleId>,
}

impl ResolvedConfig {
    /// Resolution that keeps the required role and drops the reaction map
    pub fn required_role_only(settings: &GuildSettings, roster: &RoleRoster) -> Self {
        Self {
            required_role_id: resolve_required_role(settings, roster),
            emoji_roles: HashMap::new(),
        }
    }
}

/// Build a name lookup from a guild's role list
pub fn build_roster<'a>(roles: impl IntoIterator<Item = &'a Role>) -> RoleRoster {
    roles
        .into_iter()
        .map(|role| (role.name.clone(), role.id))
        .collect()
}

/// Resolve a guild's configured names against its roster
pub fn resolve(
    guild_id: GuildId,
    settings: &GuildSettings,
    roster: &RoleRoster,
) -> Result<ResolvedConfig, ResolutionError> {
    let emoji_roles = match &settings.reaction_roles {
        Some(reaction) => reaction
            .emoji_roles
            .iter()
            .map(|(emoji, role)| {
                lookup_role(roster, role)
                    .map(|id| (emoji.clone(), id))
                    .ok_or_else(|| ResolutionError::UnknownReactionRole {
                        guild_id,
                        emoji: emoji.clone(),
                        role: role.clone(),
                    })
            })
            .collect::<Result<HashMap<_, _>, _>>()?,
        None => HashMap::new(),
    };

    Ok(ResolvedConfig {
        required_role_id: resolve_required_role(settings, roster),
        emoji_roles,
    })
}

fn resolve_required_role(settings: &GuildSettings, roster: &RoleRoster) -> Option<RoleId> {
    if settings.required_role_name.is_empty() {
        return None;
    }
    roster.get(&settings.required_role_name).copied()
}

/// Match by name first, then accept a raw role ID the guild owns
fn lookup_role(roster: &RoleRoster, role: &str) -> Option<RoleId> {
    roster.get(role).copied().or_else(|| {
        let id = role.parse::<u64>().ok().filter(|id| *id != 0)?;
        roster
            .values()
            .find(|known| known.get() == id)
            .copied()
    })
}
