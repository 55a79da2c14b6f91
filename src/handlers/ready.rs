use poise::serenity_prelude::{self as serenity, GuildId, Ready};
use tracing::{debug, error, info, warn};

use crate::{
    engine::resolver::{ResolvedConfig, build_roster, resolve},
    error::ResolutionError,
    models::Data,
};

/// Resolve role names for every configured guild the bot can see
///
/// Runs on every (re)connect. Each guild is resolved on its own so one guild's
/// misconfiguration never blocks another.
pub async fn handle_ready(ctx: &serenity::Context, ready: &Ready, data: &Data) {
    info!("{} is connected to Discord!", ready.user.name);

    for guild in &ready.guilds {
        if !data.config.contains(guild.id) {
            debug!("Guild {} has no configuration, skipping", guild.id);
            continue;
        }

        if let Err(e) = register_guild(ctx, guild.id, data).await {
            error!("Error registering guild: {}", e);
        }
    }
}

async fn register_guild(
    ctx: &serenity::Context,
    guild_id: GuildId,
    data: &Data,
) -> Result<(), ResolutionError> {
    let Some(settings) = data.config.settings(guild_id) else {
        return Ok(());
    };

    let roles = guild_id
        .roles(&ctx.http)
        .await
        .map_err(|source| ResolutionError::Roster {
            guild_id,
            source: Box::new(source),
        })?;
    let roster = build_roster(roles.values());

    match resolve(guild_id, &settings, &roster) {
        Ok(resolved) => {
            if resolved.required_role_id.is_none() {
                warn!(
                    "Guild {} has no role named '{}', announcements are disabled there",
                    guild_id, settings.required_role_name
                );
            }
            info!(
                "Registered guild {} with {} reaction roles",
                guild_id,
                resolved.emoji_roles.len()
            );
            data.config.install(guild_id, resolved);
            Ok(())
        }
        Err(e) => {
            // Keep the announcement role working even when reaction roles do not resolve
            data.config
                .install(guild_id, ResolvedConfig::required_role_only(&settings, &roster));
            Err(e)
        }
    }
}
