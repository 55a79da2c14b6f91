use poise::CreateReply;
use tracing::{error, info, warn};

use crate::{
    engine::role_sync::command_request,
    models::{Context, Error},
    services::apply_role_toggle,
    utils::messages::format_success,
    utils::validation::require_guild,
};

/// Opt in to being announced when you join voice
#[poise::command(slash_command, guild_only, rename = "voice-spam")]
pub async fn voice_spam(ctx: Context<'_>) -> Result<(), Error> {
    toggle_announcement_role(ctx, "You will now be announced when you join voice!").await
}

/// Opt out of being announced when you join voice
#[poise::command(slash_command, guild_only, rename = "no-spam")]
pub async fn no_spam(ctx: Context<'_>) -> Result<(), Error> {
    toggle_announcement_role(ctx, "You will no longer be announced when you join voice.").await
}

/// Grant or revoke the guild's announcement role for the invoking member
///
/// Failures are logged and left unacknowledged, so the user only sees that the
/// command did not respond.
async fn toggle_announcement_role(ctx: Context<'_>, confirmation: &str) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;
    let user = ctx.author();

    let config = match ctx.data().config.get(guild_id) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring /{}: {}", ctx.command().name, e);
            return Ok(());
        }
    };

    let Some(request) = command_request(&config, guild_id, user.id, &ctx.command().name) else {
        error!(
            "Could not toggle announcement role for {} in guild {}: role '{}' is not resolved",
            user.name, guild_id, config.settings.required_role_name
        );
        return Ok(());
    };

    let already_applied = ctx
        .author_member()
        .await
        .is_some_and(|member| request.is_satisfied_by(&member.roles));

    if !already_applied
        && let Err(e) = apply_role_toggle(&ctx.serenity_context().http, &request).await
    {
        error!(
            "Could not update role for {} in guild {}: {}",
            user.name, guild_id, e
        );
        return Ok(());
    }

    ctx.send(
        CreateReply::default()
            .content(format_success(confirmation))
            .ephemeral(true),
    )
    .await?;

    info!("/{} by {} in guild {}", ctx.command().name, user.name, guild_id);

    Ok(())
}
