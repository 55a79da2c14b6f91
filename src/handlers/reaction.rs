use poise::serenity_prelude::{self as serenity, Reaction};
use tracing::{Instrument, debug, error, info_span, warn};

use crate::{
    engine::role_sync::{Direction, ReactionEvent, emoji_key, reaction_request},
    models::Data,
    services::apply_role_toggle,
};

/// Handle a reaction added to or removed from a message
///
/// Only reactions on a guild's management message with a mapped emoji change
/// roles. Failures are logged; reactions have no way to report back to the user.
pub async fn handle_reaction(
    ctx: &serenity::Context,
    reaction: &Reaction,
    direction: Direction,
    data: &Data,
) {
    let (Some(guild_id), Some(user_id)) = (reaction.guild_id, reaction.user_id) else {
        return;
    };

    if user_id == ctx.cache.current_user().id {
        return;
    }

    let Some(emoji) = emoji_key(&reaction.emoji) else {
        return;
    };

    let span = info_span!(
        "reaction",
        guild = %guild_id,
        user = %user_id,
        emoji = %emoji,
        ?direction,
    );

    let event = match data.event_context(guild_id, span) {
        Ok(event) => event,
        Err(e) => {
            warn!("Ignoring reaction: {}", e);
            return;
        }
    };

    let reaction_event = ReactionEvent {
        guild_id,
        channel_id: reaction.channel_id,
        message_id: reaction.message_id,
        user_id,
        emoji,
        direction,
    };

    async {
        let Some(request) = reaction_request(&event.config, &reaction_event) else {
            debug!("Reaction is not on the management message or uses an unmapped emoji");
            return;
        };

        if let Err(e) = apply_role_toggle(&ctx.http, &request).await {
            error!("Could not update role {}: {}", request.role_id, e);
        }
    }
    .instrument(event.span.clone())
    .await;
}
