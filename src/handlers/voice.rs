use chrono::Utc;
use poise::serenity_prelude::{self as serenity, ChannelId, GuildId, OnlineStatus, UserId, VoiceState};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    engine::{
        announcement::{Delivery, deliver},
        composer::{compose, display_name},
        eligibility::{Evaluation, VoiceTransition, evaluate},
    },
    models::{Data, EventContext},
    services::play_join_sound,
};

/// Handle voice state updates (user joins/leaves voice channels)
pub async fn handle_voice_state_update(
    ctx: &serenity::Context,
    old_state: Option<VoiceState>,
    new_state: VoiceState,
    data: &Data,
) {
    let guild_id = match new_state.guild_id {
        Some(id) => id,
        None => return,
    };

    let Some(transition) = build_transition(guild_id, old_state.as_ref(), &new_state) else {
        debug!("Voice state update without member data in guild {}", guild_id);
        return;
    };

    let span = info_span!(
        "voice_state",
        guild = %guild_id,
        user = %transition.username,
        channel = ?transition.channel,
    );

    let event = match data.event_context(guild_id, span) {
        Ok(event) => event,
        Err(e) => {
            warn!("Ignoring voice state update: {}", e);
            return;
        }
    };

    process_transition(ctx, &event, transition)
        .instrument(event.span.clone())
        .await;
}

/// Flatten a gateway voice update into a transition
fn build_transition(
    guild_id: GuildId,
    old_state: Option<&VoiceState>,
    new_state: &VoiceState,
) -> Option<VoiceTransition> {
    let member = new_state.member.as_ref()?;
    Some(VoiceTransition {
        guild_id,
        user_id: new_state.user_id,
        username: member.user.name.clone(),
        display_name: display_name(member.nick.as_deref(), &member.user.name),
        is_bot: member.user.bot,
        role_ids: member.roles.clone(),
        previous_channel: old_state.and_then(|old| old.channel_id),
        channel: new_state.channel_id,
    })
}

async fn process_transition(
    ctx: &serenity::Context,
    event: &EventContext<'_>,
    transition: VoiceTransition,
) {
    let now = Utc::now();
    let presence = read_presence(ctx, transition.guild_id, transition.user_id);

    let decision = evaluate(&Evaluation {
        transition: &transition,
        presence,
        config: &event.config,
        dedup: event.dedup,
        now,
    });

    // A slow voice join must not hold up the announcement
    let sound = async {
        if let Some((channel_id, sound_id)) = &decision.play_sound
            && let Err(e) = play_join_sound(ctx, event, transition.guild_id, *channel_id, sound_id).await
        {
            error!("Failed to play join sound: {}", e);
        }
    };
    let announcement = deliver(&decision, event.dedup, transition.user_id, now, || {
        send_announcement(ctx, event, &transition)
    });

    let ((), delivery) = tokio::join!(sound, announcement);

    match delivery {
        Delivery::Skipped(reason) => debug!("Not announcing: {}", reason),
        Delivery::Failed(e) => error!("Could not send announcement: {}", e),
        Delivery::Sent => info!(
            "Announced {} ({} users in dedup window)",
            transition.display_name,
            event.dedup.len()
        ),
    }
}

async fn send_announcement(
    ctx: &serenity::Context,
    event: &EventContext<'_>,
    transition: &VoiceTransition,
) -> Result<(), serenity::Error> {
    // Only fresh joins get here, so the channel is always set
    let channel_name = match transition.channel {
        Some(channel_id) => channel_name(ctx, channel_id).await,
        None => None,
    };
    let message = compose(&event.config, transition, channel_name.as_deref());

    event
        .config
        .settings
        .notification_channel_id
        .say(&ctx.http, message)
        .await?;
    Ok(())
}

/// Presence from the gateway cache; `None` when the user has none cached
fn read_presence(ctx: &serenity::Context, guild_id: GuildId, user_id: UserId) -> Option<OnlineStatus> {
    ctx.cache
        .guild(guild_id)
        .and_then(|guild| guild.presences.get(&user_id).map(|presence| presence.status))
}

async fn channel_name(ctx: &serenity::Context, channel_id: ChannelId) -> Option<String> {
    match channel_id.to_channel(ctx).await {
        Ok(channel) => channel.guild().map(|guild_channel| guild_channel.name),
        Err(e) => {
            warn!("Could not fetch channel {}: {}", channel_id, e);
            None
        }
    }
}
