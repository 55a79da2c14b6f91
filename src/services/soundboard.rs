use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, ChannelId, GuildId};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::{
    constants::{DISCORD_API_BASE, VOICE_DISCONNECT_DELAY},
    error::CapabilityError,
    models::EventContext,
};

use super::voice_session::{SessionTicket, VoiceSessions};

#[derive(Serialize)]
struct SendSoundboardSound<'a> {
    sound_id: &'a str,
}

/// Client for the soundboard endpoint, which serenity has no route for
pub struct Soundboard {
    client: reqwest::Client,
    token: String,
}

impl Soundboard {
    pub fn new(token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
        }
    }

    /// Play a soundboard sound in a voice channel the bot is connected to
    pub async fn send(&self, channel_id: ChannelId, sound_id: &str) -> Result<(), CapabilityError> {
        self.client
            .post(format!(
                "{}/channels/{}/send-soundboard-sound",
                DISCORD_API_BASE, channel_id
            ))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .json(&SendSoundboardSound { sound_id })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Join a voice channel, play a sound there, and schedule leaving again
pub async fn play_join_sound(
    ctx: &serenity::Context,
    event: &EventContext<'_>,
    guild_id: GuildId,
    channel_id: ChannelId,
    sound_id: &str,
) -> Result<(), CapabilityError> {
    let manager = songbird::get(ctx)
        .await
        .ok_or(CapabilityError::VoiceUnavailable)?;

    // Taking the ticket first makes pending disconnects stale while the join is in flight
    let ticket = event.voice_sessions.begin(guild_id, channel_id);
    if let Err(e) = manager.join_gateway(guild_id, channel_id).await {
        event.voice_sessions.finish(&ticket);
        return Err(e.into());
    }
    debug!("Joined voice channel {} in guild {}", channel_id, guild_id);

    let played = event.soundboard.send(channel_id, sound_id).await;

    schedule_disconnect(manager, Arc::clone(event.voice_sessions), ticket);

    played?;
    info!("Played sound {} in channel {}", sound_id, channel_id);
    Ok(())
}

/// Leave after a fixed delay unless a newer join took over the guild's session
fn schedule_disconnect(
    manager: Arc<songbird::Songbird>,
    sessions: Arc<VoiceSessions>,
    ticket: SessionTicket,
) {
    tokio::spawn(async move {
        tokio::time::sleep(VOICE_DISCONNECT_DELAY).await;

        if !sessions.is_current(&ticket) {
            debug!(
                "Skipping disconnect from {}: a newer voice session exists",
                ticket.channel_id
            );
            return;
        }

        let Some(call) = manager.get(ticket.guild_id) else {
            sessions.finish(&ticket);
            return;
        };
        let still_there = call.lock().await.current_channel()
            == Some(songbird::id::ChannelId::from(ticket.channel_id));

        if !still_there {
            debug!(
                "Skipping disconnect: bot is no longer in channel {}",
                ticket.channel_id
            );
            sessions.finish(&ticket);
            return;
        }

        // The ticket may have been superseded while we waited on the call lock
        if !sessions.finish(&ticket) {
            return;
        }

        if let Err(e) = manager.remove(ticket.guild_id).await {
            error!(
                "Failed to leave voice channel {} in guild {}: {}",
                ticket.channel_id, ticket.guild_id, e
            );
        }
    });
}
