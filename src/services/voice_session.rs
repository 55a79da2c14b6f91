use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use poise::serenity_prelude::{ChannelId, GuildId};

/// Identifies one voice join made by the bot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionTicket {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    generation: u64,
}

/// Tracks the bot's latest voice join per guild
///
/// A delayed disconnect holds the ticket of the join that scheduled it and may
/// only act while that ticket is still the latest one for the guild. A later
/// join, even into the same channel, invalidates every older ticket.
#[derive(Default)]
pub struct VoiceSessions {
    current: DashMap<GuildId, SessionTicket>,
    next_generation: AtomicU64,
}

impl VoiceSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new join, superseding any earlier one in the guild
    pub fn begin(&self, guild_id: GuildId, channel_id: ChannelId) -> SessionTicket {
        let ticket = SessionTicket {
            guild_id,
            channel_id,
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
        };
        self.current.insert(guild_id, ticket);
        ticket
    }

    /// Whether the ticket still belongs to the latest join
    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        self.current
            .get(&ticket.guild_id)
            .is_some_and(|current| *current == *ticket)
    }

    /// Release the session if the ticket is still current; returns whether it was
    pub fn finish(&self, ticket: &SessionTicket) -> bool {
        self.current
            .remove_if(&ticket.guild_id, |_, current| current == ticket)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = GuildId::new(1);

    #[test]
    fn test_single_session() {
        let sessions = VoiceSessions::new();
        let ticket = sessions.begin(GUILD, ChannelId::new(10));

        assert!(sessions.is_current(&ticket));
        assert!(sessions.finish(&ticket));
        assert!(!sessions.is_current(&ticket));
        assert!(!sessions.finish(&ticket));
    }

    #[test]
    fn test_rejoin_other_channel_invalidates_old_ticket() {
        let sessions = VoiceSessions::new();
        let first = sessions.begin(GUILD, ChannelId::new(10));
        let second = sessions.begin(GUILD, ChannelId::new(11));

        assert!(!sessions.finish(&first));
        assert!(sessions.is_current(&second));
    }

    #[test]
    fn test_rejoin_same_channel_invalidates_old_ticket() {
        let sessions = VoiceSessions::new();
        let first = sessions.begin(GUILD, ChannelId::new(10));
        let second = sessions.begin(GUILD, ChannelId::new(10));

        assert_ne!(first, second);
        assert!(!sessions.finish(&first));
        assert!(sessions.finish(&second));
    }

    #[test]
    fn test_guilds_are_independent() {
        let sessions = VoiceSessions::new();
        let a = sessions.begin(GUILD, ChannelId::new(10));
        let b = sessions.begin(GuildId::new(2), ChannelId::new(20));

        assert!(sessions.finish(&a));
        assert!(sessions.is_current(&b));
    }

    #[test]
    fn test_join_in_flight_makes_pending_disconnect_stale() {
        let sessions = VoiceSessions::new();
        let pending = sessions.begin(GUILD, ChannelId::new(10));

        // A second join into the same channel starts before the first timer fires
        let joining = sessions.begin(GUILD, ChannelId::new(10));
        assert!(!sessions.is_current(&pending));
        assert!(!sessions.finish(&pending));

        // The join then fails and hands its ticket back
        assert!(sessions.finish(&joining));
        assert!(!sessions.is_current(&pending));
        assert!(!sessions.is_current(&joining));
    }
}
