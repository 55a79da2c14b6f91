//! Decides what a voice-state transition should trigger.
//!
//! The announcement branch runs an ordered list of gates and stops at the first
//! rejection. The sound branch only needs a real account entering a channel it was
//! not already in, plus a configured sound.

use std::fmt;

use chrono::{DateTime, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, OnlineStatus, RoleId, UserId};

use crate::{
    constants::{ANNOUNCE_CLOSE_HOUR, ANNOUNCE_OPEN_HOUR},
    utils::timezone::local_hour,
};

use super::{dedup::DedupWindow, store::GuildConfig};

/// One voice-state change, flattened from the gateway payload
#[derive(Clone, Debug)]
pub struct VoiceTransition {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub username: String,
    /// Guild nickname, or the username when none is set
    pub display_name: String,
    pub is_bot: bool,
    pub role_ids: Vec<RoleId>,
    pub previous_channel: Option<ChannelId>,
    pub channel: Option<ChannelId>,
}

impl VoiceTransition {
    /// The user was not in voice before and is now
    pub fn is_fresh_join(&self) -> bool {
        self.previous_channel.is_none() && self.channel.is_some()
    }

    /// Channel the user just entered, if this was a join or a move
    pub fn entered_channel(&self) -> Option<ChannelId> {
        self.channel.filter(|channel| Some(*channel) != self.previous_channel)
    }
}

/// Why an announcement was not sent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    BotAccount,
    NotFreshJoin,
    QuietHours { hour: u32 },
    PresenceUnavailable,
    PresenceHidden(OnlineStatus),
    MissingRequiredRole,
    Suppressed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::BotAccount => write!(f, "user is a bot"),
            Rejection::NotFreshJoin => write!(f, "user already in a voice channel"),
            Rejection::QuietHours { hour } => write!(f, "quiet hours (local hour {})", hour),
            Rejection::PresenceUnavailable => write!(f, "user presence could not be detected"),
            Rejection::PresenceHidden(status) => write!(f, "user is {}", status.name()),
            Rejection::MissingRequiredRole => write!(f, "user does not have the required role"),
            Rejection::Suppressed => write!(f, "user was announced recently"),
        }
    }
}

/// A single announcement check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    NotBot,
    FreshJoin,
    OpenHours,
    VisiblePresence,
    RequiredRole,
    NotSuppressed,
}

/// Announcement gates in evaluation order
pub const ANNOUNCE_GATES: [Gate; 6] = [
    Gate::NotBot,
    Gate::FreshJoin,
    Gate::OpenHours,
    Gate::VisiblePresence,
    Gate::RequiredRole,
    Gate::NotSuppressed,
];

/// Everything the gates may look at
pub struct Evaluation<'a> {
    pub transition: &'a VoiceTransition,
    /// `None` when the presence could not be read
    pub presence: Option<OnlineStatus>,
    pub config: &'a GuildConfig,
    pub dedup: &'a DedupWindow,
    pub now: DateTime<Utc>,
}

impl Gate {
    pub fn check(self, input: &Evaluation<'_>) -> Result<(), Rejection> {
        let transition = input.transition;
        match self {
            Gate::NotBot => pass_if(!transition.is_bot, Rejection::BotAccount),
            Gate::FreshJoin => pass_if(transition.is_fresh_join(), Rejection::NotFreshJoin),
            Gate::OpenHours => {
                let hour = local_hour(input.now, &input.config.settings.timezone);
                pass_if(is_open_hour(hour), Rejection::QuietHours { hour })
            }
            Gate::VisiblePresence => match input.presence {
                None => Err(Rejection::PresenceUnavailable),
                Some(status) if is_visible(status) => Ok(()),
                Some(status) => Err(Rejection::PresenceHidden(status)),
            },
            Gate::RequiredRole => pass_if(
                input
                    .config
                    .required_role_id
                    .is_some_and(|role| transition.role_ids.contains(&role)),
                Rejection::MissingRequiredRole,
            ),
            Gate::NotSuppressed => pass_if(
                !input.dedup.is_suppressed(transition.user_id, input.now),
                Rejection::Suppressed,
            ),
        }
    }
}

fn pass_if(condition: bool, rejection: Rejection) -> Result<(), Rejection> {
    if condition { Ok(()) } else { Err(rejection) }
}

/// Announcements are sent from 08:00 through 22:59 local time
pub fn is_open_hour(hour: u32) -> bool {
    (ANNOUNCE_OPEN_HOUR..=ANNOUNCE_CLOSE_HOUR).contains(&hour)
}

/// Only online and idle users are announced
pub fn is_visible(status: OnlineStatus) -> bool {
    matches!(status, OnlineStatus::Online | OnlineStatus::Idle)
}

/// Outcome of evaluating one transition
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub notify: Result<(), Rejection>,
    /// Soundboard sound to play in the entered channel
    pub play_sound: Option<(ChannelId, String)>,
}

/// Run both branches for a transition
pub fn evaluate(input: &Evaluation<'_>) -> Decision {
    let notify = ANNOUNCE_GATES
        .iter()
        .try_for_each(|gate| gate.check(input));

    Decision {
        notify,
        play_sound: sound_for(input.transition, input.config),
    }
}

fn sound_for(transition: &VoiceTransition, config: &GuildConfig) -> Option<(ChannelId, String)> {
    if transition.is_bot {
        return None;
    }
    let channel = transition.entered_channel()?;
    config
        .sound_for(&transition.username)
        .map(|sound| (channel, sound.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::tests::sample_settings;
    use chrono::{TimeDelta, TimeZone};

    const REQUIRED_ROLE: RoleId = RoleId::new(100);
    const VOICE: ChannelId = ChannelId::new(50);

    fn config() -> GuildConfig {
        let mut config = GuildConfig::unresolved(sample_settings());
        config.required_role_id = Some(REQUIRED_ROLE);
        config
    }

    fn join(username: &str) -> VoiceTransition {
        VoiceTransition {
            guild_id: GuildId::new(1),
            user_id: UserId::new(42),
            username: username.to_string(),
            display_name: format!("{}-nick", username),
            is_bot: false,
            role_ids: vec![REQUIRED_ROLE],
            previous_channel: None,
            channel: Some(VOICE),
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    fn run(
        transition: &VoiceTransition,
        presence: Option<OnlineStatus>,
        config: &GuildConfig,
        dedup: &DedupWindow,
        now: DateTime<Utc>,
    ) -> Decision {
        evaluate(&Evaluation {
            transition,
            presence,
            config,
            dedup,
            now,
        })
    }

    fn window() -> DedupWindow {
        DedupWindow::new(TimeDelta::minutes(5))
    }

    #[test]
    fn test_fresh_join_notifies() {
        let decision = run(
            &join("alice"),
            Some(OnlineStatus::Online),
            &config(),
            &window(),
            at(14, 0),
        );
        assert!(decision.notify.is_ok());
        assert_eq!(decision.play_sound, Some((VOICE, "555".to_string())));
    }

    #[test]
    fn test_existing_channel_never_notifies() {
        let config = config();
        let dedup = window();
        // mute toggle, channel move, and leave all have a previous channel
        let cases = [
            (Some(VOICE), Some(VOICE)),
            (Some(ChannelId::new(51)), Some(VOICE)),
            (Some(VOICE), None),
        ];
        for (previous, current) in cases {
            let mut transition = join("alice");
            transition.previous_channel = previous;
            transition.channel = current;

            let decision = run(&transition, Some(OnlineStatus::Online), &config, &dedup, at(14, 0));
            assert_eq!(decision.notify, Err(Rejection::NotFreshJoin));
        }
    }

    #[test]
    fn test_hour_gate_boundaries() {
        for hour in 0..24 {
            assert_eq!(is_open_hour(hour), (8..=22).contains(&hour), "hour {}", hour);
        }
        assert!(!is_open_hour(7));
        assert!(is_open_hour(8));
        assert!(is_open_hour(22));
        assert!(!is_open_hour(23));
    }

    #[test]
    fn test_quiet_hours_use_guild_timezone() {
        let mut config = config();
        config.settings.timezone = chrono_tz::Asia::Tokyo;
        // 14:00 UTC is 23:00 in Tokyo
        let decision = run(
            &join("alice"),
            Some(OnlineStatus::Online),
            &config,
            &window(),
            at(14, 0),
        );
        assert_eq!(decision.notify, Err(Rejection::QuietHours { hour: 23 }));
    }

    #[test]
    fn test_presence_gate() {
        let cases = [
            (Some(OnlineStatus::Online), Ok(())),
            (Some(OnlineStatus::Idle), Ok(())),
            (
                Some(OnlineStatus::DoNotDisturb),
                Err(Rejection::PresenceHidden(OnlineStatus::DoNotDisturb)),
            ),
            (
                Some(OnlineStatus::Invisible),
                Err(Rejection::PresenceHidden(OnlineStatus::Invisible)),
            ),
            (None, Err(Rejection::PresenceUnavailable)),
        ];
        for (presence, expected) in cases {
            let decision = run(&join("alice"), presence, &config(), &window(), at(14, 0));
            assert_eq!(decision.notify, expected, "presence {:?}", presence);
        }
    }

    #[test]
    fn test_required_role_gate() {
        let mut transition = join("alice");
        transition.role_ids = vec![RoleId::new(999)];
        let decision = run(&transition, Some(OnlineStatus::Online), &config(), &window(), at(14, 0));
        assert_eq!(decision.notify, Err(Rejection::MissingRequiredRole));

        // An unresolved role closes the gate for everyone
        let unresolved = GuildConfig::unresolved(sample_settings());
        let decision = run(&join("alice"), Some(OnlineStatus::Online), &unresolved, &window(), at(14, 0));
        assert_eq!(decision.notify, Err(Rejection::MissingRequiredRole));
    }

    #[test]
    fn test_bot_gets_nothing() {
        let mut transition = join("alice");
        transition.is_bot = true;
        let decision = run(&transition, Some(OnlineStatus::Online), &config(), &window(), at(14, 0));

        assert_eq!(decision.notify, Err(Rejection::BotAccount));
        assert_eq!(decision.play_sound, None);
    }

    #[test]
    fn test_gates_short_circuit_in_order() {
        // Fails presence, role, and hours at once; hours is checked first
        let mut transition = join("alice");
        transition.role_ids.clear();
        let decision = run(&transition, None, &config(), &window(), at(23, 30));
        assert_eq!(decision.notify, Err(Rejection::QuietHours { hour: 23 }));
    }

    #[test]
    fn test_notified_again_two_minutes_later_is_suppressed() {
        let config = config();
        let dedup = window();
        let transition = join("alice");

        let first = run(&transition, Some(OnlineStatus::Online), &config, &dedup, at(14, 0));
        assert!(first.notify.is_ok());
        dedup.try_reserve(transition.user_id, at(14, 0));

        let second = run(&transition, Some(OnlineStatus::Online), &config, &dedup, at(14, 2));
        assert_eq!(second.notify, Err(Rejection::Suppressed));

        let later = run(&transition, Some(OnlineStatus::Online), &config, &dedup, at(14, 5));
        assert!(later.notify.is_ok());
    }

    #[test]
    fn test_sound_ignores_quiet_hours() {
        let decision = run(
            &join("alice"),
            Some(OnlineStatus::Online),
            &config(),
            &window(),
            at(23, 30),
        );
        assert_eq!(decision.notify, Err(Rejection::QuietHours { hour: 23 }));
        assert_eq!(decision.play_sound, Some((VOICE, "555".to_string())));
    }

    #[test]
    fn test_sound_ignores_role_presence_and_dedup() {
        let dedup = window();
        let mut transition = join("alice");
        transition.role_ids.clear();
        dedup.try_reserve(transition.user_id, at(14, 0));

        let decision = run(&transition, Some(OnlineStatus::DoNotDisturb), &config(), &dedup, at(14, 1));
        assert!(decision.notify.is_err());
        assert_eq!(decision.play_sound, Some((VOICE, "555".to_string())));
    }

    #[test]
    fn test_sound_on_channel_switch_but_not_on_mute() {
        let mut moved = join("alice");
        moved.previous_channel = Some(ChannelId::new(51));
        let decision = run(&moved, Some(OnlineStatus::Online), &config(), &window(), at(14, 0));
        assert_eq!(decision.play_sound, Some((VOICE, "555".to_string())));

        let mut muted = join("alice");
        muted.previous_channel = Some(VOICE);
        let decision = run(&muted, Some(OnlineStatus::Online), &config(), &window(), at(14, 0));
        assert_eq!(decision.play_sound, None);

        let mut left = join("alice");
        left.previous_channel = Some(VOICE);
        left.channel = None;
        let decision = run(&left, Some(OnlineStatus::Online), &config(), &window(), at(14, 0));
        assert_eq!(decision.play_sound, None);
    }

    #[test]
    fn test_no_sound_without_configuration() {
        let decision = run(&join("bob"), Some(OnlineStatus::Online), &config(), &window(), at(14, 0));
        assert!(decision.notify.is_ok());
        assert_eq!(decision.play_sound, None);
    }

    #[test]
    fn test_gate_order() {
        assert_eq!(ANNOUNCE_GATES[0], Gate::NotBot);
        assert_eq!(ANNOUNCE_GATES[1], Gate::FreshJoin);
        assert_eq!(ANNOUNCE_GATES[5], Gate::NotSuppressed);
    }
}
