/// Discord-agnostic decision logic: configuration resolution, announcement
/// eligibility, suppression, role toggling, and message composition.
pub mod announcement;
pub mod composer;
pub mod dedup;
pub mod eligibility;
pub mod resolver;
pub mod role_sync;
pub mod store;

pub use dedup::DedupWindow;
pub use store::{ConfigStore, GuildConfig};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{TimeZone, Utc};
    use poise::serenity_prelude::{ChannelId, GuildId, MessageId, OnlineStatus, RoleId, UserId};

    use super::{
        announcement::{Delivery, deliver},
        composer::compose,
        eligibility::{Evaluation, Rejection, VoiceTransition, evaluate},
        resolver::resolve,
        role_sync::{Direction, ReactionEvent, reaction_request},
        *,
    };
    use crate::{config::parse_guild_configs, constants::DEDUP_TIMEOUT};

    const GUILD: GuildId = GuildId::new(111);
    const VOICE: ChannelId = ChannelId::new(50);

    fn store() -> ConfigStore {
        let json = r#"{
            "111": {
                "NotificationChannelID": "222",
                "EmojiID": ":wave:",
                "RequiredRoleName": "hello-there",
                "UserConfig": { "alice": { "OnJoinSound": "999" } },
                "RoleConfig": {
                    "ManagementChannelID": "333",
                    "MessageID": "444",
                    "EmojiRoleConfig": { "✅": "hello-there" }
                }
            }
        }"#;
        let store = ConfigStore::new(parse_guild_configs(json, chrono_tz::Tz::UTC).unwrap());

        let roster = HashMap::from([("hello-there".to_string(), RoleId::new(100))]);

        let settings = store.settings(GUILD).unwrap();
        store.install(GUILD, resolve(GUILD, &settings, &roster).unwrap());
        store
    }

    fn alice_joins() -> VoiceTransition {
        VoiceTransition {
            guild_id: GUILD,
            user_id: UserId::new(42),
            username: "alice".to_string(),
            display_name: "Ali".to_string(),
            is_bot: false,
            role_ids: vec![RoleId::new(100)],
            previous_channel: None,
            channel: Some(VOICE),
        }
    }

    #[test]
    fn test_join_scenarios() {
        let store = store();
        let config = store.get(GUILD).unwrap();
        let dedup = DedupWindow::new(DEDUP_TIMEOUT);
        let transition = alice_joins();
        let evaluate_at = |hour, minute| {
            evaluate(&Evaluation {
                transition: &transition,
                presence: Some(OnlineStatus::Online),
                config: &config,
                dedup: &dedup,
                now: Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap(),
            })
        };

        // Fresh join at 14:00 is announced
        let first = evaluate_at(14, 0);
        assert!(first.notify.is_ok());
        assert_eq!(
            compose(&config, &transition, Some("General")),
            ":wave: looks like Ali just joined General"
        );
        dedup.try_reserve(transition.user_id, Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap());

        // Two minutes later the user is still suppressed
        assert_eq!(evaluate_at(14, 2).notify, Err(Rejection::Suppressed));

        // At 23:30 quiet hours block the announcement but not the sound
        let late = evaluate_at(23, 30);
        assert_eq!(late.notify, Err(Rejection::QuietHours { hour: 23 }));
        assert_eq!(late.play_sound, Some((VOICE, "999".to_string())));
    }

    #[tokio::test]
    async fn test_rejoin_while_first_announcement_in_flight() {
        let store = store();
        let config = store.get(GUILD).unwrap();
        let dedup = DedupWindow::new(DEDUP_TIMEOUT);
        let transition = alice_joins();
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap();
        let t1 = t0 + chrono::TimeDelta::seconds(2);
        let evaluate_at = |now| {
            evaluate(&Evaluation {
                transition: &transition,
                presence: Some(OnlineStatus::Online),
                config: &config,
                dedup: &dedup,
                now,
            })
        };

        // Both events pass every gate before either has sent anything
        let first = evaluate_at(t0);
        let second = evaluate_at(t1);
        assert!(first.notify.is_ok());
        assert!(second.notify.is_ok());

        let mut sent = Vec::new();
        let log = &mut sent;
        let a = deliver(&first, &dedup, transition.user_id, t0, move || async move {
            log.push(t0);
            Ok::<(), ()>(())
        })
        .await;
        let log = &mut sent;
        let b = deliver(&second, &dedup, transition.user_id, t1, move || async move {
            log.push(t1);
            Ok::<(), ()>(())
        })
        .await;

        assert_eq!(a, Delivery::Sent);
        assert_eq!(b, Delivery::Skipped(Rejection::Suppressed));
        assert_eq!(sent, vec![t0]);
    }

    #[test]
    fn test_reaction_scenario() {
        let store = store();
        let config = store.get(GUILD).unwrap();
        let event = |direction| ReactionEvent {
            guild_id: GUILD,
            channel_id: ChannelId::new(333),
            message_id: MessageId::new(444),
            user_id: UserId::new(42),
            emoji: "✅".to_string(),
            direction,
        };

        let grant = reaction_request(&config, &event(Direction::Grant)).unwrap();
        assert_eq!(grant.role_id, RoleId::new(100));
        assert_eq!(grant.direction, Direction::Grant);

        let revoke = reaction_request(&config, &event(Direction::Revoke)).unwrap();
        assert_eq!(revoke.role_id, RoleId::new(100));
        assert_eq!(revoke.direction, Direction::Revoke);
    }

    #[test]
    fn test_unconfigured_guild_is_unknown() {
        assert!(store().get(GuildId::new(5)).is_err());
    }
}
