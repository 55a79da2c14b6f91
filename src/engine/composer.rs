use super::{eligibility::VoiceTransition, store::GuildConfig};

/// Build the join announcement
///
/// A missing channel name leaves the sentence without its channel rather than
/// failing the announcement.
pub fn compose(
    config: &GuildConfig,
    transition: &VoiceTransition,
    channel_name: Option<&str>,
) -> String {
    format!(
        "{} looks like {} just joined {}",
        config.settings.announce_emoji,
        transition.display_name,
        channel_name.unwrap_or_default()
    )
}

/// Prefer the guild nickname over the account username
pub fn display_name(nick: Option<&str>, username: &str) -> String {
    nick.filter(|nick| !nick.is_empty())
        .unwrap_or(username)
        .to_string()
}
