use chrono::TimeDelta;
use std::time::Duration;

/// First local hour (inclusive) during which join announcements are sent
pub const ANNOUNCE_OPEN_HOUR: u32 = 8;

/// Last local hour (inclusive) during which join announcements are sent
pub const ANNOUNCE_CLOSE_HOUR: u32 = 22;

/// How long a user stays suppressed after being announced
pub const DEDUP_TIMEOUT: TimeDelta = TimeDelta::minutes(5);

/// How long the bot stays in a voice channel after triggering a join sound
pub const VOICE_DISCONNECT_DELAY: Duration = Duration::from_secs(5);

/// Slash command that grants the announcement role
pub const OPT_IN_COMMAND: &str = "voice-spam";

/// Slash command that revokes the announcement role
pub const OPT_OUT_COMMAND: &str = "no-spam";

/// Default path of the static guild configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Timezone used for quiet hours when neither the guild nor the environment sets one
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Discord REST API base used for endpoints serenity has no route for
pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Log directive for the application
pub const LOG_DIRECTIVE: &str = "voice_herald=info";
