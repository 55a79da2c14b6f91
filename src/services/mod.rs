/// Outbound Discord capabilities used by the event handlers
pub mod roles;
pub mod soundboard;
pub mod voice_session;

pub use roles::apply_role_toggle;
pub use soundboard::{Soundboard, play_join_sound};
pub use voice_session::VoiceSessions;
