use poise::serenity_prelude::Http;
use tracing::info;

use crate::{
    engine::role_sync::{Direction, RoleToggleRequest},
    error::CapabilityError,
};

const AUDIT_REASON: &str = "Self-service announcement role";

/// Apply a role toggle through the Discord API
///
/// Discord treats adding a held role or removing a missing one as success, so
/// repeated requests converge on the same state.
pub async fn apply_role_toggle(http: &Http, request: &RoleToggleRequest) -> Result<(), CapabilityError> {
    match request.direction {
        Direction::Grant => {
            http.add_member_role(
                request.guild_id,
                request.user_id,
                request.role_id,
                Some(AUDIT_REASON),
            )
            .await?
        }
        Direction::Revoke => {
            http.remove_member_role(
                request.guild_id,
                request.user_id,
                request.role_id,
                Some(AUDIT_REASON),
            )
            .await?
        }
    }

    info!(
        "{:?} role {} for user {} in guild {}",
        request.direction, request.role_id, request.user_id, request.guild_id
    );
    Ok(())
}
