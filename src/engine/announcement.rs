//! Delivers one announcement under the dedup window.
//!
//! The user's slot is claimed before anything is sent and handed back if the
//! send fails, so overlapping events for one user produce at most one message
//! and a failed send never suppresses the next attempt.

use std::future::Future;

use chrono::{DateTime, Utc};
use poise::serenity_prelude::UserId;

use super::{
    dedup::DedupWindow,
    eligibility::{Decision, Rejection},
};

/// What happened to an announcement
#[derive(Debug, PartialEq)]
pub enum Delivery<E> {
    /// Ruled out by a gate, or another event already claimed the user
    Skipped(Rejection),
    Sent,
    /// The send failed and the claim was released
    Failed(E),
}

/// Claim the user's slot, then run `send` if the decision allows an announcement
pub async fn deliver<F, Fut, E>(
    decision: &Decision,
    dedup: &DedupWindow,
    user_id: UserId,
    now: DateTime<Utc>,
    send: F,
) -> Delivery<E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    if let Err(reason) = &decision.notify {
        return Delivery::Skipped(reason.clone());
    }

    let Some(reservation) = dedup.try_reserve(user_id, now) else {
        return Delivery::Skipped(Rejection::Suppressed);
    };

    match send().await {
        Ok(()) => Delivery::Sent,
        Err(e) => {
            dedup.release(&reservation);
            Delivery::Failed(e)
        }
    }
}
