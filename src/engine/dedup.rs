use chrono::{DateTime, TimeDelta, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use poise::serenity_prelude::UserId;

/// A held claim on one user's window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub user_id: UserId,
    expiry: DateTime<Utc>,
}

/// Suppresses repeat announcements for a user until their window elapses
///
/// One window per user across all guilds. Expiry is checked lazily, so an entry
/// whose time has passed is never reported as suppressed even if it has not been
/// swept yet.
pub struct DedupWindow {
    entries: DashMap<UserId, DateTime<Utc>>,
    timeout: TimeDelta,
}

impl DedupWindow {
    pub fn new(timeout: TimeDelta) -> Self {
        Self {
            entries: DashMap::new(),
            timeout,
        }
    }

    /// Atomically claim the user's window starting at `now`
    ///
    /// Returns `None` while an earlier claim is still live, so of several events
    /// racing for the same user only one gets a reservation.
    pub fn try_reserve(&self, user_id: UserId, now: DateTime<Utc>) -> Option<Reservation> {
        self.purge_expired(now);
        let expiry = now + self.timeout;

        match self.entries.entry(user_id) {
            Entry::Occupied(entry) if *entry.get() > now => return None,
            Entry::Occupied(mut entry) => {
                entry.insert(expiry);
            }
            Entry::Vacant(entry) => {
                entry.insert(expiry);
            }
        }

        Some(Reservation { user_id, expiry })
    }

    /// Give back a reservation whose announcement was never delivered
    ///
    /// A newer claim for the same user is left alone.
    pub fn release(&self, reservation: &Reservation) {
        self.entries
            .remove_if(&reservation.user_id, |_, expiry| *expiry == reservation.expiry);
    }

    /// Whether the user is still inside their window at `now`
    pub fn is_suppressed(&self, user_id: UserId, now: DateTime<Utc>) -> bool {
        let Some(expiry) = self.entries.get(&user_id).map(|entry| *entry.value()) else {
            return false;
        };

        if now < expiry {
            return true;
        }

        // Only drop the entry we looked at; a concurrent claim keeps its new expiry
        self.entries.remove_if(&user_id, |_, current| *current <= now);
        false
    }

    /// Drop every entry whose window has elapsed
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, expiry| *expiry > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
