//! In-process exclusion of concurrent syncs of one listing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

/// Set of listings with a sync in flight.
#[derive(Debug, Clone, Default)]
pub struct ListingLocks {
    held: Arc<Mutex<HashSet<Uuid>>>,
}

/// Locks the held set and recovers from poisoning.
fn lock_held(held: &Mutex<HashSet<Uuid>>) -> MutexGuard<'_, HashSet<Uuid>> {
    match held.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            held.clear_poison();
            poisoned.into_inner()
        }
    }
}

impl ListingLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Claims `listing_id`, or returns `None` if another sync holds it.
    ///
    /// The claim is released when the guard is dropped.
    #[must_use]
    pub fn try_acquire(&self, listing_id: Uuid) -> Option<ListingGuard> {
        if !lock_held(&self.held).insert(listing_id) {
            return None;
        }
        Some(ListingGuard {
            held: Arc::clone(&self.held),
            listing_id,
        })
    }

    #[must_use]
    pub fn is_held(&self, listing_id: Uuid) -> bool {
        lock_held(&self.held).contains(&listing_id)
    }
}

/// Claim on one listing; releases on drop.
#[derive(Debug)]
pub struct ListingGuard {
    held: Arc<Mutex<HashSet<Uuid>>>,
    listing_id: Uuid,
}

impl ListingGuard {
    #[must_use]
    pub const fn listing_id(&self) -> Uuid {
        self.listing_id
    }
}

impl Drop for ListingGuard {
    fn drop(&mut self) {
        lock_held(&self.held).remove(&self.listing_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_refused_until_release() {
        let locks = ListingLocks::new();
        let listing = Uuid::new_v4();

        let guard = locks.try_acquire(listing).unwrap();
        assert_eq!(guard.listing_id(), listing);
        assert!(locks.try_acquire(listing).is_none());
        assert!(locks.is_held(listing));

        drop(guard);
        assert!(!locks.is_held(listing));
        assert!(locks.try_acquire(listing).is_some());
    }

    #[test]
    fn test_listings_are_independent() {
        let locks = ListingLocks::new();
        let _a = locks.try_acquire(Uuid::new_v4()).unwrap();
        assert!(locks.try_acquire(Uuid::new_v4()).is_some());
    }

    #[test]
    fn test_clones_share_claims() {
        let locks = ListingLocks::new();
        let other = locks.clone();
        let listing = Uuid::new_v4();

        let _guard = locks.try_acquire(listing).unwrap();
        assert!(other.try_acquire(listing).is_none());
    }
}
