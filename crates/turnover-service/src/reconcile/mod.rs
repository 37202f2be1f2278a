//! Reconciliation of derived events against stored events.
//!
//! [`plan_listing`] decides what happens to every event key of a listing
//! without touching the database; [`execute::apply_plan`] carries the plan out
//! inside the listing's transaction.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use turnover_db::db::enums::CheckoutType;
use turnover_db::model::event::CalendarEvent;
use turnover_db::model::sync::SyncCounters;
use uuid::Uuid;

use crate::derive::{DerivedEvent, EventKey};
use crate::fingerprint::{Classification, classify};

pub mod execute;

#[cfg(test)]
mod tests;

/// What the current sync learned about the listing's feeds.
#[derive(Debug, Clone, Default)]
pub struct PlanContext {
    /// Feeds whose fetch and parse succeeded.
    pub succeeded_feeds: HashSet<Uuid>,
    /// Feeds whose fetch or parse failed in this pass.
    pub failed_feeds: HashSet<Uuid>,
    /// First day of the fetch window. Older events are outside what the
    /// feeds were asked about.
    pub window_start: NaiveDate,
}

/// One decision for one event key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    /// Key never seen before.
    Insert { derived: DerivedEvent },
    /// Stored row rewritten from the feed.
    Update {
        event_id: Uuid,
        derived: DerivedEvent,
        /// Fingerprint differs; the prior window is archived as `moved`.
        changed: bool,
        /// Row was inactive and comes back.
        reactivated: bool,
    },
    /// Fingerprint equal; only `last_synced`, `checkout_type` and the
    /// source feed refresh.
    Touch {
        event_id: Uuid,
        key: EventKey,
        feed_id: Uuid,
        checkout_type: CheckoutType,
    },
    /// Active row no longer present in any feed.
    Deactivate { event_id: Uuid, key: EventKey },
}

/// Why the deactivation step of a listing was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationSkip {
    /// Every feed of the listing failed, or it has none.
    NoFeedSucceeded,
    /// Feeds answered but produced no events at all.
    NoDerivedEvents,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPlan {
    pub actions: Vec<EventAction>,
    pub deactivation_skipped: Option<DeactivationSkip>,
    /// Active events absent from the feeds but kept because their feed failed
    /// or they predate the fetch window.
    pub protected: usize,
    /// Active events the skipped deactivation step would have considered.
    pub stored_active: usize,
}

impl ListingPlan {
    /// Session counter increments this plan produces.
    #[must_use]
    pub fn counters(&self) -> SyncCounters {
        let mut counters = SyncCounters::default();
        for action in &self.actions {
            match action {
                EventAction::Insert { .. } => counters.added += 1,
                EventAction::Update {
                    reactivated: true, ..
                } => counters.replaced += 1,
                EventAction::Update { .. } => counters.updated += 1,
                EventAction::Touch { .. } => counters.unchanged += 1,
                EventAction::Deactivate { .. } => counters.deactivated += 1,
            }
        }
        counters
    }
}

fn key_of(event: &CalendarEvent) -> EventKey {
    EventKey {
        external_id: event.external_id.clone(),
        role: event.role,
    }
}

/// ## Summary
/// Plans the reconciliation of one listing.
///
/// `stored` holds every row of the listing, active or not; `derived` is the
/// output of this sync's event deriver.
///
/// Deactivation is skipped entirely when no feed succeeded or when the
/// feeds produced no events. Otherwise an active event absent from `derived`
/// is deactivated unless its own feed failed in this pass or it is dated
/// before the window start.
#[must_use]
#[tracing::instrument(skip_all, fields(stored = stored.len(), derived = derived.len()))]
pub fn plan_listing(
    stored: &[CalendarEvent],
    derived: Vec<DerivedEvent>,
    ctx: &PlanContext,
) -> ListingPlan {
    let by_key: HashMap<EventKey, &CalendarEvent> =
        stored.iter().map(|event| (key_of(event), event)).collect();
    let derived_keys: HashSet<EventKey> = derived.iter().map(DerivedEvent::key).collect();
    let derived_is_empty = derived.is_empty();

    let mut plan = ListingPlan::default();

    for fresh in derived {
        let key = fresh.key();
        let Some(existing) = by_key.get(&key) else {
            plan.actions.push(EventAction::Insert { derived: fresh });
            continue;
        };

        let classification = classify(Some(&existing.fingerprint), &fresh.fingerprint);
        let action = match (existing.is_active, classification) {
            (true, Classification::Unchanged) => EventAction::Touch {
                event_id: existing.id,
                key,
                feed_id: fresh.feed_id,
                checkout_type: fresh.checkout_type,
            },
            (active, classification) => EventAction::Update {
                event_id: existing.id,
                changed: classification != Classification::Unchanged,
                reactivated: !active,
                derived: fresh,
            },
        };
        plan.actions.push(action);
    }

    let mut absent: Vec<&CalendarEvent> = stored
        .iter()
        .filter(|event| event.is_active && !derived_keys.contains(&key_of(event)))
        .collect();
    absent.sort_by(|a, b| (a.event_date, &a.external_id).cmp(&(b.event_date, &b.external_id)));

    if ctx.succeeded_feeds.is_empty() {
        plan.deactivation_skipped = Some(DeactivationSkip::NoFeedSucceeded);
    } else if derived_is_empty {
        plan.deactivation_skipped = Some(DeactivationSkip::NoDerivedEvents);
    }

    if let Some(reason) = plan.deactivation_skipped {
        plan.stored_active = absent.len();
        tracing::warn!(?reason, stored_active = absent.len(), "Deactivation skipped");
        return plan;
    }

    for event in absent {
        let feed_failed = event
            .feed_id
            .is_some_and(|feed_id| ctx.failed_feeds.contains(&feed_id));
        if feed_failed || event.event_date < ctx.window_start {
            plan.protected += 1;
            continue;
        }
        plan.actions.push(EventAction::Deactivate {
            event_id: event.id,
            key: key_of(event),
        });
    }

    plan
}
