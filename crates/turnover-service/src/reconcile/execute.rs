//! Applies a [`ListingPlan`] to the database.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use turnover_db::db::connection::DbConnection;
use turnover_db::db::enums::VersionStatus;
use turnover_db::db::query::{event, notification};
use turnover_db::model::event::{
    CalendarEvent, EventSyncChangeset, NewCalendarEvent, NewEventVersion,
};
use turnover_db::model::notification::NewNotification;
use turnover_db::model::sync::{NewSyncLogEntry, SyncCounters};
use uuid::Uuid;

use super::{EventAction, ListingPlan};
use crate::assignment;
use crate::derive::DerivedEvent;
use crate::error::{ServiceError, ServiceResult};
use crate::notify;
use crate::sync::log::{LogScope, SyncLogDetails};

/// Fixed inputs of one listing's execution.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteContext {
    pub session_id: Uuid,
    pub listing_id: Uuid,
    /// Checkout time given to newly inserted events.
    pub default_checkout_time: NaiveTime,
    pub now: DateTime<Utc>,
}

/// What executing a plan wrote, for the session bookkeeping.
#[derive(Debug, Default)]
pub struct ExecutionOutcome {
    pub counters: SyncCounters,
    pub entries: Vec<NewSyncLogEntry>,
    pub notifications: usize,
}

fn sync_changeset(derived: &DerivedEvent, version: i32, now: DateTime<Utc>) -> EventSyncChangeset {
    EventSyncChangeset {
        feed_id: Some(derived.feed_id),
        event_date: derived.event_date,
        start_time: derived.start_time,
        end_time: derived.end_time,
        title: derived.title.clone(),
        guest_name: derived.guest_name.clone(),
        checkout_type: derived.checkout_type,
        fingerprint: derived.fingerprint.clone(),
        is_active: true,
        version,
        last_synced: now,
        updated_at: now,
    }
}

/// ## Summary
/// Executes `plan` for one listing. Must run inside the listing's
/// transaction; `stored` is the snapshot the plan was made from.
///
/// Every event decision yields one log entry. Assignments follow their
/// events, and cleaners whose events were moved or canceled are notified.
///
/// ## Errors
/// Returns an error if any database operation fails; the caller's
/// transaction then rolls the whole listing back.
#[tracing::instrument(skip_all, fields(listing_id = %ctx.listing_id, actions = plan.actions.len()))]
pub async fn apply_plan(
    conn: &mut DbConnection<'_>,
    stored: &[CalendarEvent],
    plan: ListingPlan,
    ctx: &ExecuteContext,
) -> ServiceResult<ExecutionOutcome> {
    let by_id: HashMap<Uuid, &CalendarEvent> = stored.iter().map(|e| (e.id, e)).collect();
    let lookup = |id: Uuid| {
        by_id
            .get(&id)
            .copied()
            .ok_or(ServiceError::InvariantViolation("planned event missing from snapshot"))
    };

    let mut outcome = ExecutionOutcome {
        counters: plan.counters(),
        ..ExecutionOutcome::default()
    };
    let mut notes: Vec<NewNotification> = Vec::new();
    let listing_id = ctx.listing_id;

    if let Some(reason) = plan.deactivation_skipped {
        outcome.entries.push(
            SyncLogDetails::DeactivationSkipped {
                reason,
                stored_active: plan.stored_active,
            }
            .into_entry(ctx.session_id, LogScope::listing(listing_id)),
        );
    }
    if plan.protected > 0 {
        tracing::info!(protected = plan.protected, "Absent events kept");
    }

    for action in plan.actions {
        match action {
            EventAction::Insert { derived } => {
                let created = event::insert(
                    conn,
                    &NewCalendarEvent {
                        id: Uuid::now_v7(),
                        listing_id,
                        feed_id: Some(derived.feed_id),
                        external_id: derived.external_id,
                        role: derived.role,
                        event_date: derived.event_date,
                        start_time: derived.start_time,
                        end_time: derived.end_time,
                        title: derived.title,
                        guest_name: derived.guest_name,
                        checkout_type: derived.checkout_type,
                        checkout_time: ctx.default_checkout_time,
                        fingerprint: derived.fingerprint,
                        last_synced: ctx.now,
                    },
                )
                .await?;

                outcome.entries.push(
                    SyncLogDetails::Added {
                        external_id: created.external_id.clone(),
                        role: created.role,
                        event_date: created.event_date,
                        checkout_type: created.checkout_type,
                    }
                    .into_entry(
                        ctx.session_id,
                        LogScope::event(listing_id, created.feed_id, created.id),
                    ),
                );
            }

            EventAction::Update {
                event_id,
                derived,
                changed,
                reactivated,
            } => {
                let previous = lookup(event_id)?;
                if changed {
                    event::archive_version(
                        conn,
                        &NewEventVersion::archive(previous, VersionStatus::Moved),
                    )
                    .await?;
                }
                let version = if changed {
                    previous.version + 1
                } else {
                    previous.version
                };

                let updated =
                    event::apply_sync(conn, event_id, &sync_changeset(&derived, version, ctx.now))
                        .await?;
                let active_assignment =
                    assignment::restore_for_event(conn, event_id, ctx.now).await?;

                let details = if reactivated {
                    SyncLogDetails::Replaced {
                        external_id: updated.external_id.clone(),
                        role: updated.role,
                        version: updated.version,
                        fingerprint_changed: changed,
                        assignment_restored: active_assignment.is_some(),
                    }
                } else {
                    if let Some(active) = &active_assignment {
                        notes.push(notify::event_moved(
                            active.cleaner_id,
                            &updated,
                            previous.start_time,
                        ));
                    }
                    SyncLogDetails::Updated {
                        external_id: updated.external_id.clone(),
                        role: updated.role,
                        version: updated.version,
                        previous_start: previous.start_time,
                        previous_end: previous.end_time,
                        start_time: updated.start_time,
                        end_time: updated.end_time,
                    }
                };
                outcome.entries.push(details.into_entry(
                    ctx.session_id,
                    LogScope::event(listing_id, updated.feed_id, updated.id),
                ));
            }

            EventAction::Touch {
                event_id,
                key,
                feed_id,
                checkout_type,
            } => {
                event::touch(conn, event_id, feed_id, checkout_type, ctx.now).await?;
                outcome.entries.push(
                    SyncLogDetails::Unchanged {
                        external_id: key.external_id,
                        role: key.role,
                        checkout_type,
                    }
                    .into_entry(
                        ctx.session_id,
                        LogScope::event(listing_id, Some(feed_id), event_id),
                    ),
                );
            }

            EventAction::Deactivate { event_id, key } => {
                let previous = lookup(event_id)?;
                event::archive_version(
                    conn,
                    &NewEventVersion::archive(previous, VersionStatus::Canceled),
                )
                .await?;
                let deactivated = event::deactivate(conn, event_id, ctx.now).await?;
                let released =
                    assignment::release_for_deactivated(conn, &deactivated, ctx.now).await?;
                let assignment_released = released.is_some();
                if let Some((_, note)) = released {
                    notes.push(note);
                }

                tracing::debug!(%key, "Event deactivated");
                outcome.entries.push(
                    SyncLogDetails::Deactivated {
                        external_id: key.external_id,
                        role: key.role,
                        version: deactivated.version,
                        assignment_released,
                    }
                    .into_entry(
                        ctx.session_id,
                        LogScope::event(listing_id, deactivated.feed_id, event_id),
                    ),
                );
            }
        }
    }

    notification::insert_batch(conn, &notes).await?;
    outcome.notifications = notes.len();

    tracing::info!(
        added = outcome.counters.added,
        updated = outcome.counters.updated,
        replaced = outcome.counters.replaced,
        unchanged = outcome.counters.unchanged,
        deactivated = outcome.counters.deactivated,
        notifications = outcome.notifications,
        "Listing reconciled"
    );

    Ok(outcome)
}
