//! Notification messages raised by event and assignment changes.

use chrono::{DateTime, SecondsFormat, Utc};
use turnover_db::db::enums::NotificationKind;
use turnover_db::model::event::CalendarEvent;
use turnover_db::model::notification::NewNotification;
use uuid::Uuid;

fn describe(event: &CalendarEvent) -> String {
    match &event.guest_name {
        Some(guest) => format!("{} ({guest}) on {}", event.role, event.event_date),
        None => format!("{} on {}", event.role, event.event_date),
    }
}

/// The event a cleaner was assigned to is no longer in the feed.
#[must_use]
pub fn event_canceled(cleaner_id: Uuid, event: &CalendarEvent) -> NewNotification {
    NewNotification {
        id: Uuid::now_v7(),
        cleaner_id: Some(cleaner_id),
        event_id: Some(event.id),
        kind: NotificationKind::EventCanceled,
        message: format!("Canceled: {}", describe(event)),
    }
}

/// The booking behind a cleaner's event changed.
#[must_use]
pub fn event_moved(
    cleaner_id: Uuid,
    event: &CalendarEvent,
    previous_start: DateTime<Utc>,
) -> NewNotification {
    NewNotification {
        id: Uuid::now_v7(),
        cleaner_id: Some(cleaner_id),
        event_id: Some(event.id),
        kind: NotificationKind::EventMoved,
        message: format!(
            "Changed: {} (was starting {})",
            describe(event),
            previous_start.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
    }
}

#[must_use]
pub fn assignment_created(cleaner_id: Uuid, event: &CalendarEvent, hours: f64) -> NewNotification {
    NewNotification {
        id: Uuid::now_v7(),
        cleaner_id: Some(cleaner_id),
        event_id: Some(event.id),
        kind: NotificationKind::AssignmentCreated,
        message: format!("Assigned: {} for {hours} h", describe(event)),
    }
}
