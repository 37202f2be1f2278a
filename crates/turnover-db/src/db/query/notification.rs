//! Query composition for `notification`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::notification;
use crate::model::notification::{NewNotification, Notification};

/// ## Summary
/// Returns a query for notifications, newest first.
#[must_use]
pub fn by_filter(
    cleaner_id: Option<Uuid>,
    unread_only: bool,
) -> notification::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = notification::table.into_boxed();
    if let Some(cleaner_id) = cleaner_id {
        query = query.filter(notification::cleaner_id.eq(cleaner_id));
    }
    if unread_only {
        query = query.filter(notification::is_read.eq(false));
    }
    query.order(notification::created_at.desc())
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list(
    conn: &mut DbConnection<'_>,
    cleaner_id: Option<Uuid>,
    unread_only: bool,
) -> QueryResult<Vec<Notification>> {
    by_filter(cleaner_id, unread_only)
        .select(Notification::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert_batch(
    conn: &mut DbConnection<'_>,
    notifications: &[NewNotification],
) -> QueryResult<()> {
    if notifications.is_empty() {
        return Ok(());
    }

    diesel::insert_into(notification::table)
        .values(notifications)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn set_read(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    is_read: bool,
) -> QueryResult<Option<Notification>> {
    diesel::update(notification::table.find(id))
        .set(notification::is_read.eq(is_read))
        .returning(Notification::as_returning())
        .get_result(conn)
        .await
        .optional()
}
