use chrono::{NaiveDate, Utc};
use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;
use serde_json::Value;
use turnover_db::db::enums::CleanerRole;
use turnover_db::db::query::{cleaner, extra_hours};
use turnover_db::model::cleaner::{CleanerChangeset, NewCleaner};
use turnover_db::model::extra_hours::NewExtraHoursReport;
use turnover_service::password::hash_password;
use uuid::Uuid;

use super::reply::{json_body, non_negative, nullable, path_uuid, query_date, required, success};
use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};

/// ## Summary
/// Create cleaner request payload
#[derive(Debug, Deserialize)]
pub struct CreateCleanerRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<CleanerRole>,
    pub hourly_rate: f64,
    pub password: Option<String>,
}

/// Partial cleaner edit; `null` clears `phone` or the password.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCleanerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    pub role: Option<CleanerRole>,
    pub hourly_rate: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub password: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExtraHoursRequest {
    pub listing_id: Option<Uuid>,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub description: String,
}

fn valid_email(email: &str) -> AppResult<&str> {
    let email = required("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::BadRequest("email is not valid".to_string())),
    }
}

impl UpdateCleanerRequest {
    fn into_changeset(self) -> AppResult<CleanerChangeset> {
        let name = self
            .name
            .map(|name| required("name", &name).map(str::to_string))
            .transpose()?;
        let email = self
            .email
            .map(|email| valid_email(&email).map(str::to_string))
            .transpose()?;
        let hourly_rate = self
            .hourly_rate
            .map(|rate| non_negative("hourly_rate", rate))
            .transpose()?;
        let password_hash = match self.password {
            Some(Some(password)) => Some(Some(hash_password(&password)?)),
            Some(None) => Some(None),
            None => None,
        };

        Ok(CleanerChangeset {
            name,
            email,
            phone: self.phone,
            role: self.role,
            hourly_rate,
            password_hash,
            updated_at: Some(Utc::now()),
        })
    }
}

#[handler]
async fn list_cleaners(depot: &mut Depot) -> AppResult<Json<Value>> {
    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let cleaners = cleaner::list(&mut conn).await?;
    success("cleaners", &cleaners)
}

/// ## Summary
/// POST /app/cleaners - Creates a cleaner. A given password is stored as an
/// Argon2 hash and never returned.
///
/// ## Errors
/// Returns HTTP 400 for a blank name, malformed email, negative rate or short
/// password, HTTP 409 if the email is taken.
#[handler]
async fn create_cleaner(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Value>> {
    let body: CreateCleanerRequest = json_body(req).await?;
    let name = required("name", &body.name)?;
    let email = valid_email(&body.email)?;
    let hourly_rate = non_negative("hourly_rate", body.hourly_rate)?;
    let password_hash = body.password.as_deref().map(hash_password).transpose()?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let created = cleaner::insert(
        &mut conn,
        &NewCleaner {
            id: Uuid::now_v7(),
            name,
            email,
            phone: body.phone.as_deref(),
            role: body.role.unwrap_or(CleanerRole::Cleaner),
            hourly_rate,
            password_hash,
        },
    )
    .await?;

    tracing::info!(cleaner_id = %created.id, "Cleaner created");
    res.status_code(StatusCode::CREATED);
    success("cleaner", &created)
}

#[handler]
async fn update_cleaner(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;
    let body: UpdateCleanerRequest = json_body(req).await?;
    let changes = body.into_changeset()?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let updated = cleaner::update(&mut conn, id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cleaner {id}")))?;
    success("cleaner", &updated)
}

/// ## Summary
/// DELETE /app/cleaners/{id} - Deletes a cleaner with their assignments,
/// extra hours and notifications. Payment reports are kept without a cleaner.
#[handler]
async fn delete_cleaner(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    if cleaner::delete(&mut conn, id).await? == 0 {
        return Err(AppError::NotFound(format!("cleaner {id}")));
    }
    tracing::info!(cleaner_id = %id, "Cleaner deleted");
    success("deleted", &id)
}

#[handler]
async fn list_extra_hours(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let cleaner_id = path_uuid(req, "id")?;
    let from = query_date(req, "from")?;
    let to = query_date(req, "to")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    if cleaner::get(&mut conn, cleaner_id).await?.is_none() {
        return Err(AppError::NotFound(format!("cleaner {cleaner_id}")));
    }
    let reports = extra_hours::list(&mut conn, cleaner_id, from, to).await?;
    success("extra_hours", &reports)
}

/// ## Summary
/// POST /app/cleaners/{id}/extra-hours - Logs hours worked outside assigned
/// cleans, optionally against a listing.
#[handler]
async fn create_extra_hours(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Value>> {
    let cleaner_id = path_uuid(req, "id")?;
    let body: CreateExtraHoursRequest = json_body(req).await?;
    let hours = non_negative("hours", body.hours)?;
    let description = required("description", &body.description)?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    if cleaner::get(&mut conn, cleaner_id).await?.is_none() {
        return Err(AppError::NotFound(format!("cleaner {cleaner_id}")));
    }
    let created = extra_hours::insert(
        &mut conn,
        &NewExtraHoursReport {
            id: Uuid::now_v7(),
            cleaner_id,
            listing_id: body.listing_id,
            work_date: body.work_date,
            hours,
            description,
        },
    )
    .await?;
    res.status_code(StatusCode::CREATED);
    success("extra_hours", &created)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("cleaners")
        .get(list_cleaners)
        .post(create_cleaner)
        .push(
            Router::with_path("{id}")
                .patch(update_cleaner)
                .delete(delete_cleaner)
                .push(
                    Router::with_path("extra-hours")
                        .get(list_extra_hours)
                        .post(create_extra_hours),
                ),
        )
}
