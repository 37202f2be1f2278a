use chrono::NaiveDate;
use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::Deserialize;
use serde_json::Value;
use turnover_db::db::query::extra_hours;
use turnover_db::model::extra_hours::ExtraHoursChangeset;
use uuid::Uuid;

use super::reply::{json_body, non_negative, nullable, path_uuid, required, success};
use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateExtraHoursRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub listing_id: Option<Option<Uuid>>,
    pub work_date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub description: Option<String>,
}

impl UpdateExtraHoursRequest {
    fn into_changeset(self) -> AppResult<ExtraHoursChangeset> {
        if self.listing_id.is_none()
            && self.work_date.is_none()
            && self.hours.is_none()
            && self.description.is_none()
        {
            return Err(AppError::BadRequest("no changes given".to_string()));
        }

        Ok(ExtraHoursChangeset {
            listing_id: self.listing_id,
            work_date: self.work_date,
            hours: self
                .hours
                .map(|hours| non_negative("hours", hours))
                .transpose()?,
            description: self
                .description
                .map(|text| required("description", &text).map(str::to_string))
                .transpose()?,
        })
    }
}

#[handler]
async fn update_extra_hours(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;
    let body: UpdateExtraHoursRequest = json_body(req).await?;
    let changes = body.into_changeset()?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let updated = extra_hours::update(&mut conn, id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("extra hours report {id}")))?;
    success("extra_hours", &updated)
}

#[handler]
async fn delete_extra_hours(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    if extra_hours::delete(&mut conn, id).await? == 0 {
        return Err(AppError::NotFound(format!("extra hours report {id}")));
    }
    success("deleted", &id)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("extra-hours/{id}")
        .patch(update_extra_hours)
        .delete(delete_extra_hours)
}
