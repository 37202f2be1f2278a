//! Request parsing and response shaping shared by the app handlers.

use chrono::NaiveDate;
use salvo::Request;
use salvo::prelude::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// ## Summary
/// Builds `{"success": true, "<key>": value}`.
///
/// ## Errors
/// Returns an error if `value` cannot be serialized.
pub fn success<T: Serialize>(key: &str, value: &T) -> AppResult<Json<Value>> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(Json(Value::Object(body)))
}

/// ## Summary
/// Parses a UUID path parameter.
///
/// ## Errors
/// Returns `BadRequest` if the parameter is missing or malformed.
pub fn path_uuid(req: &Request, name: &str) -> AppResult<Uuid> {
    let raw = req
        .param::<String>(name)
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))?;
    Uuid::parse_str(&raw).map_err(|_err| AppError::BadRequest(format!("{name} is not a valid id")))
}

/// ## Errors
/// Returns `BadRequest` if the parameter is present but malformed.
pub fn query_uuid(req: &Request, name: &str) -> AppResult<Option<Uuid>> {
    req.query::<String>(name)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            Uuid::parse_str(&raw)
                .map_err(|_err| AppError::BadRequest(format!("{name} is not a valid id")))
        })
        .transpose()
}

/// ## Summary
/// Parses a `YYYY-MM-DD` query parameter.
///
/// ## Errors
/// Returns `BadRequest` if the parameter is present but malformed.
pub fn query_date(req: &Request, name: &str) -> AppResult<Option<NaiveDate>> {
    req.query::<String>(name)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_err| AppError::BadRequest(format!("{name} must be YYYY-MM-DD")))
        })
        .transpose()
}

/// ## Summary
/// Parses a boolean query flag; absent means `false`.
///
/// ## Errors
/// Returns `BadRequest` for values other than `true`/`false`/`1`/`0`.
pub fn query_flag(req: &Request, name: &str) -> AppResult<bool> {
    match req.query::<String>(name).as_deref() {
        None | Some("" | "false" | "0") => Ok(false),
        Some("true" | "1") => Ok(true),
        Some(_) => Err(AppError::BadRequest(format!("{name} must be true or false"))),
    }
}

/// ## Summary
/// Deserializes the JSON request body.
///
/// ## Errors
/// Returns `BadRequest` if the body is missing or does not match `T`.
pub async fn json_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    let payload = req
        .payload()
        .await
        .map_err(|e| AppError::BadRequest(format!("Unreadable request body: {e}")))?;
    serde_json::from_slice(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}

/// ## Summary
/// Like [`json_body`], but an empty body yields `T::default()`.
///
/// ## Errors
/// Returns `BadRequest` if a non-empty body does not match `T`.
pub async fn optional_json_body<T: DeserializeOwned + Default>(req: &mut Request) -> AppResult<T> {
    let payload = req
        .payload()
        .await
        .map_err(|e| AppError::BadRequest(format!("Unreadable request body: {e}")))?;
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}

/// Serde helper for patch bodies: an absent field stays `None`, an explicit
/// `null` becomes `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// ## Errors
/// Returns `BadRequest` unless `value` is finite and not negative.
pub fn non_negative(name: &str, value: f64) -> AppResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(AppError::BadRequest(format!(
            "{name} must be a non-negative number"
        )))
    }
}

/// ## Errors
/// Returns `BadRequest` if `value` is blank.
pub fn required<'a>(name: &str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::BadRequest(format!("{name} is required")))
    } else {
        Ok(trimmed)
    }
}
