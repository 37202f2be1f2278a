#![allow(clippy::expect_used)]
//! Tests for weekly payment reports against a real database.

use std::sync::Arc;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use salvo::http::StatusCode;
use salvo::test::{ResponseExt, TestClient};
use serde_json::{Value, json};
use turnover_test::component::assignment::{self, AssignRequest};
use turnover_test::component::config::RegenerateStatus;
use turnover_test::component::constants::APP_ROUTE_PREFIX;
use turnover_test::component::db::enums::{EventRole, ReportStatus};
use turnover_test::component::db::query::event::{self, EventFilter};
use turnover_test::component::db::query::assignment as assignment_query;
use turnover_test::component::db::query::{extra_hours, payment_report};
use turnover_test::component::error::ServiceError;
use turnover_test::component::feed::MemoryFeedSource;
use turnover_test::component::model::assignment::CleanerAssignment;
use turnover_test::component::model::cleaner::Cleaner;
use turnover_test::component::model::event::CalendarEvent;
use turnover_test::component::model::extra_hours::NewExtraHoursReport;
use turnover_test::component::payment;
use uuid::Uuid;

use super::helpers::*;

const FEED: &str = "https://feeds.example.com/beach.ics";
const HOST: &str = "http://127.0.0.1:5800";

/// Seeds a listing cleaned in 3 hours, syncs one booking and assigns a
/// cleaner at 20/hour to its check-out.
async fn assigned_checkout(test_db: &TestDb) -> (Cleaner, CalendarEvent) {
    let (listing, _) = test_db
        .seed_listing("Beach House", Some(3.0), &[FEED])
        .await
        .expect("Failed to seed listing");
    let cleaner = test_db
        .seed_cleaner("Ana", 20.0)
        .await
        .expect("Failed to seed cleaner");

    let source = Arc::new(MemoryFeedSource::new().with_body(FEED, &ical(&[("b1", day(3), day(6))])));
    test_engine(source)
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");

    let mut conn = test_db.get_conn().await.expect("Failed to get connection");
    let check_out = event::list(
        &mut conn,
        &EventFilter {
            listing_id: Some(listing.id),
            ..EventFilter::default()
        },
    )
    .await
    .expect("Failed to list events")
    .into_iter()
    .find(|e| e.role == EventRole::CheckOut)
    .expect("check-out should exist");

    assignment::assign(
        &mut conn,
        AssignRequest {
            event_id: check_out.id,
            cleaner_id: cleaner.id,
            hours: None,
            default_hours: 2.0,
        },
    )
    .await
    .expect("Assign should succeed");

    (cleaner, check_out)
}

fn approx(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

/// ## Summary
/// Assigning another cleaner deactivates the previous assignment and keeps its row.
#[test_log::test(tokio::test)]
async fn reassignment_deactivates_previous_cleaner() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (ana, check_out) = assigned_checkout(&test_db).await;
    let bruno = test_db
        .seed_cleaner("Bruno", 22.0)
        .await
        .expect("Failed to seed cleaner");

    let mut conn = test_db.get_conn().await.expect("Failed to get connection");
    let first = assignment_query::active_for_event(&mut conn, check_out.id)
        .await
        .expect("Failed to load assignment")
        .expect("Ana should be assigned");
    assert_eq!(first.cleaner_id, ana.id);

    let second = assignment::assign(
        &mut conn,
        AssignRequest {
            event_id: check_out.id,
            cleaner_id: bruno.id,
            hours: Some(2.0),
            default_hours: 2.0,
        },
    )
    .await
    .expect("Reassign should succeed");

    let rows: Vec<CleanerAssignment> = assignment_query::for_event(check_out.id)
        .select(CleanerAssignment::as_select())
        .load(&mut conn)
        .await
        .expect("Failed to list assignments");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().filter(|a| a.is_active).count(), 1);

    let previous = rows
        .iter()
        .find(|a| a.id == first.id)
        .expect("previous assignment row is kept");
    assert!(!previous.is_active);
    assert_eq!(previous.cleaner_id, ana.id);

    let active = assignment_query::active_for_event(&mut conn, check_out.id)
        .await
        .expect("Failed to load assignment")
        .expect("Bruno should be assigned");
    assert_eq!(active.id, second.id);
    assert_eq!(active.cleaner_id, bruno.id);
}

/// ## Summary
/// Regenerating a week replaces the stored report with identical totals.
#[test_log::test(tokio::test)]
async fn regenerated_report_has_same_totals() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (cleaner, check_out) = assigned_checkout(&test_db).await;

    let mut conn = test_db.get_conn().await.expect("Failed to get connection");
    extra_hours::insert(
        &mut conn,
        &NewExtraHoursReport {
            id: Uuid::now_v7(),
            cleaner_id: cleaner.id,
            listing_id: None,
            work_date: check_out.event_date,
            hours: 1.5,
            description: "laundry run",
        },
    )
    .await
    .expect("Failed to insert extra hours");

    let first = payment::generate_report(
        &mut conn,
        cleaner.id,
        check_out.event_date,
        RegenerateStatus::Reset,
    )
    .await
    .expect("Report should generate");
    approx(first.total_hours, 4.5);
    approx(first.total_amount, 90.0);
    assert_eq!(first.status, ReportStatus::Pending);
    assert_eq!(first.report_data["extra_hours"][0]["listing_name"], Value::Null);
    assert_eq!(first.report_data["by_listing"].as_array().map(Vec::len), Some(2));

    let second = payment::generate_report(
        &mut conn,
        cleaner.id,
        check_out.event_date,
        RegenerateStatus::Reset,
    )
    .await
    .expect("Report should generate");
    assert_ne!(second.id, first.id);
    assert_eq!(second.week_start, first.week_start);
    approx(second.total_hours, first.total_hours);
    approx(second.total_amount, first.total_amount);

    let stored = payment_report::list(
        &mut conn,
        payment_report::ReportFilter {
            cleaner_id: Some(cleaner.id),
            week_start: None,
        },
    )
    .await
    .expect("Failed to list reports");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, second.id);
}

/// ## Summary
/// `Preserve` carries the prior status over a regeneration; `Reset` returns it to pending.
#[test_log::test(tokio::test)]
async fn regeneration_status_policy() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (cleaner, check_out) = assigned_checkout(&test_db).await;
    let mut conn = test_db.get_conn().await.expect("Failed to get connection");

    let report = payment::generate_report(
        &mut conn,
        cleaner.id,
        check_out.event_date,
        RegenerateStatus::Reset,
    )
    .await
    .expect("Report should generate");
    payment::update_status(&mut conn, report.id, ReportStatus::Approved)
        .await
        .expect("Approval should succeed");

    let preserved = payment::generate_report(
        &mut conn,
        cleaner.id,
        check_out.event_date,
        RegenerateStatus::Preserve,
    )
    .await
    .expect("Report should generate");
    assert_eq!(preserved.status, ReportStatus::Approved);

    let reset = payment::generate_report(
        &mut conn,
        cleaner.id,
        check_out.event_date,
        RegenerateStatus::Reset,
    )
    .await
    .expect("Report should generate");
    assert_eq!(reset.status, ReportStatus::Pending);
}

/// ## Summary
/// Reports move pending -> approved -> paid and refuse to skip or leave a final state.
#[test_log::test(tokio::test)]
async fn status_transitions_are_enforced() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (cleaner, check_out) = assigned_checkout(&test_db).await;
    let mut conn = test_db.get_conn().await.expect("Failed to get connection");

    let report = payment::generate_report(
        &mut conn,
        cleaner.id,
        check_out.event_date,
        RegenerateStatus::Reset,
    )
    .await
    .expect("Report should generate");

    let skipped = payment::update_status(&mut conn, report.id, ReportStatus::Paid).await;
    assert!(matches!(skipped, Err(ServiceError::Conflict(_))));

    payment::update_status(&mut conn, report.id, ReportStatus::Approved)
        .await
        .expect("Approval should succeed");
    let paid = payment::update_status(&mut conn, report.id, ReportStatus::Paid)
        .await
        .expect("Payment should succeed");
    assert_eq!(paid.status, ReportStatus::Paid);

    let reopened = payment::update_status(&mut conn, report.id, ReportStatus::Rejected).await;
    assert!(matches!(reopened, Err(ServiceError::Conflict(_))));

    let missing = payment::update_status(&mut conn, Uuid::now_v7(), ReportStatus::Approved).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

/// ## Summary
/// Generating and listing reports over HTTP.
#[test_log::test(tokio::test)]
async fn report_endpoints_round_trip() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (cleaner, check_out) = assigned_checkout(&test_db).await;
    let service = create_db_test_service(
        &test_db,
        test_engine(Arc::new(MemoryFeedSource::new())),
        test_config(),
    );

    let mut res = TestClient::post(format!("{HOST}{APP_ROUTE_PREFIX}/payment-reports/generate"))
        .json(&json!({
            "cleaner_id": cleaner.id,
            "reference_date": check_out.event_date,
        }))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::CREATED));
    let body: Value = serde_json::from_str(&res.take_string().await.expect("body"))
        .expect("JSON body");
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["status"], "pending");
    assert_eq!(body["report"]["total_hours"], 3.0);
    let report_id = body["report"]["id"].as_str().expect("report id").to_string();

    let mut res = TestClient::patch(format!(
        "{HOST}{APP_ROUTE_PREFIX}/payment-reports/{report_id}/status"
    ))
    .json(&json!({ "status": "paid" }))
    .send(&service)
    .await;
    assert_eq!(res.status_code, Some(StatusCode::CONFLICT));
    let body: Value = serde_json::from_str(&res.take_string().await.expect("body"))
        .expect("JSON body");
    assert_eq!(body["success"], false);

    let mut res = TestClient::get(format!(
        "{HOST}{APP_ROUTE_PREFIX}/payment-reports?cleaner_id={}",
        cleaner.id
    ))
    .send(&service)
    .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    let body: Value = serde_json::from_str(&res.take_string().await.expect("body"))
        .expect("JSON body");
    assert_eq!(body["reports"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["reports"][0]["id"], report_id.as_str());
}
