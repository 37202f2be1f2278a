//! Weekly payment arithmetic over already-loaded rows.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use turnover_core::util::money::{add_rounded, line_amount, round2};
use turnover_core::util::week::WeekRange;
use turnover_db::model::assignment::CleanerAssignment;
use turnover_db::model::cleaner::Cleaner;
use turnover_db::model::event::CalendarEvent;
use turnover_db::model::extra_hours::ExtraHoursReport;
use turnover_db::model::listing::Listing;
use uuid::Uuid;

/// Name used in breakdowns for extra hours not tied to a listing.
pub const UNASSIGNED_LISTING: &str = "Unassigned";

/// Denormalized cleaner fields kept in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub hourly_rate: f64,
}

/// One paid checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentLine {
    pub assignment_id: Uuid,
    pub event_id: Uuid,
    pub listing_id: Uuid,
    pub listing_name: String,
    pub bank_account: Option<String>,
    pub checkout_date: NaiveDate,
    pub completed_at: Option<DateTime<Utc>>,
    pub hours: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraHoursLine {
    pub report_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub listing_name: Option<String>,
    pub bank_account: Option<String>,
    pub work_date: NaiveDate,
    pub description: String,
    pub hours: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingBreakdown {
    pub listing_id: Option<Uuid>,
    pub listing_name: String,
    pub cleans: u32,
    pub extra_entries: u32,
    pub hours: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccountBreakdown {
    /// `None` groups listings without a configured account.
    pub bank_account: Option<String>,
    pub hours: f64,
    pub amount: f64,
}

/// The `report_data` snapshot of a payment report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub cleaner: CleanerSnapshot,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub lines: Vec<AssignmentLine>,
    pub extra_hours: Vec<ExtraHoursLine>,
    pub by_listing: Vec<ListingBreakdown>,
    pub by_bank_account: Vec<BankAccountBreakdown>,
    pub total_hours: f64,
    pub total_amount: f64,
}

#[derive(Default)]
struct Totals {
    hours: f64,
    amount: f64,
}

impl Totals {
    fn add(&mut self, hours: f64, amount: f64) {
        self.hours = add_rounded(self.hours, hours);
        self.amount = add_rounded(self.amount, amount);
    }
}

/// ## Summary
/// Builds the snapshot for `cleaner` in `week`.
///
/// `checkouts` are the cleaner's active check-out assignments with their
/// event and listing; `extras` the extra-hours entries with their listing.
/// Rows dated outside `week` are ignored. Each line is
/// `round2(round2(hours) * hourly_rate)` and every running sum is rounded.
#[must_use]
pub fn compute_report(
    cleaner: &Cleaner,
    week: WeekRange,
    checkouts: &[(CleanerAssignment, CalendarEvent, Listing)],
    extras: &[(ExtraHoursReport, Option<Listing>)],
) -> ReportData {
    let rate = cleaner.hourly_rate;
    let mut totals = Totals::default();
    let mut listings: BTreeMap<Option<Uuid>, (String, u32, u32, Totals)> = BTreeMap::new();
    let mut accounts: BTreeMap<Option<String>, Totals> = BTreeMap::new();

    let lines: Vec<AssignmentLine> = checkouts
        .iter()
        .filter(|(_, event, _)| week.contains(event.event_date))
        .map(|(assignment, event, listing)| {
            let hours = round2(assignment.hours);
            let amount = line_amount(assignment.hours, rate);
            totals.add(hours, amount);

            let entry = listings
                .entry(Some(listing.id))
                .or_insert_with(|| (listing.name.clone(), 0, 0, Totals::default()));
            entry.1 += 1;
            entry.3.add(hours, amount);
            accounts
                .entry(listing.bank_account.clone())
                .or_default()
                .add(hours, amount);

            AssignmentLine {
                assignment_id: assignment.id,
                event_id: event.id,
                listing_id: listing.id,
                listing_name: listing.name.clone(),
                bank_account: listing.bank_account.clone(),
                checkout_date: event.event_date,
                completed_at: assignment.completed_at,
                hours,
                amount,
            }
        })
        .collect();

    let extra_hours: Vec<ExtraHoursLine> = extras
        .iter()
        .filter(|(report, _)| week.contains(report.work_date))
        .map(|(report, listing)| {
            let hours = round2(report.hours);
            let amount = line_amount(report.hours, rate);
            totals.add(hours, amount);

            let entry = listings
                .entry(listing.as_ref().map(|l| l.id))
                .or_insert_with(|| {
                    let name = listing
                        .as_ref()
                        .map_or_else(|| UNASSIGNED_LISTING.to_string(), |l| l.name.clone());
                    (name, 0, 0, Totals::default())
                });
            entry.2 += 1;
            entry.3.add(hours, amount);

            let bank_account = listing.as_ref().and_then(|l| l.bank_account.clone());
            accounts
                .entry(bank_account.clone())
                .or_default()
                .add(hours, amount);

            ExtraHoursLine {
                report_id: report.id,
                listing_id: listing.as_ref().map(|l| l.id),
                listing_name: listing.as_ref().map(|l| l.name.clone()),
                bank_account,
                work_date: report.work_date,
                description: report.description.clone(),
                hours,
                amount,
            }
        })
        .collect();

    let by_listing = listings
        .into_iter()
        .map(
            |(listing_id, (listing_name, cleans, extra_entries, sums))| ListingBreakdown {
                listing_id,
                listing_name,
                cleans,
                extra_entries,
                hours: sums.hours,
                amount: sums.amount,
            },
        )
        .collect();

    let by_bank_account = accounts
        .into_iter()
        .map(|(bank_account, sums)| BankAccountBreakdown {
            bank_account,
            hours: sums.hours,
            amount: sums.amount,
        })
        .collect();

    ReportData {
        cleaner: CleanerSnapshot {
            id: cleaner.id,
            name: cleaner.name.clone(),
            email: cleaner.email.clone(),
            hourly_rate: rate,
        },
        week_start: week.monday,
        week_end: week.sunday,
        lines,
        extra_hours,
        by_listing,
        by_bank_account,
        total_hours: totals.hours,
        total_amount: totals.amount,
    }
}
