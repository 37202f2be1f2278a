//! Database enum types with Diesel serialization.
//!
//! Each enum maps to a `TEXT` column guarded by a CHECK constraint and
//! implements `ToSql`/`FromSql` for `PostgreSQL`, plus serde using the same
//! lowercase spelling as the database.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Raised when a string does not name a variant of a database enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized {type_name} value: {value:?}")]
pub struct UnknownVariant {
    pub type_name: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            AsExpression,
            FromSqlRow,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = std::str::from_utf8(bytes.as_bytes())?;
                Ok(raw.parse::<Self>()?)
            }
        }

        impl $name {
            /// Returns the database string representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        type_name: stringify!($name),
                        value: other.to_owned(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Which side of a booking an event represents.
    ///
    /// Maps to `calendar_event.role`.
    EventRole {
        CheckIn => "check_in",
        CheckOut => "check_out",
    }
}

text_enum! {
    /// Whether a check-out is followed by another check-in on the same date.
    ///
    /// Maps to `calendar_event.checkout_type`.
    CheckoutType {
        SameDay => "same_day",
        Open => "open",
    }
}

text_enum! {
    /// Why an event version was archived.
    ///
    /// Maps to `event_version.status`.
    VersionStatus {
        Moved => "moved",
        Canceled => "canceled",
    }
}

text_enum! {
    /// Maps to `cleaner.role`.
    CleanerRole {
        Cleaner => "cleaner",
        Lead => "lead",
        Admin => "admin",
    }
}

text_enum! {
    /// Approval state of a payment report.
    ///
    /// Maps to `cleaner_payment_report.status`.
    ReportStatus {
        Pending => "pending",
        Approved => "approved",
        Paid => "paid",
        Rejected => "rejected",
    }
}

text_enum! {
    /// Maps to `sync_session.scope`.
    SyncScope {
        Single => "single",
        All => "all",
    }
}

text_enum! {
    /// Maps to `sync_session.status`.
    SyncStatus {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

text_enum! {
    /// Maps to `notification.kind`.
    NotificationKind {
        EventCanceled => "event_canceled",
        EventMoved => "event_moved",
        AssignmentCreated => "assignment_created",
    }
}

impl ReportStatus {
    /// ## Summary
    /// Returns `true` if a report in this status may move to `next`.
    ///
    /// `pending` may be approved or rejected, `approved` may be paid or
    /// rejected; `paid` and `rejected` are final.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Paid | Self::Rejected)
        )
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Paid | Self::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_check_constraints() {
        assert_eq!(EventRole::CheckIn.as_str(), "check_in");
        assert_eq!(EventRole::CheckOut.as_str(), "check_out");
        assert_eq!(CheckoutType::SameDay.as_str(), "same_day");
        assert_eq!(VersionStatus::Canceled.as_str(), "canceled");
        assert_eq!(NotificationKind::EventMoved.as_str(), "event_moved");
    }

    #[test]
    fn test_from_str_round_trips_display() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::Approved,
            ReportStatus::Paid,
            ReportStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<ReportStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "archived".parse::<ReportStatus>().unwrap_err();
        assert_eq!(err.type_name, "ReportStatus");
        assert_eq!(err.value, "archived");
    }

    #[test]
    fn test_serde_uses_database_spelling() {
        let json = serde_json::to_string(&CheckoutType::SameDay).unwrap();
        assert_eq!(json, "\"same_day\"");

        let role: CleanerRole = serde_json::from_str("\"lead\"").unwrap();
        assert_eq!(role, CleanerRole::Lead);
    }

    #[test]
    fn test_report_status_transitions() {
        use ReportStatus::{Approved, Paid, Pending, Rejected};

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Paid));
        assert!(Approved.can_transition_to(Rejected));

        assert!(!Pending.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(Paid.is_final());
        assert!(!Approved.is_final());
    }
}
