use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde_json::{Value, json};
use strum::IntoStaticStr;

/// Failure raised by a store collaborator. Never attributable to the caller.
#[derive(Debug, Display)]
#[display(fmt = "{}", message)]
pub struct PersistenceError {
    pub message: String,
    duplicate_key: bool,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duplicate_key: false,
        }
    }

    /// A uniqueness constraint rejected the write.
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            duplicate_key: true,
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        self.duplicate_key
    }
}

impl std::error::Error for PersistenceError {}

impl From<sqlx::Error> for PersistenceError {
    fn from(value: sqlx::Error) -> Self {
        match &value {
            // MySQL ER_DUP_ENTRY (1062)
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::duplicate_key(value.to_string())
            }
            _ => Self::new(value.to_string()),
        }
    }
}

/// Every way an admission, removal or lookup can fail.
///
/// The snake_case tag (`insufficient_balance`, `annual_cap_exceeded`, ...) is
/// what the HTTP layer reports in the `error` field.
#[derive(Debug, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum LeaveError {
    #[display(fmt = "employee {} not found", employee_id)]
    EmployeeNotFound { employee_id: u64 },

    #[display(fmt = "end date {} precedes start date {}", end, start)]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[display(
        fmt = "insufficient leave balance: remaining {}, requested {}",
        remaining,
        requested
    )]
    InsufficientBalance { remaining: u32, requested: u32 },

    #[display(
        fmt = "annual leave cap of {} days exceeded for {}: already taken {}, requested {}",
        cap,
        year,
        prior_total,
        requested
    )]
    AnnualCapExceeded {
        year: i32,
        prior_total: u32,
        requested: u32,
        cap: u32,
    },

    #[display(fmt = "a leave already starts on {}", date)]
    MonthlyExclusivityViolation { date: NaiveDate },

    #[display(fmt = "leave record {} not found", leave_id)]
    NotFound { leave_id: u64 },

    #[display(fmt = "employee code {} is already registered", employee_code)]
    DuplicateEmployee { employee_code: String },

    #[display(fmt = "invalid query: {}", _0)]
    InvalidQuery(String),

    #[display(fmt = "persistence failure: {}", _0)]
    Persistence(PersistenceError),
}

impl std::error::Error for LeaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LeaveError::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersistenceError> for LeaveError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl LeaveError {
    /// Machine readable tag of the failure kind.
    pub fn code(&self) -> &'static str {
        self.into()
    }

    /// Diagnostic values of a business-rule rejection.
    pub fn details(&self) -> Option<Value> {
        match self {
            LeaveError::InvalidRange { start, end } => Some(json!({
                "start_date": start,
                "end_date": end,
            })),
            LeaveError::InsufficientBalance {
                remaining,
                requested,
            } => Some(json!({
                "remaining": remaining,
                "requested": requested,
            })),
            LeaveError::AnnualCapExceeded {
                year,
                prior_total,
                requested,
                cap,
            } => Some(json!({
                "year": year,
                "prior_total": prior_total,
                "requested": requested,
                "cap": cap,
            })),
            LeaveError::MonthlyExclusivityViolation { date } => Some(json!({ "date": date })),
            LeaveError::DuplicateEmployee { employee_code } => {
                Some(json!({ "employee_code": employee_code }))
            }
            _ => None,
        }
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::NotFound { .. } => StatusCode::NOT_FOUND,
            LeaveError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LeaveError::EmployeeNotFound { .. }
            | LeaveError::InvalidRange { .. }
            | LeaveError::InsufficientBalance { .. }
            | LeaveError::AnnualCapExceeded { .. }
            | LeaveError::MonthlyExclusivityViolation { .. }
            | LeaveError::DuplicateEmployee { .. }
            | LeaveError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.response_with(self.status_code())
    }
}

impl LeaveError {
    /// The JSON error body under an explicit status.
    pub fn response_with(&self, status: StatusCode) -> HttpResponse {
        // store details stay in the log
        let message = match self {
            LeaveError::Persistence(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        let mut body = json!({
            "error": self.code(),
            "message": message,
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tags_are_snake_case() {
        let err = LeaveError::AnnualCapExceeded {
            year: 2024,
            prior_total: 10,
            requested: 3,
            cap: 12,
        };
        assert_eq!(err.code(), "annual_cap_exceeded");
        assert_eq!(
            LeaveError::MonthlyExclusivityViolation {
                date: date(2024, 5, 10)
            }
            .code(),
            "monthly_exclusivity_violation"
        );
    }

    #[test]
    fn insufficient_balance_displays_both_values() {
        let err = LeaveError::InsufficientBalance {
            remaining: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient leave balance: remaining 2, requested 3"
        );
    }

    #[test]
    fn invalid_range_displays_dates() {
        let err = LeaveError::InvalidRange {
            start: date(2024, 6, 10),
            end: date(2024, 6, 5),
        };
        assert_eq!(
            err.to_string(),
            "end date 2024-06-05 precedes start date 2024-06-10"
        );
    }

    #[test]
    fn business_rejections_are_client_errors() {
        let rejections = [
            LeaveError::EmployeeNotFound { employee_id: 7 },
            LeaveError::InsufficientBalance {
                remaining: 1,
                requested: 2,
            },
            LeaveError::MonthlyExclusivityViolation {
                date: date(2024, 1, 1),
            },
            LeaveError::InvalidQuery("month requires year".into()),
        ];
        for err in rejections {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{err}");
        }
        assert_eq!(
            LeaveError::NotFound { leave_id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn persistence_errors_are_server_errors() {
        let err = LeaveError::from(PersistenceError::new("connection reset"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details().is_none());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn duplicate_employee_is_a_client_error() {
        let err = LeaveError::DuplicateEmployee {
            employee_code: "EMP-1".to_string(),
        };
        assert_eq!(err.code(), "duplicate_employee");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.details().unwrap()["employee_code"], "EMP-1");
    }

    #[test]
    fn plain_store_errors_are_not_duplicates() {
        assert!(!PersistenceError::new("connection reset").is_duplicate_key());
        assert!(PersistenceError::duplicate_key("Duplicate entry").is_duplicate_key());
        assert!(!PersistenceError::from(sqlx::Error::RowNotFound).is_duplicate_key());
    }

    #[test]
    fn response_with_overrides_status_only() {
        let err = LeaveError::EmployeeNotFound { employee_id: 9 };
        let response = err.response_with(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn cap_details_carry_all_values() {
        let err = LeaveError::AnnualCapExceeded {
            year: 2024,
            prior_total: 10,
            requested: 3,
            cap: 12,
        };
        let details = err.details().unwrap();
        assert_eq!(details["prior_total"], 10);
        assert_eq!(details["requested"], 3);
        assert_eq!(details["cap"], 12);
    }
}
