use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// An admitted leave. Immutable once stored apart from the soft-delete marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "reason": "family event",
    "start_date": "2026-01-01",
    "end_date": "2026-01-03",
    "created_at": "2026-01-01T00:00:00Z",
    "updated_at": "2026-01-01T00:00:00Z"
}))]
pub struct LeaveRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "family event")]
    pub reason: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "date-time")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LeaveRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Fields of a leave record before the store assigns identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeaveRecord {
    pub employee_id: u64,
    pub reason: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Admission input, as submitted by the caller.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "family event")]
    pub reason: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveQuery {
    /// Filter by employee ID
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// Year of the leave start date
    #[schema(example = 2026)]
    pub year: Option<i32>,
    /// Month (1-12) of the leave start date, requires `year`
    #[schema(example = 1)]
    pub month: Option<u32>,
}

impl LeaveQuery {
    pub fn for_employee_in_year(employee_id: u64, year: i32) -> Self {
        Self {
            employee_id: Some(employee_id),
            year: Some(year),
            month: None,
        }
    }

    /// Half-open `[from, until)` window on start dates implied by `year` and
    /// `month`. `None` without a year or when the pair is not a real month.
    pub fn start_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let year = self.year?;
        match self.month {
            None => Some((
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?,
            )),
            Some(12) => Some((
                NaiveDate::from_ymd_opt(year, 12, 1)?,
                NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?,
            )),
            Some(month) => Some((
                NaiveDate::from_ymd_opt(year, month, 1)?,
                NaiveDate::from_ymd_opt(year, month + 1, 1)?,
            )),
        }
    }
}
