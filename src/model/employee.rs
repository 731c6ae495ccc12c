use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "remaining_entitlement_days": 12,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    /// Days of leave still available. Only the leave ledger decrements it.
    #[schema(example = 12)]
    pub remaining_entitlement_days: u32,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    /// Initial balance; the configured default applies when omitted
    #[schema(example = 12, nullable = true)]
    pub remaining_entitlement_days: Option<u32>,
}

/// Directory fields to change. Omitted fields keep their stored value; the
/// entitlement balance cannot be set here.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateEmployee {
    #[schema(example = "EMP-001", nullable = true)]
    pub employee_code: Option<String>,
    #[schema(example = "John", nullable = true)]
    pub first_name: Option<String>,
    #[schema(example = "Doe", nullable = true)]
    pub last_name: Option<String>,
    #[schema(example = "john@email.com", format = "email", nullable = true)]
    pub email: Option<String>,
}

impl UpdateEmployee {
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(code) = &self.employee_code {
            employee.employee_code = code.clone();
        }
        if let Some(first_name) = &self.first_name {
            employee.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            employee.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            employee.email = email.clone();
        }
    }
}
