use crate::model::employee::{Employee, NewEmployee, UpdateEmployee};
use crate::model::leave_request::{LeaveQuery, LeaveRecord, LeaveRequest};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave admission and entitlement ledger

Employees request leave against a yearly entitlement balance. A request is
admitted only when all of these hold:

- **Balance**: the remaining entitlement covers every requested day
- **Annual cap**: leave starting in the same year stays within the yearly cap (12 days by default)
- **Monthly exclusivity**: no other leave of the employee starts on any requested day

An admitted request stores the leave record and debits the balance together.
Removing a leave marks it deleted and does **not** restore the balance.

### 📦 Response Format
- JSON-based RESTful responses
- Rejections carry an `error` tag, a `message` and rule-specific `details`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::delete_leave,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
    ),
    components(
        schemas(
            LeaveQuery,
            LeaveRecord,
            LeaveRequest,
            Employee,
            NewEmployee,
            UpdateEmployee,
        )
    ),
    tags(
        (name = "Leave", description = "Leave admission APIs"),
        (name = "Employee", description = "Employee directory APIs"),
    )
)]
pub struct ApiDoc;
