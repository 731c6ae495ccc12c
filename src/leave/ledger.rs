use crate::error::{LeaveError, PersistenceError};
use crate::model::employee::Employee;
use crate::model::leave_request::{LeaveRecord, NewLeaveRecord};
use crate::store::{LedgerSession, LedgerStore};

/// Stores the leave and the debited balance as one unit of work.
///
/// Must only run after every admission check passed. On any failure the
/// session is rolled back, so either both writes are visible or neither is.
pub async fn apply_admission(
    ledger: &dyn LedgerStore,
    employee: &Employee,
    record: NewLeaveRecord,
    duration_days: u32,
) -> Result<LeaveRecord, LeaveError> {
    let remaining = employee
        .remaining_entitlement_days
        .checked_sub(duration_days)
        .ok_or(LeaveError::InsufficientBalance {
            remaining: employee.remaining_entitlement_days,
            requested: duration_days,
        })?;

    let mut session = ledger.begin().await?;

    match write(session.as_mut(), employee, &record, remaining).await {
        Ok(created) => {
            session.commit().await.map_err(|e| {
                tracing::error!(
                    error = %e,
                    employee_id = employee.id,
                    "Ledger commit failed"
                );
                e
            })?;
            Ok(created)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                employee_id = employee.id,
                "Ledger write failed, rolling back"
            );
            if let Err(rollback) = session.rollback().await {
                tracing::error!(error = %rollback, employee_id = employee.id, "Rollback failed");
            }
            Err(e.into())
        }
    }
}

async fn write(
    session: &mut dyn LedgerSession,
    employee: &Employee,
    record: &NewLeaveRecord,
    remaining: u32,
) -> Result<LeaveRecord, PersistenceError> {
    let created = session.create_leave(record).await?;

    let mut debited = employee.clone();
    debited.remaining_entitlement_days = remaining;
    session.save_employee(&debited).await?;

    Ok(created)
}
