use chrono::Datelike;

use crate::error::LeaveError;
use crate::model::leave_request::LeaveRecord;

use super::interval::DateRange;

/// Rejects the request if any of its days is the start date of another leave.
///
/// Only the *start dates* of existing leaves are compared, so an existing
/// multi-day leave is visible here on its first day alone. `candidates` are the
/// employee's leaves starting within `range`; days are walked in ascending
/// order and the first clash is reported.
pub fn check_monthly_exclusivity(
    candidates: &[LeaveRecord],
    range: DateRange,
) -> Result<(), LeaveError> {
    for day in range.days() {
        let clash = candidates.iter().any(|record| {
            !record.is_deleted()
                && record.start_date.year() == day.year()
                && record.start_date.month() == day.month()
                && record.start_date == day
        });
        if clash {
            return Err(LeaveError::MonthlyExclusivityViolation { date: day });
        }
    }
    Ok(())
}
