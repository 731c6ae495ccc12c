use crate::error::{LeaveError, PersistenceError};
use crate::model::leave_request::LeaveRecord;

use super::interval::DateRange;

/// Sums the inclusive durations of already admitted leaves.
///
/// Durations are recomputed from each record's dates rather than stored. A
/// stored record whose end precedes its start cannot have been admitted, so it
/// is reported as a store fault.
pub fn prior_total(records: &[LeaveRecord]) -> Result<u32, LeaveError> {
    records
        .iter()
        .filter(|record| !record.is_deleted())
        .try_fold(0u32, |total, record| -> Result<u32, LeaveError> {
            let range = DateRange::new(record.start_date, record.end_date).map_err(|_| {
                PersistenceError::new(format!(
                    "leave record {} has end date {} before start date {}",
                    record.id, record.end_date, record.start_date
                ))
            })?;
            Ok(total.saturating_add(range.duration_days()))
        })
}

/// Checks that `requested` more days in `year` keep the employee within `cap`.
///
/// `records` are the employee's leaves starting in `year`; a leave that runs
/// into the next year still counts entirely toward the year it starts in.
/// Returns the new yearly total on success.
pub fn check_annual_cap(
    records: &[LeaveRecord],
    year: i32,
    requested: u32,
    cap: u32,
) -> Result<u32, LeaveError> {
    let prior_total = prior_total(records)?;
    let total = prior_total.saturating_add(requested);

    if total > cap {
        return Err(LeaveError::AnnualCapExceeded {
            year,
            prior_total,
            requested,
            cap,
        });
    }
    Ok(total)
}
