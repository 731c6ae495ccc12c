use crate::error::LeaveError;

/// Admits the request only when the remaining balance covers every day of it.
pub fn check_entitlement(remaining: u32, requested: u32) -> Result<(), LeaveError> {
    if remaining < requested {
        return Err(LeaveError::InsufficientBalance {
            remaining,
            requested,
        });
    }
    Ok(())
}
