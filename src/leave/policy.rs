/// Maximum days of leave an employee may start within one calendar year.
pub const DEFAULT_ANNUAL_CAP_DAYS: u32 = 12;

/// Balance given to new employees when none is supplied.
pub const DEFAULT_ENTITLEMENT_DAYS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeavePolicy {
    pub annual_cap_days: u32,
    pub default_entitlement_days: u32,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            annual_cap_days: DEFAULT_ANNUAL_CAP_DAYS,
            default_entitlement_days: DEFAULT_ENTITLEMENT_DAYS,
        }
    }
}
