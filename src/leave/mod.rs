//! Leave admission: the date arithmetic, the three admission rules, the
//! ledger write and the engine running them under a per-employee lock.

pub mod annual_cap;
pub mod engine;
pub mod entitlement;
pub mod interval;
pub mod ledger;
pub mod locks;
pub mod monthly;
pub mod policy;

pub use engine::LeaveEngine;
pub use interval::DateRange;
pub use policy::{DEFAULT_ANNUAL_CAP_DAYS, DEFAULT_ENTITLEMENT_DAYS, LeavePolicy};
