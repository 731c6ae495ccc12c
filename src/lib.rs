//! Leave admission and entitlement ledger for the HRM back end.
//!
//! [`leave::LeaveEngine`] decides leave requests against an employee's
//! remaining balance, the yearly cap and the one-start-per-day rule, and
//! writes the admitted leave and the debited balance as one unit of work.
//! Stores live behind the traits in [`store`]; [`api`] and [`routes`] expose
//! the engine over actix-web.

pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod leave;
pub mod model;
pub mod routes;
pub mod store;
