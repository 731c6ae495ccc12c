//! Persistence collaborators of the leave engine.
//!
//! The engine only talks to these traits. `mysql` backs them with sqlx and real
//! transactions, `memory` with in-process maps for tests and database-less runs.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::PersistenceError;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{LeaveQuery, LeaveRecord, NewLeaveRecord};

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find_by_id(&self, employee_id: u64) -> Result<Option<Employee>, PersistenceError>;

    /// Writes the directory fields (code, names, email) of an existing
    /// employee. The stored balance is kept as is; only a [`LedgerSession`]
    /// changes it. A code already used by another employee is a duplicate key.
    async fn save(&self, employee: &Employee) -> Result<Employee, PersistenceError>;

    /// Inserts a new employee. Fails with a duplicate key when the code is taken.
    async fn create(
        &self,
        employee: &NewEmployee,
        entitlement_days: u32,
    ) -> Result<Employee, PersistenceError>;

    async fn list(&self) -> Result<Vec<Employee>, PersistenceError>;
}

/// Read side of the leave ledger. Soft-deleted records never come back from
/// any of these queries.
#[async_trait]
pub trait LeaveRecordStore: Send + Sync {
    async fn find_by_id(&self, leave_id: u64) -> Result<Option<LeaveRecord>, PersistenceError>;

    /// Leaves of the employee whose start date lies in `year`.
    async fn find_by_employee_and_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRecord>, PersistenceError>;

    /// Leaves of the employee starting anywhere in `from..=to`.
    async fn find_by_employee_starting_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRecord>, PersistenceError>;

    /// Filtered listing ordered by start date, then id.
    async fn search(&self, query: &LeaveQuery) -> Result<Vec<LeaveRecord>, PersistenceError>;

    /// Marks the record deleted. `false` when it was already gone.
    async fn remove(&self, record: &LeaveRecord) -> Result<bool, PersistenceError>;
}

/// Opens units of work spanning a leave insert and a balance update.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn LedgerSession>, PersistenceError>;
}

/// Nothing written through a session is visible to other readers until
/// `commit` succeeds. Dropping a session without committing discards it.
#[async_trait]
pub trait LedgerSession: Send {
    async fn create_leave(
        &mut self,
        record: &NewLeaveRecord,
    ) -> Result<LeaveRecord, PersistenceError>;

    async fn save_employee(&mut self, employee: &Employee) -> Result<Employee, PersistenceError>;

    async fn commit(&mut self) -> Result<(), PersistenceError>;

    async fn rollback(&mut self) -> Result<(), PersistenceError>;
}
