use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use tokio::sync::RwLock;

use crate::error::PersistenceError;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{LeaveQuery, LeaveRecord, NewLeaveRecord};

use super::{EmployeeDirectory, LeaveRecordStore, LedgerSession, LedgerStore};

#[derive(Default)]
struct MemoryState {
    employees: BTreeMap<u64, Employee>,
    leaves: BTreeMap<u64, LeaveRecord>,
}

#[derive(Default)]
struct Inner {
    state: RwLock<MemoryState>,
    employee_seq: AtomicU64,
    leave_seq: AtomicU64,
    fail_employee_writes: AtomicBool,
}

impl Inner {
    fn next_leave_id(&self) -> u64 {
        self.leave_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn check_employee_writes(&self) -> Result<(), PersistenceError> {
        if self.fail_employee_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::new("employee write rejected by store"));
        }
        Ok(())
    }
}

/// Process-local store implementing every collaborator trait.
///
/// Clones share the same maps.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent employee write fail until switched off again.
    pub fn fail_employee_writes(&self, fail: bool) {
        self.inner.fail_employee_writes.store(fail, Ordering::SeqCst);
    }

    /// Inserts a leave directly, bypassing admission. Used to load fixtures.
    pub async fn seed_leave(&self, record: NewLeaveRecord) -> LeaveRecord {
        let stored = stored_leave(self.inner.next_leave_id(), &record);
        let mut state = self.inner.state.write().await;
        state.leaves.insert(stored.id, stored.clone());
        stored
    }

    /// Every leave ever written, soft-deleted ones included.
    pub async fn all_leaves(&self) -> Vec<LeaveRecord> {
        let state = self.inner.state.read().await;
        state.leaves.values().cloned().collect()
    }
}

fn stored_leave(id: u64, record: &NewLeaveRecord) -> LeaveRecord {
    let now = Utc::now();
    LeaveRecord {
        id,
        employee_id: record.employee_id,
        reason: record.reason.clone(),
        start_date: record.start_date,
        end_date: record.end_date,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

// mirrors the unique key on employees.employee_code
fn ensure_code_free(
    state: &MemoryState,
    employee_code: &str,
    owner: Option<u64>,
) -> Result<(), PersistenceError> {
    let taken = state
        .employees
        .values()
        .any(|other| other.employee_code == employee_code && Some(other.id) != owner);
    if taken {
        return Err(PersistenceError::duplicate_key(format!(
            "employee code {} already exists",
            employee_code
        )));
    }
    Ok(())
}

fn live_leaves_of(state: &MemoryState, employee_id: u64) -> impl Iterator<Item = &LeaveRecord> {
    state
        .leaves
        .values()
        .filter(move |leave| leave.employee_id == employee_id && !leave.is_deleted())
}

fn sorted(mut leaves: Vec<LeaveRecord>) -> Vec<LeaveRecord> {
    leaves.sort_by_key(|leave| (leave.start_date, leave.id));
    leaves
}

#[async_trait]
impl EmployeeDirectory for InMemoryStore {
    async fn find_by_id(&self, employee_id: u64) -> Result<Option<Employee>, PersistenceError> {
        let state = self.inner.state.read().await;
        Ok(state.employees.get(&employee_id).cloned())
    }

    async fn save(&self, employee: &Employee) -> Result<Employee, PersistenceError> {
        self.inner.check_employee_writes()?;

        let mut state = self.inner.state.write().await;
        ensure_code_free(&state, &employee.employee_code, Some(employee.id))?;
        let slot = state.employees.get_mut(&employee.id).ok_or_else(|| {
            PersistenceError::new(format!("employee {} does not exist", employee.id))
        })?;

        slot.employee_code = employee.employee_code.clone();
        slot.first_name = employee.first_name.clone();
        slot.last_name = employee.last_name.clone();
        slot.email = employee.email.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn create(
        &self,
        employee: &NewEmployee,
        entitlement_days: u32,
    ) -> Result<Employee, PersistenceError> {
        self.inner.check_employee_writes()?;

        let mut state = self.inner.state.write().await;
        ensure_code_free(&state, &employee.employee_code, None)?;

        let now = Utc::now();
        let created = Employee {
            id: self.inner.employee_seq.fetch_add(1, Ordering::Relaxed) + 1,
            employee_code: employee.employee_code.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            email: employee.email.clone(),
            remaining_entitlement_days: entitlement_days,
            created_at: now,
            updated_at: now,
        };
        state.employees.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Employee>, PersistenceError> {
        let state = self.inner.state.read().await;
        Ok(state.employees.values().cloned().collect())
    }
}

#[async_trait]
impl LeaveRecordStore for InMemoryStore {
    async fn find_by_id(&self, leave_id: u64) -> Result<Option<LeaveRecord>, PersistenceError> {
        let state = self.inner.state.read().await;
        Ok(state
            .leaves
            .get(&leave_id)
            .filter(|leave| !leave.is_deleted())
            .cloned())
    }

    async fn find_by_employee_and_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRecord>, PersistenceError> {
        let state = self.inner.state.read().await;
        Ok(sorted(
            live_leaves_of(&state, employee_id)
                .filter(|leave| leave.start_date.year() == year)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_employee_starting_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRecord>, PersistenceError> {
        let state = self.inner.state.read().await;
        Ok(sorted(
            live_leaves_of(&state, employee_id)
                .filter(|leave| leave.start_date >= from && leave.start_date <= to)
                .cloned()
                .collect(),
        ))
    }

    async fn search(&self, query: &LeaveQuery) -> Result<Vec<LeaveRecord>, PersistenceError> {
        let state = self.inner.state.read().await;
        Ok(sorted(
            state
                .leaves
                .values()
                .filter(|leave| !leave.is_deleted())
                .filter(|leave| query.employee_id.is_none_or(|id| leave.employee_id == id))
                .filter(|leave| query.year.is_none_or(|y| leave.start_date.year() == y))
                .filter(|leave| query.month.is_none_or(|m| leave.start_date.month() == m))
                .cloned()
                .collect(),
        ))
    }

    async fn remove(&self, record: &LeaveRecord) -> Result<bool, PersistenceError> {
        let mut state = self.inner.state.write().await;
        match state.leaves.get_mut(&record.id) {
            Some(leave) if !leave.is_deleted() => {
                let now = Utc::now();
                leave.deleted_at = Some(now);
                leave.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerSession>, PersistenceError> {
        Ok(Box::new(MemorySession {
            store: Arc::clone(&self.inner),
            leaves: Vec::new(),
            employees: Vec::new(),
            finished: false,
        }))
    }
}

/// Buffers writes and applies them under one write lock on commit.
struct MemorySession {
    store: Arc<Inner>,
    leaves: Vec<LeaveRecord>,
    employees: Vec<Employee>,
    finished: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<(), PersistenceError> {
        if self.finished {
            return Err(PersistenceError::new("ledger session already finished"));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerSession for MemorySession {
    async fn create_leave(
        &mut self,
        record: &NewLeaveRecord,
    ) -> Result<LeaveRecord, PersistenceError> {
        self.ensure_open()?;
        let stored = stored_leave(self.store.next_leave_id(), record);
        self.leaves.push(stored.clone());
        Ok(stored)
    }

    async fn save_employee(&mut self, employee: &Employee) -> Result<Employee, PersistenceError> {
        self.ensure_open()?;
        self.store.check_employee_writes()?;

        let mut updated = employee.clone();
        updated.updated_at = Utc::now();
        self.employees.push(updated.clone());
        Ok(updated)
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        self.ensure_open()?;
        self.finished = true;

        let mut state = self.store.state.write().await;
        if let Some(missing) = self
            .employees
            .iter()
            .find(|employee| !state.employees.contains_key(&employee.id))
        {
            return Err(PersistenceError::new(format!(
                "employee {} does not exist",
                missing.id
            )));
        }

        for leave in self.leaves.drain(..) {
            state.leaves.insert(leave.id, leave);
        }
        for employee in self.employees.drain(..) {
            state.employees.insert(employee.id, employee);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), PersistenceError> {
        self.finished = true;
        self.leaves.clear();
        self.employees.clear();
        Ok(())
    }
}
