use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, info, instrument, warn};

use crate::error::{LeaveError, PersistenceError};
use crate::model::employee::{Employee, NewEmployee, UpdateEmployee};
use crate::model::leave_request::{LeaveQuery, LeaveRecord, LeaveRequest, NewLeaveRecord};
use crate::store::{EmployeeDirectory, LeaveRecordStore, LedgerStore};

use super::annual_cap::check_annual_cap;
use super::entitlement::check_entitlement;
use super::interval::DateRange;
use super::ledger::apply_admission;
use super::locks::EmployeeLocks;
use super::monthly::check_monthly_exclusivity;
use super::policy::LeavePolicy;

// lock entries are pruned once the registry grows past this
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Decides leave requests and keeps the entitlement ledger consistent.
///
/// All decisions touching one employee run under that employee's lock, from
/// the balance read to the ledger commit.
pub struct LeaveEngine {
    employees: Arc<dyn EmployeeDirectory>,
    leaves: Arc<dyn LeaveRecordStore>,
    ledger: Arc<dyn LedgerStore>,
    policy: LeavePolicy,
    locks: EmployeeLocks,
}

impl LeaveEngine {
    pub fn new(
        employees: Arc<dyn EmployeeDirectory>,
        leaves: Arc<dyn LeaveRecordStore>,
        ledger: Arc<dyn LedgerStore>,
        policy: LeavePolicy,
    ) -> Self {
        Self {
            employees,
            leaves,
            ledger,
            policy,
            locks: EmployeeLocks::new(),
        }
    }

    /// Builds an engine whose three collaborators are the same store.
    pub fn with_store<S>(store: Arc<S>, policy: LeavePolicy) -> Self
    where
        S: EmployeeDirectory + LeaveRecordStore + LedgerStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store, policy)
    }

    pub fn policy(&self) -> LeavePolicy {
        self.policy
    }

    #[instrument(
        name = "admit_leave",
        skip(self, request),
        fields(
            employee_id = request.employee_id,
            start_date = %request.start_date,
            end_date = %request.end_date
        )
    )]
    pub async fn admit(&self, request: LeaveRequest) -> Result<LeaveRecord, LeaveError> {
        let range = DateRange::new(request.start_date, request.end_date)?;
        let duration = range.duration_days();

        let guard = self.locks.acquire(request.employee_id).await;

        let result = self.decide(&request, range, duration).await;
        match &result {
            Ok(record) => info!(
                leave_id = record.id,
                duration_days = duration,
                "Leave admitted"
            ),
            Err(LeaveError::Persistence(e)) => warn!(error = %e, "Leave admission aborted"),
            Err(e) => debug!(reason = e.code(), "Leave rejected: {}", e),
        }

        drop(guard);
        if self.locks.len() > LOCK_PRUNE_THRESHOLD {
            self.locks.prune();
        }
        result
    }

    async fn decide(
        &self,
        request: &LeaveRequest,
        range: DateRange,
        duration: u32,
    ) -> Result<LeaveRecord, LeaveError> {
        let employee = self
            .employees
            .find_by_id(request.employee_id)
            .await?
            .ok_or(LeaveError::EmployeeNotFound {
                employee_id: request.employee_id,
            })?;

        check_entitlement(employee.remaining_entitlement_days, duration)?;

        let year = range.start().year();
        let (same_year, same_days) = futures::try_join!(
            self.leaves.find_by_employee_and_year(employee.id, year),
            self.leaves
                .find_by_employee_starting_between(employee.id, range.start(), range.end()),
        )?;

        check_annual_cap(&same_year, year, duration, self.policy.annual_cap_days)?;
        check_monthly_exclusivity(&same_days, range)?;

        let record = NewLeaveRecord {
            employee_id: employee.id,
            reason: request.reason.clone(),
            start_date: range.start(),
            end_date: range.end(),
        };
        apply_admission(self.ledger.as_ref(), &employee, record, duration).await
    }

    /// Soft-deletes a leave. The employee's balance is left untouched.
    #[instrument(skip(self))]
    pub async fn remove(&self, leave_id: u64) -> Result<(), LeaveError> {
        let record = self.get(leave_id).await?;
        let _guard = self.locks.acquire(record.employee_id).await;

        if !self.leaves.remove(&record).await? {
            return Err(LeaveError::NotFound { leave_id });
        }

        info!(employee_id = record.employee_id, "Leave removed");
        Ok(())
    }

    pub async fn get(&self, leave_id: u64) -> Result<LeaveRecord, LeaveError> {
        self.leaves
            .find_by_id(leave_id)
            .await?
            .ok_or(LeaveError::NotFound { leave_id })
    }

    pub async fn list(&self, query: &LeaveQuery) -> Result<Vec<LeaveRecord>, LeaveError> {
        if let Some(month) = query.month {
            if query.year.is_none() {
                return Err(LeaveError::InvalidQuery("month requires year".to_string()));
            }
            if !(1..=12).contains(&month) {
                return Err(LeaveError::InvalidQuery(format!(
                    "month must be between 1 and 12, got {}",
                    month
                )));
            }
        }
        if query.year.is_some() && query.start_window().is_none() {
            return Err(LeaveError::InvalidQuery("year out of range".to_string()));
        }

        Ok(self.leaves.search(query).await?)
    }

    pub async fn register_employee(&self, employee: &NewEmployee) -> Result<Employee, LeaveError> {
        let days = employee
            .remaining_entitlement_days
            .unwrap_or(self.policy.default_entitlement_days);
        let created = self
            .employees
            .create(employee, days)
            .await
            .map_err(|e| duplicate_code(e, &employee.employee_code))?;
        info!(
            employee_id = created.id,
            entitlement_days = days,
            "Employee registered"
        );
        Ok(created)
    }

    /// Changes directory fields only. The balance stays with the ledger.
    #[instrument(skip(self, changes))]
    pub async fn update_employee(
        &self,
        employee_id: u64,
        changes: &UpdateEmployee,
    ) -> Result<Employee, LeaveError> {
        let mut employee = self.employee(employee_id).await?;
        changes.apply_to(&mut employee);

        let saved = self
            .employees
            .save(&employee)
            .await
            .map_err(|e| duplicate_code(e, &employee.employee_code))?;
        info!("Employee updated");
        Ok(saved)
    }

    pub async fn employee(&self, employee_id: u64) -> Result<Employee, LeaveError> {
        self.employees
            .find_by_id(employee_id)
            .await?
            .ok_or(LeaveError::EmployeeNotFound { employee_id })
    }

    pub async fn employees(&self) -> Result<Vec<Employee>, LeaveError> {
        Ok(self.employees.list().await?)
    }
}

fn duplicate_code(err: PersistenceError, employee_code: &str) -> LeaveError {
    if err.is_duplicate_key() {
        LeaveError::DuplicateEmployee {
            employee_code: employee_code.to_string(),
        }
    } else {
        err.into()
    }
}
