use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::error::PersistenceError;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{LeaveQuery, LeaveRecord, NewLeaveRecord};

use super::{EmployeeDirectory, LeaveRecordStore, LedgerSession, LedgerStore};

const EMPLOYEE_COLUMNS: &str = "id, employee_code, first_name, last_name, email, \
     remaining_entitlement_days, created_at, updated_at";

const LEAVE_COLUMNS: &str =
    "id, employee_id, reason, start_date, end_date, created_at, updated_at, deleted_at";

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_leaves(
        &self,
        where_sql: &str,
        args: Vec<FilterValue>,
    ) -> Result<Vec<LeaveRecord>, PersistenceError> {
        let sql = format!(
            "SELECT {} FROM leave_records WHERE deleted_at IS NULL{} ORDER BY start_date, id",
            LEAVE_COLUMNS, where_sql
        );

        let mut query = sqlx::query_as::<_, LeaveRecord>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Date(d) => query.bind(d),
            };
        }

        let leaves = query.fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave records");
            PersistenceError::from(e)
        })?;
        Ok(leaves)
    }
}

fn window_of(query: &LeaveQuery) -> Result<Option<(NaiveDate, NaiveDate)>, PersistenceError> {
    match (query.year, query.start_window()) {
        (None, _) => Ok(None),
        (Some(_), Some(window)) => Ok(Some(window)),
        (Some(year), None) => Err(PersistenceError::new(format!(
            "no start date window for year {} month {:?}",
            year, query.month
        ))),
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn find_by_id(&self, employee_id: u64) -> Result<Option<Employee>, PersistenceError> {
        let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, employee_id, "Failed to fetch employee");
                PersistenceError::from(e)
            })?;
        Ok(employee)
    }

    async fn save(&self, employee: &Employee) -> Result<Employee, PersistenceError> {
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            UPDATE employees
            SET employee_code = ?,
                first_name = ?,
                last_name = ?,
                email = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.employee_code)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(employee.id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id = employee.id, "Failed to update employee");
            PersistenceError::from(e)
        })?;

        reload_employee(&mut conn, employee.id).await
    }

    async fn create(
        &self,
        employee: &NewEmployee,
        entitlement_days: u32,
    ) -> Result<Employee, PersistenceError> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (employee_code, first_name, last_name, email, remaining_entitlement_days)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.employee_code)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(entitlement_days)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create employee");
            PersistenceError::from(e)
        })?;

        reload_employee(&mut conn, result.last_insert_id()).await
    }

    async fn list(&self) -> Result<Vec<Employee>, PersistenceError> {
        let sql = format!("SELECT {} FROM employees ORDER BY id", EMPLOYEE_COLUMNS);
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }
}

#[async_trait]
impl LeaveRecordStore for MySqlStore {
    async fn find_by_id(&self, leave_id: u64) -> Result<Option<LeaveRecord>, PersistenceError> {
        let sql = format!(
            "SELECT {} FROM leave_records WHERE id = ? AND deleted_at IS NULL",
            LEAVE_COLUMNS
        );
        let leave = sqlx::query_as::<_, LeaveRecord>(&sql)
            .bind(leave_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, leave_id, "Failed to fetch leave record");
                PersistenceError::from(e)
            })?;
        Ok(leave)
    }

    async fn find_by_employee_and_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> Result<Vec<LeaveRecord>, PersistenceError> {
        let query = LeaveQuery::for_employee_in_year(employee_id, year);
        self.search(&query).await
    }

    async fn find_by_employee_starting_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRecord>, PersistenceError> {
        self.fetch_leaves(
            " AND employee_id = ? AND start_date BETWEEN ? AND ?",
            vec![
                FilterValue::U64(employee_id),
                FilterValue::Date(from),
                FilterValue::Date(to),
            ],
        )
        .await
    }

    async fn search(&self, query: &LeaveQuery) -> Result<Vec<LeaveRecord>, PersistenceError> {
        let mut where_sql = String::new();
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        // ranges instead of YEAR()/MONTH() keep the (employee_id, start_date) index usable
        if let Some((from, until)) = window_of(query)? {
            where_sql.push_str(" AND start_date >= ? AND start_date < ?");
            args.push(FilterValue::Date(from));
            args.push(FilterValue::Date(until));
        }

        self.fetch_leaves(&where_sql, args).await
    }

    async fn remove(&self, record: &LeaveRecord) -> Result<bool, PersistenceError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_records
            SET deleted_at = CURRENT_TIMESTAMP
            WHERE id = ?
            AND deleted_at IS NULL
            "#,
        )
        .bind(record.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id = record.id, "Soft delete failed");
            PersistenceError::from(e)
        })?;

        Ok(result.rows_affected() > 0)
    }
}

async fn write_balance(
    conn: &mut sqlx::MySqlConnection,
    employee: &Employee,
) -> Result<Employee, PersistenceError> {
    sqlx::query(
        r#"
        UPDATE employees
        SET remaining_entitlement_days = ?
        WHERE id = ?
        "#,
    )
    .bind(employee.remaining_entitlement_days)
    .bind(employee.id)
    .execute(&mut *conn)
    .await?;

    reload_employee(conn, employee.id).await
}

// MySQL reports zero affected rows for a no-op update, so existence is
// checked by reading the row back
async fn reload_employee(
    conn: &mut sqlx::MySqlConnection,
    employee_id: u64,
) -> Result<Employee, PersistenceError> {
    let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| PersistenceError::new(format!("employee {} does not exist", employee_id)))
}

#[async_trait]
impl LedgerStore for MySqlStore {
    async fn begin(&self) -> Result<Box<dyn LedgerSession>, PersistenceError> {
        let tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to open ledger transaction");
            PersistenceError::from(e)
        })?;
        Ok(Box::new(MySqlSession { tx: Some(tx) }))
    }
}

/// One MySQL transaction. Dropping it unfinished rolls back server side.
struct MySqlSession {
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlSession {
    fn tx(&mut self) -> Result<&mut Transaction<'static, MySql>, PersistenceError> {
        self.tx
            .as_mut()
            .ok_or_else(|| PersistenceError::new("ledger transaction already finished"))
    }
}

#[async_trait]
impl LedgerSession for MySqlSession {
    async fn create_leave(
        &mut self,
        record: &NewLeaveRecord,
    ) -> Result<LeaveRecord, PersistenceError> {
        let tx = self.tx()?;

        let result = sqlx::query(
            r#"
            INSERT INTO leave_records
                (employee_id, reason, start_date, end_date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(&record.reason)
        .bind(record.start_date)
        .bind(record.end_date)
        .execute(&mut **tx)
        .await?;

        let sql = format!("SELECT {} FROM leave_records WHERE id = ?", LEAVE_COLUMNS);
        let created = sqlx::query_as::<_, LeaveRecord>(&sql)
            .bind(result.last_insert_id())
            .fetch_one(&mut **tx)
            .await?;
        Ok(created)
    }

    async fn save_employee(&mut self, employee: &Employee) -> Result<Employee, PersistenceError> {
        let tx = self.tx()?;
        write_balance(&mut **tx, employee).await
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| PersistenceError::new("ledger transaction already finished"))?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), PersistenceError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
