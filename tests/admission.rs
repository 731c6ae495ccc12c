//! End-to-end admission behaviour against the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use hrm_leave::error::LeaveError;
use hrm_leave::leave::{LeaveEngine, LeavePolicy};
use hrm_leave::model::employee::{Employee, NewEmployee};
use hrm_leave::model::leave_request::{LeaveQuery, LeaveRequest, NewLeaveRecord};
use hrm_leave::store::{EmployeeDirectory, InMemoryStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request(employee_id: u64, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
    LeaveRequest {
        employee_id,
        reason: "family event".to_string(),
        start_date: start,
        end_date: end,
    }
}

struct Fixture {
    store: Arc<InMemoryStore>,
    engine: Arc<LeaveEngine>,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let engine = Arc::new(LeaveEngine::with_store(
            Arc::clone(&store),
            LeavePolicy::default(),
        ));
        Self { store, engine }
    }

    async fn employee_with_balance(&self, days: u32) -> Employee {
        let registered = self.store.list().await.unwrap().len();
        self.engine
            .register_employee(&NewEmployee {
                employee_code: format!("EMP-{:03}", registered + 1),
                first_name: "Sari".to_string(),
                last_name: "Dewi".to_string(),
                email: "sari@company.com".to_string(),
                remaining_entitlement_days: Some(days),
            })
            .await
            .unwrap()
    }

    async fn seed(&self, employee_id: u64, start: NaiveDate, end: NaiveDate) {
        self.store
            .seed_leave(NewLeaveRecord {
                employee_id,
                reason: "earlier leave".to_string(),
                start_date: start,
                end_date: end,
            })
            .await;
    }

    async fn balance(&self, employee_id: u64) -> u32 {
        self.store
            .find_by_id(employee_id)
            .await
            .unwrap()
            .unwrap()
            .remaining_entitlement_days
    }
}

#[tokio::test]
async fn test_admission_debits_balance_and_stores_record() {
    let fx = Fixture::new();
    let employee = fx.employee_with_balance(12).await;

    let record = fx
        .engine
        .admit(request(employee.id, date(2024, 3, 1), date(2024, 3, 3)))
        .await
        .unwrap();

    assert_eq!(record.employee_id, employee.id);
    assert_eq!(record.reason, "family event");
    assert_eq!(record.start_date, date(2024, 3, 1));
    assert_eq!(record.end_date, date(2024, 3, 3));
    assert!(record.deleted_at.is_none());

    assert_eq!(fx.balance(employee.id).await, 9);
    assert_eq!(fx.engine.get(record.id).await.unwrap(), record);
}

#[tokio::test]
async fn test_insufficient_balance_leaves_ledger_untouched() {
    let fx = Fixture::new();
    let employee = fx.employee_with_balance(2).await;

    let result = fx
        .engine
        .admit(request(employee.id, date(2024, 3, 1), date(2024, 3, 3)))
        .await;

    match result {
        Err(LeaveError::InsufficientBalance {
            remaining,
            requested,
        }) => {
            assert_eq!(remaining, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("Expected InsufficientBalance, got {:?}", other),
    }
    assert_eq!(fx.balance(employee.id).await, 2);
    assert!(fx.store.all_leaves().await.is_empty());
}

#[tokio::test]
async fn test_annual_cap_rejects_ten_plus_three() {
    let fx = Fixture::new();
    let id = fx.employee_with_balance(20).await.id;
    fx.seed(id, date(2024, 1, 8), date(2024, 1, 12)).await;
    fx.seed(id, date(2024, 2, 5), date(2024, 2, 9)).await;

    let result = fx
        .engine
        .admit(request(id, date(2024, 4, 1), date(2024, 4, 3)))
        .await;

    match result {
        Err(LeaveError::AnnualCapExceeded {
            year,
            prior_total,
            requested,
            cap,
        }) => {
            assert_eq!((year, prior_total, requested, cap), (2024, 10, 3, 12));
        }
        other => panic!("Expected AnnualCapExceeded, got {:?}", other),
    }
    assert_eq!(fx.balance(id).await, 20);
}

#[tokio::test]
async fn test_annual_cap_admits_nine_plus_three() {
    let fx = Fixture::new();
    let id = fx.employee_with_balance(20).await.id;
    fx.seed(id, date(2024, 1, 8), date(2024, 1, 12)).await;
    fx.seed(id, date(2024, 2, 5), date(2024, 2, 8)).await;

    fx.engine
        .admit(request(id, date(2024, 4, 1), date(2024, 4, 3)))
        .await
        .unwrap();

    let this_year = fx
        .engine
        .list(&LeaveQuery::for_employee_in_year(id, 2024))
        .await
        .unwrap();
    let total: i64 = this_year
        .iter()
        .map(|l| (l.end_date - l.start_date).num_days() + 1)
        .sum();
    assert_eq!(total, 12);
    assert_eq!(fx.balance(id).await, 17);
}

#[tokio::test]
async fn test_leave_from_previous_year_does_not_count() {
    let fx = Fixture::new();
    let id = fx.employee_with_balance(30).await.id;
    // starts in 2023, so it belongs to 2023 even though it ends in 2024
    fx.seed(id, date(2023, 12, 20), date(2024, 1, 5)).await;

    fx.engine
        .admit(request(id, date(2024, 2, 1), date(2024, 2, 12)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_same_start_day_is_rejected() {
    let fx = Fixture::new();
    let id = fx.employee_with_balance(12).await.id;
    fx.seed(id, date(2024, 5, 10), date(2024, 5, 10)).await;

    let result = fx
        .engine
        .admit(request(id, date(2024, 5, 10), date(2024, 5, 10)))
        .await;
    assert!(matches!(
        result,
        Err(LeaveError::MonthlyExclusivityViolation { date: d }) if d == date(2024, 5, 10)
    ));
    assert_eq!(fx.balance(id).await, 12);
}

#[tokio::test]
async fn test_next_day_in_same_month_is_admitted() {
    let fx = Fixture::new();
    let id = fx.employee_with_balance(12).await.id;
    fx.seed(id, date(2024, 5, 10), date(2024, 5, 10)).await;

    fx.engine
        .admit(request(id, date(2024, 5, 11), date(2024, 5, 11)))
        .await
        .unwrap();
    assert_eq!(fx.balance(id).await, 11);
}

#[tokio::test]
async fn test_other_employees_leave_does_not_clash() {
    let fx = Fixture::new();
    let first = fx.employee_with_balance(12).await.id;
    let second = fx.employee_with_balance(11).await;
    fx.seed(first, date(2024, 5, 10), date(2024, 5, 10)).await;

    fx.engine
        .admit(request(second.id, date(2024, 5, 10), date(2024, 5, 10)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_balance_is_checked_before_annual_cap() {
    let fx = Fixture::new();
    let id = fx.employee_with_balance(2).await.id;
    fx.seed(id, date(2024, 1, 8), date(2024, 1, 17)).await;

    // three days break both the balance and the cap
    let result = fx
        .engine
        .admit(request(id, date(2024, 4, 1), date(2024, 4, 3)))
        .await;
    assert!(matches!(
        result,
        Err(LeaveError::InsufficientBalance {
            remaining: 2,
            requested: 3
        })
    ));
}

#[tokio::test]
async fn test_annual_cap_is_checked_before_start_day_clash() {
    let fx = Fixture::new();
    let id = fx.employee_with_balance(20).await.id;
    fx.seed(id, date(2024, 1, 8), date(2024, 1, 17)).await;
    fx.seed(id, date(2024, 5, 10), date(2024, 5, 10)).await;

    // 11 + 2 days exceeds the cap and 2024-05-10 is already a start day
    let result = fx
        .engine
        .admit(request(id, date(2024, 5, 10), date(2024, 5, 11)))
        .await;
    match result {
        Err(LeaveError::AnnualCapExceeded {
            prior_total,
            requested,
            ..
        }) => {
            assert_eq!(prior_total, 11);
            assert_eq!(requested, 2);
        }
        other => panic!("Expected AnnualCapExceeded, got {:?}", other),
    }
    assert_eq!(fx.balance(id).await, 20);
}

#[tokio::test]
async fn test_invalid_range() {
    let fx = Fixture::new();
    let employee = fx.employee_with_balance(12).await;

    let result = fx
        .engine
        .admit(request(employee.id, date(2024, 6, 10), date(2024, 6, 5)))
        .await;
    assert!(matches!(result, Err(LeaveError::InvalidRange { .. })));
}

#[tokio::test]
async fn test_unknown_employee() {
    let fx = Fixture::new();
    let result = fx
        .engine
        .admit(request(404, date(2024, 6, 5), date(2024, 6, 5)))
        .await;
    assert!(matches!(
        result,
        Err(LeaveError::EmployeeNotFound { employee_id: 404 })
    ));
}

#[tokio::test]
async fn test_failed_balance_write_rolls_back_record() {
    let fx = Fixture::new();
    let employee = fx.employee_with_balance(12).await;
    fx.store.fail_employee_writes(true);

    let result = fx
        .engine
        .admit(request(employee.id, date(2024, 3, 1), date(2024, 3, 3)))
        .await;
    assert!(matches!(result, Err(LeaveError::Persistence(_))));

    fx.store.fail_employee_writes(false);
    assert_eq!(fx.balance(employee.id).await, 12);
    assert!(fx.store.all_leaves().await.is_empty());

    // the same request goes through once the store recovers
    fx.engine
        .admit(request(employee.id, date(2024, 3, 1), date(2024, 3, 3)))
        .await
        .unwrap();
    assert_eq!(fx.balance(employee.id).await, 9);
}

#[tokio::test]
async fn test_remove_twice_reports_not_found() {
    let fx = Fixture::new();
    let employee = fx.employee_with_balance(12).await;
    let record = fx
        .engine
        .admit(request(employee.id, date(2024, 3, 1), date(2024, 3, 2)))
        .await
        .unwrap();

    fx.engine.remove(record.id).await.unwrap();
    assert!(matches!(
        fx.engine.remove(record.id).await,
        Err(LeaveError::NotFound { leave_id }) if leave_id == record.id
    ));
}

#[tokio::test]
async fn test_remove_keeps_balance_and_audit_row() {
    let fx = Fixture::new();
    let employee = fx.employee_with_balance(12).await;
    let record = fx
        .engine
        .admit(request(employee.id, date(2024, 3, 1), date(2024, 3, 2)))
        .await
        .unwrap();

    fx.engine.remove(record.id).await.unwrap();

    assert_eq!(fx.balance(employee.id).await, 10);
    assert!(matches!(
        fx.engine.get(record.id).await,
        Err(LeaveError::NotFound { .. })
    ));
    let stored = fx.store.all_leaves().await;
    assert_eq!(stored.len(), 1);
    assert!(stored[0].deleted_at.is_some());

    // the removed start day is free again
    fx.engine
        .admit(request(employee.id, date(2024, 3, 1), date(2024, 3, 1)))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_cannot_jointly_exceed_cap() {
    let fx = Fixture::new();
    let employee = fx.employee_with_balance(30).await;

    let first = {
        let engine = Arc::clone(&fx.engine);
        tokio::spawn(async move {
            engine
                .admit(request(employee.id, date(2024, 1, 8), date(2024, 1, 14)))
                .await
        })
    };
    let second = {
        let engine = Arc::clone(&fx.engine);
        tokio::spawn(async move {
            engine
                .admit(request(employee.id, date(2024, 2, 5), date(2024, 2, 11)))
                .await
        })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let admitted = outcomes.iter().filter(|o| o.is_ok()).count();
    let capped = outcomes
        .iter()
        .filter(|o| matches!(o, Err(LeaveError::AnnualCapExceeded { .. })))
        .count();

    assert_eq!(admitted, 1);
    assert_eq!(capped, 1);
    assert_eq!(fx.balance(employee.id).await, 23);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_cannot_overdraw_balance() {
    let fx = Fixture::new();
    let employee = fx.employee_with_balance(5).await;

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&fx.engine);
            tokio::spawn(async move {
                let start = date(2024, 3 + i, 1);
                engine
                    .admit(request(employee.id, start, date(2024, 3 + i, 2)))
                    .await
            })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(LeaveError::InsufficientBalance { .. }) => {}
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(fx.balance(employee.id).await, 1);
}
