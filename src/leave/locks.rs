use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per employee. Holding the guard gives exclusive access to
/// that employee's balance and leave records for the duration of a decision.
#[derive(Default)]
pub struct EmployeeLocks {
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl EmployeeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, employee_id: u64) -> OwnedMutexGuard<()> {
        // the shard guard must be released before awaiting
        let lock = Arc::clone(self.locks.entry(employee_id).or_default().value());
        lock.lock_owned().await
    }

    /// Drops the entries nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_employee_waits_for_release() {
        let locks = Arc::new(EmployeeLocks::new());
        let guard = locks.acquire(7).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(7).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_employees_do_not_block() {
        let locks = EmployeeLocks::new();
        let _first = locks.acquire(1).await;
        let _second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2))
            .await
            .expect("employee 2 must not wait on employee 1");
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = EmployeeLocks::new();
        let held = locks.acquire(1).await;
        drop(locks.acquire(2).await);

        locks.prune();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }
}
