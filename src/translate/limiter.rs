use std::future::Future;
use tokio::sync::Semaphore;
use tracing::debug;

/// Bounds how many pipeline runs talk to upstream providers at once.
///
/// Waiters are admitted in arrival order (tokio's semaphore is fair). The
/// permit is released when the task finishes, including when it fails or
/// panics, so a broken run can never wedge the gate.
pub struct AdmissionLimiter {
    semaphore: Semaphore,
    capacity: usize,
}

impl AdmissionLimiter {
    /// Create a limiter admitting `max_concurrent` tasks; zero is treated as one.
    pub fn new(max_concurrent: usize) -> Self {
        let capacity = max_concurrent.max(1);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
        }
    }

    /// A limiter that fully serializes upstream calls
    pub fn serial() -> Self {
        Self::new(1)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Run `task` once a slot is free.
    pub async fn run<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if self.semaphore.available_permits() == 0 {
            debug!("Admission limiter full ({} in flight), waiting", self.capacity);
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("admission semaphore is never closed");

        task().await
    }
}

impl Default for AdmissionLimiter {
    fn default() -> Self {
        Self::serial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_is_clamped() {
        let limiter = AdmissionLimiter::new(0);
        assert_eq!(limiter.capacity(), 1);
    }

    #[tokio::test]
    async fn test_run_returns_task_output() {
        let limiter = AdmissionLimiter::serial();
        let value = limiter.run(|| async { 42 }).await;
        assert_eq!(value, 42);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failed_task_releases_slot() {
        let limiter = AdmissionLimiter::serial();

        let result: Result<(), &str> = limiter.run(|| async { Err("boom") }).await;
        assert!(result.is_err());
        assert_eq!(limiter.in_flight(), 0);

        let value = limiter.run(|| async { "next" }).await;
        assert_eq!(value, "next");
    }

    #[tokio::test]
    async fn test_panicking_task_releases_slot() {
        let limiter = Arc::new(AdmissionLimiter::serial());

        let panicking = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                limiter
                    .run(|| async {
                        let exploded = true;
                        assert!(!exploded, "task blew up");
                    })
                    .await
            })
        };
        assert!(panicking.await.is_err());

        assert_eq!(limiter.in_flight(), 0);
        let value = tokio::time::timeout(Duration::from_secs(1), limiter.run(|| async { 7 }))
            .await
            .expect("slot should have been released");
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_serial_limiter_never_overlaps() {
        let limiter = Arc::new(AdmissionLimiter::serial());
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = Arc::clone(&limiter);
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                limiter
                    .run(|| async {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_three_allows_three() {
        let limiter = Arc::new(AdmissionLimiter::new(3));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..9).map(|_| {
            let limiter = Arc::clone(&limiter);
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            async move {
                limiter
                    .run(|| async {
                        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        current.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
            }
        });
        futures::future::join_all(tasks).await;

        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_admitted_in_arrival_order() {
        let limiter = Arc::new(AdmissionLimiter::serial());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                limiter
                    .run(|| async {
                        order.lock().unwrap().push(i);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    })
                    .await
            }));
            // Let each task reach the gate before spawning the next
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }
}
