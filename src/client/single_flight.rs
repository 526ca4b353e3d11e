use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::future::Future;
use tokio::sync::Mutex;

type Attempt<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

/// At most one operation of a kind in flight per instance. Callers that
/// arrive while an attempt is running await the same shared future and all
/// observe its result; a new attempt can only start after the previous one
/// resolved and was cleared.
///
/// This replaces the classic module-global "is refreshing" flag plus callback
/// queue: the mutex guards the slot, the shared future is the queue.
pub struct SingleFlight<T, E> {
    inflight: Mutex<Option<Attempt<T, E>>>,
}

impl<T, E> SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        SingleFlight {
            inflight: Mutex::new(None),
        }
    }

    /// Join the in-flight attempt if one exists, otherwise become the leader
    /// and run `task`. The task future is dropped unpolled when joining.
    pub async fn run_or_join<F>(&self, task: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let attempt = {
            let mut slot = self.inflight.lock().await;
            match slot.as_ref() {
                Some(running) => running.clone(),
                None => {
                    let attempt = task.boxed().shared();
                    *slot = Some(attempt.clone());
                    attempt
                }
            }
        };

        let result = attempt.clone().await;

        // Clear only our own generation; a later attempt may already occupy
        // the slot by the time a waiter gets here.
        let mut slot = self.inflight.lock().await;
        if slot.as_ref().is_some_and(|cur| cur.ptr_eq(&attempt)) {
            *slot = None;
        }

        result
    }
}

impl<T, E> Default for SingleFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_task(
        calls: Arc<AtomicUsize>,
    ) -> impl Future<Output = Result<usize, String>> + Send + 'static {
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_attempt() {
        let flight = Arc::new(SingleFlight::<usize, String>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            flight.run_or_join(counting_task(calls.clone())),
            flight.run_or_join(counting_task(calls.clone())),
            flight.run_or_join(counting_task(calls.clone())),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 1);
        assert_eq!(c.unwrap(), 1);
    }

    #[tokio::test]
    async fn a_new_attempt_starts_after_the_previous_resolves() {
        let flight = SingleFlight::<usize, String>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = flight.run_or_join(counting_task(calls.clone())).await;
        let second = flight.run_or_join(counting_task(calls.clone())).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 2);
    }

    #[tokio::test]
    async fn failures_are_shared_too() {
        let flight = Arc::new(SingleFlight::<usize, String>::new());
        let task = || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err::<usize, _>("nope".to_string())
        };

        let (a, b) = tokio::join!(flight.run_or_join(task()), flight.run_or_join(task()));
        assert_eq!(a.unwrap_err(), "nope");
        assert_eq!(b.unwrap_err(), "nope");
    }
}
