use std::future::Future;

use common_errors::AppError;
use tokio::sync::watch;

/// Lifecycle of one mutation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationStatus<T> {
    Idle,
    Pending,
    Success(T),
    Error(AppError),
}

type SuccessFn<T> = Box<dyn FnOnce(&T) + Send>;
type ErrorFn = Box<dyn FnOnce(&AppError) + Send>;
type SettledFn<T> = Box<dyn FnOnce(Result<&T, &AppError>) + Send>;

/// Caller hooks, each fired at most once per attempt and only after the
/// mutation's cache effects have been applied.
pub struct MutationCallbacks<T> {
    on_success: Option<SuccessFn<T>>,
    on_error: Option<ErrorFn>,
    on_settled: Option<SettledFn<T>>,
}

impl<T> Default for MutationCallbacks<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
            on_settled: None,
        }
    }
}

impl<T> MutationCallbacks<T> {
    pub fn new() -> Self { Self::default() }

    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(
        mut self, f: impl FnOnce(&AppError) + Send + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_settled(
        mut self, f: impl FnOnce(Result<&T, &AppError>) + Send + 'static,
    ) -> Self {
        self.on_settled = Some(Box::new(f));
        self
    }

    fn fire(self, outcome: Result<&T, &AppError>) {
        match outcome {
            Ok(data) => {
                if let Some(f) = self.on_success {
                    f(data);
                }
            }
            Err(err) => {
                if let Some(f) = self.on_error {
                    f(err);
                }
            }
        }
        if let Some(f) = self.on_settled {
            f(outcome);
        }
    }
}

/// Observable handle for a mutation: `Idle -> Pending -> Success | Error`.
///
/// Subscribers see every transition through a `watch` channel. Running
/// the handle again restarts the cycle from `Pending`.
pub struct Mutation<T> {
    status: watch::Sender<MutationStatus<T>>,
}

impl<T: Clone> Default for Mutation<T> {
    fn default() -> Self { Self::new() }
}

impl<T: Clone> Mutation<T> {
    pub fn new() -> Self {
        let (status, _) = watch::channel(MutationStatus::Idle);
        Self { status }
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationStatus<T>> {
        self.status.subscribe()
    }

    pub fn status(&self) -> MutationStatus<T> { self.status.borrow().clone() }

    pub fn is_idle(&self) -> bool {
        matches!(*self.status.borrow(), MutationStatus::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.status.borrow(), MutationStatus::Pending)
    }

    pub fn data(&self) -> Option<T> {
        match &*self.status.borrow() {
            MutationStatus::Success(data) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<AppError> {
        match &*self.status.borrow() {
            MutationStatus::Error(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Back to `Idle`, dropping any previous outcome.
    pub fn reset(&self) { self.status.send_replace(MutationStatus::Idle); }

    /// Drives `operation` through the state machine and fires `callbacks`
    /// once it settles.
    pub async fn run<E, Fut>(
        &self, operation: Fut, callbacks: MutationCallbacks<T>,
    ) -> Result<T, E>
    where
        E: Clone + Into<AppError>,
        Fut: Future<Output = Result<T, E>>,
    {
        self.status.send_replace(MutationStatus::Pending);

        match operation.await {
            Ok(data) => {
                self.status
                    .send_replace(MutationStatus::Success(data.clone()));
                callbacks.fire(Ok(&data));
                Ok(data)
            }
            Err(err) => {
                let app: AppError = err.clone().into();
                self.status.send_replace(MutationStatus::Error(app.clone()));
                callbacks.fire(Err(&app));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[tokio::test]
    async fn test_success_transitions_and_callbacks() {
        let mutation = Mutation::<u32>::new();
        assert!(mutation.is_idle());

        let successes = Arc::new(AtomicUsize::new(0));
        let settled = Arc::new(AtomicUsize::new(0));
        let (s, t) = (successes.clone(), settled.clone());

        let result = mutation
            .run(
                async { Ok::<_, AppError>(7) },
                MutationCallbacks::new()
                    .on_success(move |v| {
                        assert_eq!(*v, 7);
                        s.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_error(|_| panic!("no error expected"))
                    .on_settled(move |_| {
                        t.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(mutation.data(), Some(7));
        assert!(mutation.error().is_none());
        assert_eq!(successes.load(Ordering::SeqCst), 1);
        assert_eq!(settled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_recorded_and_forwarded() {
        let mutation = Mutation::<u32>::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();

        let result = mutation
            .run(
                async { Err::<u32, _>(AppError::not_found("missing")) },
                MutationCallbacks::new().on_error(move |err| {
                    assert_eq!(err.code(), 404);
                    s.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(mutation.error().map(|e| e.code()), Some(404));
        assert!(mutation.data().is_none());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pending_is_observable_while_running() {
        let mutation = Mutation::<u32>::new();
        let mut rx = mutation.subscribe();
        let (tx, gate) = tokio::sync::oneshot::channel::<()>();

        let run = mutation.run(
            async move {
                let _ = gate.await;
                Ok::<_, AppError>(1)
            },
            MutationCallbacks::new(),
        );
        let observe = async {
            rx.changed().await.unwrap();
            assert_eq!(*rx.borrow(), MutationStatus::Pending);
            tx.send(()).unwrap();
        };

        let (result, ()) = tokio::join!(run, observe);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(mutation.status(), MutationStatus::Success(1));

        mutation.reset();
        assert!(mutation.is_idle());
    }
}
