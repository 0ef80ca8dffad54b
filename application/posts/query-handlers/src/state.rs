use std::future::Future;

use common_errors::AppError;

/// What a consumer of a query observes.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<AppError>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

impl<T> QueryState<T> {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn settled<E: Into<AppError>>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => {
                Self {
                    data: Some(data),
                    ..Self::default()
                }
            }
            Err(err) => {
                Self {
                    error: Some(err.into()),
                    ..Self::default()
                }
            }
        }
    }

    /// Awaits `query` and captures its outcome.
    pub async fn resolve<E, Fut>(query: Fut) -> Self
    where
        E: Into<AppError>,
        Fut: Future<Output = Result<T, E>>,
    {
        Self::settled(query.await)
    }

    pub fn is_success(&self) -> bool { self.data.is_some() }

    pub fn is_error(&self) -> bool { self.error.is_some() }
}
