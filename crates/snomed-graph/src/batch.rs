//! Batch processing that carries on past recoverable failures.

use std::fmt::Display;

use crate::error::{GraphError, GraphResult};

/// One item a batch gave up on.
#[derive(Debug)]
pub struct BatchFailure {
    /// The item, as displayed.
    pub item: String,
    /// Why it failed.
    pub error: GraphError,
}

/// Results of a batch run.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Results of the items that succeeded, in input order.
    pub succeeded: Vec<T>,
    /// Items that failed with a recoverable error.
    pub failed: Vec<BatchFailure>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchOutcome<T> {
    /// True if no item failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies `f` to every item.
///
/// Recoverable errors (see [`GraphError::is_recoverable`]) are logged and
/// collected; any other error stops the batch and is returned.
///
/// # Examples
///
/// ```
/// use snomed_graph::{run_batch, GraphError};
///
/// let outcome = run_batch([1u64, 2, 3], |&n| {
///     if n == 2 {
///         Err(GraphError::NotFound { kind: "concept", id: n.to_string() })
///     } else {
///         Ok(n * 10)
///     }
/// })
/// .unwrap();
///
/// assert_eq!(outcome.succeeded, vec![10, 30]);
/// assert_eq!(outcome.failed[0].item, "2");
/// ```
pub fn run_batch<I, T, F>(items: impl IntoIterator<Item = I>, mut f: F) -> GraphResult<BatchOutcome<T>>
where
    I: Display,
    F: FnMut(&I) -> GraphResult<T>,
{
    let mut outcome = BatchOutcome::default();
    for item in items {
        match f(&item) {
            Ok(value) => outcome.succeeded.push(value),
            Err(error) if error.is_recoverable() => {
                tracing::warn!("Skipping {}: {}", item, error);
                outcome.failed.push(BatchFailure {
                    item: item.to_string(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    tracing::info!(
        "Batch finished: {} succeeded, {} failed",
        outcome.succeeded.len(),
        outcome.failed.len()
    );
    Ok(outcome)
}
