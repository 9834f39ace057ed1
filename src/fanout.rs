//! Fork-join helpers for fixed worker fan-outs.

use tokio::task::{JoinError, JoinSet};

/// Join every worker in `workers`, then return the first failure if any.
///
/// Siblings of a failed worker are always awaited, so no task outlives the
/// call that spawned it.
pub async fn join_workers<T, E>(
    mut workers: JoinSet<Result<T, E>>,
    on_join_error: impl Fn(JoinError) -> E,
) -> Result<Vec<T>, E>
where
    T: 'static,
    E: 'static,
{
    let mut results = Vec::with_capacity(workers.len());
    let mut first_error = None;

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(join_error) => {
                first_error.get_or_insert(on_join_error(join_error));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}
