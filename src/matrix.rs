//! Bounded asynchronous mapping over row-major matrices.
//!
//! Rows are processed strictly one at a time so that at most one row's worth
//! of results is in flight; within a row up to `limit` cell transforms run
//! concurrently. The output matrix is always positionally identical to the
//! input, regardless of completion order.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;

/// A row-major matrix. Rows may be ragged; a gap cell is `None` when the
/// element type is an `Option`.
pub type Matrix<T> = Vec<Vec<T>>;

/// Maps every cell of `matrix` through `transform`, preserving shape.
///
/// Row concurrency is fixed at 1; within a row up to `limit` transforms are
/// polled concurrently. `result[i][j]` corresponds to `matrix[i][j]` no
/// matter which cell finishes first. The first cell error aborts the whole
/// operation.
///
/// # Panics
///
/// Panics if `limit` is 0.
pub async fn map_matrix_limit<T, R, E, F, Fut>(
    matrix: Matrix<T>,
    limit: usize,
    transform: F,
) -> Result<Matrix<R>, E>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    assert!(limit > 0, "limit must be > 0");

    let mut result = Vec::with_capacity(matrix.len());
    for row in matrix {
        let mapped: Vec<R> = stream::iter(row.into_iter().map(&transform))
            .buffered(limit)
            .try_collect()
            .await?;
        result.push(mapped);
    }

    Ok(result)
}
