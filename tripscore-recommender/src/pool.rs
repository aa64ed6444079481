//! Bounded parallel scoring that preserves input order.

use std::panic;
use std::thread;

/// Apply `score` to every item on at most `workers` scoped threads.
///
/// Items are split into contiguous chunks, one per thread, and the results
/// are concatenated in chunk order, so output order never depends on which
/// thread finishes first. A panic in `score` is propagated to the caller.
pub(crate) fn score_in_order<T, R, F>(items: &[T], workers: usize, score: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let threads = workers.clamp(1, items.len().max(1));
    if threads == 1 {
        return items.iter().map(&score).collect();
    }
    let chunk_len = items.len().div_ceil(threads);
    let score_ref = &score;
    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_len)
            .map(|chunk| scope.spawn(move || chunk.iter().map(score_ref).collect::<Vec<R>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    })
}
