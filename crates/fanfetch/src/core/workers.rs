/// Number of concurrent workers for a batch of `items` identifiers.
///
/// One worker per four identifiers (rounded up) plus one, capped by
/// `max_parallel` when it is non-zero.
///
/// # Examples
///
/// ```
/// use fanfetch::core::worker_count;
///
/// assert_eq!(worker_count(19, 8), 6);
/// assert_eq!(worker_count(100, 2), 2);
/// assert_eq!(worker_count(100, 0), 26);
/// ```
pub fn worker_count(items: usize, max_parallel: usize) -> usize {
    let scaled = items.div_ceil(4) + 1;
    if max_parallel > 0 {
        scaled.min(max_parallel)
    } else {
        scaled
    }
}
