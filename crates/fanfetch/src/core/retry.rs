use std::time::Duration;

/// Delay before a retry using exponential backoff: `base * 2^retry_index`.
///
/// `retry_index` is 0 for the first retry. A zero `base` disables backoff,
/// which is the default for endpoints.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fanfetch::core::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(100)), Duration::from_millis(100));
/// assert_eq!(retry_delay(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn retry_delay(retry_index: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_index);
    base.saturating_mul(multiplier)
}

/// Retries as a percentage of requests; 0 for an empty run.
pub fn retry_rate(retries: u64, requests: usize) -> f64 {
    if requests == 0 {
        return 0.0;
    }
    retries as f64 * 100.0 / requests as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_doubles() {
        let base = Duration::from_millis(50);
        let delays: Vec<Duration> = (0..4).map(|i| retry_delay(i, base)).collect();

        assert_eq!(delays[0], Duration::from_millis(50));
        for i in 1..delays.len() {
            assert_eq!(delays[i], delays[i - 1] * 2);
        }
    }

    #[test]
    fn test_retry_delay_zero_base() {
        assert_eq!(retry_delay(0, Duration::ZERO), Duration::ZERO);
        assert_eq!(retry_delay(12, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_retry_rate() {
        assert_eq!(retry_rate(0, 0), 0.0);
        assert_eq!(retry_rate(3, 0), 0.0);
        assert_eq!(retry_rate(1, 4), 25.0);
        assert_eq!(retry_rate(38, 19), 200.0);
    }

    #[test]
    fn test_retry_delay_saturates() {
        let base = Duration::from_secs(u64::MAX / 2);
        assert_eq!(retry_delay(40, base), Duration::MAX);
    }
}
