//! Timing macros.

/// Evaluate a block and return `(result, duration_us)`, logging the duration
/// at debug level under the given operation name.
///
/// ```rust
/// use strata_tracing::timed;
///
/// let (total, _duration_us) = timed!("sum", { (1..=10).sum::<i32>() });
/// assert_eq!(total, 55);
/// ```
#[macro_export]
macro_rules! timed {
    ($name:expr, $block:block) => {{
        let start = ::std::time::Instant::now();
        let result = $block;
        let duration_us = start.elapsed().as_micros() as u64;
        $crate::debug!(operation = $name, duration_us = duration_us, "timed_block_complete");
        (result, duration_us)
    }};
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    #[test]
    fn timed_returns_block_value() {
        let (value, duration_us) = timed!("sleep", {
            thread::sleep(Duration::from_millis(5));
            42
        });
        assert_eq!(value, 42);
        assert!(duration_us >= 5_000);
    }

    #[test]
    fn timed_passes_errors_through() {
        let (result, _) = timed!("failing", { Result::<u8, &str>::Err("boom") });
        assert_eq!(result, Err("boom"));
    }
}
