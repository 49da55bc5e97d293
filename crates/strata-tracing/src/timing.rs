//! Wall-clock timing of runtime work.
//!
//! [`DispatchTimer`] is an RAII guard: it opens a debug span on creation and
//! emits one `dispatch_complete` event with the elapsed microseconds when it
//! is dropped, optionally suppressed below a threshold.

use std::time::Instant;

/// Guard that measures the time between its creation and drop.
pub struct DispatchTimer {
    label: &'static str,
    threshold_us: Option<u64>,
    start: Instant,
    span: tracing::Span,
}

impl DispatchTimer {
    /// Start timing `label`. With `threshold_us` set, only durations at or
    /// above the threshold are logged.
    pub fn new(label: &'static str, threshold_us: Option<u64>) -> Self {
        Self::within(tracing::debug_span!("dispatch", label), label, threshold_us)
    }

    /// Start timing inside an existing span.
    pub fn within(span: tracing::Span, label: &'static str, threshold_us: Option<u64>) -> Self {
        Self {
            label,
            threshold_us,
            start: Instant::now(),
            span,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Microseconds since the timer started.
    pub fn elapsed_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Enter the timer's span.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        let elapsed_us = self.elapsed_us();
        if self.threshold_us.map_or(true, |threshold| elapsed_us >= threshold) {
            let _entered = self.span.enter();
            tracing::debug!(
                label = self.label,
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "dispatch_complete"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn elapsed_grows_monotonically() {
        let timer = DispatchTimer::new("sleep", None);
        thread::sleep(Duration::from_millis(2));
        let first = timer.elapsed_us();
        thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed_us() >= first);
        assert!(first >= 2_000);
    }

    #[test]
    fn threshold_timer_drops_quietly() {
        let timer = DispatchTimer::new("fast", Some(u64::MAX));
        assert_eq!(timer.label(), "fast");
        drop(timer);
    }

    #[test]
    fn timer_inside_custom_span() {
        let span = tracing::info_span!("custom", task_id = 7u32);
        let timer = DispatchTimer::within(span, "custom", None);
        let _entered = timer.enter();
    }
}
