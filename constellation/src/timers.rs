use std::time::Instant;

/// Deadline-ordered one-shot timers, evaluated against frame timestamps instead of sleeping.
#[derive(Debug)]
pub struct OneShotTimers<T> {
    entries: Vec<(Instant, T)>,
}

impl<T> Default for OneShotTimers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OneShotTimers<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn schedule(&mut self, at: Instant, value: T) {
        let idx = self.entries.partition_point(|(due, _)| *due <= at);
        self.entries.insert(idx, (at, value));
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.first().map(|(at, _)| *at)
    }

    /// Removes and returns every timer due at `now`, earliest first.
    pub fn drain_due(&mut self, now: Instant) -> Vec<T> {
        let due = self.entries.partition_point(|(at, _)| *at <= now);
        self.entries.drain(..due).map(|(_, value)| value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn drains_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = OneShotTimers::new();
        timers.schedule(t0 + Duration::from_millis(30), "c");
        timers.schedule(t0 + Duration::from_millis(10), "a");
        timers.schedule(t0 + Duration::from_millis(20), "b");

        assert!(timers.drain_due(t0).is_empty());
        assert_eq!(timers.drain_due(t0 + Duration::from_millis(20)), vec!["a", "b"]);
        assert_eq!(timers.next_deadline(), Some(t0 + Duration::from_millis(30)));
        timers.cancel_all();
        assert!(timers.drain_due(t0 + Duration::from_secs(1)).is_empty());
    }
}
