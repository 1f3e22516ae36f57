use std::collections::VecDeque;

/// One gesture observation, in the shape the debug overlay shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureTelemetry {
    pub event: String,
    pub pointer_type: String,
    pub target: String,
    pub capture: bool,
    pub scene: usize,
}

/// Bounded ring of recent telemetry. Records are kept (and traced) whether or not anything
/// reads them.
#[derive(Debug)]
pub struct TelemetryLog {
    entries: VecDeque<GestureTelemetry>,
    capacity: usize,
}

impl TelemetryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, entry: GestureTelemetry) {
        tracing::debug!(
            event = %entry.event,
            pointer_type = %entry.pointer_type,
            target = %entry.target,
            capture = entry.capture,
            scene = entry.scene,
            "gesture"
        );
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn last(&self) -> Option<&GestureTelemetry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureTelemetry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> GestureTelemetry {
        GestureTelemetry {
            event: "pointerdown".into(),
            pointer_type: "mouse".into(),
            target: format!("t{n}"),
            capture: false,
            scene: n,
        }
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut log = TelemetryLog::new(2);
        log.record(entry(1));
        log.record(entry(2));
        log.record(entry(3));
        assert_eq!(log.len(), 2);
        assert_eq!(log.iter().next().map(|e| e.scene), Some(2));
        assert_eq!(log.last().map(|e| e.target.as_str()), Some("t3"));
    }
}
