use std::sync::{Arc, Mutex};
use std::time::Duration;

use runq::{FailureKind, OutputEvent, OutputHandler};

/// Records every event a command delivers, for assertions in tests.
///
/// Clone the collector freely; all clones share the same event log.
#[derive(Clone, Default)]
pub struct Collector {
    events: Arc<Mutex<Vec<OutputEvent>>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a handler that appends every event to this collector.
    pub fn handler(&self) -> OutputHandler {
        let events = Arc::clone(&self.events);
        Box::new(move |event| events.lock().unwrap().push(event))
    }

    /// Snapshot of all recorded events, in delivery order.
    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Concatenation of all `Chunk` events, in delivery order.
    pub fn joined_chunks(&self) -> String {
        self.events()
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Chunk(chunk) => Some(chunk.as_str()),
                OutputEvent::Failure { .. } => None,
            })
            .collect()
    }

    /// All recorded failures, in delivery order.
    pub fn failures(&self) -> Vec<(FailureKind, String)> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Failure { kind, detail } => Some((*kind, detail.clone())),
                OutputEvent::Chunk(_) => None,
            })
            .collect()
    }

    /// Wait until the concatenated chunks equal `expected`.
    pub async fn wait_for_output(&self, deadline: Duration, expected: &str) {
        let this = self.clone();
        let expected = expected.to_string();
        self.wait_until(deadline, move |_| this.joined_chunks() == expected)
            .await;
    }

    /// Poll until `pred` holds for the recorded events, panicking if it
    /// does not hold within `deadline`.
    pub async fn wait_until(&self, deadline: Duration, pred: impl Fn(&[OutputEvent]) -> bool) {
        let start = tokio::time::Instant::now();
        loop {
            if pred(&self.events()) {
                return;
            }
            if start.elapsed() > deadline {
                panic!(
                    "collector condition not met within {deadline:?}; events: {:?}",
                    self.events()
                );
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
