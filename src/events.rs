//! Service events published after successful mutations.

use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Clone, Debug, PartialEq)]
pub struct ServiceEvent {
    pub path: &'static str,
    /// `created`, `patched` or `removed`.
    pub event: &'static str,
    pub data: Value,
}

impl ServiceEvent {
    /// Wire name, e.g. `todo created`.
    pub fn name(&self) -> String {
        format!("{} {}", self.path, self.event)
    }
}

/// Fan-out of service events to realtime subscribers. Slow subscribers lose the
/// oldest events once `capacity` is exceeded.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ServiceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        EventBus { tx }
    }

    pub fn publish(&self, event: ServiceEvent) {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(event = %name, receivers, "event published"),
            Err(_) => tracing::trace!(event = %name, "event dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(ServiceEvent { path: "todo", event: "created", data: json!({ "id": 1 }) });
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.name(), "todo created");
        assert_eq!(ev.data, json!({ "id": 1 }));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        EventBus::new(1).publish(ServiceEvent { path: "todo", event: "removed", data: Value::Null });
    }
}
