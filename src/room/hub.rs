//! Per-room subscriber set. Each subscriber owns a bounded channel; a full
//! or closed channel gets the subscriber dropped and a fresh presence
//! broadcast.

use tokio::sync::mpsc;

use crate::events::ServerEvent;

/// Outbound buffer per subscriber. A reader this far behind is gone.
pub const SUBSCRIBER_BUFFER: usize = 32;

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<ServerEvent>,
}

#[derive(Default)]
pub struct Hub {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Register a new subscriber and hand back its receiving end.
    pub fn subscribe(&mut self) -> (u64, mpsc::Receiver<ServerEvent>) {
        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.subscribers.push(Subscriber { id, tx });
        (id, rx)
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Queue an event for a single subscriber (the connect handshake).
    pub fn send_to(&mut self, id: u64, event: ServerEvent) {
        if let Some(subscriber) = self.subscribers.iter().find(|s| s.id == id) {
            if subscriber.tx.try_send(event).is_err() {
                self.remove(id);
            }
        }
    }

    /// Deliver to every subscriber. Dead ones are dropped, and each wave of
    /// drops is followed by a presence broadcast until the set is stable.
    pub fn broadcast(&mut self, event: ServerEvent) {
        let mut outgoing = event;
        loop {
            let mut dead: Vec<u64> = Vec::new();
            for subscriber in &self.subscribers {
                if subscriber.tx.try_send(outgoing.clone()).is_err() {
                    dead.push(subscriber.id);
                }
            }
            if dead.is_empty() {
                return;
            }
            self.subscribers.retain(|s| !dead.contains(&s.id));
            outgoing = ServerEvent::Presence { count: self.len() };
        }
    }

    pub fn broadcast_presence(&mut self) {
        self.broadcast(ServerEvent::Presence { count: self.len() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_all_subscribers() {
        let mut hub = Hub::new();
        let (_, mut rx_a) = hub.subscribe();
        let (_, mut rx_b) = hub.subscribe();
        hub.broadcast(ServerEvent::Presence { count: 2 });
        assert!(matches!(
            rx_a.recv().await,
            Some(ServerEvent::Presence { count: 2 })
        ));
        assert!(matches!(
            rx_b.recv().await,
            Some(ServerEvent::Presence { count: 2 })
        ));
    }

    #[tokio::test]
    async fn closed_subscriber_is_dropped_with_presence() {
        let mut hub = Hub::new();
        let (_, rx_dead) = hub.subscribe();
        let (_, mut rx_live) = hub.subscribe();
        drop(rx_dead);

        hub.broadcast(ServerEvent::Connected);
        assert_eq!(hub.len(), 1);
        assert!(matches!(rx_live.recv().await, Some(ServerEvent::Connected)));
        assert!(matches!(
            rx_live.recv().await,
            Some(ServerEvent::Presence { count: 1 })
        ));
    }

    #[tokio::test]
    async fn slow_subscriber_overflow_drops_it() {
        let mut hub = Hub::new();
        let (_, _rx_slow) = hub.subscribe();
        for _ in 0..=SUBSCRIBER_BUFFER {
            hub.broadcast(ServerEvent::Connected);
        }
        assert_eq!(hub.len(), 0);
    }
}
