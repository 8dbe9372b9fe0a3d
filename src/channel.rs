//! Push-event channel port and an in-process implementation.
//!
//! The transport delivering robot lifecycle events (its connection,
//! registration and reconnect mechanics) lives outside this crate. What the
//! registry needs from it is narrow: a readiness flag it can watch, and
//! per-label subscriptions it can hold and drop deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};

/// Named robot lifecycle events on the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventLabel {
    RobotAdded,
    RobotUpdated,
    RobotDeleted,
}

impl EventLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLabel::RobotAdded => "robotAdded",
            EventLabel::RobotUpdated => "robotUpdated",
            EventLabel::RobotDeleted => "robotDeleted",
        }
    }
}

impl std::fmt::Display for EventLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound event: who sent it and the serialized robot record.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub sender: String,
    pub payload: String,
}

/// Contract the registry holds against the push transport.
pub trait PushChannel: Send + Sync + 'static {
    /// Readiness of the transport. `true` means events can be delivered and
    /// subscriptions should be (re)registered.
    fn readiness(&self) -> watch::Receiver<bool>;

    /// Register a subscriber for one event label. Dropping the returned
    /// handle unregisters it.
    fn subscribe(&self, label: EventLabel) -> Subscription;
}

type SubscriberTable = Arc<Mutex<HashMap<EventLabel, Vec<Subscriber>>>>;

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<InboundEvent>,
}

/// A live subscription to one event label.
///
/// Events queue in an unbounded channel, so a slow consumer loses nothing.
/// The handle unregisters itself from the channel when dropped.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<InboundEvent>,
    _guard: SubscriptionGuard,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<InboundEvent> {
        self.rx.recv().await
    }
}

struct SubscriptionGuard {
    table: SubscriberTable,
    label: EventLabel,
    id: u64,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Ok(mut table) = self.table.lock() {
            if let Some(subscribers) = table.get_mut(&self.label) {
                subscribers.retain(|s| s.id != self.id);
            }
        }
    }
}

/// In-process event hub.
///
/// Composition roots feed it from whatever transport the deployment uses;
/// tests drive it directly. Publishing fans out to every subscriber of the
/// label, whether or not the channel currently reports itself ready.
pub struct LocalPushChannel {
    ready_tx: watch::Sender<bool>,
    subscribers: SubscriberTable,
    next_id: AtomicU64,
}

impl LocalPushChannel {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            ready_tx,
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Flip the readiness flag. Subscribers watching it observe the change.
    pub fn set_ready(&self, ready: bool) {
        // send_replace updates the value even while nobody is watching yet
        self.ready_tx.send_replace(ready);
    }

    /// Deliver an event to every subscriber of the label.
    pub fn publish(&self, label: EventLabel, sender: &str, payload: &str) {
        let targets: Vec<mpsc::UnboundedSender<InboundEvent>> = {
            let table = self.subscribers.lock().expect("subscriber table poisoned");
            table
                .get(&label)
                .map(|subs| subs.iter().map(|s| s.tx.clone()).collect())
                .unwrap_or_default()
        };

        for tx in targets {
            let _ = tx.send(InboundEvent {
                sender: sender.to_string(),
                payload: payload.to_string(),
            });
        }
    }

    /// Number of live subscriptions for a label.
    pub fn subscriber_count(&self, label: EventLabel) -> usize {
        let table = self.subscribers.lock().expect("subscriber table poisoned");
        table.get(&label).map(|subs| subs.len()).unwrap_or(0)
    }
}

impl Default for LocalPushChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl PushChannel for LocalPushChannel {
    fn readiness(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }

    fn subscribe(&self, label: EventLabel) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut table = self.subscribers.lock().expect("subscriber table poisoned");
        table.entry(label).or_default().push(Subscriber { id, tx });

        Subscription {
            rx,
            _guard: SubscriptionGuard {
                table: Arc::clone(&self.subscribers),
                label,
                id,
            },
        }
    }
}
