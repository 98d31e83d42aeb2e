use crate::room::RoomCode;
use blackjack_engine::record::RoundRecord;
use blackjack_engine::view::TableView;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

// Slow subscribers are dropped once their buffer fills up.
const EVENT_CHANNEL_BUFFER: usize = 1000;

pub type EventSender = mpsc::Sender<RoomEvent>;
pub type EventReceiver = mpsc::Receiver<RoomEvent>;

/// Everything a room tells the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Full table view after an accepted event.
    Snapshot { room: RoomCode, state: TableView },
    /// Sent before the post-reset snapshot so the dealer's final hand is
    /// visible to clients.
    RoundSettled { room: RoomCode, round: RoundRecord },
    Closed { room: RoomCode },
}

impl RoomEvent {
    pub fn room(&self) -> &RoomCode {
        match self {
            RoomEvent::Snapshot { room, .. }
            | RoomEvent::RoundSettled { room, .. }
            | RoomEvent::Closed { room } => room,
        }
    }
}

pub struct EventSubscription {
    bus: EventBus,
    room: RoomCode,
    subscriber_id: usize,
    pub receiver: EventReceiver,
}

impl EventSubscription {
    pub fn receiver(&mut self) -> &mut EventReceiver {
        &mut self.receiver
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.room, self.subscriber_id);
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<HashMap<RoomCode, Vec<(usize, EventSender)>>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, room: RoomCode) -> EventSubscription {
        let (subscriber_id, receiver) = self.subscribe_raw(room.clone());
        EventSubscription {
            bus: self.clone(),
            room,
            subscriber_id,
            receiver,
        }
    }

    fn subscribe_raw(&self, room: RoomCode) -> (usize, EventReceiver) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.entry(room.clone()).or_default().push((id, tx));

        tracing::info!(room = %room, subscriber_id = id, "client subscribed to room events");

        (id, rx)
    }

    pub fn broadcast(&self, room: &RoomCode, event: RoomEvent) {
        let subscribers = {
            let guard = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.get(room).cloned()
        };

        let Some(list) = subscribers else {
            tracing::trace!(room = %room, "no subscribers for room");
            return;
        };

        tracing::trace!(
            room = %room,
            subscriber_count = list.len(),
            "sending event to subscribers"
        );

        let mut failed = Vec::new();
        for (id, sender) in list {
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    room = %room,
                    subscriber_id = id,
                    error = ?e,
                    "dropping room event subscriber"
                );
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(room, &failed);
        }
    }

    pub fn unsubscribe(&self, room: &RoomCode, subscriber_id: usize) {
        self.remove_subscribers(room, &[subscriber_id]);
    }

    pub fn drop_room(&self, room: &RoomCode) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.remove(room);
    }

    pub fn subscriber_count(&self) -> usize {
        let guard = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.values().map(|list| list.len()).sum()
    }

    fn remove_subscribers(&self, room: &RoomCode, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(list) = guard.get_mut(room) {
            list.retain(|(id, _)| !ids.contains(id));
            if list.is_empty() {
                guard.remove(room);
            }
        }
    }
}
