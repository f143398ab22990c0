//! In-process publish/subscribe bus for application events.
//!
//! Subscribers receive events over their own channel and are removed from the
//! bus when their [`Subscription`] is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use strum::EnumDiscriminants;

use crate::editor::HistoryState;
use crate::source::NoteContext;

/// What the editor should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteIntent {
    /// A blank note, filed under `context` when created from a filtered view.
    New { context: Option<NoteContext> },
}

#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(EventTopic), derive(Hash))]
pub enum AppEvent {
    HistoryChanged(HistoryState),
    RefreshNotes,
    ScrollToTop,
    LoadNote(NoteIntent),
}

impl AppEvent {
    pub fn topic(&self) -> EventTopic {
        EventTopic::from(self)
    }
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<EventTopic, Vec<(u64, Sender<AppEvent>)>>,
}

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: EventTopic) -> Subscription {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.entry(topic).or_default().push((id, tx));
        tracing::trace!(?topic, id, "subscribed");
        Subscription {
            id,
            topic,
            receiver: rx,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Delivers `event` to every subscriber of its topic. Returns how many received it.
    pub fn publish(&self, event: AppEvent) -> usize {
        let topic = event.topic();
        let registry = self.registry.lock();
        let Some(subscribers) = registry.subscribers.get(&topic) else {
            tracing::trace!(?topic, "event published with no subscribers");
            return 0;
        };
        subscribers
            .iter()
            .filter(|(_, tx)| tx.send(event.clone()).is_ok())
            .count()
    }

    pub fn subscriber_count(&self, topic: EventTopic) -> usize {
        self.registry
            .lock()
            .subscribers
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

/// Receiving end of one topic. Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    topic: EventTopic,
    receiver: Receiver<AppEvent>,
    registry: Arc<Mutex<Registry>>,
}

impl Subscription {
    pub fn topic(&self) -> EventTopic {
        self.topic
    }

    pub fn try_recv(&self) -> Option<AppEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Everything queued since the last call, oldest first.
    pub fn drain(&self) -> Vec<AppEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        if let Some(subscribers) = registry.subscribers.get_mut(&self.topic) {
            subscribers.retain(|(id, _)| *id != self.id);
            if subscribers.is_empty() {
                registry.subscribers.remove(&self.topic);
            }
        }
        tracing::trace!(topic = ?self.topic, id = self.id, "unsubscribed");
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn events_reach_only_their_topic() {
        let bus = EventBus::new();
        let refresh = bus.subscribe(EventTopic::RefreshNotes);
        let scroll = bus.subscribe(EventTopic::ScrollToTop);

        assert_eq!(bus.publish(AppEvent::RefreshNotes), 1);
        assert_eq!(refresh.try_recv(), Some(AppEvent::RefreshNotes));
        assert_eq!(refresh.try_recv(), None);
        assert!(scroll.drain().is_empty());
    }

    #[test]
    fn dropping_a_subscription_unsubscribes() {
        let bus = EventBus::new();
        let first = bus.subscribe(EventTopic::ScrollToTop);
        let second = bus.subscribe(EventTopic::ScrollToTop);
        assert_eq!(bus.subscriber_count(EventTopic::ScrollToTop), 2);

        drop(first);
        assert_eq!(bus.subscriber_count(EventTopic::ScrollToTop), 1);
        assert_eq!(bus.publish(AppEvent::ScrollToTop), 1);
        assert_eq!(second.drain(), vec![AppEvent::ScrollToTop]);

        drop(second);
        assert_eq!(bus.publish(AppEvent::ScrollToTop), 0);
    }

    #[test]
    fn publishing_from_another_thread() {
        let bus = EventBus::new();
        let history = bus.subscribe(EventTopic::HistoryChanged);
        let publisher = bus.clone();
        thread::spawn(move || {
            publisher.publish(AppEvent::HistoryChanged(HistoryState {
                undo: true,
                redo: false,
            }));
        })
        .join()
        .expect("publisher thread");
        assert_eq!(
            history.drain(),
            vec![AppEvent::HistoryChanged(HistoryState {
                undo: true,
                redo: false
            })]
        );
    }
}
