//! Provider event registry
//!
//! Explicit observer registry in place of a Node-style event emitter.
//! Subscriptions are keyed by tag: subscribing twice under the same tag
//! replaces the earlier listener, which makes registration idempotent for
//! callers like the connector that wire themselves up on every `connect`.

use std::sync::{Arc, Mutex};

/// State transitions observable by the connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Connect { chain_id: u64 },
    Disconnect,
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
}

pub type EventListener = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventListeners {
    inner: Mutex<Vec<(String, EventListener)>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under a tag, replacing any existing listener with
    /// the same tag.
    pub fn subscribe(&self, tag: impl Into<String>, listener: EventListener) {
        let tag = tag.into();
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.retain(|(existing, _)| *existing != tag);
        inner.push((tag, listener));
    }

    /// Remove the listener registered under a tag. Returns whether one
    /// existed.
    pub fn unsubscribe(&self, tag: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let before = inner.len();
        inner.retain(|(existing, _)| existing != tag);
        inner.len() != before
    }

    pub fn is_subscribed(&self, tag: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .any(|(existing, _)| existing == tag)
    }

    /// Fan an event out to every listener.
    ///
    /// Listeners are invoked outside the lock so they may re-subscribe.
    pub fn emit(&self, event: &ProviderEvent) {
        let listeners: Vec<EventListener> = self
            .inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_reaches_all_listeners() {
        let registry = EventListeners::new();
        let count = Arc::new(AtomicUsize::new(0));

        for tag in ["a", "b"] {
            let count = count.clone();
            registry.subscribe(
                tag,
                Arc::new(move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        registry.emit(&ProviderEvent::Disconnect);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscribe_same_tag_replaces() {
        let registry = EventListeners::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        {
            let first = first.clone();
            registry.subscribe(
                "connector",
                Arc::new(move |_| {
                    first.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        {
            let second = second.clone();
            registry.subscribe(
                "connector",
                Arc::new(move |_| {
                    second.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        registry.emit(&ProviderEvent::ChainChanged(137));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = EventListeners::new();
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = count.clone();
            registry.subscribe(
                "connector",
                Arc::new(move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        assert!(registry.is_subscribed("connector"));
        assert!(registry.unsubscribe("connector"));
        assert!(!registry.unsubscribe("connector"));

        registry.emit(&ProviderEvent::Disconnect);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_observes_event_payload() {
        let registry = EventListeners::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            registry.subscribe(
                "t",
                Arc::new(move |event| {
                    seen.lock().unwrap().push(event.clone());
                }),
            );
        }

        registry.emit(&ProviderEvent::Connect { chain_id: 1 });
        registry.emit(&ProviderEvent::AccountsChanged(vec!["0xabc".into()]));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ProviderEvent::Connect { chain_id: 1 },
                ProviderEvent::AccountsChanged(vec!["0xabc".into()]),
            ]
        );
    }
}
