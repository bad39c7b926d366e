//! Synchronous, in-process message bus.
//!
//! Subscribers register per message type; `publish` calls each of them on the
//! caller's thread, in subscription order. A failing handler is logged and the
//! remaining handlers still run.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

type ErasedHandler = Arc<dyn Fn(&dyn Any) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by [`MessageBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    handler: ErasedHandler,
}

#[derive(Default)]
pub struct MessageBus {
    subscribers: RwLock<HashMap<TypeId, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subs = self.subscribers.read();
        f.debug_struct("MessageBus")
            .field("message_types", &subs.len())
            .field(
                "subscribers",
                &subs.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<M, F>(&self, handler: F) -> SubscriptionId
    where
        M: Any + Send + Sync,
        F: Fn(&M) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: ErasedHandler = Arc::new(move |msg: &dyn Any| match msg.downcast_ref::<M>() {
            Some(m) => handler(m),
            None => Ok(()),
        });
        self.subscribers
            .write()
            .entry(TypeId::of::<M>())
            .or_default()
            .push(Subscriber { id, handler });
        tracing::debug!(message = type_name::<M>(), ?id, "Subscribed");
        id
    }

    /// Returns false when the id is unknown or was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write();
        for list in subs.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `message` to every subscriber of `M`. Returns how many handlers ran.
    pub fn publish<M: Any + Send + Sync>(&self, message: &M) -> usize {
        // Snapshot so handlers may subscribe or publish without deadlocking.
        let handlers: Vec<(SubscriptionId, ErasedHandler)> = match self
            .subscribers
            .read()
            .get(&TypeId::of::<M>())
        {
            Some(list) => list
                .iter()
                .map(|s| (s.id, Arc::clone(&s.handler)))
                .collect(),
            None => return 0,
        };

        for (id, handler) in &handlers {
            if let Err(e) = handler(message) {
                tracing::error!(
                    message = type_name::<M>(),
                    ?id,
                    error = %format!("{e:#}"),
                    "Message handler failed"
                );
            }
        }
        handlers.len()
    }

    pub fn subscriber_count<M: Any>(&self) -> usize {
        self.subscribers
            .read()
            .get(&TypeId::of::<M>())
            .map_or(0, Vec::len)
    }
}
