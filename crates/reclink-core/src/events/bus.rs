use crate::events::{Notification, NotificationKind};

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{error, trace};

type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    filter: Option<NotificationKind>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Synchronous fan-out of [`Notification`]s.
///
/// Handlers run on the emitting task in subscription order. The handler list
/// is snapshotted before delivery, so a handler may subscribe or unsubscribe
/// without deadlocking; such changes apply from the next emission.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.lock().subscribers.len())
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one notification kind.
    pub fn subscribe<F>(&self, kind: NotificationKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.insert(Some(kind), Arc::new(handler))
    }

    /// Registers a handler for every notification kind.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.insert(None, Arc::new(handler))
    }

    /// Returns a channel receiving every notification from now on.
    ///
    /// The subscription removes itself once the receiver is dropped.
    pub fn channel(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Weak, so the subscription does not keep its own registry alive.
        let registry = Arc::downgrade(&self.registry);
        let id = Arc::new(Mutex::new(None::<SubscriptionId>));
        let own_id = Arc::clone(&id);

        let subscription = self.subscribe_all(move |notification| {
            if tx.send(notification.clone()).is_err() {
                let stale = *own_id.lock().unwrap_or_else(|e| e.into_inner());
                if let (Some(stale), Some(registry)) = (stale, registry.upgrade()) {
                    EventBus { registry }.unsubscribe(stale);
                }
            }
        });
        *id.lock().unwrap_or_else(|e| e.into_inner()) = Some(subscription);

        rx
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.lock();
        let before = registry.subscribers.len();
        registry.subscribers.retain(|s| s.id != id);
        before != registry.subscribers.len()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Delivers a notification to every matching subscriber.
    pub fn emit(&self, notification: &Notification) {
        let kind = notification.kind();
        let handlers: Vec<Handler> = self
            .lock()
            .subscribers
            .iter()
            .filter(|s| s.filter.is_none_or(|f| f == kind))
            .map(|s| Arc::clone(&s.handler))
            .collect();

        trace!(?kind, handlers = handlers.len(), "Emitting notification");

        for handler in handlers {
            handler(notification);
        }
    }

    fn insert(&self, filter: Option<NotificationKind>, handler: Handler) -> SubscriptionId {
        let mut registry = self.lock();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.subscribers.push(Subscriber {
            id,
            filter,
            handler,
        });
        id
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| {
            error!("Event bus lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}
