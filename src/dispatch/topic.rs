use crate::event::Category;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

/// What a listener returns. An `Err` is logged and does not stop delivery to
/// the listeners after it.
pub type ListenerResult = anyhow::Result<()>;

type Listener<E> = Arc<dyn Fn(&E) -> ListenerResult + Send + Sync>;

/// Handle returned by [`Topic::subscribe`], used to unsubscribe. Unique
/// across all topics in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of one [`Topic::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub faulted: usize,
}

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

struct Registry<E> {
    listeners: Vec<(ListenerId, Listener<E>)>,
}

/// Ordered set of listeners for one event type.
///
/// Clones share the same registry. `publish` delivers over a snapshot taken
/// when it starts, so listeners may subscribe or unsubscribe (on this topic
/// or any other) from inside a callback.
pub struct Topic<E> {
    category: Category,
    inner: Arc<Mutex<Registry<E>>>,
}

impl<E> Clone for Topic<E> {
    fn clone(&self) -> Self {
        Self {
            category: self.category,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for Topic<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("category", &self.category)
            .field("listeners", &self.len())
            .finish()
    }
}

impl<E> Topic<E> {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            inner: Arc::new(Mutex::new(Registry {
                listeners: Vec::new(),
            })),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) -> ListenerResult + Send + Sync + 'static,
    {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, AtomicOrdering::Relaxed));
        self.inner.lock().listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut registry = self.inner.lock();
        let before = registry.listeners.len();
        registry.listeners.retain(|(lid, _)| *lid != id);
        registry.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener subscribed when the call starts, in
    /// subscription order. Errors and panics are contained per listener.
    pub fn publish(&self, event: &E) -> Delivery {
        let snapshot: Vec<(ListenerId, Listener<E>)> = self.inner.lock().listeners.clone();

        let mut delivery = Delivery::default();
        for (id, listener) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => delivery.delivered += 1,
                Ok(Err(e)) => {
                    delivery.faulted += 1;
                    tracing::warn!(category = %self.category, listener = %id, error = %e, "listener failed");
                }
                Err(payload) => {
                    delivery.faulted += 1;
                    tracing::warn!(
                        category = %self.category,
                        listener = %id,
                        panic = panic_message(payload.as_ref()),
                        "listener panicked"
                    );
                }
            }
        }
        delivery
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let topic: Topic<u32> = Topic::new(Category::Connection);
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            topic.subscribe(move |n: &u32| {
                seen.lock().push(format!("{}{}", tag, n));
                Ok(())
            });
        }
        let delivery = topic.publish(&7);
        assert_eq!(delivery, Delivery { delivered: 3, faulted: 0 });
        assert_eq!(*seen.lock(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn test_failing_listener_does_not_block_others() {
        let topic: Topic<()> = Topic::new(Category::PrivateMessage);
        let hits = counter();
        topic.subscribe(|_| anyhow::bail!("always fails"));
        let h = Arc::clone(&hits);
        topic.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let delivery = topic.publish(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(delivery, Delivery { delivered: 1, faulted: 1 });
    }

    #[test]
    fn test_panicking_listener_is_contained() {
        let topic: Topic<()> = Topic::new(Category::Ctcp);
        let hits = counter();
        topic.subscribe(|_| panic!("boom"));
        let h = Arc::clone(&hits);
        topic.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let delivery = topic.publish(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(delivery.faulted, 1);
    }

    #[test]
    fn test_unsubscribe() {
        let topic: Topic<()> = Topic::new(Category::Unexpected);
        let hits = counter();
        let h = Arc::clone(&hits);
        let id = topic.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(topic.unsubscribe(id));
        assert!(!topic.unsubscribe(id));
        topic.publish(&());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(topic.is_empty());
    }

    #[test]
    fn test_reentrant_subscribe_applies_to_next_publish() {
        let topic: Topic<()> = Topic::new(Category::Connection);
        let late_hits = counter();

        let handle = topic.clone();
        let late = Arc::clone(&late_hits);
        topic.subscribe(move |_| {
            let late = Arc::clone(&late);
            handle.subscribe(move |_| {
                late.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        let first = topic.publish(&());
        assert_eq!(first.delivered, 1);
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);

        topic.publish(&());
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_unsubscribe_does_not_skip_others() {
        let topic: Topic<()> = Topic::new(Category::Connection);
        let hits = counter();

        // The first listener removes itself; the two after it must still run
        // exactly once in the same publish.
        let handle = topic.clone();
        let own_id = Arc::new(Mutex::new(None::<ListenerId>));
        let own = Arc::clone(&own_id);
        let id = topic.subscribe(move |_| {
            if let Some(id) = *own.lock() {
                handle.unsubscribe(id);
            }
            Ok(())
        });
        *own_id.lock() = Some(id);

        for _ in 0..2 {
            let h = Arc::clone(&hits);
            topic.subscribe(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let delivery = topic.publish(&());
        assert_eq!(delivery.delivered, 3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(topic.len(), 2);

        topic.publish(&());
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
