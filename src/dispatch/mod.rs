//! Listener registries and event fan-out.

pub mod topic;

pub use topic::{Delivery, ListenerId, ListenerResult, Topic};

use crate::event::{Category, ConnectionEvent, CtcpEvent, PrivateMessageEvent, UnexpectedEvent};

/// One [`Topic`] per event category. Cloning shares the registries.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    connection: Topic<ConnectionEvent>,
    private_message: Topic<PrivateMessageEvent>,
    ctcp: Topic<CtcpEvent>,
    unexpected: Topic<UnexpectedEvent>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            connection: Topic::new(Category::Connection),
            private_message: Topic::new(Category::PrivateMessage),
            ctcp: Topic::new(Category::Ctcp),
            unexpected: Topic::new(Category::Unexpected),
        }
    }

    pub fn connection(&self) -> &Topic<ConnectionEvent> {
        &self.connection
    }

    pub fn private_message(&self) -> &Topic<PrivateMessageEvent> {
        &self.private_message
    }

    pub fn ctcp(&self) -> &Topic<CtcpEvent> {
        &self.ctcp
    }

    pub fn unexpected(&self) -> &Topic<UnexpectedEvent> {
        &self.unexpected
    }

    /// Remove a listener from the given category.
    pub fn unsubscribe(&self, category: Category, id: ListenerId) -> bool {
        match category {
            Category::Connection => self.connection.unsubscribe(id),
            Category::PrivateMessage => self.private_message.unsubscribe(id),
            Category::Ctcp => self.ctcp.unsubscribe(id),
            Category::Unexpected => self.unexpected.unsubscribe(id),
        }
    }

    pub fn listener_count(&self, category: Category) -> usize {
        match category {
            Category::Connection => self.connection.len(),
            Category::PrivateMessage => self.private_message.len(),
            Category::Ctcp => self.ctcp.len(),
            Category::Unexpected => self.unexpected.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_categories_are_independent() {
        let dispatcher = Dispatcher::new();
        let unexpected_hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&unexpected_hits);
        dispatcher.unexpected().subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let delivery = dispatcher.connection().publish(&ConnectionEvent::Established);
        assert_eq!(delivery.delivered, 0);
        assert_eq!(unexpected_hits.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.listener_count(Category::Unexpected), 1);
        assert_eq!(dispatcher.listener_count(Category::Connection), 0);
    }

    #[test]
    fn test_unsubscribe_by_category() {
        let dispatcher = Dispatcher::new();
        let id = dispatcher.ctcp().subscribe(|_| Ok(()));
        dispatcher.connection().subscribe(|_| Ok(()));
        assert!(!dispatcher.unsubscribe(Category::Connection, id));
        assert!(dispatcher.unsubscribe(Category::Ctcp, id));
        assert_eq!(dispatcher.listener_count(Category::Connection), 1);
        assert_eq!(dispatcher.listener_count(Category::Ctcp), 0);
    }

    #[test]
    fn test_clones_share_registries() {
        let dispatcher = Dispatcher::new();
        let other = dispatcher.clone();
        other.private_message().subscribe(|_| Ok(()));
        assert_eq!(dispatcher.listener_count(Category::PrivateMessage), 1);
    }
}
