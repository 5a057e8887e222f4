//! # Subscription Hub
//!
//! Topic-keyed observer registry. A topic is either one entity id or the
//! wildcard [`Topic::Design`], whose listeners receive the whole design on
//! every change.
//!
//! `subscribe` hands back a [`Subscription`]; dropping it (or calling
//! [`Subscription::unsubscribe`]) removes exactly that listener, and the
//! topic disappears once its last listener is gone.
//!
//! Listeners run outside any internal borrow, so a listener may subscribe
//! or drop subscriptions while being notified.

use crate::document::{Component, Design, Id, Screen};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// What a listener is registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Every change, delivered as the whole design
    Design,
    /// Changes to one screen or component
    Entity(Id),
}

impl From<Id> for Topic {
    fn from(id: Id) -> Self {
        Topic::Entity(id)
    }
}

/// Payload delivered to listeners
#[derive(Debug, Clone, Copy)]
pub enum Update<'a> {
    Design(&'a Design),
    Component(&'a Component),
    Screen(&'a Screen),
    /// The entity no longer exists
    Removed(Id),
}

type Listener = Rc<RefCell<dyn FnMut(&Update<'_>)>>;

#[derive(Default)]
struct Listeners {
    next_key: u64,
    topics: HashMap<Topic, Vec<(u64, Listener)>>,
}

/// Registry of listeners by topic
#[derive(Default)]
pub struct SubscriptionHub {
    inner: Rc<RefCell<Listeners>>,
}

impl std::fmt::Debug for SubscriptionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("topics", &self.topics())
            .finish()
    }
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> Subscription
    where
        F: FnMut(&Update<'_>) + 'static,
    {
        let listener: Listener = Rc::new(RefCell::new(callback));
        let mut inner = self.inner.borrow_mut();
        let key = inner.next_key;
        inner.next_key += 1;
        inner.topics.entry(topic).or_default().push((key, listener));

        Subscription {
            hub: Rc::downgrade(&self.inner),
            topic,
            key,
        }
    }

    /// Invoke every listener registered for `topic`
    pub fn notify(&self, topic: Topic, update: &Update<'_>) {
        let listeners: Vec<Listener> = {
            let inner = self.inner.borrow();
            match inner.topics.get(&topic) {
                Some(listeners) => listeners.iter().map(|(_, l)| Rc::clone(l)).collect(),
                None => return,
            }
        };

        for listener in listeners {
            // A listener that is already running is not re-entered
            if let Ok(mut callback) = listener.try_borrow_mut() {
                (&mut *callback)(update);
            }
        }
    }

    /// Re-publish current state to every topic after a wholesale
    /// replacement: entity topics get their entity if it still exists,
    /// the wildcard always gets the design.
    pub fn notify_all(&self, design: &Design) {
        for topic in self.topics() {
            match topic {
                Topic::Design => self.notify(topic, &Update::Design(design)),
                Topic::Entity(id) => {
                    if let Some(component) = design.components.get(&id) {
                        self.notify(topic, &Update::Component(component));
                    } else if let Some(screen) = design.screens.get(&id) {
                        self.notify(topic, &Update::Screen(screen));
                    }
                }
            }
        }
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.inner.borrow().topics.keys().copied().collect()
    }

    pub fn listener_count(&self, topic: Topic) -> usize {
        self.inner
            .borrow()
            .topics
            .get(&topic)
            .map_or(0, Vec::len)
    }

    /// Drop every listener; outstanding handles become no-ops
    pub fn clear(&self) {
        self.inner.borrow_mut().topics.clear();
    }
}

/// Handle for one registered listener
#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    hub: Weak<RefCell<Listeners>>,
    topic: Topic,
    key: u64,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn unsubscribe(self) {}
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("key", &self.key)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.hub.upgrade() else {
            return;
        };
        let Ok(mut inner) = inner.try_borrow_mut() else {
            return;
        };
        if let Some(listeners) = inner.topics.get_mut(&self.topic) {
            listeners.retain(|(key, _)| *key != self.key);
            if listeners.is_empty() {
                inner.topics.remove(&self.topic);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<RefCell<Vec<String>>>, impl FnMut(&Update<'_>) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let callback = move |update: &Update<'_>| {
            let label = match update {
                Update::Design(d) => format!("design:{}", d.name),
                Update::Component(c) => format!("component:{}", c.id),
                Update::Screen(s) => format!("screen:{}", s.id),
                Update::Removed(id) => format!("removed:{id}"),
            };
            sink.borrow_mut().push(label);
        };
        (seen, callback)
    }

    #[test]
    fn test_notify_reaches_topic_listeners_only() {
        let hub = SubscriptionHub::new();
        let design = Design::new("d");
        let (seen_two, on_two) = counter();
        let (seen_one, on_one) = counter();
        let _two = hub.subscribe(Topic::Entity(2), on_two);
        let _one = hub.subscribe(Topic::Entity(1), on_one);

        hub.notify(Topic::Entity(2), &Update::Component(&design.components[&2]));

        assert_eq!(*seen_two.borrow(), vec!["component:2"]);
        assert!(seen_one.borrow().is_empty());
    }

    #[test]
    fn test_drop_removes_listener_and_topic() {
        let hub = SubscriptionHub::new();
        let (_, first) = counter();
        let (_, second) = counter();

        let a = hub.subscribe(Topic::Entity(2), first);
        let b = hub.subscribe(Topic::Entity(2), second);
        assert_eq!(hub.listener_count(Topic::Entity(2)), 2);

        a.unsubscribe();
        assert_eq!(hub.listener_count(Topic::Entity(2)), 1);

        drop(b);
        assert!(hub.topics().is_empty());
    }

    #[test]
    fn test_notify_all_skips_missing_entities() {
        let hub = SubscriptionHub::new();
        let design = Design::new("d");
        let (seen, callback) = counter();
        let (seen_missing, missing) = counter();
        let (seen_all, all) = counter();

        let _a = hub.subscribe(Topic::Entity(1), callback);
        let _b = hub.subscribe(Topic::Entity(77), missing);
        let _c = hub.subscribe(Topic::Design, all);

        hub.notify_all(&design);

        assert_eq!(*seen.borrow(), vec!["screen:1"]);
        assert!(seen_missing.borrow().is_empty());
        assert_eq!(*seen_all.borrow(), vec!["design:d"]);
    }

    #[test]
    fn test_listener_can_subscribe_while_notified() {
        let hub = Rc::new(SubscriptionHub::new());
        let design = Design::new("d");
        let extra: Rc<RefCell<Vec<Subscription>>> = Rc::default();

        let hub_ref = Rc::clone(&hub);
        let extra_ref = Rc::clone(&extra);
        let _s = hub.subscribe(Topic::Design, move |_| {
            let sub = hub_ref.subscribe(Topic::Entity(5), |_| {});
            extra_ref.borrow_mut().push(sub);
        });

        hub.notify(Topic::Design, &Update::Design(&design));
        assert_eq!(hub.listener_count(Topic::Entity(5)), 1);

        extra.borrow_mut().clear();
        assert_eq!(hub.listener_count(Topic::Entity(5)), 0);
    }

    #[test]
    fn test_clear_makes_handles_inert() {
        let hub = SubscriptionHub::new();
        let sub = hub.subscribe(Topic::Design, |_| {});
        hub.clear();

        let fresh = hub.subscribe(Topic::Design, |_| {});
        drop(sub);
        assert_eq!(hub.listener_count(Topic::Design), 1);
        drop(fresh);
    }
}
