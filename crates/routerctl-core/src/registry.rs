// ── Observer registry ──
//
// Maps an interface name to at most one observer. Subscribing, dropping a
// subscription and dispatching all go through the same mutex, so a
// dispatch never races a map change.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::model::RouterInterface;

/// Receives updates for one interface.
///
/// Called with the registry lock held: an observer must not subscribe or
/// drop a subscription from inside `on_update`.
pub trait InterfaceObserver: Send + Sync {
    fn on_update(&self, interface: &RouterInterface);
}

impl<F> InterfaceObserver for F
where
    F: Fn(&RouterInterface) + Send + Sync,
{
    fn on_update(&self, interface: &RouterInterface) {
        self(interface);
    }
}

/// Forwards updates into an unbounded channel. A closed receiver just
/// stops the flow; the subscription stays until its handle is dropped.
struct ChannelObserver {
    tx: mpsc::UnboundedSender<RouterInterface>,
}

impl InterfaceObserver for ChannelObserver {
    fn on_update(&self, interface: &RouterInterface) {
        if self.tx.send(interface.clone()).is_err() {
            trace!(interface = %interface.name, "update receiver closed");
        }
    }
}

struct Registration {
    id: u64,
    observer: Arc<dyn InterfaceObserver>,
}

#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Mutex<HashMap<String, Registration>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Registration>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribe(
        self: &Arc<Self>,
        observer: Arc<dyn InterfaceObserver>,
        name: String,
    ) -> Result<Subscription, CoreError> {
        if name.is_empty() {
            return Err(CoreError::EmptyInterfaceName);
        }

        let mut observers = self.lock();
        match observers.entry(name) {
            Entry::Occupied(entry) => Err(CoreError::AlreadySubscribed {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let name = entry.key().clone();
                entry.insert(Registration { id, observer });
                debug!(interface = %name, id, "subscriber added");
                Ok(Subscription {
                    registry: Arc::clone(self),
                    name,
                    id,
                })
            }
        }
    }

    pub(crate) fn subscribe_channel(
        self: &Arc<Self>,
        name: String,
    ) -> Result<(Subscription, mpsc::UnboundedReceiver<RouterInterface>), CoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(Arc::new(ChannelObserver { tx }), name)?;
        Ok((subscription, rx))
    }

    /// Remove `name` only if it still belongs to registration `id`.
    fn unsubscribe(&self, name: &str, id: u64) {
        let mut observers = self.lock();
        if observers.get(name).is_some_and(|r| r.id == id) {
            observers.remove(name);
            debug!(interface = %name, id, "subscriber removed");
        }
    }

    /// Hand every record to its subscriber, if any. Returns how many
    /// records were delivered.
    pub(crate) fn dispatch(&self, interfaces: &[RouterInterface]) -> usize {
        let observers = self.lock();
        let mut delivered = 0;
        for interface in interfaces {
            if let Some(registration) = observers.get(&interface.name) {
                registration.observer.on_update(interface);
                delivered += 1;
            }
        }
        delivered
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Live subscription. Dropping it removes the subscriber.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Arc<ObserverRegistry>,
    name: String,
    id: u64,
}

impl Subscription {
    pub fn interface_name(&self) -> &str {
        &self.name
    }

    /// Unsubscribe now rather than at end of scope.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.name, self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, Arc<dyn InterfaceObserver>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let observer = move |_: &RouterInterface| {
            seen.fetch_add(1, Ordering::SeqCst);
        };
        (count, Arc::new(observer))
    }

    #[test]
    fn duplicate_name_keeps_first_subscriber() {
        let registry = Arc::new(ObserverRegistry::default());
        let (first, observer) = counter();
        let _sub = registry.subscribe(observer, "ether1".into()).unwrap();

        let (second, observer) = counter();
        let err = registry.subscribe(observer, "ether1".into()).unwrap_err();
        assert!(matches!(err, CoreError::AlreadySubscribed { ref name } if name == "ether1"));

        registry.dispatch(&[RouterInterface::bare(true, "ether1")]);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stale_handle_does_not_remove_newer_subscriber() {
        let registry = Arc::new(ObserverRegistry::default());
        let (_, observer) = counter();
        let old = registry.subscribe(observer, "ether1".into()).unwrap();
        let (old_name, old_id) = (old.name.clone(), old.id);
        drop(old);

        let (count, observer) = counter();
        let _new = registry.subscribe(observer, "ether1".into()).unwrap();
        registry.unsubscribe(&old_name, old_id);

        assert_eq!(registry.len(), 1);
        registry.dispatch(&[RouterInterface::bare(true, "ether1")]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_names_are_dropped() {
        let registry = Arc::new(ObserverRegistry::default());
        let (count, observer) = counter();
        let _sub = registry.subscribe(observer, "ether2".into()).unwrap();

        let delivered = registry.dispatch(&[
            RouterInterface::bare(true, "ether1"),
            RouterInterface::bare(true, "ether2"),
            RouterInterface::bare(true, "ether3"),
        ]);
        assert_eq!(delivered, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_name_is_rejected() {
        let registry = Arc::new(ObserverRegistry::default());
        let (_, observer) = counter();
        assert!(matches!(
            registry.subscribe(observer, String::new()),
            Err(CoreError::EmptyInterfaceName)
        ));
    }

    #[test]
    fn channel_observer_forwards_records() {
        let registry = Arc::new(ObserverRegistry::default());
        let (_sub, mut rx) = registry.subscribe_channel("ether1".into()).unwrap();

        let record = RouterInterface::with_mac(true, "ether1", "AA:BB");
        registry.dispatch(std::slice::from_ref(&record));
        assert_eq!(rx.try_recv().unwrap(), record);
    }
}
