// ── State notifier ──
//
// Runs the notification action in one long-lived session and routes each
// polled record to the subscriber registered for its interface name.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use routerctl_api::ConnectionFactory;

use crate::action::{DEFAULT_POLL_INTERVAL, RouterAction, UpdateCallback};
use crate::error::CoreError;
use crate::executor::ExecutorFactory;
use crate::model::RouterInterface;
use crate::registry::{InterfaceObserver, ObserverRegistry, Subscription};

/// Per-interface update fan-out over a polling session.
pub struct StateNotifier<F: ConnectionFactory> {
    executors: ExecutorFactory<F>,
    registry: Arc<ObserverRegistry>,
    poll_interval: Duration,
}

impl<F: ConnectionFactory> StateNotifier<F> {
    pub fn new(executors: ExecutorFactory<F>) -> Self {
        Self {
            executors,
            registry: Arc::new(ObserverRegistry::default()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Register `observer` for `interface_name`.
    ///
    /// Fails if the name already has a subscriber; the existing one is
    /// left untouched.
    pub fn subscribe(
        &self,
        observer: impl InterfaceObserver + 'static,
        interface_name: impl Into<String>,
    ) -> Result<Subscription, CoreError> {
        self.registry
            .subscribe(Arc::new(observer), interface_name.into())
    }

    /// Like [`subscribe`](Self::subscribe), delivering records through a
    /// channel instead of a callback.
    pub fn subscribe_channel(
        &self,
        interface_name: impl Into<String>,
    ) -> Result<(Subscription, mpsc::UnboundedReceiver<RouterInterface>), CoreError> {
        self.registry.subscribe_channel(interface_name.into())
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Poll until `cancel` fires, dispatching every record to its
    /// subscriber. Returns once the session has logged out.
    pub async fn start_notifications(&self, cancel: CancellationToken) -> Result<(), CoreError> {
        let registry = Arc::clone(&self.registry);
        let on_update: UpdateCallback = Arc::new(move |interfaces: &[RouterInterface]| {
            let delivered = registry.dispatch(interfaces);
            debug!(records = interfaces.len(), delivered, "interface update dispatched");
        });

        info!(poll_interval = ?self.poll_interval, "starting interface notifications");
        let action = RouterAction::NotifyInterfaceUpdates {
            cancel,
            poll_interval: self.poll_interval,
            on_update,
        };
        self.executors.create().execute(action, None).await?;
        info!("interface notifications stopped");
        Ok(())
    }

    /// One-shot correlated fetch in its own session.
    pub async fn get_interfaces_info(&self) -> Result<Vec<RouterInterface>, CoreError> {
        self.executors
            .create()
            .execute(RouterAction::FetchAllInterfaces, None)
            .await?
            .into_interfaces()
    }
}
