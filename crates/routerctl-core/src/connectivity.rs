// ── Connectivity monitor ──
//
// Periodically asks a reachability probe whether the outside world
// answers and publishes the result on a watch channel, only when it
// changes. Also exposes the public address lookup.

use std::future::Future;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use routerctl_api::{Error as ApiError, PublicIpClient};

use crate::error::CoreError;

/// Default delay between two probes.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Public DNS resolver used as the default reachability target.
pub const DEFAULT_PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);

/// Answers "is the network reachable right now?".
///
/// `Ok(false)` means unreachable; `Err` means the check itself could not
/// be performed.
pub trait ReachabilityProbe: Send + Sync + 'static {
    fn probe(&self) -> impl Future<Output = Result<bool, ApiError>> + Send;
}

/// Reachability through a timed TCP connect.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    target: SocketAddr,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(target: SocketAddr, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TARGET, Duration::from_secs(2))
    }
}

impl ReachabilityProbe for TcpProbe {
    async fn probe(&self) -> Result<bool, ApiError> {
        match tokio::time::timeout(self.timeout, TcpStream::connect(self.target)).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) if is_unreachable(e.kind()) => Ok(false),
            Ok(Err(e)) => Err(ApiError::Io(e)),
            Err(_elapsed) => Ok(false),
        }
    }
}

fn is_unreachable(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NetworkUnreachable
            | ErrorKind::HostUnreachable
            | ErrorKind::NetworkDown
            | ErrorKind::TimedOut
    )
}

/// Polls a probe and publishes reachability changes.
///
/// Receivers see `None` until the first probe completes.
pub struct ConnectivityMonitor<P: ReachabilityProbe> {
    probe: P,
    interval: Duration,
    state: watch::Sender<Option<bool>>,
}

impl<P: ReachabilityProbe> ConnectivityMonitor<P> {
    pub fn new(probe: P) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            probe,
            interval: DEFAULT_PROBE_INTERVAL,
            state,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<bool>> {
        self.state.subscribe()
    }

    /// Last published state.
    pub fn current(&self) -> Option<bool> {
        *self.state.borrow()
    }

    /// Probe once and publish the result if it differs from the last one.
    pub async fn check(&self) -> Result<bool, CoreError> {
        let reachable = self
            .probe
            .probe()
            .await
            .map_err(|source| CoreError::Connectivity { source })?;

        let changed = self.state.send_if_modified(|current| {
            if *current == Some(reachable) {
                false
            } else {
                *current = Some(reachable);
                true
            }
        });
        if changed {
            info!(reachable, "network reachability changed");
        }
        Ok(reachable)
    }

    /// Probe once per interval until `cancel` fires. A probe failure ends
    /// the loop with that error.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), CoreError> {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(self.interval) => {}
            }

            if cancel.is_cancelled() {
                debug!("connectivity monitor cancelled");
                return Ok(());
            }

            self.check().await?;
        }
    }
}

/// The address the outside world sees for this network.
pub async fn public_ip(client: &PublicIpClient) -> Result<IpAddr, CoreError> {
    client
        .fetch()
        .await
        .map_err(|source| CoreError::PublicIp { source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn refused_and_unreachable_mean_offline() {
        assert!(is_unreachable(ErrorKind::ConnectionRefused));
        assert!(is_unreachable(ErrorKind::HostUnreachable));
        assert!(!is_unreachable(ErrorKind::PermissionDenied));
    }

    #[tokio::test]
    async fn tcp_probe_reaches_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let probe = TcpProbe::new(listener.local_addr().unwrap(), Duration::from_secs(1));
        assert!(probe.probe().await.unwrap());
    }

    #[tokio::test]
    async fn tcp_probe_reports_closed_port_as_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap();
        drop(listener);

        let probe = TcpProbe::new(target, Duration::from_secs(1));
        assert!(!probe.probe().await.unwrap());
    }
}
