// Tests for `ConnectivityMonitor` with a scripted probe, and the public
// address lookup against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use routerctl_api::{Error as ApiError, PublicIpClient};
use routerctl_core::{public_ip, ConnectivityMonitor, CoreError, ReachabilityProbe, Stage};

// ── Helpers ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct ScriptedProbe {
    answers: Arc<Mutex<VecDeque<Result<bool, ApiError>>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedProbe {
    fn answering(answers: impl IntoIterator<Item = Result<bool, ApiError>>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().collect())),
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ReachabilityProbe for ScriptedProbe {
    async fn probe(&self) -> Result<bool, ApiError> {
        *self.calls.lock().unwrap() += 1;
        let answer = self.answers.lock().unwrap().pop_front();
        answer.unwrap_or(Ok(true))
    }
}

// ── Monitor ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_only_changes_are_published() {
    let probe = ScriptedProbe::answering([Ok(true), Ok(true), Ok(false), Ok(false), Ok(true)]);
    let monitor = ConnectivityMonitor::new(probe);
    let mut rx = monitor.subscribe();
    assert_eq!(monitor.current(), None);

    let mut published = Vec::new();
    for _ in 0..5 {
        monitor.check().await.unwrap();
        if rx.has_changed().unwrap() {
            published.push(*rx.borrow_and_update());
        }
    }

    assert_eq!(published, vec![Some(true), Some(false), Some(true)]);
    assert_eq!(monitor.current(), Some(true));
}

#[tokio::test]
async fn test_probe_failure_is_a_connectivity_error() {
    let probe = ScriptedProbe::answering([Err(ApiError::NotConnected)]);
    let monitor = ConnectivityMonitor::new(probe);

    let err = monitor.check().await.unwrap_err();
    assert!(matches!(err, CoreError::Connectivity { .. }), "got {err:?}");
    assert_eq!(err.stage(), Stage::Connectivity);
    assert_eq!(monitor.current(), None);
}

#[tokio::test(start_paused = true)]
async fn test_run_probes_once_per_interval_until_cancelled() {
    let probe = ScriptedProbe::default();
    let monitor = Arc::new(
        ConnectivityMonitor::new(probe.clone()).with_interval(Duration::from_millis(500)),
    );

    let cancel = CancellationToken::new();
    let task = tokio::spawn({
        let monitor = Arc::clone(&monitor);
        let cancel = cancel.clone();
        async move { monitor.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(1_750)).await;
    cancel.cancel();
    task.await.unwrap().unwrap();

    assert_eq!(probe.calls(), 3);
    assert_eq!(monitor.current(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_on_probe_failure() {
    let probe = ScriptedProbe::answering([Ok(true), Err(ApiError::Timeout { timeout_secs: 2 })]);
    let monitor = ConnectivityMonitor::new(probe.clone());

    let err = monitor.run(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, CoreError::Connectivity { .. }));
    assert_eq!(probe.calls(), 2);
}

// ── Public address ──────────────────────────────────────────────────

#[tokio::test]
async fn test_public_ip_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.50\n"))
        .mount(&server)
        .await;

    let client = PublicIpClient::new(&format!("{}/ip", server.uri()), Duration::from_secs(5)).unwrap();
    let ip = public_ip(&client).await.unwrap();
    assert_eq!(ip, "203.0.113.50".parse::<std::net::IpAddr>().unwrap());
}

#[tokio::test]
async fn test_public_ip_garbage_is_wrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not an address"))
        .mount(&server)
        .await;

    let client = PublicIpClient::new(&format!("{}/ip", server.uri()), Duration::from_secs(5)).unwrap();
    let err = public_ip(&client).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::PublicIp {
            source: ApiError::InvalidIpResponse { .. }
        }
    ));
}
