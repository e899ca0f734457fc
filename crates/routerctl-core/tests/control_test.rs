// Tests for `RouterControl` against the scripted router.
#![allow(clippy::unwrap_used)]

mod support;

use pretty_assertions::assert_eq;

use routerctl_api::Row;
use routerctl_core::{CoreError, DataIntegrityError, RouterControl, SessionSettings};

use support::{executors, progress_log, settings, Call, FakeRouter, INTERFACES};

const STATUS_CMD: &str =
    "/interface/print =.proplist=disabled ?name=pppoe-out1 ?name=ether1 ?#|";

fn status_row(disabled: &str) -> Row {
    Row::new().with("disabled", disabled)
}

fn control(router: &FakeRouter) -> RouterControl<FakeRouter> {
    RouterControl::new(executors(router, settings()))
}

// ── Connection state ────────────────────────────────────────────────

#[tokio::test]
async fn test_both_enabled() {
    let router = FakeRouter::new();
    router.table(INTERFACES, vec![status_row("false"), status_row("false")]);

    assert!(control(&router).connection_state().await.unwrap());
    assert_eq!(router.commands(), vec![STATUS_CMD]);
}

#[tokio::test]
async fn test_one_disabled_means_disconnected() {
    let router = FakeRouter::new();
    router.table(INTERFACES, vec![status_row("false"), status_row("true")]);

    assert!(!control(&router).connection_state().await.unwrap());
}

#[tokio::test]
async fn test_wrong_row_count_is_rejected() {
    for rows in [
        vec![status_row("false")],
        vec![status_row("false"), status_row("false"), status_row("false")],
    ] {
        let router = FakeRouter::new();
        let expected = rows.len();
        router.table(INTERFACES, rows);

        let err = control(&router).connection_state().await.unwrap_err();
        assert_eq!(
            err.data_integrity(),
            Some(&DataIntegrityError::UnexpectedRowCount {
                expected: "2",
                actual: expected,
            })
        );
        assert_eq!(router.count(&Call::Close), 1);
    }
}

#[tokio::test]
async fn test_missing_disabled_flag_is_rejected() {
    let router = FakeRouter::new();
    router.table(INTERFACES, vec![status_row("false"), Row::new()]);

    let err = control(&router).connection_state().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::DataIntegrity(DataIntegrityError::MissingField {
            field: "disabled",
            ..
        })
    ));
}

#[tokio::test]
async fn test_invalid_settings_report_disconnected_without_io() {
    let router = FakeRouter::new();
    let control = RouterControl::new(executors(&router, SessionSettings::default()));

    assert!(!control.connection_state().await.unwrap());
    assert!(router.journal().is_empty());
}

// ── State changes ───────────────────────────────────────────────────

#[tokio::test]
async fn test_change_state_reports_progress() {
    let router = FakeRouter::new();
    let (log, progress) = progress_log();

    control(&router)
        .change_connection_state(false, progress)
        .await
        .unwrap();

    assert_eq!(
        router.commands(),
        vec![
            "/interface/set =disabled=true =.id=pppoe-out1",
            "/interface/set =disabled=true =.id=ether1",
        ]
    );
    let messages = log.messages();
    assert_eq!(messages[4], "Disabling interface pppoe-out1...");
    assert_eq!(messages[6], "Disabling interface ether1...");
}

#[tokio::test]
async fn test_change_state_with_invalid_settings_fails() {
    let router = FakeRouter::new();
    let control = RouterControl::new(executors(&router, SessionSettings::default()));

    let err = control.change_connection_state(true, None).await.unwrap_err();
    assert!(matches!(err, CoreError::SettingsInvalid { .. }));
    assert!(router.journal().is_empty());
}
