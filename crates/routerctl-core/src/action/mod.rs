// ── Router actions ──
//
// The unit of work run inside one session. The executor hands every
// action a live API handle, the settings snapshot and an optional progress
// sink; the action decides which commands to send and what to return.
// Errors raised here reach the caller as-is.

mod interfaces;
mod notify;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use routerctl_api::{Command, RouterApi};

use crate::correlator;
use crate::error::CoreError;
use crate::model::RouterInterface;
use crate::progress::Progress;
use crate::settings::SessionSettings;

/// Default delay between two notification polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Callback receiving every freshly polled interface list.
pub type UpdateCallback = Arc<dyn Fn(&[RouterInterface]) + Send + Sync>;

/// Work executed inside a session.
pub enum RouterAction {
    /// Enable or disable both uplinks, PPPoE first.
    ChangeInterfacesState { enable: bool },

    /// Read the `disabled` flag of both uplinks.
    RequestInterfacesStatus,

    /// Poll the correlated interface view until `cancel` fires.
    NotifyInterfaceUpdates {
        cancel: CancellationToken,
        poll_interval: Duration,
        on_update: UpdateCallback,
    },

    /// Correlate the interface view once.
    FetchAllInterfaces,
}

impl RouterAction {
    /// Notification action polling at [`DEFAULT_POLL_INTERVAL`].
    pub fn notify(
        cancel: CancellationToken,
        on_update: impl Fn(&[RouterInterface]) + Send + Sync + 'static,
    ) -> Self {
        Self::NotifyInterfaceUpdates {
            cancel,
            poll_interval: DEFAULT_POLL_INTERVAL,
            on_update: Arc::new(on_update),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ChangeInterfacesState { .. } => "change_interfaces_state",
            Self::RequestInterfacesStatus => "request_interfaces_status",
            Self::NotifyInterfaceUpdates { .. } => "notify_interface_updates",
            Self::FetchAllInterfaces => "fetch_all_interfaces",
        }
    }

    /// Run the action against an authenticated API handle.
    pub(crate) async fn execute<A: RouterApi>(
        &self,
        api: &mut A,
        settings: &SessionSettings,
        progress: Option<&dyn Progress>,
    ) -> Result<ActionOutcome, CoreError> {
        match self {
            Self::ChangeInterfacesState { enable } => {
                interfaces::change_state(api, &settings.interfaces, *enable, progress).await?;
                Ok(ActionOutcome::Completed)
            }
            Self::RequestInterfacesStatus => {
                let all_enabled = interfaces::request_status(api, &settings.interfaces).await?;
                Ok(ActionOutcome::InterfacesStatus { all_enabled })
            }
            Self::NotifyInterfaceUpdates {
                cancel,
                poll_interval,
                on_update,
            } => {
                notify::poll_until_cancelled(api, cancel, *poll_interval, on_update.as_ref())
                    .await?;
                Ok(ActionOutcome::Completed)
            }
            Self::FetchAllInterfaces => correlator::fetch_interfaces(api)
                .await
                .map(ActionOutcome::Interfaces),
        }
    }
}

impl fmt::Debug for RouterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeInterfacesState { enable } => f
                .debug_struct("ChangeInterfacesState")
                .field("enable", enable)
                .finish(),
            Self::NotifyInterfaceUpdates {
                cancel,
                poll_interval,
                ..
            } => f
                .debug_struct("NotifyInterfaceUpdates")
                .field("cancelled", &cancel.is_cancelled())
                .field("poll_interval", poll_interval)
                .finish_non_exhaustive(),
            Self::RequestInterfacesStatus => f.write_str("RequestInterfacesStatus"),
            Self::FetchAllInterfaces => f.write_str("FetchAllInterfaces"),
        }
    }
}

/// What an action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    InterfacesStatus { all_enabled: bool },
    Interfaces(Vec<RouterInterface>),
}

impl ActionOutcome {
    pub fn into_status(self) -> Result<bool, CoreError> {
        match self {
            Self::InterfacesStatus { all_enabled } => Ok(all_enabled),
            other => Err(unexpected_outcome("interfaces status", &other)),
        }
    }

    pub fn into_interfaces(self) -> Result<Vec<RouterInterface>, CoreError> {
        match self {
            Self::Interfaces(interfaces) => Ok(interfaces),
            other => Err(unexpected_outcome("interface list", &other)),
        }
    }
}

fn unexpected_outcome(expected: &str, actual: &ActionOutcome) -> CoreError {
    CoreError::Internal(format!("expected {expected}, action returned {actual:?}"))
}

/// Send a command that must answer `!done`.
pub(crate) async fn execute_command<A: RouterApi>(
    api: &mut A,
    command: &Command,
) -> Result<(), CoreError> {
    let sentence = api
        .execute(command)
        .await
        .map_err(|source| CoreError::CommandFailed {
            command: command.to_string(),
            source,
        })?;

    if sentence.is_done() {
        Ok(())
    } else {
        Err(CoreError::UnexpectedResponse {
            command: command.to_string(),
            kind: sentence.kind(),
            text: sentence.text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accessors_reject_other_variants() {
        assert!(matches!(
            ActionOutcome::InterfacesStatus { all_enabled: true }.into_status(),
            Ok(true)
        ));
        assert!(matches!(
            ActionOutcome::Completed.into_interfaces(),
            Err(CoreError::Internal(_))
        ));
    }

    #[test]
    fn debug_hides_callback() {
        let action = RouterAction::notify(CancellationToken::new(), |_| {});
        let rendered = format!("{action:?}");
        assert!(rendered.starts_with("NotifyInterfaceUpdates"));
        assert!(rendered.contains("poll_interval: 1s"));
        assert_eq!(action.name(), "notify_interface_updates");
    }
}
