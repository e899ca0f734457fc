// ── Router control ──
//
// Uplink on/off switch and state query, each in its own session.

use std::sync::Arc;

use tracing::debug;

use routerctl_api::ConnectionFactory;

use crate::action::RouterAction;
use crate::error::CoreError;
use crate::executor::ExecutorFactory;
use crate::progress::Progress;

pub struct RouterControl<F: ConnectionFactory> {
    executors: ExecutorFactory<F>,
}

impl<F: ConnectionFactory> RouterControl<F> {
    pub fn new(executors: ExecutorFactory<F>) -> Self {
        Self { executors }
    }

    pub fn executors(&self) -> &ExecutorFactory<F> {
        &self.executors
    }

    /// Enable or disable both uplinks.
    pub async fn change_connection_state(
        &self,
        enable: bool,
        progress: Option<Arc<dyn Progress>>,
    ) -> Result<(), CoreError> {
        self.executors
            .create()
            .execute(RouterAction::ChangeInterfacesState { enable }, progress)
            .await?;
        Ok(())
    }

    /// Whether both uplinks are enabled.
    ///
    /// With invalid settings this is `false` and no session is opened.
    pub async fn connection_state(&self) -> Result<bool, CoreError> {
        let executor = self.executors.create();
        if !executor.can_execute() {
            debug!("settings incomplete, reporting uplinks as disabled");
            return Ok(false);
        }

        executor
            .execute(RouterAction::RequestInterfacesStatus, None)
            .await?
            .into_status()
    }
}
