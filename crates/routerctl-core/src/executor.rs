// ── Action executor ──
//
// One executor runs one session per `execute` call:
//
//   validate → create connection → connect → authenticate → action → quit
//
// The connection is owned by a guard that closes it when the session ends,
// whichever stage it ends in. Each stage wraps its failure in a
// stage-specific `CoreError`; the action stage returns its errors as-is.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use routerctl_api::{ConnectionFactory, ControlledConnection, RouterApi};

use crate::action::{ActionOutcome, RouterAction};
use crate::credential::CredentialService;
use crate::error::CoreError;
use crate::progress::{self, Progress};
use crate::settings::{SessionSettings, SettingsHandle};

// ── Connection guard ────────────────────────────────────────────────

/// Closes the wrapped connection exactly once, on drop.
struct ConnectionGuard<C: ControlledConnection> {
    connection: C,
}

impl<C: ControlledConnection> ConnectionGuard<C> {
    fn new(connection: C) -> Self {
        Self { connection }
    }

    fn get(&self) -> &C {
        &self.connection
    }

    fn get_mut(&mut self) -> &mut C {
        &mut self.connection
    }
}

impl<C: ControlledConnection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        self.connection.close();
        debug!("router connection released");
    }
}

// ── Factory ─────────────────────────────────────────────────────────

/// Creates executors bound to the current settings snapshot.
pub struct ExecutorFactory<F: ConnectionFactory> {
    connections: Arc<F>,
    credentials: Arc<dyn CredentialService>,
    settings: SettingsHandle,
}

impl<F: ConnectionFactory> ExecutorFactory<F> {
    pub fn new(
        connections: F,
        credentials: impl CredentialService + 'static,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            connections: Arc::new(connections),
            credentials: Arc::new(credentials),
            settings,
        }
    }

    /// Executor over a snapshot of the settings as they are now.
    pub fn create(&self) -> ActionExecutor<F> {
        ActionExecutor {
            connections: Arc::clone(&self.connections),
            credentials: Arc::clone(&self.credentials),
            settings: self.settings.snapshot(),
        }
    }

    /// Whether the current settings would pass validation.
    pub fn can_execute(&self) -> bool {
        self.settings.snapshot().is_valid()
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }
}

impl<F: ConnectionFactory> Clone for ExecutorFactory<F> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
            credentials: Arc::clone(&self.credentials),
            settings: self.settings.clone(),
        }
    }
}

// ── Executor ────────────────────────────────────────────────────────

/// Runs actions in independent sessions over one settings snapshot.
pub struct ActionExecutor<F: ConnectionFactory> {
    connections: Arc<F>,
    credentials: Arc<dyn CredentialService>,
    settings: Arc<SessionSettings>,
}

impl<F: ConnectionFactory> ActionExecutor<F> {
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn can_execute(&self) -> bool {
        self.settings.is_valid()
    }

    /// Run `action` in a new session.
    ///
    /// Settings are validated before anything touches the network. The
    /// session itself runs as its own task, so dropping this future does
    /// not interrupt a session midway.
    pub async fn execute(
        &self,
        action: RouterAction,
        progress: Option<Arc<dyn Progress>>,
    ) -> Result<ActionOutcome, CoreError> {
        let address = self.settings.validate()?;

        let session = Session {
            connections: Arc::clone(&self.connections),
            credentials: Arc::clone(&self.credentials),
            settings: Arc::clone(&self.settings),
            address,
        };

        tokio::spawn(session.run(action, progress))
            .await
            .map_err(|e| CoreError::Internal(format!("session task failed: {e}")))?
    }
}

struct Session<F: ConnectionFactory> {
    connections: Arc<F>,
    credentials: Arc<dyn CredentialService>,
    settings: Arc<SessionSettings>,
    address: SocketAddr,
}

impl<F: ConnectionFactory> Session<F> {
    async fn run(
        self,
        action: RouterAction,
        progress: Option<Arc<dyn Progress>>,
    ) -> Result<ActionOutcome, CoreError> {
        let progress = progress.as_deref();
        let address = self.address;
        info!(%address, action = action.name(), "session started");

        let connection = self
            .connections
            .create_connection(address)
            .map_err(|source| CoreError::ConnectionNotCreated { source })?;
        let mut connection = ConnectionGuard::new(connection);

        // ── Connect ──
        progress::report(progress, "Connecting to router...");
        connection
            .get_mut()
            .connect()
            .await
            .map_err(|source| CoreError::ConnectionFailed { address, source })
            .inspect_err(|e| stage_failed(progress, "Connection error.", e))?;
        progress::report(progress, "Connection established.");

        let mut api = self.connections.create_router_api(connection.get());

        // ── Authenticate ──
        progress::report(progress, "Authenticating user...");
        let password = self
            .credentials
            .decrypt_password(&self.settings.password_cipher)
            .map_err(|source| CoreError::PasswordUnavailable { source })
            .inspect_err(|e| stage_failed(progress, "Authentication error.", e))?;
        api.authenticate(&self.settings.username, &password)
            .await
            .map_err(|source| CoreError::AuthenticationFailed { source })
            .inspect_err(|e| stage_failed(progress, "Authentication error.", e))?;
        drop(password);
        progress::report(progress, "Authentication complete.");

        // ── Action ──
        let outcome = action
            .execute(&mut api, &self.settings, progress)
            .await
            .inspect_err(|e| warn!(action = action.name(), error = %e, "action failed"))?;

        // ── Quit ──
        progress::report(progress, "Logging out...");
        api.quit()
            .await
            .map_err(|source| CoreError::LogoutFailed { source })
            .inspect_err(|e| stage_failed(progress, "Logout error.", e))?;
        progress::report(progress, "Logged out.");

        info!(%address, action = action.name(), "session finished");
        Ok(outcome)
    }
}

fn stage_failed(progress: Option<&dyn Progress>, message: &str, error: &CoreError) {
    progress::report(progress, message);
    warn!(
        stage = %error.stage(),
        transient = error.is_transient(),
        rejected = error.is_router_rejection(),
        error = %error,
        "session stage failed"
    );
}
