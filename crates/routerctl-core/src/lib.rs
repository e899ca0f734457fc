// routerctl-core: Router session engine between routerctl-api and its consumers.

pub mod action;
pub mod connectivity;
pub mod control;
pub mod correlator;
pub mod credential;
pub mod error;
pub mod executor;
pub mod model;
pub mod notifier;
pub mod progress;
pub mod registry;
pub mod settings;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{ActionOutcome, RouterAction, UpdateCallback, DEFAULT_POLL_INTERVAL};
pub use connectivity::{public_ip, ConnectivityMonitor, ReachabilityProbe, TcpProbe};
pub use control::RouterControl;
pub use credential::{CredentialError, CredentialService, PlainTextCredentials};
pub use error::{error_report, CoreError, DataIntegrityError, Stage, Table};
pub use executor::{ActionExecutor, ExecutorFactory};
pub use model::RouterInterface;
pub use notifier::StateNotifier;
pub use progress::{LogEntry, Progress, ProgressLog};
pub use registry::{InterfaceObserver, Subscription};
pub use settings::{NetworkInterfaces, SessionSettings, SettingsField, SettingsHandle};
