// ── Core error types ──
//
// Every variant renders a message fit for direct display and, where it
// wraps a lower-level failure, keeps that failure as its `source()` so the
// full chain survives. `CoreError::stage()` names the step that failed
// without the caller having to parse strings.

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::net::SocketAddr;

use strum::{AsRefStr, Display};
use thiserror::Error;

use routerctl_api::Error as ApiError;

use crate::credential::CredentialError;
use crate::settings::SettingsField;

/// The step of a session (or surrounding service) that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Stage {
    #[strum(to_string = "settings validation")]
    Settings,
    #[strum(to_string = "connection")]
    Connection,
    #[strum(to_string = "authentication")]
    Authentication,
    #[strum(to_string = "action")]
    Action,
    #[strum(to_string = "logout")]
    Logout,
    #[strum(to_string = "subscription")]
    Subscription,
    #[strum(to_string = "connectivity check")]
    Connectivity,
    #[strum(to_string = "internal")]
    Internal,
}

/// Remote tables read by the correlator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Table {
    #[strum(to_string = "Bridge/Hosts")]
    BridgeHosts,
    #[strum(to_string = "IP/DHCP Server/Leases")]
    DhcpLeases,
    #[strum(to_string = "Interfaces")]
    Interfaces,
}

/// Remote data that cannot be trusted: duplicate keys, missing required
/// properties, or result sets of the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    #[error("Item \"{key}\" has already been added")]
    DuplicateKey { key: String },

    #[error("Property \"{field}\" is not set. Model: \"{model}\"")]
    MissingField {
        field: &'static str,
        model: &'static str,
    },

    #[error("Invalid API response: expected {expected} rows, got {actual}")]
    UnexpectedRowCount { expected: &'static str, actual: usize },

    #[error("Invalid value \"{value}\" for property \"{field}\"")]
    MalformedValue { field: &'static str, value: String },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Settings ─────────────────────────────────────────────────────
    #[error("The following settings are not set: {}", join_fields(.fields))]
    SettingsInvalid { fields: Vec<SettingsField> },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Connection object was not created")]
    ConnectionNotCreated {
        #[source]
        source: ApiError,
    },

    #[error("Connection to {address} was not established")]
    ConnectionFailed {
        address: SocketAddr,
        #[source]
        source: ApiError,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("User password was not obtained")]
    PasswordUnavailable {
        #[source]
        source: CredentialError,
    },

    #[error("User authentication failed")]
    AuthenticationFailed {
        #[source]
        source: ApiError,
    },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Command {command} was not executed")]
    CommandFailed {
        command: String,
        #[source]
        source: ApiError,
    },

    #[error(
        "Command {command} was not executed: unexpected API response \"{kind}\", text \"{text}\""
    )]
    UnexpectedResponse {
        command: String,
        kind: &'static str,
        text: String,
    },

    // ── Logout ───────────────────────────────────────────────────────
    #[error("Logout was not performed")]
    LogoutFailed {
        #[source]
        source: ApiError,
    },

    // ── Data ─────────────────────────────────────────────────────────
    #[error(transparent)]
    DataIntegrity(#[from] DataIntegrityError),

    #[error("Failed getting data from table \"{table}\"")]
    TableFetch {
        table: Table,
        #[source]
        source: Box<CoreError>,
    },

    #[error("IP address for PPPoE interface \"{interface}\" was not obtained")]
    PppoeAddress {
        interface: String,
        #[source]
        source: Box<CoreError>,
    },

    // ── Subscriptions ────────────────────────────────────────────────
    #[error("Subscriber for interface \"{name}\" was already added")]
    AlreadySubscribed { name: String },

    #[error("Interface name must not be empty")]
    EmptyInterfaceName,

    // ── Connectivity ─────────────────────────────────────────────────
    #[error("Reachability check was not performed")]
    Connectivity {
        #[source]
        source: ApiError,
    },

    #[error("Public IP address was not obtained")]
    PublicIp {
        #[source]
        source: ApiError,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The step that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::SettingsInvalid { .. } => Stage::Settings,
            Self::ConnectionNotCreated { .. } | Self::ConnectionFailed { .. } => Stage::Connection,
            Self::PasswordUnavailable { .. } | Self::AuthenticationFailed { .. } => {
                Stage::Authentication
            }
            Self::CommandFailed { .. }
            | Self::UnexpectedResponse { .. }
            | Self::DataIntegrity(_)
            | Self::TableFetch { .. }
            | Self::PppoeAddress { .. } => Stage::Action,
            Self::LogoutFailed { .. } => Stage::Logout,
            Self::AlreadySubscribed { .. } | Self::EmptyInterfaceName => Stage::Subscription,
            Self::Connectivity { .. } | Self::PublicIp { .. } => Stage::Connectivity,
            Self::Internal(_) => Stage::Internal,
        }
    }

    /// The data-integrity violation behind this error, looking through
    /// table and PPPoE wrappers.
    pub fn data_integrity(&self) -> Option<&DataIntegrityError> {
        match self {
            Self::DataIntegrity(inner) => Some(inner),
            Self::TableFetch { source, .. } | Self::PppoeAddress { source, .. } => {
                source.data_integrity()
            }
            _ => None,
        }
    }

    /// The table whose fetch failed, if any.
    pub fn table(&self) -> Option<Table> {
        match self {
            Self::TableFetch { table, .. } => Some(*table),
            _ => None,
        }
    }

    /// The router API error behind this error, looking through table and
    /// PPPoE wrappers.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::ConnectionNotCreated { source }
            | Self::ConnectionFailed { source, .. }
            | Self::AuthenticationFailed { source }
            | Self::CommandFailed { source, .. }
            | Self::LogoutFailed { source }
            | Self::Connectivity { source }
            | Self::PublicIp { source } => Some(source),
            Self::TableFetch { source, .. } | Self::PppoeAddress { source, .. } => {
                source.api_error()
            }
            _ => None,
        }
    }

    /// Returns `true` if a new session may succeed where this one failed.
    pub fn is_transient(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_transient)
    }

    /// Returns `true` if the router answered with a trap or fatal reply.
    pub fn is_router_rejection(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_router_rejection)
    }

    pub(crate) fn in_table(self, table: Table) -> Self {
        Self::TableFetch {
            table,
            source: Box::new(self),
        }
    }
}

fn join_fields(fields: &[SettingsField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an error and its whole `source()` chain, one `Error: <message>`
/// line per level, outermost first.
pub fn error_report(error: &(dyn StdError + 'static)) -> String {
    let mut report = String::new();
    let mut current = Some(error);

    while let Some(err) = current {
        let message = err.to_string();
        let message = if message.trim().is_empty() {
            "Error text is not set."
        } else {
            message.as_str()
        };
        let _ = writeln!(report, "Error: {message}");
        current = err.source();
    }

    report
}
