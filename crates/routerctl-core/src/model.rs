// ── Interface state record ──
//
// Rebuilt from scratch on every poll by the correlator and handed straight
// to subscribers. Never mutated in place.

use serde::{Deserialize, Serialize};

/// Logical state of one router interface and the client behind it.
///
/// Client fields are empty strings when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouterInterface {
    pub enabled: bool,
    /// Unique within one poll snapshot.
    pub name: String,
    pub client_mac_address: String,
    pub client_name: String,
    pub client_ip_address: String,
}

impl RouterInterface {
    /// Record with no client information.
    pub fn bare(enabled: bool, name: impl Into<String>) -> Self {
        Self {
            enabled,
            name: name.into(),
            ..Self::default()
        }
    }

    /// Record with only the client MAC known.
    pub fn with_mac(enabled: bool, name: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            client_mac_address: mac.into(),
            ..Self::bare(enabled, name)
        }
    }

    /// Record with only the client IP known (PPPoE uplinks).
    pub fn with_ip(enabled: bool, name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            client_ip_address: ip.into(),
            ..Self::bare(enabled, name)
        }
    }

    pub fn full(
        enabled: bool,
        name: impl Into<String>,
        mac: impl Into<String>,
        host_name: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            enabled,
            name: name.into(),
            client_mac_address: mac.into(),
            client_name: host_name.into(),
            client_ip_address: ip.into(),
        }
    }

    pub fn has_client(&self) -> bool {
        !(self.client_mac_address.is_empty() && self.client_ip_address.is_empty())
    }
}
