// ── Session settings ──
//
// An immutable snapshot of everything a session needs: who to log in as,
// where the router is, and which two uplink interfaces are controlled.
// The settings collaborator builds one and hands it in; core never reads
// storage itself.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use arc_swap::ArcSwap;
use strum::Display;

use crate::error::CoreError;

/// The two uplink interfaces controlled by the application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInterfaces {
    /// PPPoE client interface (type `pppoe-out`).
    pub pppoe: String,
    /// Ethernet interface carrying the PPPoE session.
    pub ether: String,
}

impl NetworkInterfaces {
    pub fn new(pppoe: impl Into<String>, ether: impl Into<String>) -> Self {
        Self {
            pppoe: pppoe.into(),
            ether: ether.into(),
        }
    }
}

/// A settings field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SettingsField {
    #[strum(to_string = "user name")]
    UserName,
    #[strum(to_string = "password")]
    Password,
    #[strum(to_string = "IP address")]
    IpAddress,
    #[strum(to_string = "port")]
    Port,
    #[strum(to_string = "PPPoE interface")]
    PppoeInterface,
    #[strum(to_string = "Ethernet interface")]
    EtherInterface,
}

/// Read-only settings snapshot handed to an executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub username: String,
    /// Stored password cipher; decrypted through the credential service
    /// right before authentication.
    pub password_cipher: Vec<u8>,
    /// `None` when the stored address is missing or unparsable.
    pub router_address: Option<IpAddr>,
    pub router_port: u16,
    pub interfaces: NetworkInterfaces,
}

impl SessionSettings {
    /// Every invalid field, in declaration order.
    pub fn invalid_fields(&self) -> Vec<SettingsField> {
        let mut fields = Vec::new();

        if self.username.trim().is_empty() {
            fields.push(SettingsField::UserName);
        }
        if self.password_cipher.is_empty() {
            fields.push(SettingsField::Password);
        }
        if !self.router_address.is_some_and(is_usable_router_address) {
            fields.push(SettingsField::IpAddress);
        }
        if self.router_port == 0 {
            fields.push(SettingsField::Port);
        }
        if self.interfaces.pppoe.trim().is_empty() {
            fields.push(SettingsField::PppoeInterface);
        }
        if self.interfaces.ether.trim().is_empty() {
            fields.push(SettingsField::EtherInterface);
        }

        fields
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }

    /// Validate the snapshot and return the router's socket address.
    pub fn validate(&self) -> Result<SocketAddr, CoreError> {
        let fields = self.invalid_fields();
        match self.router_address {
            Some(ip) if fields.is_empty() => Ok(SocketAddr::new(ip, self.router_port)),
            _ => Err(CoreError::SettingsInvalid { fields }),
        }
    }
}

/// The router must be a unicast IPv4 host.
fn is_usable_router_address(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => {
            !(v4.is_unspecified() || v4.is_broadcast() || v4.is_loopback() || v4.is_multicast())
        }
        IpAddr::V6(_) => false,
    }
}

/// Shared, atomically replaceable settings.
///
/// Readers take a cheap `Arc` snapshot; a writer swaps in a whole new
/// snapshot. Sessions already running keep the snapshot they started with.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    current: Arc<ArcSwap<SessionSettings>>,
}

impl SettingsHandle {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    pub fn snapshot(&self) -> Arc<SessionSettings> {
        self.current.load_full()
    }

    pub fn replace(&self, settings: SessionSettings) {
        self.current.store(Arc::new(settings));
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}
