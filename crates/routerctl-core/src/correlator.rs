// ── Table correlator ──
//
// Joins three router tables into one list of `RouterInterface` records:
//
//   bridge hosts   on-interface → mac-address
//   DHCP leases    mac-address  → (address, host-name)
//   interfaces     name, type, disabled
//
// Fetches run strictly in that order. Every row is checked for its
// required properties before use (blank text counts as missing) and
// duplicate join keys are rejected.
// Output order is the order of the interface table.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use futures_util::TryStreamExt;
use tracing::debug;

use routerctl_api::models::{Address, Interface};
use routerctl_api::{Command, FromRow, RouterApi, Row};

use crate::error::{CoreError, DataIntegrityError, Table};
use crate::model::RouterInterface;

/// Interface type of a PPPoE client uplink.
pub const PPPOE_CLIENT_TYPE: &str = "pppoe-out";

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Debug)]
struct BridgeHost {
    on_interface: Option<String>,
    mac_address: Option<String>,
}

impl FromRow for BridgeHost {
    fn from_row(row: &Row) -> Self {
        Self {
            on_interface: row.string("on-interface"),
            mac_address: row.string("mac-address"),
        }
    }
}

#[derive(Debug)]
struct DhcpLease {
    address: Option<String>,
    mac_address: Option<String>,
    host_name: Option<String>,
}

impl FromRow for DhcpLease {
    fn from_row(row: &Row) -> Self {
        Self {
            address: row.string("address"),
            mac_address: row.string("mac-address"),
            host_name: row.string("host-name"),
        }
    }
}

/// Joined lease data, keyed by MAC.
#[derive(Debug)]
struct Lease {
    address: String,
    host_name: String,
}

fn required<T>(
    value: Option<T>,
    field: &'static str,
    model: &'static str,
) -> Result<T, DataIntegrityError> {
    value.ok_or(DataIntegrityError::MissingField { field, model })
}

/// Blank text counts as not set.
fn non_blank<S: AsRef<str>>(value: Option<S>) -> Option<S> {
    value.filter(|v| !v.as_ref().trim().is_empty())
}

fn insert_unique<V>(
    map: &mut HashMap<String, V>,
    key: String,
    value: V,
) -> Result<(), DataIntegrityError> {
    match map.entry(key) {
        Entry::Occupied(entry) => Err(DataIntegrityError::DuplicateKey {
            key: entry.key().clone(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}

fn command_failed(command: &Command) -> impl FnOnce(routerctl_api::Error) -> CoreError + '_ {
    move |source| CoreError::CommandFailed {
        command: command.to_string(),
        source,
    }
}

// ── Commands ────────────────────────────────────────────────────────

fn print_bridge_hosts() -> Command {
    Command::builder("/interface/bridge/host/print")
        .proplist(&["mac-address", "on-interface"])
        .query("external", "true")
        .build()
}

fn print_dhcp_leases() -> Command {
    Command::builder("/ip/dhcp-server/lease/print")
        .proplist(&["address", "mac-address", "host-name"])
        .build()
}

fn print_interfaces() -> Command {
    Command::builder("/interface/print")
        .proplist(&["name", "type", "disabled"])
        .build()
}

fn print_addresses(interface: &str) -> Command {
    Command::builder("/ip/address/print")
        .proplist(&["address"])
        .query("interface", interface)
        .build()
}

// ── Fetches ─────────────────────────────────────────────────────────

/// Correlate all three tables into the current interface view.
pub(crate) async fn fetch_interfaces<A: RouterApi>(
    api: &mut A,
) -> Result<Vec<RouterInterface>, CoreError> {
    let hosts = fetch_bridge_hosts(api)
        .await
        .map_err(|e| e.in_table(Table::BridgeHosts))?;
    let leases = fetch_dhcp_leases(api)
        .await
        .map_err(|e| e.in_table(Table::DhcpLeases))?;
    let interfaces = join_interfaces(api, &hosts, &leases)
        .await
        .map_err(|e| e.in_table(Table::Interfaces))?;

    debug!(
        hosts = hosts.len(),
        leases = leases.len(),
        interfaces = interfaces.len(),
        "interface tables correlated"
    );
    Ok(interfaces)
}

async fn fetch_bridge_hosts<A: RouterApi>(
    api: &mut A,
) -> Result<HashMap<String, String>, CoreError> {
    let command = print_bridge_hosts();
    let mut rows = api.execute_to_stream::<BridgeHost>(&command);
    let mut hosts = HashMap::new();

    while let Some(host) = rows.try_next().await.map_err(command_failed(&command))? {
        let interface = required(non_blank(host.on_interface), "on-interface", "BridgeHost")?;
        let mac = required(non_blank(host.mac_address), "mac-address", "BridgeHost")?;
        insert_unique(&mut hosts, interface, mac)?;
    }

    Ok(hosts)
}

async fn fetch_dhcp_leases<A: RouterApi>(api: &mut A) -> Result<HashMap<String, Lease>, CoreError> {
    let command = print_dhcp_leases();
    let mut rows = api.execute_to_stream::<DhcpLease>(&command);
    let mut leases = HashMap::new();

    while let Some(lease) = rows.try_next().await.map_err(command_failed(&command))? {
        let mac = required(non_blank(lease.mac_address), "mac-address", "DhcpLease")?;
        let host_name = required(non_blank(lease.host_name), "host-name", "DhcpLease")?;
        let address = required(non_blank(lease.address), "address", "DhcpLease")?;
        insert_unique(&mut leases, mac, Lease { address, host_name })?;
    }

    Ok(leases)
}

async fn join_interfaces<A: RouterApi>(
    api: &mut A,
    hosts: &HashMap<String, String>,
    leases: &HashMap<String, Lease>,
) -> Result<Vec<RouterInterface>, CoreError> {
    let command = print_interfaces();
    let rows: Vec<Interface> = api
        .execute_to_list(&command)
        .await
        .map_err(command_failed(&command))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let name = required(non_blank(row.name), "name", "Interface")?;
        let kind = required(non_blank(row.kind), "type", "Interface")?;
        let enabled = !required(row.disabled, "disabled", "Interface")?;

        let record = if kind.eq_ignore_ascii_case(PPPOE_CLIENT_TYPE) {
            if enabled {
                pppoe_record(api, name).await?
            } else {
                RouterInterface::bare(false, name)
            }
        } else {
            bridged_record(enabled, name, hosts, leases)
        };
        records.push(record);
    }

    Ok(records)
}

/// Clients behind a bridge port are found through the host and lease tables.
fn bridged_record(
    enabled: bool,
    name: String,
    hosts: &HashMap<String, String>,
    leases: &HashMap<String, Lease>,
) -> RouterInterface {
    let Some(mac) = hosts.get(&name) else {
        return RouterInterface::bare(enabled, name);
    };
    match leases.get(mac) {
        Some(lease) => {
            RouterInterface::full(enabled, name, mac, &lease.host_name, &lease.address)
        }
        None => RouterInterface::with_mac(enabled, name, mac),
    }
}

/// An enabled PPPoE client carries at most one address of its own.
async fn pppoe_record<A: RouterApi>(api: &mut A, name: String) -> Result<RouterInterface, CoreError> {
    match pppoe_address(api, &name).await {
        Ok(Some(ip)) => Ok(RouterInterface::with_ip(true, name, ip)),
        Ok(None) => Ok(RouterInterface::bare(true, name)),
        Err(source) => Err(CoreError::PppoeAddress {
            interface: name,
            source: Box::new(source),
        }),
    }
}

async fn pppoe_address<A: RouterApi>(api: &mut A, interface: &str) -> Result<Option<String>, CoreError> {
    let command = print_addresses(interface);
    let rows: Vec<Address> = api
        .execute_to_list(&command)
        .await
        .map_err(command_failed(&command))?;

    match rows.as_slice() {
        [] => Ok(None),
        [row] => {
            let address = required(non_blank(row.address.as_deref()), "address", "IpAddress")?;
            Ok(Some(host_part(address)?.to_owned()))
        }
        _ => Err(DataIntegrityError::UnexpectedRowCount {
            expected: "0 or 1",
            actual: rows.len(),
        }
        .into()),
    }
}

/// `10.0.0.1/24` → `10.0.0.1`. Both halves must be present.
fn host_part(address: &str) -> Result<&str, DataIntegrityError> {
    let mut parts = address.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(host), Some(prefix), None) if !host.is_empty() && !prefix.is_empty() => Ok(host),
        _ => Err(DataIntegrityError::MalformedValue {
            field: "address",
            value: address.to_owned(),
        }),
    }
}
