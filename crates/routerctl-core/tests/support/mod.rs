// Scripted in-memory router shared by the integration tests.
//
// `FakeRouter` is the connection factory; every connection and API handle
// it creates appends to one journal so tests can assert on the exact
// sequence of stages and command words.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::stream::{self, BoxStream, StreamExt};
use secrecy::{ExposeSecret, SecretString};

use routerctl_api::{
    Command, ConnectionFactory, ControlledConnection, Error, RouterApi, Row, Sentence,
};
use routerctl_core::{
    ExecutorFactory, NetworkInterfaces, PlainTextCredentials, Progress, ProgressLog,
    SessionSettings, SettingsHandle,
};

pub const PPPOE: &str = "pppoe-out1";
pub const ETHER: &str = "ether1";

// ── Journal ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(SocketAddr),
    Connect,
    Authenticate { username: String, password: String },
    Command(String),
    Quit,
    Close,
}

// ── Script ──────────────────────────────────────────────────────────

/// What the router answers. Everything succeeds unless told otherwise.
#[derive(Default)]
pub struct Script {
    pub fail_create: bool,
    pub fail_connect: bool,
    pub fail_auth: bool,
    pub fail_quit: bool,
    /// Answers to `execute`, consumed in order; `!done` once empty.
    pub responses: VecDeque<Sentence>,
    /// Rows keyed by the full command text, falling back to the path.
    pub tables: HashMap<String, Vec<Row>>,
    /// Commands (full text or path) whose row stream ends in a trap.
    pub trapped: HashSet<String>,
}

#[derive(Default)]
struct State {
    script: Script,
    journal: Vec<Call>,
}

#[derive(Clone, Default)]
pub struct FakeRouter {
    state: Arc<Mutex<State>>,
}

impl FakeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: Call) {
        self.state().journal.push(call);
    }

    pub fn script(&self, edit: impl FnOnce(&mut Script)) {
        edit(&mut self.state().script);
    }

    pub fn table(&self, key: &str, rows: Vec<Row>) {
        self.script(|s| {
            s.tables.insert(key.to_owned(), rows);
        });
    }

    pub fn addresses(&self, interface: &str, rows: Vec<Row>) {
        self.table(
            &format!("/ip/address/print =.proplist=address ?interface={interface}"),
            rows,
        );
    }

    pub fn journal(&self) -> Vec<Call> {
        self.state().journal.clone()
    }

    /// Command texts only, in order.
    pub fn commands(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter_map(|c| match c {
                Call::Command(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.journal().iter().filter(|c| *c == call).count()
    }

    fn rows_for(&self, command: &Command) -> Result<Vec<Row>, Error> {
        let state = self.state();
        let text = command.to_string();
        let script = &state.script;

        if script.trapped.contains(&text) || script.trapped.contains(command.path()) {
            return Err(Error::Trap {
                message: format!("no such command prefix: {}", command.path()),
            });
        }
        Ok(script
            .tables
            .get(&text)
            .or_else(|| script.tables.get(command.path()))
            .cloned()
            .unwrap_or_default())
    }
}

impl ConnectionFactory for FakeRouter {
    type Connection = FakeConnection;
    type Api = FakeApi;

    fn create_connection(&self, address: SocketAddr) -> Result<FakeConnection, Error> {
        if self.state().script.fail_create {
            return Err(Error::Connect {
                address: address.to_string(),
                reason: "socket exhausted".into(),
            });
        }
        self.record(Call::Create(address));
        Ok(FakeConnection {
            router: self.clone(),
            address,
        })
    }

    fn create_router_api(&self, _connection: &FakeConnection) -> FakeApi {
        FakeApi {
            router: self.clone(),
        }
    }
}

pub struct FakeConnection {
    router: FakeRouter,
    address: SocketAddr,
}

impl ControlledConnection for FakeConnection {
    async fn connect(&mut self) -> Result<(), Error> {
        self.router.record(Call::Connect);
        if self.router.state().script.fail_connect {
            return Err(Error::Connect {
                address: self.address.to_string(),
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }

    fn close(&mut self) {
        self.router.record(Call::Close);
    }
}

pub struct FakeApi {
    router: FakeRouter,
}

impl RouterApi for FakeApi {
    async fn authenticate(&mut self, username: &str, password: &SecretString) -> Result<(), Error> {
        self.router.record(Call::Authenticate {
            username: username.to_owned(),
            password: password.expose_secret().to_owned(),
        });
        if self.router.state().script.fail_auth {
            return Err(Error::Trap {
                message: "invalid user name or password (6)".into(),
            });
        }
        Ok(())
    }

    async fn execute(&mut self, command: &Command) -> Result<Sentence, Error> {
        self.router.record(Call::Command(command.to_string()));
        let next = self.router.state().script.responses.pop_front();
        Ok(next.unwrap_or_else(|| Sentence::Done(Row::new())))
    }

    fn stream_rows<'a>(&'a mut self, command: &'a Command) -> BoxStream<'a, Result<Row, Error>> {
        self.router.record(Call::Command(command.to_string()));
        match self.router.rows_for(command) {
            Ok(rows) => stream::iter(rows.into_iter().map(Ok)).boxed(),
            Err(e) => stream::iter([Err(e)]).boxed(),
        }
    }

    async fn quit(&mut self) -> Result<(), Error> {
        self.router.record(Call::Quit);
        if self.router.state().script.fail_quit {
            return Err(Error::Fatal {
                message: "session terminated".into(),
            });
        }
        Ok(())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

pub fn router_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 88, 1)), 8728)
}

pub fn settings() -> SessionSettings {
    SessionSettings {
        username: "admin".into(),
        password_cipher: b"hunter2".to_vec(),
        router_address: Some(router_address().ip()),
        router_port: router_address().port(),
        interfaces: NetworkInterfaces::new(PPPOE, ETHER),
    }
}

pub fn executors(router: &FakeRouter, settings: SessionSettings) -> ExecutorFactory<FakeRouter> {
    ExecutorFactory::new(
        router.clone(),
        PlainTextCredentials,
        SettingsHandle::new(settings),
    )
}

pub fn host(interface: &str, mac: &str) -> Row {
    Row::new().with("mac-address", mac).with("on-interface", interface)
}

pub fn lease(mac: &str, address: &str, host_name: &str) -> Row {
    Row::new()
        .with("address", address)
        .with("mac-address", mac)
        .with("host-name", host_name)
}

pub fn interface(name: &str, kind: &str, disabled: bool) -> Row {
    Row::new()
        .with("name", name)
        .with("type", kind)
        .with("disabled", disabled.to_string())
}

pub fn address(value: &str) -> Row {
    Row::new().with("address", value)
}

pub const HOSTS: &str = "/interface/bridge/host/print";
pub const LEASES: &str = "/ip/dhcp-server/lease/print";
pub const INTERFACES: &str = "/interface/print";

/// A progress log and the same log as an executor progress sink.
pub fn progress_log() -> (Arc<ProgressLog>, Option<Arc<dyn Progress>>) {
    let log = Arc::new(ProgressLog::new());
    let sink: Arc<dyn Progress> = Arc::clone(&log) as Arc<dyn Progress>;
    (log, Some(sink))
}
