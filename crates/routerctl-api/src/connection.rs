// ── Connection and API contracts ──
//
// The wire protocol lives behind these traits. A `ConnectionFactory`
// creates one `ControlledConnection` per session and hands out a
// `RouterApi` handle bound to it. Methods return `impl Future + Send` so
// implementations can be written with plain `async fn` and sessions can
// be spawned onto the runtime.

use std::future::Future;
use std::net::SocketAddr;

use futures_util::stream::{BoxStream, StreamExt, TryStreamExt};
use secrecy::SecretString;

use crate::command::Command;
use crate::error::Error;
use crate::sentence::{FromRow, Row, Sentence};

/// Creates connections and API handles for a router address.
pub trait ConnectionFactory: Send + Sync + 'static {
    type Connection: ControlledConnection;
    type Api: RouterApi;

    /// Create a connection object for `address`. Does not touch the network.
    fn create_connection(&self, address: SocketAddr) -> Result<Self::Connection, Error>;

    /// Create an API handle that talks over an already connected `connection`.
    fn create_router_api(&self, connection: &Self::Connection) -> Self::Api;
}

/// A network handle with an explicit release step.
///
/// The owner must call [`close`](Self::close) exactly once, whatever the
/// outcome of the session. Implementations should make `close` infallible.
pub trait ControlledConnection: Send + 'static {
    fn connect(&mut self) -> impl Future<Output = Result<(), Error>> + Send;

    fn close(&mut self);
}

/// Command-level access to the router management API.
pub trait RouterApi: Send + 'static {
    fn authenticate(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Execute a command that answers with a single terminating sentence.
    fn execute(&mut self, command: &Command) -> impl Future<Output = Result<Sentence, Error>> + Send;

    /// Execute a command and yield every `!re` row lazily until `!done`.
    ///
    /// A `!trap` or `!fatal` reply ends the stream with an error item.
    fn stream_rows<'a>(&'a mut self, command: &'a Command) -> BoxStream<'a, Result<Row, Error>>;

    fn quit(&mut self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Execute a command and collect every row as `T`.
    fn execute_to_list<T: FromRow + Send>(
        &mut self,
        command: &Command,
    ) -> impl Future<Output = Result<Vec<T>, Error>> + Send {
        async move {
            self.stream_rows(command)
                .map_ok(|row| T::from_row(&row))
                .try_collect()
                .await
        }
    }

    /// Execute a command and convert rows to `T` as they arrive.
    fn execute_to_stream<'a, T: FromRow + Send + 'a>(
        &'a mut self,
        command: &'a Command,
    ) -> BoxStream<'a, Result<T, Error>> {
        self.stream_rows(command)
            .map_ok(|row| T::from_row(&row))
            .boxed()
    }
}
