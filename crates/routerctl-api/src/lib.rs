//! Contracts for talking to a router's management API.
//!
//! The wire protocol itself is supplied by the embedding application. This
//! crate fixes the shape of that collaborator so the session engine in
//! `routerctl-core` can drive it:
//!
//! - **[`ConnectionFactory`]** / **[`ControlledConnection`]** — per-session
//!   network handle with an explicit `close()` step.
//! - **[`RouterApi`]** — authenticate, execute commands, stream result rows,
//!   quit.
//! - **[`Command`]** — immutable path + ordered parameter words, assembled
//!   with [`CommandBuilder`].
//! - **[`Sentence`]** / **[`Row`]** / **[`FromRow`]** — router replies and
//!   typed row views ([`models`]).
//! - **[`PublicIpClient`]** — HTTP lookup of the externally visible address.

pub mod command;
pub mod connection;
pub mod error;
pub mod models;
pub mod public_ip;
pub mod sentence;

pub use command::{Command, CommandBuilder, Parameter};
pub use connection::{ConnectionFactory, ControlledConnection, RouterApi};
pub use error::Error;
pub use public_ip::PublicIpClient;
pub use sentence::{FromRow, Row, Sentence};
