//! Privileged file-helper connection.
//!
//! The helper is an out-of-process service with elevated file-access
//! privileges, reachable only through an asynchronous bind. This crate owns
//! that binding: a single [`HelperConnection`] per process drives the
//! `Disconnected → Connecting → {Connected | Error}` state machine and hands
//! out the bound [`FileHelper`] once the bind settles.

pub mod connection;
pub mod error;
pub mod local;
pub mod service;

pub use connection::{ConnectionStatus, DEFAULT_CONNECT_TIMEOUT, HelperConnection};
pub use error::HelperError;
pub use local::{LocalBinder, LocalFileHelper};
pub use service::{FileHelper, HelperBinder, HelperFuture};
