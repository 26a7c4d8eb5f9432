//! Shell execution for the root-shell mechanism.
//!
//! [`CommandRunner`] abstracts "run a program, get exit code and output";
//! [`RootShell`] layers a lazily opened elevated session on top of it.

mod root;
mod runner;

pub use root::{DEFAULT_SHELL_BINARY, RootShell, ShellError, quote, quote_path};
pub use runner::{CommandRunner, ShellFuture, ShellOutput, TokioRunner};
