//! Translation file installation.
//!
//! [`InstallDispatcher`] routes an installation to exactly one of the five
//! privileged copy handlers, selected by [`GrantedType`]. Every handler
//! announces each stage on the progress sink before performing it.
//!
//! [`GrantedType`]: transplant_types::GrantedType

mod copy;
pub mod dispatcher;
pub mod error;
mod handlers;
pub mod messages;
pub mod request;

pub use dispatcher::InstallDispatcher;
pub use error::InstallError;
pub use request::{InstallOptions, InstallationRequest};
