//! Capability probe.
//!
//! Evaluates each access mechanism independently against the current device
//! state and reports which ones are usable, with a reason for the rest.

mod platform;
mod probe;

pub use platform::{Platform, SystemPlatform};
pub use probe::{Capability, CapabilityProbe};
