//! Progress lines emitted during an installation, in emission order.

use transplant_types::GrantedType;

pub const VERIFYING_SOURCE: &str = "Verifying downloaded file";
pub const CONNECTING_HELPER: &str = "Connecting to helper service";
pub const REQUESTING_ROOT: &str = "Requesting root access";
pub const CHECKING_ACCESS: &str = "Checking folder access";
pub const PREPARING: &str = "Preparing target folder";
pub const COPYING: &str = "Copying translation file";
pub const REMOVING_EXISTING: &str = "Removing existing file";
pub const REPLACING_CONFLICT: &str = "Replacing conflicting entry";
/// Terminal line of a successful installation.
pub const COPY_SUCCESSFUL: &str = "Copy successful";

/// First line of every installation.
pub fn starting(mechanism: GrantedType) -> String {
    format!("Starting installation via {mechanism}")
}
