//! Shared types for Transplant.
//!
//! Every crate in the workspace speaks in terms of [`GrantedType`], the
//! closed set of mechanisms that can place a file inside another app's
//! private data directory, and the SDK levels that gate them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Last SDK level (Android 10) where the classic storage permission still
/// allows direct writes under `Android/data`.
pub const SCOPED_STORAGE_SDK: u32 = 29;

/// First SDK level (Android 14) where the zero-width path trick stopped working.
pub const EXPLOIT_PATCHED_SDK: u32 = 34;

/// Mechanism used to write into the target app's data directory.
///
/// Exactly one is active for a given install attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantedType {
    /// Out-of-process helper running with file-broker privileges.
    PrivilegedHelper,
    /// Root-capable command interpreter.
    RootShell,
    /// Zero-width-space path that slips past the `Android/data` restriction.
    PathObfuscationExploit,
    /// Pre-scoped-storage direct write with the classic storage permission.
    LegacyDirectWrite,
    /// User-granted persisted document tree.
    DocumentTreeApi,
}

impl GrantedType {
    /// All mechanisms in canonical order.
    pub const ALL: [GrantedType; 5] = [
        GrantedType::PrivilegedHelper,
        GrantedType::RootShell,
        GrantedType::PathObfuscationExploit,
        GrantedType::LegacyDirectWrite,
        GrantedType::DocumentTreeApi,
    ];

    /// Stable machine name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            GrantedType::PrivilegedHelper => "privileged_helper",
            GrantedType::RootShell => "root_shell",
            GrantedType::PathObfuscationExploit => "path_obfuscation_exploit",
            GrantedType::LegacyDirectWrite => "legacy_direct_write",
            GrantedType::DocumentTreeApi => "document_tree_api",
        }
    }

    /// Human-readable label for progress lines and listings.
    pub fn label(self) -> &'static str {
        match self {
            GrantedType::PrivilegedHelper => "privileged helper",
            GrantedType::RootShell => "root shell",
            GrantedType::PathObfuscationExploit => "path obfuscation",
            GrantedType::LegacyDirectWrite => "direct write",
            GrantedType::DocumentTreeApi => "document tree",
        }
    }

    /// Whether the mechanism addresses the target through the obfuscated path.
    pub fn uses_obfuscated_path(self) -> bool {
        matches!(self, GrantedType::PathObfuscationExploit)
    }
}

impl fmt::Display for GrantedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown mechanism name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mechanism: {0}")]
pub struct UnknownMechanism(pub String);

impl FromStr for GrantedType {
    type Err = UnknownMechanism;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        GrantedType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownMechanism(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_match_as_str() {
        for t in GrantedType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            let back: GrantedType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, t);
        }
    }

    #[test]
    fn parse_accepts_dashes_and_case() {
        assert_eq!(
            "Root-Shell".parse::<GrantedType>().unwrap(),
            GrantedType::RootShell
        );
        assert_eq!(
            "document_tree_api".parse::<GrantedType>().unwrap(),
            GrantedType::DocumentTreeApi
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "magic".parse::<GrantedType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown mechanism: magic");
    }

    #[test]
    fn only_exploit_uses_obfuscated_path() {
        let obfuscated: Vec<_> = GrantedType::ALL
            .into_iter()
            .filter(|t| t.uses_obfuscated_path())
            .collect();
        assert_eq!(obfuscated, vec![GrantedType::PathObfuscationExploit]);
    }
}
