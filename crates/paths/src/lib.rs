//! Target path resolution for translation installs.
//!
//! Translations land in
//! `<storage>/Android/data/<package>/files/Custom Translations/`. On the SDK
//! levels where the restriction on `Android/data` can be sidestepped, the
//! `data` segment is written as `d\u{200B}ata`: it renders the same but is
//! a different byte sequence, so the path-based check does not match it.
//! Everything here is a pure string transform; nothing touches the filesystem.

use std::path::{Path, PathBuf};

use transplant_types::GrantedType;

/// Primary shared storage on most devices.
pub const DEFAULT_STORAGE_ROOT: &str = "/storage/emulated/0";

/// Directory under `Android/` holding per-app private data.
pub const DATA_SEGMENT: &str = "data";

/// App-private `files` directory name.
pub const FILES_DIR: &str = "files";

/// Directory the game loads community translations from.
pub const TRANSLATIONS_DIR: &str = "Custom Translations";

/// Code point injected into the `data` segment.
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// How the `data` segment of the target path is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStyle {
    #[default]
    Canonical,
    /// `data` with a zero-width space between `d` and `a`.
    Obfuscated,
}

impl PathStyle {
    /// Path style a mechanism writes through.
    pub fn for_mechanism(mechanism: GrantedType) -> Self {
        if mechanism.uses_obfuscated_path() {
            PathStyle::Obfuscated
        } else {
            PathStyle::Canonical
        }
    }

    /// The `data` segment in this style.
    pub fn data_segment(self) -> String {
        match self {
            PathStyle::Canonical => DATA_SEGMENT.to_string(),
            PathStyle::Obfuscated => obfuscate_segment(DATA_SEGMENT),
        }
    }
}

/// Inserts a zero-width space after the first character of `segment`.
///
/// Segments shorter than two characters are returned unchanged.
pub fn obfuscate_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    match (chars.next(), chars.as_str()) {
        (Some(first), rest) if !rest.is_empty() => {
            let mut out = String::with_capacity(segment.len() + ZERO_WIDTH_SPACE.len_utf8());
            out.push(first);
            out.push(ZERO_WIDTH_SPACE);
            out.push_str(rest);
            out
        }
        _ => segment.to_string(),
    }
}

/// Rendered form of a path with zero-width code points removed.
///
/// Obfuscated and canonical paths produce the same display form.
pub fn display_form(path: &Path) -> String {
    path.to_string_lossy()
        .chars()
        .filter(|c| !is_zero_width(*c))
        .collect()
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

/// Computes install paths for a target package under a storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    storage_root: PathBuf,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_ROOT)
    }
}

impl PathResolver {
    /// Creates a resolver rooted at `storage_root`.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// `<root>/Android/<data>/<package>`.
    pub fn data_directory(&self, package: &str, style: PathStyle) -> PathBuf {
        self.storage_root
            .join("Android")
            .join(style.data_segment())
            .join(package)
    }

    /// `<root>/Android/<data>/<package>/files`.
    pub fn files_directory(&self, package: &str, style: PathStyle) -> PathBuf {
        self.data_directory(package, style).join(FILES_DIR)
    }

    /// Directory translations are installed into.
    pub fn target_directory(&self, package: &str, style: PathStyle) -> PathBuf {
        self.files_directory(package, style).join(TRANSLATIONS_DIR)
    }

    /// Target directory for the path style `mechanism` writes through.
    pub fn target_for(&self, package: &str, mechanism: GrantedType) -> PathBuf {
        self.target_directory(package, PathStyle::for_mechanism(mechanism))
    }
}

/// Segments below the package data directory leading to the target, in
/// traversal order. Used by mechanisms that walk a directory tree.
pub const TARGET_SEGMENTS: [&str; 2] = [FILES_DIR, TRANSLATIONS_DIR];

#[cfg(test)]
mod tests {
    use super::*;

    const PKG: &str = "com.example.game";

    #[test]
    fn canonical_target_layout() {
        let resolver = PathResolver::new("/sdcard");
        let path = resolver.target_directory(PKG, PathStyle::Canonical);
        assert_eq!(
            path,
            PathBuf::from("/sdcard/Android/data/com.example.game/files/Custom Translations")
        );
    }

    #[test]
    fn obfuscated_differs_in_bytes_but_not_display() {
        let resolver = PathResolver::default();
        let canonical = resolver.target_directory(PKG, PathStyle::Canonical);
        let obfuscated = resolver.target_directory(PKG, PathStyle::Obfuscated);

        assert_ne!(
            canonical.as_os_str().as_encoded_bytes(),
            obfuscated.as_os_str().as_encoded_bytes()
        );
        assert_eq!(display_form(&obfuscated), display_form(&canonical));
        assert_eq!(display_form(&canonical), canonical.to_string_lossy());
    }

    #[test]
    fn obfuscation_only_touches_data_segment() {
        let resolver = PathResolver::new("/sdcard");
        let obfuscated = resolver.target_directory(PKG, PathStyle::Obfuscated);
        let text = obfuscated.to_string_lossy();

        assert_eq!(text.matches(ZERO_WIDTH_SPACE).count(), 1);
        assert!(text.contains("/Android/d\u{200B}ata/com.example.game/"));
        assert!(text.ends_with("files/Custom Translations"));
    }

    #[test]
    fn obfuscate_segment_edge_cases() {
        assert_eq!(obfuscate_segment("data"), "d\u{200B}ata");
        assert_eq!(obfuscate_segment("d"), "d");
        assert_eq!(obfuscate_segment(""), "");
    }

    #[test]
    fn style_follows_mechanism() {
        assert_eq!(
            PathStyle::for_mechanism(GrantedType::PathObfuscationExploit),
            PathStyle::Obfuscated
        );
        assert_eq!(
            PathStyle::for_mechanism(GrantedType::LegacyDirectWrite),
            PathStyle::Canonical
        );
        assert_eq!(
            PathStyle::for_mechanism(GrantedType::RootShell),
            PathStyle::Canonical
        );
    }

    #[test]
    fn target_for_follows_mechanism_style() {
        let resolver = PathResolver::new("/sdcard");
        assert_eq!(
            resolver.target_for(PKG, GrantedType::LegacyDirectWrite),
            resolver.target_directory(PKG, PathStyle::Canonical)
        );
        assert_eq!(
            resolver.target_for(PKG, GrantedType::PathObfuscationExploit),
            resolver.target_directory(PKG, PathStyle::Obfuscated)
        );
    }
}
