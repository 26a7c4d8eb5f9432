//! Deciding whether two tree handles name the same directory.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::uri::TreeUri;

/// Predicate comparing an expected tree handle with one returned by the OS.
pub trait TreeMatcher: Send + Sync {
    fn matches(&self, expected: &TreeUri, actual: &TreeUri) -> bool;
}

/// Byte-for-byte comparison.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatch;

impl TreeMatcher for ExactMatch {
    fn matches(&self, expected: &TreeUri, actual: &TreeUri) -> bool {
        expected == actual
    }
}

/// Compares after percent-decoding and dropping trailing slashes, so
/// `…%3AAndroid%2Fdata%2Fpkg` and `…:Android/data/pkg/` are the same tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedMatch;

impl NormalizedMatch {
    fn normalize(uri: &TreeUri) -> Cow<'_, str> {
        let decoded = percent_decode_str(uri.as_str()).decode_utf8_lossy();
        match decoded {
            Cow::Borrowed(s) => Cow::Borrowed(s.trim_end_matches('/')),
            Cow::Owned(s) => Cow::Owned(s.trim_end_matches('/').to_string()),
        }
    }
}

impl TreeMatcher for NormalizedMatch {
    fn matches(&self, expected: &TreeUri, actual: &TreeUri) -> bool {
        Self::normalize(expected) == Self::normalize(actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_requires_identical_strings() {
        let a = TreeUri::for_package("com.example.game");
        let b = TreeUri::new(format!("{a}/"));
        assert!(ExactMatch.matches(&a, &a.clone()));
        assert!(!ExactMatch.matches(&a, &b));
    }

    #[test]
    fn normalized_ignores_encoding_and_trailing_slash() {
        let encoded = TreeUri::for_package("com.example.game");
        let decoded = TreeUri::new(
            "content://com.android.externalstorage.documents/tree/primary:Android/data/com.example.game/",
        );
        assert!(NormalizedMatch.matches(&encoded, &decoded));
    }

    #[test]
    fn normalized_still_distinguishes_packages() {
        let a = TreeUri::for_package("com.example.game");
        let b = TreeUri::for_package("com.example.other");
        assert!(!NormalizedMatch.matches(&a, &b));
    }
}
