//! Dataset and version name validation.
//!
//! Names become directory components of the working area
//! (`<root>/<dataset>/<version>`) and keys in the catalog, so they must be
//! safe on every filesystem we write to.
//!
//! Valid names:
//! - Must be non-empty and at most [`MAX_NAME_LEN`] bytes
//! - Must not contain whitespace or any of `/ \ : * ? " < > | ~ ^ [`
//! - Must not be `.` or `..`
//! - Must not start with `.` or `-`
//! - Must not end with `.lock`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Longest accepted name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Characters that are forbidden anywhere in a name.
const FORBIDDEN_CHARS: &[char] = &[
    '/', '\\', ':', '*', '?', '"', '<', '>', '|', '~', '^', '[',
];

/// Validate a dataset or version name.
///
/// `kind` only appears in the error message.
///
/// # Examples
///
/// ```
/// use mediastore_types::name::validate_name;
///
/// assert!(validate_name("dataset", "catsdogs").is_ok());
/// assert!(validate_name("version", "v1.2").is_ok());
/// assert!(validate_name("version", "").is_err());
/// assert!(validate_name("dataset", "../etc").is_err());
/// ```
pub fn validate_name(kind: &'static str, name: &str) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(format!("longer than {MAX_NAME_LEN} bytes")));
    }
    if let Some(ch) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(format!("contains whitespace or control character {ch:?}")));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(format!("contains forbidden character {ch:?}")));
    }
    if name == "." || name == ".." {
        return Err(invalid("must not be a relative path component".into()));
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Err(invalid("must not start with '.' or '-'".into()));
    }
    if name.ends_with(".lock") {
        return Err(invalid("must not end with '.lock'".into()));
    }
    Ok(())
}

macro_rules! validated_name {
    ($(#[$meta:meta])* $ty:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $ty(String);

        impl $ty {
            /// Validate and wrap a name.
            pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
                let name = name.into();
                validate_name($kind, &name)?;
                Ok(Self(name))
            }

            /// The name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($ty), self.0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $ty {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = TypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }
    };
}

validated_name!(
    /// Name of a dataset: a namespace holding independent version snapshots.
    DatasetName,
    "dataset name"
);

validated_name!(
    /// Caller-chosen label distinguishing snapshots within a dataset.
    VersionLabel,
    "version label"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_simple_names() {
        assert!(DatasetName::new("catsdogs").is_ok());
        assert!(DatasetName::new("dataset1").is_ok());
        assert!(VersionLabel::new("v1").is_ok());
        assert!(VersionLabel::new("version1").is_ok());
        assert!(VersionLabel::new("2024-06-01_rc.2").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        let err = DatasetName::new("").unwrap_err();
        assert!(matches!(err, TypeError::InvalidName { kind: "dataset name", .. }));
    }

    #[test]
    fn reject_path_separators() {
        assert!(DatasetName::new("a/b").is_err());
        assert!(DatasetName::new("a\\b").is_err());
    }

    #[test]
    fn reject_relative_components() {
        assert!(VersionLabel::new(".").is_err());
        assert!(VersionLabel::new("..").is_err());
        assert!(VersionLabel::new(".hidden").is_err());
    }

    #[test]
    fn reject_whitespace() {
        assert!(DatasetName::new("has space").is_err());
        assert!(DatasetName::new("has\ttab").is_err());
        assert!(DatasetName::new("has\nnewline").is_err());
    }

    #[test]
    fn reject_forbidden_chars() {
        for bad in ["a:b", "a*b", "a?b", "a\"b", "a<b", "a>b", "a|b", "a~b", "a^b", "a[b"] {
            assert!(VersionLabel::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn reject_leading_dash_and_lock_suffix() {
        assert!(DatasetName::new("-rf").is_err());
        assert!(DatasetName::new("main.lock").is_err());
    }

    #[test]
    fn reject_overlong_name() {
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(DatasetName::new(long).is_err());
        assert!(DatasetName::new("a".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn parse_and_display() {
        let name: DatasetName = "catsdogs".parse().unwrap();
        assert_eq!(name.to_string(), "catsdogs");
        assert_eq!(name.as_str(), "catsdogs");
        assert_eq!(format!("{name:?}"), "DatasetName(\"catsdogs\")");
    }

    #[test]
    fn serde_rejects_invalid_name() {
        let ok: VersionLabel = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(ok.as_str(), "v1");
        assert!(serde_json::from_str::<VersionLabel>("\"a/b\"").is_err());
    }

    proptest::proptest! {
        #[test]
        fn names_never_contain_separators(name in "\\PC{1,40}") {
            if let Ok(valid) = DatasetName::new(name.as_str()) {
                proptest::prop_assert!(!valid.as_str().contains('/'));
                proptest::prop_assert!(!valid.as_str().contains('\\'));
                proptest::prop_assert!(valid.as_str() != "..");
                proptest::prop_assert_eq!(valid.as_str().parse::<DatasetName>().unwrap(), valid);
            }
        }
    }
}
