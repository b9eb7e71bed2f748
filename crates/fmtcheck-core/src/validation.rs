//! Content validation primitives.
//!
//! A [`ContentValidator`] is a pure predicate over a byte buffer that tells
//! whether the buffer really belongs to a given file format. Validators are
//! tagged with the [`ValidationMode`] they implement: a cheap check of the
//! leading bytes, or an exhaustive structural parse.
//!
//! ## Example
//!
//! ```
//! use fmtcheck_core::validation::{ContentValidator, PrefixValidator};
//!
//! let pdf = PrefixValidator::new([b"%PDF".as_slice()]);
//! assert!(pdf.matches(b"%PDF-1.7"));
//! assert!(!pdf.matches(b"GIF89a"));
//! ```

use std::fmt;
use std::str::FromStr;

/// How the content of a buffer is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidationMode {
    /// Compare the first bytes of the content against known signatures.
    /// Very fast, but only as accurate as a magic number can be.
    LeadingBytes,
    /// Parse the complete content to verify its structure. Slower than
    /// [`ValidationMode::LeadingBytes`] but also finds broken documents.
    FullParse,
}

/// Try the cheap check first
pub const FAVOUR_SPEED: [ValidationMode; 2] =
    [ValidationMode::LeadingBytes, ValidationMode::FullParse];

/// Try the exhaustive check first
pub const FAVOUR_ACCURACY: [ValidationMode; 2] =
    [ValidationMode::FullParse, ValidationMode::LeadingBytes];

impl ValidationMode {
    /// All modes, cheapest first
    pub const ALL: [ValidationMode; 2] = FAVOUR_SPEED;

    /// Stable identifier of this mode
    pub const fn id(self) -> &'static str {
        match self {
            Self::LeadingBytes => "leading-bytes",
            Self::FullParse => "full-parse",
        }
    }

    /// Looks up a mode by its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.id() == id)
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unknown validation mode identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValidationMode(
    /// The rejected identifier
    pub String,
);

impl fmt::Display for UnknownValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown validation mode '{}'", self.0)
    }
}

impl std::error::Error for UnknownValidationMode {}

impl FromStr for ValidationMode {
    type Err = UnknownValidationMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| UnknownValidationMode(s.to_owned()))
    }
}

/// Trait for checking whether a byte buffer belongs to a file format
///
/// Implementations must be total: any input, including an empty buffer,
/// yields a verdict rather than a panic. A validator never retains the
/// buffer it is given.
pub trait ContentValidator: Send + Sync {
    /// Returns `true` if `data` matches the expected content
    fn matches(&self, data: &[u8]) -> bool;
}

impl<F> ContentValidator for F
where
    F: Fn(&[u8]) -> bool + Send + Sync,
{
    fn matches(&self, data: &[u8]) -> bool {
        self(data)
    }
}

/// Returns `true` if `data` starts with at least one of `prefixes`.
///
/// Empty prefixes are ignored so that an empty catalog entry can never turn
/// into a match-everything rule.
pub fn starts_with_any<P: AsRef<[u8]>>(data: &[u8], prefixes: &[P]) -> bool {
    prefixes.iter().any(|prefix| {
        let prefix = prefix.as_ref();
        !prefix.is_empty() && data.starts_with(prefix)
    })
}

/// Leading-bytes validator backed by a fixed catalog of signatures
#[derive(Clone)]
pub struct PrefixValidator {
    prefixes: Vec<Box<[u8]>>,
}

impl PrefixValidator {
    /// Creates a validator matching any of the given prefixes
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| Box::from(p.as_ref()))
                .collect(),
        }
    }

    /// Returns the signatures this validator accepts
    pub fn prefixes(&self) -> impl Iterator<Item = &[u8]> {
        self.prefixes.iter().map(AsRef::as_ref)
    }
}

impl ContentValidator for PrefixValidator {
    fn matches(&self, data: &[u8]) -> bool {
        starts_with_any(data, &self.prefixes)
    }
}

impl fmt::Debug for PrefixValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixValidator")
            .field("prefixes", &self.prefixes.len())
            .finish()
    }
}
