//! Checking content against its claimed format.
//!
//! This module ties the registry and the validators together for the usual
//! question of an upload pipeline: "this file says it is a PDF, is it?"
//!
//! ## Algorithm Overview
//!
//! 1. Resolve the claimed format from the file extension or MIME type
//! 2. Pick the format's validator following the configured mode priority
//! 3. Run the validator on the content and report the verdict
//!
//! ## Example
//!
//! ```
//! use fmtcheck_core::{Checker, CheckOutcome, FormatRegistry};
//!
//! let registry = FormatRegistry::with_builtin_formats();
//! let checker = Checker::new(&registry);
//!
//! let report = checker.check_bytes("pdf", b"%PDF-1.7\n...");
//! assert_eq!(report.outcome, CheckOutcome::Matched);
//!
//! let report = checker.check_bytes("pdf", b"GIF89a...");
//! assert_eq!(report.outcome, CheckOutcome::Mismatched);
//! ```

mod config;

pub use config::CheckConfig;

use crate::descriptor::FormatDescriptor;
use crate::error::{Error, Result};
use crate::keys::file_extension_of;
use crate::registry::FormatRegistry;
use crate::validation::ValidationMode;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Verdict of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckOutcome {
    /// The content matches the claimed format
    Matched,
    /// The content does not match the claimed format
    Mismatched,
    /// The claimed format is known but has no usable validator
    NoValidator,
    /// The claimed extension or MIME type is not registered
    UnknownFormat,
}

impl CheckOutcome {
    /// Short label for display
    pub const fn label(self) -> &'static str {
        match self {
            Self::Matched => "ok",
            Self::Mismatched => "mismatch",
            Self::NoValidator => "unchecked",
            Self::UnknownFormat => "unknown",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of checking one piece of content
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// The verdict
    pub outcome: CheckOutcome,
    /// The claimed format, if it is registered
    pub format: Option<Arc<FormatDescriptor>>,
    /// The validation mode that produced the verdict
    pub mode: Option<ValidationMode>,
}

impl CheckReport {
    fn unknown() -> Self {
        Self {
            outcome: CheckOutcome::UnknownFormat,
            format: None,
            mode: None,
        }
    }

    /// Returns true if the content contradicts its claimed format
    pub fn is_mismatch(&self) -> bool {
        self.outcome == CheckOutcome::Mismatched
    }
}

/// Checks content against the formats of a registry
#[derive(Debug, Clone)]
pub struct Checker<'r> {
    registry: &'r FormatRegistry,
    config: CheckConfig,
}

impl<'r> Checker<'r> {
    /// Creates a checker with default configuration
    pub fn new(registry: &'r FormatRegistry) -> Self {
        Self::with_config(registry, CheckConfig::default())
    }

    /// Creates a checker with custom configuration
    pub fn with_config(registry: &'r FormatRegistry, config: CheckConfig) -> Self {
        Self { registry, config }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Checks `data` against the format registered for `extension`
    pub fn check_bytes(&self, extension: &str, data: &[u8]) -> CheckReport {
        match self.registry.get_by_file_extension(extension) {
            Some(format) => self.check_format(format, data, &self.config.modes),
            None => {
                trace!("No format registered for extension '{}'", extension);
                CheckReport::unknown()
            }
        }
    }

    /// Checks `data` against the format registered for `mime_type`
    pub fn check_bytes_by_mime_type(&self, mime_type: &str, data: &[u8]) -> CheckReport {
        match self.registry.get_by_mime_type(mime_type) {
            Some(format) => self.check_format(format, data, &self.config.modes),
            None => {
                trace!("No format registered for MIME type '{}'", mime_type);
                CheckReport::unknown()
            }
        }
    }

    /// Reads a file and checks it against the format of its extension
    ///
    /// With [`CheckConfig::max_bytes`] set, only the head of the file is
    /// read and full-parse validation is skipped for truncated content.
    pub fn check_file(&self, path: impl AsRef<Path>) -> Result<CheckReport> {
        let path = path.as_ref();

        let Some(format) = file_extension_of(path)
            .and_then(|ext| self.registry.get_by_file_extension(&ext))
        else {
            trace!("No format registered for {}", path.display());
            return Ok(CheckReport::unknown());
        };

        let (data, truncated) = self.read_content(path)?;
        trace!("Read {} bytes from {}", data.len(), path.display());

        let modes: Vec<ValidationMode> = if truncated {
            self.config
                .modes
                .iter()
                .copied()
                .filter(|mode| *mode != ValidationMode::FullParse)
                .collect()
        } else {
            self.config.modes.clone()
        };

        let report = self.check_format(format, &data, &modes);
        debug!("{}: {}", path.display(), report.outcome);
        Ok(report)
    }

    /// Finds every registered format whose content validator accepts `data`
    ///
    /// Formats without a validator for the configured modes never match.
    /// Results follow registration order.
    pub fn sniff(&self, data: &[u8]) -> Vec<Arc<FormatDescriptor>> {
        self.registry
            .descriptors()
            .into_values()
            .filter(|format| format.matches(data, &self.config.modes) == Some(true))
            .collect()
    }

    fn check_format(
        &self,
        format: Arc<FormatDescriptor>,
        data: &[u8],
        modes: &[ValidationMode],
    ) -> CheckReport {
        let Some((mode, validator)) = format.find_validator_with_mode(modes) else {
            trace!("Format '{}' has no validator for {:?}", format.name(), modes);
            return CheckReport {
                outcome: CheckOutcome::NoValidator,
                format: Some(format),
                mode: None,
            };
        };

        let outcome = if validator.matches(data) {
            CheckOutcome::Matched
        } else {
            CheckOutcome::Mismatched
        };

        CheckReport {
            outcome,
            format: Some(format),
            mode: Some(mode),
        }
    }

    /// Reads the whole file, or its head when a byte limit is configured
    fn read_content(&self, path: &Path) -> Result<(Vec<u8>, bool)> {
        if self.config.max_bytes == 0 {
            let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
            return Ok((data, false));
        }

        let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
        // One extra byte tells us whether anything was cut off
        let limit = (self.config.max_bytes as u64).saturating_add(1);
        let mut data = Vec::with_capacity(self.config.max_bytes.min(64 * 1024) + 1);
        file.take(limit)
            .read_to_end(&mut data)
            .map_err(|e| Error::file_read(path, e))?;

        let truncated = data.len() > self.config.max_bytes;
        data.truncate(self.config.max_bytes);
        Ok((data, truncated))
    }
}

/// Checks a file against the built-in formats
///
/// This is a convenience function building a throwaway registry.
pub fn check_file(path: impl AsRef<Path>) -> Result<CheckReport> {
    let registry = FormatRegistry::with_builtin_formats();
    Checker::new(&registry).check_file(path)
}

/// Checks a file against the built-in formats with custom configuration
pub fn check_file_with_config(
    path: impl AsRef<Path>,
    config: CheckConfig,
) -> Result<CheckReport> {
    let registry = FormatRegistry::with_builtin_formats();
    Checker::with_config(&registry, config).check_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_bytes_outcomes() {
        let registry = FormatRegistry::with_builtin_formats();
        let checker = Checker::new(&registry);

        let report = checker.check_bytes("pdf", b"%PDF-1.6blafoo");
        assert_eq!(report.outcome, CheckOutcome::Matched);
        assert_eq!(report.mode, Some(ValidationMode::LeadingBytes));
        assert_eq!(report.format.unwrap().name(), formats::PDF);

        let report = checker.check_bytes("pdf", b"%PdF-1.6blafoo");
        assert!(report.is_mismatch());

        let report = checker.check_bytes("csv", b"a,b,c");
        assert_eq!(report.outcome, CheckOutcome::NoValidator);
        assert!(report.format.is_some());

        let report = checker.check_bytes("exe", b"MZ");
        assert_eq!(report.outcome, CheckOutcome::UnknownFormat);
        assert!(report.format.is_none());

        let report = checker.check_bytes("PDF", b"%PDF");
        assert_eq!(report.outcome, CheckOutcome::UnknownFormat);
    }

    #[test]
    fn test_check_by_mime_type() {
        let registry = FormatRegistry::with_builtin_formats();
        let checker = Checker::new(&registry);

        let report = checker.check_bytes_by_mime_type("image/png", b"\x89PNG\r\n\x1a\n");
        assert_eq!(report.outcome, CheckOutcome::Matched);

        let report = checker.check_bytes_by_mime_type("image/png; q=1", b"\x89PNG\r\n\x1a\n");
        assert_eq!(report.outcome, CheckOutcome::UnknownFormat);
    }

    #[cfg(feature = "xml-full-parse")]
    #[test]
    fn test_mode_priority_decides_verdict() {
        let registry = FormatRegistry::with_builtin_formats();
        // Looks like XML up front, but is not well-formed
        let broken = b"<?xml version=\"1.0\"?><a><b></a>";

        let speed = Checker::new(&registry).check_bytes("xml", broken);
        assert_eq!(speed.outcome, CheckOutcome::Matched);
        assert_eq!(speed.mode, Some(ValidationMode::LeadingBytes));

        let config = CheckConfig::new().favour_accuracy();
        let accuracy = Checker::with_config(&registry, config).check_bytes("xml", broken);
        assert_eq!(accuracy.outcome, CheckOutcome::Mismatched);
        assert_eq!(accuracy.mode, Some(ValidationMode::FullParse));
    }

    #[test]
    fn test_empty_modes_never_validate() {
        let registry = FormatRegistry::with_builtin_formats();
        let config = CheckConfig::new().modes([]);
        let report = Checker::with_config(&registry, config).check_bytes("pdf", b"%PDF");
        assert_eq!(report.outcome, CheckOutcome::NoValidator);
    }

    #[test]
    fn test_check_file() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.PDF");
        let bad = dir.path().join("bad.gif");
        let none = dir.path().join("README");
        fs::write(&good, b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n").unwrap();
        fs::write(&bad, b"\x89PNG\r\n\x1a\n").unwrap();
        fs::write(&none, b"hello").unwrap();

        assert_eq!(check_file(&good).unwrap().outcome, CheckOutcome::Matched);
        assert_eq!(check_file(&bad).unwrap().outcome, CheckOutcome::Mismatched);
        assert_eq!(check_file(&none).unwrap().outcome, CheckOutcome::UnknownFormat);

        let err = check_file(dir.path().join("missing.pdf")).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[cfg(feature = "xml-full-parse")]
    #[test]
    fn test_truncated_read_skips_full_parse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.xml");
        fs::write(&path, b"<?xml version=\"1.0\"?><root><child/></root>").unwrap();

        let config = CheckConfig::new().favour_accuracy();
        let report = check_file_with_config(&path, config.clone()).unwrap();
        assert_eq!(report.mode, Some(ValidationMode::FullParse));
        assert_eq!(report.outcome, CheckOutcome::Matched);

        let report = check_file_with_config(&path, config.max_bytes(8)).unwrap();
        assert_eq!(report.mode, Some(ValidationMode::LeadingBytes));
        assert_eq!(report.outcome, CheckOutcome::Matched);
    }

    #[test]
    fn test_max_bytes_not_exceeded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exact.pdf");
        fs::write(&path, b"%PDF").unwrap();

        let registry = FormatRegistry::with_builtin_formats();
        let checker = Checker::with_config(&registry, CheckConfig::new().max_bytes(4));
        let (data, truncated) = checker.read_content(&path).unwrap();
        assert_eq!(data, b"%PDF");
        assert!(!truncated);

        let checker = Checker::with_config(&registry, CheckConfig::new().max_bytes(2));
        let (data, truncated) = checker.read_content(&path).unwrap();
        assert_eq!(data, b"%P");
        assert!(truncated);
    }

    #[test]
    fn test_max_bytes_at_upper_bound() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge-limit.pdf");
        fs::write(&path, b"%PDF-1.7").unwrap();

        let registry = FormatRegistry::with_builtin_formats();
        let checker = Checker::with_config(&registry, CheckConfig::new().max_bytes(usize::MAX));
        let (data, truncated) = checker.read_content(&path).unwrap();
        assert_eq!(data, b"%PDF-1.7");
        assert!(!truncated);

        let report = checker.check_file(&path).unwrap();
        assert_eq!(report.outcome, CheckOutcome::Matched);
    }

    #[test]
    fn test_sniff() {
        let registry = FormatRegistry::with_builtin_formats();
        let checker = Checker::new(&registry);

        let found: Vec<_> = checker
            .sniff(b"GIF89a\x01\x00\x01\x00")
            .iter()
            .map(|f| f.short_name().to_owned())
            .collect();
        assert_eq!(found, vec!["GIF"]);

        assert!(checker.sniff(b"a,b,c").is_empty());
        assert!(checker.sniff(b"").is_empty());
    }
}
