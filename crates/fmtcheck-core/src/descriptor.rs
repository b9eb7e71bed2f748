//! File format descriptors.
//!
//! A [`FormatDescriptor`] bundles everything known about one file format:
//! its name, the file extensions and MIME types it may be announced with,
//! and the content validators able to confirm that a buffer really is of
//! that format.
//!
//! Descriptors are built through [`FormatDescriptorBuilder`], which rejects
//! malformed input up front. Once built, a descriptor is immutable.
//!
//! ## Example
//!
//! ```
//! use fmtcheck_core::{FormatDescriptor, PrefixValidator, ValidationMode};
//!
//! let pdf = FormatDescriptor::builder("Portable Document Format")
//!     .short_name("PDF")
//!     .file_extension("pdf")
//!     .mime_type("application/pdf")
//!     .validator(ValidationMode::LeadingBytes, PrefixValidator::new([b"%PDF"]))
//!     .build()?;
//!
//! let validator = pdf.validator_favour_speed().expect("PDF has a validator");
//! assert!(validator.matches(b"%PDF-1.6"));
//! # Ok::<(), fmtcheck_core::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::keys::{is_valid_file_extension, is_valid_mime_type};
use crate::validation::{ContentValidator, ValidationMode, FAVOUR_ACCURACY, FAVOUR_SPEED};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Immutable description of a single file format
#[derive(Clone)]
pub struct FormatDescriptor {
    name: String,
    short_name: String,
    file_extensions: BTreeSet<String>,
    mime_types: BTreeSet<String>,
    validators: BTreeMap<ValidationMode, Arc<dyn ContentValidator>>,
}

impl FormatDescriptor {
    /// Starts building a descriptor with the given name
    pub fn builder(name: impl Into<String>) -> FormatDescriptorBuilder {
        FormatDescriptorBuilder::new(name)
    }

    /// Unique name of the format, e.g. "Portable Document Format"
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short display name, e.g. "PDF". Defaults to [`name`](Self::name).
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Allowed file extensions, lowercase and without leading dot
    pub fn file_extensions(&self) -> &BTreeSet<String> {
        &self.file_extensions
    }

    /// Allowed MIME types, lowercase and without parameters
    pub fn mime_types(&self) -> &BTreeSet<String> {
        &self.mime_types
    }

    /// Validation modes this format has a validator for, cheapest first
    pub fn validation_modes(&self) -> impl Iterator<Item = ValidationMode> + '_ {
        self.validators.keys().copied()
    }

    /// Returns true if a validator is registered for `mode`
    pub fn supports(&self, mode: ValidationMode) -> bool {
        self.validators.contains_key(&mode)
    }

    /// Finds the first validator matching the given priority list
    ///
    /// The modes are tried in order; the first one this format has a
    /// validator for wins. Returns `None` for an empty list or if none of
    /// the modes is supported.
    pub fn find_validator(&self, modes: &[ValidationMode]) -> Option<&dyn ContentValidator> {
        self.find_validator_with_mode(modes)
            .map(|(_, validator)| validator)
    }

    /// Like [`find_validator`](Self::find_validator), also reporting the chosen mode
    pub fn find_validator_with_mode(
        &self,
        modes: &[ValidationMode],
    ) -> Option<(ValidationMode, &dyn ContentValidator)> {
        modes.iter().find_map(|mode| {
            self.validators
                .get(mode)
                .map(|validator| (*mode, validator.as_ref()))
        })
    }

    /// Prefers the leading-bytes validator over a full parse
    pub fn validator_favour_speed(&self) -> Option<&dyn ContentValidator> {
        self.find_validator(&FAVOUR_SPEED)
    }

    /// Prefers a full parse over the leading-bytes validator
    pub fn validator_favour_accuracy(&self) -> Option<&dyn ContentValidator> {
        self.find_validator(&FAVOUR_ACCURACY)
    }

    /// Runs the preferred validator against `data`
    ///
    /// Returns `None` if this format has no validator for any of `modes`,
    /// in which case the caller can only rely on extension or MIME type.
    pub fn matches(&self, data: &[u8], modes: &[ValidationMode]) -> Option<bool> {
        self.find_validator(modes)
            .map(|validator| validator.matches(data))
    }
}

impl fmt::Debug for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatDescriptor")
            .field("name", &self.name)
            .field("short_name", &self.short_name)
            .field("file_extensions", &self.file_extensions)
            .field("mime_types", &self.mime_types)
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.short_name)
    }
}

/// Builder for [`FormatDescriptor`]
///
/// All checks happen in [`build`](Self::build); a descriptor that fails
/// them is never created.
#[derive(Clone)]
pub struct FormatDescriptorBuilder {
    name: String,
    short_name: Option<String>,
    file_extensions: Vec<String>,
    mime_types: Vec<String>,
    validators: BTreeMap<ValidationMode, Arc<dyn ContentValidator>>,
}

impl FormatDescriptorBuilder {
    /// Creates a new builder for a format with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: None,
            file_extensions: Vec::new(),
            mime_types: Vec::new(),
            validators: BTreeMap::new(),
        }
    }

    /// Sets the short name
    pub fn short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    /// Adds an allowed file extension
    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extensions.push(extension.into());
        self
    }

    /// Adds several allowed file extensions
    pub fn file_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_extensions
            .extend(extensions.into_iter().map(Into::into));
        self
    }

    /// Adds an allowed MIME type
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_types.push(mime_type.into());
        self
    }

    /// Adds several allowed MIME types
    pub fn mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_types.extend(mime_types.into_iter().map(Into::into));
        self
    }

    /// Registers the validator for `mode`, replacing any earlier one
    pub fn validator(
        mut self,
        mode: ValidationMode,
        validator: impl ContentValidator + 'static,
    ) -> Self {
        self.validators.insert(mode, Arc::new(validator));
        self
    }

    /// Validates the collected input and creates the descriptor
    pub fn build(self) -> Result<FormatDescriptor> {
        if self.name.is_empty() {
            return Err(Error::EmptyName);
        }

        if self.file_extensions.is_empty() {
            return Err(Error::NoFileExtensions { name: self.name });
        }
        if let Some(bad) = self
            .file_extensions
            .iter()
            .find(|ext| !is_valid_file_extension(ext))
        {
            return Err(Error::invalid_file_extension(bad.as_str()));
        }

        if self.mime_types.is_empty() {
            return Err(Error::NoMimeTypes { name: self.name });
        }
        if let Some(bad) = self.mime_types.iter().find(|mt| !is_valid_mime_type(mt)) {
            return Err(Error::invalid_mime_type(bad.as_str()));
        }

        let short_name = match self.short_name {
            Some(short_name) if !short_name.is_empty() => short_name,
            _ => self.name.clone(),
        };

        Ok(FormatDescriptor {
            name: self.name,
            short_name,
            file_extensions: self.file_extensions.into_iter().collect(),
            mime_types: self.mime_types.into_iter().collect(),
            validators: self.validators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::PrefixValidator;
    use pretty_assertions::assert_eq;

    fn pdf_builder() -> FormatDescriptorBuilder {
        FormatDescriptor::builder("Portable Document Format")
            .short_name("PDF")
            .file_extension("pdf")
            .mime_type("application/pdf")
    }

    #[test]
    fn test_build_valid_descriptor() {
        let descriptor = pdf_builder()
            .validator(ValidationMode::LeadingBytes, PrefixValidator::new([b"%PDF"]))
            .build()
            .unwrap();

        assert_eq!(descriptor.name(), "Portable Document Format");
        assert_eq!(descriptor.short_name(), "PDF");
        assert_eq!(
            descriptor.file_extensions().iter().collect::<Vec<_>>(),
            vec!["pdf"]
        );
        assert_eq!(
            descriptor.validation_modes().collect::<Vec<_>>(),
            vec![ValidationMode::LeadingBytes]
        );
        assert!(descriptor.supports(ValidationMode::LeadingBytes));
        assert!(!descriptor.supports(ValidationMode::FullParse));
    }

    #[test]
    fn test_short_name_defaults_to_name() {
        let descriptor = FormatDescriptor::builder("XML")
            .file_extension("xml")
            .mime_type("application/xml")
            .build()
            .unwrap();
        assert_eq!(descriptor.short_name(), "XML");

        let descriptor = FormatDescriptor::builder("XML")
            .short_name("")
            .file_extension("xml")
            .mime_type("application/xml")
            .build()
            .unwrap();
        assert_eq!(descriptor.short_name(), "XML");
    }

    #[test]
    fn test_construction_fails_fast() {
        let err = FormatDescriptor::builder("")
            .file_extension("pdf")
            .mime_type("application/pdf")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::EmptyName));

        let err = FormatDescriptor::builder("PDF")
            .mime_type("application/pdf")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::NoFileExtensions { .. }));

        let err = pdf_builder().file_extension(".pdf").build().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFileExtension { ref extension } if extension == ".pdf"
        ));

        let err = pdf_builder().file_extension("PDF").build().unwrap_err();
        assert!(matches!(err, Error::InvalidFileExtension { .. }));

        let err = FormatDescriptor::builder("PDF")
            .file_extension("pdf")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::NoMimeTypes { .. }));

        let err = pdf_builder()
            .mime_type("application/pdf; charset=utf-8")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMimeType { .. }));
    }

    #[test]
    fn test_no_validators_is_allowed() {
        let csv = FormatDescriptor::builder("Comma-separated values")
            .short_name("CSV")
            .file_extension("csv")
            .mime_type("text/csv")
            .build()
            .unwrap();

        assert!(csv.validator_favour_speed().is_none());
        assert!(csv.validator_favour_accuracy().is_none());
        assert_eq!(csv.matches(b"a,b,c", &FAVOUR_SPEED), None);
    }

    #[test]
    fn test_validator_priority_with_both_modes() {
        let descriptor = pdf_builder()
            .validator(ValidationMode::LeadingBytes, |_: &[u8]| true)
            .validator(ValidationMode::FullParse, |_: &[u8]| false)
            .build()
            .unwrap();

        assert!(descriptor.validator_favour_speed().unwrap().matches(b""));
        assert!(!descriptor.validator_favour_accuracy().unwrap().matches(b""));

        let (mode, _) = descriptor.find_validator_with_mode(&FAVOUR_ACCURACY).unwrap();
        assert_eq!(mode, ValidationMode::FullParse);
        let (mode, _) = descriptor.find_validator_with_mode(&FAVOUR_SPEED).unwrap();
        assert_eq!(mode, ValidationMode::LeadingBytes);
    }

    #[test]
    fn test_validator_priority_with_single_mode() {
        let descriptor = pdf_builder()
            .validator(ValidationMode::FullParse, |data: &[u8]| data == b"ok")
            .build()
            .unwrap();

        assert!(descriptor.validator_favour_speed().unwrap().matches(b"ok"));
        assert!(descriptor.validator_favour_accuracy().unwrap().matches(b"ok"));
        assert!(descriptor.find_validator(&[ValidationMode::LeadingBytes]).is_none());
        assert!(descriptor.find_validator(&[]).is_none());
    }

    #[test]
    fn test_pdf_leading_bytes() {
        let descriptor = pdf_builder()
            .validator(ValidationMode::LeadingBytes, PrefixValidator::new([b"%PDF"]))
            .build()
            .unwrap();

        assert_eq!(descriptor.matches(b"%PDF-1.6blafoo", &FAVOUR_SPEED), Some(true));
        assert_eq!(descriptor.matches(b"%PdF-1.6blafoo", &FAVOUR_SPEED), Some(false));
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let descriptor = FormatDescriptor::builder("Tagged Image File Format")
            .file_extensions(["tif", "tiff", "tif"])
            .mime_types(["image/tiff", "image/tiff"])
            .build()
            .unwrap();
        assert_eq!(descriptor.file_extensions().len(), 2);
        assert_eq!(descriptor.mime_types().len(), 1);
    }
}
