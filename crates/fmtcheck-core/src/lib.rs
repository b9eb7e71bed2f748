//! # fmtcheck-core
//!
//! A library for verifying that binary content really is of the file format
//! its extension or MIME type claims.
//!
//! This crate provides the core functionality for:
//! - Describing file formats by name, extensions, MIME types and content validators
//! - Indexing formats in a thread-safe registry with unique keys
//! - Picking a validator by speed or accuracy preference and running it
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`validation`]: Validation modes and the content validator trait
//! - [`descriptor`]: Immutable file format descriptors
//! - [`registry`]: The format registry and its registrars
//! - [`formats`]: Built-in format definitions
//! - [`check`]: Checking files and buffers against their claimed format
//! - [`keys`]: Syntax of file extension and MIME type keys
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use fmtcheck_core::{Checker, CheckOutcome, FormatRegistry};
//!
//! let registry = FormatRegistry::with_builtin_formats();
//!
//! // Which format claims the extension?
//! let pdf = registry.get_by_file_extension("pdf").expect("PDF is built in");
//! println!("{} validates with {:?}", pdf, pdf.validation_modes().collect::<Vec<_>>());
//!
//! // Is the upload what it says it is?
//! let report = Checker::new(&registry).check_file("./upload.pdf")?;
//! if report.outcome == CheckOutcome::Mismatched {
//!     eprintln!("upload.pdf is not a PDF");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! The library provides several traits for customization:
//!
//! - [`ContentValidator`]: Plug in a check for a format's content
//! - [`Registrar`]: Supply additional formats to a registry
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod check;
pub mod descriptor;
pub mod error;
pub mod formats;
pub mod keys;
pub mod registry;
pub mod validation;

// Re-export primary types for convenience
pub use check::{CheckConfig, CheckOutcome, CheckReport, Checker};
pub use descriptor::{FormatDescriptor, FormatDescriptorBuilder};
pub use error::{Error, Result};
pub use formats::BuiltinFormats;
pub use registry::{FormatRegistry, FormatSink, Registrar};
pub use validation::{
    ContentValidator, PrefixValidator, ValidationMode, FAVOUR_ACCURACY, FAVOUR_SPEED,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
