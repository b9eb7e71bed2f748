//! Error types for the fmtcheck-core library.
//!
//! This module provides error handling using the `thiserror` crate. Two
//! families of failure exist: construction errors, raised while building a
//! [`FormatDescriptor`](crate::FormatDescriptor) from malformed input, and
//! registration collisions, returned when a descriptor claims a key that is
//! already owned by another registered format.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fmtcheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all fmtcheck operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Descriptor name is empty
    #[error("file format name must not be empty")]
    EmptyName,

    /// Descriptor has no file extensions
    #[error("file format '{name}' must declare at least one file extension")]
    NoFileExtensions {
        /// Name of the descriptor being built
        name: String,
    },

    /// File extension is empty, has a leading dot or is not lowercase
    #[error("invalid file extension '{extension}': expected non-empty, lowercase, no leading dot")]
    InvalidFileExtension {
        /// The rejected extension
        extension: String,
    },

    /// Descriptor has no MIME types
    #[error("file format '{name}' must declare at least one MIME type")]
    NoMimeTypes {
        /// Name of the descriptor being built
        name: String,
    },

    /// MIME type is malformed, not lowercase or carries parameters
    #[error("invalid MIME type '{mime_type}': expected lowercase type/subtype without parameters")]
    InvalidMimeType {
        /// The rejected MIME type
        mime_type: String,
    },

    /// A format with the same name is already registered
    #[error("a file format with name '{name}' is already registered")]
    NameCollision {
        /// The contested name
        name: String,
    },

    /// The file extension is already claimed by another format
    #[error("the file extension '{extension}' is already registered by '{owner}'")]
    FileExtensionCollision {
        /// The contested extension
        extension: String,
        /// Name of the format currently owning the extension
        owner: String,
    },

    /// The MIME type is already claimed by another format
    #[error("the MIME type '{mime_type}' is already registered by '{owner}'")]
    MimeTypeCollision {
        /// The contested MIME type
        mime_type: String,
        /// Name of the format currently owning the MIME type
        owner: String,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new invalid file extension error
    pub fn invalid_file_extension(extension: impl Into<String>) -> Self {
        Self::InvalidFileExtension {
            extension: extension.into(),
        }
    }

    /// Creates a new invalid MIME type error
    pub fn invalid_mime_type(mime_type: impl Into<String>) -> Self {
        Self::InvalidMimeType {
            mime_type: mime_type.into(),
        }
    }

    /// Creates a new name collision error
    pub fn name_collision(name: impl Into<String>) -> Self {
        Self::NameCollision { name: name.into() }
    }

    /// Creates a new file extension collision error
    pub fn file_extension_collision(
        extension: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self::FileExtensionCollision {
            extension: extension.into(),
            owner: owner.into(),
        }
    }

    /// Creates a new MIME type collision error
    pub fn mime_type_collision(mime_type: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::MimeTypeCollision {
            mime_type: mime_type.into(),
            owner: owner.into(),
        }
    }

    /// Returns true if a registration was refused because a key is taken
    ///
    /// Collisions leave the registry untouched, so callers may choose to
    /// log and carry on.
    pub fn is_collision(&self) -> bool {
        matches!(
            self,
            Self::NameCollision { .. }
                | Self::FileExtensionCollision { .. }
                | Self::MimeTypeCollision { .. }
        )
    }
}
