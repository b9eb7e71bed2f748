//! The file format registry.
//!
//! [`FormatRegistry`] indexes [`FormatDescriptor`]s by name, file extension
//! and MIME type. Every key is owned by at most one descriptor; a
//! registration that would break this is refused as a whole.
//!
//! All three indexes sit behind one reader-writer lock. Lookups take it in
//! shared mode, registration and reinitialization in exclusive mode.
//!
//! ## Registrars
//!
//! The registry does not know which formats exist. It is populated by
//! [`Registrar`]s handed to it by the application at startup:
//!
//! ```
//! use fmtcheck_core::{FormatDescriptor, FormatRegistry, FormatSink, Registrar, Result};
//!
//! struct Markdown;
//!
//! impl Registrar for Markdown {
//!     fn register_formats(&self, sink: &mut dyn FormatSink) -> Result<()> {
//!         let md = FormatDescriptor::builder("Markdown")
//!             .file_extensions(["md", "markdown"])
//!             .mime_type("text/markdown")
//!             .build()?;
//!         sink.register(md)
//!     }
//! }
//!
//! let registry = FormatRegistry::with_registrars(vec![Box::new(Markdown) as Box<dyn Registrar>]);
//! assert_eq!(registry.get_by_file_extension("md").unwrap().name(), "Markdown");
//! ```

use crate::descriptor::FormatDescriptor;
use crate::error::{Error, Result};
use crate::formats::BuiltinFormats;
use crate::keys::{is_valid_file_extension, is_valid_mime_type, mime_essence};
use indexmap::IndexMap;
use mime::Mime;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Target for format registration
///
/// Implemented by the registry itself and by the locked index a
/// [`Registrar`] receives during [`FormatRegistry::reinitialize`].
pub trait FormatSink {
    /// Registers a descriptor, failing if any of its keys is already taken
    fn register(&mut self, descriptor: FormatDescriptor) -> Result<()>;
}

/// Supplies a set of formats to a registry
pub trait Registrar: Send + Sync {
    /// Registers all formats this registrar knows about
    ///
    /// A returned error is logged by the registry and does not stop other
    /// registrars from running.
    fn register_formats(&self, sink: &mut dyn FormatSink) -> Result<()>;

    /// Name used in log output
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Registrar for F
where
    F: Fn(&mut dyn FormatSink) -> Result<()> + Send + Sync,
{
    fn register_formats(&self, sink: &mut dyn FormatSink) -> Result<()> {
        self(sink)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// The three key-disjoint maps, always updated together
#[derive(Default)]
struct FormatIndex {
    by_name: IndexMap<String, Arc<FormatDescriptor>>,
    by_file_extension: HashMap<String, Arc<FormatDescriptor>>,
    by_mime_type: HashMap<String, Arc<FormatDescriptor>>,
}

impl FormatIndex {
    fn clear(&mut self) {
        self.by_name.clear();
        self.by_file_extension.clear();
        self.by_mime_type.clear();
    }

    /// Returns the first key of `descriptor` that is already taken
    fn find_collision(&self, descriptor: &FormatDescriptor) -> Option<Error> {
        if self.by_name.contains_key(descriptor.name()) {
            return Some(Error::name_collision(descriptor.name()));
        }

        for extension in descriptor.file_extensions() {
            if let Some(owner) = self.by_file_extension.get(extension) {
                return Some(Error::file_extension_collision(
                    extension.as_str(),
                    owner.name(),
                ));
            }
        }

        for mime_type in descriptor.mime_types() {
            if let Some(owner) = self.by_mime_type.get(mime_type) {
                return Some(Error::mime_type_collision(
                    mime_type.as_str(),
                    owner.name(),
                ));
            }
        }

        None
    }
}

impl FormatSink for FormatIndex {
    fn register(&mut self, descriptor: FormatDescriptor) -> Result<()> {
        if let Some(err) = self.find_collision(&descriptor) {
            error!(
                "Refusing to register file format '{}': {}",
                descriptor.name(),
                err
            );
            return Err(err);
        }

        info!(
            "Registering file format '{}' ({})",
            descriptor.name(),
            descriptor.short_name()
        );

        // Single mutation point: all checks above have passed
        let descriptor = Arc::new(descriptor);
        for extension in descriptor.file_extensions() {
            self.by_file_extension
                .insert(extension.clone(), Arc::clone(&descriptor));
        }
        for mime_type in descriptor.mime_types() {
            self.by_mime_type
                .insert(mime_type.clone(), Arc::clone(&descriptor));
        }
        self.by_name
            .insert(descriptor.name().to_owned(), descriptor);
        Ok(())
    }
}

/// Thread-safe registry of file format descriptors
///
/// The registry is an ordinary value: construct it once at startup and
/// share it (by reference or `Arc`) with whoever needs to classify content.
pub struct FormatRegistry {
    index: RwLock<FormatIndex>,
    registrars: Vec<Box<dyn Registrar>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Creates an empty registry without registrars
    pub fn new() -> Self {
        Self {
            index: RwLock::new(FormatIndex::default()),
            registrars: Vec::new(),
        }
    }

    /// Creates a registry populated by the given registrars
    ///
    /// Registrars run in the given order, here and on every
    /// [`reinitialize`](Self::reinitialize).
    pub fn with_registrars(registrars: Vec<Box<dyn Registrar>>) -> Self {
        let registry = Self {
            index: RwLock::new(FormatIndex::default()),
            registrars,
        };
        registry.reinitialize();
        registry
    }

    /// Creates a registry populated with the built-in formats
    pub fn with_builtin_formats() -> Self {
        Self::with_registrars(vec![Box::new(BuiltinFormats) as Box<dyn Registrar>])
    }

    /// Registers a new descriptor
    ///
    /// Fails without touching the registry if the name, any file extension
    /// or any MIME type is already registered. Checks run in that order and
    /// stop at the first collision.
    pub fn register(&self, descriptor: FormatDescriptor) -> Result<()> {
        self.index.write().register(descriptor)
    }

    /// Looks up a descriptor by its name
    pub fn get_by_name(&self, name: &str) -> Option<Arc<FormatDescriptor>> {
        self.index.read().by_name.get(name).cloned()
    }

    /// Looks up a descriptor by file extension
    ///
    /// The extension must be lowercase and have no leading dot; anything
    /// else yields `None` without consulting the index.
    pub fn get_by_file_extension(&self, extension: &str) -> Option<Arc<FormatDescriptor>> {
        if !is_valid_file_extension(extension) {
            return None;
        }
        self.index.read().by_file_extension.get(extension).cloned()
    }

    /// Looks up a descriptor by MIME type
    ///
    /// The MIME type must be lowercase, well-formed and without parameters;
    /// anything else yields `None` without consulting the index.
    pub fn get_by_mime_type(&self, mime_type: &str) -> Option<Arc<FormatDescriptor>> {
        if !is_valid_mime_type(mime_type) {
            return None;
        }
        self.index.read().by_mime_type.get(mime_type).cloned()
    }

    /// Looks up a descriptor by a parsed MIME type, ignoring its parameters
    pub fn get_by_mime(&self, mime: Option<&Mime>) -> Option<Arc<FormatDescriptor>> {
        mime.and_then(|mime| self.get_by_mime_type(&mime_essence(mime)))
    }

    /// Snapshot of all descriptors keyed by name, in registration order
    pub fn descriptors(&self) -> IndexMap<String, Arc<FormatDescriptor>> {
        self.index.read().by_name.clone()
    }

    /// Snapshot of all registered file extensions, in no particular order
    pub fn file_extensions(&self) -> Vec<String> {
        self.index.read().by_file_extension.keys().cloned().collect()
    }

    /// Snapshot of all registered MIME types, in no particular order
    pub fn mime_types(&self) -> Vec<String> {
        self.index.read().by_mime_type.keys().cloned().collect()
    }

    /// Number of registered formats
    pub fn len(&self) -> usize {
        self.index.read().by_name.len()
    }

    /// Returns true if no format is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the registry and runs all registrars again
    ///
    /// The write lock is held from the clear until the last registrar has
    /// returned, so readers see either the old or the fully repopulated
    /// state. A slow registrar blocks every reader for its duration.
    pub fn reinitialize(&self) {
        debug!("Reinitializing file format registry");

        let count = {
            let mut index = self.index.write();
            index.clear();

            for registrar in &self.registrars {
                debug!("Running registrar {}", registrar.name());
                if let Err(e) = registrar.register_formats(&mut *index) {
                    warn!("Registrar {} failed: {}", registrar.name(), e);
                }
            }

            index.by_name.len()
        };

        debug!("{} file formats registered", count);
    }
}

impl FormatSink for &FormatRegistry {
    fn register(&mut self, descriptor: FormatDescriptor) -> Result<()> {
        FormatRegistry::register(self, descriptor)
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.index.read();
        f.debug_struct("FormatRegistry")
            .field("formats", &index.by_name.keys().collect::<Vec<_>>())
            .field("file_extension_count", &index.by_file_extension.len())
            .field("mime_type_count", &index.by_mime_type.len())
            .field("registrar_count", &self.registrars.len())
            .finish()
    }
}
