//! Syntax checks for registry keys.
//!
//! File extensions and MIME types are used verbatim as map keys, so both
//! must already be in canonical form: lowercase, extension without leading
//! dot, MIME type without parameters. The same checks gate descriptor
//! construction and short-circuit lookups with malformed keys.

use mime::Mime;
use std::path::Path;

/// Checks whether `s` is a canonical file extension.
///
/// Valid extensions are non-empty, don't start with a dot and are all
/// lowercase.
pub fn is_valid_file_extension(s: &str) -> bool {
    !s.is_empty() && !s.starts_with('.') && is_lowercase(s)
}

/// Checks whether `s` is a canonical MIME type.
///
/// Valid MIME types are non-empty, all lowercase, syntactically well-formed
/// and carry no parameters (as in `; charset=utf-8`).
pub fn is_valid_mime_type(s: &str) -> bool {
    if s.is_empty() || !is_lowercase(s) {
        return false;
    }
    match s.parse::<Mime>() {
        Ok(mime) => mime.params().next().is_none(),
        Err(_) => false,
    }
}

/// Returns the parameter-free `type/subtype` form of a parsed MIME type
pub fn mime_essence(mime: &Mime) -> String {
    mime.essence_str().to_owned()
}

/// Returns the lowercased extension of `path`, if it has one
pub fn file_extension_of(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

fn is_lowercase(s: &str) -> bool {
    s.to_lowercase() == s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_syntax() {
        assert!(is_valid_file_extension("pdf"));
        assert!(is_valid_file_extension("tar.gz"));
        assert!(!is_valid_file_extension(""));
        assert!(!is_valid_file_extension(".pdf"));
        assert!(!is_valid_file_extension("PDF"));
        assert!(!is_valid_file_extension("Pdf"));
    }

    #[test]
    fn test_mime_type_syntax() {
        assert!(is_valid_mime_type("application/pdf"));
        assert!(is_valid_mime_type("application/vnd.ms-excel"));
        assert!(!is_valid_mime_type(""));
        assert!(!is_valid_mime_type("Application/PDF"));
        assert!(!is_valid_mime_type("application/pdf; x=y"));
        assert!(!is_valid_mime_type("application/pdf; charset=utf-8"));
        assert!(!is_valid_mime_type("not a mime type"));
    }

    #[test]
    fn test_mime_essence_drops_parameters() {
        let mime: Mime = "text/csv; charset=utf-8".parse().unwrap();
        assert_eq!(mime_essence(&mime), "text/csv");
        assert_eq!(mime_essence(&mime::APPLICATION_PDF), "application/pdf");
    }

    #[test]
    fn test_file_extension_of() {
        assert_eq!(file_extension_of("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension_of("/tmp/a/b.tiff").as_deref(), Some("tiff"));
        assert_eq!(file_extension_of("Makefile"), None);
        assert_eq!(file_extension_of(".hidden"), None);
    }
}
