//! Built-in file formats.
//!
//! Each format is plain data: a name, its extensions and MIME types, and
//! the signatures its content starts with. Signature checks all go through
//! [`PrefixValidator`].
//!
//! | Format | Extensions | Signature |
//! |--------|------------|-----------|
//! | CSV    | `csv`      | none      |
//! | GIF    | `gif`      | `GIF87a`, `GIF89a` |
//! | PDF    | `pdf`      | `%PDF` |
//! | PNG    | `png`      | `89 50 4E 47 0D 0A 1A 0A` |
//! | PSD    | `psd`      | `8BPS` |
//! | TIFF   | `tif`, `tiff` | `II`, `MM` |
//! | XLS    | `xls`      | `D0 CF 11 E0` |
//! | XLSX   | `xlsx`     | `50 4B 03 04` |
//! | XML    | `xml`      | `<?` in eight encodings, with or without BOM |

#[cfg(feature = "xml-full-parse")]
mod xml;

use crate::descriptor::FormatDescriptor;
use crate::error::Result;
use crate::registry::{FormatSink, Registrar};
use crate::validation::{PrefixValidator, ValidationMode};
use once_cell::sync::Lazy;
use tracing::{debug, trace};

/// Name of the CSV format
pub const CSV: &str = "Comma-separated values";
/// Name of the GIF format
pub const GIF: &str = "Graphics Interchange Format";
/// Name of the PDF format
pub const PDF: &str = "Portable Document Format";
/// Name of the PNG format
pub const PNG: &str = "Portable Network Graphic";
/// Name of the PSD format
pub const PSD: &str = "Photoshop Document";
/// Name of the TIFF format
pub const TIFF: &str = "Tagged Image File Format";
/// Name of the XLS format
pub const XLS: &str = "Excel Document (before 2007)";
/// Name of the XLSX format
pub const XLSX: &str = "Excel Document";
/// Name of the XML format
pub const XML: &str = "XML";

const GIF87A: &[u8] = b"GIF87a";
const GIF89A: &[u8] = b"GIF89a";
const PDF_MAGIC: &[u8] = b"%PDF";
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const PSD_MAGIC: &[u8] = b"8BPS";
const TIFF_INTEL: &[u8] = b"II";
const TIFF_MOTOROLA: &[u8] = b"MM";
/// OLE2 compound document header
const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
/// ZIP local file header
const XLSX_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// Start of `<?xml` as it appears in each encoding XML may be written in
///
/// See appendix F.1 of the XML 1.0 recommendation.
const XML_DECLARATION_PROBES: [&[u8]; 8] = [
    // UCS-4, all four byte orders
    &[0x3C, 0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00],
    &[0x00, 0x3C, 0x00, 0x00, 0x00, 0x3F, 0x00, 0x00],
    &[0x00, 0x00, 0x3C, 0x00, 0x00, 0x00, 0x3F, 0x00],
    &[0x00, 0x00, 0x00, 0x3C, 0x00, 0x00, 0x00, 0x3F],
    // UTF-16BE, UTF-16LE
    &[0x00, 0x3C, 0x00, 0x3F],
    &[0x3C, 0x00, 0x3F, 0x00],
    // ASCII compatible: UTF-8, ISO-8859-x, ...
    &[0x3C, 0x3F, 0x78, 0x6D],
    // EBCDIC
    &[0x4C, 0x6F, 0xA7, 0x94],
];

/// Unicode byte order marks
const BYTE_ORDER_MARKS: [&[u8]; 15] = [
    // UTF-8
    &[0xEF, 0xBB, 0xBF],
    // UTF-16BE, UTF-16LE
    &[0xFE, 0xFF],
    &[0xFF, 0xFE],
    // UTF-32BE, UTF-32LE
    &[0x00, 0x00, 0xFE, 0xFF],
    &[0xFF, 0xFE, 0x00, 0x00],
    // UTF-7
    &[0x2B, 0x2F, 0x76, 0x38, 0x2D],
    &[0x2B, 0x2F, 0x76, 0x38],
    &[0x2B, 0x2F, 0x76, 0x39],
    &[0x2B, 0x2F, 0x76, 0x2B],
    &[0x2B, 0x2F, 0x76, 0x2F],
    // UTF-1
    &[0xF7, 0x64, 0x4C],
    // UTF-EBCDIC
    &[0xDD, 0x73, 0x66, 0x73],
    // SCSU
    &[0x0E, 0xFE, 0xFF],
    // GB 18030
    &[0x84, 0x31, 0x95, 0x33],
    // BOCU-1
    &[0xFB, 0xEE, 0x28],
];

/// Every XML probe, bare and prefixed with every byte order mark
static XML_PREFIXES: Lazy<Vec<Vec<u8>>> = Lazy::new(|| {
    let bare = XML_DECLARATION_PROBES.iter().map(|probe| probe.to_vec());
    let with_bom = BYTE_ORDER_MARKS.iter().flat_map(|bom| {
        XML_DECLARATION_PROBES
            .iter()
            .map(move |probe| [*bom, *probe].concat())
    });
    bare.chain(with_bom).collect()
});

fn leading_bytes(prefixes: &[&[u8]]) -> PrefixValidator {
    PrefixValidator::new(prefixes.iter().copied())
}

/// Comma-separated values; no content validation
pub fn csv() -> Result<FormatDescriptor> {
    FormatDescriptor::builder(CSV)
        .short_name("CSV")
        .file_extension("csv")
        .mime_type("text/csv")
        .build()
}

/// Graphics Interchange Format, both 87a and 89a
pub fn gif() -> Result<FormatDescriptor> {
    FormatDescriptor::builder(GIF)
        .short_name("GIF")
        .file_extension("gif")
        .mime_type("image/gif")
        .validator(ValidationMode::LeadingBytes, leading_bytes(&[GIF87A, GIF89A]))
        .build()
}

/// Portable Document Format
pub fn pdf() -> Result<FormatDescriptor> {
    FormatDescriptor::builder(PDF)
        .short_name("PDF")
        .file_extension("pdf")
        .mime_type("application/pdf")
        .validator(ValidationMode::LeadingBytes, leading_bytes(&[PDF_MAGIC]))
        .build()
}

/// Portable Network Graphic
pub fn png() -> Result<FormatDescriptor> {
    FormatDescriptor::builder(PNG)
        .short_name("PNG")
        .file_extension("png")
        .mime_type("image/png")
        .validator(ValidationMode::LeadingBytes, leading_bytes(&[PNG_MAGIC]))
        .build()
}

/// Adobe Photoshop Document
pub fn psd() -> Result<FormatDescriptor> {
    FormatDescriptor::builder(PSD)
        .short_name("PSD")
        .file_extension("psd")
        .mime_type("image/vnd.adobe.photoshop")
        .validator(ValidationMode::LeadingBytes, leading_bytes(&[PSD_MAGIC]))
        .build()
}

/// Tagged Image File Format, Intel and Motorola byte order
pub fn tiff() -> Result<FormatDescriptor> {
    FormatDescriptor::builder(TIFF)
        .short_name("TIFF")
        .file_extensions(["tif", "tiff"])
        .mime_type("image/tiff")
        .validator(
            ValidationMode::LeadingBytes,
            leading_bytes(&[TIFF_INTEL, TIFF_MOTOROLA]),
        )
        .build()
}

/// Legacy Excel workbook (OLE2 container)
pub fn xls() -> Result<FormatDescriptor> {
    FormatDescriptor::builder(XLS)
        .short_name("XLS")
        .file_extension("xls")
        .mime_type("application/vnd.ms-excel")
        .validator(ValidationMode::LeadingBytes, leading_bytes(&[XLS_MAGIC]))
        .build()
}

/// Office Open XML workbook (ZIP container)
pub fn xlsx() -> Result<FormatDescriptor> {
    FormatDescriptor::builder(XLSX)
        .short_name("XLSX")
        .file_extension("xlsx")
        .mime_type("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        .validator(ValidationMode::LeadingBytes, leading_bytes(&[XLSX_MAGIC]))
        .build()
}

/// Extensible Markup Language
///
/// With the `xml-full-parse` feature the descriptor also carries a
/// [`ValidationMode::FullParse`] validator checking well-formedness.
pub fn xml() -> Result<FormatDescriptor> {
    let builder = FormatDescriptor::builder(XML)
        .short_name("XML")
        .file_extension("xml")
        .mime_types(["application/xml", "text/xml"])
        .validator(
            ValidationMode::LeadingBytes,
            PrefixValidator::new(XML_PREFIXES.iter()),
        );

    #[cfg(feature = "xml-full-parse")]
    let builder = builder.validator(ValidationMode::FullParse, xml::WellFormedXml);

    builder.build()
}

/// All built-in formats, in registration order
pub fn all() -> [fn() -> Result<FormatDescriptor>; 9] {
    [csv, gif, pdf, png, psd, tiff, xls, xlsx, xml]
}

/// Registrar for the built-in formats
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFormats;

impl Registrar for BuiltinFormats {
    /// Registers every built-in format
    ///
    /// A collision skips only the affected format; the remaining formats
    /// are still registered.
    fn register_formats(&self, sink: &mut dyn FormatSink) -> Result<()> {
        for make in all() {
            let descriptor = make()?;
            trace!("Registering built-in format {}", descriptor.name());
            if let Err(e) = sink.register(descriptor) {
                debug!("Skipped built-in format: {}", e);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "builtin"
    }
}
