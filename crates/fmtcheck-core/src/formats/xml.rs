//! Structural XML validation.

use crate::validation::ContentValidator;
use quick_xml::events::Event;
use quick_xml::Reader;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Full-parse validator accepting exactly one well-formed XML document
///
/// The document must have a single root element and balanced tags. Only
/// UTF-8 (optionally with BOM) and ASCII compatible encodings are read;
/// documents in UTF-16 or UCS-4 do not pass.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WellFormedXml;

impl ContentValidator for WellFormedXml {
    fn matches(&self, data: &[u8]) -> bool {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

        let mut reader = Reader::from_reader(data);
        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut seen_root = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(_)) => {
                    if depth == 0 {
                        if seen_root {
                            return false;
                        }
                        seen_root = true;
                    }
                    depth += 1;
                }
                Ok(Event::Empty(_)) => {
                    if depth == 0 {
                        if seen_root {
                            return false;
                        }
                        seen_root = true;
                    }
                }
                Ok(Event::End(_)) => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                Ok(Event::Text(text)) => {
                    // Only whitespace may surround the root element
                    if depth == 0 && !text.iter().all(u8::is_ascii_whitespace) {
                        return false;
                    }
                }
                Ok(Event::Eof) => return seen_root && depth == 0,
                Err(_) => return false,
                _ => {}
            }
            buf.clear();
        }
    }
}
