//! JSON line serialization
//!
//! Records are written one per line. Without an explicit encoding every
//! non-ASCII character is escaped as `\uXXXX` (UTF-16 surrogate pairs above
//! the BMP) so files stay 7-bit clean; with `utf-8` characters are written
//! as-is.

use crate::output::{ExportError, ExportResult};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io::{self, Write};

/// Line terminator appended after every record
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";

/// Line terminator appended after every record
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Text encoding of exported lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEncoding {
    /// Escape all non-ASCII characters
    #[default]
    Ascii,
    /// Write raw UTF-8
    Utf8,
}

impl LineEncoding {
    /// Resolves the configured encoding name
    pub fn from_config(encoding: Option<&str>) -> ExportResult<Self> {
        match encoding.map(|name| name.trim().to_ascii_lowercase()) {
            None => Ok(Self::Ascii),
            Some(name) if name == "ascii" => Ok(Self::Ascii),
            Some(name) if name == "utf-8" || name == "utf8" => Ok(Self::Utf8),
            Some(name) => Err(ExportError::UnsupportedEncoding(name)),
        }
    }
}

/// Serializes a value as one JSON line, terminator included
pub fn to_json_line<T: Serialize + ?Sized>(
    value: &T,
    encoding: LineEncoding,
) -> ExportResult<Vec<u8>> {
    let mut line = Vec::with_capacity(256);

    match encoding {
        LineEncoding::Utf8 => serde_json::to_writer(&mut line, value)?,
        LineEncoding::Ascii => {
            let mut serializer = Serializer::with_formatter(&mut line, AsciiFormatter);
            value.serialize(&mut serializer)?;
        }
    }

    line.extend_from_slice(LINE_SEPARATOR.as_bytes());
    Ok(line)
}

/// Compact formatter that escapes non-ASCII string content
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;

        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }

            writer.write_all(&fragment.as_bytes()[start..index])?;

            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }

            start = index + ch.len_utf8();
        }

        writer.write_all(&fragment.as_bytes()[start..])
    }
}
