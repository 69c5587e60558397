//! Template source loading.
//!
//! A source string ending in `.sql` names a file on disk; anything else is
//! taken as inline SQL text. Files are read as UTF-8 with a Windows-1252
//! fallback (common for SQL files created on Windows).

use std::path::Path;

use encoding_rs::WINDOWS_1252;

use crate::error::TemplateError;

/// True when `source` names a template file rather than inline SQL text.
pub fn is_template_path(source: &str) -> bool {
    source.ends_with(".sql")
}

/// Read template text from a file. Any read or decode failure is fatal.
pub fn load_template(path: &Path) -> Result<String, TemplateError> {
    let read_error = |source| TemplateError::SourceRead {
        path: path.to_path_buf(),
        source,
    };

    let bytes = std::fs::read(path).map_err(read_error)?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let (decoded, _, had_errors) = WINDOWS_1252.decode(err.as_bytes());
            if had_errors {
                return Err(read_error(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "template contains invalid characters",
                )));
            }
            decoded.into_owned()
        }
    };

    // Strip UTF-8 BOM if present
    Ok(text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string())
}
