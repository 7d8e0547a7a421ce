//! Byte decoding for input documents.
//!
//! A byte order mark wins, then the encoding named in the XML declaration.
//! Undeclared input is read as UTF-8, or as Windows-1252 when it is not
//! valid UTF-8.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Decode a whole document to text, without the byte order mark.
pub fn decode_document(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return encoding.decode_without_bom_handling(&bytes[bom_len..]).0;
    }

    match declared_encoding(bytes) {
        // A declaration readable as ASCII cannot describe UTF-16 content.
        Some(encoding) if encoding != UTF_8 && encoding.is_ascii_compatible() => {
            encoding.decode_without_bom_handling(bytes).0
        }
        _ => UTF_8
            .decode_without_bom_handling_and_without_replacement(bytes)
            .unwrap_or_else(|| WINDOWS_1252.decode_without_bom_handling(bytes).0),
    }
}

/// The encoding named by `<?xml ... encoding="..."?>` at the start of
/// `bytes`, if it is one `encoding_rs` knows.
pub fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let decl = bytes.strip_prefix(b"<?xml")?;
    let end = decl.windows(2).position(|w| w == b"?>")?;
    let decl = &decl[..end];

    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = decl[at + 8..].trim_ascii_start();
    let rest = rest.strip_prefix(b"=")?.trim_ascii_start();

    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = rest.iter().position(|&b| b == quote)?;
    Encoding::for_label(&rest[..len])
}
