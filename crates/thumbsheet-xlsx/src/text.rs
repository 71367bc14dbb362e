//! Cell text encoding
//!
//! Characters that XML 1.0 cannot carry are stored in cell text as `_xHHHH_`.
//! A literal `_xHHHH_` sequence in the source text has its leading underscore
//! written as `_x005F_` so it survives decoding unchanged.

/// Whether XML 1.0 allows the character in document content
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// Code point of a `_xHHHH_` sequence at the start of `s`
fn escape_sequence(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.len() < 7 || &bytes[..2] != b"_x" || bytes[6] != b'_' {
        return None;
    }
    let hex = s.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Encode cell text so every character can be written to XML
pub(crate) fn encode_cell_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c == '_' && escape_sequence(&s[i..]).is_some() {
            out.push_str("_x005F_");
        } else if is_xml_char(c) {
            out.push(c);
        } else {
            out.push_str(&format!("_x{:04X}_", c as u32));
        }
    }
    out
}

/// Reverse [`encode_cell_text`]
pub(crate) fn decode_cell_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match escape_sequence(rest).and_then(char::from_u32) {
            Some(c) => {
                out.push(c);
                rest = &rest[7..];
            }
            None => {
                out.push('_');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Drop characters XML 1.0 cannot carry, for use in attribute values
pub(crate) fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars().filter(|&c| is_xml_char(c)).collect()
}

/// Whether `<t>` needs `xml:space="preserve"` to keep the text intact
pub(crate) fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}
