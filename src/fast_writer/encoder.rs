//! Row encoding: one row of strings to its `<row>` fragment
//!
//! Pure transform with no I/O. Every cell becomes an inline string cell so no
//! shared-string table has to be kept across rows, which is what lets rows be
//! encoded independently of each other.

use super::column::{column_label, push_column_label};
use crate::error::{Result, XlsxError};
use crate::types::{InvalidCharPolicy, MAX_COLUMNS, MAX_ROWS};

/// Stateless row encoder, cheap to copy into every worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowEncoder {
    policy: InvalidCharPolicy,
}

impl RowEncoder {
    pub fn new(policy: InvalidCharPolicy) -> Self {
        RowEncoder { policy }
    }

    /// Append the fragment for `cells` at 1-based `row` to `buffer`.
    ///
    /// On error `buffer` is restored to its original length, so a rejected
    /// row never leaves partial markup behind.
    pub fn encode<S: AsRef<str>>(&self, buffer: &mut Vec<u8>, row: u32, cells: &[S]) -> Result<()> {
        if cells.len() > MAX_COLUMNS {
            return Err(XlsxError::ColumnLimitExceeded { count: cells.len() });
        }
        if row == 0 || row > MAX_ROWS {
            return Err(XlsxError::RowLimitExceeded { row });
        }

        let start = buffer.len();
        let mut num_buffer = itoa::Buffer::new();
        let row_str = num_buffer.format(row).as_bytes();

        buffer.extend_from_slice(b"<row r=\"");
        buffer.extend_from_slice(row_str);
        buffer.extend_from_slice(b"\">");

        for (col_idx, value) in cells.iter().enumerate() {
            buffer.extend_from_slice(b"<c r=\"");
            push_column_label(buffer, col_idx);
            buffer.extend_from_slice(row_str);
            buffer.extend_from_slice(b"\" t=\"inlineStr\"><is><t>");
            if let Err(bad) = write_escaped(buffer, value.as_ref(), self.policy) {
                buffer.truncate(start);
                return Err(XlsxError::Encoding {
                    row,
                    column: column_label(col_idx),
                    code: bad as u32,
                });
            }
            buffer.extend_from_slice(b"</t></is></c>");
        }

        buffer.extend_from_slice(b"</row>");
        Ok(())
    }
}

/// Encode one row into a fresh buffer with the default policy.
pub fn encode_row<S: AsRef<str>>(row: u32, cells: &[S]) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(64 + cells.len() * 48);
    RowEncoder::default().encode(&mut buffer, row, cells)?;
    Ok(buffer)
}

/// Append `text` to `buffer` with XML text escaping.
///
/// Whitespace controls are written as character references so readers do not
/// normalize them away. Returns the offending character when `policy` is
/// [`InvalidCharPolicy::Reject`] and the text holds one XML cannot carry.
pub fn write_escaped(
    buffer: &mut Vec<u8>,
    text: &str,
    policy: InvalidCharPolicy,
) -> std::result::Result<(), char> {
    let bytes = text.as_bytes();
    let mut last = 0;
    for (i, c) in text.char_indices() {
        let escaped: &[u8] = match c {
            '&' => b"&amp;",
            '<' => b"&lt;",
            '>' => b"&gt;",
            '"' => b"&#34;",
            '\'' => b"&#39;",
            '\t' => b"&#x9;",
            '\n' => b"&#xA;",
            '\r' => b"&#xD;",
            c if is_xml_char(c) => continue,
            c => match policy {
                InvalidCharPolicy::Replace => "\u{FFFD}".as_bytes(),
                InvalidCharPolicy::Reject => return Err(c),
            },
        };
        buffer.extend_from_slice(&bytes[last..i]);
        buffer.extend_from_slice(escaped);
        last = i + c.len_utf8();
    }
    buffer.extend_from_slice(&bytes[last..]);
    Ok(())
}

/// [`write_escaped`] with [`InvalidCharPolicy::Replace`], which cannot fail.
pub fn write_escaped_lossy(buffer: &mut Vec<u8>, text: &str) {
    // Replace substitutes every unrepresentable character instead of reporting it.
    write_escaped(buffer, text, InvalidCharPolicy::Replace).unwrap_or(())
}

#[inline]
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}
