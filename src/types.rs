//! Type definitions and format limits

/// One worksheet row: cell values in column order, starting at column A.
pub type Row = Vec<String>;

/// Widest row the writer accepts.
pub const MAX_COLUMNS: usize = 16383;

/// Last row index a worksheet can address.
pub const MAX_ROWS: u32 = 1_048_576;

/// Row index the first row of a fresh document is written at.
///
/// The worksheet preamble freezes row 1 as a header pane, so whatever the
/// caller writes first is what stays pinned while scrolling.
pub const FIRST_ROW: u32 = 1;

/// What to do with characters XML 1.0 cannot represent (most C0 controls,
/// U+FFFE and U+FFFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidCharPolicy {
    /// Substitute U+FFFD and keep going.
    #[default]
    Replace,
    /// Fail the row with [`crate::XlsxError::Encoding`].
    Reject,
}
