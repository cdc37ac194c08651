//! Error types for the xlsxstream library

use thiserror::Error;

/// Result type alias for xlsxstream operations
pub type Result<T> = std::result::Result<T, XlsxError>;

/// Main error type for all writer operations
#[derive(Error, Debug)]
pub enum XlsxError {
    /// The archive service failed while opening, writing or finalizing an entry.
    ///
    /// Fatal to the current write; the container is left incomplete.
    #[error("Container I/O failed while {context}: {message}")]
    ContainerIo {
        context: &'static str,
        message: String,
    },

    /// IO error wrapper (creating the destination file)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Row is wider than the format allows. Nothing is written for it.
    #[error("Excel only supports 16383 columns, but this data has {count}")]
    ColumnLimitExceeded { count: usize },

    /// Row index is past the last row a worksheet can hold.
    #[error("Excel only supports 1048576 rows, cannot write row {row}")]
    RowLimitExceeded { row: u32 },

    /// A cell holds a character XML 1.0 cannot carry.
    #[error("Cell {column}{row} contains character U+{code:04X} which cannot be encoded in XML")]
    Encoding {
        row: u32,
        column: String,
        code: u32,
    },

    /// An encoding worker panicked before delivering its row.
    #[error("Encoding worker panicked while row {row} was pending")]
    WorkerPanicked { row: u32 },

    /// The row source panicked while being read; rows before `row` were written.
    #[error("Row source panicked before row {row} was admitted")]
    SourcePanicked { row: u32 },
}

impl XlsxError {
    pub(crate) fn container<E: std::fmt::Display>(context: &'static str, err: E) -> Self {
        XlsxError::ContainerIo {
            context,
            message: err.to_string(),
        }
    }

    /// Whether the error concerns a single row and left the writer usable.
    ///
    /// Container failures are not recoverable; a row-level rejection is, and
    /// the caller may skip the row and keep writing.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            XlsxError::ColumnLimitExceeded { .. }
                | XlsxError::RowLimitExceeded { .. }
                | XlsxError::Encoding { .. }
        )
    }
}
