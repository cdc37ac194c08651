//! # xlsxstream
//!
//! Streaming XLSX writer that encodes rows in parallel and still writes them
//! in exact input order.
//!
//! ## Features
//!
//! - **Streaming Write**: rows are compressed into the archive as they arrive;
//!   memory use does not grow with row count
//! - **Parallel Encoding**: XML generation fans out over a worker pool while a
//!   single merge stage keeps the byte stream in row order
//! - **Deterministic Output**: the worksheet is byte-identical whatever the
//!   worker count or thread scheduling
//! - **Live Sources**: feed rows from any iterator or channel, with cancellation
//! - **Any Sink**: files, in-memory buffers, anything `Write + Seek`
//!
//! Cells are written as inline strings; there is one worksheet, and row 1 is
//! frozen as the header.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xlsxstream::{CancelToken, XlsxWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = XlsxWriter::create("report.xlsx")?;
//!
//! // Header row, written on the calling thread
//! writer.write_row(&["ID", "Name", "Email"])?;
//!
//! // Bulk rows, encoded in parallel
//! let (tx, rx) = crossbeam_channel::bounded(1024);
//! std::thread::spawn(move || {
//!     for i in 0..100_000 {
//!         let row = vec![i.to_string(), format!("user{i}"), format!("user{i}@example.com")];
//!         if tx.send(row).is_err() {
//!             break;
//!         }
//!     }
//! });
//! writer.write_all(rx, &CancelToken::new())?;
//!
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fast_writer;
pub mod types;
pub mod writer;

pub use error::{Result, XlsxError};
pub use fast_writer::{column_label, encode_row, CancelToken, FixedAssets, WriterOptions};
pub use types::{InvalidCharPolicy, Row, MAX_COLUMNS, MAX_ROWS};
pub use writer::XlsxWriter;
