//! Streaming worksheet engine
//!
//! This module provides the pieces [`crate::XlsxWriter`] is built from:
//! - Column addressing and row encoding (pure, no I/O)
//! - A shared scratch-buffer pool
//! - The container envelope (ZIP + fixed parts + worksheet framing)
//! - The ordered parallel pipeline that fans encoding out to worker threads
//!   and writes the results back in row order

pub mod assets;
pub mod buffer_pool;
pub mod column;
pub mod encoder;
pub mod envelope;
pub mod options;
pub mod pipeline;

pub use assets::{FixedAssets, FixedAssetsBuilder, WORKSHEET_ENTRY};
pub use buffer_pool::BufferPool;
pub use column::{column_label, push_column_label};
pub use encoder::{encode_row, write_escaped, write_escaped_lossy, RowEncoder};
pub use envelope::{Envelope, SHEET_PREAMBLE, SHEET_TRAILER};
pub use options::WriterOptions;
pub use pipeline::{CancelToken, Committed, FragmentSink, OrderedPipeline};
