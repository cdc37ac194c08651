//! Streaming XLSX document writer
//!
//! Rows go straight into the compressed worksheet entry as they are written;
//! nothing but the rows currently being encoded is held in memory.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::fast_writer::{
    BufferPool, CancelToken, Envelope, FixedAssets, OrderedPipeline, RowEncoder, WriterOptions,
};
use crate::types::{Row, FIRST_ROW};

/// Single-sheet XLSX writer over any seekable byte sink.
///
/// Rows are numbered by the writer, starting at row 1. Row 1 is frozen as a
/// header pane, so the first row written is the header.
///
/// A failed write leaves the row cursor on the row that failed and the
/// archive open but incomplete. Row-level rejections (see
/// [`crate::XlsxError::is_row_error`]) leave the writer usable; a container
/// failure does not, and the output must be discarded.
///
/// # Examples
///
/// ```no_run
/// use xlsxstream::XlsxWriter;
///
/// let mut writer = XlsxWriter::create("output.xlsx")?;
/// writer.write_row(&["Name", "Age"])?;
/// writer.write_rows(vec![
///     vec!["Alice".to_string(), "30".to_string()],
///     vec!["Bob".to_string(), "25".to_string()],
/// ])?;
/// writer.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct XlsxWriter<W: Write + Seek> {
    envelope: Envelope<W>,
    next_row: u32,
    encoder: RowEncoder,
    pool: Arc<BufferPool>,
    options: WriterOptions,
}

impl XlsxWriter<BufWriter<File>> {
    /// Create `path` and write to it with standard assets and default options.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(64 * 1024, file);
        Self::new(writer)
    }
}

impl<W: Write + Seek> XlsxWriter<W> {
    /// Start a document on `sink` with standard assets and default options.
    pub fn new(sink: W) -> Result<Self> {
        Self::with_options(sink, &FixedAssets::standard(), WriterOptions::default())
    }

    /// Start a document on `sink` with the given fixed parts and tuning.
    pub fn with_options(sink: W, assets: &FixedAssets, options: WriterOptions) -> Result<Self> {
        let envelope = Envelope::open(sink, assets, options.compression_level)?;
        Ok(XlsxWriter {
            envelope,
            next_row: FIRST_ROW,
            encoder: RowEncoder::new(options.invalid_chars),
            pool: Arc::new(BufferPool::new(options.pool_retain, options.buffer_capacity)),
            options,
        })
    }

    /// Index the next row will be written at.
    pub fn next_row(&self) -> u32 {
        self.next_row
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> u32 {
        self.next_row - FIRST_ROW
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Encode and write one row on the calling thread.
    ///
    /// The cursor moves only if the row reached the archive.
    pub fn write_row<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<()> {
        let mut buffer = self.pool.acquire();
        let written = self
            .encoder
            .encode(&mut buffer, self.next_row, cells)
            .and_then(|()| self.envelope.append(&buffer));
        self.pool.release(buffer);
        written?;
        self.next_row += 1;
        Ok(())
    }

    /// Write rows from any source through the parallel pipeline.
    ///
    /// Rows are numbered from the current cursor in the order `rows` yields
    /// them and land in the file in that order. Works with a live
    /// `crossbeam_channel::Receiver<Row>` as well as an in-memory collection.
    ///
    /// Returns the number of rows committed. If `cancel` fires, writing stops
    /// and the rows committed so far are reported as success; the rest of the
    /// input is still consumed in the background so its producer can finish.
    /// On error the cursor stays on the first row not written.
    pub fn write_all<I>(&mut self, rows: I, cancel: &CancelToken) -> Result<usize>
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: Send + 'static,
    {
        let pipeline = OrderedPipeline::new(
            self.encoder,
            Arc::clone(&self.pool),
            self.options.workers,
            self.options.queue_depth,
        );
        let committed = pipeline.run(&mut self.envelope, self.next_row, rows, cancel);
        self.next_row = committed.next_row;
        committed.result
    }

    /// Write an in-memory batch through the parallel pipeline.
    pub fn write_rows(&mut self, rows: Vec<Row>) -> Result<usize> {
        self.write_all(rows, &CancelToken::new())
    }

    /// Finish the worksheet and the archive, returning the sink.
    pub fn close(self) -> Result<W> {
        tracing::debug!(rows = self.rows_written(), "closing document");
        self.envelope.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XlsxError;
    use crate::types::MAX_COLUMNS;
    use std::io::Cursor;

    fn memory_writer(workers: usize) -> XlsxWriter<Cursor<Vec<u8>>> {
        XlsxWriter::with_options(
            Cursor::new(Vec::new()),
            &FixedAssets::standard(),
            WriterOptions::with_workers(workers),
        )
        .unwrap()
    }

    #[test]
    fn test_sequential_cursor() -> Result<()> {
        let mut writer = memory_writer(1);
        assert_eq!(writer.next_row(), 1);
        writer.write_row(&["hi", "1234567890123456"])?;
        writer.write_row(&["12345678901234567890", "no"])?;
        assert_eq!(writer.next_row(), 3);
        assert_eq!(writer.rows_written(), 2);
        writer.close()?;
        Ok(())
    }

    #[test]
    fn test_rejected_row_does_not_advance() -> Result<()> {
        let mut writer = memory_writer(2);
        writer.write_row(&["header"])?;

        let too_wide = vec![String::from("x"); MAX_COLUMNS + 1];
        let err = writer.write_row(&too_wide).unwrap_err();
        assert!(matches!(err, XlsxError::ColumnLimitExceeded { .. }));
        assert!(err.is_row_error());
        assert_eq!(writer.next_row(), 2);

        writer.write_row(&["after"])?;
        assert_eq!(writer.next_row(), 3);
        Ok(())
    }

    #[test]
    fn test_mixed_paths_share_cursor() -> Result<()> {
        let mut writer = memory_writer(3);
        writer.write_row(&["id", "name"])?;
        let rows: Vec<Row> = (0..100)
            .map(|i| vec![i.to_string(), format!("name {i}")])
            .collect();
        assert_eq!(writer.write_rows(rows)?, 100);
        assert_eq!(writer.next_row(), 102);
        writer.write_row(&["total", "100"])?;
        assert_eq!(writer.next_row(), 103);
        Ok(())
    }

    #[test]
    fn test_pipeline_error_leaves_cursor_at_failed_row() {
        let mut writer = memory_writer(4);
        let mut rows: Vec<Row> = (0..50).map(|i| vec![i.to_string()]).collect();
        rows[20] = vec![String::new(); MAX_COLUMNS + 1];

        let err = writer.write_rows(rows).unwrap_err();
        assert!(matches!(err, XlsxError::ColumnLimitExceeded { .. }));
        assert_eq!(writer.next_row(), 21);
    }
}
