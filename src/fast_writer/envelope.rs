//! Container envelope: archive, fixed parts and worksheet framing
//!
//! Opens the ZIP, copies the fixed assets, starts the worksheet entry and
//! writes its preamble. From then on the envelope is an append-only stream
//! for `<row>` fragments until [`Envelope::finish`] writes the trailer and
//! the central directory.

use s_zip::StreamingZipWriter;
use std::io::{Seek, Write};

use super::assets::{FixedAssets, WORKSHEET_ENTRY};
use crate::error::{Result, XlsxError};

/// Worksheet XML up to and including `<sheetData>`.
///
/// Freezes row 1 so it stays visible as a header while scrolling.
pub const SHEET_PREAMBLE: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="x14ac" xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac"><dimension ref="A1"/><sheetViews><sheetView tabSelected="1" workbookViewId="0"><pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/><selection pane="bottomLeft"/></sheetView></sheetViews><sheetFormatPr defaultRowHeight="15" x14ac:dyDescent="0.25"/><sheetData>"#;

/// Worksheet XML closing `<sheetData>` and the document.
pub const SHEET_TRAILER: &[u8] = b"<autoFilter/></sheetData></worksheet>";

/// Open archive with the worksheet entry positioned for row fragments.
pub struct Envelope<W: Write + Seek> {
    zip: StreamingZipWriter<W>,
    bytes_appended: u64,
}

impl<W: Write + Seek> Envelope<W> {
    /// Start the archive on `sink`, write every asset, then open the worksheet.
    pub fn open(sink: W, assets: &FixedAssets, compression_level: u32) -> Result<Self> {
        if assets.contains(WORKSHEET_ENTRY) {
            return Err(XlsxError::ContainerIo {
                context: "writing fixed assets",
                message: format!(
                    "{} is generated and cannot be supplied as an asset",
                    WORKSHEET_ENTRY
                ),
            });
        }

        let mut zip =
            StreamingZipWriter::from_writer_with_compression(sink, compression_level.min(9))
                .map_err(|e| XlsxError::container("creating archive", e))?;

        for (name, bytes) in assets.iter() {
            zip.start_entry(name)
                .map_err(|e| XlsxError::container("starting asset entry", e))?;
            zip.write_data(bytes)
                .map_err(|e| XlsxError::container("writing asset entry", e))?;
        }

        zip.start_entry(WORKSHEET_ENTRY)
            .map_err(|e| XlsxError::container("starting worksheet entry", e))?;
        zip.write_data(SHEET_PREAMBLE)
            .map_err(|e| XlsxError::container("writing worksheet preamble", e))?;

        tracing::debug!(assets = assets.len(), compression_level, "container opened");

        Ok(Envelope {
            zip,
            bytes_appended: 0,
        })
    }

    /// Append one encoded fragment verbatim. Ordering is the caller's job.
    #[inline]
    pub fn append(&mut self, fragment: &[u8]) -> Result<()> {
        self.zip
            .write_data(fragment)
            .map_err(|e| XlsxError::container("writing row data", e))?;
        self.bytes_appended += fragment.len() as u64;
        Ok(())
    }

    /// Uncompressed bytes of row data appended so far.
    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended
    }

    /// Write the trailer, finalize the archive and give the sink back.
    pub fn finish(mut self) -> Result<W> {
        self.zip
            .write_data(SHEET_TRAILER)
            .map_err(|e| XlsxError::container("writing worksheet trailer", e))?;
        let mut sink = self
            .zip
            .finish()
            .map_err(|e| XlsxError::container("finalizing archive", e))?;
        sink.flush()
            .map_err(|e| XlsxError::container("flushing output", e))?;

        tracing::debug!(row_bytes = self.bytes_appended, "container finalized");
        Ok(sink)
    }
}
