//! Ordered parallel row encoding
//!
//! Three stages joined by bounded channels:
//!
//! ```text
//! rows -> admission -> [workers x N] -> merge -> sink
//!         (indexes)     (encode)         (reorder, write)
//! ```
//!
//! Admission numbers rows in arrival order. Workers encode whatever they pull,
//! so fragments reach the merge stage in any order. The merge stage, running
//! on the caller's thread, is the only one that touches the sink: it writes a
//! fragment when its index is the next one expected and parks it otherwise.
//! Output bytes therefore depend only on input order, never on scheduling.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::BTreeMap;
use std::io::{Seek, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::buffer_pool::BufferPool;
use super::encoder::RowEncoder;
use super::envelope::Envelope;
use crate::error::{Result, XlsxError};
use crate::types::Row;

/// Caller-driven stop signal for [`crate::XlsxWriter::write_all`].
///
/// Cloning shares the signal. Cancelling never un-writes committed rows; it
/// only stops further progress.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Destination of committed fragments.
pub trait FragmentSink {
    fn append(&mut self, fragment: &[u8]) -> Result<()>;
}

impl<W: Write + Seek> FragmentSink for Envelope<W> {
    #[inline]
    fn append(&mut self, fragment: &[u8]) -> Result<()> {
        Envelope::append(self, fragment)
    }
}

impl FragmentSink for Vec<u8> {
    #[inline]
    fn append(&mut self, fragment: &[u8]) -> Result<()> {
        self.extend_from_slice(fragment);
        Ok(())
    }
}

/// Where a run stopped.
///
/// `next_row` is always the index after the last committed fragment, also
/// when `result` is an error.
#[derive(Debug)]
pub struct Committed {
    pub next_row: u32,
    pub result: Result<usize>,
}

/// Stop condition shared by every stage: the caller cancelled, or the merge
/// stage gave up after an error.
#[derive(Clone)]
struct Halt {
    caller: CancelToken,
    abort: CancelToken,
}

impl Halt {
    #[inline]
    fn stopped(&self) -> bool {
        self.caller.is_cancelled() || self.abort.is_cancelled()
    }
}

struct Admitted {
    index: u32,
    cells: Row,
}

struct Encoded {
    index: u32,
    result: Result<Vec<u8>>,
}

struct Stages {
    admission: JoinHandle<usize>,
    workers: Vec<JoinHandle<()>>,
}

/// Fan-out encoder with an order-restoring merge.
pub struct OrderedPipeline {
    encoder: RowEncoder,
    pool: Arc<BufferPool>,
    workers: usize,
    queue_depth: usize,
}

impl OrderedPipeline {
    pub fn new(
        encoder: RowEncoder,
        pool: Arc<BufferPool>,
        workers: usize,
        queue_depth: usize,
    ) -> Self {
        OrderedPipeline {
            encoder,
            pool,
            workers: workers.max(1),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Encode `rows` in parallel and write them to `sink` as `start`,
    /// `start + 1`, ... in input order.
    ///
    /// On a sink or row error the run returns at once; workers are told to
    /// stop and left to wind down on their own. Cancellation is not an error:
    /// the result is the number of rows committed before it was observed.
    pub fn run<S, I>(&self, sink: &mut S, start: u32, rows: I, cancel: &CancelToken) -> Committed
    where
        S: FragmentSink + ?Sized,
        I: IntoIterator<Item = Row>,
        I::IntoIter: Send + 'static,
    {
        let encoder = self.encoder;
        let encode = move |buffer: &mut Vec<u8>, index: u32, cells: &Row| {
            encoder.encode(buffer, index, cells)
        };
        self.run_with(sink, start, rows, cancel, encode)
    }

    fn run_with<S, I, F>(
        &self,
        sink: &mut S,
        start: u32,
        rows: I,
        cancel: &CancelToken,
        encode: F,
    ) -> Committed
    where
        S: FragmentSink + ?Sized,
        I: IntoIterator<Item = Row>,
        I::IntoIter: Send + 'static,
        F: Fn(&mut Vec<u8>, u32, &Row) -> Result<()> + Clone + Send + 'static,
    {
        let halt = Halt {
            caller: cancel.clone(),
            abort: CancelToken::new(),
        };
        let (work_tx, work_rx) = bounded::<Admitted>(self.queue_depth);
        let (done_tx, done_rx) = bounded::<Encoded>(self.queue_depth);

        tracing::debug!(start_row = start, workers = self.workers, "pipeline started");

        let spawned = self.spawn(rows.into_iter(), start, &halt, work_tx, work_rx, done_tx, encode);
        let stages = match spawned {
            Ok(stages) => stages,
            Err(e) => {
                halt.abort.cancel();
                return Committed {
                    next_row: start,
                    result: Err(e),
                };
            }
        };

        let mut merge = Merge {
            sink,
            pool: &self.pool,
            next: start,
            pending: BTreeMap::new(),
            peak_pending: 0,
        };
        let merged = merge.drain(done_rx, cancel);
        let next_row = merge.next;
        let committed = (next_row - start) as usize;
        let peak_pending = merge.peak_pending;
        let unclaimed = merge.pending.len();
        drop(merge);

        let result = match merged {
            Err(e) => {
                halt.abort.cancel();
                tracing::warn!(next_row, error = %e, "pipeline aborted");
                Err(e)
            }
            Ok(()) if cancel.is_cancelled() => {
                halt.abort.cancel();
                tracing::warn!(committed, next_row, "pipeline cancelled");
                Ok(committed)
            }
            Ok(()) => {
                // Every stage has hung up, so joining cannot block.
                let panicked = stages
                    .workers
                    .into_iter()
                    .map(JoinHandle::join)
                    .filter(|joined| joined.is_err())
                    .count();
                if stages.admission.join().is_err() {
                    Err(XlsxError::SourcePanicked { row: next_row })
                } else if panicked > 0 || unclaimed > 0 {
                    Err(XlsxError::WorkerPanicked { row: next_row })
                } else {
                    Ok(committed)
                }
            }
        };

        tracing::debug!(committed, next_row, peak_pending, "pipeline finished");
        Committed { next_row, result }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn<It, F>(
        &self,
        rows: It,
        start: u32,
        halt: &Halt,
        work_tx: Sender<Admitted>,
        work_rx: Receiver<Admitted>,
        done_tx: Sender<Encoded>,
        encode: F,
    ) -> Result<Stages>
    where
        It: Iterator<Item = Row> + Send + 'static,
        F: Fn(&mut Vec<u8>, u32, &Row) -> Result<()> + Clone + Send + 'static,
    {
        let mut workers = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            let halt = halt.clone();
            let pool = Arc::clone(&self.pool);
            let encode = encode.clone();
            let handle = thread::Builder::new()
                .name(format!("xlsx-encode-{id}"))
                .spawn(move || encode_worker(encode, &pool, &halt, work_rx, done_tx))?;
            workers.push(handle);
        }
        // Workers hold the only remaining ends; the channels close when they exit.
        drop(work_rx);
        drop(done_tx);

        let halt = halt.clone();
        let admission = thread::Builder::new()
            .name("xlsx-admit".to_string())
            .spawn(move || admit(rows, start, &halt, work_tx))?;

        Ok(Stages { admission, workers })
    }
}

/// Number rows in arrival order and feed them to the workers.
///
/// Once stopped, the rest of the input is read and dropped rather than left
/// unconsumed: a producer blocked on a bounded channel feeding `rows` must
/// always be able to finish. Returns how many rows were discarded that way.
fn admit<It>(mut rows: It, start: u32, halt: &Halt, work_tx: Sender<Admitted>) -> usize
where
    It: Iterator<Item = Row>,
{
    let mut index = start;
    for cells in rows.by_ref() {
        if halt.stopped() {
            break;
        }
        if work_tx.send(Admitted { index, cells }).is_err() {
            break;
        }
        index = index.saturating_add(1);
    }
    drop(work_tx);

    let discarded = rows.count();
    if discarded > 0 {
        tracing::debug!(discarded, "drained input after stop");
    }
    discarded
}

/// Encode admitted rows until the feed closes or the run halts.
///
/// A panic while encoding is reported as that row's result, so the merge
/// stage stops on the row instead of parking everything behind it.
fn encode_worker<F>(
    encode: F,
    pool: &BufferPool,
    halt: &Halt,
    work_rx: Receiver<Admitted>,
    done_tx: Sender<Encoded>,
) where
    F: Fn(&mut Vec<u8>, u32, &Row) -> Result<()>,
{
    for Admitted { index, cells } in work_rx.iter() {
        if halt.stopped() {
            return;
        }
        let mut buffer = pool.acquire();
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| encode(&mut buffer, index, &cells)));
        let encoded = attempt.unwrap_or_else(|_| Err(XlsxError::WorkerPanicked { row: index }));
        let result = match encoded {
            Ok(()) => Ok(buffer),
            Err(e) => {
                pool.release(buffer);
                Err(e)
            }
        };
        if halt.stopped() {
            if let Ok(buffer) = result {
                pool.release(buffer);
            }
            return;
        }
        if done_tx.send(Encoded { index, result }).is_err() {
            return;
        }
    }
}

/// Reorder stage state. Lives on the caller's thread with the sink.
struct Merge<'a, S: FragmentSink + ?Sized> {
    sink: &'a mut S,
    pool: &'a BufferPool,
    next: u32,
    pending: BTreeMap<u32, Result<Vec<u8>>>,
    peak_pending: usize,
}

impl<S: FragmentSink + ?Sized> Merge<'_, S> {
    /// Consume fragments until every worker hangs up, the caller cancels, or a
    /// commit fails.
    fn drain(&mut self, done_rx: Receiver<Encoded>, cancel: &CancelToken) -> Result<()> {
        for Encoded { index, result } in done_rx.iter() {
            if cancel.is_cancelled() {
                self.release(result);
                return Ok(());
            }
            if index != self.next {
                self.pending.insert(index, result);
                self.peak_pending = self.peak_pending.max(self.pending.len());
                continue;
            }

            self.commit(result)?;
            // Drain every parked fragment the commit just made writable.
            while let Some(result) = self.pending.remove(&self.next) {
                if cancel.is_cancelled() {
                    self.release(result);
                    return Ok(());
                }
                self.commit(result)?;
            }
        }
        Ok(())
    }

    fn commit(&mut self, result: Result<Vec<u8>>) -> Result<()> {
        let buffer = result?;
        let written = self.sink.append(&buffer);
        self.pool.release(buffer);
        written?;
        self.next += 1;
        tracing::trace!(row = self.next - 1, "row committed");
        Ok(())
    }

    fn release(&mut self, result: Result<Vec<u8>>) {
        if let Ok(buffer) = result {
            self.pool.release(buffer);
        }
    }
}

impl<S: FragmentSink + ?Sized> Drop for Merge<'_, S> {
    fn drop(&mut self) {
        for (_, result) in std::mem::take(&mut self.pending) {
            if let Ok(buffer) = result {
                self.pool.release(buffer);
            }
        }
    }
}
