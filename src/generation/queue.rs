//! Ordered column rendering.
//!
//! Columns are independent, so they can be rendered on several threads, but
//! the WAV data chunk is append-only and its order is time. Workers claim
//! column indices from a shared counter and send finished blocks back over a
//! channel; a reorder buffer releases them to the writer strictly by index.
//! A release window keeps workers from running more than a few columns ahead
//! of the writer, so a stalled column cannot pile the rest of the image up in
//! memory.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use tracing::debug;

use crate::error::Result;
use crate::raster::PixelBuffer;
use crate::synthesis::{extract_column_tones, render_block_into, Quantization};

/// Finished blocks allowed in flight per worker before workers wait.
const CHANNEL_DEPTH_PER_WORKER: usize = 2;

/// Columns each worker may render ahead of the oldest unreleased column.
const WINDOW_PER_WORKER: usize = 4;

/// One rendered column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedColumn {
    /// Column index, left to right.
    pub index: usize,
    /// Number of tones mixed into the block.
    pub tone_count: usize,
    /// PCM samples for the column.
    pub samples: Vec<i16>,
}

impl RenderedColumn {
    fn empty() -> Self {
        Self {
            index: 0,
            tone_count: 0,
            samples: Vec::new(),
        }
    }

    /// Renders column `index` into this value, reusing its sample buffer.
    fn render(&mut self, pixels: &PixelBuffer, index: usize, mode: Quantization) {
        let tones = extract_column_tones(pixels, index);
        self.index = index;
        self.tone_count = tones.len();
        render_block_into(&tones, mode, &mut self.samples);
    }

    /// Returns true if the column had no qualifying pixels.
    pub fn is_silent(&self) -> bool {
        self.tone_count == 0
    }
}

/// Holds out-of-order columns until every earlier column has been released.
#[derive(Debug, Default)]
pub struct ReorderBuffer {
    next: usize,
    pending: BTreeMap<usize, RenderedColumn>,
}

impl ReorderBuffer {
    /// Creates an empty buffer expecting column 0 first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a column.
    pub fn push(&mut self, column: RenderedColumn) {
        debug_assert!(column.index >= self.next, "column {} already released", column.index);
        self.pending.insert(column.index, column);
    }

    /// Removes and returns the next column in order, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<RenderedColumn> {
        let column = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(column)
    }

    /// Index of the next column to be released.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Number of columns waiting on an earlier one.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Bounds how far past the writer a column may be rendered.
///
/// Column `index` may start once `index < released + size`, where `released`
/// is the number of columns already handed to the writer.
#[derive(Debug)]
pub struct ReleaseWindow {
    size: usize,
    state: Mutex<WindowState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct WindowState {
    released: usize,
    closed: bool,
}

impl ReleaseWindow {
    /// Creates a window `size` columns wide (at least 1).
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            state: Mutex::new(WindowState::default()),
            changed: Condvar::new(),
        }
    }

    /// Window width in columns.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Blocks until column `index` fits in the window.
    ///
    /// Returns false if the window was closed instead.
    pub fn wait_for(&self, index: usize) -> bool {
        let mut state = self.lock();
        while !state.closed && index >= state.released + self.size {
            state = self.changed.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        !state.closed
    }

    /// Records that columns before `released` have been written.
    pub fn advance(&self, released: usize) {
        self.lock().released = released;
        self.changed.notify_all();
    }

    /// Wakes every waiter and refuses further columns.
    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Renders every column of `pixels` and hands them to `sink` in column order.
///
/// With `threads <= 1` columns are rendered on the calling thread into one
/// reused buffer. Otherwise `threads` scoped workers render in parallel,
/// never more than a [`ReleaseWindow`] ahead of `sink`. The first error from
/// `sink` stops the run: workers stop claiming columns and the error is
/// returned.
pub fn render_columns<F>(
    pixels: &PixelBuffer,
    threads: usize,
    mode: Quantization,
    mut sink: F,
) -> Result<()>
where
    F: FnMut(&RenderedColumn) -> Result<()>,
{
    let width = pixels.width();

    if threads <= 1 || width <= 1 {
        let mut column = RenderedColumn::empty();
        for index in 0..width {
            column.render(pixels, index, mode);
            sink(&column)?;
        }
        return Ok(());
    }

    let workers = threads.min(width);
    debug!(workers, columns = width, "rendering columns in parallel");

    let next_column = AtomicUsize::new(0);
    let window = ReleaseWindow::new(workers * WINDOW_PER_WORKER);

    thread::scope(|scope| {
        let (sender, receiver) =
            mpsc::sync_channel::<RenderedColumn>(workers * CHANNEL_DEPTH_PER_WORKER);

        for _ in 0..workers {
            let sender = sender.clone();
            let next_column = &next_column;
            let window = &window;
            scope.spawn(move || loop {
                let index = next_column.fetch_add(1, Ordering::Relaxed);
                if index >= width || !window.wait_for(index) {
                    break;
                }
                let mut column = RenderedColumn::empty();
                column.render(pixels, index, mode);
                if sender.send(column).is_err() {
                    break;
                }
            });
        }
        // Only workers hold senders now, so the receiver ends when they finish.
        drop(sender);

        let mut reorder = ReorderBuffer::new();
        let mut outcome = Ok(());

        'receive: for column in receiver.iter() {
            reorder.push(column);
            debug_assert!(reorder.pending_len() <= window.size());
            while let Some(ready) = reorder.pop_ready() {
                if let Err(e) = sink(&ready) {
                    window.close();
                    outcome = Err(e);
                    break 'receive;
                }
            }
            window.advance(reorder.next_index());
        }
        // Unblocks any worker waiting on a full channel.
        drop(receiver);

        if outcome.is_ok() {
            debug_assert_eq!(reorder.next_index(), width);
            debug_assert_eq!(reorder.pending_len(), 0);
        }
        outcome
    })
}
