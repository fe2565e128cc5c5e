//! Row-level progress reporting with cooperative cancellation.

/// Receives `(row, total)` after each scanline is coded.
///
/// Returning `false` stops the operation with [`crate::Error::Cancelled`].
pub trait Progress {
    fn report(&mut self, row: u64, total: u64) -> bool;
}

impl<F> Progress for F
where
    F: FnMut(u64, u64) -> bool,
{
    fn report(&mut self, row: u64, total: u64) -> bool {
        self(row, total)
    }
}

/// Progress sink that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _row: u64, _total: u64) -> bool {
        true
    }
}
