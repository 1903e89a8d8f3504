//! Progress capability handed to long-running stages.

/// Receives progress percentages (0-100) from the compressor or the uploader.
///
/// Kept separate from the result channel: a stage reports progress here and returns its
/// outcome normally. Implementations must be cheap and non-blocking; the compressor calls
/// them from a blocking worker thread.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, percent: u8);
}

/// Sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _percent: u8) {}
}

impl<F> ProgressSink for F
where
    F: Fn(u8) + Send + Sync,
{
    fn on_progress(&self, percent: u8) {
        self(percent)
    }
}
