use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared, monotonic progress of a serializer call.
///
/// The value is `completed / recorded` worklist entries, in `0.0..=1.0`.
/// It is reset to `0.0` when a call starts and is exactly `1.0` when it
/// returns, whether it succeeded or not. Clones observe the same value, so
/// a handle taken before an async call can be polled from another thread.
///
/// # Examples
///
/// ```
/// use gs_serde::Progress;
///
/// let progress = Progress::new();
/// let observer = progress.clone();
///
/// progress.update(3, 4);
/// assert_eq!(observer.get(), 0.75);
///
/// // Never goes backwards within a call.
/// progress.update(3, 8);
/// assert_eq!(observer.get(), 0.75);
///
/// progress.finish();
/// assert_eq!(observer.get(), 1.0);
/// ```
#[derive(Clone, Default)]
pub struct Progress(Arc<AtomicU32>);

impl Progress {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Resets to `0.0` at the start of a call.
    #[inline]
    pub fn reset(&self) {
        self.0.store(0f32.to_bits(), Ordering::Release);
    }

    /// Raises the value to `completed / total`, capped below `1.0`.
    ///
    /// Only [`finish`](Self::finish) reports completion.
    pub fn update(&self, completed: usize, total: usize) {
        if total == 0 {
            return;
        }
        let ratio = (completed as f64 / total as f64).clamp(0.0, 1.0) as f32;
        let ratio = if ratio >= 1.0 { f32::from_bits(1f32.to_bits() - 1) } else { ratio };
        // Non-negative floats order like their bit patterns.
        self.0.fetch_max(ratio.to_bits(), Ordering::AcqRel);
    }

    /// Sets the value to `1.0` at the end of a call.
    #[inline]
    pub fn finish(&self) {
        self.0.store(1f32.to_bits(), Ordering::Release);
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Progress").field(&self.get()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
