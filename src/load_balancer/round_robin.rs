//! Round-robin rotation used for redirection.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free rotating counter.
///
/// Concurrent callers may observe skipped or repeated indices; fairness is
/// approximate.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter and return `(previous + offset) % len`.
    ///
    /// The counter advances on every call, whether or not the caller's
    /// attempt later succeeds.
    pub fn next_index(&self, offset: usize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let start = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(start.wrapping_add(offset) % len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let rr = RoundRobin::new();
        assert_eq!(rr.next_index(0, 2), Some(0));
        assert_eq!(rr.next_index(0, 2), Some(1));
        assert_eq!(rr.next_index(0, 2), Some(0));
    }

    #[test]
    fn test_offset_and_empty() {
        let rr = RoundRobin::new();
        assert_eq!(rr.next_index(1, 3), Some(1));
        assert_eq!(rr.next_index(1, 3), Some(2));
        assert_eq!(rr.next_index(0, 0), None);
        // The empty call did not advance the counter.
        assert_eq!(rr.next_index(0, 3), Some(2));
    }
}
