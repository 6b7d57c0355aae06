//! # Workflows Module
//!
//! High-level entry points that tie the engine stages into complete docking
//! calls.
//!
//! A docking call runs strictly sequentially: mutate → relax → prepare →
//! score → aggregate, matching the external engines being separate OS
//! processes invoked synchronously. The call can be cancelled between stages
//! through a [`CancellationToken`], never mid-invocation, and every
//! intermediate file lives in a scoped scratch directory that is cleaned up on
//! success, failure, and cancellation alike.

pub mod dock;
pub mod record;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag for a docking call.
///
/// Checked between pipeline stages only; an in-flight external invocation is
/// always allowed to finish or time out so its scratch files can be released.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_uncancelled_and_latches() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());

        let shared = token.clone();
        assert!(shared.is_cancelled());
    }
}
