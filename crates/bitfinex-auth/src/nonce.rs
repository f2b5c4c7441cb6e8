//! Nonce sources
//!
//! Every signed request consumes one nonce, and nonces must strictly increase
//! for a given API key. The source is swappable so tests can pin values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Produces strictly increasing nonces
pub trait NonceSource: Send + Sync + std::fmt::Debug {
    /// Next nonce; never returns the same value twice
    fn next_nonce(&self) -> u64;
}

/// Microsecond wall-clock nonce
///
/// Falls back to `last + 1` when the clock has not advanced (or went
/// backwards), so values stay strictly increasing across threads.
#[derive(Debug, Default)]
pub struct EpochNonce {
    last: AtomicU64,
}

impl EpochNonce {
    /// Create a new clock-based source
    pub fn new() -> Self {
        Self::default()
    }

    fn now_micros() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }
}

impl NonceSource for EpochNonce {
    fn next_nonce(&self) -> u64 {
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let candidate = Self::now_micros().max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Deterministic counter, for tests and replay tooling
#[derive(Debug)]
pub struct SequenceNonce {
    next: AtomicU64,
}

impl SequenceNonce {
    /// Start counting at `start`
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl NonceSource for SequenceNonce {
    fn next_nonce(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_epoch_nonce_strictly_increases() {
        let source = EpochNonce::new();
        let mut previous = source.next_nonce();
        for _ in 0..1000 {
            let next = source.next_nonce();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_epoch_nonce_unique_across_threads() {
        let source = Arc::new(EpochNonce::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let source = Arc::clone(&source);
                thread::spawn(move || (0..500).map(|_| source.next_nonce()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn test_sequence_nonce() {
        let source = SequenceNonce::new(152145189228798);
        assert_eq!(source.next_nonce(), 152145189228798);
        assert_eq!(source.next_nonce(), 152145189228799);
    }
}
