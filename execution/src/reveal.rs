//! Single-acquire guard for the BLIND -> REVEAL transition.
//!
//! Several independent signals may claim a game is ready to reveal: both players
//! submitting, the blind deadline, and the recovery scan on reconnect. Each one races on
//! [`RevealGuard::try_acquire`]; exactly one wins and runs reconciliation, every later or
//! concurrent caller gets `false` and must do nothing.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Which signal asked for the reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealTrigger {
    BothSubmitted,
    DeadlineElapsed,
    Recovery,
}

impl RevealTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevealTrigger::BothSubmitted => "both_submitted",
            RevealTrigger::DeadlineElapsed => "deadline_elapsed",
            RevealTrigger::Recovery => "recovery",
        }
    }
}

impl fmt::Display for RevealTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
pub struct RevealGuard {
    triggered: AtomicBool,
}

impl RevealGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for exactly one caller over the guard's lifetime.
    pub fn try_acquire(&self) -> bool {
        self.triggered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_second_acquire_is_refused() {
        let guard = RevealGuard::new();
        assert!(!guard.is_triggered());
        assert!(guard.try_acquire());
        assert!(guard.is_triggered());
        assert!(!guard.try_acquire());
        assert!(!guard.try_acquire());
    }

    #[test]
    fn test_concurrent_acquire_has_one_winner() {
        let guard = Arc::new(RevealGuard::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    if guard.try_acquire() {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_trigger_display() {
        assert_eq!(RevealTrigger::DeadlineElapsed.to_string(), "deadline_elapsed");
    }
}
