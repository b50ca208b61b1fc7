//! A reusable rendezvous point for a fixed number of threads.

use std::sync::{Condvar, Mutex};

use crate::error::{lock, EngineError};

struct BarrierState {
    arrived: usize,
    // Incremented on every release; waiters use it to tell their round from the next one.
    generation: u64,
}

/// Blocks callers of `arrive()` until `participants` threads have arrived, then releases all
/// of them. The arrival count is reset atomically with the release, so the same barrier can
/// be used for the next round right away.
///
/// A participant must not arrive a second time before every participant has returned from
/// the previous round.
pub struct Barrier {
    participants: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

/// Returned by `Barrier::arrive()`.
pub struct BarrierWaitResult(bool);

impl BarrierWaitResult {
    /// True for exactly one thread per round: the one whose arrival released the others.
    pub fn is_leader(&self) -> bool {
        self.0
    }
}

impl Barrier {
    pub fn new(participants: usize) -> Result<Barrier, EngineError> {
        if participants == 0 {
            return Err(EngineError::InvalidParallelism(participants));
        }
        Ok(Barrier {
            participants: participants,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
            }),
            released: Condvar::new(),
        })
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    pub fn arrive(&self) -> Result<BarrierWaitResult, EngineError> {
        let mut state = lock(&self.state, "barrier")?;
        let generation = state.generation;

        state.arrived += 1;
        if state.arrived == self.participants {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            return Ok(BarrierWaitResult(true));
        }

        while state.generation == generation {
            state = self
                .released
                .wait(state)
                .map_err(|_| EngineError::Poisoned { what: "barrier" })?;
        }
        Ok(BarrierWaitResult(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_participants() {
        assert!(Barrier::new(0).is_err());
    }

    #[test]
    fn test_single_participant_never_blocks() {
        let b = Barrier::new(1).unwrap();
        for _ in 0..3 {
            assert!(b.arrive().unwrap().is_leader());
        }
    }

    #[test]
    fn test_rounds_are_separated() {
        let n = 6;
        let rounds = 20;
        let barrier = Arc::new(Barrier::new(n).unwrap());
        let counter = Arc::new(AtomicUsize::new(0));
        let leaders = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..n)
            .map(|_| {
                let (barrier, counter, leaders) = (barrier.clone(), counter.clone(), leaders.clone());
                thread::spawn(move || {
                    for round in 0..rounds {
                        counter.fetch_add(1, Ordering::SeqCst);
                        if barrier.arrive().unwrap().is_leader() {
                            leaders.fetch_add(1, Ordering::SeqCst);
                        }
                        // Everybody of this round has incremented, nobody of the next one has.
                        assert_eq!(counter.load(Ordering::SeqCst), (round + 1) * n);
                        barrier.arrive().unwrap();
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), n * rounds);
        assert_eq!(leaders.load(Ordering::SeqCst), rounds);
    }
}
