use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::BlindMove;

#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    #[error("sequence already submitted")]
    Submitted,
    #[error("sequence is full (max={max})")]
    Full { max: u8 },
}

/// One player's ordered blind-phase queue.
///
/// Mutated only by its owner until [`BlindSequence::submit`]; afterwards every mutation
/// is refused and the queue is left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindSequence {
    moves: Vec<BlindMove>,
    submitted: bool,
}

impl BlindSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moves(&self) -> &[BlindMove] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn push(&mut self, mv: BlindMove, max_total_moves: u8) -> Result<(), SequenceError> {
        if self.submitted {
            return Err(SequenceError::Submitted);
        }
        if self.moves.len() >= max_total_moves as usize {
            return Err(SequenceError::Full {
                max: max_total_moves,
            });
        }
        self.moves.push(mv);
        Ok(())
    }

    /// Remove and return the most recent move (`None` if empty).
    pub fn pop(&mut self) -> Result<Option<BlindMove>, SequenceError> {
        if self.submitted {
            return Err(SequenceError::Submitted);
        }
        Ok(self.moves.pop())
    }

    pub fn clear(&mut self) -> Result<(), SequenceError> {
        if self.submitted {
            return Err(SequenceError::Submitted);
        }
        self.moves.clear();
        Ok(())
    }

    /// Freeze the sequence. Returns `false` if it was already frozen.
    pub fn submit(&mut self) -> bool {
        !std::mem::replace(&mut self.submitted, true)
    }
}

impl From<Vec<BlindMove>> for BlindSequence {
    fn from(moves: Vec<BlindMove>) -> Self {
        Self {
            moves,
            submitted: false,
        }
    }
}
