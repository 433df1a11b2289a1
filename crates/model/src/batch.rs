use std::mem;

use crate::bet::Bet;

/// Weight ceiling of a batch, in KiB.
pub const DEFAULT_MAX_BATCH_KIB: f64 = 8.0;

const BYTES_PER_KIB: f64 = 1024.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BatchError {
    #[error("bet weighs {weight} bytes, more than the {max_kib} KiB batch ceiling")]
    RecordTooLarge { weight: usize, max_kib: f64 },

    #[error("invalid batch limits: {0}")]
    InvalidLimits(&'static str),
}

/// Count and weight ceilings applied while filling a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchLimits {
    pub max_count: usize,
    pub max_kib: f64,
}

impl BatchLimits {
    pub fn new(max_count: usize) -> Self {
        Self {
            max_count,
            max_kib: DEFAULT_MAX_BATCH_KIB,
        }
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.max_count == 0 {
            return Err(BatchError::InvalidLimits("max_count must be at least 1"));
        }
        if !self.max_kib.is_finite() || self.max_kib <= 0.0 {
            return Err(BatchError::InvalidLimits(
                "max_kib must be a positive number",
            ));
        }
        Ok(())
    }

    /// Whether `weight` bytes fit under the weight ceiling. Equality is admissible.
    fn fits(&self, weight: usize) -> bool {
        weight as f64 / BYTES_PER_KIB <= self.max_kib
    }
}

/// An ordered group of bets sent as one message.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Batch {
    bets: Vec<Bet>,
    weight: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.bets.len()
    }

    /// Sum of member weights in bytes.
    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn into_bets(self) -> Vec<Bet> {
        self.bets
    }

    /// Admission check: `bet` may join without breaking either ceiling.
    pub fn can_admit(&self, bet: &Bet, limits: &BatchLimits) -> bool {
        self.count() < limits.max_count && limits.fits(self.weight + bet.weight())
    }

    /// Appends unconditionally. Callers check [`Batch::can_admit`] first.
    pub fn append(&mut self, bet: Bet) {
        self.weight += bet.weight();
        self.bets.push(bet);
    }

    /// No room left for another bet by count, or already over the weight ceiling.
    pub fn is_full(&self, limits: &BatchLimits) -> bool {
        self.count() >= limits.max_count || !limits.fits(self.weight)
    }

    /// Member lines concatenated in insertion order.
    pub fn payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.weight);
        for bet in &self.bets {
            out.extend_from_slice(bet.line().as_bytes());
        }
        out
    }
}

/// Greedy, order-preserving batch builder.
///
/// Bets are pushed one at a time. When a bet does not fit in the batch being
/// filled, that batch is frozen and returned, and the bet opens the next one.
/// Frozen batches are never reopened.
#[derive(Debug)]
pub struct Batcher {
    limits: BatchLimits,
    current: Batch,
}

impl Batcher {
    pub fn new(limits: BatchLimits) -> Result<Self, BatchError> {
        limits.validate()?;
        Ok(Self {
            limits,
            current: Batch::new(),
        })
    }

    /// Feeds one bet. Returns the batch it closed, if any.
    pub fn push(&mut self, bet: Bet) -> Result<Option<Batch>, BatchError> {
        // A bet that cannot fit an empty batch would never be admitted.
        if !self.limits.fits(bet.weight()) {
            return Err(BatchError::RecordTooLarge {
                weight: bet.weight(),
                max_kib: self.limits.max_kib,
            });
        }

        if self.current.can_admit(&bet, &self.limits) {
            self.current.append(bet);
            return Ok(None);
        }

        let frozen = mem::take(&mut self.current);
        self.current.append(bet);
        Ok(Some(frozen))
    }

    /// Trailing batch, if anything is left.
    pub fn finish(self) -> Option<Batch> {
        if self.current.is_empty() {
            None
        } else {
            Some(self.current)
        }
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
