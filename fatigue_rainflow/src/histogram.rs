//! Count histograms: rainflow matrix, range pairs, level crossings.
//!
//! All bins hold `u64` counts in units of
//! [`FULL_CYCLE_INC`](fatigue::consts::FULL_CYCLE_INC) so half-cycle
//! contributions stay exact. An addition that would push a bin past
//! [`COUNT_LIMIT`](fatigue::consts::COUNT_LIMIT) is a hard fault, never
//! a silent wrap.

use fatigue::consts::COUNT_LIMIT;
use fatigue::error::EngineError;
use fatigue::flags::CountFlags;

/// The three count accumulators of a context.
///
/// Buffers are only allocated for accumulators selected by the count
/// flags; unselected ones stay empty.
#[derive(Debug, Clone, Default)]
pub struct Histograms {
    n: usize,
    /// Rainflow matrix, row-major `[from · n + to]`.
    rfm: Vec<u64>,
    /// Range-pair histogram, indexed by `|from − to|`.
    rp: Vec<u64>,
    /// Level-crossing histogram, indexed by upper class bound.
    lc: Vec<u64>,
}

fn bump(slot: &mut u64, inc: u64, histogram: &'static str, index: usize) -> Result<(), EngineError> {
    if *slot > COUNT_LIMIT - inc {
        return Err(EngineError::Overflow { histogram, index });
    }
    *slot += inc;
    Ok(())
}

impl Histograms {
    /// Allocate the accumulators selected by `flags` for `n` classes.
    pub fn new(n: usize, flags: CountFlags) -> Self {
        let mut h = Self {
            n,
            ..Self::default()
        };
        h.ensure(flags);
        h
    }

    /// Allocate any newly selected accumulators (flag changes).
    pub fn ensure(&mut self, flags: CountFlags) {
        if self.n == 0 {
            return;
        }
        if flags.contains(CountFlags::RFM) && self.rfm.is_empty() {
            self.rfm = vec![0; self.n * self.n];
        }
        if flags.contains(CountFlags::RP) && self.rp.is_empty() {
            self.rp = vec![0; self.n];
        }
        if flags.counts_level_crossings() && self.lc.is_empty() {
            self.lc = vec![0; self.n];
        }
    }

    /// Class count the histograms were sized for.
    #[inline]
    pub const fn class_count(&self) -> usize {
        self.n
    }

    /// Matrix contents (empty when not selected).
    #[inline]
    pub fn rfm(&self) -> &[u64] {
        &self.rfm
    }

    /// Range-pair contents (empty when not selected).
    #[inline]
    pub fn rp(&self) -> &[u64] {
        &self.rp
    }

    /// Level-crossing contents (empty when not selected).
    #[inline]
    pub fn lc(&self) -> &[u64] {
        &self.lc
    }

    /// Mutable matrix access for import/symmetrization.
    pub fn rfm_mut(&mut self) -> &mut [u64] {
        &mut self.rfm
    }

    /// Add `inc` to matrix cell `(from, to)`.
    pub fn bump_rfm(&mut self, from: u16, to: u16, inc: u64) -> Result<(), EngineError> {
        if self.rfm.is_empty() {
            return Ok(());
        }
        let idx = from as usize * self.n + to as usize;
        match self.rfm.get_mut(idx) {
            Some(slot) => bump(slot, inc, "rfm", idx),
            None => Err(EngineError::invalid(format!(
                "matrix cell ({from}, {to}) outside {0}×{0}",
                self.n
            ))),
        }
    }

    /// Add `inc` to the range-pair bin for class distance `delta`.
    pub fn bump_rp(&mut self, delta: u16, inc: u64) -> Result<(), EngineError> {
        if self.rp.is_empty() {
            return Ok(());
        }
        let idx = delta as usize;
        match self.rp.get_mut(idx) {
            Some(slot) => bump(slot, inc, "rp", idx),
            None => Err(EngineError::invalid(format!(
                "range-pair bin {delta} outside {}",
                self.n
            ))),
        }
    }

    /// Add `inc` to the level-crossing bin `level`.
    pub fn bump_lc(&mut self, level: u16, inc: u64) -> Result<(), EngineError> {
        if self.lc.is_empty() {
            return Ok(());
        }
        let idx = level as usize;
        match self.lc.get_mut(idx) {
            Some(slot) => bump(slot, inc, "lc", idx),
            None => Err(EngineError::invalid(format!(
                "level-crossing bin {level} outside {}",
                self.n
            ))),
        }
    }

    /// Zero every allocated bin.
    pub fn clear(&mut self) {
        self.rfm.fill(0);
        self.rp.fill(0);
        self.lc.fill(0);
    }
}
