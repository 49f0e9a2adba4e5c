//! HCM (Clormann–Seeger) three-point cycle counting.
//!
//! Maintains an auxiliary stack of turning points plus the 1-based
//! index `ir` of the first point still able to take part in a closed
//! cycle. Each incoming turning point `K` is tested against the top
//! two stack entries `I, J`:
//!
//! - `(K−J)·(J−I) ≥ −ε` — `J` is no reversal, pop it and retest;
//! - `|K−J| + ε ≥ |J−I|` — cycle `(I, J)` closed, pop both and retest.
//!
//! While the stack has not grown past `ir`, a top pair monotone away
//! from zero advances `ir` (the primary branch cannot close). The
//! tolerance `ε` (class width / 100) absorbs quantization wobble.

use fatigue::error::EngineError;

use crate::types::Sample;

/// HCM counting state.
#[derive(Debug, Clone)]
pub struct HcmCounter {
    stack: Vec<Sample>,
    /// 1-based index of the first point able to close.
    ir: usize,
}

impl Default for HcmCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl HcmCounter {
    /// Fresh counter.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            ir: 1,
        }
    }

    /// Drop all state.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.ir = 1;
    }

    /// The unclosed turning points, oldest first.
    pub fn stack(&self) -> &[Sample] {
        &self.stack
    }

    /// Hand the unclosed points back (finalization) and reset.
    pub fn take_stack(&mut self) -> Vec<Sample> {
        self.ir = 1;
        std::mem::take(&mut self.stack)
    }

    /// Feed one turning point; `emit(i, j, k)` is called for every
    /// closed cycle `(I, J)` with `K` as the closing point.
    pub fn feed<F>(&mut self, k: Sample, eps: f64, emit: &mut F) -> Result<(), EngineError>
    where
        F: FnMut(Sample, Sample, Sample) -> Result<(), EngineError>,
    {
        loop {
            let iz = self.stack.len();
            if iz < 2 || iz <= self.ir {
                break;
            }
            let i = self.stack[iz - 2];
            let j = self.stack[iz - 1];
            if (k.value - j.value) * (j.value - i.value) >= -eps {
                // J lies on the way from I to K: no reversal.
                self.stack.pop();
                continue;
            }
            if (k.value - j.value).abs() + eps >= (j.value - i.value).abs() {
                emit(i, j, k)?;
                self.stack.pop();
                self.stack.pop();
                continue;
            }
            break;
        }

        if self.stack.len() == self.ir {
            if let Some(j) = self.stack.last() {
                // Top pair monotone away from zero: the primary branch
                // grew, its start can never close.
                if (k.value - j.value) * j.value >= 0.0 {
                    self.ir += 1;
                }
            }
        }

        self.stack.push(k);
        Ok(())
    }
}
