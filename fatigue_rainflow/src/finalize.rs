//! Residue finalization.
//!
//! At stream end the tentative interim point is integrated into the
//! residue and one of the standardized residual policies is applied:
//! leave, discard, weighted half/full cycles, the Clormann–Seeger
//! four-window pass, repeated-residue re-feeding, or DIN 45667
//! range-pair matching.

use fatigue::consts::{FULL_CYCLE_INC, HALF_CYCLE_INC};
use fatigue::error::EngineError;
use fatigue::flags::CountFlags;
use fatigue::methods::{CountingMethod, ResidualMethod};
use tracing::debug;

use crate::engine::RainflowEngine;
use crate::types::{ContextState, Sample};

impl RainflowEngine {
    /// Close the stream and apply the residual policy.
    ///
    /// `finalize(None)` is idempotent; every policy leaves the context
    /// in `Finished`.
    pub fn finalize(&mut self, method: ResidualMethod) -> Result<(), EngineError> {
        self.guard_configured("finalize")?;
        self.state = ContextState::Finalize;
        debug!(
            method = ?method,
            residue = self.residue.len(),
            "finalizing stream"
        );
        match self.finalize_inner(method) {
            Ok(()) => {
                self.state = ContextState::Finished;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn finalize_inner(&mut self, method: ResidualMethod) -> Result<(), EngineError> {
        // The tentative interim point becomes a real turning point.
        if let Some(t) = self.filter.take_interim() {
            self.confirm_turning_point(t)?;
        }
        // Stream-edge margin: force the last sample into the store.
        if self.flags.contains(CountFlags::ENFORCE_MARGIN) && self.tp.is_some() {
            if let Some(last) = self.last_sample {
                self.tp_add(last)?;
            }
        }
        // With HCM the unclosed points live on the auxiliary stack.
        if self.counting_method == CountingMethod::Hcm && !self.hcm.stack().is_empty() {
            let stack = self.hcm.take_stack();
            self.residue.replace(stack);
        }
        match method {
            ResidualMethod::None | ResidualMethod::Ignore => Ok(()),
            ResidualMethod::Discard => {
                self.residue.clear();
                Ok(())
            }
            ResidualMethod::HalfCycles => self.finalize_weighted(HALF_CYCLE_INC),
            ResidualMethod::FullCycles => self.finalize_weighted(FULL_CYCLE_INC),
            ResidualMethod::ClormannSeeger => self.finalize_clormann_seeger(),
            ResidualMethod::Repeated => self.finalize_repeated(),
            ResidualMethod::RpDin45667 => self.finalize_range_pairs(),
        }
    }

    /// Count every adjacent residue pair with the given weight (ASTM
    /// half-cycles, or full cycles). The residue itself is kept.
    fn finalize_weighted(&mut self, inc: u64) -> Result<(), EngineError> {
        let entries = self.residue.as_slice().to_vec();
        for i in 0..entries.len().saturating_sub(1) {
            let from = entries[i];
            let to = entries[i + 1];
            let next = entries.get(i + 2).copied().unwrap_or(to);
            self.process_cycle(from, to, next, inc)?;
        }
        Ok(())
    }

    /// Clormann–Seeger residue pass: where a four-window `A,B,C,D` has
    /// `B·C < 0` and `|D| ≥ |B| ≥ |C|`, the inner pair is a full cycle
    /// and leaves the residue.
    fn finalize_clormann_seeger(&mut self) -> Result<(), EngineError> {
        let mut i = 0;
        while i + 3 < self.residue.len() {
            let window = &self.residue.as_slice()[i..i + 4];
            let (b, c, d) = (window[1], window[2], window[3]);
            if b.value * c.value < 0.0
                && d.value.abs() >= b.value.abs()
                && b.value.abs() >= c.value.abs()
            {
                self.process_cycle(b, c, d, FULL_CYCLE_INC)?;
                self.residue.remove(i + 2);
                self.residue.remove(i + 1);
                i = 0;
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    /// Feed the residue concatenated with itself through the counter
    /// once more, then discard what remains.
    ///
    /// Points keep their original stream positions and turning-point
    /// back-references; cycles spanning the junction therefore carry
    /// `from.pos ≥ to.pos` and the spread position arithmetic wraps by
    /// the absolute stream length.
    fn finalize_repeated(&mut self) -> Result<(), EngineError> {
        let saved = self.residue.take_all();
        if saved.is_empty() {
            return Ok(());
        }
        debug!(points = saved.len(), "re-feeding repeated residue");
        self.filter.reset();
        if self.counting_method == CountingMethod::Hcm {
            self.hcm.reset();
        }
        self.in_repeat = true;
        let result = (|| -> Result<(), EngineError> {
            for _ in 0..2 {
                for s in &saved {
                    if let Some(t) = self.filter.apply(*s) {
                        self.confirm_turning_point(t)?;
                    }
                }
            }
            if let Some(t) = self.filter.take_interim() {
                self.confirm_turning_point(t)?;
            }
            Ok(())
        })();
        self.in_repeat = false;
        self.residue.clear();
        if self.counting_method == CountingMethod::Hcm {
            self.hcm.reset();
        }
        result
    }

    /// DIN 45667 range-pair counting: rising and falling residue
    /// slopes are sorted by range and paired off; the smaller slope of
    /// each pair counts as a full cycle.
    fn finalize_range_pairs(&mut self) -> Result<(), EngineError> {
        let entries = self.residue.as_slice().to_vec();
        let mut rising: Vec<(u16, Sample, Sample)> = Vec::new();
        let mut falling: Vec<(u16, Sample, Sample)> = Vec::new();
        for w in entries.windows(2) {
            let (from, to) = (w[0], w[1]);
            if to.class > from.class {
                rising.push((to.class - from.class, from, to));
            } else if to.class < from.class {
                falling.push((from.class - to.class, from, to));
            }
        }
        rising.sort_by(|a, b| b.0.cmp(&a.0));
        falling.sort_by(|a, b| b.0.cmp(&a.0));
        for (r, f) in rising.iter().zip(falling.iter()) {
            let (_, from, to) = if r.0 <= f.0 { *r } else { *f };
            self.process_cycle(from, to, to, FULL_CYCLE_INC)?;
        }
        Ok(())
    }
}
