//! Histogram export/import and derived statistics.
//!
//! Reads and writes of the rainflow matrix, reconstruction of the
//! range-pair and level-crossing histograms from it, and damage
//! computed from either histogram. Counts are reported in internal
//! units: one cycle corresponds to
//! [`FULL_CYCLE_INC`](fatigue::consts::FULL_CYCLE_INC) stored units.

use fatigue::consts::{COUNT_LIMIT, FULL_CYCLE_INC};
use fatigue::error::EngineError;
use fatigue::flags::CountFlags;
use fatigue::methods::RpDamageMethod;
use fatigue::wohler::WohlerParams;

use crate::engine::{ConsequentState, RainflowEngine};

impl RainflowEngine {
    fn require_classes(&mut self, operation: &'static str) -> Result<usize, EngineError> {
        self.guard_configured(operation)?;
        let n = self.class_params().count as usize;
        if n == 0 {
            return Err(self.fail(EngineError::invalid(format!(
                "{operation} requires quantization (class count > 0)"
            ))));
        }
        Ok(n)
    }

    fn require_rfm(&mut self, operation: &'static str) -> Result<usize, EngineError> {
        let n = self.require_classes(operation)?;
        if self.hist.rfm().is_empty() {
            return Err(self.fail(EngineError::invalid(format!(
                "{operation} requires the rainflow matrix to be counted"
            ))));
        }
        Ok(n)
    }

    // ─── Rainflow matrix ────────────────────────────────────────────

    /// Copy the matrix out (row-major `[from · N + to]`).
    pub fn rfm_get(&mut self) -> Result<Vec<u64>, EngineError> {
        self.require_rfm("rfm_get")?;
        Ok(self.hist.rfm().to_vec())
    }

    /// Replace or add to the matrix contents.
    pub fn rfm_set(&mut self, counts: &[u64], add_only: bool) -> Result<(), EngineError> {
        let n = self.require_rfm("rfm_set")?;
        if counts.len() != n * n {
            return Err(self.fail(EngineError::invalid(format!(
                "matrix length {} does not match {n}×{n}",
                counts.len()
            ))));
        }
        if add_only {
            for (idx, &c) in counts.iter().enumerate() {
                if c > COUNT_LIMIT || self.hist.rfm()[idx] > COUNT_LIMIT - c {
                    return Err(self.fail(EngineError::Overflow {
                        histogram: "rfm",
                        index: idx,
                    }));
                }
                self.hist.rfm_mut()[idx] += c;
            }
        } else {
            self.hist.rfm_mut().copy_from_slice(counts);
        }
        Ok(())
    }

    /// Read one matrix cell.
    pub fn rfm_peek(&mut self, from: u16, to: u16) -> Result<u64, EngineError> {
        let n = self.require_rfm("rfm_peek")?;
        if from as usize >= n || to as usize >= n {
            return Err(self.fail(EngineError::invalid(format!(
                "matrix cell ({from}, {to}) outside {n}×{n}"
            ))));
        }
        Ok(self.hist.rfm()[from as usize * n + to as usize])
    }

    /// Write one matrix cell (or add to it).
    pub fn rfm_poke(
        &mut self,
        from: u16,
        to: u16,
        counts: u64,
        add_only: bool,
    ) -> Result<(), EngineError> {
        let n = self.require_rfm("rfm_poke")?;
        if from as usize >= n || to as usize >= n {
            return Err(self.fail(EngineError::invalid(format!(
                "matrix cell ({from}, {to}) outside {n}×{n}"
            ))));
        }
        let idx = from as usize * n + to as usize;
        if add_only {
            if counts > COUNT_LIMIT || self.hist.rfm()[idx] > COUNT_LIMIT - counts {
                return Err(self.fail(EngineError::Overflow {
                    histogram: "rfm",
                    index: idx,
                }));
            }
            self.hist.rfm_mut()[idx] += counts;
        } else {
            self.hist.rfm_mut()[idx] = counts;
        }
        Ok(())
    }

    /// Sum of all matrix cells.
    pub fn rfm_sum(&mut self) -> Result<u64, EngineError> {
        self.require_rfm("rfm_sum")?;
        Ok(self.hist.rfm().iter().sum())
    }

    /// Number of non-zero matrix cells.
    pub fn rfm_non_zeros(&mut self) -> Result<usize, EngineError> {
        self.require_rfm("rfm_non_zeros")?;
        Ok(self.hist.rfm().iter().filter(|&&c| c != 0).count())
    }

    /// Fold falling cycles onto their rising counterparts, zeroing the
    /// lower triangle. Idempotent.
    pub fn rfm_make_symmetric(&mut self) -> Result<(), EngineError> {
        let n = self.require_rfm("rfm_make_symmetric")?;
        for from in 1..n {
            for to in 0..from {
                let lower = from * n + to;
                let upper = to * n + from;
                let c = self.hist.rfm()[lower];
                if c == 0 {
                    continue;
                }
                if self.hist.rfm()[upper] > COUNT_LIMIT - c {
                    return Err(self.fail(EngineError::Overflow {
                        histogram: "rfm",
                        index: upper,
                    }));
                }
                self.hist.rfm_mut()[upper] += c;
                self.hist.rfm_mut()[lower] = 0;
            }
        }
        Ok(())
    }

    /// Verify matrix consistency: an empty diagonal and every count
    /// within the saturation limit.
    pub fn rfm_check(&mut self) -> Result<(), EngineError> {
        let n = self.require_rfm("rfm_check")?;
        for c in 0..n {
            if self.hist.rfm()[c * n + c] != 0 {
                return Err(EngineError::invalid(format!(
                    "matrix diagonal cell ({c}, {c}) is non-zero"
                )));
            }
        }
        if let Some(idx) = self.hist.rfm().iter().position(|&c| c > COUNT_LIMIT) {
            return Err(EngineError::Overflow {
                histogram: "rfm",
                index: idx,
            });
        }
        Ok(())
    }

    /// Damage over the matrix contents.
    pub fn rfm_damage(&mut self) -> Result<f64, EngineError> {
        self.damage_from_rfm()
    }

    // ─── Range pairs ────────────────────────────────────────────────

    /// Copy the range-pair histogram out.
    pub fn rp_get(&mut self) -> Result<Vec<u64>, EngineError> {
        self.require_classes("rp_get")?;
        if self.hist.rp().is_empty() {
            return Err(self.fail(EngineError::invalid(
                "rp_get requires range pairs to be counted",
            )));
        }
        Ok(self.hist.rp().to_vec())
    }

    /// Rebuild the range-pair histogram from the matrix.
    pub fn rp_from_rfm(&mut self) -> Result<Vec<u64>, EngineError> {
        let n = self.require_rfm("rp_from_rfm")?;
        let mut rp = vec![0u64; n];
        for from in 0..n {
            for to in 0..n {
                let c = self.hist.rfm()[from * n + to];
                if c > 0 {
                    rp[from.abs_diff(to)] += c;
                }
            }
        }
        Ok(rp)
    }

    // ─── Level crossings ────────────────────────────────────────────

    /// Copy the level-crossing histogram out.
    pub fn lc_get(&mut self) -> Result<Vec<u64>, EngineError> {
        self.require_classes("lc_get")?;
        if self.hist.lc().is_empty() {
            return Err(self.fail(EngineError::invalid(
                "lc_get requires level crossings to be counted",
            )));
        }
        Ok(self.hist.lc().to_vec())
    }

    /// Rebuild the level-crossing histogram from the matrix, honoring
    /// the enabled directions.
    pub fn lc_from_rfm(&mut self) -> Result<Vec<u64>, EngineError> {
        let n = self.require_rfm("lc_from_rfm")?;
        let flags = self.flags();
        let mut lc = vec![0u64; n];
        for from in 0..n {
            for to in 0..n {
                let c = self.hist.rfm()[from * n + to];
                if c == 0 || from == to {
                    continue;
                }
                let enabled = if to > from {
                    flags.contains(CountFlags::LC_UP)
                } else {
                    flags.contains(CountFlags::LC_DN)
                };
                if enabled {
                    for level in from.min(to)..from.max(to) {
                        lc[level] += c;
                    }
                }
            }
        }
        Ok(lc)
    }

    /// Level crossings of the residue slopes (the part the closed
    /// cycles do not cover).
    pub fn lc_from_residue(&mut self) -> Result<Vec<u64>, EngineError> {
        let n = self.require_classes("lc_from_residue")?;
        let flags = self.flags();
        let mut lc = vec![0u64; n];
        let entries: Vec<(u16, u16)> = {
            let residue = self.residue();
            residue
                .windows(2)
                .map(|w| (w[0].class, w[1].class))
                .collect()
        };
        for (from, to) in entries {
            if from == to {
                continue;
            }
            let enabled = if to > from {
                flags.contains(CountFlags::LC_UP)
            } else {
                flags.contains(CountFlags::LC_DN)
            };
            if enabled {
                for level in from.min(to)..from.max(to) {
                    lc[level as usize] += FULL_CYCLE_INC;
                }
            }
        }
        Ok(lc)
    }

    // ─── Damage from histograms ─────────────────────────────────────

    /// Damage over the matrix via the per-pair damage path.
    pub fn damage_from_rfm(&mut self) -> Result<f64, EngineError> {
        let n = self.require_rfm("damage_from_rfm")?;
        if self.wl_params().is_none() {
            return Err(self.fail(EngineError::invalid("no Wöhler curve installed")));
        }
        let mut total = 0.0;
        for from in 0..n as u16 {
            for to in 0..n as u16 {
                let c = self.hist.rfm()[from as usize * n + to as usize];
                if c == 0 || from == to {
                    continue;
                }
                let (d, _) = match self.damage_for_pair(from, to) {
                    Ok(v) => v,
                    Err(e) => return Err(self.fail(e)),
                };
                total += d * c as f64 / FULL_CYCLE_INC as f64;
            }
        }
        Ok(total)
    }

    /// Damage over the range-pair histogram.
    ///
    /// The method reshapes the Wöhler parameters for the computation:
    /// endurance off (`Elementar`), secondary slope active
    /// (`Modified`), or fatigue-strength depression from the largest
    /// range down (`Consequent`). The damage LUT is suspended while
    /// the reshaped parameters are in place.
    pub fn damage_from_rp(&mut self, method: RpDamageMethod) -> Result<f64, EngineError> {
        let n = self.require_classes("damage_from_rp")?;
        if self.hist.rp().is_empty() {
            return Err(self.fail(EngineError::invalid(
                "damage_from_rp requires range pairs to be counted",
            )));
        }
        let Some(base) = self.wl_params() else {
            return Err(self.fail(EngineError::invalid("no Wöhler curve installed")));
        };

        let reshaped = match method {
            RpDamageMethod::Default => base,
            RpDamageMethod::Elementar => WohlerParams {
                sd: 0.0,
                nd: f64::INFINITY,
                k2: base.k,
                ..base
            },
            RpDamageMethod::Modified => WohlerParams {
                sd: 0.0,
                nd: f64::INFINITY,
                ..base
            },
            RpDamageMethod::Consequent => base,
        };

        let width = self.class_params().width;
        let rp = self.hist.rp().to_vec();

        // Swap the reshaped parameters in and suspend the LUT so no
        // stale per-pair damage can be served while they are active.
        self.lut.raise_inapt();
        let saved = self.wohler.replace(reshaped);
        let result = self.rp_damage_sweep(method, &rp, width, base);
        self.wohler = saved;
        self.lut.lower_inapt();

        match result {
            Ok(v) => Ok(v),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Sum range-pair damage against the currently installed (possibly
    /// reshaped) parameters, largest range first.
    fn rp_damage_sweep(
        &mut self,
        method: RpDamageMethod,
        rp: &[u64],
        width: f64,
        base: WohlerParams,
    ) -> Result<f64, EngineError> {
        if method == RpDamageMethod::Consequent {
            let mut con = ConsequentState::new(base);
            for delta in (1..rp.len()).rev() {
                let c = rp[delta];
                if c == 0 {
                    continue;
                }
                let sa = delta as f64 * width / 2.0;
                // Swap the depressed curve in for this level.
                self.wohler = Some(con.impaired);
                let d = self.rp_level_damage(sa)?;
                con.account(d * c as f64 / FULL_CYCLE_INC as f64);
            }
            Ok(con.d_con)
        } else {
            let mut total = 0.0;
            for delta in (1..rp.len()).rev() {
                let c = rp[delta];
                if c == 0 {
                    continue;
                }
                let sa = delta as f64 * width / 2.0;
                total += self.rp_level_damage(sa)? * c as f64 / FULL_CYCLE_INC as f64;
            }
            Ok(total)
        }
    }

    /// Damage of one range level via the installed parameters,
    /// honoring a damage capability override.
    fn rp_level_damage(&self, sa: f64) -> Result<f64, EngineError> {
        let Some(wl) = self.wl_params() else {
            return Ok(0.0);
        };
        match &self.caps.damage {
            Some(hook) => hook(&wl, sa),
            None => wl.damage(sa),
        }
    }
}
