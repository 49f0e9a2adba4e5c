//! Wöhler (S–N) curve model.
//!
//! Log-log relation between stress amplitude and cycles to failure, in
//! the three standard Miner forms:
//!
//! - **elementary** — one slope `k` through `(sx, nx)`, no endurance,
//! - **original** — endurance limit at `(sd, nd) = (sx, nx)`,
//! - **modified** — second slope `k2` from the knee `(sx, nx)` down to
//!   the endurance amplitude `sd`.
//!
//! Damage per cycle is `1 / N(Sa)`, evaluated in closed form via
//! `exp`/`ln` so extreme exponents stay stable.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Wöhler curve parameters.
///
/// Invariants: `sx > 0`, `nx > 0`, `k < 0`, `k2 < 0`, `sd ≥ 0`, and
/// `nd ≥ nx` whenever `sd > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WohlerParams {
    /// Knee amplitude.
    pub sx: f64,
    /// Cycles to failure at the knee.
    pub nx: f64,
    /// Slope above the knee (negative).
    pub k: f64,
    /// Slope below the knee (negative; equals `k` outside the modified form).
    pub k2: f64,
    /// Endurance amplitude (0 = no endurance limit).
    pub sd: f64,
    /// Cycles to failure at the endurance amplitude.
    pub nd: f64,
    /// Fatigue-strength depression exponent (Miner consequent).
    pub q: f64,
    /// Depression exponent for the secondary slope.
    pub q2: f64,
    /// Amplitudes at or below this threshold contribute no damage.
    pub omission: f64,
}

impl WohlerParams {
    /// Miner elementary: a single slope through `(sx, nx)`, no endurance.
    pub fn elementary(sx: f64, nx: f64, k: f64) -> Result<Self, EngineError> {
        Self::any(Self {
            sx,
            nx,
            k,
            k2: k,
            sd: 0.0,
            nd: f64::INFINITY,
            q: k.abs() - 1.0,
            q2: k.abs() - 1.0,
            omission: 0.0,
        })
    }

    /// Miner original: endurance limit at `(sd, nd)`, knee coincides.
    pub fn original(sd: f64, nd: f64, k: f64) -> Result<Self, EngineError> {
        Self::any(Self {
            sx: sd,
            nx: nd,
            k,
            k2: k,
            sd,
            nd,
            q: k.abs() - 1.0,
            q2: k.abs() - 1.0,
            omission: 0.0,
        })
    }

    /// Miner modified: slope `k2` continues below the knee `(sx, nx)`.
    pub fn modified(sx: f64, nx: f64, k: f64, k2: f64) -> Result<Self, EngineError> {
        Self::any(Self {
            sx,
            nx,
            k,
            k2,
            sd: 0.0,
            nd: f64::INFINITY,
            q: k.abs() - 1.0,
            q2: k2.abs() - 1.0,
            omission: 0.0,
        })
    }

    /// Validate a fully specified parameter set.
    pub fn any(params: Self) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(params)
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.sx > 0.0) || !(self.nx > 0.0) {
            return Err(EngineError::invalid(format!(
                "Wöhler knee (sx={}, nx={}) must be positive",
                self.sx, self.nx
            )));
        }
        if !(self.k < 0.0) || !(self.k2 < 0.0) {
            return Err(EngineError::invalid(format!(
                "Wöhler slopes (k={}, k2={}) must be negative",
                self.k, self.k2
            )));
        }
        if self.sd < 0.0 {
            return Err(EngineError::invalid("endurance amplitude sd must be ≥ 0"));
        }
        if self.sd > 0.0 && self.nd < self.nx {
            return Err(EngineError::invalid(format!(
                "endurance cycle count nd={} below knee nx={}",
                self.nd, self.nx
            )));
        }
        if !(self.q > 0.0) || !(self.q2 > 0.0) {
            return Err(EngineError::invalid("depression exponents q/q2 must be > 0"));
        }
        if self.omission < 0.0 {
            return Err(EngineError::invalid("omission threshold must be ≥ 0"));
        }
        Ok(())
    }

    /// Damage contributed by one full cycle of amplitude `sa`.
    ///
    /// Zero below the omission threshold and below the endurance
    /// amplitude; otherwise `exp(|slope|·(ln sa − ln sx) − ln nx)` with
    /// the slope of the region `sa` falls in.
    pub fn damage(&self, sa: f64) -> Result<f64, EngineError> {
        if !(sa > 0.0) {
            return Err(EngineError::invalid(format!(
                "damage amplitude {sa} must be > 0"
            )));
        }
        if sa <= self.omission {
            return Ok(0.0);
        }
        if self.sd > 0.0 && sa < self.sd {
            return Ok(0.0);
        }
        let slope = if sa > self.sx { self.k } else { self.k2 };
        Ok((slope.abs() * (sa.ln() - self.sx.ln()) - self.nx.ln()).exp())
    }

    /// Cycles to failure at amplitude `sa` (infinite below endurance).
    pub fn n_at(&self, sa: f64) -> Result<f64, EngineError> {
        let d = self.damage(sa)?;
        if d == 0.0 {
            Ok(f64::INFINITY)
        } else {
            Ok(1.0 / d)
        }
    }

    /// Amplitude with `n` cycles to failure.
    pub fn sa_at(&self, n: f64) -> Result<f64, EngineError> {
        if !(n > 0.0) {
            return Err(EngineError::invalid(format!(
                "cycle count {n} must be > 0"
            )));
        }
        if self.sd > 0.0 && n >= self.nd {
            return Ok(self.sd);
        }
        let slope = if n < self.nx { self.k } else { self.k2 };
        // ln Sa = ln Sx + (ln n − ln Nx) / k
        Ok((self.sx.ln() + (n.ln() - self.nx.ln()) / slope).exp())
    }

    /// Knee amplitude at the intersection of two log-log lines: slope
    /// `k1` through `(s1, n1)` and slope `k2` through `(s2, n2)`.
    pub fn calc_sx(
        s1: f64,
        n1: f64,
        k1: f64,
        s2: f64,
        n2: f64,
        k2: f64,
    ) -> Result<f64, EngineError> {
        if !(s1 > 0.0 && n1 > 0.0 && s2 > 0.0 && n2 > 0.0) {
            return Err(EngineError::invalid("curve points must be positive"));
        }
        let denom = k1 - k2;
        if denom.abs() < f64::EPSILON {
            return Err(EngineError::invalid("parallel slopes have no intersection"));
        }
        let ln_sx = (n2.ln() - n1.ln() + k1 * s1.ln() - k2 * s2.ln()) / denom;
        Ok(ln_sx.exp())
    }

    /// Secondary slope fitted through the knee and the endurance point.
    pub fn calc_k2(sx: f64, nx: f64, sd: f64, nd: f64) -> Result<f64, EngineError> {
        if !(sx > 0.0 && nx > 0.0 && sd > 0.0 && nd > 0.0) {
            return Err(EngineError::invalid("curve points must be positive"));
        }
        let ds = sd.ln() - sx.ln();
        if ds.abs() < f64::EPSILON {
            return Err(EngineError::invalid("sd equals sx, slope undefined"));
        }
        Ok((nd.ln() - nx.ln()) / ds)
    }

    /// Endurance amplitude on the secondary slope at `nd` cycles.
    pub fn calc_sd(&self, nd: f64) -> Result<f64, EngineError> {
        if !(nd > 0.0) {
            return Err(EngineError::invalid(format!(
                "cycle count {nd} must be > 0"
            )));
        }
        Ok((self.sx.ln() + (nd.ln() - self.nx.ln()) / self.k2).exp())
    }
}
