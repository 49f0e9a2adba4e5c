//! Mean-stress amplitude transformation over a Haigh reference curve.
//!
//! A cycle's damaging effect depends on its mean stress. The reference
//! curve gives the allowed amplitude as a function of mean, normalized
//! so the fully-reversed amplitude (mean 0) is 1. `transform` converts
//! a cycle `(sa, sm)` into the amplitude that causes the same damage at
//! the rig's mean-stress condition — either a pinned stress ratio `R`
//! or a pinned mean.
//!
//! Without a user curve, the FKM reference curve is built from the
//! mean-stress sensitivity `M` (secondary slope `M/3` beyond `R = 0`).

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One sample of the Haigh reference curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaighPoint {
    /// Allowed amplitude (normalized, > 0).
    pub sa: f64,
    /// Mean stress.
    pub sm: f64,
}

/// The rig condition amplitudes are transformed to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformTarget {
    /// Constant stress ratio `R = Smin/Smax` at the rig.
    PinnedR(f64),
    /// Constant mean stress at the rig.
    PinnedMean(f64),
}

/// Validated amplitude transform: reference curve plus target condition.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeTransform {
    curve: Vec<HaighPoint>,
    target: TransformTarget,
    symmetric: bool,
}

fn at_err(reason: impl Into<String>) -> EngineError {
    EngineError::AmplitudeTransform {
        reason: reason.into(),
    }
}

impl AmplitudeTransform {
    /// Build from a user-supplied reference curve.
    ///
    /// The curve must have `sa > 0`, non-decreasing `sm`, and
    /// non-decreasing `sm/sa`. In symmetric mode the curve is mirrored
    /// around `sm = 0` and must not already contain negative means.
    pub fn from_curve(
        points: &[HaighPoint],
        target: TransformTarget,
        symmetric: bool,
    ) -> Result<Self, EngineError> {
        if points.is_empty() {
            return Err(at_err("reference curve is empty"));
        }
        for p in points {
            if !(p.sa > 0.0) || !p.sa.is_finite() || !p.sm.is_finite() {
                return Err(at_err(format!(
                    "curve point (sa={}, sm={}) out of range",
                    p.sa, p.sm
                )));
            }
        }
        for w in points.windows(2) {
            if w[1].sm < w[0].sm {
                return Err(at_err("curve means must be non-decreasing"));
            }
            if w[1].sm / w[1].sa < w[0].sm / w[0].sa {
                return Err(at_err("curve mean/amplitude ratios must be non-decreasing"));
            }
        }

        let curve = if symmetric {
            if points.iter().any(|p| p.sm < 0.0) {
                return Err(at_err("symmetric curve must not contain negative means"));
            }
            let mut mirrored: Vec<HaighPoint> = points
                .iter()
                .filter(|p| p.sm > 0.0)
                .rev()
                .map(|p| HaighPoint {
                    sa: p.sa,
                    sm: -p.sm,
                })
                .collect();
            mirrored.extend_from_slice(points);
            mirrored
        } else {
            points.to_vec()
        };

        Ok(Self {
            curve,
            target,
            symmetric,
        })
    }

    /// Build the FKM reference curve from the mean-stress sensitivity `M`.
    ///
    /// Points: `R = ∞` (`sa = 1/(1−M)`, `sm = −sa`), `R = −1` (1, 0),
    /// `R = 0` (`sa = 1/(1+M)`, `sm = sa`), `R = 0.5`
    /// (`sa = Sa(R=0)·(1+M/3)/(1+M)`, `sm = 3·sa`). Symmetric mode
    /// mirrors the tension side instead of using the `R = ∞` branch.
    pub fn from_sensitivity(
        m: f64,
        target: TransformTarget,
        symmetric: bool,
    ) -> Result<Self, EngineError> {
        if !(0.0..1.0).contains(&m) {
            return Err(at_err(format!("mean-stress sensitivity {m} outside [0, 1)")));
        }
        let sa_r_inf = 1.0 / (1.0 - m);
        let sa_r_0 = 1.0 / (1.0 + m);
        let sa_r_05 = sa_r_0 * (1.0 + m / 3.0) / (1.0 + m);

        if symmetric {
            Self::from_curve(
                &[
                    HaighPoint { sa: 1.0, sm: 0.0 },
                    HaighPoint {
                        sa: sa_r_0,
                        sm: sa_r_0,
                    },
                    HaighPoint {
                        sa: sa_r_05,
                        sm: 3.0 * sa_r_05,
                    },
                ],
                target,
                true,
            )
        } else {
            Self::from_curve(
                &[
                    HaighPoint {
                        sa: sa_r_inf,
                        sm: -sa_r_inf,
                    },
                    HaighPoint { sa: 1.0, sm: 0.0 },
                    HaighPoint {
                        sa: sa_r_0,
                        sm: sa_r_0,
                    },
                    HaighPoint {
                        sa: sa_r_05,
                        sm: 3.0 * sa_r_05,
                    },
                ],
                target,
                false,
            )
        }
    }

    /// The validated (possibly mirrored) reference curve.
    pub fn curve(&self) -> &[HaighPoint] {
        &self.curve
    }

    /// The configured rig condition.
    pub const fn target(&self) -> TransformTarget {
        self.target
    }

    /// Whether the curve was mirrored around `sm = 0`.
    pub const fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Alleviation factor at mean/amplitude ratio `m`.
    ///
    /// Intersects the constant-R ray `sm = m·sa` with the curve segment
    /// whose ratio range contains `m`; clips to the first/last point.
    fn alleviation(&self, m: f64) -> f64 {
        let first = &self.curve[0];
        let last = &self.curve[self.curve.len() - 1];
        if m <= first.sm / first.sa {
            return first.sa;
        }
        if m >= last.sm / last.sa {
            return last.sa;
        }
        for w in self.curve.windows(2) {
            let (l, r) = (&w[0], &w[1]);
            if m > r.sm / r.sa {
                continue;
            }
            // Ray sm = m·sa against the segment l→r.
            let denom = (r.sm - l.sm) - m * (r.sa - l.sa);
            if denom.abs() < 1e-300 {
                return l.sa;
            }
            let t = (m * l.sa - l.sm) / denom;
            return l.sa + t * (r.sa - l.sa);
        }
        last.sa
    }

    /// Transform amplitude `sa` at mean `sm` to the rig condition.
    ///
    /// Zero amplitude passes through unchanged.
    pub fn transform(&self, sa: f64, sm: f64) -> Result<f64, EngineError> {
        if sa == 0.0 {
            return Ok(0.0);
        }
        if !(sa > 0.0) || !sa.is_finite() || !sm.is_finite() {
            return Err(at_err(format!("amplitude {sa} / mean {sm} out of range")));
        }

        let alpha = self.alleviation(sm / sa);
        if !(alpha > 0.0) {
            return Err(at_err("degenerate alleviation factor"));
        }

        match self.target {
            TransformTarget::PinnedR(r) => {
                // Sm/Sa at constant R: (1 + R) / (1 − R); R = ±∞ maps to −1.
                let m_t = if r.is_infinite() {
                    -1.0
                } else if (1.0 - r).abs() < f64::EPSILON {
                    return Err(at_err("target R = 1 is a static load"));
                } else {
                    (1.0 + r) / (1.0 - r)
                };
                Ok(sa * self.alleviation(m_t) / alpha)
            }
            TransformTarget::PinnedMean(sm_rig) => {
                // Scale the curve onto the cycle's damage level, then read
                // the amplitude where it meets the rig mean.
                let f = sa / alpha;
                let first = &self.curve[0];
                let last = &self.curve[self.curve.len() - 1];
                if sm_rig <= f * first.sm {
                    return Ok(f * first.sa);
                }
                if sm_rig >= f * last.sm {
                    return Ok(f * last.sa);
                }
                for w in self.curve.windows(2) {
                    let (l, r) = (&w[0], &w[1]);
                    if sm_rig > f * r.sm {
                        continue;
                    }
                    let span = r.sm - l.sm;
                    if span.abs() < 1e-300 {
                        return Ok(f * l.sa);
                    }
                    let t = (sm_rig / f - l.sm) / span;
                    return Ok(f * (l.sa + t * (r.sa - l.sa)));
                }
                Ok(f * last.sa)
            }
        }
    }
}
