//! Hysteresis peak–valley filter.
//!
//! Turns the raw sample stream into turning points. Reversals whose
//! range stays inside the hysteresis band are swallowed; a candidate
//! extremum is kept as a tentative *interim* point until the signal
//! moves away from it by more than the band, at which moment it is
//! confirmed and handed to the cycle finder.

use crate::types::Sample;

/// Filter micro-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    /// No sample seen yet.
    #[default]
    Empty,
    /// Tracking first extrema, no turning point confirmed.
    Hunting,
    /// Confirmed turning points exist; the last extremum is interim.
    Interim,
}

/// Streaming peak–valley filter state.
#[derive(Debug, Clone, Default)]
pub struct PeakValleyFilter {
    hysteresis: f64,
    /// Slope comparison tolerance (class width / 100).
    eps: f64,
    phase: Phase,
    /// Running minimum while hunting for the first turning point.
    min: Sample,
    /// Running maximum while hunting for the first turning point.
    max: Sample,
    /// Tentative last extremum.
    interim: Option<Sample>,
    /// Current slope sign: +1 rising, −1 falling.
    slope: i8,
}

impl PeakValleyFilter {
    /// New filter with the given hysteresis band and slope tolerance.
    pub fn new(hysteresis: f64, eps: f64) -> Self {
        Self {
            hysteresis,
            eps,
            ..Self::default()
        }
    }

    /// Reset to the pristine state, keeping the configuration.
    pub fn reset(&mut self) {
        let (hysteresis, eps) = (self.hysteresis, self.eps);
        *self = Self::new(hysteresis, eps);
    }

    /// The tentative interim point, if any.
    pub const fn interim(&self) -> Option<Sample> {
        self.interim
    }

    /// Take the interim point out (used by finalization).
    pub fn take_interim(&mut self) -> Option<Sample> {
        self.interim.take()
    }

    /// True once at least one turning point has been confirmed.
    pub fn has_interim(&self) -> bool {
        self.interim.is_some()
    }

    /// Smallest stream position still referenced by the filter state.
    ///
    /// Needed by pruning when positions are shifted down.
    pub fn min_live_pos(&self) -> Option<u64> {
        match self.phase {
            Phase::Empty => None,
            Phase::Hunting => Some(self.min.pos.min(self.max.pos)),
            Phase::Interim => self.interim.map(|s| s.pos),
        }
    }

    /// Shift all retained stream positions down by `delta`.
    pub fn shift_positions(&mut self, delta: u64) {
        self.min.pos = self.min.pos.saturating_sub(delta);
        self.max.pos = self.max.pos.saturating_sub(delta);
        if let Some(s) = self.interim.as_mut() {
            s.pos = s.pos.saturating_sub(delta);
        }
    }

    /// Sign of `d` with the configured tolerance band.
    #[inline]
    fn sign(&self, d: f64) -> i8 {
        if d > self.eps {
            1
        } else if d < -self.eps {
            -1
        } else {
            0
        }
    }

    /// Feed one finite sample; returns the newly confirmed turning
    /// point, if this sample produced one.
    pub fn apply(&mut self, p: Sample) -> Option<Sample> {
        match self.phase {
            Phase::Empty => {
                self.min = p;
                self.max = p;
                self.phase = Phase::Hunting;
                None
            }
            Phase::Hunting => {
                if p.value < self.min.value {
                    self.min = p;
                }
                if p.value > self.max.value {
                    self.max = p;
                }
                if self.max.value - self.min.value > self.hysteresis {
                    // The earlier extremum is the first confirmed
                    // turning point; the current sample goes interim.
                    let (first, rising) = if self.min.pos <= self.max.pos {
                        (self.min, true)
                    } else {
                        (self.max, false)
                    };
                    self.slope = if rising { 1 } else { -1 };
                    self.interim = Some(p);
                    self.phase = Phase::Interim;
                    Some(first)
                } else {
                    None
                }
            }
            Phase::Interim => {
                let Some(last) = self.interim else {
                    return None;
                };
                let d = p.value - last.value;
                let s = self.sign(d);
                if s == self.slope {
                    // Continuation: the extremum moved further out.
                    self.interim = Some(p);
                    None
                } else if d.abs() > self.hysteresis {
                    // Reversal beyond the band: the interim point is a
                    // real turning point.
                    self.interim = Some(p);
                    self.slope = -self.slope;
                    Some(last)
                } else {
                    // Inside the band.
                    None
                }
            }
        }
    }
}
