//! Damage spreading over stored turning points.
//!
//! When a cycle is counted, its damage can be apportioned to the
//! turning points (and the per-sample damage history) responsible for
//! it: split between the cycle's endpoints, assigned to one of them,
//! or ramped across every stored point inside the cycle's span.
//!
//! The repeated-residue finalizer re-feeds points with their original
//! stream positions, so a cycle may span the stream end; position
//! arithmetic then wraps by the absolute stream length.

use fatigue::error::EngineError;
use fatigue::methods::SpreadMethod;

use crate::engine::RainflowEngine;
use crate::types::Sample;

/// Wrap-aware span from `start` to `end` (1-based positions).
///
/// When `start ≥ end` the window crosses the stream end and the
/// absolute stream length is added before differencing.
#[inline]
pub(crate) fn wrapped_span(start: u64, end: u64, stream_len: u64) -> u64 {
    if start >= end {
        end + stream_len - start
    } else {
        end - start
    }
}

/// Offset of `pos` inside the (possibly wrapped) window starting at
/// `start`; `None` when `pos` lies outside the window span.
#[inline]
pub(crate) fn wrapped_offset(pos: u64, start: u64, span: u64, stream_len: u64) -> Option<u64> {
    let normalized = if pos >= start {
        pos - start
    } else {
        pos + stream_len - start
    };
    (normalized <= span).then_some(normalized)
}

impl RainflowEngine {
    /// Apportion one counted cycle's damage contribution.
    pub(crate) fn spread_cycle(
        &mut self,
        from: Sample,
        to: Sample,
        next: Sample,
        damage: f64,
    ) -> Result<(), EngineError> {
        match self.spread_method {
            SpreadMethod::None => Ok(()),
            SpreadMethod::Half23 => {
                self.deposit(from, damage / 2.0)?;
                self.deposit(to, damage / 2.0)
            }
            SpreadMethod::FullP2 => self.deposit(from, damage),
            SpreadMethod::FullP3 => self.deposit(to, damage),
            SpreadMethod::RampAmplitude23 => self.ramp(from, to, damage, true),
            SpreadMethod::RampDamage23 => self.ramp(from, to, damage, false),
            SpreadMethod::RampAmplitude24 => self.ramp(from, next, damage, true),
            SpreadMethod::RampDamage24 => self.ramp(from, next, damage, false),
            SpreadMethod::Transient23 | SpreadMethod::Transient23c => {
                Err(EngineError::unsupported(format!(
                    "spread method {:?} is reserved",
                    self.spread_method
                )))
            }
        }
    }

    /// Add `damage` to a cycle endpoint's stored turning point and to
    /// the damage history at its stream position.
    fn deposit(&mut self, at: Sample, damage: f64) -> Result<(), EngineError> {
        if damage <= 0.0 {
            return Ok(());
        }
        if let Some(store) = self.tp.as_mut() {
            store.add_damage(at.tp_pos, damage)?;
        }
        if let Some(dh) = self.dh.as_mut() {
            dh.add(at.pos, damage)?;
        }
        Ok(())
    }

    /// Ramp the damage across every stored turning point inside the
    /// window `[start, end]`.
    ///
    /// `amplitude_weighted` raises the position fraction to the
    /// (positive) Wöhler slope, mirroring how damage grows with the
    /// amplitude ramp; otherwise the fraction is applied linearly.
    /// A point only ever gains damage: the new target is compared with
    /// what it already carries and the difference is added.
    fn ramp(
        &mut self,
        start: Sample,
        end: Sample,
        damage: f64,
        amplitude_weighted: bool,
    ) -> Result<(), EngineError> {
        let Some(wl) = self.wohler else {
            return Ok(());
        };
        let span = wrapped_span(start.pos, end.pos, self.stream_len);
        if span == 0 {
            return Ok(());
        }
        let stream_len = self.stream_len;
        let Some(store) = self.tp.as_mut() else {
            return Ok(());
        };
        for tp in store.points_mut().iter_mut() {
            let Some(offset) = wrapped_offset(tp.sample.pos, start.pos, span, stream_len) else {
                continue;
            };
            let w = offset as f64 / span as f64;
            let target = if amplitude_weighted {
                damage * w.powf(-wl.k)
            } else {
                damage * w
            };
            if target > tp.damage {
                let diff = target - tp.damage;
                tp.damage = target;
                if let Some(dh) = self.dh.as_mut() {
                    dh.add(tp.sample.pos, diff)?;
                }
            }
        }
        Ok(())
    }
}
