//! Load-class quantizer.
//!
//! Maps real-valued samples onto class indices and back to class means
//! and upper bounds. A class count of zero disables quantization: the
//! engine then only runs the peak–valley filter, with no histograms and
//! no damage.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_CLASS_COUNT;
use crate::error::EngineError;

/// Class parameters `(count, width, offset)`.
///
/// A value `v` belongs to class `floor((v − offset) / width)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassParams {
    /// Number of classes (0 disables quantization).
    pub count: u16,
    /// Class width (> 0 when `count > 0`).
    pub width: f64,
    /// Lower bound of class 0.
    pub offset: f64,
}

impl Default for ClassParams {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ClassParams {
    /// Construct and validate class parameters.
    pub fn new(count: u16, width: f64, offset: f64) -> Result<Self, EngineError> {
        let params = Self {
            count,
            width,
            offset,
        };
        params.validate()?;
        Ok(params)
    }

    /// Quantization-disabled parameters.
    pub const fn disabled() -> Self {
        Self {
            count: 0,
            width: 1.0,
            offset: 0.0,
        }
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.count > MAX_CLASS_COUNT {
            return Err(EngineError::invalid(format!(
                "class count {} exceeds limit {MAX_CLASS_COUNT}",
                self.count
            )));
        }
        if self.count > 0 && !(self.width > 0.0) {
            return Err(EngineError::invalid(format!(
                "class width {} must be > 0",
                self.width
            )));
        }
        if !self.width.is_finite() || !self.offset.is_finite() {
            return Err(EngineError::invalid("class width/offset must be finite"));
        }
        Ok(())
    }

    /// True when quantization is active.
    #[inline]
    pub const fn enabled(&self) -> bool {
        self.count > 0
    }

    /// Raw class index of `v`, not clipped.
    ///
    /// May fall outside `[0, count)`; during feed that is an
    /// invalid-argument condition, decided by the caller.
    #[inline]
    pub fn index(&self, v: f64) -> i64 {
        ((v - self.offset) / self.width).floor() as i64
    }

    /// Class index of `v`, clipped into `[0, count − 1]`.
    ///
    /// Valid only when writing into an N-sized container where clipping
    /// is the documented behavior.
    #[inline]
    pub fn index_clipped(&self, v: f64) -> u16 {
        debug_assert!(self.count > 0);
        self.index(v).clamp(0, self.count as i64 - 1) as u16
    }

    /// Mid value of class `c`.
    #[inline]
    pub fn mean(&self, c: u16) -> f64 {
        self.offset + self.width * (c as f64 + 0.5)
    }

    /// Upper bound of class `c`.
    #[inline]
    pub fn upper(&self, c: u16) -> f64 {
        self.offset + self.width * (c as f64 + 1.0)
    }

    /// Slope/closure comparison tolerance derived from the class width.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.width / crate::consts::HYSTERESIS_EPS_DIV
    }
}
