//! Per-context capability overrides.
//!
//! A caller may replace individual engine behaviors without forking
//! the counting loop: damage computation, amplitude transformation,
//! turning-point interception, cycle closure, and turning-point store
//! access. Unset capabilities use the built-in paths.

use fatigue::error::EngineError;
use fatigue::wohler::WohlerParams;

use crate::residue::Residue;
use crate::types::{CycleEvent, Sample, TurningPoint};
use crate::turning_points::TurningPointStore;

/// Damage per full cycle of the given (transformed) amplitude.
pub type DamageFn = Box<dyn Fn(&WohlerParams, f64) -> Result<f64, EngineError> + Send>;

/// Amplitude transform `(sa, sm) → sa'`.
pub type TransformFn = Box<dyn Fn(f64, f64) -> Result<f64, EngineError> + Send>;

/// Observes each confirmed turning point before it enters the residue;
/// returning `false` drops the point.
pub type NextTpFn = Box<dyn FnMut(&mut Sample) -> bool + Send>;

/// Drives cycle closure over the residue, returning the closed cycles.
pub type CycleFindFn = Box<dyn FnMut(&mut Residue) -> Result<Vec<CycleEvent>, EngineError> + Send>;

/// Replaces turning-point store appends; returns the assigned 1-based
/// `tp_pos`.
pub type TpAddFn = Box<dyn FnMut(&mut TurningPointStore, Sample) -> Result<u64, EngineError> + Send>;

/// Replaces turning-point store lookups.
pub type TpGetFn = Box<dyn Fn(&TurningPointStore, u64) -> Option<TurningPoint> + Send>;

/// The capability set of one context.
#[derive(Default)]
pub struct Capabilities {
    /// Damage computation override.
    pub damage: Option<DamageFn>,
    /// Amplitude transform override.
    pub at_transform: Option<TransformFn>,
    /// Turning-point interception.
    pub next_tp: Option<NextTpFn>,
    /// Cycle closure override (counting method `Delegated`).
    pub cycle_find: Option<CycleFindFn>,
    /// Store append override.
    pub tp_add: Option<TpAddFn>,
    /// Store lookup override.
    pub tp_get: Option<TpGetFn>,
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("damage", &self.damage.is_some())
            .field("at_transform", &self.at_transform.is_some())
            .field("next_tp", &self.next_tp.is_some())
            .field("cycle_find", &self.cycle_find.is_some())
            .field("tp_add", &self.tp_add.is_some())
            .field("tp_get", &self.tp_get.is_some())
            .finish()
    }
}

impl Capabilities {
    /// True when no capability is overridden.
    pub fn is_empty(&self) -> bool {
        self.damage.is_none()
            && self.at_transform.is_none()
            && self.next_tp.is_none()
            && self.cycle_find.is_none()
            && self.tp_add.is_none()
            && self.tp_get.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_is_empty() {
        let caps = Capabilities::default();
        assert!(caps.is_empty());
        let text = format!("{caps:?}");
        assert!(text.contains("damage: false"));
    }

    #[test]
    fn installed_capability_is_reported() {
        let caps = Capabilities {
            damage: Some(Box::new(|_, _| Ok(0.0))),
            ..Default::default()
        };
        assert!(!caps.is_empty());
        assert!(format!("{caps:?}").contains("damage: true"));
    }
}
