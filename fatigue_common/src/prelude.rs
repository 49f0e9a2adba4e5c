//! Prelude module for common re-exports.
//!
//! `use fatigue_common::prelude::*;` pulls in the types nearly every
//! consumer of the engine needs without listing individual paths.

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::EngineError;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, EngineConfig};
pub use crate::flags::CountFlags;
pub use crate::methods::{CountingMethod, ResidualMethod, RpDamageMethod, SpreadMethod};

// ─── Models ─────────────────────────────────────────────────────────
pub use crate::class::ClassParams;
pub use crate::haigh::{AmplitudeTransform, HaighPoint, TransformTarget};
pub use crate::wohler::WohlerParams;

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{FULL_CYCLE_INC, HALF_CYCLE_INC, MAX_CLASS_COUNT};
