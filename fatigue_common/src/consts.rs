//! System-wide constants for the fatigue workspace.
//!
//! Single source of truth for all numeric limits and count units.
//! Imported by all crates — no duplication permitted.

/// Maximum number of load classes a context may be configured with.
pub const MAX_CLASS_COUNT: u16 = 512;

/// Stored count units for one full closed cycle.
///
/// Histograms accumulate in these units so that half-cycles from residue
/// finalization stay exact integers. Reported cycle counts are
/// `stored / FULL_CYCLE_INC`.
pub const FULL_CYCLE_INC: u64 = 4096;

/// Stored count units for one half cycle.
pub const HALF_CYCLE_INC: u64 = FULL_CYCLE_INC / 2;

/// Saturation ceiling for any single histogram bin.
///
/// An addition that would push a bin past this limit is a hard fault,
/// never a silent wrap.
pub const COUNT_LIMIT: u64 = u64::MAX - FULL_CYCLE_INC;

/// Divisor turning the class width into the slope/closure comparison
/// tolerance: `ε = class_width / HYSTERESIS_EPS_DIV`.
pub const HYSTERESIS_EPS_DIV: f64 = 100.0;

/// Minimum residue capacity reserve, independent of class count.
pub const RESIDUE_MIN_CAPACITY: usize = 3;

/// Default mean-stress sensitivity for the FKM reference curve.
pub const DEFAULT_MEAN_SENSITIVITY: f64 = 0.3;

static_assertions::const_assert!(FULL_CYCLE_INC % 2 == 0);
static_assertions::const_assert!(COUNT_LIMIT < u64::MAX);
static_assertions::const_assert!(MAX_CLASS_COUNT as usize * 2 >= RESIDUE_MIN_CAPACITY);
