//! # Streaming Rainflow Counting Engine
//!
//! Extracts closed hysteresis cycles from scalar load-time histories
//! using the four-point method (or the HCM three-point variant),
//! accumulates them into a rainflow matrix, range-pair and
//! level-crossing histograms, and integrates fatigue damage against a
//! configurable Wöhler curve — incrementally, chunk by chunk.
//!
//! ## Pipeline
//!
//! 1. **Peak–valley filter** — raw samples → turning points, with a
//!    hysteresis band swallowing small reversals.
//! 2. **Residue** — turning points not yet paired into closed cycles.
//! 3. **Cycle finder** — four-point containment or HCM stack logic.
//! 4. **Accumulators** — matrix/range-pair/level-crossing counts plus
//!    damage (optionally LUT-accelerated, mean-stress transformed, and
//!    spread over stored turning points).
//! 5. **Residue finalizer** — one of the standardized policies closes
//!    the stream.
//!
//! ## Example
//!
//! ```rust
//! use fatigue::flags::CountFlags;
//! use fatigue::methods::ResidualMethod;
//! use fatigue_rainflow::RainflowEngine;
//!
//! let mut engine = RainflowEngine::new(6, 1.0, 0.0, 1.0, CountFlags::STANDARD)?;
//! engine.wl_init_original(1000.0, 1e7, -5.0)?;
//! engine.feed(&[0.0, 5.0, 1.0, 5.0])?;
//! engine.finalize(ResidualMethod::None)?;
//! assert_eq!(engine.residue().len(), 2);
//! # Ok::<(), fatigue::error::EngineError>(())
//! ```

pub mod counting;
pub mod delegate;
pub mod engine;
pub mod finalize;
pub mod histogram;
pub mod hysteresis;
pub mod lut;
pub mod matrix;
pub mod residue;
pub mod spread;
pub mod turning_points;
pub mod types;

pub use engine::RainflowEngine;
pub use types::{ContextState, CycleEvent, Sample, TurningPoint};
