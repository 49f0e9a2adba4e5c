//! Core value types of the counting engine.

use serde::{Deserialize, Serialize};

/// One stream sample after quantization.
///
/// `pos` is the 1-based absolute position in the input stream across
/// all chunks. `tp_pos` is the 1-based back-reference into the
/// turning-point store (0 = none); it is maintained by the engine and
/// ignored on input tuples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    /// Sample value.
    pub value: f64,
    /// Class index (0 when quantization is disabled).
    pub class: u16,
    /// 1-based absolute stream position.
    pub pos: u64,
    /// 1-based turning-point store back-reference (0 = none).
    #[serde(default)]
    pub tp_pos: u64,
}

impl Sample {
    /// Bare value tuple without position bookkeeping.
    pub const fn new(value: f64, class: u16) -> Self {
        Self {
            value,
            class,
            pos: 0,
            tp_pos: 0,
        }
    }
}

/// A stored turning point with its accumulated spread damage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TurningPoint {
    /// The confirmed extremum.
    pub sample: Sample,
    /// Damage apportioned to this point by spreading.
    pub damage: f64,
}

/// A closed cycle emitted by a cycle finder.
///
/// `from`/`to` are the inner pair; `next` is the turning point that
/// triggered closure (used by the spread-to-follow-up modes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleEvent {
    /// First inner turning point.
    pub from: Sample,
    /// Second inner turning point.
    pub to: Sample,
    /// Turning point that closed the cycle.
    pub next: Sample,
}

/// Context lifecycle state.
///
/// `Init0 → Init` on configuration, `Init ↔ Busy/BusyInterim` while
/// feeding, any → `Finalize → Finished` on finalization, any fault →
/// `Error` (terminal until re-initialization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ContextState {
    /// Unconfigured shell.
    #[default]
    Init0 = 0,
    /// Configured, nothing fed yet.
    Init = 1,
    /// Feeding, no interim point pending.
    Busy = 2,
    /// Feeding, tentative interim point at the residue tail.
    BusyInterim = 3,
    /// Residue finalization in progress.
    Finalize = 4,
    /// Finalized; histograms frozen.
    Finished = 5,
    /// Faulted; only de-initialization is permitted.
    Error = 6,
}

impl ContextState {
    /// Stable name for error reporting.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init0 => "INIT0",
            Self::Init => "INIT",
            Self::Busy => "BUSY",
            Self::BusyInterim => "BUSY_INTERIM",
            Self::Finalize => "FINALIZE",
            Self::Finished => "FINISHED",
            Self::Error => "ERROR",
        }
    }

    /// True while `feed` calls are permitted.
    #[inline]
    pub const fn accepts_feed(self) -> bool {
        matches!(self, Self::Init | Self::Busy | Self::BusyInterim)
    }

    /// True once the context is configured and not faulted.
    #[inline]
    pub const fn is_configured(self) -> bool {
        !matches!(self, Self::Init0 | Self::Error)
    }
}
