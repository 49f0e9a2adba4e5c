//! Method selection enums shared between configuration and the engine.

use serde::{Deserialize, Serialize};

/// Cycle-closure detection algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountingMethod {
    /// Peak–valley filtering only, no cycle counting.
    None,
    /// Four-point closure over the residue tail.
    #[default]
    FourPoint,
    /// HCM (Clormann–Seeger) three-point method.
    Hcm,
    /// Caller-installed capability drives closure.
    Delegated,
}

/// Residue treatment applied at finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResidualMethod {
    /// Leave the residue as-is.
    #[default]
    None,
    /// Alias of `None` kept for standard terminology.
    Ignore,
    /// Empty the residue without counting.
    Discard,
    /// Count every adjacent residue pair as a half cycle (ASTM).
    HalfCycles,
    /// Count every adjacent residue pair as a full cycle.
    FullCycles,
    /// Clormann–Seeger four-window residue pass.
    ClormannSeeger,
    /// Re-feed the residue concatenated with itself.
    Repeated,
    /// Range-pair counting per DIN 45667.
    RpDin45667,
}

impl ResidualMethod {
    /// True for `None`/`Ignore`, which leave all state untouched.
    #[inline]
    pub const fn leaves_residue(&self) -> bool {
        matches!(self, Self::None | Self::Ignore)
    }
}

/// How a counted cycle's damage is spread over turning points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpreadMethod {
    /// No spreading.
    #[default]
    None,
    /// Split evenly between the cycle's two turning points.
    Half23,
    /// Amplitude-weighted ramp from `from` to `to`.
    RampAmplitude23,
    /// Linear damage ramp from `from` to `to`.
    RampDamage23,
    /// Amplitude-weighted ramp from `from` to the follow-up point.
    RampAmplitude24,
    /// Linear damage ramp from `from` to the follow-up point.
    RampDamage24,
    /// All damage onto the cycle's first turning point.
    FullP2,
    /// All damage onto the cycle's second turning point.
    FullP3,
    /// Reserved, not implemented.
    Transient23,
    /// Reserved, not implemented.
    Transient23c,
}

impl SpreadMethod {
    /// Reserved modes are recognized but rejected at configuration time.
    #[inline]
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Transient23 | Self::Transient23c)
    }
}

/// Wöhler-parameter treatment for `damage_from_rp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RpDamageMethod {
    /// Parameters as configured.
    #[default]
    Default,
    /// Endurance limit switched off (Miner elementary).
    Elementar,
    /// Secondary slope active below the knee (Miner modified).
    Modified,
    /// Fatigue-strength depression from the largest range down.
    Consequent,
}
