//! Count-configuration bitflags.
//!
//! Selects which accumulators a context maintains and how the
//! turning-point store prunes itself.

use bitflags::bitflags;

bitflags! {
    /// Per-context counting configuration.
    ///
    /// Histogram flags (RFM, RP, LC_*) select which accumulators are
    /// allocated at init; the TP_* flags steer turning-point pruning.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CountFlags: u16 {
        /// Maintain the rainflow matrix.
        const RFM                  = 0x0001;
        /// Accumulate fatigue damage.
        const DAMAGE               = 0x0002;
        /// Maintain the per-sample damage history.
        const DH                   = 0x0004;
        /// Maintain the range-pair histogram.
        const RP                   = 0x0008;
        /// Count upward level crossings.
        const LC_UP                = 0x0010;
        /// Count downward level crossings.
        const LC_DN                = 0x0020;
        /// Record the stream's first and last samples as turning
        /// points in the store, even when filtering would drop them.
        const ENFORCE_MARGIN       = 0x0040;
        /// Automatically prune the turning-point store past its threshold.
        const TP_AUTOPRUNE         = 0x0080;
        /// Pruning keeps original stream positions.
        const TP_PRUNE_PRESERVE_POS = 0x0100;
        /// Pruning keeps points still referenced by the residue.
        const TP_PRUNE_PRESERVE_RES = 0x0200;
    }
}

impl CountFlags {
    /// Mask of all histogram/damage accumulator selections.
    pub const ACCUMULATORS: Self = Self::from_bits_truncate(
        Self::RFM.bits()
            | Self::DAMAGE.bits()
            | Self::DH.bits()
            | Self::RP.bits()
            | Self::LC_UP.bits()
            | Self::LC_DN.bits(),
    );

    /// Default configuration: matrix, range pairs, both crossing
    /// directions, and damage.
    pub const STANDARD: Self = Self::from_bits_truncate(
        Self::RFM.bits()
            | Self::RP.bits()
            | Self::LC_UP.bits()
            | Self::LC_DN.bits()
            | Self::DAMAGE.bits(),
    );

    /// Returns true if any level-crossing direction is enabled.
    #[inline]
    pub const fn counts_level_crossings(&self) -> bool {
        self.intersects(Self::LC_UP.union(Self::LC_DN))
    }
}

impl Default for CountFlags {
    fn default() -> Self {
        Self::STANDARD
    }
}
