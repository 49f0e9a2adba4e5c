//! TOML configuration loader with validation.
//!
//! Hosts embedding the engine can describe a complete counting setup in
//! a TOML document; `EngineConfig` parses it, validates every
//! cross-field rule, and hands out the typed parameter sets the engine
//! consumes. Constructing the parameter structs directly is equally
//! supported — this layer is a convenience, not a requirement.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::class::ClassParams;
use crate::error::EngineError;
use crate::flags::CountFlags;
use crate::haigh::{AmplitudeTransform, HaighPoint, TransformTarget};
use crate::methods::{CountingMethod, ResidualMethod, RpDamageMethod, SpreadMethod};
use crate::wohler::WohlerParams;

// ─── Error Type ─────────────────────────────────────────────────────

/// Configuration loading/validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("config I/O error: {0}")]
    Io(String),
    /// TOML parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Parameter validation error.
    #[error("config validation: {0}")]
    Validation(#[from] EngineError),
}

// ─── Config Sections ────────────────────────────────────────────────

/// Counting algorithm selection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CountingConfig {
    /// Cycle-closure algorithm.
    pub method: CountingMethod,
    /// Residue policy applied at finalization.
    pub residual_method: ResidualMethod,
    /// Damage spreading mode.
    pub spread_method: SpreadMethod,
    /// Wöhler treatment for range-pair damage computation.
    pub rp_damage_method: RpDamageMethod,
}

/// Accumulator selection, TOML-friendly boolean form of [`CountFlags`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CountsConfig {
    /// Rainflow matrix.
    pub rfm: bool,
    /// Cumulative damage.
    pub damage: bool,
    /// Per-sample damage history.
    pub damage_history: bool,
    /// Range-pair histogram.
    pub range_pairs: bool,
    /// Upward level crossings.
    pub level_crossings_up: bool,
    /// Downward level crossings.
    pub level_crossings_down: bool,
    /// Record the stream's first and last samples in the
    /// turning-point store.
    pub enforce_margin: bool,
}

impl Default for CountsConfig {
    fn default() -> Self {
        Self {
            rfm: true,
            damage: true,
            damage_history: false,
            range_pairs: true,
            level_crossings_up: true,
            level_crossings_down: true,
            enforce_margin: false,
        }
    }
}

impl CountsConfig {
    /// Collapse into the engine flag set.
    pub fn to_flags(&self) -> CountFlags {
        let mut flags = CountFlags::empty();
        flags.set(CountFlags::RFM, self.rfm);
        flags.set(CountFlags::DAMAGE, self.damage);
        flags.set(CountFlags::DH, self.damage_history);
        flags.set(CountFlags::RP, self.range_pairs);
        flags.set(CountFlags::LC_UP, self.level_crossings_up);
        flags.set(CountFlags::LC_DN, self.level_crossings_down);
        flags.set(CountFlags::ENFORCE_MARGIN, self.enforce_margin);
        flags
    }
}

/// Wöhler curve in one of the three Miner forms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "kebab-case")]
pub enum WohlerConfig {
    /// Single slope through `(sx, nx)`.
    Elementary {
        /// Knee amplitude.
        sx: f64,
        /// Cycles to failure at the knee.
        nx: f64,
        /// Slope (negative).
        k: f64,
    },
    /// Endurance limit at `(sd, nd)`.
    Original {
        /// Endurance amplitude.
        sd: f64,
        /// Cycles to failure at the endurance amplitude.
        nd: f64,
        /// Slope (negative).
        k: f64,
    },
    /// Secondary slope `k2` below the knee.
    Modified {
        /// Knee amplitude.
        sx: f64,
        /// Cycles to failure at the knee.
        nx: f64,
        /// Slope above the knee.
        k: f64,
        /// Slope below the knee.
        k2: f64,
    },
}

impl WohlerConfig {
    /// Build validated Wöhler parameters.
    pub fn to_params(&self) -> Result<WohlerParams, EngineError> {
        match *self {
            Self::Elementary { sx, nx, k } => WohlerParams::elementary(sx, nx, k),
            Self::Original { sd, nd, k } => WohlerParams::original(sd, nd, k),
            Self::Modified { sx, nx, k, k2 } => WohlerParams::modified(sx, nx, k, k2),
        }
    }
}

/// Amplitude-transform section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    /// Mean-stress sensitivity for the FKM default curve.
    pub mean_sensitivity: Option<f64>,
    /// Explicit reference curve (overrides `mean_sensitivity`).
    pub curve: Option<Vec<HaighPoint>>,
    /// Pinned stress ratio at the rig.
    pub r: Option<f64>,
    /// Pinned mean at the rig.
    pub mean: Option<f64>,
    /// Mirror the curve around zero mean.
    #[serde(default)]
    pub symmetric: bool,
}

impl TransformConfig {
    /// Build the validated transform.
    pub fn to_transform(&self) -> Result<AmplitudeTransform, EngineError> {
        let target = match (self.r, self.mean) {
            (Some(r), None) => TransformTarget::PinnedR(r),
            (None, Some(sm)) => TransformTarget::PinnedMean(sm),
            _ => {
                return Err(EngineError::invalid(
                    "transform target must set exactly one of r/mean",
                ));
            }
        };
        match (&self.curve, self.mean_sensitivity) {
            (Some(points), _) => {
                AmplitudeTransform::from_curve(points, target, self.symmetric)
            }
            (None, Some(m)) => AmplitudeTransform::from_sensitivity(m, target, self.symmetric),
            (None, None) => AmplitudeTransform::from_sensitivity(
                crate::consts::DEFAULT_MEAN_SENSITIVITY,
                target,
                self.symmetric,
            ),
        }
    }
}

/// Turning-point store section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurningPointsConfig {
    /// Initial capacity reserve.
    pub capacity: usize,
    /// Refuse growth past `capacity`.
    #[serde(default)]
    pub locked: bool,
    /// Prune down to this size when the threshold is exceeded.
    pub autoprune_size: Option<usize>,
    /// Length that triggers pruning.
    pub autoprune_threshold: Option<usize>,
    /// Keep original stream positions when pruning.
    #[serde(default)]
    pub preserve_positions: bool,
    /// Keep residue-referenced points when pruning.
    #[serde(default)]
    pub preserve_residue: bool,
}

/// Damage-history section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DamageHistoryConfig {
    /// Initial capacity reserve.
    pub capacity: usize,
    /// Refuse growth past `capacity`.
    #[serde(default)]
    pub locked: bool,
}

// ─── Engine Config ──────────────────────────────────────────────────

/// Complete engine configuration, TOML-loadable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Load-class quantizer parameters.
    pub class: ClassSection,
    /// Hysteresis band of the peak–valley filter (≥ 0).
    pub hysteresis: f64,
    /// Algorithm selection.
    pub counting: CountingConfig,
    /// Accumulator selection.
    pub counts: CountsConfig,
    /// Wöhler curve (required when damage is counted).
    pub wohler: Option<WohlerConfig>,
    /// Mean-stress amplitude transform.
    pub transform: Option<TransformConfig>,
    /// Turning-point store.
    pub turning_points: Option<TurningPointsConfig>,
    /// Per-sample damage history.
    pub damage_history: Option<DamageHistoryConfig>,
}

/// TOML shape of [`ClassParams`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassSection {
    /// Number of classes (0 disables quantization).
    pub count: u16,
    /// Class width.
    pub width: f64,
    /// Lower bound of class 0.
    pub offset: f64,
}

impl Default for ClassSection {
    fn default() -> Self {
        Self {
            count: 0,
            width: 1.0,
            offset: 0.0,
        }
    }
}

impl ClassSection {
    /// Build validated class parameters.
    pub fn to_params(&self) -> Result<ClassParams, EngineError> {
        ClassParams::new(self.count, self.width, self.offset)
    }
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!("loading engine config from {}", path.display());
        let toml_str = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&toml_str)
    }

    /// Run all validation rules.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.class.to_params()?;
        if !(self.hysteresis >= 0.0) || !self.hysteresis.is_finite() {
            return Err(EngineError::invalid(format!(
                "hysteresis {} must be finite and ≥ 0",
                self.hysteresis
            )));
        }
        if !self.counting.spread_method.is_supported() {
            return Err(EngineError::unsupported(format!(
                "spread method {:?} is reserved",
                self.counting.spread_method
            )));
        }
        if let Some(wl) = &self.wohler {
            wl.to_params()?;
        } else if self.counts.damage && self.class.count > 0 {
            return Err(EngineError::invalid(
                "damage counting requires a [wohler] section",
            ));
        }
        if let Some(at) = &self.transform {
            at.to_transform()?;
        }
        if let Some(tp) = &self.turning_points {
            match (tp.autoprune_size, tp.autoprune_threshold) {
                (Some(size), Some(threshold)) if size > threshold => {
                    return Err(EngineError::invalid(format!(
                        "autoprune size {size} exceeds threshold {threshold}"
                    )));
                }
                (Some(_), None) | (None, Some(_)) => {
                    return Err(EngineError::invalid(
                        "autoprune needs both size and threshold",
                    ));
                }
                _ => {}
            }
        }
        if self.counts.damage_history && self.damage_history.is_none() {
            return Err(EngineError::invalid(
                "damage-history counting requires a [damage_history] section",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"
        hysteresis = 1.0

        [class]
        count = 6
        width = 1.0
        offset = 0.0

        [counting]
        method = "four-point"
        residual_method = "none"
        spread_method = "none"
        rp_damage_method = "default"

        [counts]
        rfm = true
        damage = true

        [wohler]
        form = "original"
        sd = 1000.0
        nd = 1e7
        k = -5.0

        [transform]
        mean_sensitivity = 0.3
        r = -1.0

        [turning_points]
        capacity = 128
        autoprune_size = 64
        autoprune_threshold = 96
    "#;

    #[test]
    fn full_document_parses_and_validates() {
        let cfg = EngineConfig::from_toml_str(FULL).unwrap();
        assert_eq!(cfg.class.count, 6);
        assert_eq!(cfg.counting.method, CountingMethod::FourPoint);
        let flags = cfg.counts.to_flags();
        assert!(flags.contains(CountFlags::RFM | CountFlags::DAMAGE));
        let wl = cfg.wohler.unwrap().to_params().unwrap();
        assert_eq!(wl.sd, 1000.0);
        assert_eq!(wl.sx, 1000.0);
        cfg.transform.unwrap().to_transform().unwrap();
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let cfg = EngineConfig::load(file.path()).unwrap();
        assert_eq!(cfg.class.count, 6);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn unknown_field_is_parse_error() {
        let err = EngineConfig::from_toml_str("frobnicate = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn damage_without_wohler_is_rejected() {
        let doc = r#"
            [class]
            count = 6
            width = 1.0

            [counts]
            damage = true
        "#;
        let err = EngineConfig::from_toml_str(doc).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn reserved_spread_method_is_rejected() {
        let doc = r#"
            [counting]
            spread_method = "transient23"
        "#;
        assert!(EngineConfig::from_toml_str(doc).is_err());
    }

    #[test]
    fn transform_needs_exactly_one_target() {
        let doc = r#"
            [transform]
            mean_sensitivity = 0.3
            r = -1.0
            mean = 0.0
        "#;
        assert!(EngineConfig::from_toml_str(doc).is_err());
    }

    #[test]
    fn autoprune_size_above_threshold_is_rejected() {
        let doc = r#"
            [turning_points]
            capacity = 10
            autoprune_size = 20
            autoprune_threshold = 10
        "#;
        assert!(EngineConfig::from_toml_str(doc).is_err());
    }

    #[test]
    fn negative_hysteresis_is_rejected() {
        assert!(EngineConfig::from_toml_str("hysteresis = -0.5").is_err());
    }
}
