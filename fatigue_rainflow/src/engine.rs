//! Context lifecycle and the streaming counting loop.
//!
//! A [`RainflowEngine`] owns every buffer it works on: residue,
//! histograms, damage LUT, turning-point store, damage history, and
//! the HCM stack. All operations run synchronously on the caller's
//! thread; independent engines may live on different threads without
//! shared state.
//!
//! Entry points validate the context state and their arguments. The
//! first violation latches the error and moves the context to
//! `Error`; only `deinit` (or dropping the engine) leaves that state.

use fatigue::class::ClassParams;
use fatigue::config::EngineConfig;
use fatigue::consts::FULL_CYCLE_INC;
use fatigue::error::EngineError;
use fatigue::flags::CountFlags;
use fatigue::haigh::AmplitudeTransform;
use fatigue::methods::{CountingMethod, RpDamageMethod, SpreadMethod};
use fatigue::wohler::WohlerParams;
use tracing::{debug, trace, warn};

use crate::counting::four_point;
use crate::counting::hcm::HcmCounter;
use crate::delegate::Capabilities;
use crate::histogram::Histograms;
use crate::hysteresis::PeakValleyFilter;
use crate::lut::DamageLut;
use crate::residue::Residue;
use crate::turning_points::{AutopruneConfig, DamageHistory, TurningPointStore};
use crate::types::{ContextState, Sample, TurningPoint};

/// Fatigue-strength depression state (Miner consequent).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConsequentState {
    /// Accumulated consequent damage.
    pub d_con: f64,
    /// Unimpaired parameters as configured.
    pub base: WohlerParams,
    /// Currently depressed shadow parameters.
    pub impaired: WohlerParams,
}

impl ConsequentState {
    pub(crate) fn new(base: WohlerParams) -> Self {
        Self {
            d_con: 0.0,
            base,
            impaired: base,
        }
    }

    /// Account one chunk of damage and depress the parameters.
    ///
    /// The knee moves down by `(1 − D)^(1/q)` and stays on the
    /// unimpaired slope-`k` line; the endurance amplitude scales with
    /// the same factor.
    pub(crate) fn account(&mut self, damage: f64) {
        if damage <= 0.0 {
            return;
        }
        self.d_con += damage;
        if self.d_con < 1.0 {
            let factor = (1.0 - self.d_con).powf(1.0 / self.base.q);
            self.impaired.sx = self.base.sx * factor;
            self.impaired.nx = self.base.nx * factor.powf(self.base.k);
            self.impaired.sd = self.base.sd * factor;
        } else {
            // Past failure every amplitude damages.
            self.impaired.sd = 0.0;
            self.impaired.omission = 0.0;
        }
    }
}

/// Streaming rainflow counting context.
#[derive(Debug, Default)]
pub struct RainflowEngine {
    pub(crate) state: ContextState,
    pub(crate) error: Option<EngineError>,
    pub(crate) class: ClassParams,
    pub(crate) hysteresis: f64,
    pub(crate) flags: CountFlags,
    pub(crate) counting_method: CountingMethod,
    pub(crate) spread_method: SpreadMethod,
    pub(crate) rp_damage_method: RpDamageMethod,
    pub(crate) wohler: Option<WohlerParams>,
    pub(crate) transform: Option<AmplitudeTransform>,
    pub(crate) filter: PeakValleyFilter,
    pub(crate) residue: Residue,
    pub(crate) hcm: HcmCounter,
    pub(crate) lut: DamageLut,
    pub(crate) hist: Histograms,
    pub(crate) damage: f64,
    pub(crate) consequent: Option<ConsequentState>,
    pub(crate) tp: Option<TurningPointStore>,
    pub(crate) dh: Option<DamageHistory>,
    pub(crate) caps: Capabilities,
    /// Absolute stream length: samples fed minus prune shifts.
    pub(crate) stream_len: u64,
    pub(crate) last_sample: Option<Sample>,
    /// True while the repeated-residue finalizer re-feeds points.
    pub(crate) in_repeat: bool,
}

impl RainflowEngine {
    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Configured engine; shorthand for `default()` + [`Self::init`].
    pub fn new(
        class_count: u16,
        class_width: f64,
        class_offset: f64,
        hysteresis: f64,
        flags: CountFlags,
    ) -> Result<Self, EngineError> {
        let mut engine = Self::default();
        engine.init(class_count, class_width, class_offset, hysteresis, flags)?;
        Ok(engine)
    }

    /// Configure an unconfigured context.
    pub fn init(
        &mut self,
        class_count: u16,
        class_width: f64,
        class_offset: f64,
        hysteresis: f64,
        flags: CountFlags,
    ) -> Result<(), EngineError> {
        if self.state != ContextState::Init0 {
            return Err(self.fail(EngineError::State {
                operation: "init",
                state: self.state.name(),
            }));
        }
        let class = match ClassParams::new(class_count, class_width, class_offset) {
            Ok(c) => c,
            Err(e) => return Err(self.fail(e)),
        };
        if !(hysteresis >= 0.0) || !hysteresis.is_finite() {
            return Err(self.fail(EngineError::invalid(format!(
                "hysteresis {hysteresis} must be finite and ≥ 0"
            ))));
        }
        self.class = class;
        self.hysteresis = hysteresis;
        self.flags = flags;
        self.filter = PeakValleyFilter::new(hysteresis, self.slope_eps());
        self.residue = Residue::for_classes(class_count);
        self.hist = Histograms::new(class_count as usize, flags);
        self.state = ContextState::Init;
        debug!(
            classes = class_count,
            hysteresis, "rainflow context configured"
        );
        Ok(())
    }

    /// Build a fully configured engine from a validated TOML config.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let class = config.class.to_params()?;
        let mut engine = Self::new(
            class.count,
            class.width,
            class.offset,
            config.hysteresis,
            config.counts.to_flags(),
        )?;
        engine.counting_method = config.counting.method;
        engine.rp_damage_method = config.counting.rp_damage_method;
        engine.spread_method = config.counting.spread_method;
        if let Some(wl) = &config.wohler {
            engine.wl_init_any(wl.to_params()?)?;
        }
        if let Some(at) = &config.transform {
            engine.at_init(at.to_transform()?)?;
        }
        if let Some(tp) = &config.turning_points {
            engine.tp_init(tp.capacity, tp.locked)?;
            let mut flags = engine.flags;
            flags.set(CountFlags::TP_PRUNE_PRESERVE_POS, tp.preserve_positions);
            flags.set(CountFlags::TP_PRUNE_PRESERVE_RES, tp.preserve_residue);
            engine.flags = flags;
            if let (Some(size), Some(threshold)) = (tp.autoprune_size, tp.autoprune_threshold) {
                engine.tp_init_autoprune(true, size, threshold)?;
            }
        }
        if let Some(dh) = &config.damage_history {
            engine.dh_init(config.counting.spread_method, dh.capacity, dh.locked)?;
        }
        Ok(engine)
    }

    /// Release every owned buffer and return to the unconfigured state.
    pub fn deinit(&mut self) {
        debug!("rainflow context de-initialized");
        *self = Self::default();
    }

    /// Zero all counts, damage, and depression state; residue, turning
    /// points, and lifecycle state stay.
    pub fn clear_counts(&mut self) -> Result<(), EngineError> {
        self.guard_configured("clear_counts")?;
        self.hist.clear();
        self.damage = 0.0;
        if let Some(con) = self.consequent.as_mut() {
            *con = ConsequentState::new(con.base);
        }
        if let Some(tp) = self.tp.as_mut() {
            tp.clear_damage();
        }
        if let Some(dh) = self.dh.as_mut() {
            dh.clear_values();
        }
        Ok(())
    }

    // ─── State & error plumbing ─────────────────────────────────────

    /// Current lifecycle state.
    pub const fn state(&self) -> ContextState {
        self.state
    }

    /// The latched error, if the context faulted.
    pub fn last_error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    pub(crate) fn fail(&mut self, e: EngineError) -> EngineError {
        warn!(error = %e, "rainflow context faulted");
        self.state = ContextState::Error;
        self.error = Some(e.clone());
        e
    }

    pub(crate) fn guard_configured(&mut self, operation: &'static str) -> Result<(), EngineError> {
        if self.state == ContextState::Error {
            return Err(self.error.clone().unwrap_or(EngineError::State {
                operation,
                state: "ERROR",
            }));
        }
        if !self.state.is_configured() {
            return Err(self.fail(EngineError::State {
                operation,
                state: self.state.name(),
            }));
        }
        Ok(())
    }

    fn guard_feed(&mut self, operation: &'static str) -> Result<(), EngineError> {
        self.guard_configured(operation)?;
        if !self.state.accepts_feed() {
            return Err(self.fail(EngineError::State {
                operation,
                state: self.state.name(),
            }));
        }
        Ok(())
    }

    fn guard_init_state(&mut self, operation: &'static str) -> Result<(), EngineError> {
        self.guard_configured(operation)?;
        if self.state != ContextState::Init {
            return Err(self.fail(EngineError::State {
                operation,
                state: self.state.name(),
            }));
        }
        Ok(())
    }

    /// Slope tolerance: class width / 100, or exact comparison when
    /// quantization is disabled.
    pub(crate) fn slope_eps(&self) -> f64 {
        if self.class.enabled() {
            self.class.epsilon()
        } else {
            0.0
        }
    }

    // ─── Configuration surface ──────────────────────────────────────

    /// Active count flags.
    pub const fn flags(&self) -> CountFlags {
        self.flags
    }

    /// Replace the count flags; newly enabled histograms are allocated
    /// zeroed.
    pub fn set_flags(&mut self, flags: CountFlags) -> Result<(), EngineError> {
        self.guard_configured("set_flags")?;
        self.hist.ensure(flags);
        self.flags = flags;
        Ok(())
    }

    /// The configured counting method.
    pub const fn counting_method(&self) -> CountingMethod {
        self.counting_method
    }

    /// Select the cycle-closure algorithm (before feeding).
    pub fn set_counting_method(&mut self, method: CountingMethod) -> Result<(), EngineError> {
        self.guard_init_state("set_counting_method")?;
        self.counting_method = method;
        Ok(())
    }

    /// Select the range-pair damage treatment (before feeding).
    pub fn set_rp_damage_method(&mut self, method: RpDamageMethod) -> Result<(), EngineError> {
        self.guard_init_state("set_rp_damage_method")?;
        self.rp_damage_method = method;
        if method == RpDamageMethod::Consequent {
            self.consequent = self.wohler.map(ConsequentState::new);
        } else {
            self.consequent = None;
        }
        Ok(())
    }

    /// Install capability overrides.
    pub fn set_capabilities(&mut self, caps: Capabilities) -> Result<(), EngineError> {
        self.guard_init_state("set_capabilities")?;
        self.caps = caps;
        self.lut.invalidate();
        Ok(())
    }

    /// Class parameters.
    pub const fn class_params(&self) -> ClassParams {
        self.class
    }

    /// Replace the class parameters (before feeding). Histograms and
    /// the LUT are re-sized.
    pub fn set_class_params(&mut self, params: ClassParams) -> Result<(), EngineError> {
        self.guard_init_state("set_class_params")?;
        if let Err(e) = params.validate() {
            return Err(self.fail(e));
        }
        self.class = params;
        self.filter = PeakValleyFilter::new(self.hysteresis, self.slope_eps());
        self.residue = Residue::for_classes(params.count);
        self.hist = Histograms::new(params.count as usize, self.flags);
        self.lut.invalidate();
        Ok(())
    }

    /// Class index of `v` (unclipped).
    pub fn class_number(&self, v: f64) -> i64 {
        self.class.index(v)
    }

    /// Upper bound of class `c`.
    pub fn class_upper(&self, c: u16) -> f64 {
        self.class.upper(c)
    }

    /// Mid value of class `c`.
    pub fn class_mean(&self, c: u16) -> f64 {
        self.class.mean(c)
    }

    // ─── Wöhler surface ─────────────────────────────────────────────

    /// Install a Miner-elementary curve.
    pub fn wl_init_elementary(&mut self, sx: f64, nx: f64, k: f64) -> Result<(), EngineError> {
        let params = WohlerParams::elementary(sx, nx, k).map_err(|e| self.fail(e))?;
        self.wl_init_any(params)
    }

    /// Install a Miner-original curve.
    pub fn wl_init_original(&mut self, sd: f64, nd: f64, k: f64) -> Result<(), EngineError> {
        let params = WohlerParams::original(sd, nd, k).map_err(|e| self.fail(e))?;
        self.wl_init_any(params)
    }

    /// Install a Miner-modified curve.
    pub fn wl_init_modified(
        &mut self,
        sx: f64,
        nx: f64,
        k: f64,
        k2: f64,
    ) -> Result<(), EngineError> {
        let params = WohlerParams::modified(sx, nx, k, k2).map_err(|e| self.fail(e))?;
        self.wl_init_any(params)
    }

    /// Install fully specified Wöhler parameters.
    pub fn wl_init_any(&mut self, params: WohlerParams) -> Result<(), EngineError> {
        self.guard_init_state("wl_init")?;
        if let Err(e) = params.validate() {
            return Err(self.fail(e));
        }
        self.wohler = Some(params);
        if self.rp_damage_method == RpDamageMethod::Consequent {
            self.consequent = Some(ConsequentState::new(params));
        }
        self.lut.invalidate();
        Ok(())
    }

    /// The installed Wöhler parameters.
    pub const fn wl_params(&self) -> Option<WohlerParams> {
        self.wohler
    }

    /// Replace the Wöhler parameters (before feeding).
    pub fn set_wl_params(&mut self, params: WohlerParams) -> Result<(), EngineError> {
        self.wl_init_any(params)
    }

    /// Amplitude with `n` cycles to failure on the installed curve.
    pub fn wl_calc_sa(&mut self, n: f64) -> Result<f64, EngineError> {
        let wl = self.require_wohler("wl_calc_sa")?;
        wl.sa_at(n).map_err(|e| self.fail(e))
    }

    /// Cycles to failure at amplitude `sa` on the installed curve.
    pub fn wl_calc_n(&mut self, sa: f64) -> Result<f64, EngineError> {
        let wl = self.require_wohler("wl_calc_n")?;
        wl.n_at(sa).map_err(|e| self.fail(e))
    }

    /// Endurance amplitude at `nd` cycles on the installed curve.
    pub fn wl_calc_sd(&mut self, nd: f64) -> Result<f64, EngineError> {
        let wl = self.require_wohler("wl_calc_sd")?;
        wl.calc_sd(nd).map_err(|e| self.fail(e))
    }

    /// Secondary slope through the installed knee and `(sd, nd)`.
    pub fn wl_calc_k2(&mut self, sd: f64, nd: f64) -> Result<f64, EngineError> {
        let wl = self.require_wohler("wl_calc_k2")?;
        WohlerParams::calc_k2(wl.sx, wl.nx, sd, nd).map_err(|e| self.fail(e))
    }

    fn require_wohler(&mut self, operation: &'static str) -> Result<WohlerParams, EngineError> {
        self.guard_configured(operation)?;
        match self.wohler {
            Some(wl) => Ok(wl),
            None => Err(self.fail(EngineError::invalid("no Wöhler curve installed"))),
        }
    }

    // ─── Amplitude transform surface ────────────────────────────────

    /// Install the mean-stress amplitude transform.
    pub fn at_init(&mut self, transform: AmplitudeTransform) -> Result<(), EngineError> {
        self.guard_init_state("at_init")?;
        self.transform = Some(transform);
        self.lut.invalidate();
        Ok(())
    }

    /// Transform an amplitude/mean pair to the rig condition.
    pub fn at_transform(&mut self, sa: f64, sm: f64) -> Result<f64, EngineError> {
        self.guard_configured("at_transform")?;
        match self.transform_amplitude(sa, sm) {
            Ok(v) => Ok(v),
            Err(e) => Err(self.fail(e)),
        }
    }

    pub(crate) fn transform_amplitude(&self, sa: f64, sm: f64) -> Result<f64, EngineError> {
        if let Some(hook) = &self.caps.at_transform {
            return hook(sa, sm);
        }
        match &self.transform {
            Some(at) => at.transform(sa, sm),
            None => Ok(sa),
        }
    }

    // ─── Turning points & damage history ────────────────────────────

    /// Attach the turning-point store (before feeding).
    pub fn tp_init(&mut self, capacity: usize, locked: bool) -> Result<(), EngineError> {
        self.guard_init_state("tp_init")?;
        self.tp = Some(TurningPointStore::new(capacity, locked));
        Ok(())
    }

    /// Configure auto-pruning of the turning-point store.
    pub fn tp_init_autoprune(
        &mut self,
        enabled: bool,
        size: usize,
        threshold: usize,
    ) -> Result<(), EngineError> {
        self.guard_init_state("tp_init_autoprune")?;
        let Some(store) = self.tp.as_mut() else {
            return Err(self.fail(EngineError::TurningPoint {
                reason: "autoprune without an attached store".into(),
            }));
        };
        let config = enabled.then_some(AutopruneConfig { size, threshold });
        if let Err(e) = store.set_autoprune(config) {
            return Err(self.fail(e));
        }
        self.flags.set(CountFlags::TP_AUTOPRUNE, enabled);
        Ok(())
    }

    /// Stored turning points, oldest first.
    pub fn tp(&self) -> Option<&[TurningPoint]> {
        self.tp.as_ref().map(|s| s.as_slice())
    }

    /// Look up a stored turning point by its 1-based `tp_pos`.
    pub fn tp_get(&self, tp_pos: u64) -> Option<TurningPoint> {
        let store = self.tp.as_ref()?;
        if let Some(hook) = &self.caps.tp_get {
            return hook(store, tp_pos);
        }
        store.get(tp_pos).copied()
    }

    /// Drop all stored turning points and clear residue back-references.
    pub fn tp_clear(&mut self) -> Result<(), EngineError> {
        self.guard_configured("tp_clear")?;
        if let Some(store) = self.tp.as_mut() {
            store.clear();
        }
        for entry in self.residue.as_mut_slice() {
            entry.tp_pos = 0;
        }
        Ok(())
    }

    /// Prune the turning-point store down to `limit` entries.
    ///
    /// `flags` override the context's `TP_PRUNE_PRESERVE_*` selection.
    pub fn tp_prune(&mut self, limit: usize, flags: CountFlags) -> Result<(), EngineError> {
        self.guard_configured("tp_prune")?;
        let preserve_pos = flags.contains(CountFlags::TP_PRUNE_PRESERVE_POS);
        let preserve_res = flags.contains(CountFlags::TP_PRUNE_PRESERVE_RES);
        match self.prune_turning_points(limit, preserve_pos, preserve_res) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Attach the per-sample damage history and select the spread
    /// method.
    pub fn dh_init(
        &mut self,
        method: SpreadMethod,
        capacity: usize,
        locked: bool,
    ) -> Result<(), EngineError> {
        self.guard_init_state("dh_init")?;
        if !method.is_supported() {
            return Err(self.fail(EngineError::unsupported(format!(
                "spread method {method:?} is reserved"
            ))));
        }
        self.spread_method = method;
        self.dh = Some(DamageHistory::new(capacity, locked));
        self.flags |= CountFlags::DH;
        Ok(())
    }

    /// Per-sample damage history values.
    pub fn dh(&self) -> Option<&[f64]> {
        self.dh.as_ref().map(|d| d.as_slice())
    }

    // ─── Feeding ────────────────────────────────────────────────────

    /// Feed a chunk of raw samples.
    pub fn feed(&mut self, values: &[f64]) -> Result<(), EngineError> {
        self.guard_feed("feed")?;
        for &v in values {
            match self.feed_value(v, 1.0) {
                Ok(()) => {}
                Err(e) => return Err(self.fail(e)),
            }
        }
        Ok(())
    }

    /// Feed a chunk of raw samples scaled by `factor`.
    pub fn feed_scaled(&mut self, values: &[f64], factor: f64) -> Result<(), EngineError> {
        self.guard_feed("feed_scaled")?;
        if !factor.is_finite() {
            return Err(self.fail(EngineError::invalid(format!(
                "scale factor {factor} must be finite"
            ))));
        }
        for &v in values {
            match self.feed_value(v, factor) {
                Ok(()) => {}
                Err(e) => return Err(self.fail(e)),
            }
        }
        Ok(())
    }

    /// Feed pre-quantized sample tuples.
    ///
    /// Tuples with `pos = 0` get positions assigned; `tp_pos` on input
    /// is ignored.
    pub fn feed_tuple(&mut self, tuples: &[Sample]) -> Result<(), EngineError> {
        self.guard_feed("feed_tuple")?;
        for t in tuples {
            if !t.value.is_finite() {
                warn!(pos = t.pos, "skipping non-finite sample");
                self.stream_len += 1;
                continue;
            }
            if self.class.enabled() && t.class >= self.class.count {
                return Err(self.fail(EngineError::invalid(format!(
                    "tuple class {} outside [0, {})",
                    t.class, self.class.count
                ))));
            }
            let mut t = *t;
            t.tp_pos = 0;
            self.stream_len += 1;
            if t.pos == 0 {
                t.pos = self.stream_len;
            } else {
                self.stream_len = self.stream_len.max(t.pos);
            }
            match self.feed_sample(t) {
                Ok(()) => {}
                Err(e) => return Err(self.fail(e)),
            }
        }
        Ok(())
    }

    fn feed_value(&mut self, v: f64, factor: f64) -> Result<(), EngineError> {
        let v = v * factor;
        if !v.is_finite() {
            warn!(pos = self.stream_len + 1, "skipping non-finite sample");
            self.stream_len += 1;
            return Ok(());
        }
        self.stream_len += 1;
        let class = if self.class.enabled() {
            let idx = self.class.index(v);
            if idx < 0 || idx >= self.class.count as i64 {
                return Err(EngineError::invalid(format!(
                    "sample {v} at position {} outside class range",
                    self.stream_len
                )));
            }
            idx as u16
        } else {
            0
        };
        let sample = Sample {
            value: v,
            class,
            pos: self.stream_len,
            tp_pos: 0,
        };
        self.feed_sample(sample)
    }

    fn feed_sample(&mut self, sample: Sample) -> Result<(), EngineError> {
        if self.flags.contains(CountFlags::DH) {
            if let Some(dh) = self.dh.as_mut() {
                dh.ensure_pos(sample.pos)?;
            }
        }
        // First-sample margin: record the stream edge in the store.
        if self.flags.contains(CountFlags::ENFORCE_MARGIN)
            && self.last_sample.is_none()
            && self.tp.is_some()
        {
            self.tp_add(sample)?;
        }
        self.last_sample = Some(sample);

        let confirmed = self.filter.apply(sample);
        self.state = if self.filter.has_interim() {
            ContextState::BusyInterim
        } else {
            ContextState::Busy
        };
        if let Some(t) = confirmed {
            self.confirm_turning_point(t)?;
        }
        Ok(())
    }

    /// A turning point left the filter: store it, append it to the
    /// residue, and let the cycle finder run.
    pub(crate) fn confirm_turning_point(&mut self, t: Sample) -> Result<(), EngineError> {
        let mut t = t;
        if let Some(hook) = self.caps.next_tp.as_mut() {
            if !hook(&mut t) {
                trace!(pos = t.pos, "turning point dropped by next_tp capability");
                return Ok(());
            }
        }
        if !self.in_repeat && self.tp.is_some() {
            t.tp_pos = self.tp_add(t)?;
        }
        trace!(value = t.value, class = t.class, pos = t.pos, "turning point");
        self.residue.push(t);
        self.run_finder()
    }

    pub(crate) fn tp_add(&mut self, s: Sample) -> Result<u64, EngineError> {
        // The stream edge recorded by the margin flag may re-arrive as
        // a regular turning point; reuse its slot.
        if let Some(store) = self.tp.as_ref() {
            if let Some(last) = store.as_slice().last() {
                if last.sample.pos == s.pos {
                    return Ok(store.len() as u64);
                }
            }
        }
        let assigned = if let Some(hook) = self.caps.tp_add.as_mut() {
            match self.tp.as_mut() {
                Some(store) => hook(store, s)?,
                None => return Ok(0),
            }
        } else {
            match self.tp.as_mut() {
                Some(store) => store.push(s)?,
                None => return Ok(0),
            }
        };
        if self.flags.contains(CountFlags::TP_AUTOPRUNE) {
            let due = self
                .tp
                .as_ref()
                .is_some_and(TurningPointStore::over_threshold);
            if due {
                let size = self
                    .tp
                    .as_ref()
                    .and_then(|st| st.autoprune())
                    .map(|c| c.size)
                    .unwrap_or(0);
                self.prune_turning_points(
                    size,
                    self.flags.contains(CountFlags::TP_PRUNE_PRESERVE_POS),
                    self.flags.contains(CountFlags::TP_PRUNE_PRESERVE_RES),
                )?;
                // The fresh point sits at the store tail after pruning.
                return Ok(self.tp.as_ref().map(|st| st.len() as u64).unwrap_or(0));
            }
        }
        Ok(assigned)
    }

    pub(crate) fn run_finder(&mut self) -> Result<(), EngineError> {
        match self.counting_method {
            CountingMethod::None => Ok(()),
            CountingMethod::FourPoint => {
                while four_point::tail_closes(self.residue.as_slice()) {
                    let slice = self.residue.as_slice();
                    let next = slice[slice.len() - 1];
                    let Some((from, to)) = self.residue.remove_inner_tail_pair() else {
                        break;
                    };
                    self.process_cycle(from, to, next, FULL_CYCLE_INC)?;
                }
                Ok(())
            }
            CountingMethod::Hcm => {
                let eps = self.slope_eps();
                while let Some(k) = self.residue.pop_front() {
                    let mut closed = Vec::new();
                    self.hcm.feed(k, eps, &mut |i, j, kk| {
                        closed.push((i, j, kk));
                        Ok(())
                    })?;
                    for (i, j, kk) in closed {
                        self.process_cycle(i, j, kk, FULL_CYCLE_INC)?;
                    }
                }
                Ok(())
            }
            CountingMethod::Delegated => {
                let Some(hook) = self.caps.cycle_find.as_mut() else {
                    return Err(EngineError::unsupported(
                        "counting method delegated without cycle_find capability",
                    ));
                };
                let cycles = hook(&mut self.residue)?;
                for c in cycles {
                    self.process_cycle(c.from, c.to, c.next, FULL_CYCLE_INC)?;
                }
                Ok(())
            }
        }
    }

    // ─── Cycle accounting ───────────────────────────────────────────

    /// Account one closed (or weighted residual) cycle.
    pub(crate) fn process_cycle(
        &mut self,
        from: Sample,
        to: Sample,
        next: Sample,
        inc: u64,
    ) -> Result<(), EngineError> {
        if !self.class.enabled() {
            return Ok(());
        }
        let (cf, ct) = (from.class, to.class);
        if cf == ct {
            return Ok(());
        }
        trace!(from = cf, to = ct, inc, "cycle");
        if self.flags.contains(CountFlags::RFM) {
            self.hist.bump_rfm(cf, ct, inc)?;
        }
        if self.flags.contains(CountFlags::RP) {
            self.hist.bump_rp(cf.abs_diff(ct), inc)?;
        }
        if self.flags.counts_level_crossings() {
            let rising = ct > cf;
            let enabled = if rising {
                self.flags.contains(CountFlags::LC_UP)
            } else {
                self.flags.contains(CountFlags::LC_DN)
            };
            if enabled {
                for level in cf.min(ct)..cf.max(ct) {
                    self.hist.bump_lc(level, FULL_CYCLE_INC)?;
                }
            }
        }
        if self.flags.contains(CountFlags::DAMAGE) && self.wohler.is_some() {
            let (d, sa) = self.damage_for_pair(cf, ct)?;
            let contrib = d * inc as f64 / FULL_CYCLE_INC as f64;
            self.damage += contrib;
            if let Some(con) = self.consequent.as_mut() {
                // Damage against the depressed curve; amplitudes the
                // pristine endurance would swallow still count here.
                let d_con = con.impaired.damage(sa)?;
                con.account(d_con * inc as f64 / FULL_CYCLE_INC as f64);
            }
            if self.spread_method != SpreadMethod::None && contrib > 0.0 {
                self.spread_cycle(from, to, next, contrib)?;
            }
        }
        Ok(())
    }

    /// Damage and effective amplitude for a class pair, via the LUT
    /// when it is apt.
    pub(crate) fn damage_for_pair(&mut self, cf: u16, ct: u16) -> Result<(f64, f64), EngineError> {
        if let Some(hit) = self.lut.lookup(cf, ct) {
            return Ok(hit);
        }
        if !self.lut.is_valid()
            && !self.lut.is_suspended()
            && self.wohler.is_some()
            && self.class.enabled()
        {
            self.fill_lut()?;
            if let Some(hit) = self.lut.lookup(cf, ct) {
                return Ok(hit);
            }
        }
        self.pair_damage_direct(cf, ct)
    }

    fn fill_lut(&mut self) -> Result<(), EngineError> {
        let n = self.class.count as usize;
        let mut lut = std::mem::take(&mut self.lut);
        let result = lut.fill(n, |f, t| self.pair_damage_direct(f, t));
        self.lut = lut;
        match result {
            Ok(()) => {
                debug!(classes = n, "damage LUT rebuilt");
                Ok(())
            }
            Err(e) => {
                self.lut.invalidate();
                Err(e)
            }
        }
    }

    /// Direct (non-LUT) damage computation for a class pair.
    fn pair_damage_direct(&self, cf: u16, ct: u16) -> Result<(f64, f64), EngineError> {
        let Some(wl) = self.wohler else {
            return Ok((0.0, 0.0));
        };
        if cf == ct {
            return Ok((0.0, 0.0));
        }
        let (mf, mt) = (self.class.mean(cf), self.class.mean(ct));
        let sa = (mf - mt).abs() / 2.0;
        let sm = (mf + mt) / 2.0;
        let sa_eff = self.transform_amplitude(sa, sm)?;
        let d = match &self.caps.damage {
            Some(hook) => hook(&wl, sa_eff)?,
            None => wl.damage(sa_eff)?,
        };
        Ok((d, sa_eff))
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Cumulative damage.
    pub const fn damage(&self) -> f64 {
        self.damage
    }

    /// Accumulated Miner-consequent damage (0 unless configured).
    pub fn damage_con(&self) -> f64 {
        self.consequent.map(|c| c.d_con).unwrap_or(0.0)
    }

    /// The unclosed turning points, oldest first.
    ///
    /// With the HCM method the unclosed points live on the HCM stack
    /// until finalization.
    pub fn residue(&self) -> &[Sample] {
        if self.counting_method == CountingMethod::Hcm && self.residue.is_empty() {
            self.hcm.stack()
        } else {
            self.residue.as_slice()
        }
    }

    /// Absolute stream length fed so far.
    pub const fn stream_len(&self) -> u64 {
        self.stream_len
    }

    // ─── Pruning mechanics ──────────────────────────────────────────

    /// Drop turning points from the store head down to `keep` entries.
    pub(crate) fn prune_turning_points(
        &mut self,
        keep: usize,
        preserve_pos: bool,
        preserve_res: bool,
    ) -> Result<(), EngineError> {
        let old_points = {
            let Some(store) = self.tp.as_mut() else {
                return Err(EngineError::TurningPoint {
                    reason: "prune without an attached store".into(),
                });
            };
            if store.len() <= keep {
                return Ok(());
            }
            std::mem::take(store.points_mut())
        };
        let len = old_points.len();
        let drop_n = len - keep;

        // 1-based old tp_pos → new tp_pos (0 = dropped).
        let mut remap = vec![0u64; len + 1];
        let mut retained: Vec<TurningPoint> = Vec::with_capacity(keep + 4);
        if preserve_res {
            let mut referenced: Vec<u64> = self
                .residue
                .as_slice()
                .iter()
                .map(|s| s.tp_pos)
                .filter(|&r| r >= 1 && (r as usize) <= drop_n)
                .collect();
            referenced.sort_unstable();
            referenced.dedup();
            for r in referenced {
                retained.push(old_points[r as usize - 1]);
                remap[r as usize] = retained.len() as u64;
            }
        }
        for (old_idx, point) in old_points.iter().enumerate().skip(drop_n) {
            retained.push(*point);
            remap[old_idx + 1] = retained.len() as u64;
        }
        for (i, tp) in retained.iter_mut().enumerate() {
            tp.sample.tp_pos = i as u64 + 1;
        }
        let dropped = len - retained.len();

        for entry in self.residue.as_mut_slice() {
            if entry.tp_pos > 0 {
                entry.tp_pos = remap.get(entry.tp_pos as usize).copied().unwrap_or(0);
            }
        }

        if !preserve_pos {
            let mut min_pos = u64::MAX;
            for tp in &retained {
                min_pos = min_pos.min(tp.sample.pos);
            }
            for entry in self.residue.as_slice() {
                min_pos = min_pos.min(entry.pos);
            }
            if let Some(p) = self.filter.min_live_pos() {
                min_pos = min_pos.min(p);
            }
            if min_pos != u64::MAX && min_pos > 1 {
                let delta = min_pos - 1;
                for tp in &mut retained {
                    tp.sample.pos -= delta;
                }
                for entry in self.residue.as_mut_slice() {
                    entry.pos -= delta;
                }
                self.filter.shift_positions(delta);
                self.stream_len = self.stream_len.saturating_sub(delta);
                if let Some(ls) = self.last_sample.as_mut() {
                    ls.pos = ls.pos.saturating_sub(delta).max(1);
                }
                if let Some(dh) = self.dh.as_mut() {
                    dh.drop_head(delta);
                }
            }
        }

        debug!(dropped, kept = retained.len(), "turning points pruned");
        if let Some(store) = self.tp.as_mut() {
            *store.points_mut() = retained;
        }
        Ok(())
    }
}
