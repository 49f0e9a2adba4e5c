//! End-to-end counting scenarios.
//!
//! Exercises the full pipeline — filter, finder, accumulators,
//! finalizers, spreading — through the public engine surface, with
//! literal streams small enough to trace by hand.

use fatigue::consts::{COUNT_LIMIT, FULL_CYCLE_INC, HALF_CYCLE_INC};
use fatigue::error::EngineError;
use fatigue::flags::CountFlags;
use fatigue::haigh::{AmplitudeTransform, TransformTarget};
use fatigue::methods::{CountingMethod, ResidualMethod, RpDamageMethod, SpreadMethod};
use fatigue::wohler::WohlerParams;
use fatigue_rainflow::delegate::Capabilities;
use fatigue_rainflow::types::CycleEvent;
use fatigue_rainflow::RainflowEngine;

/// Standard test context: 6 classes of width 1 starting at 0,
/// hysteresis 1, Miner-original curve (sd = 1000, nd = 1e7, k = −5).
fn engine6() -> RainflowEngine {
    // RUST_LOG=trace surfaces per-cycle events when a test misbehaves.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let mut e = RainflowEngine::new(6, 1.0, 0.0, 1.0, CountFlags::STANDARD).unwrap();
    e.wl_init_original(1000.0, 1e7, -5.0).unwrap();
    e
}

fn residue_values(e: &RainflowEngine) -> Vec<f64> {
    e.residue().iter().map(|s| s.value).collect()
}

// ─── Literal scenarios ──────────────────────────────────────────────

#[test]
fn empty_stream_counts_nothing() {
    let mut e = engine6();
    e.feed(&[]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert!(e.rfm_get().unwrap().iter().all(|&c| c == 0));
    assert!(e.residue().is_empty());
    assert_eq!(e.damage(), 0.0);
}

#[test]
fn constant_stream_has_no_turning_points() {
    let mut e = engine6();
    e.feed(&[2.0, 2.0, 2.0, 2.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert!(e.residue().is_empty());
    assert_eq!(e.rfm_sum().unwrap(), 0);
    assert_eq!(e.damage(), 0.0);
}

#[test]
fn monotone_rise_leaves_two_point_residue() {
    let mut e = engine6();
    e.feed(&[0.5, 5.5]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert_eq!(residue_values(&e), vec![0.5, 5.5]);
    assert_eq!(e.rfm_sum().unwrap(), 0);
    assert!(e.rp_get().unwrap().iter().all(|&c| c == 0));
}

#[test]
fn hanging_excursion_is_not_closed() {
    // The 5→1 excursion pokes above the outer 0→4 range, so the
    // four-point containment test keeps everything in the residue.
    let mut e = engine6();
    e.feed(&[0.0, 5.0, 1.0, 4.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert_eq!(residue_values(&e), vec![0.0, 5.0, 1.0, 4.0]);
    assert_eq!(e.rfm_sum().unwrap(), 0);
}

#[test]
fn contained_cycle_closes() {
    let mut e = engine6();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert_eq!(e.rfm_peek(5, 1).unwrap(), FULL_CYCLE_INC);
    assert_eq!(e.rfm_sum().unwrap(), FULL_CYCLE_INC);
    assert_eq!(residue_values(&e), vec![0.0, 5.0]);
    // Cycle amplitude from class means: |5.5 − 1.5| / 2 = 2, far
    // below the endurance amplitude.
    let wl = e.wl_params().unwrap();
    assert_eq!(e.damage(), wl.damage(2.0).unwrap());
    assert_eq!(e.damage(), 0.0);
    // Range pair |5 − 1| = 4.
    assert_eq!(e.rp_get().unwrap()[4], FULL_CYCLE_INC);
    // Falling cycle crosses the upper bounds of classes 1..4.
    let lc = e.lc_get().unwrap();
    assert_eq!(&lc[..], &[
        0,
        FULL_CYCLE_INC,
        FULL_CYCLE_INC,
        FULL_CYCLE_INC,
        FULL_CYCLE_INC,
        0
    ]);
}

#[test]
fn half_cycle_residue_weighting() {
    let mut e = engine6();
    e.feed(&[0.0, 5.0, 2.0, 4.0]).unwrap();
    e.finalize(ResidualMethod::HalfCycles).unwrap();
    assert_eq!(e.rfm_sum().unwrap(), 3 * HALF_CYCLE_INC);
    assert_eq!(e.rfm_peek(0, 5).unwrap(), HALF_CYCLE_INC);
    assert_eq!(e.rfm_peek(5, 2).unwrap(), HALF_CYCLE_INC);
    assert_eq!(e.rfm_peek(2, 4).unwrap(), HALF_CYCLE_INC);
    // The residue itself is reported unchanged.
    assert_eq!(residue_values(&e), vec![0.0, 5.0, 2.0, 4.0]);
}

#[test]
fn full_cycle_residue_weighting() {
    let mut e = engine6();
    e.feed(&[0.0, 5.0, 2.0, 4.0]).unwrap();
    e.finalize(ResidualMethod::FullCycles).unwrap();
    assert_eq!(e.rfm_sum().unwrap(), 3 * FULL_CYCLE_INC);
}

#[test]
fn discard_empties_the_residue() {
    let mut e = engine6();
    e.feed(&[0.0, 5.0, 2.0, 4.0]).unwrap();
    e.finalize(ResidualMethod::Discard).unwrap();
    assert!(e.residue().is_empty());
    assert_eq!(e.rfm_sum().unwrap(), 0);
}

#[test]
fn repeated_residue_matches_explicit_double_feed() {
    let series = [0.0, 4.0, 1.0, 3.0];

    // Reference: the residue the stream leaves behind.
    let mut probe = engine6();
    probe.feed(&series).unwrap();
    probe.finalize(ResidualMethod::None).unwrap();
    let residue = residue_values(&probe);
    assert_eq!(residue, vec![0.0, 4.0, 1.0, 3.0]);

    // Repeated finalization on the stream itself.
    let mut repeated = engine6();
    repeated.feed(&series).unwrap();
    repeated.finalize(ResidualMethod::Repeated).unwrap();
    assert!(repeated.residue().is_empty());

    // Feeding residue ++ residue through a fresh context closes the
    // same cycles.
    let mut doubled = engine6();
    let twice: Vec<f64> = residue.iter().chain(residue.iter()).copied().collect();
    doubled.feed(&twice).unwrap();

    assert_eq!(repeated.rfm_get().unwrap(), doubled.rfm_get().unwrap());
    // The junction closes (1, 3) and (4, 0).
    assert_eq!(repeated.rfm_peek(1, 3).unwrap(), FULL_CYCLE_INC);
    assert_eq!(repeated.rfm_peek(4, 0).unwrap(), FULL_CYCLE_INC);
}

// ─── Feeding variants ───────────────────────────────────────────────

#[test]
fn chunked_feed_equals_single_feed() {
    let mut whole = engine6();
    whole.feed(&[0.0, 5.0, 1.0, 5.0, 2.0, 4.0]).unwrap();
    whole.finalize(ResidualMethod::None).unwrap();

    let mut chunked = engine6();
    chunked.feed(&[0.0]).unwrap();
    chunked.feed(&[5.0, 1.0]).unwrap();
    chunked.feed(&[]).unwrap();
    chunked.feed(&[5.0, 2.0, 4.0]).unwrap();
    chunked.finalize(ResidualMethod::None).unwrap();

    assert_eq!(whole.rfm_get().unwrap(), chunked.rfm_get().unwrap());
    assert_eq!(residue_values(&whole), residue_values(&chunked));
    assert_eq!(whole.damage(), chunked.damage());
}

#[test]
fn feed_scaled_applies_the_factor() {
    let mut scaled = engine6();
    scaled.feed_scaled(&[0.0, 2.5, 0.5, 2.5], 2.0).unwrap();
    scaled.finalize(ResidualMethod::None).unwrap();

    let mut plain = engine6();
    plain.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    plain.finalize(ResidualMethod::None).unwrap();

    assert_eq!(scaled.rfm_get().unwrap(), plain.rfm_get().unwrap());
}

#[test]
fn feed_tuple_accepts_prequantized_samples() {
    use fatigue_rainflow::Sample;
    let mut tupled = engine6();
    let tuples: Vec<Sample> = [0.0f64, 5.0, 1.0, 5.0]
        .iter()
        .map(|&v| Sample::new(v, v as u16))
        .collect();
    tupled.feed_tuple(&tuples).unwrap();
    tupled.finalize(ResidualMethod::None).unwrap();
    assert_eq!(tupled.rfm_peek(5, 1).unwrap(), FULL_CYCLE_INC);
    // Auto-assigned positions continue across the stream.
    assert_eq!(tupled.residue()[1].pos, 4);
}

#[test]
fn non_finite_samples_are_skipped() {
    let mut e = engine6();
    e.feed(&[0.0, f64::NAN, 5.0, 1.0, f64::INFINITY, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert_eq!(e.rfm_peek(5, 1).unwrap(), FULL_CYCLE_INC);
    // Skipped samples still occupy stream positions.
    assert_eq!(e.stream_len(), 6);
}

// ─── Alternative counting methods ───────────────────────────────────

#[test]
fn hcm_counts_the_contained_cycle() {
    let mut e = engine6();
    e.set_counting_method(CountingMethod::Hcm).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert_eq!(e.rfm_peek(5, 1).unwrap(), FULL_CYCLE_INC);
    assert_eq!(residue_values(&e), vec![0.0, 5.0]);
}

#[test]
fn counting_method_none_only_filters() {
    let mut e = engine6();
    e.set_counting_method(CountingMethod::None).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert_eq!(e.rfm_sum().unwrap(), 0);
    assert_eq!(residue_values(&e), vec![0.0, 5.0, 1.0, 5.0]);
}

#[test]
fn delegated_counting_uses_the_capability() {
    let mut e = engine6();
    e.set_counting_method(CountingMethod::Delegated).unwrap();
    e.set_capabilities(Capabilities {
        cycle_find: Some(Box::new(|residue| {
            let mut out = Vec::new();
            while residue.len() >= 3 {
                let from = residue.remove(0);
                let to = residue.remove(0);
                let next = residue.as_slice()[0];
                out.push(CycleEvent { from, to, next });
            }
            Ok(out)
        })),
        ..Default::default()
    })
    .unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert_eq!(e.rfm_peek(0, 5).unwrap(), FULL_CYCLE_INC);
    assert_eq!(residue_values(&e), vec![1.0, 5.0]);
}

// ─── Remaining finalizers ───────────────────────────────────────────

#[test]
fn clormann_seeger_counts_zero_straddling_pairs() {
    let mut e = RainflowEngine::new(6, 1.0, -3.0, 0.5, CountFlags::STANDARD).unwrap();
    e.wl_init_original(1000.0, 1e7, -5.0).unwrap();
    e.feed(&[-1.0, 2.0, -2.0, 2.5]).unwrap();
    e.finalize(ResidualMethod::ClormannSeeger).unwrap();
    // Classes with offset −3: 2.0 → 5, −2.0 → 1.
    assert_eq!(e.rfm_peek(5, 1).unwrap(), FULL_CYCLE_INC);
    assert_eq!(residue_values(&e), vec![-1.0, 2.5]);
}

#[test]
fn din45667_pairs_rising_with_falling_slopes() {
    let mut e = engine6();
    e.feed(&[0.0, 5.0, 2.0, 4.0]).unwrap();
    e.finalize(ResidualMethod::RpDin45667).unwrap();
    // Slopes: rise 0→5 (range 5), fall 5→2 (range 3), rise 2→4
    // (range 2). The largest rise pairs with the only fall; the fall
    // is the smaller of the two and is counted.
    assert_eq!(e.rfm_peek(5, 2).unwrap(), FULL_CYCLE_INC);
    assert_eq!(e.rfm_sum().unwrap(), FULL_CYCLE_INC);
}

// ─── Damage, transform, spreading ───────────────────────────────────

/// Context with damage visible at small amplitudes.
fn engine_elementary() -> RainflowEngine {
    let mut e = RainflowEngine::new(6, 1.0, 0.0, 1.0, CountFlags::STANDARD).unwrap();
    e.wl_init_elementary(1.0, 1000.0, -3.0).unwrap();
    e
}

#[test]
fn damage_of_one_cycle_follows_the_curve() {
    let mut e = engine_elementary();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    // Sa = 2 on an elementary curve (1, 1000, −3): 2³/1000.
    assert!((e.damage() - 0.008).abs() < 1e-12);
    // The matrix reproduces the same number.
    let from_rfm = e.damage_from_rfm().unwrap();
    assert!((from_rfm - e.damage()).abs() < 1e-12);
}

#[test]
fn amplitude_transform_raises_tensile_mean_damage() {
    let mut plain = engine_elementary();
    plain.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    plain.finalize(ResidualMethod::None).unwrap();

    let at = AmplitudeTransform::from_sensitivity(0.3, TransformTarget::PinnedR(-1.0), false)
        .unwrap();
    let mut transformed = engine_elementary();
    transformed.at_init(at.clone()).unwrap();
    transformed.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    transformed.finalize(ResidualMethod::None).unwrap();

    // The cycle sits at mean 3.5, amplitude 2.
    let wl = plain.wl_params().unwrap();
    let expected = wl.damage(at.transform(2.0, 3.5).unwrap()).unwrap();
    assert!(transformed.damage() > plain.damage());
    assert!((transformed.damage() - expected).abs() < 1e-12);
}

#[test]
fn half23_spreads_damage_onto_both_endpoints() {
    let mut e = engine_elementary();
    e.tp_init(16, false).unwrap();
    e.dh_init(SpreadMethod::Half23, 16, false).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();

    let tp = e.tp().unwrap();
    let values: Vec<f64> = tp.iter().map(|t| t.sample.value).collect();
    assert_eq!(values, vec![0.0, 5.0, 1.0, 5.0]);
    assert!((tp[1].damage - 0.004).abs() < 1e-12);
    assert!((tp[2].damage - 0.004).abs() < 1e-12);
    assert_eq!(tp[0].damage, 0.0);

    let dh = e.dh().unwrap();
    assert!((dh[1] - 0.004).abs() < 1e-12);
    assert!((dh[2] - 0.004).abs() < 1e-12);
    assert_eq!(dh[0], 0.0);
    assert_eq!(dh[3], 0.0);
}

#[test]
fn ramp_damage_grows_toward_the_cycle_end() {
    let mut e = engine_elementary();
    e.tp_init(16, false).unwrap();
    e.dh_init(SpreadMethod::RampDamage23, 16, false).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();

    let tp = e.tp().unwrap();
    // Window spans positions 2..3; the start gets weight 0, the end
    // the full damage.
    assert_eq!(tp[1].damage, 0.0);
    assert!((tp[2].damage - 0.008).abs() < 1e-12);
    let dh = e.dh().unwrap();
    assert!((dh[2] - 0.008).abs() < 1e-12);
}

#[test]
fn ramp_amplitude_follows_the_wohler_exponent() {
    // The follow-up window (from → next) puts the cycle's `to` point
    // at fraction w = 0.5, so the amplitude weighting is observable:
    // D·w^|k| = 0.008 · 0.5³ = 0.001. The inverted reading
    // D·w^(−|k|) would give 0.064, above the cycle's own damage.
    let mut e = engine_elementary();
    e.tp_init(16, false).unwrap();
    e.dh_init(SpreadMethod::RampAmplitude24, 16, false).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();

    let tp = e.tp().unwrap();
    assert_eq!(tp[0].damage, 0.0);
    assert_eq!(tp[1].damage, 0.0);
    assert!((tp[2].damage - 0.001).abs() < 1e-12);
    assert!((tp[3].damage - 0.008).abs() < 1e-12);
    let dh = e.dh().unwrap();
    assert!((dh[2] - 0.001).abs() < 1e-12);
    assert!((dh[3] - 0.008).abs() < 1e-12);
}

#[test]
fn ramp_amplitude_endpoints_match_the_damage_ramp() {
    // Over the from → to window the stored points sit at w = 0 and
    // w = 1, where the amplitude and damage weightings coincide.
    let mut e = engine_elementary();
    e.tp_init(16, false).unwrap();
    e.dh_init(SpreadMethod::RampAmplitude23, 16, false).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();

    let tp = e.tp().unwrap();
    assert_eq!(tp[1].damage, 0.0);
    assert!((tp[2].damage - 0.008).abs() < 1e-12);
    assert_eq!(tp[3].damage, 0.0);
}

#[test]
fn transient_spread_modes_are_rejected() {
    let mut e = engine_elementary();
    let err = e.dh_init(SpreadMethod::Transient23, 16, false).unwrap_err();
    assert!(matches!(err, EngineError::Unsupported { .. }));
}

#[test]
fn rp_damage_methods_order_consistently() {
    let mut e = RainflowEngine::new(6, 1.0, 0.0, 1.0, CountFlags::STANDARD).unwrap();
    e.wl_init_any(WohlerParams {
        sx: 2.0,
        nx: 1e3,
        k: -5.0,
        k2: -5.0,
        sd: 2.0,
        nd: 1e3,
        q: 4.0,
        q2: 4.0,
        omission: 0.0,
    })
    .unwrap();
    // Two closed cycles: ranges 4 (amplitude 2) and 2 (amplitude 1,
    // below the endurance).
    e.feed(&[0.0, 5.0, 1.0, 5.0, 3.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    let rp = e.rp_get().unwrap();
    assert_eq!(rp[4], FULL_CYCLE_INC);
    assert_eq!(rp[2], FULL_CYCLE_INC);

    let default = e.damage_from_rp(RpDamageMethod::Default).unwrap();
    let elementar = e.damage_from_rp(RpDamageMethod::Elementar).unwrap();
    let consequent = e.damage_from_rp(RpDamageMethod::Consequent).unwrap();
    // Default sees only the amplitude-2 cycle: 1/N(2) = 1e−3.
    assert!((default - 1e-3).abs() < 1e-15);
    // Without the endurance cutoff the amplitude-1 cycle adds 2⁻⁵/1e3.
    assert!((elementar - (1e-3 + 1e-3 / 32.0)).abs() < 1e-15);
    assert!(consequent >= default);
    // The reshaping is transparent: parameters and LUT behavior are
    // restored afterwards.
    assert_eq!(e.wl_params().unwrap().sd, 2.0);
    let again = e.damage_from_rp(RpDamageMethod::Default).unwrap();
    assert_eq!(default, again);
}

// ─── Turning-point store management ─────────────────────────────────

#[test]
fn autoprune_keeps_the_tail() {
    let mut e = engine6();
    e.set_counting_method(CountingMethod::None).unwrap();
    e.tp_init(64, false).unwrap();
    e.tp_init_autoprune(true, 2, 3).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();

    let tp = e.tp().unwrap();
    assert_eq!(tp.len(), 2);
    let values: Vec<f64> = tp.iter().map(|t| t.sample.value).collect();
    assert_eq!(values, vec![1.0, 5.0]);
    // Store back-references of surviving residue entries are remapped;
    // dropped ones are cleared.
    let residue = e.residue();
    assert!(residue.iter().filter(|s| s.tp_pos != 0).count() >= 1);
    for s in residue {
        if s.tp_pos != 0 {
            assert_eq!(e.tp_get(s.tp_pos).unwrap().sample.pos, s.pos);
        }
    }
}

#[test]
fn explicit_prune_rebases_positions() {
    let mut e = engine6();
    e.set_counting_method(CountingMethod::None).unwrap();
    e.tp_init(64, false).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::Discard).unwrap();
    let before = e.stream_len();

    e.tp_prune(2, CountFlags::empty()).unwrap();
    let tp = e.tp().unwrap();
    assert_eq!(tp.len(), 2);
    // Positions shift down so the oldest retained point starts the
    // stream again.
    assert_eq!(tp[0].sample.pos, 1);
    assert!(e.stream_len() < before);
}

#[test]
fn preserve_pos_prune_keeps_original_positions() {
    let mut e = engine6();
    e.set_counting_method(CountingMethod::None).unwrap();
    e.tp_init(64, false).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::Discard).unwrap();

    e.tp_prune(2, CountFlags::TP_PRUNE_PRESERVE_POS).unwrap();
    let tp = e.tp().unwrap();
    assert_eq!(tp.len(), 2);
    assert!(tp[0].sample.pos > 1);
}

#[test]
fn margin_flag_records_stream_edges() {
    let mut e = RainflowEngine::new(
        6,
        1.0,
        0.0,
        1.0,
        CountFlags::STANDARD | CountFlags::ENFORCE_MARGIN,
    )
    .unwrap();
    e.wl_init_original(1000.0, 1e7, -5.0).unwrap();
    e.tp_init(16, false).unwrap();
    // The final 4.4 decays inside the hysteresis band and would not
    // survive filtering on its own.
    e.feed(&[2.0, 5.0, 1.0, 4.5, 4.4]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    let tp = e.tp().unwrap();
    assert_eq!(tp.first().unwrap().sample.pos, 1);
    assert_eq!(tp.last().unwrap().sample.pos, 5);
}

// ─── Lifecycle & error model ────────────────────────────────────────

#[test]
fn out_of_range_sample_faults_the_context() {
    let mut e = engine6();
    let err = e.feed(&[0.0, 7.5]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { .. }));
    assert_eq!(e.state(), fatigue_rainflow::ContextState::Error);
    // The context is single-shot after a fault.
    let again = e.feed(&[1.0]).unwrap_err();
    assert_eq!(again, err);
    // Re-initialization recovers.
    e.deinit();
    e.init(6, 1.0, 0.0, 1.0, CountFlags::STANDARD).unwrap();
    e.feed(&[1.0]).unwrap();
}

#[test]
fn feeding_after_finalize_is_a_state_error() {
    let mut e = engine6();
    e.feed(&[0.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    let err = e.feed(&[1.0]).unwrap_err();
    assert!(matches!(err, EngineError::State { .. }));
}

#[test]
fn count_overflow_is_fatal() {
    let mut e = engine6();
    e.feed(&[0.0, 5.0, 1.0]).unwrap();
    e.rfm_poke(5, 1, COUNT_LIMIT, false).unwrap();
    // Closing the (5, 1) cycle would push the cell past the limit.
    let err = e.feed(&[5.0, 1.0]).unwrap_err();
    assert!(matches!(err, EngineError::Overflow { .. }));
    assert_eq!(e.state(), fatigue_rainflow::ContextState::Error);
}

#[test]
fn clear_counts_keeps_the_residue() {
    let mut e = engine_elementary();
    e.feed(&[0.0, 5.0, 1.0, 5.0, 2.0]).unwrap();
    e.clear_counts().unwrap();
    assert_eq!(e.rfm_sum().unwrap(), 0);
    assert_eq!(e.damage(), 0.0);
    assert!(!e.residue().is_empty());
    // Counting continues seamlessly.
    e.feed(&[4.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
}

#[test]
fn config_built_engine_counts() {
    use fatigue::config::EngineConfig;
    let cfg = EngineConfig::from_toml_str(
        r#"
        hysteresis = 1.0

        [class]
        count = 6
        width = 1.0
        offset = 0.0

        [wohler]
        form = "elementary"
        sx = 1.0
        nx = 1000.0
        k = -3.0
        "#,
    )
    .unwrap();
    let mut e = RainflowEngine::from_config(&cfg).unwrap();
    e.feed(&[0.0, 5.0, 1.0, 5.0]).unwrap();
    e.finalize(ResidualMethod::None).unwrap();
    assert_eq!(e.rfm_peek(5, 1).unwrap(), FULL_CYCLE_INC);
    assert!((e.damage() - 0.008).abs() < 1e-12);
}
