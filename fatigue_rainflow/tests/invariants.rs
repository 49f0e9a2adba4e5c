//! Property tests for the quantified counting invariants.

use fatigue::consts::FULL_CYCLE_INC;
use fatigue::flags::CountFlags;
use fatigue::methods::ResidualMethod;
use fatigue_rainflow::RainflowEngine;
use proptest::prelude::*;

const CLASSES: u16 = 6;

fn engine(hysteresis: f64) -> RainflowEngine {
    let mut e = RainflowEngine::new(CLASSES, 1.0, 0.0, hysteresis, CountFlags::STANDARD).unwrap();
    e.wl_init_elementary(1.0, 1000.0, -3.0).unwrap();
    e
}

/// Streams stay strictly inside the class range [0, 6).
fn stream() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0..5.999f64, 0..60)
}

fn hysteresis() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(0.5), Just(1.0)]
}

proptest! {
    #[test]
    fn rfm_diagonal_stays_empty(values in stream(), h in hysteresis()) {
        let mut e = engine(h);
        e.feed(&values).unwrap();
        e.finalize(ResidualMethod::None).unwrap();
        e.rfm_check().unwrap();
        let rfm = e.rfm_get().unwrap();
        for c in 0..CLASSES as usize {
            prop_assert_eq!(rfm[c * CLASSES as usize + c], 0);
        }
        // Every stored count is a whole number of full cycles.
        prop_assert_eq!(e.rfm_sum().unwrap() % FULL_CYCLE_INC, 0);
    }

    #[test]
    fn range_pairs_match_the_matrix(values in stream(), h in hysteresis()) {
        let mut e = engine(h);
        e.feed(&values).unwrap();
        e.finalize(ResidualMethod::None).unwrap();
        prop_assert_eq!(e.rp_get().unwrap(), e.rp_from_rfm().unwrap());
    }

    #[test]
    fn level_crossings_match_the_matrix(values in stream(), h in hysteresis()) {
        let mut e = engine(h);
        e.feed(&values).unwrap();
        e.finalize(ResidualMethod::None).unwrap();
        prop_assert_eq!(e.lc_get().unwrap(), e.lc_from_rfm().unwrap());
    }

    #[test]
    fn damage_grows_with_the_stream(values in stream(), split in 0usize..60) {
        let split = split.min(values.len());
        let mut prefix = engine(0.5);
        prefix.feed(&values[..split]).unwrap();
        prefix.finalize(ResidualMethod::None).unwrap();

        let mut full = engine(0.5);
        full.feed(&values).unwrap();
        full.finalize(ResidualMethod::None).unwrap();

        prop_assert!(prefix.damage() <= full.damage() + 1e-15);
    }

    #[test]
    fn finalize_none_is_idempotent(values in stream(), h in hysteresis()) {
        let mut e = engine(h);
        e.feed(&values).unwrap();
        e.finalize(ResidualMethod::None).unwrap();
        let rfm = e.rfm_get().unwrap();
        let residue: Vec<(f64, u64)> = e.residue().iter().map(|s| (s.value, s.pos)).collect();
        let damage = e.damage();

        e.finalize(ResidualMethod::None).unwrap();
        prop_assert_eq!(e.rfm_get().unwrap(), rfm);
        let residue2: Vec<(f64, u64)> = e.residue().iter().map(|s| (s.value, s.pos)).collect();
        prop_assert_eq!(residue2, residue);
        prop_assert_eq!(e.damage(), damage);
    }

    #[test]
    fn make_symmetric_is_idempotent(values in stream(), h in hysteresis()) {
        let mut e = engine(h);
        e.feed(&values).unwrap();
        e.finalize(ResidualMethod::None).unwrap();
        let sum = e.rfm_sum().unwrap();

        e.rfm_make_symmetric().unwrap();
        let once = e.rfm_get().unwrap();
        // The lower triangle is empty, counts are preserved.
        for from in 0..CLASSES as usize {
            for to in 0..from {
                prop_assert_eq!(once[from * CLASSES as usize + to], 0);
            }
        }
        prop_assert_eq!(e.rfm_sum().unwrap(), sum);

        e.rfm_make_symmetric().unwrap();
        prop_assert_eq!(e.rfm_get().unwrap(), once);
    }

    #[test]
    fn matrix_round_trips_through_set(values in stream(), h in hysteresis()) {
        let mut e = engine(h);
        e.feed(&values).unwrap();
        e.finalize(ResidualMethod::None).unwrap();
        let rfm = e.rfm_get().unwrap();

        e.clear_counts().unwrap();
        prop_assert_eq!(e.rfm_sum().unwrap(), 0);
        e.rfm_set(&rfm, false).unwrap();
        prop_assert_eq!(e.rfm_get().unwrap(), rfm);
    }

    #[test]
    fn contained_quartets_always_close(b in 1.1..9.9f64, c_frac in 0.0..1.0f64) {
        // Residue 0, b, c, 10 with 0 ≤ c < b ≤ 10: the inner pair is
        // contained in the outer range and must close.
        let c = (b - 0.1) * c_frac;
        let mut e = RainflowEngine::new(11, 1.0, 0.0, 0.0, CountFlags::STANDARD).unwrap();
        e.wl_init_elementary(1.0, 1000.0, -3.0).unwrap();
        e.feed(&[0.0, b, c, 10.0]).unwrap();
        e.finalize(ResidualMethod::None).unwrap();

        let residue: Vec<f64> = e.residue().iter().map(|s| s.value).collect();
        prop_assert_eq!(residue, vec![0.0, 10.0]);
        let (cb, cc) = (b.floor() as u16, c.floor() as u16);
        if cb != cc {
            prop_assert_eq!(e.rfm_peek(cb, cc).unwrap(), FULL_CYCLE_INC);
            prop_assert_eq!(e.rfm_sum().unwrap(), FULL_CYCLE_INC);
        } else {
            // Same-class pairs are skipped, but the points still
            // leave the residue.
            prop_assert_eq!(e.rfm_sum().unwrap(), 0);
        }
    }
}
