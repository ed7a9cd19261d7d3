/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use trust_score_api::labels::scale_labels;
use trust_score_api::models::{BorrowerFeatures, TrustScore};
use trust_score_api::schema::{self, FEATURE_SCHEMA};

// Property: clamping always lands in [1, 100]
proptest! {
    #[test]
    fn clamp_is_always_in_range(prediction in any::<f64>()) {
        let score = TrustScore::clamp(prediction).value();
        prop_assert!((1..=100).contains(&score));
    }

    #[test]
    fn clamp_truncates_in_range_predictions(prediction in 1.0f64..101.0) {
        let expected = (prediction.trunc() as u8).min(100);
        prop_assert_eq!(TrustScore::clamp(prediction).value(), expected);
    }

    #[test]
    fn clamp_is_monotonic(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(TrustScore::clamp(lo) <= TrustScore::clamp(hi));
    }
}

// Property: batch scaling anchors the extremes and never leaves [1, 100]
proptest! {
    #[test]
    fn scaled_labels_are_anchored(raws in prop::collection::vec(-10.0f64..10.0, 2..200)) {
        let min = raws.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = raws.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assume!(max > min);

        let labels = scale_labels(&raws).unwrap();
        prop_assert_eq!(labels.len(), raws.len());
        for (raw, label) in raws.iter().zip(&labels) {
            prop_assert!((1..=100).contains(label));
            if *raw == min {
                prop_assert_eq!(*label, 1);
            }
            if *raw == max {
                prop_assert_eq!(*label, 100);
            }
        }
    }

    #[test]
    fn scaled_labels_preserve_order(raws in prop::collection::vec(0.0f64..1.0, 2..100)) {
        prop_assume!(raws.iter().any(|r| *r != raws[0]));
        let labels = scale_labels(&raws).unwrap();
        for i in 0..raws.len() {
            for j in 0..raws.len() {
                if raws[i] < raws[j] {
                    prop_assert!(labels[i] <= labels[j]);
                }
            }
        }
    }

    #[test]
    fn constant_batches_are_rejected(value in -1e3f64..1e3, len in 1usize..50) {
        prop_assert!(scale_labels(&vec![value; len]).is_err());
    }
}

// Property: the schema vector mirrors the named fields
proptest! {
    #[test]
    fn vector_positions_match_field_names(
        age in -10_000i64..10_000,
        volume in -1e6f64..1e6,
        defi in proptest::bool::ANY,
        streaks in -100i64..100
    ) {
        let features = BorrowerFeatures {
            wallet_age_days: age,
            transaction_volume_usd: volume,
            defi_participation: defi,
            repayment_streaks: streaks,
        };
        let vector = schema::vectorize(&features);
        let json = serde_json::to_value(features).unwrap();

        for (field, value) in FEATURE_SCHEMA.iter().zip(vector.iter()) {
            let named = &json[field.name];
            let expected = match named {
                serde_json::Value::Bool(b) => if *b { 1.0 } else { 0.0 },
                other => other.as_f64().unwrap(),
            };
            prop_assert_eq!(*value, expected, "field {}", field.name);
        }
    }
}
