use serde::{Deserialize, Serialize};

// ============ Request Models ============

/// Observable wallet features scored by the model.
///
/// Every field is required. Integer fields are signed so that out-of-range
/// values (e.g. a negative age) reach the model instead of being rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BorrowerFeatures {
    /// Days since the wallet's first on-chain activity.
    pub wallet_age_days: i64,
    /// Lifetime transaction volume in USD.
    pub transaction_volume_usd: f64,
    /// Whether the wallet has interacted with DeFi protocols.
    pub defi_participation: bool,
    /// Number of consecutive on-time loan repayments.
    pub repayment_streaks: i64,
}

// ============ Training Models ============

/// One synthetic training row: features, the weighted raw score and the
/// batch-scaled integer label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: BorrowerFeatures,
    pub raw_score: f64,
    pub label: u8,
}

// ============ Response Models ============

/// Integer trust score, always within `[TrustScore::MIN, TrustScore::MAX]`.
///
/// The only way to build one is [`TrustScore::clamp`], so the range holds for
/// every value that leaves the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TrustScore(u8);

impl TrustScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    /// Truncates a raw model prediction toward zero and bounds it to `[1, 100]`.
    ///
    /// NaN has no meaningful ordering and maps to the lowest score.
    pub fn clamp(prediction: f64) -> Self {
        if prediction.is_nan() {
            return Self(Self::MIN);
        }
        let bounded = prediction
            .trunc()
            .clamp(f64::from(Self::MIN), f64::from(Self::MAX));
        Self(bounded as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for TrustScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body returned by `POST /score` on success.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub trust_score: TrustScore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_documented_values() {
        assert_eq!(TrustScore::clamp(-50.0).value(), 1);
        assert_eq!(TrustScore::clamp(150.7).value(), 100);
        assert_eq!(TrustScore::clamp(57.9).value(), 57);
    }

    #[test]
    fn test_clamp_truncates_instead_of_rounding() {
        assert_eq!(TrustScore::clamp(99.99).value(), 99);
        assert_eq!(TrustScore::clamp(1.999).value(), 1);
        assert_eq!(TrustScore::clamp(0.5).value(), 1);
    }

    #[test]
    fn test_clamp_non_finite() {
        assert_eq!(TrustScore::clamp(f64::NAN).value(), 1);
        assert_eq!(TrustScore::clamp(f64::INFINITY).value(), 100);
        assert_eq!(TrustScore::clamp(f64::NEG_INFINITY).value(), 1);
    }

    #[test]
    fn test_score_response_serializes_as_plain_integer() {
        let body = serde_json::to_value(ScoreResponse {
            trust_score: TrustScore::clamp(42.3),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "trust_score": 42 }));
    }

    #[test]
    fn test_borrower_features_require_every_field() {
        let missing = serde_json::json!({
            "wallet_age_days": 10,
            "transaction_volume_usd": 100.0,
            "defi_participation": true
        });
        assert!(serde_json::from_value::<BorrowerFeatures>(missing).is_err());

        let mistyped = serde_json::json!({
            "wallet_age_days": "ten",
            "transaction_volume_usd": 100.0,
            "defi_participation": true,
            "repayment_streaks": 3
        });
        assert!(serde_json::from_value::<BorrowerFeatures>(mistyped).is_err());
    }

    #[test]
    fn test_borrower_features_accept_negative_integers() {
        let features: BorrowerFeatures = serde_json::from_value(serde_json::json!({
            "wallet_age_days": -5,
            "transaction_volume_usd": -1.5,
            "defi_participation": false,
            "repayment_streaks": -1
        }))
        .unwrap();
        assert_eq!(features.wallet_age_days, -5);
        assert_eq!(features.repayment_streaks, -1);
    }
}
