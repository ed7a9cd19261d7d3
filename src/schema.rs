//! Ordered feature schema shared by training and inference.
//!
//! The model only sees positional vectors, so the position of each field is
//! part of the model's contract. Both the synthetic dataset builder and the
//! request scorer go through [`vectorize`], and the artifact records
//! [`feature_names`] so a model trained against a different layout is refused
//! at load time.

use crate::models::BorrowerFeatures;

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 4;

/// Positional model input, laid out as [`FEATURE_SCHEMA`].
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Value type of a schema field as seen at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Boolean,
}

/// Describes one model input: its name, type, synthetic sampling range and
/// its weight in the raw trust formula.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Inclusive lower bound used when sampling synthetic data.
    pub min: f64,
    /// Inclusive upper bound used when sampling synthetic data.
    pub max: f64,
    /// Divisor that brings the field to its native `[0, 1]` range.
    pub normalizer: f64,
    /// Weight of the normalized field in the raw score.
    pub weight: f64,
    pub extract: fn(&BorrowerFeatures) -> f64,
    /// Writes a model-space value back into the field. Integer fields
    /// truncate; the boolean field is set for any value of at least one half.
    pub assign: fn(&mut BorrowerFeatures, f64),
}

impl FieldDescriptor {
    /// Weighted, normalized contribution of this field to the raw score.
    pub fn contribution(&self, value: f64) -> f64 {
        self.weight * (value / self.normalizer)
    }

    pub fn in_training_range(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub static FEATURE_SCHEMA: [FieldDescriptor; FEATURE_COUNT] = [
    FieldDescriptor {
        name: "wallet_age_days",
        kind: FieldKind::Integer,
        min: 1.0,
        max: 3650.0,
        normalizer: 3650.0,
        weight: 0.2,
        extract: |f| f.wallet_age_days as f64,
        assign: |f, v| f.wallet_age_days = v as i64,
    },
    FieldDescriptor {
        name: "transaction_volume_usd",
        kind: FieldKind::Real,
        min: 100.0,
        max: 100_000.0,
        normalizer: 100_000.0,
        weight: 0.4,
        extract: |f| f.transaction_volume_usd,
        assign: |f, v| f.transaction_volume_usd = v,
    },
    FieldDescriptor {
        name: "defi_participation",
        kind: FieldKind::Boolean,
        min: 0.0,
        max: 1.0,
        normalizer: 1.0,
        weight: 0.1,
        extract: |f| if f.defi_participation { 1.0 } else { 0.0 },
        assign: |f, v| f.defi_participation = v >= 0.5,
    },
    FieldDescriptor {
        name: "repayment_streaks",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 50.0,
        normalizer: 50.0,
        weight: 0.3,
        extract: |f| f.repayment_streaks as f64,
        assign: |f, v| f.repayment_streaks = v as i64,
    },
];

/// Builds the model input for one borrower in schema order.
pub fn vectorize(features: &BorrowerFeatures) -> FeatureVector {
    std::array::from_fn(|i| (FEATURE_SCHEMA[i].extract)(features))
}

/// Inverse of [`vectorize`], used to materialise synthetic rows.
pub fn from_vector(vector: &FeatureVector) -> BorrowerFeatures {
    let mut features = BorrowerFeatures::default();
    for (field, value) in FEATURE_SCHEMA.iter().zip(vector.iter()) {
        (field.assign)(&mut features, *value);
    }
    features
}

/// Field names in schema order, as stored in the model artifact.
pub fn feature_names() -> Vec<String> {
    FEATURE_SCHEMA.iter().map(|f| f.name.to_string()).collect()
}

/// Names of fields whose value lies outside the range seen during training.
pub fn out_of_range_fields(features: &BorrowerFeatures) -> Vec<&'static str> {
    let vector = vectorize(features);
    FEATURE_SCHEMA
        .iter()
        .zip(vector.iter())
        .filter(|(field, value)| !field.in_training_range(**value))
        .map(|(field, _)| field.name)
        .collect()
}

/// Weighted sum of normalized features: the precursor of the training label.
pub fn raw_score(features: &BorrowerFeatures) -> f64 {
    let vector = vectorize(features);
    FEATURE_SCHEMA
        .iter()
        .zip(vector.iter())
        .map(|(field, value)| field.contribution(*value))
        .sum()
}
