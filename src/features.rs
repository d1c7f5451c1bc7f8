use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::error::PredictError;
use crate::store::DataStore;

/// Authoritative input column names, in the exact order the regression
/// artifact was trained with. [`crate::model::Model::load`] validates its
/// artifact against this list.
pub const FEATURE_NAMES: [&str; 13] = [
    "Junction",
    "ID",
    "Hour",
    "Day",
    "Month",
    "Weekday",
    "Is_Weekend",
    "Lag_1",
    "Lag_24",
    "Lag_168",
    "Roll_Mean_3",
    "Roll_Mean_6",
    "Roll_Mean_24",
];

/// One model input row. Serialized field names match the training columns so
/// the vector can be returned to the caller for inspection as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    #[serde(rename = "Junction")]
    pub junction: u32,
    /// Passthrough id of the junction's first record in original file order.
    /// Carries no predictive signal; the artifact expects the column anyway.
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "Day")]
    pub day: u32,
    #[serde(rename = "Month")]
    pub month: u32,
    /// Monday=0 .. Sunday=6.
    #[serde(rename = "Weekday")]
    pub weekday: u32,
    #[serde(rename = "Is_Weekend")]
    pub is_weekend: u8,
    #[serde(rename = "Lag_1")]
    pub lag_1: f64,
    #[serde(rename = "Lag_24")]
    pub lag_24: f64,
    #[serde(rename = "Lag_168")]
    pub lag_168: f64,
    #[serde(rename = "Roll_Mean_3")]
    pub roll_mean_3: f64,
    #[serde(rename = "Roll_Mean_6")]
    pub roll_mean_6: f64,
    #[serde(rename = "Roll_Mean_24")]
    pub roll_mean_24: f64,
}

impl FeatureVector {
    /// Flatten into the artifact's input order (see [`FEATURE_NAMES`]).
    pub fn to_ordered(&self) -> [f64; 13] {
        [
            f64::from(self.junction),
            self.id as f64,
            f64::from(self.hour),
            f64::from(self.day),
            f64::from(self.month),
            f64::from(self.weekday),
            f64::from(self.is_weekend),
            self.lag_1,
            self.lag_24,
            self.lag_168,
            self.roll_mean_3,
            self.roll_mean_6,
            self.roll_mean_24,
        ]
    }
}

/// Rebuild the feature vector for one `(junction, target)` pair.
///
/// Pure over an unchanged store: same inputs, bit-identical output. `target`
/// may lie anywhere relative to the data; missing history degrades per the
/// fallback rules below instead of restricting the input range.
///
/// - Lag features (1h / 24h / 168h back): exact-timestamp lookup, falling
///   back to the junction's historical mean on a miss. An approximation,
///   never a request failure.
/// - Rolling means (trailing 3h / 6h / 24h, half-open, target excluded): an
///   empty window fails the request with
///   [`PredictError::InsufficientHistory`] — the artifact does not tolerate
///   missing values.
/// - Calendar fields come straight from `target`.
pub fn generate(
    store: &DataStore,
    junction: u32,
    target: NaiveDateTime,
) -> Result<FeatureVector, PredictError> {
    if !store.contains(junction) {
        return Err(PredictError::UnknownJunction(junction));
    }
    let id = store
        .first_record_id(junction)
        .ok_or(PredictError::EmptyJunction(junction))?;

    let lag_at = |hours: i64| -> Result<f64, PredictError> {
        match store.lookup_exact(junction, target - Duration::hours(hours)) {
            Some(rec) => Ok(rec.vehicles),
            None => store.mean_vehicles(junction),
        }
    };
    let roll_mean = |hours: i64| -> Result<f64, PredictError> {
        let window = store.lookup_range(junction, target - Duration::hours(hours), target);
        if window.is_empty() {
            return Err(PredictError::InsufficientHistory {
                junction,
                window_hours: hours,
                target,
            });
        }
        let sum: f64 = window.iter().map(|r| r.vehicles).sum();
        Ok(sum / window.len() as f64)
    };

    let weekday = target.weekday().num_days_from_monday();

    Ok(FeatureVector {
        junction,
        id,
        hour: target.hour(),
        day: target.day(),
        month: target.month(),
        weekday,
        is_weekend: u8::from(weekday >= 5),
        lag_1: lag_at(1)?,
        lag_24: lag_at(24)?,
        lag_168: lag_at(168)?,
        roll_mean_3: roll_mean(3)?,
        roll_mean_6: roll_mean(6)?,
        roll_mean_24: roll_mean(24)?,
    })
}
