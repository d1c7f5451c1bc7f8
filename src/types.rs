use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::level::TrafficLevel;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub junction: u32,
    /// Accepted formats: `%Y-%m-%d %H:%M:%S` and the `T`-separated variants
    /// an HTML datetime input produces.
    pub datetime: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    pub junction: u32,
    pub datetime: String,
    /// Raw model output truncated to a whole vehicle count for display.
    pub predicted_vehicles: i64,
    pub traffic_level: TrafficLevel,
    /// The generated model input, for inspection/debugging.
    pub features: FeatureVector,
    pub ts_ms: i64,
}
