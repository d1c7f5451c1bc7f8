//! Near-term traffic volume prediction for road junctions.
//!
//! The pipeline: a read-only [`store::DataStore`] of historical records feeds
//! [`features::generate`], which rebuilds the exact feature vector the
//! regression artifact was trained on (lags, trailing rolling means, calendar
//! fields). [`model::Model`] runs the artifact and [`level::TrafficLevel`]
//! buckets the scalar into Low/Medium/High via pooled historical quantiles.

pub mod error;
pub mod features;
pub mod level;
pub mod model;
pub mod store;
pub mod types;
