//! Result records returned to callers

use serde::{Deserialize, Serialize};

use crate::utils::config::Method;

/// How a transmitter's estimate was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The requested method produced the estimate
    Converged,
    /// The requested method failed and the centroid was used
    FellBack,
    /// No usable observation; coordinates are null
    NoData,
}

/// Observation position with its inferred range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugCircle {
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
}

/// Diagnostics attached when `debug` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugPayload {
    pub circles: Vec<DebugCircle>,
    /// Method that produced the coordinates
    pub method: Method,
    pub requested: Method,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Estimate for one transmitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    #[serde(rename = "cell_id")]
    pub transmitter_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Observations used
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugPayload>,
}

impl EstimationResult {
    pub fn has_position(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_uses_collector_field_names() {
        let result = EstimationResult {
            transmitter_id: "44011".to_string(),
            kind: "LTE".to_string(),
            lat: None,
            lon: None,
            count: 0,
            debug: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"cell_id": "44011", "type": "LTE", "lat": null, "lon": null, "count": 0})
        );
        assert!(!result.has_position());
    }

    #[test]
    fn test_debug_payload_serialization() {
        let payload = DebugPayload {
            circles: vec![DebugCircle { lat: 35.0, lon: 135.0, radius_m: 10.0 }],
            method: Method::Centroid,
            requested: Method::Accum,
            outcome: Outcome::FellBack,
            reason: Some("numeric degeneracy: no circle pair intersects".to_string()),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["method"], "centroid");
        assert_eq!(value["requested"], "accum");
        assert_eq!(value["outcome"], "fell_back");
        assert_eq!(value["circles"][0]["radius_m"], 10.0);
    }
}
