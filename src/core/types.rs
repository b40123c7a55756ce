//! Core data types for the geolocation engine

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// One GPS fix paired with a received signal strength reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub lat: f64,
    pub lon: f64,
    #[serde(alias = "rssi")]
    pub rssi_dbm: f64,
}

impl Observation {
    pub fn new(lat: f64, lon: f64, rssi_dbm: f64) -> Self {
        Self { lat, lon, rssi_dbm }
    }
}

/// Ordered observations of a single transmitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    #[serde(rename = "cell_id")]
    pub transmitter_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub observations: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(transmitter_id: impl Into<String>, kind: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            transmitter_id: transmitter_id.into(),
            kind: kind.into(),
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Arithmetic mean of the observation coordinates
    pub fn mean_position(&self) -> Option<(f64, f64)> {
        if self.observations.is_empty() {
            return None;
        }
        let n = self.observations.len() as f64;
        let lat = self.observations.iter().map(|o| o.lat).sum::<f64>() / n;
        let lon = self.observations.iter().map(|o| o.lon).sum::<f64>() / n;
        Some((lat, lon))
    }
}

/// A projected observation with its inferred distance to the transmitter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius_m: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, radius_m: f64) -> Self {
        Self { x, y, radius_m }
    }

    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// Crossing point of two circles with a confidence weight in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntersectionPoint {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

impl IntersectionPoint {
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn distance_to(&self, other: &IntersectionPoint) -> f64 {
        (self.position() - other.position()).norm()
    }
}

/// Geographic coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}
