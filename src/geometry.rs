use serde::{Deserialize, Serialize};

/// A 2D point. Units depend on context: hand landmarks are normalized to
/// [0,1], pose keypoints are in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    a.distance_to(b)
}

/// Exponential moving average step: `weight` is the share kept from `prev`.
pub fn ema(prev: f64, current: f64, weight: f64) -> f64 {
    prev * weight + current * (1.0 - weight)
}

pub fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}
