//! 地理坐标与候选点采样

use serde::{Deserialize, Serialize};

mod sampler;

pub use sampler::GeoPointSampler;

/// 经纬度坐标，序列化为 `[lng, lat]`，与地图引擎保持一致
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// 与另一点的平面距离（度）
    pub fn distance_degrees(&self, other: &Coordinate) -> f64 {
        (self.lng - other.lng).hypot(self.lat - other.lat)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lng, value.lat]
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lng, self.lat)
    }
}
