use std::f64::consts::TAU;

use rand::Rng;

use super::Coordinate;

/// 围绕中心点生成一圈候选点，供代理动画巡游
///
/// 每个点以随机方位角（[0, 2π)）和随机距离（[0.5R, R]）偏离中心，
/// 因此不会与中心重合。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPointSampler {
    radius: f64,
}

impl GeoPointSampler {
    /// 约2km，按城市尺度换算的经纬度
    pub const DEFAULT_RADIUS: f64 = 0.02;

    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn generate(&self, center: Coordinate, count: usize) -> Vec<Coordinate> {
        self.generate_with(center, count, &mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        center: Coordinate,
        count: usize,
        rng: &mut R,
    ) -> Vec<Coordinate> {
        (0..count)
            .map(|_| {
                let bearing = rng.random_range(0.0..TAU);
                let distance = rng.random_range(0.5 * self.radius..=self.radius);
                Coordinate::new(
                    center.lng + distance * bearing.sin(),
                    center.lat + distance * bearing.cos(),
                )
            })
            .collect()
    }
}

impl Default for GeoPointSampler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RADIUS)
    }
}
