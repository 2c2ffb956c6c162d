// crates/si_interp/src/distance.rs

//! 距离度量
//!
//! - 欧氏距离：所有维度直接参与
//! - 大圆距离：前两维视为（经度, 纬度）度数，用 Haversine 公式求球面
//!   距离（公里），其余维度（如 `time_step`）按欧氏方式叠加

use serde::{Deserialize, Serialize};

/// 地球平均半径 [km]
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// 距离度量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// 欧氏距离
    #[default]
    Euclidean,
    /// 前两维为经纬度的大圆距离
    Haversine,
}

impl DistanceMetric {
    /// 由 `latlon` 开关选择度量
    pub fn from_latlon(latlon: bool) -> Self {
        if latlon {
            Self::Haversine
        } else {
            Self::Euclidean
        }
    }

    /// 计算两点距离
    #[inline]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Self::Euclidean => euclidean_squared(a, b).sqrt(),
            Self::Haversine => {
                if a.len() < 2 {
                    return euclidean_squared(a, b).sqrt();
                }
                let h = haversine_km(a[0], a[1], b[0], b[1]);
                (h * h + euclidean_squared(&a[2..], &b[2..])).sqrt()
            }
        }
    }
}

#[inline]
fn euclidean_squared(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Haversine 大圆距离 [km]
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = phi2 - phi1;
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean() {
        let d = DistanceMetric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        // 沿经线 1° 约 111.2 km
        let d = DistanceMetric::Haversine.distance(&[0.0, 0.0], &[0.0, 1.0]);
        assert!((d - 111.195).abs() < 0.1);
    }

    #[test]
    fn test_haversine_extra_dimension() {
        let d = DistanceMetric::Haversine.distance(&[10.0, 45.0, 0.0], &[10.0, 45.0, 3.0]);
        assert!((d - 3.0).abs() < 1e-9);
    }
}
