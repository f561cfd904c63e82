use serde::{Deserialize, Serialize};
use std::cmp;
use std::fmt::Display;
use std::ops::{Add, Sub};

const EARTH_RADIUS_KM: f64 = 6371.0;
const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone, Copy, Default)]
pub struct Distance(f64);

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Add for Distance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Distance {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Distance {
    pub const fn from_meters(distance: f64) -> Self {
        Self(distance)
    }

    pub const fn from_kilometers(distance: f64) -> Self {
        Self(distance * 1000.0)
    }

    pub const fn as_meters(&self) -> f64 {
        self.0
    }

    pub const fn as_kilometers(&self) -> f64 {
        self.0 / 1000.0
    }

    pub fn as_miles(&self) -> f64 {
        self.0 / METERS_PER_MILE
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.latitude, self.longitude))
    }
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance between two points.
    pub fn great_circle_distance(&self, coord: &Self) -> Distance {
        let dist_lat = f64::to_radians(coord.latitude - self.latitude);
        let dist_lon = f64::to_radians(coord.longitude - self.longitude);
        let a = f64::powi(f64::sin(dist_lat / 2.0), 2)
            + f64::cos(f64::to_radians(self.latitude))
                * f64::cos(f64::to_radians(coord.latitude))
                * f64::sin(dist_lon / 2.0)
                * f64::sin(dist_lon / 2.0);
        let c = 2.0 * f64::atan2(f64::sqrt(a), f64::sqrt(1.0 - a));
        Distance::from_kilometers(EARTH_RADIUS_KM * c)
    }
}

#[test]
fn distance_paris_london_test() {
    let coord_a = Coordinate::new(48.858_01, 2.351_435);
    let coord_b = Coordinate::new(51.505_238, -0.124_954);
    let d = coord_a.great_circle_distance(&coord_b);
    assert!((d.as_kilometers() - 343.5).abs() < 2.0);
}

#[test]
fn distance_one_thousandth_degree_test() {
    // 0.001 degrees of latitude is roughly 111 meters
    let coord_a = Coordinate::new(0.0, 0.0);
    let coord_b = Coordinate::new(0.001, 0.0);
    let d = coord_a.great_circle_distance(&coord_b);
    assert!((d.as_meters() - 111.2).abs() < 1.0);
}

#[test]
fn distance_eq_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(1.0);
    assert_eq!(dist_a, dist_b)
}

#[test]
fn distance_cmp_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(0.5);
    assert!(dist_a > dist_b)
}

#[test]
fn distance_miles_test() {
    let dist = Distance::from_meters(1609.344);
    assert!((dist.as_miles() - 1.0).abs() < 1e-9)
}
