//! Planar projection and point-to-polyline distances.
//!
//! Geographic coordinates are projected with spherical Web Mercator so that
//! distances can be measured with plain Euclidean geometry. Mercator inflates
//! distances by `1 / cos(lat)`, so every planar distance has to be multiplied
//! by [`Projection::scale_correction`] at the query latitude before it can be
//! compared with a ground distance in meters.

/// WGS84 semi-major axis, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Latitude at which Web Mercator maps to a square world.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// A geographic position in degrees, stored with single precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub lat: f32,
    pub lon: f32,
}

impl Point {
    pub fn new(lat: f32, lon: f32) -> Self {
        Self { lat, lon }
    }
}

/// A projected position, in meters on the Mercator plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

pub trait Projection {
    fn convert(&self, point: Point) -> PlanarPoint;

    /// Factor turning a planar distance at `lat` degrees into ground distance.
    fn scale_correction(&self, lat: f64) -> f64;
}

impl<P: Projection + ?Sized> Projection for &P {
    fn convert(&self, point: Point) -> PlanarPoint {
        (**self).convert(point)
    }

    fn scale_correction(&self, lat: f64) -> f64 {
        (**self).scale_correction(lat)
    }
}

/// Spherical Web Mercator on the WGS84 semi-major axis.
///
/// Latitudes beyond [`MAX_MERCATOR_LATITUDE`] are clamped in both
/// [`Projection::convert`] and [`Projection::scale_correction`], which keeps
/// the projection finite at the poles and the correction factor positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn convert(&self, point: Point) -> PlanarPoint {
        let lat_rad = clamp_latitude(f64::from(point.lat)) * DEG_TO_RAD;
        let lon_rad = f64::from(point.lon) * DEG_TO_RAD;
        let sin_lat = lat_rad.sin();
        PlanarPoint {
            x: EARTH_RADIUS_METERS * lon_rad,
            y: EARTH_RADIUS_METERS * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / 2.0,
        }
    }

    fn scale_correction(&self, lat: f64) -> f64 {
        (clamp_latitude(lat) * DEG_TO_RAD).cos()
    }
}

fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
}

/// Shortest distance from `point` to the finite segment `start`-`end`.
pub fn perpendicular_distance(point: PlanarPoint, start: PlanarPoint, end: PlanarPoint) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return point.distance(start);
    }

    let t = ((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq;
    if t < 0.0 {
        point.distance(start)
    } else if t > 1.0 {
        point.distance(end)
    } else {
        point.distance(PlanarPoint::new(start.x + t * dx, start.y + t * dy))
    }
}

/// Minimum distance from `point` to any segment of the polyline.
///
/// Scans every segment. Returns `f64::INFINITY` when there are fewer than two
/// points.
pub fn min_distance_to_polyline(point: PlanarPoint, points: &[PlanarPoint]) -> f64 {
    points
        .windows(2)
        .map(|segment| perpendicular_distance(point, segment[0], segment[1]))
        .fold(f64::INFINITY, f64::min)
}
