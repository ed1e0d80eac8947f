use serde::Deserialize;

/// Whether `lat`/`lon` are finite WGS84 degrees inside the valid ranges.
pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

#[derive(Debug, Clone, Deserialize)]
#[derive(Default)]
pub struct Stop {
    pub stop_id: String,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    pub parent_station: Option<String>,
}

impl Stop {
    pub fn has_coordinates(&self) -> bool {
        self.stop_lat.is_some() && self.stop_lon.is_some()
    }

    /// Coordinates as `(lat, lon)`, only when both are present and in range.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.stop_lat?;
        let lon = self.stop_lon?;
        is_valid_coordinate(lat, lon).then_some((lat, lon))
    }

    pub fn parent_station_id(&self) -> Option<&str> {
        self.parent_station
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[derive(Default)]
pub struct Trip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    pub shape_id: Option<String>,
}

impl Trip {
    pub fn shape_id(&self) -> Option<&str> {
        self.shape_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[derive(Default)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Shape {
    pub shape_id: String,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: u32,
}

impl Shape {
    pub fn has_valid_coordinates(&self) -> bool {
        is_valid_coordinate(self.shape_pt_lat, self.shape_pt_lon)
    }
}
