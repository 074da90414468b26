use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl From<Coordinates> for String {
    fn from(coordinates: Coordinates) -> Self {
        format!("{},{}", coordinates.lat, coordinates.lon)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RouteSummary {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn distance_text(&self) -> String {
        format!("{:.1} km", self.distance_km())
    }

    pub fn duration_text(&self) -> String {
        format!("{} min", (self.duration_seconds / 60.0).round())
    }
}

#[test]
fn route_summary_text() {
    let origin = Coordinates { lat: 12.97, lon: 77.59 };
    let route = RouteSummary {
        origin,
        destination: origin,
        distance_meters: 12_345.0,
        duration_seconds: 1_650.0,
    };

    assert_eq!(route.distance_text(), "12.3 km");
    assert_eq!(route.duration_text(), "28 min");
    assert_eq!(String::from(origin), "12.97,77.59");
}
