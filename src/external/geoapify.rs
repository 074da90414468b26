use serde::{Deserialize, Serialize};
use std::env;

use crate::{
    config::Config,
    entities::{Coordinates, RouteSummary},
    error::{invalid_input_error, not_found_error, upstream_error, Error},
};

#[derive(Clone)]
pub struct Geoapify {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for Geoapify {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geoapify")
            .field("api_base", &self.api_base)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GeocodeResult {
    lat: f64,
    lon: f64,
    formatted: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RouteProperties {
    distance: f64,
    time: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RouteFeature {
    properties: RouteProperties,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RoutingResponse {
    #[serde(default)]
    features: Vec<RouteFeature>,
}

impl Geoapify {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.geoapify_api_base.clone(),
            api_key: config.geoapify_api_key.clone(),
        }
    }

    fn key(&self) -> Result<&str, Error> {
        Ok(self
            .api_key
            .as_deref()
            .ok_or(env::VarError::NotPresent)?)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = format!("https://{}{}", self.api_base, path);

        let res = self
            .client
            .get(url)
            .query(&[("apiKey", self.key()?)])
            .query(params)
            .send()
            .await?;

        check_status(res.status().as_u16())?;

        Ok(res.json().await?)
    }

    #[tracing::instrument]
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, Error> {
        let data: GeocodeResponse = self
            .get(
                "/v1/geocode/search",
                &[
                    ("text", address.to_string()),
                    ("format", "json".into()),
                    ("limit", "1".into()),
                ],
            )
            .await?;

        first_match(data).ok_or_else(|| not_found_error("Could not geocode source or destination"))
    }

    #[tracing::instrument]
    pub async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteSummary, Error> {
        let origin_waypoint: String = origin.into();
        let destination_waypoint: String = destination.into();

        let data: RoutingResponse = self
            .get(
                "/v1/routing",
                &[
                    ("waypoints", format!("{}|{}", origin_waypoint, destination_waypoint)),
                    ("mode", "drive".into()),
                ],
            )
            .await?;

        summarize(origin, destination, data)
    }
}

// a rejected API key is our fault, not the caller's
fn check_status(status_code: u16) -> Result<(), Error> {
    match status_code {
        200 => Ok(()),
        401 | 403 => Err(upstream_error()),
        400..=499 => Err(invalid_input_error("Geoapify rejected the request")),
        _ => Err(upstream_error()),
    }
}

fn first_match(data: GeocodeResponse) -> Option<Coordinates> {
    data.results.into_iter().next().map(|result| {
        tracing::debug!("geocoded to {:?}", result.formatted);

        Coordinates {
            lat: result.lat,
            lon: result.lon,
        }
    })
}

fn summarize(
    origin: Coordinates,
    destination: Coordinates,
    data: RoutingResponse,
) -> Result<RouteSummary, Error> {
    let feature = data
        .features
        .into_iter()
        .next()
        .ok_or_else(|| not_found_error("No route found between source and destination"))?;

    Ok(RouteSummary {
        origin,
        destination,
        distance_meters: feature.properties.distance,
        duration_seconds: feature.properties.time,
    })
}

#[test]
fn geocode_takes_first_result() {
    let data: GeocodeResponse = serde_json::from_value(serde_json::json!({
        "results": [
            { "lat": 12.9716, "lon": 77.5946, "formatted": "Bengaluru, Karnataka, India" },
            { "lat": 0.0, "lon": 0.0 }
        ]
    }))
    .unwrap();

    assert_eq!(
        first_match(data),
        Some(Coordinates {
            lat: 12.9716,
            lon: 77.5946
        })
    );

    let empty: GeocodeResponse = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(first_match(empty), None);
}

#[test]
fn routing_response_is_summarized() {
    let origin = Coordinates { lat: 1.0, lon: 2.0 };
    let destination = Coordinates { lat: 3.0, lon: 4.0 };

    let data: RoutingResponse = serde_json::from_value(serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "distance": 18250, "time": 1834.5, "mode": "drive" },
            "geometry": { "type": "MultiLineString", "coordinates": [] }
        }]
    }))
    .unwrap();

    let route = summarize(origin, destination, data).unwrap();
    assert_eq!(route.distance_meters, 18250.0);
    assert_eq!(route.duration_seconds, 1834.5);

    let err = summarize(origin, destination, RoutingResponse { features: vec![] }).unwrap_err();
    assert_eq!(err.code, 102);
}

#[test]
fn missing_key_is_an_environment_error() {
    let geoapify = Geoapify::new(&Config::default());

    let err = geoapify.key().unwrap_err();
    assert_eq!(err.code, 1);
}

#[test]
fn rejected_credentials_are_upstream_errors() {
    assert!(check_status(200).is_ok());

    for status in [401, 403, 500, 502] {
        let err = check_status(status).unwrap_err();
        assert_eq!(err.code, 4);
        assert!(!err.is_invalid_input_error());
    }

    for status in [400, 404, 422] {
        assert!(check_status(status).unwrap_err().is_invalid_input_error());
    }
}
