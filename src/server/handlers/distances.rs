use axum::extract::{Extension, Json, Query};
use serde::{Deserialize, Serialize};

use crate::entities::RouteSummary;
use crate::error::{invalid_input_error, Error};
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct MeasureParams {
    source: Option<String>,
    destination: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct Measurement {
    text: String,
    value: f64,
}

#[derive(Serialize, Deserialize)]
pub struct Element {
    distance: Measurement,
    duration: Measurement,
    status: String,
}

#[derive(Serialize, Deserialize)]
pub struct Row {
    elements: Vec<Element>,
}

#[derive(Serialize, Deserialize)]
pub struct DistanceResponse {
    rows: Vec<Row>,
    status: String,
}

impl From<RouteSummary> for DistanceResponse {
    fn from(route: RouteSummary) -> Self {
        let element = Element {
            distance: Measurement {
                text: route.distance_text(),
                value: route.distance_meters,
            },
            duration: Measurement {
                text: route.duration_text(),
                value: route.duration_seconds,
            },
            status: "OK".into(),
        };

        Self {
            rows: vec![Row {
                elements: vec![element],
            }],
            status: "OK".into(),
        }
    }
}

pub async fn measure(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<MeasureParams>,
) -> Result<Json<DistanceResponse>, Error> {
    let (source, destination) = match (params.source, params.destination) {
        (Some(source), Some(destination)) => (source, destination),
        _ => return Err(invalid_input_error("Source and destination are required")),
    };

    let route = api.measure_distance(source, destination).await?;

    Ok(DistanceResponse::from(route).into())
}

#[cfg(test)]
mod stub {
    use async_trait::async_trait;

    use crate::api::{DistanceAPI, FareAPI, API};
    use crate::engine::UnitSource;
    use crate::entities::{Coordinates, FareEstimate, PricingContext, RouteSummary};
    use crate::error::{not_found_error, Error};

    pub struct StubAPI;

    impl FareAPI for StubAPI {
        fn estimate_fares(
            &self,
            _: f64,
            _: PricingContext,
            _: &mut dyn UnitSource,
        ) -> Result<FareEstimate, Error> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl DistanceAPI for StubAPI {
        async fn measure_distance(
            &self,
            source: String,
            _destination: String,
        ) -> Result<RouteSummary, Error> {
            if source == "nowhere" {
                return Err(not_found_error("Could not geocode source or destination"));
            }

            let point = Coordinates { lat: 12.9, lon: 77.6 };

            Ok(RouteSummary {
                origin: point,
                destination: point,
                distance_meters: 18_260.0,
                duration_seconds: 1_834.0,
            })
        }
    }

    impl API for StubAPI {}
}

#[cfg(test)]
fn distance_request(uri: &str) -> (axum::http::StatusCode, serde_json::Value) {
    use crate::server::router;
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tokio_test::block_on;
    use tower::ServiceExt;

    let app = router(Arc::new(stub::StubAPI) as DynAPI);

    block_on(async {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    })
}

#[test]
fn distance_is_reported_in_km_and_minutes() {
    use axum::http::StatusCode;

    let (status, body) =
        distance_request("/api/distance?source=MG%20Road&destination=Whitefield");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);

    let element = &body["rows"][0]["elements"][0];
    assert_eq!(element["status"], "OK");
    assert_eq!(element["distance"]["text"], "18.3 km");
    assert_eq!(element["distance"]["value"], 18260.0);
    assert_eq!(element["duration"]["text"], "31 min");
    assert_eq!(element["duration"]["value"], 1834.0);
}

#[test]
fn distance_failures_map_to_client_errors() {
    use axum::http::StatusCode;

    let (status, body) = distance_request("/api/distance?source=MG%20Road");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Source and destination are required");

    let (status, body) =
        distance_request("/api/distance?source=nowhere&destination=Whitefield");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Could not geocode source or destination");
}
